use blissful_bites::{
    config::{
        database,
        store::{self, DatabaseConfig},
    },
    core::{
        input::{format_rand, parse_price, parse_quantity},
        order::{self, OrderDetails, OrderLine, OrderWithItems},
        product, representative,
    },
    errors::{Error, Result},
    export,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use dotenvy::dotenv;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "blissful-bites",
    about = "Order manager for Blissful Bites home bakery",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render listings as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change the stored database settings
    #[command(subcommand)]
    Config(ConfigCommands),
    #[command(flatten)]
    Database(DatabaseCommands),
}

/// Commands that need an open database connection.
#[derive(Subcommand)]
enum DatabaseCommands {
    /// Manage the product catalog
    #[command(subcommand)]
    Products(ProductCommands),
    /// Manage representatives
    #[command(subcommand)]
    Reps(RepCommands),
    /// Capture, edit and complete orders
    #[command(subcommand)]
    Orders(OrderCommands),
    /// Export the full order history to a spreadsheet
    Export(ExportArgs),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the stored settings and where they live
    Show,
    /// Save a new database URL and auth token
    Set {
        #[arg(long, help = "Database URL, e.g. sqlite://orders.db?mode=rwc")]
        url: String,
        #[arg(long, help = "Auth token for the database")]
        token: String,
    },
}

#[derive(Subcommand)]
enum ProductCommands {
    /// List active products
    List,
    /// Show one product, including deactivated ones
    Show {
        #[arg(long)]
        id: i64,
    },
    /// Add a product
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, help = "Unit price in rand")]
        price: String,
    },
    /// Rename or reprice a product
    Edit {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long, help = "Unit price in rand")]
        price: String,
    },
    /// Stop offering a product for new orders
    Deactivate {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Subcommand)]
enum RepCommands {
    /// List active representatives
    List,
    /// Add a representative
    Add {
        #[arg(long)]
        name: String,
    },
    /// Deactivate a representative
    Deactivate {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Subcommand)]
enum OrderCommands {
    /// List open orders, newest first
    List,
    /// Show one order, including completed ones
    Show {
        #[arg(long)]
        id: i64,
    },
    /// Capture a new order
    Add(OrderArgs),
    /// Replace an order's details and items
    Edit {
        #[arg(long)]
        id: i64,
        #[command(flatten)]
        order: OrderArgs,
    },
    /// Mark an order as completed
    Complete {
        #[arg(long)]
        id: i64,
    },
    /// Move a completed order back to the open list
    Reopen {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Args)]
struct OrderArgs {
    #[arg(long)]
    client: String,
    #[arg(long, default_value = "")]
    contact: String,
    #[arg(long, help = "Due date, YYYY-MM-DD")]
    due: String,
    #[arg(long, help = "Representative id")]
    rep: Option<i64>,
    #[arg(long, action = ArgAction::SetTrue)]
    delivery: bool,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    comment: String,
    #[arg(
        long = "item",
        required = true,
        value_parser = parse_line,
        help = "Product and quantity as PRODUCT_ID:QUANTITY, repeatable"
    )]
    items: Vec<OrderLine>,
}

impl From<OrderArgs> for OrderDetails {
    fn from(args: OrderArgs) -> Self {
        Self {
            client_name: args.client,
            contact: args.contact,
            due_date: args.due,
            representative_id: args.rep,
            needs_delivery: args.delivery,
            delivery_address: args.address,
            comment: args.comment,
            items: args.items,
        }
    }
}

#[derive(Args)]
struct ExportArgs {
    #[arg(long, help = "Output file; defaults to orders_<today>.xlsx")]
    path: Option<PathBuf>,
}

fn parse_line(text: &str) -> std::result::Result<OrderLine, String> {
    let (product, quantity) = text
        .split_once(':')
        .ok_or_else(|| format!("expected PRODUCT_ID:QUANTITY, got '{text}'"))?;
    let product_id = product
        .trim()
        .parse()
        .map_err(|_| format!("invalid product id '{product}'"))?;
    let quantity = parse_quantity(quantity).map_err(|e| e.to_string())?;
    Ok(OrderLine::new(product_id, quantity))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(command) => handle_config_command(command),
        Commands::Database(command) => run_database_command(command, cli.json).await,
    }
}

async fn run_database_command(command: DatabaseCommands, json: bool) -> Result<()> {
    let settings = store::load()
        .inspect_err(|e| warn!("Could not load database config file: {}", e))
        .unwrap_or_default()
        .with_env_fallback();

    let db = database::connect(&settings)
        .await
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    let result = match command {
        DatabaseCommands::Products(command) => handle_product_command(&db, command, json).await,
        DatabaseCommands::Reps(command) => handle_rep_command(&db, command, json).await,
        DatabaseCommands::Orders(command) => handle_order_command(&db, command, json).await,
        DatabaseCommands::Export(args) => handle_export(&db, args).await,
    };

    if let Err(e) = db.close().await {
        warn!("Error closing database: {}", e);
    }
    result.inspect_err(|e| error!("{}", e))
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    let path = store::config_file_path()?;
    match command {
        ConfigCommands::Show => {
            let config = store::load_from(&path)?;
            println!("Config file: {}", path.display());
            println!("Database URL: {}", config.database_url);
            println!(
                "Auth token: {}",
                if config.auth_token.trim().is_empty() { "(not set)" } else { "(set)" }
            );
            if let Err(e) = config.validate() {
                println!("Incomplete: {e}");
            }
        }
        ConfigCommands::Set { url, token } => {
            let config = DatabaseConfig::new(url, token);
            config.validate()?;
            store::save_to(&path, &config)?;
            info!("Database configuration saved to {}", path.display());
        }
    }
    Ok(())
}

async fn handle_product_command(
    db: &DatabaseConnection,
    command: ProductCommands,
    json: bool,
) -> Result<()> {
    match command {
        ProductCommands::List => {
            let products = product::load_products(db).await?;
            if json {
                return print_json(&products);
            }
            for p in products {
                println!("{:>4}  {} - {}", p.id, p.name, format_rand(p.price));
            }
        }
        ProductCommands::Show { id } => {
            let found = product::get_product_by_id(db, id)
                .await?
                .ok_or(Error::ProductNotFound { id })?;
            if json {
                return print_json(&found);
            }
            let status = if found.active { "active" } else { "inactive" };
            println!(
                "{:>4}  {} - {} ({status})",
                found.id,
                found.name,
                format_rand(found.price)
            );
        }
        ProductCommands::Add { name, price } => {
            let created = product::create_product(db, name, parse_price(&price)?).await?;
            println!("Added product {} ({})", created.name, created.id);
        }
        ProductCommands::Edit { id, name, price } => {
            let updated = product::update_product(db, id, name, parse_price(&price)?).await?;
            println!(
                "Updated product {}: {} - {}",
                updated.id,
                updated.name,
                format_rand(updated.price)
            );
        }
        ProductCommands::Deactivate { id } => {
            let deactivated = product::deactivate_product(db, id).await?;
            println!("Deactivated product {}", deactivated.name);
        }
    }
    Ok(())
}

async fn handle_rep_command(db: &DatabaseConnection, command: RepCommands, json: bool) -> Result<()> {
    match command {
        RepCommands::List => {
            let representatives = representative::load_representatives(db).await?;
            if json {
                return print_json(&representatives);
            }
            for r in representatives {
                println!("{:>4}  {}", r.id, r.name);
            }
        }
        RepCommands::Add { name } => {
            let created = representative::create_representative(db, name).await?;
            println!("Added representative {} ({})", created.name, created.id);
        }
        RepCommands::Deactivate { id } => {
            let deactivated = representative::deactivate_representative(db, id).await?;
            println!("Deactivated representative {}", deactivated.name);
        }
    }
    Ok(())
}

async fn handle_order_command(
    db: &DatabaseConnection,
    command: OrderCommands,
    json: bool,
) -> Result<()> {
    match command {
        OrderCommands::List => {
            let orders = order::load_orders(db).await?;
            if json {
                return print_json(&orders);
            }
            if orders.is_empty() {
                println!("No open orders");
            }
            for o in &orders {
                print_order(o);
            }
        }
        OrderCommands::Show { id } => {
            let found = order::get_order(db, id)
                .await?
                .ok_or(Error::OrderNotFound { id })?;
            if json {
                return print_json(&found);
            }
            print_order(&found);
        }
        OrderCommands::Add(args) => {
            let created = order::create_order(db, &args.into()).await?;
            print_order(&created);
        }
        OrderCommands::Edit { id, order: args } => {
            let edited = order::edit_order(db, id, &args.into()).await?;
            print_order(&edited);
        }
        OrderCommands::Complete { id } => {
            order::set_order_completed(db, id, true).await?;
            println!("Order {id} marked as completed");
        }
        OrderCommands::Reopen { id } => {
            order::set_order_completed(db, id, false).await?;
            println!("Order {id} reopened");
        }
    }
    Ok(())
}

async fn handle_export(db: &DatabaseConnection, args: ExportArgs) -> Result<()> {
    let path = args.path.unwrap_or_else(|| {
        PathBuf::from(export::default_export_file_name(
            chrono::Local::now().date_naive(),
        ))
    });
    let path = export::ensure_xlsx_extension(&path);
    let rows = export::export_orders(db, &path).await?;
    println!("Exported {rows} rows to {}", path.display());
    Ok(())
}

fn print_order(o: &OrderWithItems) {
    let status = if o.order.completed { "Completed" } else { "Pending" };
    println!(
        "#{} {} | {} | {} | due {} | {} | {}",
        o.order.id,
        o.order.created_at.format("%Y-%m-%d %H:%M"),
        o.order.client_name,
        o.order.contact,
        o.order.due_date,
        o.representative_name.as_deref().unwrap_or("-"),
        status
    );
    for line in &o.items {
        println!(
            "    {} x {} = {}",
            line.item.quantity,
            line.product_name,
            format_rand(line.item.price)
        );
    }
    if o.order.needs_delivery {
        println!("    Deliver to: {}", o.order.delivery_address);
    }
    if !o.order.comment.is_empty() {
        println!("    Note: {}", o.order.comment);
    }
    println!("    Total: {}", format_rand(o.order.total_price));
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
