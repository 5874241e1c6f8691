//! Representative business logic.

use crate::{
    entities::{Representative, representative},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Retrieves all active representatives, ordered alphabetically by name.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn load_representatives(db: &DatabaseConnection) -> Result<Vec<representative::Model>> {
    Representative::find()
        .filter(representative::Column::Active.eq(true))
        .order_by_asc(representative::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Adds a new active representative.
///
/// # Errors
/// Returns an error if the name is blank or the insert fails.
pub async fn create_representative(
    db: &DatabaseConnection,
    name: String,
) -> Result<representative::Model> {
    if name.trim().is_empty() {
        return Err(Error::validation("Representative name cannot be empty"));
    }

    let representative = representative::ActiveModel {
        name: Set(name.trim().to_string()),
        active: Set(true),
        ..Default::default()
    };
    let representative = representative.insert(db).await?;
    info!("Added representative {} ({})", representative.name, representative.id);
    Ok(representative)
}

/// Soft deletes a representative. Orders already attributed to them are untouched.
///
/// # Errors
/// Returns an error if the representative does not exist or the update fails.
pub async fn deactivate_representative(
    db: &DatabaseConnection,
    representative_id: i64,
) -> Result<representative::Model> {
    let mut representative: representative::ActiveModel =
        Representative::find_by_id(representative_id)
            .one(db)
            .await?
            .ok_or(Error::RepresentativeNotFound {
                id: representative_id,
            })?
            .into();

    representative.active = Set(false);
    representative.update(db).await.map_err(Into::into)
}
