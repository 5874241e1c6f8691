//! Core business logic - framework-agnostic catalog and order operations.
//!
//! Every function takes a database handle and returns [`crate::errors::Result`], so the
//! same operations back the command-line front end and the tests.

pub mod input;
pub mod order;
pub mod product;
pub mod representative;
