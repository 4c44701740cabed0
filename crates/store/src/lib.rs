//! Persistence for Hail.
//!
//! This crate provides the [`Store`] abstraction used by the server, with an
//! in-memory implementation for tests and single-process use, and a
//! PostgreSQL implementation for deployments.

mod error;
mod memory;
mod postgres;
mod traits;

pub use error::*;
pub use memory::*;
pub use postgres::*;
pub use traits::*;
