//! Core entity definitions.
//!
//! This crate defines the data types shared by the store and the server:
//! riders, drivers, rides and reviews for the ride marketplace, and
//! workspaces, board tasks, chat messages and documents for the team suite.
//! Pricing and rating arithmetic live here too since they are pure functions
//! over these types.

mod board;
mod chat;
mod document;
mod driver;
mod fare;
mod geo;
mod review;
mod ride;
mod user;
mod workspace;

pub use board::*;
pub use chat::*;
pub use document::*;
pub use driver::*;
pub use fare::*;
pub use geo::*;
pub use review::*;
pub use ride::*;
pub use user::*;
pub use workspace::*;
