//! Wire definitions for the hail HTTP API.
//!
//! Every endpoint is a `POST` under `/api` taking and returning JSON. This
//! crate holds the endpoint paths, the request and response bodies, and the
//! error codes carried in error bodies.

mod error;
pub mod paths;
pub mod requests;
pub mod responses;

pub use error::*;
