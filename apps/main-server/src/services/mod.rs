//! Domain services used by the handlers.

pub mod pricing;
pub mod routing;
