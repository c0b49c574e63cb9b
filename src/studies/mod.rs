//! Studies Module
//!
//! Read-only access to the study plans bundled with the binary.

mod handler;
mod routes;

pub use routes::routes;
