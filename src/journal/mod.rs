//! Journal Module
//!
//! A signed-in reader's notes, bookmarks, and day-by-day study progress.
//! Every route requires a session.

mod handler;
mod routes;
mod store;

pub use routes::routes;
pub use store::*;
