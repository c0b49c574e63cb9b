//! Scripture Module
//!
//! Verse lookup with a surrounding context window, FTS5 full-text search,
//! and topics. Topics are seeded at startup from the bundled catalogue by
//! expanding each topic's references with [`crate::reference::expand_reference`]
//! and linking the verses found in the `bible` table.
//!
//! # Usage
//!
//! ```rust,ignore
//! use teatime::scripture;
//!
//! scripture::seed_bundled_topics(&db).await?;
//!
//! let app = Router::new()
//!     .nest("/api", scripture::routes())
//!     .with_state(app_state);
//! ```

mod handler;
mod routes;
mod seed;
mod store;

pub use routes::routes;
pub use seed::{SeedStats, seed_bundled_topics, seed_topics};
pub use store::*;
