//! Accounts Module
//!
//! Users, password hashing, and cookie-backed server-side sessions.
//!
//! A session is a random token handed to the browser in an `HttpOnly` cookie.
//! Only the SHA-256 of the token is stored, alongside the owning user and an
//! expiry. Handlers that need a signed-in user take [`CurrentUser`]; handlers
//! that merely care take [`MaybeUser`].

mod extract;
mod handler;
mod password;
mod routes;
mod session;
mod store;

pub use extract::{CurrentUser, MaybeUser};
pub use password::{hash_password, verify_password, verify_unknown_account};
pub use routes::routes;
pub use session::{clear_cookie, generate_token, hash_token, session_cookie, session_token};
pub use store::{Accounts, User};
