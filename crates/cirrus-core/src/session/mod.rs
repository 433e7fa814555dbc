//! Session domain module.
//!
//! - `model`: Session context snapshot and public-link detection
//! - `auth`: Storage-backed authenticated flag

mod auth;
mod model;

pub use auth::AuthFlag;
pub use model::{Session, is_public_link};
