//! Types shared by the OAuth client library and the helper binary

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
