//! Discord bot serving texts from the Sefaria library, Hebrew calendar data
//! from Hebcal, and an LLM study companion.

pub mod assistant;
pub mod bot;
pub mod config;
pub mod error;
pub mod format;
pub mod hebcal;
pub mod health;
mod http;
pub mod rate_limit;
pub mod sefaria;

pub use config::Config;
pub use error::{Error, RemoteServiceError, ValidationError};
