//! Bridge configuration
//!
//! Typed settings plus a parser for the small TOML subset embedded in the
//! firmware image.

pub mod toml;
pub mod types;

pub use self::toml::{parse_config, ConfigError};
pub use types::*;
