pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use crate::api::{api_hero, api_heroes, api_root};
pub use crate::config::Config;
pub use crate::core::{Check, Checker, Context, Outcome, Policy, Report, Verdict};
pub use crate::error::{CheckError, ConfigError, Shape};
pub use crate::types::Hero;
