//! BizVenture Kids Common - shared models, storage and game rules.
//!
//! Everything the daemon and the CLI agree on lives here: the SQLite
//! store, progression rules (levels, streaks, badges), the curriculum
//! and quiz grading, and the scenario economy.

pub mod achievements;
pub mod auth;
pub mod config;
pub mod curriculum;
pub mod economy;
pub mod error;
pub mod levels;
pub mod models;
pub mod seed;
pub mod store;
pub mod streak;

pub use error::{BvkError, Result};
pub use models::*;
pub use store::Store;
