//! Storage module for aide
//!
//! - `json`: JSON - configuration file load/save

mod json;

pub use json::JsonStore;
