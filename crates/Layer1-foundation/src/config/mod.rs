//! Config - application and service settings
//!
//! - `aide.rs` - AideConfig (logging, cache)
//! - `service.rs` - ServiceConfig per external API

mod aide;
mod service;

pub use aide::{AideConfig, AIDE_CONFIG_FILE};
pub use service::{AuthMode, ServiceConfig, ServicesConfig, SERVICES_FILE};
