//! Configuration module.

mod settings;

pub use settings::{
    AdapterConfig, ConfigError, Credentials, Environment, WebSocketSettings,
};
