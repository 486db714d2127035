//! adaptquiz-analytics — Clients for the behavior and mistake analytics services.
//!
//! Implements the `BehaviorAnalytics` and `MistakeAnalytics` traits over
//! JSON/HTTP, plus in-memory mocks for offline runs and tests, and the TOML
//! configuration that selects between them.

pub mod behavior;
pub mod config;
pub mod error;
mod http;
pub mod mistakes;
pub mod mock;

pub use behavior::HttpBehaviorAnalytics;
pub use config::{
    create_behavior_client, create_clients, create_mistake_client, load_config, load_config_from,
    AdaptquizConfig, ServiceConfig, ServicesConfig,
};
pub use error::AnalyticsError;
pub use mistakes::HttpMistakeAnalytics;
pub use mock::{MockBehaviorAnalytics, MockMistakeAnalytics};
