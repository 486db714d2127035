//! Analytics error types.
//!
//! The error enum itself lives in `adaptquiz-core` so the engine can classify
//! collaborator failures; it is re-exported here for client users.

pub use adaptquiz_core::error::{classify, AnalyticsError};
