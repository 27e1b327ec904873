//! TastyTrade REST Adapters
//!
//! Session and OAuth authentication, order routing, account state, and
//! historical data over the venue's REST API.

pub mod api_types;
pub mod brokerage;
pub mod client;
pub mod error;
pub mod history;
pub mod session;

pub use brokerage::TastyTradeBrokerage;
pub use client::{ApiClient, RetryConfig};
pub use error::ApiError;
pub use history::{HistoryData, HistoryRequest, HistoryTickType, Resolution};
pub use session::{OAuthConfig, OAuthSession, OAuthTokens, SessionAuth};
