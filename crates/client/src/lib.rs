//! Offline-resilient HTTP gateway for the stockdesk backend
//!
//! Every domain call funnels through one request primitive that attaches
//! the bearer token, enforces the configured timeout and maps response
//! statuses. Mutating calls that fail at the network layer while the
//! device is offline are captured into a durable queue and replayed, in
//! order, when connectivity returns.

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod offline;
pub mod resources;

pub use config::ClientConfig;
pub use error::ClientError;
pub use gateway::{Dispatched, Gateway, GatewayBuilder, RequestOptions};
pub use offline::{OfflineReceipt, ReplayReport};
