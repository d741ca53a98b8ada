//! Stockdesk core types and capability traits

pub mod auth;
pub mod connectivity;
pub mod error;
pub mod notice;
pub mod queue;
pub mod storage;

pub use auth::AuthSession;
pub use connectivity::{ConnectivityHandle, ConnectivityMonitor, connectivity};
pub use error::{CoreError, CoreResult};
pub use notice::{Notice, NoticeReceiver, NoticeSender, notice_channel};
pub use queue::{OfflineQueue, QueuedMethod, QueuedRequest};
pub use storage::{JsonFileStorage, MemoryStorage, StorageBackend};
