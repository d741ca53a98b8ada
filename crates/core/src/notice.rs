//! User-facing notifications emitted by background work

use tokio::sync::mpsc;

/// A short, user-facing message, e.g. the offline replay report.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Notice {
    pub message: String,
    /// Number of offline changes synchronized, when the notice reports a
    /// replay pass.
    pub synced: usize,
}

pub type NoticeSender = mpsc::UnboundedSender<Notice>;
pub type NoticeReceiver = mpsc::UnboundedReceiver<Notice>;

/// Channel pair for delivering notices to whatever surfaces them.
pub fn notice_channel() -> (NoticeSender, NoticeReceiver) {
    mpsc::unbounded_channel()
}
