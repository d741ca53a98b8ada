//! Injectable connectivity signal
//!
//! The gateway never talks to platform connectivity events directly; the
//! embedding application owns a [`ConnectivityHandle`] and flips it when the
//! platform reports a transition. Tests drive transitions the same way.

use tokio::sync::watch;

/// Producer side of the connectivity signal.
#[derive(Debug, Clone)]
pub struct ConnectivityHandle {
    state: watch::Sender<bool>,
}

/// Consumer side handed to the gateway at construction.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    state: watch::Receiver<bool>,
}

/// Create a linked handle/monitor pair with the given initial state.
pub fn connectivity(initially_online: bool) -> (ConnectivityHandle, ConnectivityMonitor) {
    let (tx, rx) = watch::channel(initially_online);
    (
        ConnectivityHandle { state: tx },
        ConnectivityMonitor { state: rx },
    )
}

impl ConnectivityHandle {
    pub fn set_online(&self, online: bool) {
        self.state.send_replace(online);
    }
}

impl ConnectivityMonitor {
    /// A monitor that reports online forever. Useful for server-side use
    /// and tests that never go offline.
    pub fn always_online() -> Self {
        let (handle, monitor) = connectivity(true);
        drop(handle);
        monitor
    }

    /// Connectivity as of right now.
    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Wait for the next transition and return the new state. Returns
    /// `None` once the handle is gone and no further transitions can occur.
    pub async fn changed(&mut self) -> Option<bool> {
        self.state.changed().await.ok()?;
        Some(*self.state.borrow_and_update())
    }
}
