// ── Firmware list cache ──
//
// Holds the most recent successful catalog retrieval. Reads are lock-free
// `watch` borrows; replacements are serialized so that the cache and any
// notification sent alongside it always agree on ordering.

use tokio::sync::{Mutex, watch};

use crate::model::FirmwareList;

pub(crate) struct FirmwareStore {
    current: watch::Sender<FirmwareList>,
    write_lock: Mutex<()>,
}

impl FirmwareStore {
    pub(crate) fn new() -> Self {
        let (current, _) = watch::channel(FirmwareList::default());
        Self {
            current,
            write_lock: Mutex::new(()),
        }
    }

    /// Current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> FirmwareList {
        self.current.borrow().clone()
    }

    /// Subscribe to replacements via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<FirmwareList> {
        self.current.subscribe()
    }

    /// Replace the list wholesale, then run `notify` before releasing the
    /// write lock.
    pub(crate) async fn replace(&self, list: FirmwareList, notify: impl FnOnce(FirmwareList)) {
        let _guard = self.write_lock.lock().await;
        // `send_replace` updates unconditionally, even with zero receivers.
        self.current.send_replace(list.clone());
        notify(list);
    }
}
