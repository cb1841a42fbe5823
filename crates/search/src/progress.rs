use serde::Serialize;
use tokio::sync::mpsc;

/// Emitted once for every item expansion attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub item: String,
    pub tier: u32,
}

/// Optional live-progress channel of the top-down engine
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressSink {
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Guard that reports `item` when dropped, whichever way the expansion exits
    pub fn notice(&self, item: &str, tier: u32) -> TierNotice<'_> {
        TierNotice {
            sink: self,
            item: self.tx.as_ref().map(|_| item.to_string()),
            tier,
        }
    }

    fn send(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is streaming anymore.
            let _ = tx.send(event);
        }
    }
}

#[must_use = "the notice is emitted when the guard drops"]
pub struct TierNotice<'a> {
    sink: &'a ProgressSink,
    item: Option<String>,
    tier: u32,
}

impl Drop for TierNotice<'_> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.sink.send(ProgressEvent {
                item,
                tier: self.tier,
            });
        }
    }
}
