use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

/// A source of leadership-change notifications.
///
/// `bootstrap` must succeed before the process is considered up; the binary
/// treats its failure as fatal. `run` then delivers the leader's name on the
/// channel — the bootstrap leader first, afterwards one message per change,
/// in order. Delivery stops when the receiver is dropped.
#[async_trait]
pub trait ElectionBackend: Send {
    async fn bootstrap(&mut self) -> Result<String>;

    async fn run(self: Box<Self>, notifications: mpsc::Sender<String>);
}
