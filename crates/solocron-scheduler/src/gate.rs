use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::timer::TimerLoop;
use solocron_core::LeadershipState;

/// Start/stop surface the gate drives. Both calls are idempotent.
pub trait SchedulerControl: Send + Sync {
    fn start(&self);
    fn stop(&self);
}

impl SchedulerControl for TimerLoop {
    fn start(&self) {
        TimerLoop::start(self);
    }
    fn stop(&self) {
        TimerLoop::stop(self);
    }
}

/// Two-state machine translating leadership notifications into timer loop
/// start/stop calls.
///
/// `run` is the single consumer of the notification channel, so transitions
/// are processed one at a time in arrival order even though they originate
/// on the election backend's task.
pub struct LeadershipGate {
    scheduler: Arc<dyn SchedulerControl>,
    state: Arc<LeadershipState>,
    active: bool,
}

impl LeadershipGate {
    pub fn new(scheduler: Arc<dyn SchedulerControl>, state: Arc<LeadershipState>) -> Self {
        Self {
            scheduler,
            state,
            active: false,
        }
    }

    /// Consume leadership notifications until the channel closes.
    ///
    /// Channel close means process shutdown: the loop is stopped if active so
    /// no fire outlives the election.
    pub async fn run(mut self, mut notifications: mpsc::Receiver<String>) {
        while let Some(leader) = notifications.recv().await {
            self.observe(&leader);
        }
        if self.active {
            info!("notification stream closed while active — stopping timer loop");
            self.scheduler.stop();
            self.active = false;
        }
    }

    /// Apply one notification to the state machine.
    fn observe(&mut self, leader: &str) {
        self.state.set_leader(leader);
        let is_self = self.state.is_self_leader();

        match (self.active, is_self) {
            (false, true) => {
                info!(%leader, "gained leadership — starting timer loop");
                self.scheduler.start();
                self.active = true;
            }
            (true, false) => {
                info!(%leader, "lost leadership — stopping timer loop");
                self.scheduler.stop();
                self.active = false;
            }
            (true, true) => debug!(%leader, "leadership reaffirmed"),
            (false, false) => debug!(%leader, "standing by — another instance leads"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct RecordingControl {
        starts: AtomicU32,
        stops: AtomicU32,
    }

    impl RecordingControl {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                starts: AtomicU32::new(0),
                stops: AtomicU32::new(0),
            })
        }
    }

    impl SchedulerControl for RecordingControl {
        fn start(&self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn gate(control: Arc<RecordingControl>) -> LeadershipGate {
        LeadershipGate::new(control, Arc::new(LeadershipState::new("node-1")))
    }

    #[test]
    fn becoming_leader_starts_exactly_once() {
        let control = RecordingControl::new();
        let mut gate = gate(control.clone());

        gate.observe("node-1");
        gate.observe("node-1");
        gate.observe("node-1");

        assert_eq!(control.starts.load(Ordering::SeqCst), 1);
        assert_eq!(control.stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn losing_leadership_stops_exactly_once() {
        let control = RecordingControl::new();
        let mut gate = gate(control.clone());

        gate.observe("node-1");
        gate.observe("node-2");
        gate.observe("node-2");

        assert_eq!(control.starts.load(Ordering::SeqCst), 1);
        assert_eq!(control.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn non_leader_notifications_are_noops() {
        let control = RecordingControl::new();
        let mut gate = gate(control.clone());

        gate.observe("node-2");
        gate.observe("node-3");

        assert_eq!(control.starts.load(Ordering::SeqCst), 0);
        assert_eq!(control.stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn channel_close_stops_when_active() {
        let control = RecordingControl::new();
        let state = Arc::new(LeadershipState::new("node-1"));
        let gate = LeadershipGate::new(control.clone(), state.clone());

        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(gate.run(rx));

        tx.send("node-1".to_string()).await.unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(control.starts.load(Ordering::SeqCst), 1);
        assert_eq!(control.stops.load(Ordering::SeqCst), 1);
        assert_eq!(state.snapshot().name, "node-1");
    }

    #[tokio::test]
    async fn channel_close_while_inactive_is_silent() {
        let control = RecordingControl::new();
        let gate = gate(control.clone());

        let (tx, rx) = mpsc::channel::<String>(8);
        drop(tx);
        gate.run(rx).await;

        assert_eq!(control.stops.load(Ordering::SeqCst), 0);
    }
}
