use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::error::{Result, SchedulerError};
use crate::types::{JobRunner, ScheduleEntry};

/// Leadership-gated timer loop over a fixed job registry.
///
/// `start`/`stop` are idempotent and safe to call from any task while the
/// driver runs; the mutex serialises them so concurrent calls resolve to the
/// last caller's intent.
pub struct TimerLoop {
    runner: Arc<dyn JobRunner>,
    inner: Mutex<Inner>,
}

struct Inner {
    entries: Vec<ScheduleEntry>,
    running: Option<Running>,
}

struct Running {
    shutdown: watch::Sender<bool>,
    driver: JoinHandle<()>,
}

impl TimerLoop {
    pub fn new(runner: Arc<dyn JobRunner>) -> Self {
        Self {
            runner,
            inner: Mutex::new(Inner {
                entries: Vec::new(),
                running: None,
            }),
        }
    }

    /// Register a job. The registry is sealed once the loop has started.
    pub fn add_entry(&self, entry: ScheduleEntry) -> Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.running.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }
        if entry.interval.is_zero() {
            return Err(SchedulerError::InvalidInterval { id: entry.id });
        }
        if inner.entries.iter().any(|e| e.id == entry.id) {
            return Err(SchedulerError::DuplicateJob { id: entry.id });
        }
        debug!(job = %entry.id, interval = ?entry.interval, "job registered");
        inner.entries.push(entry);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.running.is_some()
    }

    /// Begin firing all registered entries. No-op while already running.
    ///
    /// Every entry's next fire is rebased to `now + interval`: fires missed
    /// while the loop was stopped are skipped, not replayed.
    pub fn start(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.running.is_some() {
            debug!("start ignored — timer loop already running");
            return;
        }

        let entries = inner.entries.clone();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let runner = Arc::clone(&self.runner);
        let driver = tokio::spawn(drive(entries, runner, shutdown_rx));
        inner.running = Some(Running { shutdown, driver });
        info!("timer loop started");
    }

    /// Halt all firing. No-op while already stopped.
    ///
    /// The driver is aborted at its next await point, so a wake already in
    /// progress on another worker may still launch a fire whose deadline
    /// elapsed before this call. No deadline elapsing after `stop` returns
    /// can fire, and dispatches already launched run to completion.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match inner.running.take() {
            None => debug!("stop ignored — timer loop not running"),
            Some(running) => {
                let _ = running.shutdown.send(true);
                running.driver.abort();
                info!("timer loop stopped");
            }
        }
    }
}

/// Driver task: one wait/wake cycle over a min-heap of next-fire deadlines.
async fn drive(
    entries: Vec<ScheduleEntry>,
    runner: Arc<dyn JobRunner>,
    mut shutdown: watch::Receiver<bool>,
) {
    let now = Instant::now();
    let mut heap: BinaryHeap<Reverse<(Instant, usize)>> = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| Reverse((now + entry.interval, idx)))
        .collect();

    loop {
        let Some(&Reverse((due_at, _))) = heap.peek() else {
            // Empty registry: nothing to fire, park until stopped.
            let _ = shutdown.changed().await;
            return;
        };

        tokio::select! {
            _ = time::sleep_until(due_at) => {
                let now = Instant::now();
                while let Some(&Reverse((at, idx))) = heap.peek() {
                    if at > now {
                        break;
                    }
                    heap.pop();
                    let entry = entries[idx].clone();
                    let runner = Arc::clone(&runner);
                    // Fire-and-forget: the loop never waits on the dispatch.
                    tokio::spawn(async move {
                        runner.run_job(&entry).await;
                    });

                    // Advance from the previous deadline, not from `now`, so
                    // cadence does not drift under dispatch latency. When the
                    // driver fell more than one interval behind, the missed
                    // fires coalesce into the one just launched.
                    let mut next = at + entries[idx].interval;
                    if next <= now {
                        next = now + entries[idx].interval;
                    }
                    heap.push(Reverse((next, idx)));
                }
            }
            _ = shutdown.changed() => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobRunner;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    struct CountingRunner {
        counts: Mutex<HashMap<String, u32>>,
    }

    impl CountingRunner {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                counts: Mutex::new(HashMap::new()),
            })
        }

        fn count(&self, id: &str) -> u32 {
            *self.counts.lock().unwrap().get(id).unwrap_or(&0)
        }
    }

    #[async_trait]
    impl JobRunner for CountingRunner {
        async fn run_job(&self, entry: &ScheduleEntry) {
            *self
                .counts
                .lock()
                .unwrap()
                .entry(entry.id.clone())
                .or_insert(0) += 1;
        }
    }

    struct NoopAction;

    #[async_trait]
    impl crate::types::JobAction for NoopAction {
        async fn invoke(&self) -> std::result::Result<(), crate::types::ActionError> {
            Ok(())
        }
    }

    fn entry(id: &str, tenths_of_a_second: u64) -> ScheduleEntry {
        ScheduleEntry::new(
            id,
            Duration::from_millis(tenths_of_a_second * 100),
            Arc::new(NoopAction),
        )
    }

    async fn settle() {
        // Let spawned fire tasks run to completion on the paused runtime.
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn two_entries_fire_on_independent_intervals() {
        let runner = CountingRunner::new();
        let timer = TimerLoop::new(runner.clone());
        timer.add_entry(entry("a", 10)).unwrap(); // 1s
        timer.add_entry(entry("b", 20)).unwrap(); // 2s
        timer.start();

        time::sleep(Duration::from_millis(4500)).await;
        settle().await;
        timer.stop();

        assert_eq!(runner.count("a"), 4);
        assert_eq!(runner.count("b"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fire_count_matches_window_over_interval() {
        let runner = CountingRunner::new();
        let timer = TimerLoop::new(runner.clone());
        timer.add_entry(entry("j", 30)).unwrap(); // 3s
        timer.start();

        time::sleep(Duration::from_secs(10)).await;
        settle().await;
        timer.stop();

        // floor(10 / 3) = 3, boundary tolerance ±1
        let fires = runner.count("j");
        assert!((2..=4).contains(&fires), "got {fires} fires");
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_produces_one_fire_stream() {
        let runner = CountingRunner::new();
        let timer = TimerLoop::new(runner.clone());
        timer.add_entry(entry("a", 10)).unwrap();
        timer.start();
        timer.start();

        time::sleep(Duration::from_millis(3100)).await;
        settle().await;
        timer.stop();

        assert_eq!(runner.count("a"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_silences_fires() {
        let runner = CountingRunner::new();
        let timer = TimerLoop::new(runner.clone());
        timer.add_entry(entry("a", 10)).unwrap();
        timer.start();

        time::sleep(Duration::from_millis(2100)).await;
        settle().await;
        timer.stop();
        timer.stop();
        let fired = runner.count("a");
        assert_eq!(fired, 2);

        time::sleep(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(runner.count("a"), fired, "fire after stop");
    }

    #[tokio::test(start_paused = true)]
    async fn stop_start_skips_missed_fires() {
        let runner = CountingRunner::new();
        let timer = TimerLoop::new(runner.clone());
        timer.add_entry(entry("a", 20)).unwrap(); // 2s
        timer.start();

        time::sleep(Duration::from_millis(2100)).await;
        settle().await;
        timer.stop();
        assert_eq!(runner.count("a"), 1);

        // A long outage while stopped must not be replayed on restart.
        time::sleep(Duration::from_secs(30)).await;
        timer.start();
        time::sleep(Duration::from_millis(1500)).await;
        settle().await;
        assert_eq!(runner.count("a"), 1, "fired before the rebased deadline");

        time::sleep(Duration::from_millis(600)).await;
        settle().await;
        timer.stop();
        assert_eq!(runner.count("a"), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_start_stop_settles_on_one_driver() {
        let runner = CountingRunner::new();
        let timer = Arc::new(TimerLoop::new(runner.clone()));
        timer
            .add_entry(ScheduleEntry::new(
                "a",
                Duration::from_millis(50),
                Arc::new(NoopAction),
            ))
            .unwrap();

        let mut racers = Vec::new();
        for _ in 0..8 {
            let timer = Arc::clone(&timer);
            racers.push(tokio::spawn(async move { timer.start() }));
        }
        let stopper = Arc::clone(&timer);
        racers.push(tokio::spawn(async move { stopper.stop() }));
        for racer in racers {
            racer.await.unwrap();
        }

        // Whichever order the racers resolved in, at most one driver survives:
        // a single 50ms driver fires at most ~11 times in 500ms, a duplicate
        // would roughly double that.
        timer.start();
        assert!(timer.is_running());
        let before = runner.count("a");
        time::sleep(Duration::from_millis(500)).await;
        let fired = runner.count("a") - before;
        assert!((3..=13).contains(&fired), "got {fired} fires");

        timer.stop();
        assert!(!timer.is_running());
        let frozen = runner.count("a");
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(runner.count("a"), frozen, "fire after stop");
    }

    #[tokio::test(start_paused = true)]
    async fn add_entry_rejections() {
        let runner = CountingRunner::new();
        let timer = TimerLoop::new(runner);

        timer.add_entry(entry("a", 10)).unwrap();
        assert!(matches!(
            timer.add_entry(entry("a", 10)),
            Err(SchedulerError::DuplicateJob { .. })
        ));
        assert!(matches!(
            timer.add_entry(entry("b", 0)),
            Err(SchedulerError::InvalidInterval { .. })
        ));

        timer.start();
        assert!(matches!(
            timer.add_entry(entry("c", 10)),
            Err(SchedulerError::AlreadyRunning)
        ));
        timer.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn empty_registry_parks_until_stop() {
        let runner = CountingRunner::new();
        let timer = TimerLoop::new(runner);
        timer.start();
        assert!(timer.is_running());
        time::sleep(Duration::from_secs(5)).await;
        timer.stop();
        assert!(!timer.is_running());
    }
}
