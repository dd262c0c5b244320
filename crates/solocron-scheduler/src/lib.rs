//! `solocron-scheduler` — leadership-gated periodic timer loop.
//!
//! # Overview
//!
//! A fixed set of [`ScheduleEntry`] jobs is registered before start. The
//! [`TimerLoop`] drives them on independent intervals from a single driver
//! task; each due fire is handed to a [`JobRunner`] on its own task so a slow
//! target never delays the next due entry. The [`LeadershipGate`] consumes
//! leader-change notifications and starts/stops the loop idempotently — only
//! the elected instance of a fleet fires.
//!
//! # Firing semantics
//!
//! | Situation                  | Behaviour                                   |
//! |----------------------------|---------------------------------------------|
//! | Loop running               | `next = previous deadline + interval`       |
//! | Driver stalled past `next` | Missed fires coalesce into a single fire    |
//! | Loop stopped then started  | Next fires rebased to `now + interval`      |

pub mod error;
pub mod gate;
pub mod timer;
pub mod types;

pub use error::{Result, SchedulerError};
pub use gate::{LeadershipGate, SchedulerControl};
pub use timer::TimerLoop;
pub use types::{ActionError, JobAction, JobRunner, ScheduleEntry};
