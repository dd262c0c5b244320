//! `solocron-election` — leadership notification boundary.
//!
//! The distributed election protocol itself (lease acquisition, TTL renewal,
//! quorum) lives in an external coordination service. This crate only
//! consumes it: an [`ElectionBackend`] bootstraps against the service —
//! fatally at startup when it is unreachable — and then delivers the current
//! leader's name over an mpsc channel, in order, once per change.

pub mod backend;
pub mod error;
pub mod sidecar;
pub mod static_mode;

pub use backend::ElectionBackend;
pub use error::{ElectionError, Result};
pub use sidecar::SidecarElection;
pub use static_mode::StaticElection;
