//! `solocron-core` — shared configuration, errors, and leadership state.

pub mod config;
pub mod error;
pub mod leader;

pub use config::SolocronConfig;
pub use error::{CoreError, Result};
pub use leader::{LeaderInfo, LeadershipState};
