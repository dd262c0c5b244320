use std::sync::RwLock;

use serde::Serialize;

/// Current-leader payload served by the status endpoint.
///
/// `name` is empty until the first leadership notification arrives.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LeaderInfo {
    pub name: String,
}

/// Who leads the election right now, and who we are.
///
/// Owned by whoever constructs it and shared via `Arc`; the leadership gate
/// is the only writer, the status handler reads snapshots.
pub struct LeadershipState {
    self_id: String,
    leader: RwLock<String>,
}

impl LeadershipState {
    pub fn new(self_id: impl Into<String>) -> Self {
        Self {
            self_id: self_id.into(),
            leader: RwLock::new(String::new()),
        }
    }

    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    /// Record the leader named by the latest notification.
    pub fn set_leader(&self, name: &str) {
        let mut leader = self.leader.write().unwrap_or_else(|e| e.into_inner());
        if *leader != name {
            name.clone_into(&mut leader);
        }
    }

    pub fn is_self_leader(&self) -> bool {
        let leader = self.leader.read().unwrap_or_else(|e| e.into_inner());
        *leader == self.self_id
    }

    pub fn snapshot(&self) -> LeaderInfo {
        let leader = self.leader.read().unwrap_or_else(|e| e.into_inner());
        LeaderInfo {
            name: leader.clone(),
        }
    }
}
