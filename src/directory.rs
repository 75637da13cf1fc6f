//!
//! Node directory: the static roster of monitored hosts.
//!
//! The directory owns the roster exclusively; every other component reads it
//! through cloned views. A refresh replaces the roster atomically, so readers
//! never observe a partially applied fetch.
use crate::types::{HostRecord, LiveSnapshot, LoadHistory, PingHistory};
use crate::view::GroupFilter;
use crate::{Client, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Load state of the directory
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// No fetch has been issued yet
    Idle,
    /// A fetch is in flight
    Loading,
    /// The roster reflects the latest successful fetch
    Ready,
    /// The latest fetch failed; any prior roster remains usable
    Error,
}

#[derive(Debug)]
struct DirectoryState {
    roster: Vec<HostRecord>,
    phase: Phase,
    error: Option<String>,
    /// Latched once the first fetch settles, success or failure. Gates the
    /// live feed: no "online" claims about hosts we have never listed.
    settled: bool,
}

impl DirectoryState {
    fn apply_success(&mut self, mut roster: Vec<HostRecord>) {
        // Stable, so hosts with equal weight keep their fetch order.
        roster.sort_by_key(|host| host.weight);
        self.roster = roster;
        self.phase = Phase::Ready;
        self.error = None;
        self.settled = true;
    }

    fn apply_failure(&mut self, message: String) {
        self.phase = Phase::Error;
        self.error = Some(message);
        self.settled = true;
    }
}

/// The roster of monitored hosts, fetched from `v1/nodes`.
#[derive(Clone)]
pub struct NodeDirectory {
    client: Client,
    state: Arc<RwLock<DirectoryState>>,
    load_cache: Arc<Mutex<HashMap<(String, u32), LoadHistory>>>,
    ping_cache: Arc<Mutex<HashMap<(String, u32), PingHistory>>>,
}

impl NodeDirectory {
    /// Create a directory bound to `client`. No fetch is issued until
    /// [`refresh`](Self::refresh) is called.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(DirectoryState {
                roster: Vec::new(),
                phase: Phase::Idle,
                error: None,
                settled: false,
            })),
            load_cache: Arc::new(Mutex::new(HashMap::new())),
            ping_cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Fetch the roster and replace the in-memory copy atomically.
    ///
    /// On failure the previous roster stays intact and the error message is
    /// recorded for display; there is no automatic retry. Safe to call while
    /// another refresh is in flight: whichever fetch resolves last wins.
    pub async fn refresh(&self) -> Result<()> {
        self.state.write().await.phase = Phase::Loading;

        match self.client.nodes().await {
            Ok(roster) => {
                tracing::debug!("directory refresh returned {} hosts", roster.len());
                self.state.write().await.apply_success(roster);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("directory refresh failed: {}", e);
                self.state.write().await.apply_failure(e.to_string());
                Err(e)
            }
        }
    }

    /// The current roster, sorted ascending by weight
    pub async fn roster(&self) -> Vec<HostRecord> {
        self.state.read().await.roster.clone()
    }

    /// Current load state
    pub async fn phase(&self) -> Phase {
        self.state.read().await.phase
    }

    /// Message of the most recent failed fetch, cleared by the next
    /// successful one
    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Whether the first fetch has settled (success or failure)
    pub async fn settled(&self) -> bool {
        self.state.read().await.settled
    }

    /// Distinct non-empty group labels, in first-seen roster order
    pub async fn groups(&self) -> Vec<String> {
        distinct_groups(&self.state.read().await.roster)
    }

    /// The subsequence of the roster matching `filter`
    pub async fn nodes_in_group(&self, filter: &GroupFilter) -> Vec<HostRecord> {
        self.state
            .read()
            .await
            .roster
            .iter()
            .filter(|host| filter.matches(&host.group))
            .cloned()
            .collect()
    }

    /// Most recent metric records for one host, fetched fresh on every call.
    ///
    /// A lookup failure is logged and surfaced as `None`; "no data" is a
    /// normal displayable state, not a fault.
    pub async fn recent_stats(&self, uuid: &str) -> Option<Vec<LiveSnapshot>> {
        match self.client.recent_stats(uuid).await {
            Ok(records) => Some(records),
            Err(e) => {
                tracing::warn!("recent stats lookup for {} failed: {}", uuid, e);
                None
            }
        }
    }

    /// Load history for one host, cached by `(uuid, hours)` so repeated
    /// requests for the same window skip the round-trip
    pub async fn load_history(&self, uuid: &str, hours: u32) -> Option<LoadHistory> {
        let key = (uuid.to_string(), hours);
        if let Some(hit) = self.load_cache.lock().await.get(&key) {
            return Some(hit.clone());
        }

        match self.client.load_history(uuid, hours).await {
            Ok(history) => {
                self.load_cache.lock().await.insert(key, history.clone());
                Some(history)
            }
            Err(e) => {
                tracing::warn!("load history lookup for {} failed: {}", uuid, e);
                None
            }
        }
    }

    /// Ping history for one host, cached by `(uuid, hours)`
    pub async fn ping_history(&self, uuid: &str, hours: u32) -> Option<PingHistory> {
        let key = (uuid.to_string(), hours);
        if let Some(hit) = self.ping_cache.lock().await.get(&key) {
            return Some(hit.clone());
        }

        match self.client.ping_history(uuid, hours).await {
            Ok(history) => {
                self.ping_cache.lock().await.insert(key, history.clone());
                Some(history)
            }
            Err(e) => {
                tracing::warn!("ping history lookup for {} failed: {}", uuid, e);
                None
            }
        }
    }
}

fn distinct_groups(roster: &[HostRecord]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    roster
        .iter()
        .filter(|host| !host.group.is_empty())
        .filter(|host| seen.insert(host.group.as_str()))
        .map(|host| host.group.clone())
        .collect()
}

#[cfg(test)]
mod test {
    use super::{distinct_groups, DirectoryState, Phase};
    use crate::types::HostRecord;

    fn host(uuid: &str, weight: i64, group: &str) -> HostRecord {
        HostRecord {
            uuid: uuid.to_string(),
            name: uuid.to_string(),
            weight,
            group: group.to_string(),
            ..Default::default()
        }
    }

    fn fresh() -> DirectoryState {
        DirectoryState {
            roster: Vec::new(),
            phase: Phase::Idle,
            error: None,
            settled: false,
        }
    }

    #[test]
    fn weight_sort_is_stable() {
        let mut state = fresh();
        state.apply_success(vec![
            host("a", 3, ""),
            host("b", 1, ""),
            host("c", 4, ""),
            host("d", 1, ""),
            host("e", 5, ""),
        ]);

        let order: Vec<&str> = state.roster.iter().map(|h| h.uuid.as_str()).collect();
        // Weights [3,1,4,1,5] -> [1,1,3,4,5], the tied 1s keep fetch order.
        assert_eq!(order, vec!["b", "d", "a", "c", "e"]);
        assert_eq!(state.phase, Phase::Ready);
        assert!(state.settled);
    }

    #[test]
    fn failure_keeps_previous_roster() {
        let mut state = fresh();
        state.apply_success(vec![host("a", 1, ""), host("b", 2, "")]);
        state.apply_failure("connection refused".to_string());

        assert_eq!(state.roster.len(), 2);
        assert_eq!(state.phase, Phase::Error);
        assert_eq!(state.error.as_deref(), Some("connection refused"));

        // A later successful fetch clears the recorded error.
        state.apply_success(vec![host("c", 1, "")]);
        assert!(state.error.is_none());
        assert_eq!(state.phase, Phase::Ready);
    }

    #[test]
    fn groups_first_seen_dedup() {
        let roster = vec![
            host("a", 1, "eu"),
            host("b", 2, ""),
            host("c", 3, "us"),
            host("d", 4, "eu"),
            host("e", 5, "asia"),
        ];
        assert_eq!(distinct_groups(&roster), vec!["eu", "us", "asia"]);
    }
}
