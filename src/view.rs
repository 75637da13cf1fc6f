//!
//! View derivation pipeline.
//!
//! A pure function from (roster, snapshot map, query) to the filtered,
//! ordered node list plus aggregate statistics. Re-run on every input change;
//! identical inputs always produce identical output.
use crate::types::{HostRecord, LiveSnapshot, SnapshotMap};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Group selection for list views
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum GroupFilter {
    /// Keep every host
    #[default]
    All,
    /// Keep exact label matches only
    Group(String),
}

impl GroupFilter {
    /// Whether a host with `group` passes this filter
    #[must_use]
    pub fn matches(&self, group: &str) -> bool {
        match self {
            Self::All => true,
            Self::Group(label) => label == group,
        }
    }
}

/// Snapshot field a list view can be ordered by
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Cumulative bytes uploaded
    TrafficUp,
    /// Cumulative bytes downloaded
    TrafficDown,
    /// Instantaneous upload rate
    SpeedUp,
    /// Instantaneous download rate
    SpeedDown,
}

/// Sort direction
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Parameters of one derivation pass
#[derive(Clone, Debug, Default)]
pub struct ViewQuery {
    pub group: GroupFilter,
    /// Case-insensitive substring match on the display name; empty matches
    /// everything
    pub search: String,
    /// At most one sort key is active at a time; `None` keeps weight order
    pub sort: Option<(SortKey, SortOrder)>,
}

/// A host joined with its latest snapshot, if any. Derived and short-lived,
/// never stored.
#[derive(Clone, Copy, Debug)]
pub struct MergedNode<'a> {
    pub host: &'a HostRecord,
    /// Absent means the host is treated as offline for display purposes,
    /// regardless of any stale `online` flag
    pub snapshot: Option<&'a LiveSnapshot>,
}

/// Aggregate statistics over one derived list
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ViewStats {
    /// Hosts with a snapshot whose online flag is set
    pub online_count: usize,
    pub total_count: usize,
    /// Distinct region codes among the listed hosts
    pub unique_regions: usize,
    /// Summed cumulative upload bytes; hosts without a snapshot contribute 0
    pub total_traffic_up: u64,
    pub total_traffic_down: u64,
    /// Summed instantaneous rates in bytes/s
    pub current_speed_up: u64,
    pub current_speed_down: u64,
}

/// Result of one derivation pass
#[derive(Clone, Debug)]
pub struct NodeView<'a> {
    pub nodes: Vec<MergedNode<'a>>,
    pub stats: ViewStats,
}

/// Merge, filter, sort and aggregate in one pass.
///
/// Snapshots are attached by uuid lookup; a snapshot with no matching roster
/// entry is never surfaced. The sort is stable: ties keep the post-filter
/// order, which itself derives from the directory's weight order.
#[must_use]
pub fn derive_view<'a>(
    roster: &'a [HostRecord],
    snapshots: &'a SnapshotMap,
    query: &ViewQuery,
) -> NodeView<'a> {
    let search = query.search.to_lowercase();

    let mut nodes: Vec<MergedNode<'a>> = roster
        .iter()
        .map(|host| MergedNode {
            host,
            snapshot: snapshots.get(&host.uuid),
        })
        .filter(|node| query.group.matches(&node.host.group))
        .filter(|node| search.is_empty() || node.host.name.to_lowercase().contains(&search))
        .collect();

    if let Some((key, order)) = query.sort {
        match order {
            SortOrder::Asc => nodes.sort_by_key(|node| sort_value(node, key)),
            SortOrder::Desc => {
                nodes.sort_by_key(|node| std::cmp::Reverse(sort_value(node, key)));
            }
        }
    }

    let stats = aggregate(&nodes);
    NodeView { nodes, stats }
}

/// Sort value of one node; a missing snapshot counts as zero
fn sort_value(node: &MergedNode<'_>, key: SortKey) -> u64 {
    node.snapshot.map_or(0, |snap| match key {
        SortKey::TrafficUp => snap.net_total_up,
        SortKey::TrafficDown => snap.net_total_down,
        SortKey::SpeedUp => snap.net_out,
        SortKey::SpeedDown => snap.net_in,
    })
}

fn aggregate(nodes: &[MergedNode<'_>]) -> ViewStats {
    let mut stats = ViewStats {
        total_count: nodes.len(),
        ..ViewStats::default()
    };

    let mut regions = HashSet::new();
    for node in nodes {
        regions.insert(node.host.region.as_str());
        if let Some(snap) = node.snapshot {
            if snap.online {
                stats.online_count += 1;
            }
            stats.total_traffic_up += snap.net_total_up;
            stats.total_traffic_down += snap.net_total_down;
            stats.current_speed_up += snap.net_out;
            stats.current_speed_down += snap.net_in;
        }
    }
    stats.unique_regions = regions.len();

    stats
}

#[cfg(test)]
mod test {
    use super::{derive_view, GroupFilter, SortKey, SortOrder, ViewQuery};
    use crate::types::{HostRecord, LiveSnapshot, SnapshotMap};

    fn host(uuid: &str, name: &str, group: &str, region: &str) -> HostRecord {
        HostRecord {
            uuid: uuid.to_string(),
            name: name.to_string(),
            group: group.to_string(),
            region: region.to_string(),
            ..Default::default()
        }
    }

    fn snapshot(online: bool, net_total_up: u64) -> LiveSnapshot {
        LiveSnapshot {
            online,
            net_total_up,
            net_total_down: 10,
            net_in: 1,
            net_out: 2,
            ..Default::default()
        }
    }

    #[test]
    fn search_is_case_insensitive() {
        let roster = vec![
            host("a", "WebServer1", "", ""),
            host("b", "db-node", "", ""),
            host("c", "Web2", "", ""),
        ];
        let snapshots = SnapshotMap::new();
        let query = ViewQuery {
            search: "web".to_string(),
            ..ViewQuery::default()
        };

        let view = derive_view(&roster, &snapshots, &query);
        let names: Vec<&str> = view.nodes.iter().map(|n| n.host.name.as_str()).collect();
        assert_eq!(names, vec!["WebServer1", "Web2"]);
    }

    #[test]
    fn group_filter_exact_match() {
        let roster = vec![
            host("a", "n1", "eu", ""),
            host("b", "n2", "us", ""),
            host("c", "n3", "eu", ""),
        ];
        let snapshots = SnapshotMap::new();

        let all = derive_view(&roster, &snapshots, &ViewQuery::default());
        assert_eq!(all.nodes.len(), 3);

        let query = ViewQuery {
            group: GroupFilter::Group("eu".to_string()),
            ..ViewQuery::default()
        };
        let eu = derive_view(&roster, &snapshots, &query);
        let uuids: Vec<&str> = eu.nodes.iter().map(|n| n.host.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["a", "c"]);
    }

    #[test]
    fn descending_sort_is_stable() {
        let roster = vec![
            host("a", "n1", "", ""),
            host("b", "n2", "", ""),
            host("c", "n3", "", ""),
            host("d", "n4", "", ""),
        ];
        let mut snapshots = SnapshotMap::new();
        snapshots.insert("a".to_string(), snapshot(true, 10));
        snapshots.insert("b".to_string(), snapshot(true, 50));
        snapshots.insert("c".to_string(), snapshot(true, 0));
        snapshots.insert("d".to_string(), snapshot(true, 50));

        let query = ViewQuery {
            sort: Some((SortKey::TrafficUp, SortOrder::Desc)),
            ..ViewQuery::default()
        };
        let view = derive_view(&roster, &snapshots, &query);
        let uuids: Vec<&str> = view.nodes.iter().map(|n| n.host.uuid.as_str()).collect();
        // The tied 50s keep their original relative order.
        assert_eq!(uuids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn missing_snapshot_sorts_as_zero() {
        let roster = vec![host("a", "n1", "", ""), host("b", "n2", "", "")];
        let mut snapshots = SnapshotMap::new();
        snapshots.insert("b".to_string(), snapshot(true, 7));

        let query = ViewQuery {
            sort: Some((SortKey::TrafficUp, SortOrder::Asc)),
            ..ViewQuery::default()
        };
        let view = derive_view(&roster, &snapshots, &query);
        let uuids: Vec<&str> = view.nodes.iter().map(|n| n.host.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["a", "b"]);
    }

    #[test]
    fn aggregates_over_filtered_list() {
        let roster = vec![
            host("a", "n1", "", "eu"),
            host("b", "n2", "", "eu"),
            host("c", "n3", "", "us"),
        ];
        let mut snapshots = SnapshotMap::new();
        snapshots.insert("a".to_string(), snapshot(true, 100));
        snapshots.insert("b".to_string(), snapshot(false, 40));
        // "c" has no snapshot and contributes zero to every sum.

        let view = derive_view(&roster, &snapshots, &ViewQuery::default());
        assert_eq!(view.stats.online_count, 1);
        assert_eq!(view.stats.total_count, 3);
        assert_eq!(view.stats.unique_regions, 2);
        assert_eq!(view.stats.total_traffic_up, 140);
        assert_eq!(view.stats.total_traffic_down, 20);
        assert_eq!(view.stats.current_speed_up, 4);
        assert_eq!(view.stats.current_speed_down, 2);
    }

    #[test]
    fn orphan_snapshot_is_inert() {
        let roster = vec![host("a", "n1", "", "")];
        let mut snapshots = SnapshotMap::new();
        snapshots.insert("ghost".to_string(), snapshot(true, 999));

        let view = derive_view(&roster, &snapshots, &ViewQuery::default());
        assert_eq!(view.nodes.len(), 1);
        assert!(view.nodes[0].snapshot.is_none());
        assert_eq!(view.stats.total_traffic_up, 0);
        assert_eq!(view.stats.online_count, 0);
    }
}
