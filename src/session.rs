//!
//! Session-scoped view state.
//!
//! Group selection, search text and sort state survive navigation within one
//! dashboard session. The state is an ordinary owned value held by whoever
//! drives the views; nothing here is process-global.
use crate::view::{GroupFilter, SortKey, SortOrder, ViewQuery};

/// View parameters for one dashboard session
#[derive(Clone, Debug, Default)]
pub struct ViewSession {
    selected_group: GroupFilter,
    search: String,
    sort_key: Option<SortKey>,
    sort_order: SortOrder,
}

impl ViewSession {
    /// All hosts, no search, weight order
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected group
    #[must_use]
    pub fn selected_group(&self) -> &GroupFilter {
        &self.selected_group
    }

    pub fn select_group(&mut self, group: GroupFilter) {
        self.selected_group = group;
    }

    /// Current search text
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    /// Selecting the active key flips the direction; selecting another key
    /// starts over descending.
    pub fn toggle_sort(&mut self, key: SortKey) {
        if self.sort_key == Some(key) {
            self.sort_order = match self.sort_order {
                SortOrder::Asc => SortOrder::Desc,
                SortOrder::Desc => SortOrder::Asc,
            };
        } else {
            self.sort_key = Some(key);
            self.sort_order = SortOrder::Desc;
        }
    }

    /// Drop back to weight order
    pub fn clear_sort(&mut self) {
        self.sort_key = None;
        self.sort_order = SortOrder::default();
    }

    /// Active sort, if any
    #[must_use]
    pub fn sort(&self) -> Option<(SortKey, SortOrder)> {
        self.sort_key.map(|key| (key, self.sort_order))
    }

    /// The derivation query for the current state
    #[must_use]
    pub fn query(&self) -> ViewQuery {
        ViewQuery {
            group: self.selected_group.clone(),
            search: self.search.clone(),
            sort: self.sort(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::ViewSession;
    use crate::view::{GroupFilter, SortKey, SortOrder};

    #[test]
    fn toggle_sort_flips_and_resets() {
        let mut session = ViewSession::new();
        assert_eq!(session.sort(), None);

        session.toggle_sort(SortKey::TrafficUp);
        assert_eq!(session.sort(), Some((SortKey::TrafficUp, SortOrder::Desc)));

        session.toggle_sort(SortKey::TrafficUp);
        assert_eq!(session.sort(), Some((SortKey::TrafficUp, SortOrder::Asc)));

        // A different key starts over descending.
        session.toggle_sort(SortKey::SpeedDown);
        assert_eq!(session.sort(), Some((SortKey::SpeedDown, SortOrder::Desc)));

        session.clear_sort();
        assert_eq!(session.sort(), None);
    }

    #[test]
    fn query_reflects_state() {
        let mut session = ViewSession::new();
        session.select_group(GroupFilter::Group("eu".to_string()));
        session.set_search("web");
        session.toggle_sort(SortKey::TrafficDown);

        let query = session.query();
        assert_eq!(query.group, GroupFilter::Group("eu".to_string()));
        assert_eq!(query.search, "web");
        assert_eq!(query.sort, Some((SortKey::TrafficDown, SortOrder::Desc)));
    }
}
