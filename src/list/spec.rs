//! Per-entity list capabilities: which columns may be searched, sorted and filtered.

use crate::sql::ColumnRef;

/// Capability descriptor for one listable entity. Nothing outside these
/// declarations is ever searched, sorted or filtered on.
#[derive(Clone, Debug)]
pub struct ListSpec {
    primary_key: ColumnRef,
    default_sort: ColumnRef,
    searchable: Vec<ColumnRef>,
    sortable: Vec<ColumnRef>,
    filterable: Vec<ColumnRef>,
    paginate_by_default: bool,
    default_limit: Option<u32>,
}

impl ListSpec {
    pub fn new(primary_key: ColumnRef, default_sort: ColumnRef) -> Self {
        ListSpec {
            primary_key,
            default_sort,
            searchable: Vec::new(),
            sortable: Vec::new(),
            filterable: Vec::new(),
            paginate_by_default: true,
            default_limit: None,
        }
    }

    pub fn searchable(mut self, columns: impl IntoIterator<Item = ColumnRef>) -> Self {
        self.searchable.extend(columns);
        self
    }

    pub fn sortable(mut self, columns: impl IntoIterator<Item = ColumnRef>) -> Self {
        self.sortable.extend(columns);
        self
    }

    pub fn filterable(mut self, columns: impl IntoIterator<Item = ColumnRef>) -> Self {
        self.filterable.extend(columns);
        self
    }

    pub fn paginate_by_default(mut self, on: bool) -> Self {
        self.paginate_by_default = on;
        self
    }

    pub fn default_limit(mut self, limit: u32) -> Self {
        self.default_limit = Some(limit.max(1));
        self
    }

    pub fn primary_key(&self) -> &ColumnRef {
        &self.primary_key
    }

    pub fn default_sort(&self) -> &ColumnRef {
        &self.default_sort
    }

    pub fn searchable_columns(&self) -> &[ColumnRef] {
        &self.searchable
    }

    pub fn pagination_default(&self) -> bool {
        self.paginate_by_default
    }

    pub fn limit_default(&self) -> Option<u32> {
        self.default_limit
    }

    /// Sort allow-list: default sort, searchable, sortable, primary key.
    pub fn sort_column(&self, name: &str) -> Option<&ColumnRef> {
        std::iter::once(&self.default_sort)
            .chain(&self.searchable)
            .chain(&self.sortable)
            .chain(std::iter::once(&self.primary_key))
            .find(|c| c.name() == name)
    }

    /// Filter allow-list: filterable plus everything sortable.
    pub fn filter_column(&self, name: &str) -> Option<&ColumnRef> {
        self.filterable
            .iter()
            .find(|c| c.name() == name)
            .or_else(|| self.sort_column(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ColumnKind;

    fn spec() -> ListSpec {
        ListSpec::new(
            ColumnRef::new("id", ColumnKind::Integer).unwrap(),
            ColumnRef::new("created_at", ColumnKind::Timestamp).unwrap(),
        )
        .searchable([ColumnRef::text("student_name").unwrap()])
        .sortable([ColumnRef::new("amount", ColumnKind::Numeric).unwrap()])
        .filterable([ColumnRef::text("status").unwrap()])
    }

    #[test]
    fn sort_allow_list() {
        let s = spec();
        for ok in ["created_at", "student_name", "amount", "id"] {
            assert!(s.sort_column(ok).is_some(), "{}", ok);
        }
        assert!(s.sort_column("status").is_none());
        assert!(s.sort_column("password_hash").is_none());
    }

    #[test]
    fn filter_allow_list_includes_sortable() {
        let s = spec();
        assert_eq!(s.filter_column("status").map(|c| c.name()), Some("status"));
        assert_eq!(s.filter_column("amount").map(|c| c.kind()), Some(ColumnKind::Numeric));
        assert!(s.filter_column("secret").is_none());
    }

    #[test]
    fn defaults() {
        let s = spec();
        assert!(s.pagination_default());
        assert_eq!(s.limit_default(), None);
        assert_eq!(spec().default_limit(0).limit_default(), Some(1));
    }
}
