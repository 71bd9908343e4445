//! Cache identity for list fetches.

use std::fmt;

use tesoro_api_models::{ListParams, ResourceKind};

use crate::features::lists::pagination::PageRequest;

/// Resource, page coordinates and committed filters identifying one cached page.
///
/// Blank filter values are never stored, so an absent filter and an empty one
/// produce equal keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    resource: ResourceKind,
    page: u32,
    page_size: u32,
    filters: Vec<(String, String)>,
}

impl QueryKey {
    /// Key without filters.
    #[must_use]
    pub const fn new(resource: ResourceKind, request: PageRequest) -> Self {
        Self {
            resource,
            page: request.page,
            page_size: request.page_size,
            filters: Vec::new(),
        }
    }

    /// Append a filter, skipping blank values.
    #[must_use]
    pub fn with_filter(mut self, name: impl Into<String>, value: &str) -> Self {
        let value = value.trim();
        if !value.is_empty() {
            self.filters.push((name.into(), value.to_string()));
        }
        self
    }

    /// Append several filters in order.
    #[must_use]
    pub fn with_filters<I, N>(self, filters: I) -> Self
    where
        I: IntoIterator<Item = (N, String)>,
        N: Into<String>,
    {
        filters
            .into_iter()
            .fold(self, |key, (name, value)| key.with_filter(name, &value))
    }

    /// Resource this key belongs to.
    #[must_use]
    pub const fn resource(&self) -> ResourceKind {
        self.resource
    }

    /// Page coordinates.
    #[must_use]
    pub const fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            page_size: self.page_size,
        }
    }

    /// Committed filters in declared order.
    #[must_use]
    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    /// Wire parameters for the list endpoint.
    #[must_use]
    pub fn to_params(&self) -> ListParams {
        self.filters.iter().fold(
            ListParams::new(self.page, self.page_size),
            |params, (name, value)| params.with_filter(name.clone(), value.clone()),
        )
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}x{}]", self.resource, self.page, self.page_size)?;
        for (name, value) in &self.filters {
            write!(f, " {name}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::QueryKey;
    use crate::features::lists::pagination::PageRequest;
    use tesoro_api_models::ResourceKind;

    const FIRST: PageRequest = PageRequest {
        page: 1,
        page_size: 15,
    };

    #[test]
    fn empty_filters_match_absent_filters() {
        let bare = QueryKey::new(ResourceKind::Users, FIRST);
        let blank = QueryKey::new(ResourceKind::Users, FIRST)
            .with_filter("search", "")
            .with_filter("isPremium", "   ");
        assert_eq!(bare, blank);
    }

    #[test]
    fn every_field_participates_in_identity() {
        let base = QueryKey::new(ResourceKind::Users, FIRST).with_filter("search", "ana");
        assert_ne!(base, QueryKey::new(ResourceKind::Treasures, FIRST).with_filter("search", "ana"));
        assert_ne!(
            base,
            QueryKey::new(ResourceKind::Users, PageRequest { page: 2, ..FIRST })
                .with_filter("search", "ana")
        );
        assert_ne!(base, QueryKey::new(ResourceKind::Users, FIRST).with_filter("search", "bob"));
    }

    #[test]
    fn params_and_display_follow_filter_order() {
        let key = QueryKey::new(ResourceKind::Treasures, FIRST)
            .with_filters([("searchBy", "ring".to_string()), ("scope", "all".to_string())]);
        let params = key.to_params();
        assert_eq!(params.limit, 15);
        assert_eq!(params.filters.len(), 2);
        assert_eq!(key.to_string(), "treasures[1x15] searchBy=ring scope=all");
    }
}
