//! Static list definitions for each admin resource.

use tesoro_api_models::ResourceKind;

use crate::core::config::DEFAULT_PAGE_SIZE;
use crate::features::lists::filters::FilterSpec;

/// Filter and paging defaults for one resource list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListSpec {
    /// Resource the list shows.
    pub resource: ResourceKind,
    /// Filters in the order they are sent to the backend.
    pub filters: &'static [FilterSpec],
    /// Page size used when the URL carries none.
    pub default_page_size: u32,
}

const TREASURE_FILTERS: &[FilterSpec] = &[
    FilterSpec::search("searchBy"),
    FilterSpec::select("category"),
    FilterSpec::select("condition"),
    FilterSpec::select("scope").with_default("all"),
];
const USER_FILTERS: &[FilterSpec] = &[FilterSpec::search("search"), FilterSpec::select("isPremium")];
const CATEGORY_FILTERS: &[FilterSpec] = &[FilterSpec::search("searchBy")];
const TRANSACTION_FILTERS: &[FilterSpec] = &[FilterSpec::select("from"), FilterSpec::select("to")];

impl ListSpec {
    /// Definition for `resource`.
    #[must_use]
    pub const fn for_resource(resource: ResourceKind) -> Self {
        let filters = match resource {
            ResourceKind::Treasures => TREASURE_FILTERS,
            ResourceKind::Users => USER_FILTERS,
            ResourceKind::Categories => CATEGORY_FILTERS,
            ResourceKind::Transactions => TRANSACTION_FILTERS,
            ResourceKind::Contents | ResourceKind::Tips => &[],
        };
        Self {
            resource,
            filters,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the default page size (zero keeps the current one).
    #[must_use]
    pub const fn with_default_page_size(mut self, page_size: u32) -> Self {
        if page_size > 0 {
            self.default_page_size = page_size;
        }
        self
    }

    /// Look up a filter by name.
    #[must_use]
    pub fn filter(&self, name: &str) -> Option<&'static FilterSpec> {
        self.filters.iter().find(|spec| spec.name == name)
    }

    /// Filters edited through a debounced text box.
    pub fn debounced(&self) -> impl Iterator<Item = &'static FilterSpec> {
        self.filters.iter().filter(|spec| spec.debounced)
    }
}
