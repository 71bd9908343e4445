//! Admin resources exposed by the backend and their endpoint conventions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Revenue totals over an optional `from`/`to` range, read with `GET`.
pub const REVENUE_SUMMARY_PATH: &str = "/transactions/summary";

/// Resources managed from the admin dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Marketplace listings.
    Treasures,
    /// Treasure categories.
    Categories,
    /// Registered users.
    Users,
    /// Static content pages.
    Contents,
    /// Tips exchanged between users.
    Tips,
    /// Payment transactions.
    Transactions,
}

/// Unknown resource name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown resource `{value}`")]
pub struct ParseResourceError {
    /// Name that failed to parse.
    pub value: String,
}

impl ResourceKind {
    /// Every resource, in navigation order.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::Treasures,
            Self::Categories,
            Self::Users,
            Self::Contents,
            Self::Tips,
            Self::Transactions,
        ]
    }

    /// Stable lowercase name, also the first segment of cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Treasures => "treasures",
            Self::Categories => "categories",
            Self::Users => "users",
            Self::Contents => "contents",
            Self::Tips => "tips",
            Self::Transactions => "transactions",
        }
    }

    /// Resource-specific envelope key some list endpoints wrap rows in.
    #[must_use]
    pub const fn plural_key(self) -> &'static str {
        self.as_str()
    }

    /// List endpoint path relative to the API base URL.
    #[must_use]
    pub const fn list_path(self) -> &'static str {
        match self {
            Self::Treasures => "/treasures/all",
            Self::Categories => "/categories/all",
            Self::Users => "/users/all",
            Self::Contents => "/contents/all",
            Self::Tips => "/tips/all",
            Self::Transactions => "/transactions",
        }
    }

    /// Whether the list endpoint is read with `GET` instead of `POST`.
    #[must_use]
    pub const fn list_uses_get(self) -> bool {
        matches!(self, Self::Transactions)
    }

    /// Create endpoint path; transactions are read-only.
    #[must_use]
    pub const fn create_path(self) -> Option<&'static str> {
        match self {
            Self::Treasures => Some("/treasures/create"),
            Self::Categories => Some("/categories/create"),
            Self::Users => Some("/users/create"),
            Self::Contents => Some("/contents/create"),
            Self::Tips => Some("/tips/create"),
            Self::Transactions => None,
        }
    }

    /// Update endpoint path, when the resource supports updates.
    #[must_use]
    pub const fn update_path(self) -> Option<&'static str> {
        match self {
            Self::Treasures => Some("/treasures/update"),
            Self::Categories => Some("/categories/update"),
            Self::Users => Some("/users/update"),
            Self::Contents => Some("/contents/update"),
            Self::Tips | Self::Transactions => None,
        }
    }

    /// Delete endpoint path, when the resource supports deletion.
    #[must_use]
    pub const fn delete_path(self) -> Option<&'static str> {
        match self {
            Self::Treasures => Some("/treasures/delete"),
            Self::Categories => Some("/categories/delete"),
            Self::Users => Some("/users/delete"),
            Self::Contents => Some("/contents/delete"),
            Self::Tips | Self::Transactions => None,
        }
    }

    /// Single-record endpoint, posted with the id field in the body.
    ///
    /// Users have no such endpoint and are looked up through the list
    /// endpoint's `search` filter instead.
    #[must_use]
    pub const fn detail_path(self) -> Option<&'static str> {
        match self {
            Self::Treasures => Some("/treasures/detail"),
            Self::Categories => Some("/categories/details"),
            Self::Contents => Some("/contents/detail"),
            Self::Users | Self::Tips | Self::Transactions => None,
        }
    }

    /// Body field naming the target record on update/delete calls.
    #[must_use]
    pub const fn id_field(self) -> &'static str {
        match self {
            Self::Treasures => "treasureId",
            Self::Categories => "categoryId",
            Self::Users => "userId",
            Self::Contents => "contentId",
            Self::Tips => "tipId",
            Self::Transactions => "transactionId",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ParseResourceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::all()
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ParseResourceError {
                value: value.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::ResourceKind;

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in ResourceKind::all() {
            assert_eq!(kind.as_str().parse::<ResourceKind>(), Ok(kind));
        }
        assert_eq!(" Users ".parse::<ResourceKind>(), Ok(ResourceKind::Users));
        let err = "wallets".parse::<ResourceKind>().expect_err("unknown resource");
        assert_eq!(err.value, "wallets");
    }

    #[test]
    fn only_transactions_list_with_get() {
        let get_lists: Vec<_> = ResourceKind::all()
            .into_iter()
            .filter(|kind| kind.list_uses_get())
            .collect();
        assert_eq!(get_lists, vec![ResourceKind::Transactions]);
    }

    #[test]
    fn read_only_resources_have_no_write_paths() {
        assert!(ResourceKind::Tips.update_path().is_none());
        assert!(ResourceKind::Transactions.delete_path().is_none());
        assert!(ResourceKind::Transactions.create_path().is_none());
        assert_eq!(ResourceKind::Tips.create_path(), Some("/tips/create"));
        assert_eq!(ResourceKind::Users.update_path(), Some("/users/update"));
        assert_eq!(ResourceKind::Users.id_field(), "userId");
    }

    #[test]
    fn detail_paths_exist_only_for_posted_lookups() {
        assert_eq!(ResourceKind::Treasures.detail_path(), Some("/treasures/detail"));
        assert_eq!(ResourceKind::Categories.detail_path(), Some("/categories/details"));
        assert!(ResourceKind::Users.detail_path().is_none());
        assert!(ResourceKind::Transactions.detail_path().is_none());
    }
}
