use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::catalog::query::{window, Page, DEFAULT_PAGE_SIZE};
use crate::domain::user::{UserProfile, UserRole};
use crate::loyalty::TierTable;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleFilter {
    #[default]
    All,
    Admin,
    Professional,
    Client,
}

impl RoleFilter {
    fn matches(&self, user: &UserProfile) -> bool {
        match self {
            Self::All => true,
            Self::Admin => user.role() == UserRole::Admin,
            Self::Professional => user.role() == UserRole::Professional,
            Self::Client => user.role() == UserRole::Client,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSortField {
    Name,
    Email,
    #[serde(alias = "loyaltyPoints")]
    LoyaltyPoints,
    #[serde(alias = "createdAt")]
    CreatedAt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSort {
    pub field: UserSortField,
    pub direction: SortDirection,
}

impl Default for UserSort {
    fn default() -> Self {
        Self { field: UserSortField::CreatedAt, direction: SortDirection::Desc }
    }
}

impl UserSort {
    fn compare(&self, left: &UserProfile, right: &UserProfile) -> Ordering {
        let ordering = match self.field {
            UserSortField::Name => left.name.cmp(&right.name),
            UserSortField::Email => left.email.cmp(&right.email),
            UserSortField::LoyaltyPoints => left.loyalty_points.cmp(&right.loyalty_points),
            UserSortField::CreatedAt => left.created_at.cmp(&right.created_at),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Admin user-management listing parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuery {
    pub page: i64,
    pub page_size: i64,
    /// Case-insensitive substring matched against name or email.
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub role: RoleFilter,
    /// Exact loyalty level; `None` or `0` disables the filter.
    #[serde(default)]
    pub level: Option<u32>,
    /// `None` keeps storage order.
    #[serde(default)]
    pub sort: Option<UserSort>,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            query: None,
            role: RoleFilter::All,
            level: None,
            sort: Some(UserSort::default()),
        }
    }
}

pub fn filter_users(users: &[UserProfile], spec: &UserQuery, tiers: &TierTable) -> Page<UserProfile> {
    let query = spec.query.as_deref().filter(|query| !query.is_empty()).map(str::to_lowercase);
    let level = spec.level.filter(|level| *level > 0);

    let mut filtered: Vec<&UserProfile> = users
        .iter()
        .filter(|user| match &query {
            Some(query) => {
                user.name.to_lowercase().contains(query.as_str())
                    || user.email.to_lowercase().contains(query.as_str())
            }
            None => true,
        })
        .filter(|user| spec.role.matches(user))
        .filter(|user| match level {
            Some(level) => tiers.level_for(user.loyalty_points).level == level,
            None => true,
        })
        .collect();

    if let Some(sort) = spec.sort {
        // `sort_by` is stable, so ties keep storage order.
        filtered.sort_by(|left, right| sort.compare(left, right));
    }

    let total = filtered.len();
    let data = window(&filtered, spec.page, spec.page_size).into_iter().cloned().collect();
    Page { data, total }
}
