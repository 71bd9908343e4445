//! Create/edit form state and client-side validation.
//!
//! # Design
//! - Forms hold raw input strings; nothing is parsed until submit.
//! - Validation fails before any request is built, with a field-scoped [`UiError`].
//! - Lenient numeric fields fall back to zero instead of failing.

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::error::UiError;
use crate::features::lists::filters::Filters;

const REQUIRED: &str = "is required";

fn required(field: &'static str, value: &str) -> Result<String, UiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(UiError::validation(field, REQUIRED));
    }
    Ok(trimmed.to_string())
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse a number, treating blank, malformed or non-finite input as zero.
#[must_use]
pub fn lenient_number(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Split a photo list on newlines or commas, dropping blanks.
#[must_use]
pub fn split_photos(raw: &str) -> Vec<String> {
    raw.split(['\n', ','])
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Category editor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryForm {
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
}

/// Body sent when saving a category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryPayload {
    /// Trimmed name.
    pub name: String,
    /// Trimmed description.
    pub description: String,
}

impl CategoryForm {
    /// Validate and build the request body.
    ///
    /// # Errors
    /// Returns [`UiError::Validation`] when the name is blank.
    pub fn to_payload(&self) -> Result<CategoryPayload, UiError> {
        Ok(CategoryPayload {
            name: required("name", &self.name)?,
            description: self.description.trim().to_string(),
        })
    }
}

/// Static content page editor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentForm {
    /// Page name.
    pub name: String,
    /// HTML body, sent as typed.
    pub content: String,
}

/// Body sent when saving a content page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContentPayload {
    /// Trimmed name.
    pub name: String,
    /// Untouched body.
    pub content: String,
}

impl ContentForm {
    /// Validate and build the request body.
    ///
    /// # Errors
    /// Returns [`UiError::Validation`] when the name is blank.
    pub fn to_payload(&self) -> Result<ContentPayload, UiError> {
        Ok(ContentPayload {
            name: required("name", &self.name)?,
            content: self.content.clone(),
        })
    }
}

/// Treasure listing editor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreasureForm {
    /// Listing title.
    pub title: String,
    /// Asking price as typed.
    pub price: String,
    /// Category id.
    pub category: String,
    /// Condition label.
    pub condition: String,
    /// Brand name.
    pub brand: String,
    /// Model name.
    pub item_model: String,
    /// Item type.
    pub kind: String,
    /// Long description.
    pub description: String,
    /// Photo URLs, one per line or comma separated.
    pub photos: String,
    /// Street address.
    pub address: String,
    /// Latitude.
    pub lat: String,
    /// Longitude.
    pub lng: String,
    /// Maps place id.
    pub place_id: String,
}

/// Location block of a treasure body.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPayload {
    /// Street address.
    pub address: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Maps place id.
    pub place_id: String,
}

/// Body sent when saving a treasure.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreasurePayload {
    /// Listing title.
    pub title: String,
    /// Asking price; unparsable input becomes zero.
    pub price: f64,
    /// Category id.
    pub category: String,
    /// Condition label.
    pub condition: String,
    /// Brand name.
    pub brand: String,
    /// Model name.
    pub item_model: String,
    /// Item type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Long description.
    pub description: String,
    /// Photo URLs.
    pub photos: Vec<String>,
    /// Pickup location.
    pub location: LocationPayload,
}

impl TreasureForm {
    /// Validate and build the request body.
    ///
    /// # Errors
    /// Returns [`UiError::Validation`] when the title or category is blank.
    pub fn to_payload(&self) -> Result<TreasurePayload, UiError> {
        let title = required("title", &self.title)?;
        let category = required("category", &self.category)?;
        Ok(TreasurePayload {
            title,
            price: lenient_number(&self.price),
            category,
            condition: self.condition.trim().to_string(),
            brand: self.brand.trim().to_string(),
            item_model: self.item_model.trim().to_string(),
            kind: self.kind.trim().to_string(),
            description: self.description.clone(),
            photos: split_photos(&self.photos),
            location: LocationPayload {
                address: self.address.trim().to_string(),
                lat: lenient_number(&self.lat),
                lng: lenient_number(&self.lng),
                place_id: self.place_id.trim().to_string(),
            },
        })
    }
}

/// Role assigned to accounts created from the portal.
pub const DEFAULT_USER_ROLE: &str = "USER";

/// User editor; `user_id` selects update mode.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserForm {
    /// Existing account id; `None` creates a new account.
    pub user_id: Option<String>,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Avatar URL.
    pub profile_image: String,
    /// Current password, required by the backend to change it.
    pub current_password: String,
    /// New password; doubles as the initial password on create.
    pub new_password: String,
}

/// Body for creating an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewUserPayload {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Account role.
    pub role: &'static str,
}

/// Body for updating an account; password fields are sent only when filled in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdatePayload {
    /// Existing account id; `None` creates a new account.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    pub profile_image: String,
    /// Current password, required by the backend to change it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    /// New password; doubles as the initial password on create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

/// Create or update body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UserPayload {
    /// New account.
    Create(NewUserPayload),
    /// Edit of an existing account.
    Update(UserUpdatePayload),
}

impl UserForm {
    /// Validate and build the request body.
    ///
    /// # Errors
    /// Creating requires a name, an email containing `@` and a password.
    pub fn to_payload(&self) -> Result<UserPayload, UiError> {
        if let Some(user_id) = self.user_id.as_deref().and_then(optional) {
            return Ok(UserPayload::Update(UserUpdatePayload {
                user_id,
                name: self.name.trim().to_string(),
                profile_image: self.profile_image.trim().to_string(),
                current_password: optional(&self.current_password),
                new_password: optional(&self.new_password),
            }));
        }
        let name = required("name", &self.name)?;
        let email = required("email", &self.email)?;
        if !email.contains('@') {
            return Err(UiError::validation("email", "must contain @"));
        }
        if self.new_password.is_empty() {
            return Err(UiError::validation("password", REQUIRED));
        }
        Ok(UserPayload::Create(NewUserPayload {
            name,
            email,
            password: self.new_password.clone(),
            role: DEFAULT_USER_ROLE,
        }))
    }
}

/// Transactions date range, stored as `from`/`to` filters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DateRangeFilter {
    /// Inclusive start, `YYYY-MM-DD` or blank.
    pub from: String,
    /// Inclusive end, `YYYY-MM-DD` or blank.
    pub to: String,
}

/// Filter name for the range start.
pub const FROM_FILTER: &str = "from";
/// Filter name for the range end.
pub const TO_FILTER: &str = "to";

impl DateRangeFilter {
    /// Current range from committed filters.
    #[must_use]
    pub fn from_filters(filters: &Filters) -> Self {
        Self {
            from: filters.value(FROM_FILTER),
            to: filters.value(TO_FILTER),
        }
    }

    /// Parse both ends.
    ///
    /// # Errors
    /// Returns [`UiError::Validation`] for malformed dates or `from` after `to`.
    pub fn parse(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), UiError> {
        let from = parse_date(FROM_FILTER, &self.from)?;
        let to = parse_date(TO_FILTER, &self.to)?;
        if let (Some(start), Some(end)) = (from, to)
            && start > end
        {
            return Err(UiError::validation(FROM_FILTER, "must not be after to"));
        }
        Ok((from, to))
    }

    /// Validate and commit both ends. Returns whether any filter changed.
    ///
    /// # Errors
    /// Propagates [`Self::parse`] failures without writing anything.
    pub fn apply(&self, filters: &Filters) -> Result<bool, UiError> {
        let (from, to) = self.parse()?;
        let render = |date: Option<NaiveDate>| {
            date.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        };
        let from_changed = filters.set(FROM_FILTER, &render(from));
        let to_changed = filters.set(TO_FILTER, &render(to));
        Ok(from_changed || to_changed)
    }
}

fn parse_date(field: &'static str, raw: &str) -> Result<Option<NaiveDate>, UiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| UiError::validation(field, "must be a YYYY-MM-DD date"))
}
