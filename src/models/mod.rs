use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single wishlist entry.
///
/// Serialized camelCase because the struct doubles as the persisted
/// document record and the API payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: i64,
    pub title: String,
    pub url: Option<String>,
    /// Stored verbatim; currency formatting is a display concern.
    pub price: Option<String>,
    pub note: Option<String>,
    /// Reference path (`/api/images/<id>.jpeg`) or null.
    pub image: Option<String>,
    pub date_added: DateTime<Utc>,
    /// Absent until the item is first updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<DateTime<Utc>>,
}

/// The client-supplied fields of an item, shared by create and update.
#[derive(Debug, Clone, Default)]
pub struct ItemFields {
    pub title: String,
    pub url: Option<String>,
    pub price: Option<String>,
    pub note: Option<String>,
    pub image: Option<String>,
}

// Request/Response types for API

#[derive(Debug, Deserialize)]
pub struct VerifyPinRequest {
    pub pin: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub title: String,
    pub currency: String,
    pub currency_symbol: String,
    pub require_pin: bool,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
