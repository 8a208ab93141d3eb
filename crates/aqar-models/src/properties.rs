//! Property listing models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use aqar_core::PaginationMeta;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    /// Asking price in the smallest currency unit.
    pub price: i64,
    pub city: String,
    pub address: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area_sqm: Option<i32>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyImage {
    pub id: Uuid,
    pub property_id: Uuid,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub storage_key: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// A property with its images, as shown to a viewer.
///
/// `isOwner` is present only when the request carried a valid credential.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyListing {
    #[serde(flatten)]
    pub property: Property,
    pub images: Vec<PropertyImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_owner: Option<bool>,
}

impl PropertyListing {
    /// Builds a listing, computing ownership against the viewer if any.
    pub fn for_viewer(property: Property, images: Vec<PropertyImage>, viewer: Option<Uuid>) -> Self {
        let is_owner = viewer.map(|id| id == property.owner_id);
        Self {
            property,
            images,
            is_owner,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyDto {
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    #[schema(example = "Two-bedroom flat in Abdoun")]
    pub title: String,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,
    #[validate(range(min = 0, message = "Price must be a positive number"))]
    pub price: i64,
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,
    pub address: Option<String>,
    #[validate(range(min = 0, max = 100, message = "Bedrooms must be between 0 and 100"))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0, max = 100, message = "Bathrooms must be between 0 and 100"))]
    pub bathrooms: Option<i32>,
    #[validate(range(min = 1, message = "Area must be greater than zero"))]
    pub area_sqm: Option<i32>,
}

/// Listing filters, combined with page/limit parameters.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PropertyFilter {
    /// Case-insensitive city match
    pub city: Option<String>,
    /// Only listings owned by this user
    pub owner_id: Option<Uuid>,
}

impl PropertyFilter {
    /// The city filter, ignoring blank values.
    pub fn city(&self) -> Option<&str> {
        self.city.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedPropertiesResponse {
    pub success: bool,
    pub data: Vec<PropertyListing>,
    pub meta: PaginationMeta,
}
