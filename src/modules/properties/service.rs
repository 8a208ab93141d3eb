use std::collections::HashMap;

use axum::extract::Multipart;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use aqar_core::file_storage::{FileStorage, UploadLimits};
use aqar_core::{ApiError, PaginationParams};
use aqar_models::{
    CreatePropertyDto, PaginatedPropertiesResponse, Property, PropertyFilter, PropertyImage,
    PropertyListing,
};

use crate::metrics::track_images_uploaded;

const PROPERTY_COLUMNS: &str = "id, owner_id, title, description, price, city, address, \
     bedrooms, bathrooms, area_sqm, views, created_at, updated_at";

const IMAGE_COLUMNS: &str = "id, property_id, storage_key, url, created_at";

/// An image accepted from a multipart body, not yet stored.
#[derive(Debug, Clone)]
pub struct Upload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub struct PropertyService;

impl PropertyService {
    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        pagination: &PaginationParams,
        filter: &PropertyFilter,
        viewer: Option<Uuid>,
    ) -> Result<PaginatedPropertiesResponse, ApiError> {
        let city = filter.city();

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM properties
             WHERE ($1::text IS NULL OR city ILIKE $1)
               AND ($2::uuid IS NULL OR owner_id = $2)",
        )
        .bind(city)
        .bind(filter.owner_id)
        .fetch_one(db)
        .await?;

        let properties = sqlx::query_as::<_, Property>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties
             WHERE ($1::text IS NULL OR city ILIKE $1)
               AND ($2::uuid IS NULL OR owner_id = $2)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(city)
        .bind(filter.owner_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        let ids: Vec<Uuid> = properties.iter().map(|p| p.id).collect();
        let mut images = Self::images_for(db, &ids).await?;

        let data = properties
            .into_iter()
            .map(|property| {
                let images = images.remove(&property.id).unwrap_or_default();
                PropertyListing::for_viewer(property, images, viewer)
            })
            .collect();

        Ok(PaginatedPropertiesResponse {
            success: true,
            data,
            meta: pagination.meta(total),
        })
    }

    /// Loads one listing and counts the view unless the viewer owns it.
    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, id: Uuid, viewer: Option<Uuid>) -> Result<PropertyListing, ApiError> {
        let mut property = Self::find(db, id).await?;

        if viewer != Some(property.owner_id) {
            property.views = sqlx::query_scalar(
                "UPDATE properties SET views = views + 1 WHERE id = $1 RETURNING views",
            )
            .bind(id)
            .fetch_one(db)
            .await?;
        }

        let images = Self::images_for(db, &[id]).await?.remove(&id).unwrap_or_default();
        Ok(PropertyListing::for_viewer(property, images, viewer))
    }

    #[instrument(skip(db, dto))]
    pub async fn create(db: &PgPool, owner_id: Uuid, dto: CreatePropertyDto) -> Result<Property, ApiError> {
        let property = sqlx::query_as::<_, Property>(&format!(
            "INSERT INTO properties
                 (owner_id, title, description, price, city, address, bedrooms, bathrooms, area_sqm)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {PROPERTY_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(dto.title.trim())
        .bind(dto.description.trim())
        .bind(dto.price)
        .bind(dto.city.trim())
        .bind(dto.address.as_deref().map(str::trim))
        .bind(dto.bedrooms)
        .bind(dto.bathrooms)
        .bind(dto.area_sqm)
        .fetch_one(db)
        .await?;

        info!(property_id = %property.id, %owner_id, "property created");
        Ok(property)
    }

    /// Deletes a listing owned by `owner_id` together with its stored images.
    #[instrument(skip(db, storage))]
    pub async fn delete(
        db: &PgPool,
        storage: &dyn FileStorage,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<(), ApiError> {
        Self::ensure_owner(db, id, owner_id).await?;

        let keys: Vec<String> =
            sqlx::query_scalar("SELECT storage_key FROM property_images WHERE property_id = $1")
                .bind(id)
                .fetch_all(db)
                .await?;

        sqlx::query("DELETE FROM properties WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(db)
            .await?;

        for key in &keys {
            if let Err(err) = storage.delete(key).await {
                warn!(%key, error = %err, "failed to remove stored image");
            }
        }

        info!(property_id = %id, "property deleted");
        Ok(())
    }

    /// Reads every file part, enforcing count, type and size limits.
    ///
    /// Non-file fields are skipped.
    pub async fn collect_uploads(
        multipart: &mut Multipart,
        limits: &UploadLimits,
    ) -> Result<Vec<Upload>, ApiError> {
        let mut uploads = Vec::new();

        while let Some(mut field) = multipart.next_field().await? {
            if field.file_name().is_none() {
                continue;
            }

            limits.check_count(uploads.len())?;
            limits.check_mime(field.content_type())?;
            let content_type = field.content_type().unwrap_or_default().to_string();

            let mut bytes = Vec::new();
            while let Some(chunk) = field.chunk().await? {
                limits.check_size(bytes.len() + chunk.len())?;
                bytes.extend_from_slice(&chunk);
            }

            uploads.push(Upload {
                content_type,
                bytes,
            });
        }

        if uploads.is_empty() {
            return Err(ApiError::validation("Please upload at least one image"));
        }
        Ok(uploads)
    }

    /// Stores the uploads and records them against the property.
    ///
    /// Files already written are removed if any later step fails.
    #[instrument(skip(db, storage, uploads), fields(count = uploads.len()))]
    pub async fn add_images(
        db: &PgPool,
        storage: &dyn FileStorage,
        owner_id: Uuid,
        property_id: Uuid,
        uploads: Vec<Upload>,
    ) -> Result<Vec<PropertyImage>, ApiError> {
        Self::ensure_owner(db, property_id, owner_id).await?;

        let mut saved = Vec::with_capacity(uploads.len());
        let result = Self::store_images(db, storage, property_id, &uploads, &mut saved).await;

        if result.is_err() {
            for key in &saved {
                if let Err(err) = storage.delete(key).await {
                    warn!(%key, error = %err, "failed to clean up image after upload error");
                }
            }
        }

        let images = result?;
        track_images_uploaded(images.len());
        Ok(images)
    }

    async fn store_images(
        db: &PgPool,
        storage: &dyn FileStorage,
        property_id: Uuid,
        uploads: &[Upload],
        saved: &mut Vec<String>,
    ) -> Result<Vec<PropertyImage>, ApiError> {
        let mut tx = db.begin().await?;
        let mut images = Vec::with_capacity(uploads.len());

        for upload in uploads {
            let key = format!(
                "properties/{property_id}/{}.{}",
                Uuid::new_v4(),
                UploadLimits::extension_for(&upload.content_type)
            );
            let key = storage.save(&key, &upload.bytes).await?;
            saved.push(key.clone());
            let url = storage.get_url(&key)?;

            let image = sqlx::query_as::<_, PropertyImage>(&format!(
                "INSERT INTO property_images (property_id, storage_key, url)
                 VALUES ($1, $2, $3)
                 RETURNING {IMAGE_COLUMNS}"
            ))
            .bind(property_id)
            .bind(&key)
            .bind(&url)
            .fetch_one(&mut *tx)
            .await?;
            images.push(image);
        }

        tx.commit().await?;
        Ok(images)
    }

    async fn find(db: &PgPool, id: Uuid) -> Result<Property, ApiError> {
        sqlx::query_as::<_, Property>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::ResourceNotFound)
    }

    /// Listings owned by someone else are reported as not found.
    async fn ensure_owner(db: &PgPool, id: Uuid, owner_id: Uuid) -> Result<(), ApiError> {
        let owned: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM properties WHERE id = $1 AND owner_id = $2")
                .bind(id)
                .bind(owner_id)
                .fetch_optional(db)
                .await?;
        owned.map(|_| ()).ok_or(ApiError::ResourceNotFound)
    }

    async fn images_for(
        db: &PgPool,
        property_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<PropertyImage>>, ApiError> {
        if property_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, PropertyImage>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM property_images
             WHERE property_id = ANY($1)
             ORDER BY created_at"
        ))
        .bind(property_ids)
        .fetch_all(db)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<PropertyImage>> = HashMap::new();
        for image in rows {
            grouped.entry(image.property_id).or_default().push(image);
        }
        Ok(grouped)
    }
}
