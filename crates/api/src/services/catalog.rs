//! Catalog management: shoes, color variants and size entries.
//!
//! Uniqueness rules live here: one shoe per `(brand, model)` pair
//! (case-insensitive), one variant per color name within a shoe
//! (case-insensitive), one entry per size value within a variant. Violations
//! are conflicts, not validation errors.
//!
//! Absolute stock quantities set through size CRUD are admin restocks;
//! reservation arithmetic stays in [`super::stock`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use laceup_core::{ColorId, Price, ShoeId, ShoeSize, SizeStockId};

use crate::error::{ApiError, Result};
use crate::models::{ColorVariant, Gender, Shoe, ShoeType, SizeStock};
use crate::store::{Store, StoreError};

use super::MAX_RETRIES;

/// Request body for creating a shoe.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShoe {
    pub brand: String,
    pub model: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(rename = "type", default)]
    pub shoe_type: ShoeType,
    /// Price in major units, e.g. `129.99`.
    pub price: Decimal,
    #[serde(default)]
    pub colors: Vec<NewColor>,
}

/// Request body for adding a color variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewColor {
    pub name: String,
    pub hex: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sizes: Vec<NewSizeStock>,
}

/// Request body for adding a size entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSizeStock {
    pub size: ShoeSize,
    pub quantity: u32,
}

/// Request body for updating a shoe; absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShoe {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub description: Option<String>,
    pub gender: Option<Gender>,
    #[serde(rename = "type")]
    pub shoe_type: Option<ShoeType>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// Request body for updating a color variant; absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateColor {
    pub name: Option<String>,
    pub hex: Option<String>,
    pub image_url: Option<String>,
}

/// Request body for updating a size entry; absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSizeStock {
    pub size: Option<ShoeSize>,
    pub quantity: Option<u32>,
}

/// Catalog listing filters, straight from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoeQuery {
    pub brand: Option<String>,
    pub gender: Option<String>,
    #[serde(rename = "type")]
    pub shoe_type: Option<String>,
    pub color_name: Option<String>,
    pub size: Option<ShoeSize>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// 1-based page number.
    pub page: Option<usize>,
    /// Page size.
    pub length: Option<usize>,
}

const DEFAULT_PAGE_LENGTH: usize = 20;

/// One entry of the brand aggregation.
#[derive(Debug, Clone, Serialize)]
pub struct BrandSummary {
    pub brand: String,
    /// Active shoes under this brand.
    pub count: usize,
}

/// One page of catalog results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoePage {
    pub shoes: Vec<Shoe>,
    /// Matching shoes before pagination.
    pub total: usize,
    pub page: usize,
    pub length: usize,
}

/// Catalog business logic over a [`Store`].
pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Create a shoe, optionally with initial variants and stock.
    ///
    /// # Errors
    ///
    /// Rejects blank brand/model, invalid prices, duplicate `(brand, model)`
    /// pairs and duplicate color names or sizes within the payload.
    pub async fn create_shoe(&self, req: &NewShoe) -> Result<Shoe> {
        if req.brand.trim().is_empty() || req.model.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "brand and model are required".to_owned(),
            ));
        }
        let price = parse_price(req.price)?;

        let mut shoe = Shoe::new(req.brand.trim(), req.model.trim(), price);
        shoe.description = req.description.clone();
        shoe.gender = req.gender;
        shoe.shoe_type = req.shoe_type;
        for color in &req.colors {
            let variant = build_variant(color)?;
            if shoe.has_color_named(&variant.name, None) {
                return Err(duplicate_color(&variant.name));
            }
            shoe.colors.push(variant);
        }

        if self
            .store
            .shoe_by_brand_model(&shoe.brand, &shoe.model)
            .await?
            .is_some()
        {
            return Err(duplicate_shoe());
        }
        self.store.insert_shoe(&shoe).await.map_err(|e| match e {
            StoreError::AlreadyExists { .. } => duplicate_shoe(),
            other => other.into(),
        })?;
        info!(shoe_id = %shoe.id, shoe = %shoe.display_name(), "Shoe created");
        Ok(shoe)
    }

    /// Fetch one shoe.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when absent.
    pub async fn get(&self, id: ShoeId) -> Result<Shoe> {
        self.store
            .shoe(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Shoe".to_owned()))
    }

    /// Active shoes matching the filters, paginated.
    ///
    /// # Errors
    ///
    /// Rejects unparseable gender/type filters.
    pub async fn list(&self, query: &ShoeQuery) -> Result<ShoePage> {
        let gender: Option<Gender> = query
            .gender
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(ApiError::BadRequest)?;
        let shoe_type: Option<ShoeType> = query
            .shoe_type
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(ApiError::BadRequest)?;

        let mut shoes: Vec<Shoe> = self
            .store
            .shoes()
            .await?
            .into_iter()
            .filter(|s| s.is_active)
            .filter(|s| {
                query
                    .brand
                    .as_deref()
                    .is_none_or(|b| s.brand.eq_ignore_ascii_case(b))
            })
            .filter(|s| gender.is_none_or(|g| s.gender == g))
            .filter(|s| shoe_type.is_none_or(|t| s.shoe_type == t))
            .filter(|s| {
                query.color_name.as_deref().is_none_or(|name| {
                    s.colors.iter().any(|c| c.name.eq_ignore_ascii_case(name))
                })
            })
            .filter(|s| {
                // Size filter means "in stock in this size", not just listed.
                query.size.is_none_or(|size| {
                    s.colors.iter().any(|c| {
                        c.size_entry(size).is_some_and(|e| e.quantity > 0)
                    })
                })
            })
            .filter(|s| {
                let price = s.price.to_decimal();
                query.min_price.is_none_or(|min| price >= min)
                    && query.max_price.is_none_or(|max| price <= max)
            })
            .collect();

        let total = shoes.len();
        let length = query.length.unwrap_or(DEFAULT_PAGE_LENGTH).max(1);
        let page = query.page.unwrap_or(1).max(1);
        let start = (page - 1).saturating_mul(length).min(total);
        let end = start.saturating_add(length).min(total);
        shoes = shoes.drain(start..end).collect();

        Ok(ShoePage {
            shoes,
            total,
            page,
            length,
        })
    }

    /// Distinct brands across active shoes with their shoe counts, sorted
    /// by name. Casing follows the first shoe seen for a brand.
    ///
    /// # Errors
    ///
    /// Returns an error when the store fails.
    pub async fn brands(&self) -> Result<Vec<BrandSummary>> {
        let mut summaries: Vec<BrandSummary> = Vec::new();
        for shoe in self.store.shoes().await?.into_iter().filter(|s| s.is_active) {
            match summaries
                .iter_mut()
                .find(|b| b.brand.eq_ignore_ascii_case(&shoe.brand))
            {
                Some(entry) => entry.count += 1,
                None => summaries.push(BrandSummary {
                    brand: shoe.brand,
                    count: 1,
                }),
            }
        }
        summaries.sort_by(|a, b| {
            a.brand
                .to_ascii_lowercase()
                .cmp(&b.brand.to_ascii_lowercase())
        });
        Ok(summaries)
    }

    /// Update shoe metadata.
    ///
    /// # Errors
    ///
    /// Rejects unknown shoes, invalid prices and `(brand, model)` pairs
    /// already taken by another shoe.
    pub async fn update_shoe(&self, id: ShoeId, req: &UpdateShoe) -> Result<Shoe> {
        let price = req.price.map(parse_price).transpose()?;
        let mut attempts = 0;
        loop {
            attempts += 1;
            let mut shoe = self.get(id).await?;
            if let Some(brand) = &req.brand {
                shoe.brand = brand.trim().to_owned();
            }
            if let Some(model) = &req.model {
                shoe.model = model.trim().to_owned();
            }
            if shoe.brand.is_empty() || shoe.model.is_empty() {
                return Err(ApiError::BadRequest(
                    "brand and model are required".to_owned(),
                ));
            }
            if let Some(description) = &req.description {
                shoe.description = Some(description.clone());
            }
            if let Some(gender) = req.gender {
                shoe.gender = gender;
            }
            if let Some(shoe_type) = req.shoe_type {
                shoe.shoe_type = shoe_type;
            }
            if let Some(price) = price {
                shoe.price = price;
            }
            if let Some(is_active) = req.is_active {
                shoe.is_active = is_active;
            }

            if req.brand.is_some() || req.model.is_some() {
                let taken = self
                    .store
                    .shoe_by_brand_model(&shoe.brand, &shoe.model)
                    .await?
                    .is_some_and(|other| other.id != shoe.id);
                if taken {
                    return Err(duplicate_shoe());
                }
            }

            shoe.touch();
            match self.store.update_shoe(&shoe).await {
                Ok(()) => return Ok(shoe),
                Err(StoreError::VersionConflict { .. }) if attempts < MAX_RETRIES => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Delete a shoe and everything embedded in it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when absent.
    pub async fn delete_shoe(&self, id: ShoeId) -> Result<()> {
        if !self.store.delete_shoe(id).await? {
            return Err(ApiError::NotFound("Shoe".to_owned()));
        }
        info!(shoe_id = %id, "Shoe deleted");
        Ok(())
    }

    /// Add a color variant.
    ///
    /// # Errors
    ///
    /// Rejects duplicate color names (case-insensitive) and duplicate sizes
    /// within the payload.
    pub async fn add_color(&self, shoe_id: ShoeId, req: &NewColor) -> Result<Shoe> {
        let variant = build_variant(req)?;
        self.with_shoe(shoe_id, |shoe| {
            if shoe.has_color_named(&variant.name, None) {
                return Err(duplicate_color(&variant.name));
            }
            shoe.colors.push(variant.clone());
            Ok(())
        })
        .await
    }

    /// Update a color variant's name, hex or image.
    ///
    /// # Errors
    ///
    /// Rejects unknown variants and names taken by a sibling variant.
    pub async fn update_color(
        &self,
        shoe_id: ShoeId,
        color_id: ColorId,
        req: &UpdateColor,
    ) -> Result<Shoe> {
        self.with_shoe(shoe_id, |shoe| {
            if let Some(name) = &req.name {
                if shoe.has_color_named(name, Some(color_id)) {
                    return Err(duplicate_color(name));
                }
            }
            let color = shoe
                .color_mut(color_id)
                .ok_or_else(|| ApiError::NotFound("Color variant".to_owned()))?;
            if let Some(name) = &req.name {
                color.name = name.clone();
            }
            if let Some(hex) = &req.hex {
                color.hex = hex.clone();
            }
            if let Some(image_url) = &req.image_url {
                color.image_url = Some(image_url.clone());
            }
            Ok(())
        })
        .await
    }

    /// Remove a color variant and its size entries.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the shoe or variant is absent.
    pub async fn delete_color(&self, shoe_id: ShoeId, color_id: ColorId) -> Result<Shoe> {
        self.with_shoe(shoe_id, |shoe| {
            if !shoe.remove_color(color_id) {
                return Err(ApiError::NotFound("Color variant".to_owned()));
            }
            Ok(())
        })
        .await
    }

    /// Add a size entry to a variant.
    ///
    /// # Errors
    ///
    /// Rejects duplicate size values within the variant.
    pub async fn add_size(
        &self,
        shoe_id: ShoeId,
        color_id: ColorId,
        req: &NewSizeStock,
    ) -> Result<Shoe> {
        self.with_shoe(shoe_id, |shoe| {
            let color = shoe
                .color_mut(color_id)
                .ok_or_else(|| ApiError::NotFound("Color variant".to_owned()))?;
            if color.has_size(req.size, None) {
                return Err(duplicate_size(req.size));
            }
            color.sizes.push(SizeStock::new(req.size, req.quantity));
            Ok(())
        })
        .await
    }

    /// Update a size entry's value or absolute quantity (admin restock).
    ///
    /// # Errors
    ///
    /// Rejects unknown entries and size values taken by a sibling entry.
    pub async fn update_size(
        &self,
        shoe_id: ShoeId,
        color_id: ColorId,
        size_id: SizeStockId,
        req: &UpdateSizeStock,
    ) -> Result<Shoe> {
        self.with_shoe(shoe_id, |shoe| {
            let color = shoe
                .color_mut(color_id)
                .ok_or_else(|| ApiError::NotFound("Color variant".to_owned()))?;
            if let Some(size) = req.size {
                if color.has_size(size, Some(size_id)) {
                    return Err(duplicate_size(size));
                }
            }
            let entry = color
                .size_entry_by_id_mut(size_id)
                .ok_or_else(|| ApiError::NotFound("Size entry".to_owned()))?;
            if let Some(size) = req.size {
                entry.size = size;
            }
            if let Some(quantity) = req.quantity {
                entry.quantity = quantity;
            }
            Ok(())
        })
        .await
    }

    /// Remove a size entry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the shoe, variant or entry is absent.
    pub async fn delete_size(
        &self,
        shoe_id: ShoeId,
        color_id: ColorId,
        size_id: SizeStockId,
    ) -> Result<Shoe> {
        self.with_shoe(shoe_id, |shoe| {
            let color = shoe
                .color_mut(color_id)
                .ok_or_else(|| ApiError::NotFound("Color variant".to_owned()))?;
            if !color.remove_size(size_id) {
                return Err(ApiError::NotFound("Size entry".to_owned()));
            }
            Ok(())
        })
        .await
    }

    /// Load, mutate and CAS-write a shoe, retrying lost races.
    async fn with_shoe<F>(&self, shoe_id: ShoeId, mut apply: F) -> Result<Shoe>
    where
        F: FnMut(&mut Shoe) -> Result<()>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let mut shoe = self.get(shoe_id).await?;
            apply(&mut shoe)?;
            shoe.touch();
            match self.store.update_shoe(&shoe).await {
                Ok(()) => return Ok(shoe),
                Err(StoreError::VersionConflict { .. }) if attempts < MAX_RETRIES => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn parse_price(value: Decimal) -> Result<Price> {
    Price::from_decimal(value).map_err(|e| ApiError::BadRequest(format!("invalid price: {e}")))
}

fn build_variant(req: &NewColor) -> Result<ColorVariant> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("color name is required".to_owned()));
    }
    let mut variant = ColorVariant::new(req.name.trim(), req.hex.clone(), Vec::new());
    variant.image_url = req.image_url.clone();
    for size in &req.sizes {
        if variant.has_size(size.size, None) {
            return Err(duplicate_size(size.size));
        }
        variant.sizes.push(SizeStock::new(size.size, size.quantity));
    }
    Ok(variant)
}

fn duplicate_shoe() -> ApiError {
    ApiError::Conflict("A shoe with this brand and model already exists".to_owned())
}

fn duplicate_color(name: &str) -> ApiError {
    ApiError::Conflict(format!("A color named {name} already exists on this shoe"))
}

fn duplicate_size(size: ShoeSize) -> ApiError {
    ApiError::Conflict(format!("Size {size} already exists on this color"))
}
