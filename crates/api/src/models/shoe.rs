//! Shoe aggregate: the product, its color variants and their per-size stock.
//!
//! The shoe is the transactional boundary for all stock accounting: variants
//! and size entries are embedded, never stored separately, so one versioned
//! write covers every quantity change within a product.
//!
//! Quantity arithmetic itself lives in [`crate::services::stock`]; this
//! module provides the structure and id/name lookups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use laceup_core::{ColorId, Price, ShoeId, ShoeSize, SizeStockId};

/// Intended wearer. Catalog metadata only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            _ => Err(format!("invalid gender: {s}")),
        }
    }
}

/// Shoe category. Catalog metadata only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ShoeType {
    Work,
    Running,
    Trail,
    Basketball,
    #[default]
    Casual,
    Sandals,
}

impl std::str::FromStr for ShoeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "work" => Ok(Self::Work),
            "running" => Ok(Self::Running),
            "trail" => Ok(Self::Trail),
            "basketball" => Ok(Self::Basketball),
            "casual" => Ok(Self::Casual),
            "sandals" => Ok(Self::Sandals),
            _ => Err(format!("invalid shoe type: {s}")),
        }
    }
}

/// One `(size, quantity)` stock entry, identity-bearing so catalog CRUD can
/// address it independently of its numeric size value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStock {
    pub id: SizeStockId,
    pub size: ShoeSize,
    pub quantity: u32,
}

impl SizeStock {
    /// Create a new stock entry with a fresh id.
    #[must_use]
    pub fn new(size: ShoeSize, quantity: u32) -> Self {
        Self {
            id: SizeStockId::generate(),
            size,
            quantity,
        }
    }
}

/// A color variant of a shoe, owning its size entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorVariant {
    pub id: ColorId,
    pub name: String,
    pub hex: String,
    /// Image URL by id; images themselves live elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub sizes: Vec<SizeStock>,
}

impl ColorVariant {
    /// Create a new variant with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, hex: impl Into<String>, sizes: Vec<SizeStock>) -> Self {
        Self {
            id: ColorId::generate(),
            name: name.into(),
            hex: hex.into(),
            image_url: None,
            sizes,
        }
    }

    /// Look up a stock entry by its size value.
    #[must_use]
    pub fn size_entry(&self, size: ShoeSize) -> Option<&SizeStock> {
        self.sizes.iter().find(|s| s.size == size)
    }

    /// Mutable lookup of a stock entry by its size value.
    pub fn size_entry_mut(&mut self, size: ShoeSize) -> Option<&mut SizeStock> {
        self.sizes.iter_mut().find(|s| s.size == size)
    }

    /// Look up a stock entry by id.
    #[must_use]
    pub fn size_entry_by_id(&self, id: SizeStockId) -> Option<&SizeStock> {
        self.sizes.iter().find(|s| s.id == id)
    }

    /// Mutable lookup of a stock entry by id.
    pub fn size_entry_by_id_mut(&mut self, id: SizeStockId) -> Option<&mut SizeStock> {
        self.sizes.iter_mut().find(|s| s.id == id)
    }

    /// Whether another entry (excluding `except`) already uses this size.
    #[must_use]
    pub fn has_size(&self, size: ShoeSize, except: Option<SizeStockId>) -> bool {
        self.sizes
            .iter()
            .any(|s| s.size == size && Some(s.id) != except)
    }

    /// Remove a stock entry by id. Returns `false` if absent.
    pub fn remove_size(&mut self, id: SizeStockId) -> bool {
        let before = self.sizes.len();
        self.sizes.retain(|s| s.id != id);
        self.sizes.len() != before
    }

    /// Total units in stock across all sizes.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.sizes.iter().map(|s| s.quantity).sum()
    }
}

/// The shoe aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shoe {
    pub id: ShoeId,
    pub brand: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(rename = "type", default)]
    pub shoe_type: ShoeType,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub price: Price,
    pub colors: Vec<ColorVariant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter, managed by the store.
    #[serde(default)]
    pub version: u64,
}

const fn default_active() -> bool {
    true
}

impl Shoe {
    /// Create a new shoe with no variants.
    #[must_use]
    pub fn new(brand: impl Into<String>, model: impl Into<String>, price: Price) -> Self {
        let now = Utc::now();
        Self {
            id: ShoeId::generate(),
            brand: brand.into(),
            model: model.into(),
            description: None,
            gender: Gender::default(),
            shoe_type: ShoeType::default(),
            is_active: true,
            price,
            colors: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Look up a color variant by id. Id-based lookup is canonical;
    /// name matching is a convenience for catalog queries only.
    #[must_use]
    pub fn color(&self, id: ColorId) -> Option<&ColorVariant> {
        self.colors.iter().find(|c| c.id == id)
    }

    /// Mutable lookup of a color variant by id.
    pub fn color_mut(&mut self, id: ColorId) -> Option<&mut ColorVariant> {
        self.colors.iter_mut().find(|c| c.id == id)
    }

    /// Whether a variant with this name already exists (case-insensitive),
    /// excluding `except`.
    #[must_use]
    pub fn has_color_named(&self, name: &str, except: Option<ColorId>) -> bool {
        self.colors
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(name) && Some(c.id) != except)
    }

    /// Remove a color variant by id. Returns `false` if absent.
    pub fn remove_color(&mut self, id: ColorId) -> bool {
        let before = self.colors.len();
        self.colors.retain(|c| c.id != id);
        self.colors.len() != before
    }

    /// Display name used in stock error messages and payment line items.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }

    /// Bump the modification timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
