//! Static product catalog.
//!
//! The catalog is an injected, immutable configuration resource: parsed
//! once at startup from the embedded JSON asset and shared read-only by
//! every session. Products never change at runtime.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::i18n::{LocalizedList, LocalizedText};

/// Vehicle class a lubricant is blended for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Car,
    Moto,
}

/// Display-only merchandising tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tag {
    Performance,
    #[serde(rename = "Best Value")]
    BestValue,
    Popular,
}

/// One catalog entry. Bilingual fields carry their own Bengali counterpart;
/// plain fields (viscosity, specs) display identically in both languages.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: LocalizedText,
    pub series: String,
    pub desc: LocalizedText,
    /// Whole Taka, always positive.
    pub price: u64,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    pub color: String,
    pub image: String,
    pub viscosity: String,
    pub specs: String,
    pub application: LocalizedText,
    pub features: LocalizedList,
    #[serde(
        default,
        rename = "recommendedModels",
        skip_serializing_if = "Option::is_none"
    )]
    pub recommended_models: Option<Vec<String>>,
}

impl std::str::FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Car" => Ok(Self::Car),
            "Moto" => Ok(Self::Moto),
            _ => Err(()),
        }
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    products: Vec<Product>,
}

/// Read-only product catalog with id-keyed lookup.
#[derive(Debug)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Parses a catalog from JSON, checking id uniqueness and prices.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        let mut index = HashMap::with_capacity(file.products.len());
        for (i, product) in file.products.iter().enumerate() {
            if product.price == 0 {
                return Err(CatalogError::InvalidPrice(product.id.clone()));
            }
            if index.insert(product.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }
        Ok(Self {
            products: file.products,
            index,
        })
    }

    /// The catalog shipped with the service.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(include_str!("../assets/catalog.json"))
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.index.get(id).map(|&i| &self.products[i])
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Products in one category, or the whole catalog without a filter.
    pub fn by_category(&self, category: Option<Category>) -> impl Iterator<Item = &Product> + '_ {
        self.products
            .iter()
            .filter(move |p| category.map_or(true, |c| p.category == c))
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate product id '{0}'")]
    DuplicateId(String),
    #[error("product '{0}' has a non-positive price")]
    InvalidPrice(String),
}
