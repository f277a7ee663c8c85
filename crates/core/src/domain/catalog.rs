use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVICE_IMAGE: &str =
    "https://placehold.co/600x400/e2e8f0/1e293b?text=Caliope+Bienestar";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

/// Bookable wellness service (massage, facial, therapy session...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellnessService {
    pub id: ServiceId,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: u64,
    pub rating: f32,
    pub review_count: u32,
    /// Session length in minutes.
    pub duration: u32,
    #[serde(default)]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: u64,
    pub rating: f32,
    pub review_count: u32,
    pub in_stock: bool,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// Fields shared by every catalog listing; the query layer only needs these.
pub trait CatalogEntry {
    fn entry_id(&self) -> &str;
    fn name(&self) -> &str;
    fn category(&self) -> &str;
    fn description(&self) -> &str;
}

impl CatalogEntry for WellnessService {
    fn entry_id(&self) -> &str {
        &self.id.0
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl CatalogEntry for Product {
    fn entry_id(&self) -> &str {
        &self.id.0
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// A catalog hit returned to the concierge, tagged with its kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogItem {
    Service(WellnessService),
    Product(Product),
}

impl CatalogItem {
    pub fn id(&self) -> &str {
        match self {
            Self::Service(service) => service.entry_id(),
            Self::Product(product) => product.entry_id(),
        }
    }

    pub fn kind(&self) -> CatalogKind {
        match self {
            Self::Service(_) => CatalogKind::Service,
            Self::Product(_) => CatalogKind::Product,
        }
    }

    pub fn entry(&self) -> &dyn CatalogEntry {
        match self {
            Self::Service(service) => service,
            Self::Product(product) => product,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Service,
    Product,
}

impl CatalogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Service => "SERVICE",
            Self::Product => "PRODUCT",
        }
    }
}

/// Upload shape for a service; server-assigned fields are never read from input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUpload {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: u64,
    pub duration: u32,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpload {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: u64,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    pub image_url: String,
}

fn default_in_stock() -> bool {
    true
}

impl ServiceUpload {
    pub fn into_service(self, id: ServiceId, created_at: DateTime<Utc>) -> WellnessService {
        WellnessService {
            id,
            name: self.name,
            category: self.category,
            description: self.description,
            price: self.price,
            rating: 0.0,
            review_count: 0,
            duration: self.duration,
            image: self.image,
            created_at,
        }
    }
}

impl ProductUpload {
    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name,
            category: self.category,
            description: self.description,
            price: self.price,
            rating: 0.0,
            review_count: 0,
            in_stock: self.in_stock,
            image_url: self.image_url,
            created_at,
        }
    }
}
