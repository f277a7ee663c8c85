//! Bulk catalog import.
//!
//! Uploaded JSON is validated up front, every record gets a synthetic id, and
//! records are written in sequential chunks, each chunk being one atomic batch
//! on the backing store. A failed chunk stops the import; chunks already
//! written stay committed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::catalog::{
    Product, ProductId, ProductUpload, ServiceId, ServiceUpload, WellnessService,
};

/// Stays under the store's limit of 500 writes per batch.
pub const DEFAULT_CHUNK_SIZE: usize = 400;
pub const MAX_BATCH_WRITES: usize = 500;

pub const SERVICE_ID_PREFIX: &str = "srv";
pub const PRODUCT_ID_PREFIX: &str = "prod";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("the JSON payload must be an array")]
    NotAnArray,
    #[error("item {index} is invalid: {message}")]
    InvalidItem { index: usize, message: String },
    #[error("chunk size must be between 1 and {MAX_BATCH_WRITES}, got {0}")]
    InvalidChunkSize(usize),
    #[error("batch write failed after {committed} items: {message}")]
    Write { committed: usize, message: String },
}

/// Store that accepts one atomic batch of records at a time.
#[async_trait]
pub trait BatchWriter<R>: Send + Sync {
    async fn write_batch(&self, records: Vec<R>) -> Result<(), String>;
}

/// Upload payload that turns into a stored record once an id is assigned.
pub trait Importable: DeserializeOwned + Send {
    type Record: Send;

    fn into_record(self, id: String, created_at: DateTime<Utc>) -> Self::Record;
}

impl Importable for ServiceUpload {
    type Record = WellnessService;

    fn into_record(self, id: String, created_at: DateTime<Utc>) -> WellnessService {
        self.into_service(ServiceId(id), created_at)
    }
}

impl Importable for ProductUpload {
    type Record = Product;

    fn into_record(self, id: String, created_at: DateTime<Utc>) -> Product {
        self.into_product(ProductId(id), created_at)
    }
}

/// Parses uploaded JSON text, rejecting anything but an array of valid items.
pub fn parse_upload<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, ImportError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|error| ImportError::InvalidJson(error.to_string()))?;
    let Value::Array(entries) = value else {
        return Err(ImportError::NotAnArray);
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value(entry)
                .map_err(|error| ImportError::InvalidItem { index, message: error.to_string() })
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkImporter {
    chunk_size: usize,
}

impl Default for BulkImporter {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE }
    }
}

impl BulkImporter {
    pub fn new(chunk_size: usize) -> Result<Self, ImportError> {
        if chunk_size == 0 || chunk_size > MAX_BATCH_WRITES {
            return Err(ImportError::InvalidChunkSize(chunk_size));
        }
        Ok(Self { chunk_size })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Writes `items` in sequential chunks and returns how many were persisted.
    pub async fn bulk_upload<T, W>(
        &self,
        items: Vec<T>,
        id_prefix: &str,
        writer: &W,
    ) -> Result<usize, ImportError>
    where
        T: Importable,
        W: BatchWriter<T::Record> + ?Sized,
    {
        let ids = SyntheticIds::new(id_prefix);
        let total = items.len();
        let mut committed = 0usize;
        let mut remaining = items.into_iter().peekable();

        while remaining.peek().is_some() {
            let created_at = Utc::now();
            let records: Vec<T::Record> = remaining
                .by_ref()
                .take(self.chunk_size)
                .enumerate()
                .map(|(offset, item)| item.into_record(ids.id_for(committed + offset), created_at))
                .collect();
            let chunk_len = records.len();

            if let Err(message) = writer.write_batch(records).await {
                warn!(
                    event_name = "import.batch.failed",
                    id_prefix,
                    committed,
                    chunk_len,
                    error = %message,
                    "bulk import batch write failed"
                );
                return Err(ImportError::Write { committed, message });
            }

            committed += chunk_len;
            info!(
                event_name = "import.batch.committed",
                id_prefix,
                committed,
                total,
                "bulk import batch committed"
            );
        }

        Ok(committed)
    }

    pub async fn import_json<T, W>(
        &self,
        raw: &str,
        id_prefix: &str,
        writer: &W,
    ) -> Result<usize, ImportError>
    where
        T: Importable,
        W: BatchWriter<T::Record> + ?Sized,
    {
        let items = parse_upload::<T>(raw)?;
        self.bulk_upload(items, id_prefix, writer).await
    }
}

/// `{prefix}-{millis}-{token}-{index}`; the per-call token keeps ids unique
/// across imports started within the same millisecond.
struct SyntheticIds {
    prefix: String,
    millis: i64,
    token: String,
}

impl SyntheticIds {
    fn new(prefix: &str) -> Self {
        let token = Uuid::new_v4().simple().to_string();
        Self {
            prefix: prefix.to_string(),
            millis: Utc::now().timestamp_millis(),
            token: token[..8].to_string(),
        }
    }

    fn id_for(&self, index: usize) -> String {
        format!("{}-{}-{}-{index}", self.prefix, self.millis, self.token)
    }
}
