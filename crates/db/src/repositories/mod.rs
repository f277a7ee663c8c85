use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use caliope_core::domain::appointment::{Appointment, AppointmentId};
use caliope_core::domain::catalog::{Product, ProductId, ServiceId, WellnessService};
use caliope_core::domain::order::{Order, OrderId};
use caliope_core::domain::user::{ProfessionalProfile, ProfileUpdate, UserId, UserProfile};
use caliope_core::import::BatchWriter;

pub mod appointment;
pub mod memory;
pub mod order;
pub mod product;
pub mod professional;
pub mod service;
pub mod user;

pub use appointment::SqlAppointmentRepository;
pub use memory::{
    InMemoryAppointmentRepository, InMemoryOrderRepository, InMemoryProductRepository,
    InMemoryProfessionalRepository, InMemoryServiceRepository, InMemoryUserRepository,
};
pub use order::SqlOrderRepository;
pub use product::SqlProductRepository;
pub use professional::SqlProfessionalRepository;
pub use service::SqlServiceRepository;
pub use user::SqlUserRepository;

use crate::DbPool;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn find_by_id(&self, id: &ServiceId) -> Result<Option<WellnessService>, RepositoryError>;
    /// Every service in storage order.
    async fn list_all(&self) -> Result<Vec<WellnessService>, RepositoryError>;
    async fn save(&self, service: WellnessService) -> Result<(), RepositoryError>;
    /// Writes all services or none of them.
    async fn save_batch(&self, services: Vec<WellnessService>) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn save(&self, product: Product) -> Result<(), RepositoryError>;
    async fn save_batch(&self, products: Vec<Product>) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<UserProfile>, RepositoryError>;
    async fn save(&self, user: UserProfile) -> Result<(), RepositoryError>;
    /// Stores `user` only when its id is unused. Returns `false` and leaves the
    /// existing profile untouched otherwise.
    async fn create_if_absent(&self, user: UserProfile) -> Result<bool, RepositoryError>;
    /// Merges the non-blank fields of `update` into the stored profile.
    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, RepositoryError>;
}

#[async_trait]
pub trait ProfessionalRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: &UserId,
    ) -> Result<Option<ProfessionalProfile>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<ProfessionalProfile>, RepositoryError>;
    /// Stores the profile and flags the matching user as professional in one unit.
    async fn register(&self, profile: ProfessionalProfile) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn find_by_id(&self, id: &AppointmentId)
        -> Result<Option<Appointment>, RepositoryError>;
    /// All appointments, earliest appointment date first.
    async fn list_by_date(&self) -> Result<Vec<Appointment>, RepositoryError>;
    async fn save(&self, appointment: Appointment) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, RepositoryError>;
    async fn save(&self, order: Order) -> Result<(), RepositoryError>;
}

#[async_trait]
impl BatchWriter<WellnessService> for dyn ServiceRepository {
    async fn write_batch(&self, records: Vec<WellnessService>) -> Result<(), String> {
        self.save_batch(records).await.map_err(|error| error.to_string())
    }
}

#[async_trait]
impl BatchWriter<Product> for dyn ProductRepository {
    async fn write_batch(&self, records: Vec<Product>) -> Result<(), String> {
        self.save_batch(records).await.map_err(|error| error.to_string())
    }
}

/// Every repository the application needs, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub services: Arc<dyn ServiceRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub users: Arc<dyn UserRepository>,
    pub professionals: Arc<dyn ProfessionalRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub orders: Arc<dyn OrderRepository>,
}

impl Repositories {
    pub fn sql(pool: DbPool) -> Self {
        Self {
            services: Arc::new(SqlServiceRepository::new(pool.clone())),
            products: Arc::new(SqlProductRepository::new(pool.clone())),
            users: Arc::new(SqlUserRepository::new(pool.clone())),
            professionals: Arc::new(SqlProfessionalRepository::new(pool.clone())),
            appointments: Arc::new(SqlAppointmentRepository::new(pool.clone())),
            orders: Arc::new(SqlOrderRepository::new(pool)),
        }
    }

    /// Empty in-memory repositories; the professional store shares the user map.
    pub fn in_memory() -> Self {
        let users = Arc::new(InMemoryUserRepository::default());
        Self {
            services: Arc::new(InMemoryServiceRepository::default()),
            products: Arc::new(InMemoryProductRepository::default()),
            professionals: Arc::new(InMemoryProfessionalRepository::new(users.clone())),
            users,
            appointments: Arc::new(InMemoryAppointmentRepository::default()),
            orders: Arc::new(InMemoryOrderRepository::default()),
        }
    }
}

pub(crate) fn decode_error(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

/// Fixed-width UTC timestamps so text ordering matches time ordering.
pub(crate) fn encode_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn decode_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("column `{column}`: {error}")))
}

pub(crate) fn decode_amount(column: &str, raw: i64) -> Result<u64, RepositoryError> {
    u64::try_from(raw)
        .map_err(|_| RepositoryError::Decode(format!("column `{column}` is negative: {raw}")))
}

pub(crate) fn decode_count(column: &str, raw: i64) -> Result<u32, RepositoryError> {
    u32::try_from(raw)
        .map_err(|_| RepositoryError::Decode(format!("column `{column}` is out of range: {raw}")))
}

pub(crate) fn encode_amount(column: &str, value: u64) -> Result<i64, RepositoryError> {
    i64::try_from(value)
        .map_err(|_| RepositoryError::Decode(format!("column `{column}` overflows: {value}")))
}
