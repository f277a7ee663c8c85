//! In-memory repositories backing demo mode and tests.
//!
//! Records live in insertion-ordered vectors so listings match what the SQL
//! repositories return for `ORDER BY rowid`.

use std::sync::Arc;

use tokio::sync::RwLock;

use caliope_core::domain::appointment::{Appointment, AppointmentId};
use caliope_core::domain::catalog::{Product, ProductId, ServiceId, WellnessService};
use caliope_core::domain::order::{Order, OrderId};
use caliope_core::domain::user::{ProfessionalProfile, ProfileUpdate, UserId, UserProfile};

use super::{
    AppointmentRepository, OrderRepository, ProductRepository, ProfessionalRepository,
    RepositoryError, ServiceRepository, UserRepository,
};

fn upsert<T>(records: &mut Vec<T>, record: T, same: impl Fn(&T, &T) -> bool) {
    match records.iter().position(|existing| same(existing, &record)) {
        Some(index) => records[index] = record,
        None => records.push(record),
    }
}

#[derive(Default)]
pub struct InMemoryServiceRepository {
    services: RwLock<Vec<WellnessService>>,
}

impl InMemoryServiceRepository {
    pub fn with_services(services: Vec<WellnessService>) -> Self {
        Self { services: RwLock::new(services) }
    }
}

#[async_trait::async_trait]
impl ServiceRepository for InMemoryServiceRepository {
    async fn find_by_id(&self, id: &ServiceId) -> Result<Option<WellnessService>, RepositoryError> {
        let services = self.services.read().await;
        Ok(services.iter().find(|service| &service.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<WellnessService>, RepositoryError> {
        Ok(self.services.read().await.clone())
    }

    async fn save(&self, service: WellnessService) -> Result<(), RepositoryError> {
        let mut services = self.services.write().await;
        upsert(&mut *services, service, |left, right| left.id == right.id);
        Ok(())
    }

    async fn save_batch(&self, batch: Vec<WellnessService>) -> Result<(), RepositoryError> {
        let mut services = self.services.write().await;
        for service in batch {
            upsert(&mut *services, service, |left, right| left.id == right.id);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductRepository {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self { products: RwLock::new(products) }
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.iter().find(|product| &product.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.products.read().await.clone())
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        upsert(&mut *products, product, |left, right| left.id == right.id);
        Ok(())
    }

    async fn save_batch(&self, batch: Vec<Product>) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        for product in batch {
            upsert(&mut *products, product, |left, right| left.id == right.id);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<UserProfile>>,
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|user| &user.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        Ok(self.users.read().await.clone())
    }

    async fn save(&self, user: UserProfile) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        upsert(&mut *users, user, |left, right| left.id == right.id);
        Ok(())
    }

    async fn create_if_absent(&self, user: UserProfile) -> Result<bool, RepositoryError> {
        let mut users = self.users.write().await;
        if users.iter().any(|existing| existing.id == user.id) {
            return Ok(false);
        }
        users.push(user);
        Ok(true)
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, RepositoryError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|user| &user.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("user `{}`", id.0)))?;
        user.apply_update(update);
        Ok(user.clone())
    }
}

pub struct InMemoryProfessionalRepository {
    professionals: RwLock<Vec<ProfessionalProfile>>,
    users: Arc<InMemoryUserRepository>,
}

impl InMemoryProfessionalRepository {
    pub fn new(users: Arc<InMemoryUserRepository>) -> Self {
        Self { professionals: RwLock::new(Vec::new()), users }
    }
}

#[async_trait::async_trait]
impl ProfessionalRepository for InMemoryProfessionalRepository {
    async fn find_by_id(
        &self,
        id: &UserId,
    ) -> Result<Option<ProfessionalProfile>, RepositoryError> {
        let professionals = self.professionals.read().await;
        Ok(professionals.iter().find(|professional| &professional.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ProfessionalProfile>, RepositoryError> {
        Ok(self.professionals.read().await.clone())
    }

    async fn register(&self, profile: ProfessionalProfile) -> Result<(), RepositoryError> {
        // Both locks are held so readers never see one record without the other.
        let mut users = self.users.users.write().await;
        let mut professionals = self.professionals.write().await;

        match users.iter_mut().find(|user| user.id == profile.id) {
            Some(user) => user.is_professional = true,
            None => {
                let mut user =
                    UserProfile::new(profile.id.clone(), profile.name.clone(), profile.email.clone());
                user.is_professional = true;
                user.phone = profile.phone.clone();
                user.address = profile.address.clone();
                user.created_at = profile.created_at;
                users.push(user);
            }
        }
        upsert(&mut *professionals, profile, |left, right| left.id == right.id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAppointmentRepository {
    appointments: RwLock<Vec<Appointment>>,
}

#[async_trait::async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn find_by_id(
        &self,
        id: &AppointmentId,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let appointments = self.appointments.read().await;
        Ok(appointments.iter().find(|appointment| &appointment.id == id).cloned())
    }

    async fn list_by_date(&self) -> Result<Vec<Appointment>, RepositoryError> {
        let mut appointments = self.appointments.read().await.clone();
        appointments.sort_by_key(|appointment| appointment.appointment_date);
        Ok(appointments)
    }

    async fn save(&self, appointment: Appointment) -> Result<(), RepositoryError> {
        let mut appointments = self.appointments.write().await;
        match appointments.iter_mut().find(|existing| existing.id == appointment.id) {
            Some(existing) => {
                let created_at = existing.created_at;
                *existing = Appointment { created_at, ..appointment };
            }
            None => appointments.push(appointment),
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<Vec<Order>>,
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let orders = self.orders.read().await;
        Ok(orders.iter().find(|order| &order.id == id).cloned())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.read().await;
        let mut owned: Vec<Order> =
            orders.iter().filter(|order| &order.user_id == user_id).cloned().collect();
        owned.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(owned)
    }

    async fn save(&self, order: Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.write().await;
        upsert(&mut *orders, order, |left, right| left.id == right.id);
        Ok(())
    }
}
