pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod import;
pub mod loyalty;

pub use catalog::{
    categories, filter_and_paginate, filter_users, Catalog, Page, QuerySpec, RoleFilter,
    SortDirection, UserQuery, UserSort, UserSortField, ALL_CATEGORIES,
};
pub use domain::appointment::{Appointment, AppointmentId, AppointmentRequest, AppointmentStatus};
pub use domain::cart::{Cart, CartLine};
pub use domain::catalog::{
    CatalogEntry, CatalogItem, CatalogKind, Product, ProductId, ProductUpload, ServiceId,
    ServiceUpload, WellnessService,
};
pub use domain::order::{Order, OrderId, OrderItem, OrderStatus};
pub use domain::user::{ProfessionalProfile, ProfileUpdate, UserId, UserProfile, UserRole};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use import::{BatchWriter, BulkImporter, ImportError, Importable};
pub use loyalty::{
    get_progress_to_next_level, get_user_level, LevelProgress, LoyaltyStatus, LoyaltyTier,
    TierTable, UserLevel,
};
