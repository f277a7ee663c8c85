pub mod cart_store;
pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use cart_store::{
    CartSession, CartStore, CartStoreError, CheckoutError, FileCartStore, InMemoryCartStore,
};
pub use connection::{connect, connect_with_config, connect_with_settings, DbPool};
pub use fixtures::{DemoDataset, SeedResult};
pub use repositories::{Repositories, RepositoryError};
