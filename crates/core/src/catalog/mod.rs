//! Catalog snapshot plus the listing/query layer used by storefront and admin views.

pub mod query;
pub mod users;

use crate::domain::catalog::{
    CatalogEntry, CatalogItem, Product, ProductId, ServiceId, WellnessService,
};

pub use query::{filter_and_paginate, Page, QuerySpec, ALL_CATEGORIES};
pub use users::{filter_users, RoleFilter, SortDirection, UserQuery, UserSort, UserSortField};

/// In-memory view over the services and products currently on offer.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    services: Vec<WellnessService>,
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(services: Vec<WellnessService>, products: Vec<Product>) -> Self {
        Self { services, products }
    }

    pub fn services(&self) -> &[WellnessService] {
        &self.services
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.products.is_empty()
    }

    pub fn find_service(&self, service_id: &ServiceId) -> Option<&WellnessService> {
        self.services.iter().find(|service| &service.id == service_id)
    }

    pub fn find_product(&self, product_id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| &product.id == product_id)
    }

    /// Resolves an id against services first, then products.
    pub fn find_item(&self, id: &str) -> Option<CatalogItem> {
        if let Some(service) = self.services.iter().find(|service| service.id.0 == id) {
            return Some(CatalogItem::Service(service.clone()));
        }
        self.products
            .iter()
            .find(|product| product.id.0 == id)
            .map(|product| CatalogItem::Product(product.clone()))
    }

    /// Every service followed by every product, in storage order.
    pub fn items(&self) -> Vec<CatalogItem> {
        self.services
            .iter()
            .cloned()
            .map(CatalogItem::Service)
            .chain(self.products.iter().cloned().map(CatalogItem::Product))
            .collect()
    }
}

/// Distinct categories in first-seen order.
pub fn categories<T: CatalogEntry>(items: &[T]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for item in items {
        if !seen.iter().any(|category| category == item.category()) {
            seen.push(item.category().to_string());
        }
    }
    seen
}


#[cfg(test)]
mod tests {
    use super::fixtures::{product, service};
    use super::{categories, Catalog};
    use crate::domain::catalog::{CatalogItem, ServiceId};

    fn catalog() -> Catalog {
        Catalog::new(
            vec![
                service("srv-001", "Masaje Relajante", "Masajes", "Alivia el estres"),
                service("srv-002", "Facial Hidratante", "Faciales", "Piel radiante"),
                service("srv-003", "Masaje Deportivo", "Masajes", "Recuperacion muscular"),
            ],
            vec![product("prod-001", "Aceite de Lavanda", "Aceites", "Relajacion")],
        )
    }

    #[test]
    fn find_item_resolves_services_and_products() {
        let catalog = catalog();

        assert!(matches!(catalog.find_item("srv-002"), Some(CatalogItem::Service(_))));
        assert!(matches!(catalog.find_item("prod-001"), Some(CatalogItem::Product(_))));
        assert!(catalog.find_item("nope").is_none());
        assert!(catalog.find_service(&ServiceId("srv-003".to_string())).is_some());
    }

    #[test]
    fn categories_are_distinct_in_first_seen_order() {
        let catalog = catalog();
        assert_eq!(categories(catalog.services()), vec!["Masajes", "Faciales"]);
    }

    #[test]
    fn items_lists_services_before_products() {
        let items = catalog().items();
        assert_eq!(items.len(), 4);
        assert_eq!(items[3].id(), "prod-001");
    }
}
