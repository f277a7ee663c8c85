use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

use caliope_core::domain::catalog::{
    Product, ProductId, ServiceId, WellnessService, DEFAULT_SERVICE_IMAGE,
};
use caliope_core::domain::user::{UserId, UserProfile};

use crate::repositories::{RepositoryError, Repositories};

/// Demo catalog and accounts used in `demo` mode and by `caliope seed`.
pub struct DemoDataset;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    pub services: usize,
    pub products: usize,
    pub users: usize,
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).single().unwrap_or_else(Utc::now)
}

struct ServiceSeed {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    description: &'static str,
    price: u64,
    rating: f32,
    review_count: u32,
    duration: u32,
}

struct ProductSeed {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    description: &'static str,
    price: u64,
    rating: f32,
    review_count: u32,
    in_stock: bool,
}

const SERVICE_SEEDS: &[ServiceSeed] = &[
    ServiceSeed {
        id: "srv-masaje-relajante",
        name: "Masaje Relajante",
        category: "Masajes",
        description: "Masaje de cuerpo completo con aceites esenciales para liberar el estrés.",
        price: 120_000,
        rating: 4.8,
        review_count: 124,
        duration: 60,
    },
    ServiceSeed {
        id: "srv-masaje-terapeutico",
        name: "Masaje Terapéutico",
        category: "Masajes",
        description: "Trabajo de tejido profundo indicado para dolor de espalda y contracturas.",
        price: 150_000,
        rating: 4.9,
        review_count: 98,
        duration: 75,
    },
    ServiceSeed {
        id: "srv-facial-hidratante",
        name: "Facial Hidratante",
        category: "Faciales",
        description: "Limpieza profunda e hidratación con ácido hialurónico.",
        price: 95_000,
        rating: 4.6,
        review_count: 61,
        duration: 50,
    },
    ServiceSeed {
        id: "srv-reflexologia",
        name: "Reflexología Podal",
        category: "Terapias",
        description: "Presión en puntos reflejos de los pies para equilibrar el cuerpo.",
        price: 80_000,
        rating: 4.5,
        review_count: 40,
        duration: 45,
    },
    ServiceSeed {
        id: "srv-yoga-privado",
        name: "Clase Privada de Yoga",
        category: "Movimiento",
        description: "Sesión personalizada de yoga restaurativo y respiración consciente.",
        price: 70_000,
        rating: 4.7,
        review_count: 33,
        duration: 60,
    },
    ServiceSeed {
        id: "srv-piedras-calientes",
        name: "Masaje con Piedras Calientes",
        category: "Masajes",
        description: "Piedras volcánicas templadas que relajan la musculatura profunda.",
        price: 165_000,
        rating: 4.9,
        review_count: 57,
        duration: 90,
    },
    ServiceSeed {
        id: "srv-meditacion",
        name: "Meditación Guiada",
        category: "Movimiento",
        description: "Práctica guiada para reducir la ansiedad y mejorar el sueño.",
        price: 50_000,
        rating: 4.4,
        review_count: 22,
        duration: 40,
    },
];

const PRODUCT_SEEDS: &[ProductSeed] = &[
    ProductSeed {
        id: "prod-aceite-lavanda",
        name: "Aceite Esencial de Lavanda",
        category: "Aromaterapia",
        description: "Aceite puro de lavanda para relajación y descanso.",
        price: 45_000,
        rating: 4.8,
        review_count: 210,
        in_stock: true,
    },
    ProductSeed {
        id: "prod-vela-eucalipto",
        name: "Vela de Eucalipto",
        category: "Aromaterapia",
        description: "Vela de soya con eucalipto para despejar la mente.",
        price: 38_000,
        rating: 4.5,
        review_count: 87,
        in_stock: true,
    },
    ProductSeed {
        id: "prod-crema-arnica",
        name: "Crema de Árnica",
        category: "Cuidado Corporal",
        description: "Alivio tópico para golpes, tensión muscular y dolor de espalda.",
        price: 32_000,
        rating: 4.6,
        review_count: 145,
        in_stock: true,
    },
    ProductSeed {
        id: "prod-rodillo-jade",
        name: "Rodillo de Jade",
        category: "Cuidado Facial",
        description: "Rodillo facial de piedra de jade para masaje y drenaje.",
        price: 55_000,
        rating: 4.3,
        review_count: 64,
        in_stock: false,
    },
    ProductSeed {
        id: "prod-mat-yoga",
        name: "Mat de Yoga Ecológico",
        category: "Movimiento",
        description: "Tapete antideslizante de caucho natural.",
        price: 140_000,
        rating: 4.7,
        review_count: 52,
        in_stock: true,
    },
];

impl DemoDataset {
    pub fn services() -> Vec<WellnessService> {
        SERVICE_SEEDS
            .iter()
            .enumerate()
            .map(|(index, seed)| WellnessService {
                id: ServiceId(seed.id.to_string()),
                name: seed.name.to_string(),
                category: seed.category.to_string(),
                description: seed.description.to_string(),
                price: seed.price,
                rating: seed.rating,
                review_count: seed.review_count,
                duration: seed.duration,
                image: Some(DEFAULT_SERVICE_IMAGE.to_string()),
                created_at: epoch() + Duration::days(index as i64),
            })
            .collect()
    }

    pub fn products() -> Vec<Product> {
        PRODUCT_SEEDS
            .iter()
            .enumerate()
            .map(|(index, seed)| Product {
                id: ProductId(seed.id.to_string()),
                name: seed.name.to_string(),
                category: seed.category.to_string(),
                description: seed.description.to_string(),
                price: seed.price,
                rating: seed.rating,
                review_count: seed.review_count,
                in_stock: seed.in_stock,
                image_url: format!("https://placehold.co/400x400?text={}", seed.id),
                created_at: epoch() + Duration::days(index as i64),
            })
            .collect()
    }

    pub fn users() -> Vec<UserProfile> {
        let mut admin = UserProfile::new(
            UserId("demo-admin".to_string()),
            "Usuario Demo Admin",
            "demo@caliope.com",
        );
        admin.is_admin = true;
        admin.is_professional = true;
        admin.loyalty_points = 125;
        admin.phone = "3001234567".to_string();
        admin.address = "Calle Falsa 123, Bogotá".to_string();

        let mut client = UserProfile::new(
            UserId("demo-cliente".to_string()),
            "Camila Rojas",
            "camila@caliope.com",
        );
        client.loyalty_points = 1_650;

        let mut vip = UserProfile::new(
            UserId("demo-vip".to_string()),
            "Andrés Pardo",
            "andres@caliope.com",
        );
        vip.loyalty_points = 6_400;

        let mut users = vec![admin, client, vip];
        for (index, user) in users.iter_mut().enumerate() {
            user.created_at = epoch() + Duration::days(index as i64);
        }
        users
    }

    /// Upserts the dataset; loading twice leaves the same state.
    pub async fn load(repositories: &Repositories) -> Result<SeedResult, RepositoryError> {
        let services = Self::services();
        let products = Self::products();
        let users = Self::users();
        let result =
            SeedResult { services: services.len(), products: products.len(), users: users.len() };

        repositories.services.save_batch(services).await?;
        repositories.products.save_batch(products).await?;
        for user in users {
            repositories.users.save(user).await?;
        }

        tracing::info!(
            event_name = "db.seed.loaded",
            services = result.services,
            products = result.products,
            users = result.users,
            "demo dataset loaded"
        );
        Ok(result)
    }

    /// Fresh in-memory repositories holding the dataset.
    pub async fn in_memory() -> Result<Repositories, RepositoryError> {
        let repositories = Repositories::in_memory();
        Self::load(&repositories).await?;
        Ok(repositories)
    }
}
