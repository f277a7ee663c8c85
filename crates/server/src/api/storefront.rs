use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use caliope_core::catalog::{categories, filter_and_paginate, Page, QuerySpec};
use caliope_core::domain::appointment::{Appointment, AppointmentId, AppointmentRequest};
use caliope_core::domain::catalog::{Product, ProductId, ServiceId, WellnessService};
use caliope_core::domain::order::{Order, OrderId, OrderItem};
use caliope_core::domain::user::{ProfessionalProfile, ProfileUpdate, UserId, UserProfile};
use caliope_core::loyalty::LoyaltyStatus;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::{new_record_id, ActionResponse, ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/services", get(list_services))
        .route("/api/v1/services/categories", get(service_categories))
        .route("/api/v1/services/{id}", get(get_service))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/categories", get(product_categories))
        .route("/api/v1/products/{id}", get(get_product))
        .route("/api/v1/users", post(register_user))
        .route("/api/v1/professionals", post(register_professional))
        .route("/api/v1/users/{id}/profile", post(update_profile))
        .route("/api/v1/users/{id}/loyalty", get(loyalty_status))
        .route("/api/v1/appointments", post(create_appointment))
        .route("/api/v1/orders", post(create_order))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub query: Option<String>,
    pub category: Option<String>,
}

impl ListParams {
    fn into_spec(self, default_page_size: i64) -> QuerySpec {
        QuerySpec {
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or(default_page_size),
            query: self.query,
            category: self.category,
        }
    }
}

async fn list_services(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<WellnessService>>, ApiError> {
    let services = state.repositories.services.list_all().await?;
    Ok(Json(filter_and_paginate(&services, &params.into_spec(state.default_page_size))))
}

async fn service_categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let services = state.repositories.services.list_all().await?;
    Ok(Json(categories(&services)))
}

async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WellnessService>, ApiError> {
    state
        .repositories
        .services
        .find_by_id(&ServiceId(id.clone()))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("service `{id}`")))
}

async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Product>>, ApiError> {
    let products = state.repositories.products.list_all().await?;
    Ok(Json(filter_and_paginate(&products, &params.into_spec(state.default_page_size))))
}

async fn product_categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let products = state.repositories.products.list_all().await?;
    Ok(Json(categories(&products)))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    state
        .repositories
        .products
        .find_by_id(&ProductId(id.clone()))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("product `{id}`")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub uid: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
    let uid = required("uid", &request.uid)?;
    let email = required("email", &request.email)?;

    let mut user = UserProfile::new(UserId(uid.to_string()), request.name.trim(), email);
    user.phone = request.phone;
    user.address = request.address;

    if !state.repositories.users.create_if_absent(user).await? {
        info!(event_name = "storefront.user.existing", user_id = %uid, "user already registered");
        let response = ActionResponse {
            is_new_user: Some(false),
            ..ActionResponse::created(uid, "Usuario ya registrado.")
        };
        return Ok((StatusCode::OK, Json(response)));
    }

    info!(event_name = "storefront.user.registered", user_id = %uid, "user registered");
    let response = ActionResponse {
        is_new_user: Some(true),
        ..ActionResponse::created(uid, "Usuario registrado con éxito.")
    };
    Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterProfessionalRequest {
    pub uid: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub profile_image_url: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

async fn register_professional(
    State(state): State<AppState>,
    Json(request): Json<RegisterProfessionalRequest>,
) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
    let uid = required("uid", &request.uid)?.to_string();
    let email = required("email", &request.email)?.to_string();

    // New professionals start unverified with no reviews.
    let profile = ProfessionalProfile {
        id: UserId(uid.clone()),
        name: request.name.trim().to_string(),
        email,
        bio: request.bio,
        specialties: request.specialties,
        profile_image_url: request.profile_image_url,
        rating: 0.0,
        review_count: 0,
        is_verified: false,
        phone: request.phone,
        address: request.address,
        created_at: Utc::now(),
    };
    state.repositories.professionals.register(profile).await?;

    info!(event_name = "storefront.professional.registered", user_id = %uid, "professional registered");
    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::created(uid, "Profesional registrado con éxito.")),
    ))
}

async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ActionResponse>, ApiError> {
    let uid = required("uid", &id)?;
    let user = state.repositories.users.update_profile(&UserId(uid.to_string()), &update).await?;

    Ok(Json(ActionResponse { id: Some(user.id.0), ..ActionResponse::ok("Perfil actualizado.") }))
}

async fn loyalty_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LoyaltyStatus>, ApiError> {
    let user = state
        .repositories
        .users
        .find_by_id(&UserId(id.clone()))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("user `{id}`")))?;

    Ok(Json(state.tiers.status(user.loyalty_points)))
}

async fn create_appointment(
    State(state): State<AppState>,
    Json(request): Json<AppointmentRequest>,
) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
    required("userId", &request.user_id)?;
    required("serviceId", &request.service_id)?;

    let appointment = Appointment::book(AppointmentId(new_record_id("apt")), request);
    let id = appointment.id.0.clone();
    state.repositories.appointments.save(appointment).await?;

    info!(event_name = "storefront.appointment.created", appointment_id = %id, "appointment booked");
    Ok((StatusCode::CREATED, Json(ActionResponse::created(id, "Cita agendada con éxito."))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub user_name: String,
    pub items: Vec<OrderItem>,
}

async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
    let user_id = required("userId", &request.user_id)?.to_string();

    let order = Order::place(
        OrderId(new_record_id("ord")),
        UserId(user_id),
        request.user_name,
        request.items,
    )?;
    let id = order.id.0.clone();
    let total = order.total;
    state.repositories.orders.save(order).await?;

    info!(event_name = "storefront.order.created", order_id = %id, total, "order placed");
    Ok((StatusCode::CREATED, Json(ActionResponse::created(id, "Pedido creado con éxito."))))
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("`{field}` is required")));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use caliope_core::domain::user::UserId;
    use serde_json::json;

    use crate::api::test_support::{app, demo_state, get, post};

    #[tokio::test]
    async fn service_listing_paginates_and_reports_total() {
        let state = demo_state().await;
        let total = state.repositories.services.list_all().await.expect("list").len();

        let (status, body) = get(app(state), "/api/v1/services?page=1&page_size=3").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["total"], json!(total));
    }

    #[tokio::test]
    async fn service_search_is_case_insensitive() {
        let (_, body) = get(app(demo_state().await), "/api/v1/services?query=MASAJE").await;

        let names: Vec<&str> =
            body["data"].as_array().expect("data").iter().filter_map(|s| s["name"].as_str()).collect();
        assert!(!names.is_empty());
        assert!(names.iter().all(|name| name.to_lowercase().contains("masaje")));
        assert!(!names.contains(&"Facial Hidratante"));
    }

    #[tokio::test]
    async fn page_beyond_the_end_is_empty_with_total() {
        let (status, body) =
            get(app(demo_state().await), "/api/v1/products?page=50&page_size=10").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
        assert!(body["total"].as_u64().expect("total") > 0);
    }

    #[tokio::test]
    async fn categories_are_distinct() {
        let (_, body) = get(app(demo_state().await), "/api/v1/services/categories").await;

        let categories: Vec<&str> =
            body.as_array().expect("array").iter().filter_map(|c| c.as_str()).collect();
        let distinct: std::collections::HashSet<&str> = categories.iter().copied().collect();
        assert_eq!(categories.len(), distinct.len());
        assert_eq!(categories.first(), Some(&"Masajes"));
    }

    #[tokio::test]
    async fn product_lookup_and_missing_product() {
        let state = demo_state().await;
        let (status, body) = get(app(state.clone()), "/api/v1/products/prod-aceite-lavanda").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["inStock"], true);

        let (status, _) = get(app(state), "/api/v1/products/prod-nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn registration_then_loyalty_lookup() {
        let state = demo_state().await;
        let (status, body) = post(
            app(state.clone()),
            "/api/v1/users",
            json!({ "uid": "u-new", "name": "Lucía", "email": "lucia@caliope.com" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "u-new");
        assert_eq!(body["isNewUser"], true);

        let (status, body) = get(app(state), "/api/v1/users/u-new/loyalty").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["points"], 0);
        assert_eq!(body["level"]["level"], 1);
    }

    #[tokio::test]
    async fn registering_an_existing_uid_keeps_points_and_roles() {
        let state = demo_state().await;
        let (status, body) = post(
            app(state.clone()),
            "/api/v1/users",
            json!({ "uid": "demo-vip", "name": "Otro Nombre", "email": "otro@caliope.com" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["id"], "demo-vip");
        assert_eq!(body["isNewUser"], false);

        let (status, body) = get(app(state.clone()), "/api/v1/users/demo-vip/loyalty").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["points"], 6_400);
        assert_eq!(body["level"]["name"], "Diamante");

        let (_, body) = post(
            app(state.clone()),
            "/api/v1/users",
            json!({ "uid": "demo-admin", "name": "Admin", "email": "admin@caliope.com" }),
        )
        .await;
        assert_eq!(body["isNewUser"], false);
        let admin = state
            .repositories
            .users
            .find_by_id(&UserId("demo-admin".to_string()))
            .await
            .expect("lookup")
            .expect("admin stays registered");
        assert!(admin.is_admin && admin.is_professional);
        assert_eq!(admin.name, "Usuario Demo Admin");
    }

    #[tokio::test]
    async fn registration_requires_uid() {
        let (status, body) = post(
            app(demo_state().await),
            "/api/v1/users",
            json!({ "uid": "  ", "name": "Sin id", "email": "x@caliope.com" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn professional_registration_flags_the_user() {
        let state = demo_state().await;
        let (status, _) = post(
            app(state.clone()),
            "/api/v1/professionals",
            json!({
                "uid": "demo-cliente",
                "name": "Camila Rojas",
                "email": "camila@caliope.com",
                "specialties": ["Reflexología"]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = get(
            app(state),
            "/api/v1/admin/users?role=professional&sort_by=name&sort_direction=asc",
        )
        .await;
        let ids: Vec<&str> =
            body["data"].as_array().expect("data").iter().filter_map(|u| u["id"].as_str()).collect();
        assert!(ids.contains(&"demo-cliente"));
    }

    #[tokio::test]
    async fn profile_update_merges_and_rejects_unknown_users() {
        let state = demo_state().await;
        let (status, _) = post(
            app(state.clone()),
            "/api/v1/users/demo-cliente/profile",
            json!({ "phone": "3109998888", "address": "" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let user = state
            .repositories
            .users
            .find_by_id(&UserId("demo-cliente".to_string()))
            .await
            .expect("find")
            .expect("exists");
        assert_eq!(user.phone, "3109998888");
        assert_eq!(user.name, "Camila Rojas");

        let (status, _) =
            post(app(state), "/api/v1/users/ghost/profile", json!({ "name": "Nadie" })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn appointment_defaults_to_unassigned_professional() {
        let state = demo_state().await;
        let (status, body) = post(
            app(state.clone()),
            "/api/v1/appointments",
            json!({
                "userId": "demo-cliente",
                "userName": "Camila Rojas",
                "serviceId": "srv-reflexologia",
                "serviceName": "Reflexología Podal",
                "price": 80000,
                "date": "2030-03-10T15:00:00Z"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_str().expect("id").to_string();
        assert!(id.starts_with("apt-"));

        let (_, listing) = get(app(state), "/api/v1/admin/appointments").await;
        let stored = &listing.as_array().expect("array")[0];
        assert_eq!(stored["status"], "scheduled");
        assert_eq!(stored["professionalName"], "Por asignar");
    }

    #[tokio::test]
    async fn orders_start_pending_payment_and_reject_empty_items() {
        let state = demo_state().await;
        let (status, body) = post(
            app(state.clone()),
            "/api/v1/orders",
            json!({
                "userId": "demo-cliente",
                "userName": "Camila Rojas",
                "items": [{ "productId": "prod-vela-eucalipto", "name": "Vela", "price": 38000, "quantity": 2 }]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let orders = state
            .repositories
            .orders
            .list_for_user(&UserId("demo-cliente".to_string()))
            .await
            .expect("orders");
        assert_eq!(orders[0].total, 76_000);
        assert_eq!(orders[0].id.0, body["id"].as_str().expect("id"));

        let (status, _) = post(
            app(state),
            "/api/v1/orders",
            json!({ "userId": "demo-cliente", "userName": "Camila Rojas", "items": [] }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
