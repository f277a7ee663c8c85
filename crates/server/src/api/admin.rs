use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use caliope_core::catalog::{filter_users, Page, RoleFilter, SortDirection, UserQuery, UserSort, UserSortField};
use caliope_core::domain::appointment::Appointment;
use caliope_core::domain::catalog::{ProductId, ProductUpload, ServiceId, ServiceUpload};
use caliope_core::domain::user::UserProfile;
use caliope_core::import::{PRODUCT_ID_PREFIX, SERVICE_ID_PREFIX};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::{new_record_id, ActionResponse, ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/users", get(list_users))
        .route("/api/v1/admin/appointments", get(list_appointments))
        .route("/api/v1/admin/services", post(create_service))
        .route("/api/v1/admin/products", post(create_product))
        .route("/api/v1/admin/services/bulk", post(import_services))
        .route("/api/v1/admin/products/bulk", post(import_products))
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub query: Option<String>,
    pub role: Option<RoleFilter>,
    pub level: Option<u32>,
    pub sort_by: Option<UserSortField>,
    pub sort_direction: Option<SortDirection>,
}

impl UserListParams {
    fn into_query(self, default_page_size: i64) -> UserQuery {
        let defaults = UserSort::default();
        let sort = Some(UserSort {
            field: self.sort_by.unwrap_or(defaults.field),
            direction: self.sort_direction.unwrap_or(defaults.direction),
        });

        UserQuery {
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or(default_page_size),
            query: self.query,
            role: self.role.unwrap_or_default(),
            level: self.level,
            sort,
        }
    }
}

async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserListParams>,
) -> Result<Json<Page<UserProfile>>, ApiError> {
    let users = state.repositories.users.list_all().await?;
    let query = params.into_query(state.default_page_size);
    Ok(Json(filter_users(&users, &query, &state.tiers)))
}

async fn list_appointments(State(state): State<AppState>) -> Result<Json<Vec<Appointment>>, ApiError> {
    Ok(Json(state.repositories.appointments.list_by_date().await?))
}

async fn create_service(
    State(state): State<AppState>,
    Json(upload): Json<ServiceUpload>,
) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
    if upload.name.trim().is_empty() {
        return Err(ApiError::validation("`name` is required"));
    }

    let service = upload.into_service(ServiceId(new_record_id(SERVICE_ID_PREFIX)), Utc::now());
    let id = service.id.0.clone();
    state.repositories.services.save(service).await?;

    info!(event_name = "admin.service.created", service_id = %id, "service created");
    Ok((StatusCode::CREATED, Json(ActionResponse::created(id, "Servicio creado con éxito."))))
}

async fn create_product(
    State(state): State<AppState>,
    Json(upload): Json<ProductUpload>,
) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
    if upload.name.trim().is_empty() {
        return Err(ApiError::validation("`name` is required"));
    }

    let product = upload.into_product(ProductId(new_record_id(PRODUCT_ID_PREFIX)), Utc::now());
    let id = product.id.0.clone();
    state.repositories.products.save(product).await?;

    info!(event_name = "admin.product.created", product_id = %id, "product created");
    Ok((StatusCode::CREATED, Json(ActionResponse::created(id, "Producto creado con éxito."))))
}

/// Raw body so parse failures surface as import errors, not extractor rejections.
async fn import_services(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ActionResponse>, ApiError> {
    let count = state
        .importer
        .import_json::<ServiceUpload, _>(&body, SERVICE_ID_PREFIX, state.repositories.services.as_ref())
        .await?;

    info!(event_name = "admin.services.imported", count, "bulk service import finished");
    Ok(Json(ActionResponse::imported(count, format!("{count} servicios añadidos con éxito."))))
}

async fn import_products(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ActionResponse>, ApiError> {
    let count = state
        .importer
        .import_json::<ProductUpload, _>(&body, PRODUCT_ID_PREFIX, state.repositories.products.as_ref())
        .await?;

    info!(event_name = "admin.products.imported", count, "bulk product import finished");
    Ok(Json(ActionResponse::imported(count, format!("{count} productos añadidos con éxito."))))
}
