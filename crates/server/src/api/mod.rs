//! JSON API.
//!
//! Storefront:
//! - `GET  /api/v1/services`, `/api/v1/products`          paginated listings
//! - `GET  /api/v1/{services,products}/categories`       distinct categories
//! - `GET  /api/v1/{services,products}/{id}`             single entry
//! - `POST /api/v1/users`, `/api/v1/professionals`       registration
//! - `POST /api/v1/users/{id}/profile`                   profile merge
//! - `GET  /api/v1/users/{id}/loyalty`                   tier + progress
//! - `POST /api/v1/appointments`, `/api/v1/orders`       bookings and orders
//!
//! Concierge:
//! - `POST /api/v1/concierge`                            catalog recommendations
//! - `POST /api/v1/recommendations/services`             AI-drafted services
//!
//! Admin:
//! - `GET  /api/v1/admin/users`, `/api/v1/admin/appointments`
//! - `POST /api/v1/admin/{services,products}`            single create
//! - `POST /api/v1/admin/{services,products}/bulk`       bulk import (raw JSON body)

pub mod admin;
pub mod concierge;
pub mod storefront;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use caliope_agent::{Concierge, ServiceGenerator};
use caliope_core::errors::{ApplicationError, DomainError, InterfaceError};
use caliope_core::import::{BulkImporter, ImportError};
use caliope_core::loyalty::TierTable;
use caliope_db::{DbPool, Repositories, RepositoryError};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::health;

#[derive(Clone)]
pub struct AppState {
    pub repositories: Repositories,
    pub concierge: Arc<Concierge>,
    pub generator: Option<Arc<ServiceGenerator>>,
    pub importer: BulkImporter,
    pub tiers: Arc<TierTable>,
    pub default_page_size: i64,
}

pub fn router(state: AppState, db_pool: Option<DbPool>) -> Router {
    let api = Router::new()
        .merge(storefront::routes())
        .merge(concierge::routes())
        .merge(admin::routes())
        .with_state(state);

    Router::new().merge(health::router(db_pool)).merge(api)
}

/// Body returned by every mutating action.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, rename = "isNewUser", skip_serializing_if = "Option::is_none")]
    pub is_new_user: Option<bool>,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: Some(message.into()), ..Self::default() }
    }

    pub fn created(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self { id: Some(id.into()), ..Self::ok(message) }
    }

    pub fn imported(count: usize, message: impl Into<String>) -> Self {
        Self { count: Some(count), ..Self::ok(message) }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub message: String,
    pub correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError(pub ApplicationError);

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self(ApplicationError::Validation(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self(ApplicationError::NotFound(message.into()))
    }
}

impl From<ApplicationError> for ApiError {
    fn from(value: ApplicationError) -> Self {
        Self(value)
    }
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        Self(ApplicationError::Domain(value))
    }
}

impl From<RepositoryError> for ApiError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound(message) => Self(ApplicationError::NotFound(message)),
            other => Self(ApplicationError::Persistence(other.to_string())),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(value: ImportError) -> Self {
        match value {
            ImportError::Write { .. } => Self(ApplicationError::Persistence(value.to_string())),
            ImportError::InvalidChunkSize(_) => {
                Self(ApplicationError::Configuration(value.to_string()))
            }
            ImportError::InvalidJson(_) | ImportError::NotAnArray | ImportError::InvalidItem { .. } => {
                Self(ApplicationError::Validation(value.to_string()))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let correlation_id = Uuid::new_v4().simple().to_string();
        let interface = self.0.into_interface(correlation_id.clone());

        let status = match &interface {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(
                event_name = "api.request.failed",
                correlation_id = %correlation_id,
                error = %interface,
                "request failed"
            );
        } else {
            warn!(
                event_name = "api.request.rejected",
                correlation_id = %correlation_id,
                error = %interface,
                "request rejected"
            );
        }

        // Internal details stay in the log.
        let message = match &interface {
            InterfaceError::Internal { .. } => interface.user_message().to_string(),
            other => other.message().to_string(),
        };
        let body = ErrorBody {
            success: false,
            error: interface.user_message().to_string(),
            message,
            correlation_id,
        };
        (status, Json(body)).into_response()
    }
}

pub(crate) fn new_record_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}
