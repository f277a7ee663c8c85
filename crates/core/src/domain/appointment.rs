use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::catalog::ServiceId;
use crate::domain::user::UserId;
use crate::errors::DomainError;

pub const UNASSIGNED_PROFESSIONAL_ID: &str = "pending-assignment";
pub const UNASSIGNED_PROFESSIONAL_NAME: &str = "Por asignar";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "scheduled" => Some(Self::Scheduled),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub user_id: UserId,
    pub user_name: String,
    pub service_id: ServiceId,
    pub service_name: String,
    pub price: u64,
    pub appointment_date: DateTime<Utc>,
    pub professional_id: String,
    pub professional_name: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    pub user_id: String,
    pub user_name: String,
    pub service_id: String,
    pub service_name: String,
    pub price: u64,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub professional_id: Option<String>,
    #[serde(default)]
    pub professional_name: Option<String>,
}

impl Appointment {
    /// Books a new appointment; it always starts out scheduled.
    pub fn book(id: AppointmentId, request: AppointmentRequest) -> Self {
        Self {
            id,
            user_id: UserId(request.user_id),
            user_name: request.user_name,
            service_id: ServiceId(request.service_id),
            service_name: request.service_name,
            price: request.price,
            appointment_date: request.date,
            professional_id: request
                .professional_id
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| UNASSIGNED_PROFESSIONAL_ID.to_string()),
            professional_name: request
                .professional_name
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| UNASSIGNED_PROFESSIONAL_NAME.to_string()),
            status: AppointmentStatus::Scheduled,
            created_at: Utc::now(),
        }
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        matches!(
            (self.status, next),
            (AppointmentStatus::Scheduled, AppointmentStatus::Completed)
                | (AppointmentStatus::Scheduled, AppointmentStatus::Cancelled)
        )
    }

    pub fn transition_to(&mut self, next: AppointmentStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidAppointmentTransition { from: self.status, to: next })
    }
}
