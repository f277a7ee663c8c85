use sqlx::Row;

use caliope_core::domain::appointment::{Appointment, AppointmentId, AppointmentStatus};
use caliope_core::domain::catalog::ServiceId;
use caliope_core::domain::user::UserId;

use super::{
    decode_amount, decode_error, decode_timestamp, encode_amount, encode_timestamp,
    AppointmentRepository, RepositoryError,
};
use crate::DbPool;

pub struct SqlAppointmentRepository {
    pool: DbPool,
}

impl SqlAppointmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_APPOINTMENT: &str = "SELECT id, user_id, user_name, service_id, service_name, price,
        appointment_date, professional_id, professional_name, status, created_at
 FROM appointments";

fn row_to_appointment(row: &sqlx::sqlite::SqliteRow) -> Result<Appointment, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_error)?;
    let user_id: String = row.try_get("user_id").map_err(decode_error)?;
    let service_id: String = row.try_get("service_id").map_err(decode_error)?;
    let price: i64 = row.try_get("price").map_err(decode_error)?;
    let appointment_date: String = row.try_get("appointment_date").map_err(decode_error)?;
    let status: String = row.try_get("status").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;

    let status = AppointmentStatus::parse(&status).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown appointment status `{status}`"))
    })?;

    Ok(Appointment {
        id: AppointmentId(id),
        user_id: UserId(user_id),
        user_name: row.try_get("user_name").map_err(decode_error)?,
        service_id: ServiceId(service_id),
        service_name: row.try_get("service_name").map_err(decode_error)?,
        price: decode_amount("price", price)?,
        appointment_date: decode_timestamp("appointment_date", &appointment_date)?,
        professional_id: row.try_get("professional_id").map_err(decode_error)?,
        professional_name: row.try_get("professional_name").map_err(decode_error)?,
        status,
        created_at: decode_timestamp("created_at", &created_at)?,
    })
}

#[async_trait::async_trait]
impl AppointmentRepository for SqlAppointmentRepository {
    async fn find_by_id(
        &self,
        id: &AppointmentId,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_APPOINTMENT} WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_appointment).transpose()
    }

    async fn list_by_date(&self) -> Result<Vec<Appointment>, RepositoryError> {
        let rows = sqlx::query(&format!("{SELECT_APPOINTMENT} ORDER BY appointment_date ASC, rowid"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_appointment).collect()
    }

    async fn save(&self, appointment: Appointment) -> Result<(), RepositoryError> {
        // created_at is never rewritten once stored.
        sqlx::query(
            "INSERT INTO appointments (id, user_id, user_name, service_id, service_name, price,
                                       appointment_date, professional_id, professional_name,
                                       status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 appointment_date = excluded.appointment_date,
                 professional_id = excluded.professional_id,
                 professional_name = excluded.professional_name,
                 status = excluded.status",
        )
        .bind(&appointment.id.0)
        .bind(&appointment.user_id.0)
        .bind(&appointment.user_name)
        .bind(&appointment.service_id.0)
        .bind(&appointment.service_name)
        .bind(encode_amount("price", appointment.price)?)
        .bind(encode_timestamp(&appointment.appointment_date))
        .bind(&appointment.professional_id)
        .bind(&appointment.professional_name)
        .bind(appointment.status.as_str())
        .bind(encode_timestamp(&appointment.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
