use sqlx::Row;

use caliope_core::domain::user::{ProfessionalProfile, UserId};

use super::{
    decode_count, decode_error, decode_timestamp, encode_timestamp, ProfessionalRepository,
    RepositoryError,
};
use crate::DbPool;

pub struct SqlProfessionalRepository {
    pool: DbPool,
}

impl SqlProfessionalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_PROFESSIONAL: &str = "SELECT id, name, email, bio, specialties_json, profile_image_url,
        rating, review_count, is_verified, phone, address, created_at
 FROM professionals";

fn row_to_professional(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ProfessionalProfile, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_error)?;
    let specialties_json: String = row.try_get("specialties_json").map_err(decode_error)?;
    let rating: f64 = row.try_get("rating").map_err(decode_error)?;
    let review_count: i64 = row.try_get("review_count").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;

    let specialties: Vec<String> = serde_json::from_str(&specialties_json)
        .map_err(|error| RepositoryError::Decode(format!("column `specialties_json`: {error}")))?;

    Ok(ProfessionalProfile {
        id: UserId(id),
        name: row.try_get("name").map_err(decode_error)?,
        email: row.try_get("email").map_err(decode_error)?,
        bio: row.try_get("bio").map_err(decode_error)?,
        specialties,
        profile_image_url: row.try_get("profile_image_url").map_err(decode_error)?,
        rating: rating as f32,
        review_count: decode_count("review_count", review_count)?,
        is_verified: row.try_get("is_verified").map_err(decode_error)?,
        phone: row.try_get("phone").map_err(decode_error)?,
        address: row.try_get("address").map_err(decode_error)?,
        created_at: decode_timestamp("created_at", &created_at)?,
    })
}

#[async_trait::async_trait]
impl ProfessionalRepository for SqlProfessionalRepository {
    async fn find_by_id(
        &self,
        id: &UserId,
    ) -> Result<Option<ProfessionalProfile>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_PROFESSIONAL} WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_professional).transpose()
    }

    async fn list_all(&self) -> Result<Vec<ProfessionalProfile>, RepositoryError> {
        let rows = sqlx::query(&format!("{SELECT_PROFESSIONAL} ORDER BY rowid"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_professional).collect()
    }

    async fn register(&self, profile: ProfessionalProfile) -> Result<(), RepositoryError> {
        let specialties_json = serde_json::to_string(&profile.specialties)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;
        let created_at = encode_timestamp(&profile.created_at);

        let mut tx = self.pool.begin().await?;

        // Merge the professional flag into the user record, creating it if absent.
        sqlx::query(
            "INSERT INTO users (id, name, email, is_professional, phone, address, created_at)
             VALUES (?, ?, ?, 1, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET is_professional = 1",
        )
        .bind(&profile.id.0)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.address)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO professionals (id, name, email, bio, specialties_json, profile_image_url,
                                        rating, review_count, is_verified, phone, address,
                                        created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 email = excluded.email,
                 bio = excluded.bio,
                 specialties_json = excluded.specialties_json,
                 profile_image_url = excluded.profile_image_url,
                 phone = excluded.phone,
                 address = excluded.address",
        )
        .bind(&profile.id.0)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.bio)
        .bind(&specialties_json)
        .bind(&profile.profile_image_url)
        .bind(f64::from(profile.rating))
        .bind(i64::from(profile.review_count))
        .bind(profile.is_verified)
        .bind(&profile.phone)
        .bind(&profile.address)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
