use sqlx::Row;

use caliope_core::domain::user::{ProfileUpdate, UserId, UserProfile};

use super::{
    decode_amount, decode_error, decode_timestamp, encode_amount, encode_timestamp,
    RepositoryError, UserRepository,
};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_USER: &str = "SELECT id, name, email, is_admin, is_professional, loyalty_points,
        phone, address, photo_url, created_at
 FROM users";

pub(crate) fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<UserProfile, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_error)?;
    let loyalty_points: i64 = row.try_get("loyalty_points").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;

    Ok(UserProfile {
        id: UserId(id),
        name: row.try_get("name").map_err(decode_error)?,
        email: row.try_get("email").map_err(decode_error)?,
        is_admin: row.try_get("is_admin").map_err(decode_error)?,
        is_professional: row.try_get("is_professional").map_err(decode_error)?,
        loyalty_points: decode_amount("loyalty_points", loyalty_points)?,
        phone: row.try_get("phone").map_err(decode_error)?,
        address: row.try_get("address").map_err(decode_error)?,
        photo_url: row.try_get("photo_url").map_err(decode_error)?,
        created_at: decode_timestamp("created_at", &created_at)?,
    })
}

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn list_all(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        let rows =
            sqlx::query(&format!("{SELECT_USER} ORDER BY rowid")).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_user).collect()
    }

    async fn save(&self, user: UserProfile) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO users (id, name, email, is_admin, is_professional, loyalty_points,
                                phone, address, photo_url, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 email = excluded.email,
                 is_admin = excluded.is_admin,
                 is_professional = excluded.is_professional,
                 loyalty_points = excluded.loyalty_points,
                 phone = excluded.phone,
                 address = excluded.address,
                 photo_url = excluded.photo_url",
        )
        .bind(&user.id.0)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.is_admin)
        .bind(user.is_professional)
        .bind(encode_amount("loyalty_points", user.loyalty_points)?)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(&user.photo_url)
        .bind(encode_timestamp(&user.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_if_absent(&self, user: UserProfile) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO users (id, name, email, is_admin, is_professional, loyalty_points,
                                phone, address, photo_url, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(&user.id.0)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.is_admin)
        .bind(user.is_professional)
        .bind(encode_amount("loyalty_points", user.loyalty_points)?)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(&user.photo_url)
        .bind(encode_timestamp(&user.created_at))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!("{SELECT_USER} WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Err(RepositoryError::NotFound(format!("user `{}`", id.0)));
        };

        let mut user = row_to_user(&row)?;
        user.apply_update(update);

        sqlx::query("UPDATE users SET name = ?, phone = ?, address = ? WHERE id = ?")
            .bind(&user.name)
            .bind(&user.phone)
            .bind(&user.address)
            .bind(&id.0)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(user)
    }
}
