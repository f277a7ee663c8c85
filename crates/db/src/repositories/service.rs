use sqlx::Row;

use caliope_core::domain::catalog::{ServiceId, WellnessService};

use super::{
    decode_amount, decode_count, decode_error, decode_timestamp, encode_amount, encode_timestamp,
    RepositoryError, ServiceRepository,
};
use crate::DbPool;

pub struct SqlServiceRepository {
    pool: DbPool,
}

impl SqlServiceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_SERVICE: &str = "SELECT id, name, category, description, price, rating, review_count,
        duration_minutes, image, created_at
 FROM services";

const UPSERT_SERVICE: &str = "INSERT INTO services (id, name, category, description, price, rating,
                      review_count, duration_minutes, image, created_at)
 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
 ON CONFLICT(id) DO UPDATE SET
     name = excluded.name,
     category = excluded.category,
     description = excluded.description,
     price = excluded.price,
     rating = excluded.rating,
     review_count = excluded.review_count,
     duration_minutes = excluded.duration_minutes,
     image = excluded.image";

fn row_to_service(row: &sqlx::sqlite::SqliteRow) -> Result<WellnessService, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_error)?;
    let price: i64 = row.try_get("price").map_err(decode_error)?;
    let rating: f64 = row.try_get("rating").map_err(decode_error)?;
    let review_count: i64 = row.try_get("review_count").map_err(decode_error)?;
    let duration: i64 = row.try_get("duration_minutes").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;

    Ok(WellnessService {
        id: ServiceId(id),
        name: row.try_get("name").map_err(decode_error)?,
        category: row.try_get("category").map_err(decode_error)?,
        description: row.try_get("description").map_err(decode_error)?,
        price: decode_amount("price", price)?,
        rating: rating as f32,
        review_count: decode_count("review_count", review_count)?,
        duration: decode_count("duration_minutes", duration)?,
        image: row.try_get("image").map_err(decode_error)?,
        created_at: decode_timestamp("created_at", &created_at)?,
    })
}

async fn upsert<'e, E>(executor: E, service: &WellnessService) -> Result<(), RepositoryError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(UPSERT_SERVICE)
        .bind(&service.id.0)
        .bind(&service.name)
        .bind(&service.category)
        .bind(&service.description)
        .bind(encode_amount("price", service.price)?)
        .bind(f64::from(service.rating))
        .bind(i64::from(service.review_count))
        .bind(i64::from(service.duration))
        .bind(&service.image)
        .bind(encode_timestamp(&service.created_at))
        .execute(executor)
        .await?;
    Ok(())
}

#[async_trait::async_trait]
impl ServiceRepository for SqlServiceRepository {
    async fn find_by_id(&self, id: &ServiceId) -> Result<Option<WellnessService>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_SERVICE} WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_service).transpose()
    }

    async fn list_all(&self) -> Result<Vec<WellnessService>, RepositoryError> {
        let rows = sqlx::query(&format!("{SELECT_SERVICE} ORDER BY rowid"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_service).collect()
    }

    async fn save(&self, service: WellnessService) -> Result<(), RepositoryError> {
        upsert(&self.pool, &service).await
    }

    async fn save_batch(&self, services: Vec<WellnessService>) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for service in &services {
            upsert(&mut *tx, service).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use caliope_core::domain::catalog::{ServiceId, WellnessService};

    use super::SqlServiceRepository;
    use crate::repositories::ServiceRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlServiceRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlServiceRepository::new(pool)
    }

    fn service(id: &str, name: &str) -> WellnessService {
        WellnessService {
            id: ServiceId(id.to_string()),
            name: name.to_string(),
            category: "Masajes".to_string(),
            description: "Masaje de tejido profundo".to_string(),
            price: 150_000,
            rating: 4.5,
            review_count: 12,
            duration: 60,
            image: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_and_find_by_id() {
        let repo = setup().await;
        repo.save(service("srv-1", "Masaje Relajante")).await.expect("save");

        let found = repo
            .find_by_id(&ServiceId("srv-1".to_string()))
            .await
            .expect("find")
            .expect("should exist");

        assert_eq!(found.name, "Masaje Relajante");
        assert_eq!(found.price, 150_000);
        assert_eq!(found.duration, 60);
        assert!(repo.find_by_id(&ServiceId("missing".to_string())).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn list_all_keeps_insertion_order() {
        let repo = setup().await;
        repo.save(service("srv-b", "Segundo")).await.expect("save b");
        repo.save(service("srv-a", "Primero")).await.expect("save a");

        let ids: Vec<_> =
            repo.list_all().await.expect("list").into_iter().map(|service| service.id.0).collect();
        assert_eq!(ids, vec!["srv-b", "srv-a"]);
    }

    #[tokio::test]
    async fn failed_batch_writes_nothing() {
        let repo = setup().await;
        let mut invalid = service("srv-2", "Invalido");
        invalid.rating = 9.0;

        let result = repo.save_batch(vec![service("srv-1", "Valido"), invalid]).await;

        assert!(result.is_err());
        assert!(repo.list_all().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn save_upserts_on_conflict() {
        let repo = setup().await;
        repo.save(service("srv-1", "Masaje")).await.expect("save");

        let mut updated = service("srv-1", "Masaje Premium");
        updated.price = 200_000;
        repo.save(updated).await.expect("upsert");

        let all = repo.list_all().await.expect("list");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Masaje Premium");
        assert_eq!(all[0].price, 200_000);
    }
}
