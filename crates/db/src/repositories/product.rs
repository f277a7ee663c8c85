use sqlx::Row;

use caliope_core::domain::catalog::{Product, ProductId};

use super::{
    decode_amount, decode_count, decode_error, decode_timestamp, encode_amount, encode_timestamp,
    ProductRepository, RepositoryError,
};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_PRODUCT: &str = "SELECT id, name, category, description, price, rating, review_count,
        in_stock, image_url, created_at
 FROM products";

const UPSERT_PRODUCT: &str = "INSERT INTO products (id, name, category, description, price, rating,
                      review_count, in_stock, image_url, created_at)
 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
 ON CONFLICT(id) DO UPDATE SET
     name = excluded.name,
     category = excluded.category,
     description = excluded.description,
     price = excluded.price,
     rating = excluded.rating,
     review_count = excluded.review_count,
     in_stock = excluded.in_stock,
     image_url = excluded.image_url";

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_error)?;
    let price: i64 = row.try_get("price").map_err(decode_error)?;
    let rating: f64 = row.try_get("rating").map_err(decode_error)?;
    let review_count: i64 = row.try_get("review_count").map_err(decode_error)?;
    let in_stock: i64 = row.try_get("in_stock").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;

    let in_stock = match in_stock {
        0 => false,
        1 => true,
        other => {
            return Err(RepositoryError::Decode(format!("column `in_stock` is not a flag: {other}")))
        }
    };

    Ok(Product {
        id: ProductId(id),
        name: row.try_get("name").map_err(decode_error)?,
        category: row.try_get("category").map_err(decode_error)?,
        description: row.try_get("description").map_err(decode_error)?,
        price: decode_amount("price", price)?,
        rating: rating as f32,
        review_count: decode_count("review_count", review_count)?,
        in_stock,
        image_url: row.try_get("image_url").map_err(decode_error)?,
        created_at: decode_timestamp("created_at", &created_at)?,
    })
}

async fn upsert<'e, E>(executor: E, product: &Product) -> Result<(), RepositoryError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(UPSERT_PRODUCT)
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.description)
        .bind(encode_amount("price", product.price)?)
        .bind(f64::from(product.rating))
        .bind(i64::from(product.review_count))
        .bind(product.in_stock)
        .bind(&product.image_url)
        .bind(encode_timestamp(&product.created_at))
        .execute(executor)
        .await?;
    Ok(())
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_PRODUCT} WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!("{SELECT_PRODUCT} ORDER BY rowid"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        upsert(&self.pool, &product).await
    }

    async fn save_batch(&self, products: Vec<Product>) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for product in &products {
            upsert(&mut *tx, product).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use caliope_core::domain::catalog::{Product, ProductId};

    use super::SqlProductRepository;
    use crate::repositories::ProductRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlProductRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlProductRepository::new(pool)
    }

    fn product(id: &str, in_stock: bool) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: "Aceite de Lavanda".to_string(),
            category: "Aceites".to_string(),
            description: "Aceite esencial relajante".to_string(),
            price: 45_000,
            rating: 4.8,
            review_count: 30,
            in_stock,
            image_url: "https://img.caliope.co/lavanda.png".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_and_find_preserves_stock_flag() {
        let repo = setup().await;
        repo.save(product("prod-1", false)).await.expect("save");

        let found = repo
            .find_by_id(&ProductId("prod-1".to_string()))
            .await
            .expect("find")
            .expect("should exist");

        assert!(!found.in_stock);
        assert_eq!(found.price, 45_000);
    }

    #[tokio::test]
    async fn batch_commits_every_product() {
        let repo = setup().await;
        let batch = (0..5).map(|n| product(&format!("prod-{n}"), true)).collect();

        repo.save_batch(batch).await.expect("batch");

        assert_eq!(repo.list_all().await.expect("list").len(), 5);
    }
}
