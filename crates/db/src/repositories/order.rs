use sqlx::Row;

use caliope_core::domain::order::{Order, OrderId, OrderItem, OrderStatus};
use caliope_core::domain::user::UserId;

use super::{
    decode_amount, decode_error, decode_timestamp, encode_amount, encode_timestamp,
    OrderRepository, RepositoryError,
};
use crate::DbPool;

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_ORDER: &str =
    "SELECT id, user_id, user_name, items_json, total, status, created_at, updated_at FROM orders";

fn row_to_order(row: &sqlx::sqlite::SqliteRow) -> Result<Order, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_error)?;
    let user_id: String = row.try_get("user_id").map_err(decode_error)?;
    let items_json: String = row.try_get("items_json").map_err(decode_error)?;
    let total: i64 = row.try_get("total").map_err(decode_error)?;
    let status: String = row.try_get("status").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode_error)?;

    let items: Vec<OrderItem> = serde_json::from_str(&items_json)
        .map_err(|error| RepositoryError::Decode(format!("column `items_json`: {error}")))?;
    let status = OrderStatus::parse(&status)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown order status `{status}`")))?;

    Ok(Order {
        id: OrderId(id),
        user_id: UserId(user_id),
        user_name: row.try_get("user_name").map_err(decode_error)?,
        items,
        total: decode_amount("total", total)?,
        status,
        created_at: decode_timestamp("created_at", &created_at)?,
        updated_at: decode_timestamp("updated_at", &updated_at)?,
    })
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_ORDER} WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_order).transpose()
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{SELECT_ORDER} WHERE user_id = ? ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(&user_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_order).collect()
    }

    async fn save(&self, order: Order) -> Result<(), RepositoryError> {
        let items_json = serde_json::to_string(&order.items)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;

        sqlx::query(
            "INSERT INTO orders (id, user_id, user_name, items_json, total, status,
                                 created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 items_json = excluded.items_json,
                 total = excluded.total,
                 status = excluded.status,
                 updated_at = excluded.updated_at",
        )
        .bind(&order.id.0)
        .bind(&order.user_id.0)
        .bind(&order.user_name)
        .bind(&items_json)
        .bind(encode_amount("total", order.total)?)
        .bind(order.status.as_str())
        .bind(encode_timestamp(&order.created_at))
        .bind(encode_timestamp(&order.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
