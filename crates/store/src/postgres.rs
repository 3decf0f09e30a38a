//! PostgreSQL-backed store implementation.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, PaymentId, StoreId, TransactionId, UserId};
use domain::{
    AuditStamp, BasketLine, DiscountRate, Money, Order, OrderLine, OrderStatus, Payment,
    PaymentStatus, User,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{BasketStore, MarketStore},
};

/// PostgreSQL store. One transaction per save; order rows are locked with
/// `SELECT ... FOR UPDATE` so concurrent steps on the same order serialize
/// at the database.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the schema if it does not exist.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::raw_sql(include_str!("schema.sql"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_order(row: &PgRow, lines: Vec<OrderLine>) -> Result<Order> {
        let status = OrderStatus::from_str(row.try_get::<String, _>("status")?.as_str())
            .map_err(StoreError::Decode)?;
        let discount_rate = DiscountRate::new(row.try_get::<i16, _>("discount_rate")? as u8)
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        let audit = AuditStamp {
            created_by: UserId::from_uuid(row.try_get::<Uuid, _>("created_by")?),
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_by: UserId::from_uuid(row.try_get::<Uuid, _>("updated_by")?),
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        };

        Ok(Order::restore(
            OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            StoreId::from_uuid(row.try_get::<Uuid, _>("store_id")?),
            row.try_get::<DateTime<Utc>, _>("ordered_at")?,
            lines,
            status,
            discount_rate,
            Money::from_cents(row.try_get::<i64, _>("discount_amount_cents")?),
            Money::from_cents(row.try_get::<i64, _>("total_pay_cents")?),
            row.try_get::<Option<String>, _>("transaction_id")?
                .map(TransactionId::new),
            row.try_get::<i64, _>("version")? as u64,
            audit,
        ))
    }

    fn row_to_payment(row: &PgRow) -> Result<Payment> {
        let status = PaymentStatus::from_str(row.try_get::<String, _>("status")?.as_str())
            .map_err(StoreError::Decode)?;

        Ok(Payment::restore(
            PaymentId::from_uuid(row.try_get::<Uuid, _>("id")?),
            OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            TransactionId::new(row.try_get::<String, _>("transaction_id")?),
            row.try_get("item_name")?,
            status,
            Money::from_cents(row.try_get::<i64, _>("pay_amount_cents")?),
            row.try_get::<Option<i64>, _>("refund_amount_cents")?
                .map(Money::from_cents),
            row.try_get::<DateTime<Utc>, _>("approved_at")?,
            row.try_get::<Option<DateTime<Utc>>, _>("canceled_at")?,
        ))
    }

    fn row_to_line(row: &PgRow) -> Result<OrderLine> {
        Ok(OrderLine::new(
            row.try_get::<String, _>("product_id")?,
            row.try_get::<String, _>("product_name")?,
            row.try_get::<i32, _>("quantity")? as u32,
            Money::from_cents(row.try_get::<i64, _>("unit_price_cents")?),
        ))
    }

    async fn load_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let rows = sqlx::query(
            "SELECT product_id, product_name, quantity, unit_price_cents
             FROM order_lines WHERE order_id = $1 ORDER BY position",
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_line).collect()
    }
}

#[async_trait]
impl MarketStore for PostgresStore {
    async fn load_user(&self, id: UserId) -> Result<User> {
        let row = sqlx::query("SELECT id, name FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::UserNotFound(id))?;

        Ok(User::new(
            UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
            row.try_get::<String, _>("name")?,
        ))
    }

    async fn save_user(&self, user: User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, name) VALUES ($1, $2)
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name",
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_order(&self, id: OrderId) -> Result<Order> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::OrderNotFound(id))?;

        let lines = self.load_lines(id).await?;
        Self::row_to_order(&row, lines)
    }

    async fn save_order(&self, order: &Order) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let current: Option<i64> =
            sqlx::query_scalar("SELECT version FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order.id().as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

        let actual = current.unwrap_or(0) as u64;
        if actual != order.version() {
            return Err(StoreError::VersionConflict {
                order_id: order.id(),
                expected: order.version(),
                actual,
            });
        }
        let new_version = actual + 1;

        if current.is_none() {
            sqlx::query(
                "INSERT INTO orders (id, user_id, store_id, ordered_at, status,
                     discount_rate, discount_amount_cents, total_pay_cents,
                     transaction_id, version, created_by, created_at, updated_by, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
            )
            .bind(order.id().as_uuid())
            .bind(order.user_id().as_uuid())
            .bind(order.store_id().as_uuid())
            .bind(order.ordered_at())
            .bind(order.status().as_str())
            .bind(order.discount_rate().rate() as i16)
            .bind(order.discount_amount().cents())
            .bind(order.total_pay().cents())
            .bind(order.transaction_id().map(|t| t.as_str()))
            .bind(new_version as i64)
            .bind(order.audit().created_by.as_uuid())
            .bind(order.audit().created_at)
            .bind(order.audit().updated_by.as_uuid())
            .bind(order.audit().updated_at)
            .execute(&mut *tx)
            .await?;

            for (position, line) in order.lines().iter().enumerate() {
                sqlx::query(
                    "INSERT INTO order_lines
                         (order_id, position, product_id, product_name, quantity, unit_price_cents)
                     VALUES ($1, $2, $3, $4, $5, $6)",
                )
                .bind(order.id().as_uuid())
                .bind(position as i32)
                .bind(line.product_id.as_str())
                .bind(&line.product_name)
                .bind(line.quantity as i32)
                .bind(line.unit_price.cents())
                .execute(&mut *tx)
                .await?;
            }
        } else {
            // Lines are immutable; only status, payment linkage, and audit move.
            sqlx::query(
                "UPDATE orders SET status = $2, transaction_id = $3, version = $4,
                     updated_by = $5, updated_at = $6
                 WHERE id = $1",
            )
            .bind(order.id().as_uuid())
            .bind(order.status().as_str())
            .bind(order.transaction_id().map(|t| t.as_str()))
            .bind(new_version as i64)
            .bind(order.audit().updated_by.as_uuid())
            .bind(order.audit().updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(new_version)
    }

    async fn load_order_by_transaction_id(&self, transaction_id: &TransactionId) -> Result<Order> {
        let rows = sqlx::query("SELECT * FROM orders WHERE transaction_id = $1")
            .bind(transaction_id.as_str())
            .fetch_all(&self.pool)
            .await?;

        match rows.len() {
            0 => Err(StoreError::NoOrderForTransaction(transaction_id.clone())),
            1 => {
                let id = OrderId::from_uuid(rows[0].try_get::<Uuid, _>("id")?);
                let lines = self.load_lines(id).await?;
                Self::row_to_order(&rows[0], lines)
            }
            n => Err(StoreError::AmbiguousTransaction {
                transaction_id: transaction_id.clone(),
                matches: n,
            }),
        }
    }

    async fn load_payment_for_order(&self, order_id: OrderId) -> Result<Payment> {
        let row = sqlx::query("SELECT * FROM payments WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::PaymentNotFoundForOrder(order_id))?;

        Self::row_to_payment(&row)
    }

    async fn load_payment(&self, id: PaymentId) -> Result<Payment> {
        let row = sqlx::query("SELECT * FROM payments WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::PaymentNotFound(id))?;

        Self::row_to_payment(&row)
    }

    async fn save_payment(&self, payment: &Payment) -> Result<()> {
        sqlx::query(
            "INSERT INTO payments (id, order_id, transaction_id, item_name, status,
                 pay_amount_cents, refund_amount_cents, approved_at, canceled_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (id) DO UPDATE SET
                 status = EXCLUDED.status,
                 refund_amount_cents = EXCLUDED.refund_amount_cents,
                 canceled_at = EXCLUDED.canceled_at",
        )
        .bind(payment.id().as_uuid())
        .bind(payment.order_id().as_uuid())
        .bind(payment.transaction_id().as_str())
        .bind(payment.item_name())
        .bind(payment.status().as_str())
        .bind(payment.pay_amount().cents())
        .bind(payment.refund_amount().map(|m| m.cents()))
        .bind(payment.approved_at())
        .bind(payment.canceled_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_payment_per_order")
            {
                return StoreError::PaymentAlreadyExists(payment.order_id());
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn list_payments_for_user(&self, user_id: UserId) -> Result<Vec<Payment>> {
        let rows = sqlx::query(
            "SELECT p.* FROM payments p
             JOIN orders o ON o.id = p.order_id
             WHERE o.user_id = $1
             ORDER BY p.approved_at DESC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_payment).collect()
    }
}

#[async_trait]
impl BasketStore for PostgresStore {
    async fn add_basket_line(&self, user_id: UserId, line: BasketLine) -> Result<()> {
        sqlx::query(
            "INSERT INTO basket_lines
                 (user_id, store_id, product_id, product_name, quantity, unit_price_cents)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user_id.as_uuid())
        .bind(line.store_id.as_uuid())
        .bind(line.line.product_id.as_str())
        .bind(&line.line.product_name)
        .bind(line.line.quantity as i32)
        .bind(line.line.unit_price.cents())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn take_basket(&self, user_id: UserId) -> Result<Vec<BasketLine>> {
        let rows = sqlx::query(
            "WITH removed AS (
                 DELETE FROM basket_lines WHERE user_id = $1
                 RETURNING position, store_id, product_id, product_name, quantity, unit_price_cents
             )
             SELECT * FROM removed ORDER BY position",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(BasketLine::new(
                    StoreId::from_uuid(row.try_get::<Uuid, _>("store_id")?),
                    Self::row_to_line(row)?,
                ))
            })
            .collect()
    }
}
