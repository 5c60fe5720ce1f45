//! Postgres store.
//!
//! Each aggregate lands whole as a JSONB document; side columns exist for
//! uniqueness constraints and filters only. Compare-and-swap updates guard
//! on the `version` column and report zero affected rows as a
//! [`StoreError::VersionConflict`]. Composite commits run inside a single
//! database transaction.

use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::Row;

use laceup_core::{Email, OrderId, ShoeId, UserId};

use crate::config::ApiConfig;
use crate::models::{AuthSession, Cart, Order, Shoe, User};

use super::{from_doc, to_doc, OrderFilter, Store, StoreError, StoreResult};

/// Open a connection pool against the configured database and run pending
/// migrations.
///
/// # Errors
///
/// Returns an error when the database is unreachable or a migration fails.
pub async fn create_pool(config: &ApiConfig) -> StoreResult<PgPool> {
    use secrecy::ExposeSecret;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(config.database_url.expose_secret())
        .await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| StoreError::Corrupt(format!("migration failed: {e}")))?;
    Ok(pool)
}

/// Postgres-backed aggregate store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an already-connected pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn encode_version(version: u64) -> i64 {
    i64::try_from(version).unwrap_or(i64::MAX)
}

/// Serialize an aggregate with its bumped version written into the document,
/// keeping the JSONB copy in step with the `version` column.
fn doc_at<T: serde::Serialize>(value: &T, version: u64) -> StoreResult<serde_json::Value> {
    let mut doc = to_doc(value)?;
    doc["version"] = serde_json::Value::from(version);
    Ok(doc)
}

fn map_insert_err(err: sqlx::Error, entity: &'static str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::AlreadyExists { entity }
        }
        _ => StoreError::Database(err),
    }
}

async fn cas_update_shoe(conn: &mut PgConnection, shoe: &Shoe) -> StoreResult<()> {
    let next = shoe.version + 1;
    let result = sqlx::query(
        "UPDATE shoes SET brand = $2, model = $3, doc = $4, version = $5 \
         WHERE id = $1 AND version = $6",
    )
    .bind(shoe.id.as_uuid())
    .bind(&shoe.brand)
    .bind(&shoe.model)
    .bind(doc_at(shoe, next)?)
    .bind(encode_version(next))
    .bind(encode_version(shoe.version))
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::VersionConflict { entity: "shoe" });
    }
    Ok(())
}

/// Write a cart: version 0 inserts (the `user_id` unique constraint enforces
/// one cart per user), anything else is a compare-and-swap update.
async fn upsert_cart(conn: &mut PgConnection, cart: &Cart) -> StoreResult<()> {
    let next = cart.version + 1;
    if cart.version == 0 {
        sqlx::query("INSERT INTO carts (id, user_id, doc, version) VALUES ($1, $2, $3, $4)")
            .bind(cart.id.as_uuid())
            .bind(cart.user_id.as_uuid())
            .bind(doc_at(cart, next)?)
            .bind(encode_version(next))
            .execute(conn)
            .await
            .map_err(|e| map_insert_err(e, "cart"))?;
        return Ok(());
    }
    let result = sqlx::query("UPDATE carts SET doc = $2, version = $3 WHERE id = $1 AND version = $4")
        .bind(cart.id.as_uuid())
        .bind(doc_at(cart, next)?)
        .bind(encode_version(next))
        .bind(encode_version(cart.version))
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::VersionConflict { entity: "cart" });
    }
    Ok(())
}

async fn insert_order_row(conn: &mut PgConnection, order: &Order) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, user_id, status, doc, version, created_at) \
         VALUES ($1, $2, $3, $4, 1, $5)",
    )
    .bind(order.id.as_uuid())
    .bind(order.user_id.as_uuid())
    .bind(order.status.to_string())
    .bind(doc_at(order, 1)?)
    .bind(order.created_at)
    .execute(conn)
    .await
    .map_err(|e| map_insert_err(e, "order"))?;
    Ok(())
}

async fn cas_update_order(conn: &mut PgConnection, order: &Order) -> StoreResult<()> {
    let next = order.version + 1;
    let result = sqlx::query(
        "UPDATE orders SET status = $2, doc = $3, version = $4 \
         WHERE id = $1 AND version = $5",
    )
    .bind(order.id.as_uuid())
    .bind(order.status.to_string())
    .bind(doc_at(order, next)?)
    .bind(encode_version(next))
    .bind(encode_version(order.version))
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::VersionConflict { entity: "order" });
    }
    Ok(())
}

fn row_doc<T: serde::de::DeserializeOwned>(row: &sqlx::postgres::PgRow) -> StoreResult<T> {
    let doc: serde_json::Value = row.try_get("doc")?;
    from_doc(doc)
}

#[async_trait]
impl Store for PgStore {
    async fn insert_shoe(&self, shoe: &Shoe) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO shoes (id, brand, model, doc, version, created_at) \
             VALUES ($1, $2, $3, $4, 1, $5)",
        )
        .bind(shoe.id.as_uuid())
        .bind(&shoe.brand)
        .bind(&shoe.model)
        .bind(doc_at(shoe, 1)?)
        .bind(shoe.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "shoe"))?;
        Ok(())
    }

    async fn shoe(&self, id: ShoeId) -> StoreResult<Option<Shoe>> {
        let row = sqlx::query("SELECT doc FROM shoes WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_doc).transpose()
    }

    async fn shoes(&self) -> StoreResult<Vec<Shoe>> {
        let rows = sqlx::query("SELECT doc FROM shoes ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_doc).collect()
    }

    async fn shoe_by_brand_model(&self, brand: &str, model: &str) -> StoreResult<Option<Shoe>> {
        let row =
            sqlx::query("SELECT doc FROM shoes WHERE lower(brand) = lower($1) AND lower(model) = lower($2)")
                .bind(brand)
                .bind(model)
                .fetch_optional(&self.pool)
                .await?;
        row.as_ref().map(row_doc).transpose()
    }

    async fn update_shoe(&self, shoe: &Shoe) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        cas_update_shoe(&mut *conn, shoe).await
    }

    async fn delete_shoe(&self, id: ShoeId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM shoes WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn cart_for_user(&self, user_id: UserId) -> StoreResult<Option<Cart>> {
        let row = sqlx::query("SELECT doc FROM carts WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_doc).transpose()
    }

    async fn write_cart(&self, cart: &Cart) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_cart(&mut *conn, cart).await
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query("SELECT doc FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_doc).transpose()
    }

    async fn orders(&self, filter: OrderFilter) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT doc FROM orders \
             WHERE ($1::uuid IS NULL OR user_id = $1) \
               AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC",
        )
        .bind(filter.user_id.map(|u| u.as_uuid()))
        .bind(filter.status.map(|s| s.to_string()))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_doc).collect()
    }

    async fn update_order(&self, order: &Order) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        cas_update_order(&mut *conn, order).await
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query("INSERT INTO users (id, email, doc) VALUES ($1, $2, $3)")
            .bind(user.id.as_uuid())
            .bind(user.email.as_ref())
            .bind(to_doc(user)?)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_err(e, "user"))?;
        Ok(())
    }

    async fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT doc FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_doc).transpose()
    }

    async fn user_by_email(&self, email: &Email) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT doc FROM users WHERE email = $1")
            .bind(email.as_ref())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_doc).transpose()
    }

    async fn users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query("SELECT doc FROM users ORDER BY email")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_doc).collect()
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query("UPDATE users SET email = $2, doc = $3 WHERE id = $1")
            .bind(user.id.as_uuid())
            .bind(user.email.as_ref())
            .bind(to_doc(user)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_session(&self, session: &AuthSession) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO auth_sessions (token, user_id, expires_at, doc) VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.token)
        .bind(session.user_id.as_uuid())
        .bind(session.expires_at)
        .bind(to_doc(session)?)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "session"))?;
        Ok(())
    }

    async fn session_by_token(&self, token: &str) -> StoreResult<Option<AuthSession>> {
        let row = sqlx::query("SELECT doc FROM auth_sessions WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_doc).transpose()
    }

    async fn delete_session(&self, token: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit_cart_mutation(&self, shoe: &Shoe, cart: &Cart) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        cas_update_shoe(&mut *tx, shoe).await?;
        upsert_cart(&mut *tx, cart).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn commit_checkout(&self, cart: &Cart, order: &Order) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        upsert_cart(&mut *tx, cart).await?;
        insert_order_row(&mut *tx, order).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn commit_order_creation(&self, shoes: &[Shoe], order: &Order) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for shoe in shoes {
            cas_update_shoe(&mut *tx, shoe).await?;
        }
        insert_order_row(&mut *tx, order).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn commit_order_update(&self, shoes: &[Shoe], order: &Order) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for shoe in shoes {
            cas_update_shoe(&mut *tx, shoe).await?;
        }
        cas_update_order(&mut *tx, order).await?;
        tx.commit().await?;
        Ok(())
    }
}
