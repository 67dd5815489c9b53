// [libs/infra/db/src/repositories/customer.rs]
/*!
 * APARATO: CUSTOMER & FAMILY REPOSITORY (ESTRATO L3)
 * Customers are retired, never hard-deleted. Every mutation pairs with
 * an `*_edit_logs` row written in the same transaction.
 */

use chrono::Utc;
use coldstore_domain_models::{Customer, FamilyMember};
use serde_json::json;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    phone: String,
    display_name: String,
    father_name: Option<String>,
    village: Option<String>,
    created_at: chrono::DateTime<Utc>,
    retired_at: Option<chrono::DateTime<Utc>>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            phone: row.phone,
            display_name: row.display_name,
            father_name: row.father_name,
            village: row.village,
            created_at: row.created_at,
            retired_at: row.retired_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FamilyMemberRow {
    id: Uuid,
    customer_id: Uuid,
    phone: String,
    display_name: String,
    created_at: chrono::DateTime<Utc>,
}

impl From<FamilyMemberRow> for FamilyMember {
    fn from(row: FamilyMemberRow) -> Self {
        FamilyMember {
            id: row.id,
            customer_id: row.customer_id,
            phone: row.phone,
            display_name: row.display_name,
            created_at: row.created_at,
        }
    }
}

pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, phone: &str, display_name: &str, father_name: Option<&str>, village: Option<&str>, actor_id: Uuid) -> Result<Customer, DbError> {
        let mut tx = self.pool.begin().await?;

        let row: CustomerRow = sqlx::query_as(
            "INSERT INTO customers (phone, display_name, father_name, village)
             VALUES ($1, $2, $3, $4)
             RETURNING id, phone, display_name, father_name, village, created_at, retired_at",
        )
        .bind(phone)
        .bind(display_name)
        .bind(father_name)
        .bind(village)
        .fetch_one(&mut *tx)
        .await?;

        let customer: Customer = row.into();

        sqlx::query(
            "INSERT INTO customer_edit_logs (row_id, actor_id, old_value, new_value) VALUES ($1, $2, NULL, $3)",
        )
        .bind(customer.id)
        .bind(actor_id)
        .bind(json!(&customer))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(customer)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Customer, DbError> {
        let row: CustomerRow = sqlx::query_as(
            "SELECT id, phone, display_name, father_name, village, created_at, retired_at FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    #[instrument(skip(self))]
    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<Customer>, DbError> {
        let row: Option<CustomerRow> = sqlx::query_as(
            "SELECT id, phone, display_name, father_name, village, created_at, retired_at FROM customers WHERE phone = $1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Soft-delete. The row stays queryable by id for historical entries
    /// and ledger rows that still reference it.
    #[instrument(skip(self))]
    pub async fn retire(&self, id: Uuid, actor_id: Uuid) -> Result<Customer, DbError> {
        let mut tx = self.pool.begin().await?;

        let before: CustomerRow = sqlx::query_as(
            "SELECT id, phone, display_name, father_name, village, created_at, retired_at FROM customers WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        let before: Customer = before.into();

        let after: CustomerRow = sqlx::query_as(
            "UPDATE customers SET retired_at = now() WHERE id = $1
             RETURNING id, phone, display_name, father_name, village, created_at, retired_at",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        let after: Customer = after.into();

        sqlx::query(
            "INSERT INTO customer_edit_logs (row_id, actor_id, old_value, new_value) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(actor_id)
        .bind(json!(&before))
        .bind(json!(&after))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(after)
    }

    #[instrument(skip(self))]
    pub async fn add_family_member(&self, customer_id: Uuid, phone: &str, display_name: &str) -> Result<FamilyMember, DbError> {
        let row: FamilyMemberRow = sqlx::query_as(
            "INSERT INTO family_members (customer_id, phone, display_name) VALUES ($1, $2, $3)
             RETURNING id, customer_id, phone, display_name, created_at",
        )
        .bind(customer_id)
        .bind(phone)
        .bind(display_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    #[instrument(skip(self))]
    pub async fn list_family_members(&self, customer_id: Uuid) -> Result<Vec<FamilyMember>, DbError> {
        let rows: Vec<FamilyMemberRow> = sqlx::query_as(
            "SELECT id, customer_id, phone, display_name, created_at FROM family_members WHERE customer_id = $1 ORDER BY created_at",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
