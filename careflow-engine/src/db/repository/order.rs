//! Clinical Order Repository
//!
//! Read-only from the engine's point of view: orders are created and
//! advanced by the prescribing/lab surfaces, never mutated here.

use super::RepoResult;
use shared::models::ClinicalOrder;
use sqlx::SqlitePool;

const ORDER_SELECT: &str = "SELECT id, patient_id, order_type, status, created_at, updated_at FROM clinical_order";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<ClinicalOrder>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, ClinicalOrder>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Pending orders with no encounter yet (the discovery source set)
pub async fn list_pending_without_encounter(pool: &SqlitePool) -> RepoResult<Vec<ClinicalOrder>> {
    let rows = sqlx::query_as::<_, ClinicalOrder>(
        "SELECT o.id, o.patient_id, o.order_type, o.status, o.created_at, o.updated_at FROM clinical_order o LEFT JOIN encounter e ON e.order_id = o.id WHERE o.status = 'pending' AND e.id IS NULL ORDER BY o.created_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Line-item names for the keyword classifier
pub async fn item_names(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT name FROM order_item WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(names)
}
