use chrono::{DateTime, Utc};
use sqlx::Row;

use liwa_core::domain::reservation::EvidenceId;

use super::{EvidenceRecord, EvidenceStore, StoreError};
use crate::DbPool;

pub struct SqlEvidenceStore {
    pool: DbPool,
}

impl SqlEvidenceStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EvidenceStore for SqlEvidenceStore {
    async fn save(&self, record: EvidenceRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO payment_evidence (id, file_name, byte_len, data, uploaded_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                file_name = excluded.file_name,
                byte_len = excluded.byte_len,
                data = excluded.data,
                uploaded_at = excluded.uploaded_at",
        )
        .bind(&record.id.0)
        .bind(&record.file_name)
        .bind(record.data.len() as i64)
        .bind(&record.data)
        .bind(record.uploaded_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &EvidenceId) -> Result<Option<EvidenceRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, file_name, data, uploaded_at FROM payment_evidence WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let uploaded_raw = row.try_get::<String, _>("uploaded_at")?;
            let uploaded_at = DateTime::parse_from_rfc3339(&uploaded_raw)
                .map(|timestamp| timestamp.with_timezone(&Utc))
                .map_err(|error| {
                    StoreError::Decode(format!(
                        "invalid timestamp in `uploaded_at`: `{uploaded_raw}` ({error})"
                    ))
                })?;

            Ok(EvidenceRecord {
                id: EvidenceId(row.try_get("id")?),
                file_name: row.try_get("file_name")?,
                data: row.try_get("data")?,
                uploaded_at,
            })
        })
        .transpose()
    }
}
