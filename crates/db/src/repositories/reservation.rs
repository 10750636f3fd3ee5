use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use liwa_core::catalog::{AddOn, RoomCategory};
use liwa_core::domain::reservation::{
    EvidenceId, GuestIdentity, PaymentMethod, ReferenceCode, Reservation, ReservationId,
    ReservationStatus,
};

use super::{ReservationChanges, ReservationFilter, ReservationStore, StoreError};
use crate::DbPool;

pub struct SqlReservationStore {
    pool: DbPool,
}

impl SqlReservationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_required(&self, reference: &ReferenceCode) -> Result<Reservation, StoreError> {
        self.find_by_reference(reference).await?.ok_or_else(|| StoreError::NotFound {
            reference: reference.0.clone(),
        })
    }

    /// A conditional write touched zero rows; report why.
    async fn classify_missed_write(&self, reference: &ReferenceCode) -> StoreError {
        match self.find_by_reference(reference).await {
            Ok(Some(_)) => StoreError::VersionConflict { reference: reference.0.clone() },
            Ok(None) => StoreError::NotFound { reference: reference.0.clone() },
            Err(error) => error,
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT
        id,
        reference,
        first_name,
        last_name,
        email,
        phone,
        room,
        check_in,
        check_out,
        adults,
        children,
        add_ons,
        total_amount,
        status,
        payment_method,
        evidence_id,
        version,
        created_at
     FROM reservation";

#[async_trait::async_trait]
impl ReservationStore for SqlReservationStore {
    async fn create(&self, reservation: Reservation) -> Result<(), StoreError> {
        let add_ons = encode_add_ons(&reservation.add_ons)?;

        let result = sqlx::query(
            "INSERT INTO reservation (
                id,
                reference,
                first_name,
                last_name,
                email,
                phone,
                room,
                check_in,
                check_out,
                adults,
                children,
                add_ons,
                total_amount,
                status,
                payment_method,
                evidence_id,
                version,
                created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&reservation.id.0)
        .bind(&reservation.reference.0)
        .bind(&reservation.guest.first_name)
        .bind(&reservation.guest.last_name)
        .bind(&reservation.guest.email)
        .bind(&reservation.guest.phone)
        .bind(reservation.room.id())
        .bind(encode_date(reservation.check_in))
        .bind(encode_date(reservation.check_out))
        .bind(i64::from(reservation.adults))
        .bind(i64::from(reservation.children))
        .bind(add_ons)
        .bind(reservation.total_amount)
        .bind(reservation.status.as_str())
        .bind(reservation.payment_method.as_str())
        .bind(reservation.evidence.as_ref().map(|id| id.0.as_str()))
        .bind(i64::from(reservation.version))
        .bind(reservation.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_error)) if db_error.is_unique_violation() => {
                Err(StoreError::DuplicateReference { reference: reservation.reference.0 })
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn find_by_reference(
        &self,
        reference: &ReferenceCode,
    ) -> Result<Option<Reservation>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE reference = ?"))
            .bind(&reference.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(reservation_from_row).transpose()
    }

    async fn list(&self, filter: ReservationFilter) -> Result<Vec<Reservation>, StoreError> {
        let mut sql = format!("{SELECT_COLUMNS} WHERE 1 = 1");
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.check_in_from.is_some() {
            sql.push_str(" AND check_in >= ?");
        }
        if filter.check_in_to.is_some() {
            sql.push_str(" AND check_in <= ?");
        }
        if filter.search.is_some() {
            sql.push_str(
                " AND (reference LIKE ? OR first_name LIKE ? OR last_name LIKE ? OR email LIKE ?)",
            );
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str().to_string());
        }
        if let Some(from) = filter.check_in_from {
            query = query.bind(encode_date(from));
        }
        if let Some(to) = filter.check_in_to {
            query = query.bind(encode_date(to));
        }
        if let Some(search) = filter.search {
            let pattern = format!("%{search}%");
            query = query
                .bind(pattern.clone())
                .bind(pattern.clone())
                .bind(pattern.clone())
                .bind(pattern);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(reservation_from_row).collect()
    }

    async fn update_fields(
        &self,
        reference: &ReferenceCode,
        changes: ReservationChanges,
        expected_version: u32,
    ) -> Result<Reservation, StoreError> {
        let add_ons = encode_add_ons(&changes.add_ons)?;

        let result = sqlx::query(
            "UPDATE reservation SET
                room = ?,
                check_in = ?,
                check_out = ?,
                adults = ?,
                children = ?,
                phone = ?,
                add_ons = ?,
                total_amount = ?,
                version = version + 1
             WHERE reference = ? AND version = ?",
        )
        .bind(changes.room.id())
        .bind(encode_date(changes.check_in))
        .bind(encode_date(changes.check_out))
        .bind(i64::from(changes.adults))
        .bind(i64::from(changes.children))
        .bind(&changes.phone)
        .bind(add_ons)
        .bind(changes.total_amount)
        .bind(&reference.0)
        .bind(i64::from(expected_version))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.classify_missed_write(reference).await);
        }

        self.fetch_required(reference).await
    }

    async fn update_status(
        &self,
        reference: &ReferenceCode,
        status: ReservationStatus,
        expected_version: u32,
    ) -> Result<Reservation, StoreError> {
        let result = sqlx::query(
            "UPDATE reservation SET
                status = ?,
                version = version + 1
             WHERE reference = ? AND version = ?",
        )
        .bind(status.as_str())
        .bind(&reference.0)
        .bind(i64::from(expected_version))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.classify_missed_write(reference).await);
        }

        self.fetch_required(reference).await
    }
}

fn reservation_from_row(row: SqliteRow) -> Result<Reservation, StoreError> {
    let room_raw = row.try_get::<String, _>("room")?;
    let room = RoomCategory::parse(&room_raw)
        .ok_or_else(|| StoreError::Decode(format!("unknown room category `{room_raw}`")))?;

    let status_raw = row.try_get::<String, _>("status")?;
    let status = ReservationStatus::parse(&status_raw)
        .ok_or_else(|| StoreError::Decode(format!("unknown reservation status `{status_raw}`")))?;

    let payment_raw = row.try_get::<String, _>("payment_method")?;
    let payment_method = PaymentMethod::parse(&payment_raw)
        .ok_or_else(|| StoreError::Decode(format!("unknown payment method `{payment_raw}`")))?;

    Ok(Reservation {
        id: ReservationId(row.try_get("id")?),
        reference: ReferenceCode(row.try_get("reference")?),
        guest: GuestIdentity {
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
        },
        room,
        check_in: parse_date("check_in", row.try_get("check_in")?)?,
        check_out: parse_date("check_out", row.try_get("check_out")?)?,
        adults: parse_u32("adults", row.try_get("adults")?)?,
        children: parse_u32("children", row.try_get("children")?)?,
        add_ons: decode_add_ons(&row.try_get::<String, _>("add_ons")?)?,
        total_amount: row.try_get("total_amount")?,
        status,
        payment_method,
        evidence: row.try_get::<Option<String>, _>("evidence_id")?.map(EvidenceId),
        version: parse_u32("version", row.try_get("version")?)?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}

fn encode_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn encode_add_ons(add_ons: &[AddOn]) -> Result<String, StoreError> {
    let codes: Vec<&str> = add_ons.iter().map(AddOn::code).collect();
    serde_json::to_string(&codes)
        .map_err(|error| StoreError::Decode(format!("could not encode add_ons: {error}")))
}

fn decode_add_ons(raw: &str) -> Result<Vec<AddOn>, StoreError> {
    let codes: Vec<String> = serde_json::from_str(raw)
        .map_err(|error| StoreError::Decode(format!("invalid add_ons payload `{raw}`: {error}")))?;
    codes
        .iter()
        .map(|code| {
            AddOn::parse(code)
                .ok_or_else(|| StoreError::Decode(format!("unknown add-on code `{code}`")))
        })
        .collect()
}

fn parse_u32(column: &str, value: i64) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| {
        StoreError::Decode(format!(
            "invalid value for `{column}` (expected non-negative u32): {value}"
        ))
    })
}

fn parse_date(column: &str, value: String) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .map_err(|error| StoreError::Decode(format!("invalid date in `{column}`: `{value}` ({error})")))
}

fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| StoreError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})")),
    )
}
