use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use liwa_core::catalog::{AddOn, RoomCategory};
use liwa_core::domain::reservation::{
    EvidenceId, ReferenceCode, Reservation, ReservationStatus,
};

pub mod evidence;
pub mod memory;
pub mod reservation;

pub use evidence::SqlEvidenceStore;
pub use memory::{InMemoryEvidenceStore, InMemoryReservationStore};
pub use reservation::SqlReservationStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no reservation found for reference `{reference}`")]
    NotFound { reference: String },
    #[error("reservation `{reference}` was modified concurrently")]
    VersionConflict { reference: String },
    #[error("reference `{reference}` is already in use")]
    DuplicateReference { reference: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Full replacement values for the mutable stay fields, applied as a
/// single conditional write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservationChanges {
    pub room: RoomCategory,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: u32,
    pub children: u32,
    pub phone: String,
    pub add_ons: Vec<AddOn>,
    pub total_amount: i64,
}

#[derive(Clone, Debug, Default)]
pub struct ReservationFilter {
    pub status: Option<ReservationStatus>,
    /// Inclusive lower bound on the check-in date.
    pub check_in_from: Option<NaiveDate>,
    /// Inclusive upper bound on the check-in date.
    pub check_in_to: Option<NaiveDate>,
    /// Matches against reference code, guest name, and email.
    pub search: Option<String>,
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn create(&self, reservation: Reservation) -> Result<(), StoreError>;

    async fn find_by_reference(
        &self,
        reference: &ReferenceCode,
    ) -> Result<Option<Reservation>, StoreError>;

    async fn list(&self, filter: ReservationFilter) -> Result<Vec<Reservation>, StoreError>;

    /// Replaces the mutable stay fields and bumps the version, but only
    /// when the stored version still equals `expected_version`.
    async fn update_fields(
        &self,
        reference: &ReferenceCode,
        changes: ReservationChanges,
        expected_version: u32,
    ) -> Result<Reservation, StoreError>;

    /// Moves the reservation to a new status under the same version
    /// condition as [`ReservationStore::update_fields`].
    async fn update_status(
        &self,
        reference: &ReferenceCode,
        status: ReservationStatus,
        expected_version: u32,
    ) -> Result<Reservation, StoreError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvidenceRecord {
    pub id: EvidenceId,
    pub file_name: String,
    pub data: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
}

#[async_trait]
pub trait EvidenceStore: Send + Sync {
    async fn save(&self, record: EvidenceRecord) -> Result<(), StoreError>;
    async fn find_by_id(&self, id: &EvidenceId) -> Result<Option<EvidenceRecord>, StoreError>;
}
