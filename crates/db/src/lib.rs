pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod submission;

pub use connection::{connect, connect_from_config, connect_with_settings, DbPool};
pub use submission::persist_submission;
pub use repositories::{
    EvidenceRecord, EvidenceStore, InMemoryEvidenceStore, InMemoryReservationStore,
    ReservationChanges, ReservationFilter, ReservationStore, SqlEvidenceStore, SqlReservationStore,
    StoreError,
};
