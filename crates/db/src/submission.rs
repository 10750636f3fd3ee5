use chrono::{DateTime, Utc};

use liwa_core::domain::reservation::{EvidenceId, Reservation};
use liwa_core::wizard::PreparedSubmission;

use crate::repositories::{EvidenceRecord, EvidenceStore, ReservationStore, StoreError};

/// Persists an assembled booking submission. When the payment method
/// carries a proof-of-payment image, the image is saved first and the
/// reservation is created pointing at the stored record's id, so a
/// persisted reservation never references evidence that was not written.
pub async fn persist_submission<R, E>(
    reservations: &R,
    evidence_store: &E,
    submission: PreparedSubmission,
    now: DateTime<Utc>,
) -> Result<Reservation, StoreError>
where
    R: ReservationStore,
    E: EvidenceStore,
{
    let mut reservation = submission.reservation;

    if let Some(file) = submission.evidence {
        let id = EvidenceId::generate();
        evidence_store
            .save(EvidenceRecord {
                id: id.clone(),
                file_name: file.file_name,
                data: file.data,
                uploaded_at: now,
            })
            .await?;
        reservation.evidence = Some(id);
    }

    reservations.create(reservation.clone()).await?;
    Ok(reservation)
}
