use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use liwa_core::domain::reservation::{
    EvidenceId, ReferenceCode, Reservation, ReservationStatus,
};

use super::{
    EvidenceRecord, EvidenceStore, ReservationChanges, ReservationFilter, ReservationStore,
    StoreError,
};

/// Map-backed store for tests and local development. Mirrors the SQL
/// store's version semantics exactly.
#[derive(Clone, Default)]
pub struct InMemoryReservationStore {
    inner: Arc<RwLock<HashMap<String, Reservation>>>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Vec<Reservation> {
        self.inner.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn create(&self, reservation: Reservation) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        if guard.contains_key(&reservation.reference.0) {
            return Err(StoreError::DuplicateReference {
                reference: reservation.reference.0.clone(),
            });
        }
        guard.insert(reservation.reference.0.clone(), reservation);
        Ok(())
    }

    async fn find_by_reference(
        &self,
        reference: &ReferenceCode,
    ) -> Result<Option<Reservation>, StoreError> {
        Ok(self.inner.read().await.get(&reference.0).cloned())
    }

    async fn list(&self, filter: ReservationFilter) -> Result<Vec<Reservation>, StoreError> {
        let guard = self.inner.read().await;
        let needle = filter.search.map(|value| value.to_lowercase());

        let mut matches: Vec<Reservation> = guard
            .values()
            .filter(|reservation| {
                filter.status.map_or(true, |status| reservation.status == status)
            })
            .filter(|reservation| {
                filter.check_in_from.map_or(true, |from| reservation.check_in >= from)
                    && filter.check_in_to.map_or(true, |to| reservation.check_in <= to)
            })
            .filter(|reservation| {
                needle.as_deref().map_or(true, |needle| {
                    reservation.reference.0.to_lowercase().contains(needle)
                        || reservation.guest.first_name.to_lowercase().contains(needle)
                        || reservation.guest.last_name.to_lowercase().contains(needle)
                        || reservation.guest.email.to_lowercase().contains(needle)
                })
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }

    async fn update_fields(
        &self,
        reference: &ReferenceCode,
        changes: ReservationChanges,
        expected_version: u32,
    ) -> Result<Reservation, StoreError> {
        let mut guard = self.inner.write().await;
        let reservation = guard
            .get_mut(&reference.0)
            .ok_or_else(|| StoreError::NotFound { reference: reference.0.clone() })?;

        if reservation.version != expected_version {
            return Err(StoreError::VersionConflict { reference: reference.0.clone() });
        }

        reservation.room = changes.room;
        reservation.check_in = changes.check_in;
        reservation.check_out = changes.check_out;
        reservation.adults = changes.adults;
        reservation.children = changes.children;
        reservation.guest.phone = changes.phone;
        reservation.add_ons = changes.add_ons;
        reservation.total_amount = changes.total_amount;
        reservation.version += 1;

        Ok(reservation.clone())
    }

    async fn update_status(
        &self,
        reference: &ReferenceCode,
        status: ReservationStatus,
        expected_version: u32,
    ) -> Result<Reservation, StoreError> {
        let mut guard = self.inner.write().await;
        let reservation = guard
            .get_mut(&reference.0)
            .ok_or_else(|| StoreError::NotFound { reference: reference.0.clone() })?;

        if reservation.version != expected_version {
            return Err(StoreError::VersionConflict { reference: reference.0.clone() });
        }

        reservation.status = status;
        reservation.version += 1;
        Ok(reservation.clone())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryEvidenceStore {
    inner: Arc<RwLock<HashMap<String, EvidenceRecord>>>,
}

impl InMemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EvidenceStore for InMemoryEvidenceStore {
    async fn save(&self, record: EvidenceRecord) -> Result<(), StoreError> {
        self.inner.write().await.insert(record.id.0.clone(), record);
        Ok(())
    }

    async fn find_by_id(&self, id: &EvidenceId) -> Result<Option<EvidenceRecord>, StoreError> {
        Ok(self.inner.read().await.get(&id.0).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use liwa_core::catalog::{AddOn, RoomCategory};
    use liwa_core::domain::reservation::{
        GuestIdentity, PaymentMethod, ReferenceCode, Reservation, ReservationId, ReservationStatus,
    };

    use super::InMemoryReservationStore;
    use crate::repositories::{
        ReservationChanges, ReservationFilter, ReservationStore, StoreError,
    };

    fn sample(reference: &str) -> Reservation {
        Reservation {
            id: ReservationId(format!("id-{reference}")),
            reference: ReferenceCode(reference.to_string()),
            guest: GuestIdentity {
                first_name: "Ana".to_string(),
                last_name: "Reyes".to_string(),
                email: "ana@example.com".to_string(),
                phone: "0917 555 0155".to_string(),
            },
            room: RoomCategory::CoupleTepee,
            check_in: NaiveDate::from_ymd_opt(2025, 6, 6).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2025, 6, 7).unwrap(),
            adults: 2,
            children: 0,
            add_ons: vec![],
            total_amount: 2_999,
            status: ReservationStatus::Pending,
            payment_method: PaymentMethod::Gcash,
            evidence: None,
            version: 0,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn version_conflicts_match_the_sql_store() {
        let store = InMemoryReservationStore::new();
        let reservation = sample("REF100000010");
        store.create(reservation.clone()).await.expect("create");

        let changes = ReservationChanges {
            room: RoomCategory::StandardTepee,
            check_in: reservation.check_in,
            check_out: reservation.check_out,
            adults: 3,
            children: 1,
            phone: reservation.guest.phone.clone(),
            add_ons: vec![AddOn::PetFee],
            total_amount: 5_499,
        };

        let updated = store
            .update_fields(&reservation.reference, changes.clone(), 0)
            .await
            .expect("first update");
        assert_eq!(updated.version, 1);

        let error = store
            .update_fields(&reservation.reference, changes, 0)
            .await
            .expect_err("stale update");
        assert!(matches!(error, StoreError::VersionConflict { .. }));
    }

    #[tokio::test]
    async fn list_filters_by_check_in_date_range() {
        let store = InMemoryReservationStore::new();

        let june = sample("REF100000012");
        store.create(june.clone()).await.expect("create june stay");

        let mut august = sample("REF100000013");
        august.check_in = NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();
        august.check_out = NaiveDate::from_ymd_opt(2025, 8, 16).unwrap();
        store.create(august.clone()).await.expect("create august stay");

        let bounded = store
            .list(ReservationFilter {
                check_in_from: Some(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()),
                check_in_to: Some(NaiveDate::from_ymd_opt(2025, 8, 31).unwrap()),
                ..ReservationFilter::default()
            })
            .await
            .expect("list by date range");
        assert_eq!(bounded, vec![august.clone()]);

        // Inclusive on both ends.
        let exact = store
            .list(ReservationFilter {
                check_in_from: Some(august.check_in),
                check_in_to: Some(august.check_in),
                ..ReservationFilter::default()
            })
            .await
            .expect("list by exact date");
        assert_eq!(exact, vec![august]);

        let excluded = store
            .list(ReservationFilter {
                check_in_to: Some(NaiveDate::from_ymd_opt(2025, 5, 31).unwrap()),
                ..ReservationFilter::default()
            })
            .await
            .expect("list before the range");
        assert!(excluded.is_empty());
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let store = InMemoryReservationStore::new();
        store.create(sample("REF100000011")).await.expect("create");
        let error = store.create(sample("REF100000011")).await.expect_err("duplicate");
        assert!(matches!(error, StoreError::DuplicateReference { .. }));
    }
}
