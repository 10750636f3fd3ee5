use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{parse_add_on_codes, AddOn, RoomCategory};
use crate::domain::reservation::{Reservation, ReservationStatus};

/// Agent-supplied partial update, restricted to the mutation allow-list.
/// Unknown keys are rejected at deserialization time rather than merged
/// silently; guest name, email, payment method, status and total are never
/// accepted here. Guest counts stay signed so that out-of-range values
/// reach the rules that name them instead of failing at the boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ReservationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adults: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_ons: Option<Vec<String>>,
}

impl ReservationPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// The one rejection reason returned for a refused mutation; rule order is
/// fixed, so the first failing rule names the reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    NotPending,
    InvalidRoomType,
    CapacityExceeded,
    InvalidAdults,
    InvalidChildren,
    CheckInPast,
    CheckOutBeforeCheckIn,
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotPending => "NOT_PENDING",
            Self::InvalidRoomType => "INVALID_ROOM_TYPE",
            Self::CapacityExceeded => "CAPACITY_EXCEEDED",
            Self::InvalidAdults => "INVALID_ADULTS",
            Self::InvalidChildren => "INVALID_CHILDREN",
            Self::CheckInPast => "CHECKIN_PAST",
            Self::CheckOutBeforeCheckIn => "CHECKOUT_BEFORE_CHECKIN",
        }
    }

    /// Plain-language rendering shown verbatim to the guest.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotPending => {
                "This reservation is no longer pending, so it can't be changed. \
                 Please start a new booking if you need another stay."
            }
            Self::InvalidRoomType => {
                "That room type isn't one we offer. Our rooms are the Couple Tepee, \
                 Standard Tepee and Deluxe Tepee."
            }
            Self::CapacityExceeded => {
                "That many guests would exceed the room's capacity. Consider a larger \
                 room or fewer guests."
            }
            Self::InvalidAdults => "A reservation needs at least one adult.",
            Self::InvalidChildren => "The number of children can't be negative.",
            Self::CheckInPast => "The check-in date can't be in the past.",
            Self::CheckOutBeforeCheckIn => {
                "The check-out date must be after the check-in date."
            }
        }
    }
}

/// Merged view of a reservation with an accepted patch applied, ready for
/// repricing and a single store write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectiveStay {
    pub room: RoomCategory,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: u32,
    pub children: u32,
    pub phone: String,
    pub add_ons: Vec<AddOn>,
}

/// Checks a proposed mutation against the current record and the rate
/// table. Rules run in a fixed order and the first failure wins:
/// status, room type, capacity, adults, children, check-in not in the
/// past (date-only, against the caller-supplied `today`), check-out
/// strictly after check-in — both date rules over effective values.
pub fn validate(
    current: &Reservation,
    patch: &ReservationPatch,
    today: NaiveDate,
) -> Result<(), RejectionReason> {
    if current.status != ReservationStatus::Pending {
        return Err(RejectionReason::NotPending);
    }

    let effective_room = match &patch.room_type {
        Some(requested) => {
            RoomCategory::parse(requested).ok_or(RejectionReason::InvalidRoomType)?
        }
        None => current.room,
    };

    let effective_adults = patch.adults.unwrap_or(i64::from(current.adults));
    let effective_children = patch.children.unwrap_or(i64::from(current.children));
    if effective_adults + effective_children > i64::from(effective_room.capacity()) {
        return Err(RejectionReason::CapacityExceeded);
    }

    if let Some(adults) = patch.adults {
        if adults < 1 {
            return Err(RejectionReason::InvalidAdults);
        }
    }

    if let Some(children) = patch.children {
        if children < 0 {
            return Err(RejectionReason::InvalidChildren);
        }
    }

    if let Some(check_in) = patch.check_in_date {
        if check_in < today {
            return Err(RejectionReason::CheckInPast);
        }
    }

    let effective_check_in = patch.check_in_date.unwrap_or(current.check_in);
    let effective_check_out = patch.check_out_date.unwrap_or(current.check_out);
    if effective_check_out <= effective_check_in {
        return Err(RejectionReason::CheckOutBeforeCheckIn);
    }

    Ok(())
}

/// Applies an accepted patch over the current record. Must only be called
/// after [`validate`] accepted the same patch; unknown add-on codes drop
/// out here the same way the pricing engine ignores them.
pub fn merge(current: &Reservation, patch: &ReservationPatch) -> EffectiveStay {
    let room = patch
        .room_type
        .as_deref()
        .and_then(RoomCategory::parse)
        .unwrap_or(current.room);
    let adults = patch
        .adults
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(current.adults);
    let children = patch
        .children
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(current.children);
    let add_ons = match &patch.add_ons {
        Some(codes) => parse_add_on_codes(codes),
        None => current.add_ons.clone(),
    };

    EffectiveStay {
        room,
        check_in: patch.check_in_date.unwrap_or(current.check_in),
        check_out: patch.check_out_date.unwrap_or(current.check_out),
        adults,
        children,
        phone: patch.phone_number.clone().unwrap_or_else(|| current.guest.phone.clone()),
        add_ons,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::catalog::{AddOn, RoomCategory};
    use crate::domain::reservation::{
        GuestIdentity, PaymentMethod, ReferenceCode, Reservation, ReservationId,
        ReservationStatus,
    };

    use super::{merge, validate, RejectionReason, ReservationPatch};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn today() -> NaiveDate {
        date(2025, 6, 1)
    }

    fn pending_couple_tepee() -> Reservation {
        Reservation {
            id: ReservationId("11111111-2222-3333-4444-555555555555".to_string()),
            reference: ReferenceCode("REF482913657".to_string()),
            guest: GuestIdentity {
                first_name: "Ana".to_string(),
                last_name: "Reyes".to_string(),
                email: "ana@example.com".to_string(),
                phone: "0917 555 0155".to_string(),
            },
            room: RoomCategory::CoupleTepee,
            check_in: date(2025, 6, 6),
            check_out: date(2025, 6, 8),
            adults: 1,
            children: 1,
            add_ons: vec![AddOn::Breakfast],
            total_amount: 7_398,
            status: ReservationStatus::Pending,
            payment_method: PaymentMethod::CreditCard,
            evidence: None,
            version: 1,
            created_at: Utc.with_ymd_and_hms(2025, 5, 20, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_patch_on_pending_record_is_accepted() {
        let current = pending_couple_tepee();
        assert_eq!(validate(&current, &ReservationPatch::default(), today()), Ok(()));
    }

    #[test]
    fn non_pending_records_reject_everything_first() {
        for status in [ReservationStatus::Completed, ReservationStatus::Cancelled] {
            let mut current = pending_couple_tepee();
            current.status = status;
            // Even an otherwise-invalid patch reports NOT_PENDING.
            let patch = ReservationPatch { adults: Some(0), ..Default::default() };
            assert_eq!(validate(&current, &patch, today()), Err(RejectionReason::NotPending));
        }
    }

    #[test]
    fn unknown_room_type_is_rejected() {
        let patch =
            ReservationPatch { room_type: Some("overwater villa".to_string()), ..Default::default() };
        assert_eq!(
            validate(&pending_couple_tepee(), &patch, today()),
            Err(RejectionReason::InvalidRoomType)
        );
    }

    #[test]
    fn capacity_check_uses_merged_values_whichever_field_changed() {
        let current = pending_couple_tepee(); // capacity 2, adults=1, children=1

        // Bumping adults alone: 2 + 1 > 2.
        let more_adults = ReservationPatch { adults: Some(2), ..Default::default() };
        assert_eq!(
            validate(&current, &more_adults, today()),
            Err(RejectionReason::CapacityExceeded)
        );

        // Bumping children alone.
        let more_children = ReservationPatch { children: Some(2), ..Default::default() };
        assert_eq!(
            validate(&current, &more_children, today()),
            Err(RejectionReason::CapacityExceeded)
        );

        // Shrinking the room under the current guest count.
        let mut current_family = current.clone();
        current_family.room = RoomCategory::StandardTepee;
        current_family.adults = 2;
        current_family.children = 2;
        let smaller_room =
            ReservationPatch { room_type: Some("Couple Tepee".to_string()), ..Default::default() };
        assert_eq!(
            validate(&current_family, &smaller_room, today()),
            Err(RejectionReason::CapacityExceeded)
        );

        // A larger room makes the same counts fit.
        let bigger_room =
            ReservationPatch { room_type: Some("Deluxe Tepee".to_string()), adults: Some(4), ..Default::default() };
        assert_eq!(validate(&current_family, &bigger_room, today()), Ok(()));
    }

    #[test]
    fn adults_below_one_is_rejected_after_capacity() {
        let patch = ReservationPatch { adults: Some(0), ..Default::default() };
        assert_eq!(
            validate(&pending_couple_tepee(), &patch, today()),
            Err(RejectionReason::InvalidAdults)
        );
    }

    #[test]
    fn negative_children_is_rejected() {
        let patch = ReservationPatch { children: Some(-1), ..Default::default() };
        assert_eq!(
            validate(&pending_couple_tepee(), &patch, today()),
            Err(RejectionReason::InvalidChildren)
        );
    }

    #[test]
    fn check_in_before_today_is_rejected() {
        let patch =
            ReservationPatch { check_in_date: Some(date(2025, 5, 31)), ..Default::default() };
        assert_eq!(
            validate(&pending_couple_tepee(), &patch, today()),
            Err(RejectionReason::CheckInPast)
        );

        // Same day as today is allowed.
        let today_patch = ReservationPatch {
            check_in_date: Some(today()),
            check_out_date: Some(date(2025, 6, 8)),
            ..Default::default()
        };
        assert_eq!(validate(&pending_couple_tepee(), &today_patch, today()), Ok(()));
    }

    #[test]
    fn checkout_not_after_checkin_is_rejected_for_any_side() {
        let current = pending_couple_tepee(); // 2025-06-06 .. 2025-06-08

        // Only check-out moved backwards.
        let checkout_only =
            ReservationPatch { check_out_date: Some(date(2025, 6, 6)), ..Default::default() };
        assert_eq!(
            validate(&current, &checkout_only, today()),
            Err(RejectionReason::CheckOutBeforeCheckIn)
        );

        // Only check-in moved past the stored check-out.
        let checkin_only =
            ReservationPatch { check_in_date: Some(date(2025, 6, 8)), ..Default::default() };
        assert_eq!(
            validate(&current, &checkin_only, today()),
            Err(RejectionReason::CheckOutBeforeCheckIn)
        );

        // Both fresh and equal.
        let both = ReservationPatch {
            check_in_date: Some(date(2025, 6, 10)),
            check_out_date: Some(date(2025, 6, 10)),
            ..Default::default()
        };
        assert_eq!(validate(&current, &both, today()), Err(RejectionReason::CheckOutBeforeCheckIn));
    }

    #[test]
    fn merge_applies_patch_fields_and_drops_unknown_add_ons() {
        let current = pending_couple_tepee();
        let patch = ReservationPatch {
            room_type: Some("Standard Tepee".to_string()),
            adults: Some(2),
            phone_number: Some("+63 917 000 1111".to_string()),
            add_ons: Some(vec!["fullboard".to_string(), "sauna".to_string()]),
            ..Default::default()
        };

        let merged = merge(&current, &patch);
        assert_eq!(merged.room, RoomCategory::StandardTepee);
        assert_eq!(merged.adults, 2);
        assert_eq!(merged.children, 1);
        assert_eq!(merged.check_in, current.check_in);
        assert_eq!(merged.phone, "+63 917 000 1111");
        assert_eq!(merged.add_ons, vec![AddOn::FullBoard]);
    }

    #[test]
    fn patch_deserialization_rejects_unknown_keys() {
        let parsed: Result<ReservationPatch, _> =
            serde_json::from_str(r#"{"adults": 2, "totalAmount": 1}"#);
        assert!(parsed.is_err());

        let allowed: ReservationPatch = serde_json::from_str(
            r#"{"roomType": "Deluxe Tepee", "checkInDate": "2025-06-10", "addOns": ["breakfast"]}"#,
        )
        .expect("allow-listed keys parse");
        assert_eq!(allowed.room_type.as_deref(), Some("Deluxe Tepee"));
        assert_eq!(allowed.check_in_date, Some(date(2025, 6, 10)));
    }
}
