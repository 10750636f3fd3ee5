use serde::{Deserialize, Serialize};

/// Room categories offered by the resort, with their static capacity and
/// weekday/weekend rack rates in whole pesos.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomCategory {
    #[serde(rename = "couple-tepee")]
    CoupleTepee,
    #[serde(rename = "standard-tepee")]
    StandardTepee,
    #[serde(rename = "deluxe-tepee")]
    DeluxeTepee,
}

impl RoomCategory {
    pub const ALL: [RoomCategory; 3] =
        [Self::CoupleTepee, Self::StandardTepee, Self::DeluxeTepee];

    pub fn id(&self) -> &'static str {
        match self {
            Self::CoupleTepee => "couple-tepee",
            Self::StandardTepee => "standard-tepee",
            Self::DeluxeTepee => "deluxe-tepee",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CoupleTepee => "Couple Tepee",
            Self::StandardTepee => "Standard Tepee",
            Self::DeluxeTepee => "Deluxe Tepee",
        }
    }

    /// Maximum number of guests (adults + children).
    pub fn capacity(&self) -> u32 {
        match self {
            Self::CoupleTepee => 2,
            Self::StandardTepee => 4,
            Self::DeluxeTepee => 7,
        }
    }

    /// Rate for Monday through Thursday nights, in pesos.
    pub fn weekday_rate(&self) -> i64 {
        match self {
            Self::CoupleTepee => 2_499,
            Self::StandardTepee => 4_499,
            Self::DeluxeTepee => 6_999,
        }
    }

    /// Rate for Friday, Saturday and Sunday nights, in pesos.
    pub fn weekend_rate(&self) -> i64 {
        match self {
            Self::CoupleTepee => 2_999,
            Self::StandardTepee => 4_999,
            Self::DeluxeTepee => 7_499,
        }
    }

    /// Resolves a caller-supplied room name against the catalog, accepting
    /// either the id (`couple-tepee`) or the display name (`Couple Tepee`),
    /// case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL.iter().copied().find(|room| {
            room.id() == normalized || room.display_name().to_ascii_lowercase() == normalized
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BillingMode {
    /// Charged once per reservation, regardless of nights or guests.
    OneTime,
    /// Charged per guest, per night.
    PerGuestPerNight,
}

/// Optional paid extras. Dining add-ons are mutually exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AddOn {
    #[serde(rename = "early-checkin")]
    EarlyCheckIn,
    #[serde(rename = "late-checkout")]
    LateCheckOut,
    #[serde(rename = "breakfast")]
    Breakfast,
    #[serde(rename = "fullboard")]
    FullBoard,
    #[serde(rename = "pet-fee")]
    PetFee,
}

impl AddOn {
    pub const ALL: [AddOn; 5] = [
        Self::EarlyCheckIn,
        Self::LateCheckOut,
        Self::Breakfast,
        Self::FullBoard,
        Self::PetFee,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::EarlyCheckIn => "early-checkin",
            Self::LateCheckOut => "late-checkout",
            Self::Breakfast => "breakfast",
            Self::FullBoard => "fullboard",
            Self::PetFee => "pet-fee",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::EarlyCheckIn => "Early Check-in",
            Self::LateCheckOut => "Late Check-out",
            Self::Breakfast => "Breakfast Package",
            Self::FullBoard => "Full Board Package",
            Self::PetFee => "Pet Fee",
        }
    }

    /// Price in pesos; interpretation depends on [`AddOn::billing`].
    pub fn price(&self) -> i64 {
        match self {
            Self::EarlyCheckIn => 500,
            Self::LateCheckOut => 500,
            Self::Breakfast => 350,
            Self::FullBoard => 1_200,
            Self::PetFee => 500,
        }
    }

    pub fn billing(&self) -> BillingMode {
        match self {
            Self::Breakfast | Self::FullBoard => BillingMode::PerGuestPerNight,
            _ => BillingMode::OneTime,
        }
    }

    /// Add-ons sharing a group cannot be selected together.
    pub fn exclusivity_group(&self) -> Option<&'static str> {
        match self {
            Self::Breakfast | Self::FullBoard => Some("dining"),
            _ => None,
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        let normalized = code.trim().to_ascii_lowercase();
        Self::ALL.iter().copied().find(|add_on| add_on.code() == normalized)
    }
}

/// Resolves caller-supplied add-on codes against the catalog. Codes with no
/// catalog entry are dropped rather than rejected, and duplicates collapse;
/// the result is in canonical catalog order.
pub fn parse_add_on_codes<S: AsRef<str>>(codes: &[S]) -> Vec<AddOn> {
    let mut parsed: Vec<AddOn> =
        codes.iter().filter_map(|code| AddOn::parse(code.as_ref())).collect();
    parsed.sort();
    parsed.dedup();
    parsed
}

#[cfg(test)]
mod tests {
    use super::{parse_add_on_codes, AddOn, BillingMode, RoomCategory};

    #[test]
    fn resolves_rooms_by_id_and_display_name() {
        assert_eq!(RoomCategory::parse("couple-tepee"), Some(RoomCategory::CoupleTepee));
        assert_eq!(RoomCategory::parse("Standard Tepee"), Some(RoomCategory::StandardTepee));
        assert_eq!(RoomCategory::parse("DELUXE TEPEE"), Some(RoomCategory::DeluxeTepee));
        assert_eq!(RoomCategory::parse("presidential suite"), None);
    }

    #[test]
    fn weekend_rates_exceed_weekday_rates() {
        for room in RoomCategory::ALL {
            assert!(room.weekend_rate() > room.weekday_rate(), "{}", room.id());
        }
    }

    #[test]
    fn dining_add_ons_bill_per_guest_per_night() {
        assert_eq!(AddOn::Breakfast.billing(), BillingMode::PerGuestPerNight);
        assert_eq!(AddOn::FullBoard.billing(), BillingMode::PerGuestPerNight);
        assert_eq!(AddOn::PetFee.billing(), BillingMode::OneTime);
        assert_eq!(AddOn::Breakfast.exclusivity_group(), AddOn::FullBoard.exclusivity_group());
        assert_eq!(AddOn::EarlyCheckIn.exclusivity_group(), None);
    }

    #[test]
    fn unknown_codes_are_dropped_not_rejected() {
        let parsed = parse_add_on_codes(&["breakfast", "jacuzzi", "pet-fee", "breakfast"]);
        assert_eq!(parsed, vec![AddOn::Breakfast, AddOn::PetFee]);
    }
}
