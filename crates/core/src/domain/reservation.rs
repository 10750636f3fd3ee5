use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{AddOn, RoomCategory};
use crate::errors::DomainError;

/// Server-assigned primary identifier. The human-facing handle is the
/// separate [`ReferenceCode`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub String);

impl ReservationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Short shareable booking handle: literal `REF` followed by a 6-digit
/// timestamp tail and a 3-digit random suffix. Not collision-proof, so the
/// store treats a duplicate on create as a conflict.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceCode(pub String);

impl ReferenceCode {
    pub const DIGITS: usize = 9;

    pub fn generate(now: DateTime<Utc>) -> Self {
        let tail = (now.timestamp_millis().unsigned_abs() % 1_000_000) as u32;
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000);
        Self(format!("REF{tail:06}{suffix:03}"))
    }

    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let digits = trimmed.strip_prefix("REF")?;
        if digits.len() == Self::DIGITS && digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Some(Self(trimmed.to_string()));
        }
        None
    }

    /// Returns the last well-formed reference code embedded in free text.
    pub fn scan_last(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        let mut found = None;
        let mut index = 0;
        while let Some(offset) = text[index..].find("REF") {
            let start = index + offset;
            let end = start + 3 + Self::DIGITS;
            if end <= bytes.len() && bytes[start + 3..end].iter().all(u8::is_ascii_digit) {
                found = Some(Self(text[start..end].to_string()));
                index = end;
            } else {
                index = start + 3;
            }
        }
        found
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Completed and cancelled records are immutable.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "credit-card")]
    CreditCard,
    #[serde(rename = "gcash")]
    Gcash,
    #[serde(rename = "bank-transfer")]
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreditCard => "credit-card",
            Self::Gcash => "gcash",
            Self::BankTransfer => "bank-transfer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "credit-card" => Some(Self::CreditCard),
            "gcash" => Some(Self::Gcash),
            "bank-transfer" => Some(Self::BankTransfer),
            _ => None,
        }
    }
}

/// Guest identity captured by the wizard. Immutable after creation except
/// for the phone number, which is on the conversational allow-list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestIdentity {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl GuestIdentity {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Opaque handle to a stored payment-evidence image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceId(pub String);

impl EvidenceId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub reference: ReferenceCode,
    pub guest: GuestIdentity,
    pub room: RoomCategory,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: u32,
    pub children: u32,
    pub add_ons: Vec<AddOn>,
    pub total_amount: i64,
    pub status: ReservationStatus,
    pub payment_method: PaymentMethod,
    pub evidence: Option<EvidenceId>,
    /// Bumped by the store on every successful write; writers supply the
    /// version they read so a concurrent update surfaces as a conflict.
    pub version: u32,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn total_guests(&self) -> u32 {
        self.adults + self.children
    }

    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        matches!(
            (self.status, next),
            (ReservationStatus::Pending, ReservationStatus::Completed)
                | (ReservationStatus::Pending, ReservationStatus::Cancelled)
        )
    }

    pub fn transition_to(&mut self, next: ReservationStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidStatusTransition { from: self.status, to: next })
    }
}
