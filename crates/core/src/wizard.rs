use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::catalog::{AddOn, RoomCategory};
use crate::domain::reservation::{
    EvidenceId, GuestIdentity, PaymentMethod, ReferenceCode, Reservation, ReservationId,
    ReservationStatus,
};
use crate::pricing::{quote_stay, StayInput, StayQuote};

/// Evidence images are capped at 5 MB and restricted to common image types.
pub const MAX_EVIDENCE_BYTES: u64 = 5 * 1024 * 1024;
pub const ALLOWED_EVIDENCE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Strictly ordered booking phases. Payment branches internally by method;
/// the sequence itself never branches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BookingPhase {
    RoomSelection,
    GuestDetails,
    AddOns,
    Review,
    Payment,
    Confirmation,
}

impl BookingPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoomSelection => "room_selection",
            Self::GuestDetails => "guest_details",
            Self::AddOns => "add_ons",
            Self::Review => "review",
            Self::Payment => "payment",
            Self::Confirmation => "confirmation",
        }
    }

    fn next(&self) -> Option<Self> {
        match self {
            Self::RoomSelection => Some(Self::GuestDetails),
            Self::GuestDetails => Some(Self::AddOns),
            Self::AddOns => Some(Self::Review),
            Self::Review => Some(Self::Payment),
            Self::Payment => Some(Self::Confirmation),
            Self::Confirmation => None,
        }
    }

    fn previous(&self) -> Option<Self> {
        match self {
            Self::RoomSelection => None,
            Self::GuestDetails => Some(Self::RoomSelection),
            Self::AddOns => Some(Self::GuestDetails),
            Self::Review => Some(Self::AddOns),
            Self::Payment => Some(Self::Review),
            Self::Confirmation => None,
        }
    }
}

/// Card brand detected from the leading digits, for the payment summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
}

impl CardBrand {
    pub fn detect(number: &str) -> Option<Self> {
        let digits: String = number.chars().filter(char::is_ascii_digit).collect();
        if digits.starts_with('4') {
            Some(Self::Visa)
        } else if matches!(digits.get(..2), Some("51" | "52" | "53" | "54" | "55")) {
            Some(Self::Mastercard)
        } else if matches!(digits.get(..2), Some("34" | "37")) {
            Some(Self::Amex)
        } else if digits.starts_with("6011") || digits.starts_with("65") {
            Some(Self::Discover)
        } else {
            None
        }
    }
}

/// Uploaded proof-of-payment image, validated before the store sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvidenceFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl EvidenceFile {
    pub fn byte_len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn extension(&self) -> Option<&str> {
        self.file_name.rsplit_once('.').map(|(_, extension)| extension)
    }

    pub fn validate(&self) -> Result<(), WizardError> {
        if self.byte_len() > MAX_EVIDENCE_BYTES {
            return Err(WizardError::EvidenceTooLarge { byte_len: self.byte_len() });
        }
        let extension = self.extension().unwrap_or("").to_ascii_lowercase();
        if !ALLOWED_EVIDENCE_EXTENSIONS.contains(&extension.as_str()) {
            return Err(WizardError::EvidenceBadType { extension });
        }
        Ok(())
    }
}

/// Per-method payment configuration. The non-card methods require an
/// uploaded evidence image alongside their reference details.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentSetup {
    Card { number: String, holder: String, expiry: String, cvv: String },
    GcashQr { reference_number: String, evidence: EvidenceFile },
    BankTransfer {
        sender_name: String,
        sender_bank: String,
        reference_number: String,
        transfer_date: NaiveDate,
        evidence: EvidenceFile,
    },
}

impl PaymentSetup {
    pub fn method(&self) -> PaymentMethod {
        match self {
            Self::Card { .. } => PaymentMethod::CreditCard,
            Self::GcashQr { .. } => PaymentMethod::Gcash,
            Self::BankTransfer { .. } => PaymentMethod::BankTransfer,
        }
    }

    fn validate(&self) -> Result<(), WizardError> {
        match self {
            Self::Card { number, holder, expiry, cvv } => {
                for (field, value) in
                    [("card number", number), ("cardholder name", holder), ("expiry", expiry), ("cvv", cvv)]
                {
                    if value.trim().is_empty() {
                        return Err(WizardError::MissingPaymentField { field });
                    }
                }
                let digits: String = number.chars().filter(|c| !c.is_whitespace()).collect();
                if digits.len() != 16 || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(WizardError::InvalidCardNumber);
                }
                Ok(())
            }
            Self::GcashQr { reference_number, evidence } => {
                if reference_number.trim().is_empty() {
                    return Err(WizardError::MissingPaymentField { field: "GCash reference number" });
                }
                evidence.validate()
            }
            Self::BankTransfer { sender_name, sender_bank, reference_number, evidence, .. } => {
                for (field, value) in [
                    ("sender name", sender_name),
                    ("sender bank", sender_bank),
                    ("transfer reference number", reference_number),
                ] {
                    if value.trim().is_empty() {
                        return Err(WizardError::MissingPaymentField { field });
                    }
                }
                evidence.validate()
            }
        }
    }

    fn evidence(&self) -> Option<&EvidenceFile> {
        match self {
            Self::Card { .. } => None,
            Self::GcashQr { evidence, .. } | Self::BankTransfer { evidence, .. } => Some(evidence),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("select a room to continue")]
    RoomNotSelected,
    #[error("both check-in and check-out dates are required")]
    MissingDates,
    #[error("check-out must be after check-in")]
    DatesOutOfOrder,
    #[error("missing required field: {field}")]
    MissingGuestField { field: &'static str },
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("phone number must have at least 10 digits")]
    InvalidPhone,
    #[error("at least one adult is required")]
    AdultsRequired,
    #[error("{room} accommodates at most {capacity} guests")]
    CapacityExceeded { room: &'static str, capacity: u32 },
    #[error("dining add-ons are mutually exclusive")]
    DiningConflict,
    #[error("configure a payment method before submitting")]
    PaymentNotConfigured,
    #[error("missing payment field: {field}")]
    MissingPaymentField { field: &'static str },
    #[error("card number must be 16 digits")]
    InvalidCardNumber,
    #[error("evidence file is {byte_len} bytes; the limit is 5 MB")]
    EvidenceTooLarge { byte_len: u64 },
    #[error("evidence file type `{extension}` is not an accepted image type")]
    EvidenceBadType { extension: String },
    #[error("no transition available from the {phase} phase")]
    PhaseLocked { phase: &'static str },
}

/// Linear, phase-gated collector that assembles a new [`Reservation`].
/// Forward movement requires the current phase's validation to pass;
/// backward movement is free except out of the first and last phases.
#[derive(Clone, Debug, Default)]
pub struct BookingWizard {
    phase: Option<BookingPhase>,
    room: Option<RoomCategory>,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    adults: u32,
    children: u32,
    add_ons: Vec<AddOn>,
    payment: Option<PaymentSetup>,
}

impl BookingWizard {
    pub fn new() -> Self {
        Self { phase: Some(BookingPhase::RoomSelection), adults: 1, ..Self::default() }
    }

    pub fn phase(&self) -> BookingPhase {
        self.phase.unwrap_or(BookingPhase::RoomSelection)
    }

    pub fn select_room(&mut self, room: RoomCategory) {
        self.room = Some(room);
    }

    pub fn set_guest_identity(&mut self, first_name: &str, last_name: &str, email: &str, phone: &str) {
        self.first_name = first_name.to_string();
        self.last_name = last_name.to_string();
        self.email = email.to_string();
        self.phone = phone.to_string();
    }

    pub fn set_dates(&mut self, check_in: NaiveDate, check_out: NaiveDate) {
        self.check_in = Some(check_in);
        self.check_out = Some(check_out);
    }

    pub fn set_guests(&mut self, adults: u32, children: u32) {
        self.adults = adults;
        self.children = children;
    }

    /// Toggles an add-on. Selecting a dining add-on replaces any other
    /// dining selection rather than stacking with it.
    pub fn toggle_add_on(&mut self, add_on: AddOn) {
        if let Some(position) = self.add_ons.iter().position(|selected| *selected == add_on) {
            self.add_ons.remove(position);
            return;
        }
        if let Some(group) = add_on.exclusivity_group() {
            self.add_ons.retain(|selected| selected.exclusivity_group() != Some(group));
        }
        self.add_ons.push(add_on);
    }

    pub fn add_ons(&self) -> &[AddOn] {
        &self.add_ons
    }

    pub fn configure_payment(&mut self, setup: PaymentSetup) -> Result<(), WizardError> {
        setup.validate()?;
        self.payment = Some(setup);
        Ok(())
    }

    pub fn clear_payment(&mut self) {
        self.payment = None;
    }

    /// Prices the currently collected stay, or `None` before room and
    /// dates are all known.
    pub fn quote(&self) -> Option<StayQuote> {
        let room = self.room?;
        let check_in = self.check_in?;
        let check_out = self.check_out?;
        Some(quote_stay(&StayInput {
            room,
            check_in,
            check_out,
            adults: self.adults,
            children: self.children,
            add_ons: &self.add_ons,
        }))
    }

    /// Moves forward one phase after the current phase's gate passes.
    /// Payment is left only through [`BookingWizard::confirm_submitted`].
    pub fn advance(&mut self) -> Result<BookingPhase, WizardError> {
        let phase = self.phase();
        match phase {
            BookingPhase::RoomSelection => {
                if self.room.is_none() {
                    return Err(WizardError::RoomNotSelected);
                }
            }
            BookingPhase::GuestDetails => self.validate_guest_details()?,
            BookingPhase::AddOns | BookingPhase::Review => {}
            BookingPhase::Payment | BookingPhase::Confirmation => {
                return Err(WizardError::PhaseLocked { phase: phase.as_str() });
            }
        }

        let next = phase.next().ok_or(WizardError::PhaseLocked { phase: phase.as_str() })?;
        self.phase = Some(next);
        Ok(next)
    }

    /// Steps back one phase; the first phase and the terminal
    /// confirmation phase have nowhere to go.
    pub fn back(&mut self) -> Result<BookingPhase, WizardError> {
        let phase = self.phase();
        if phase == BookingPhase::Confirmation {
            return Err(WizardError::PhaseLocked { phase: phase.as_str() });
        }
        let previous =
            phase.previous().ok_or(WizardError::PhaseLocked { phase: phase.as_str() })?;
        self.phase = Some(previous);
        Ok(previous)
    }

    fn validate_guest_details(&self) -> Result<(), WizardError> {
        let (check_in, check_out) = match (self.check_in, self.check_out) {
            (Some(check_in), Some(check_out)) => (check_in, check_out),
            _ => return Err(WizardError::MissingDates),
        };
        if check_out <= check_in {
            return Err(WizardError::DatesOutOfOrder);
        }

        for (field, value) in [
            ("first name", &self.first_name),
            ("last name", &self.last_name),
            ("email", &self.email),
            ("phone number", &self.phone),
        ] {
            if value.trim().is_empty() {
                return Err(WizardError::MissingGuestField { field });
            }
        }
        if !email_is_well_formed(&self.email) {
            return Err(WizardError::InvalidEmail);
        }
        if !phone_is_well_formed(&self.phone) {
            return Err(WizardError::InvalidPhone);
        }

        if self.adults < 1 {
            return Err(WizardError::AdultsRequired);
        }
        let room = self.room.ok_or(WizardError::RoomNotSelected)?;
        if self.adults + self.children > room.capacity() {
            return Err(WizardError::CapacityExceeded {
                room: room.display_name(),
                capacity: room.capacity(),
            });
        }

        Ok(())
    }

    /// Assembles the full reservation for submission to the store. Only
    /// valid in the Payment phase with a configured method; generates the
    /// reference code and recomputes the total through the shared pricing
    /// engine. The caller persists the record and then reports the outcome
    /// via [`BookingWizard::confirm_submitted`] — on store failure the
    /// wizard simply stays in Payment.
    pub fn assemble(&self, now: DateTime<Utc>) -> Result<PreparedSubmission, WizardError> {
        if self.phase() != BookingPhase::Payment {
            return Err(WizardError::PhaseLocked { phase: self.phase().as_str() });
        }
        let payment = self.payment.as_ref().ok_or(WizardError::PaymentNotConfigured)?;
        payment.validate()?;
        self.validate_guest_details()?;

        let quote = self.quote().ok_or(WizardError::MissingDates)?;
        let room = self.room.ok_or(WizardError::RoomNotSelected)?;

        let reservation = Reservation {
            id: ReservationId::generate(),
            reference: ReferenceCode::generate(now),
            guest: GuestIdentity {
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                email: self.email.trim().to_string(),
                phone: self.phone.trim().to_string(),
            },
            room,
            check_in: self.check_in.ok_or(WizardError::MissingDates)?,
            check_out: self.check_out.ok_or(WizardError::MissingDates)?,
            adults: self.adults,
            children: self.children,
            add_ons: self.add_ons.clone(),
            total_amount: quote.total,
            status: ReservationStatus::Pending,
            payment_method: payment.method(),
            evidence: None,
            version: 0,
            created_at: now,
        };

        Ok(PreparedSubmission {
            reservation,
            evidence: payment.evidence().cloned(),
        })
    }

    /// The store accepted the submission; the wizard is done.
    pub fn confirm_submitted(&mut self) {
        self.phase = Some(BookingPhase::Confirmation);
    }
}

/// A reservation ready for the store, paired with the evidence image that
/// the non-card payment methods carry.
#[derive(Clone, Debug)]
pub struct PreparedSubmission {
    pub reservation: Reservation,
    pub evidence: Option<EvidenceFile>,
}

/// `local@domain.tld` shape: non-empty local part, non-empty domain with a
/// dot and a non-empty label on each side, no whitespace anywhere.
fn email_is_well_formed(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Optional leading `+`, then at least ten characters drawn from digits,
/// spaces and dashes, nothing else.
fn phone_is_well_formed(phone: &str) -> bool {
    let trimmed = phone.trim();
    let rest = trimmed.strip_prefix('+').unwrap_or(trimmed);
    rest.len() >= 10 && rest.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
}
