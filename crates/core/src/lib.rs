pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;
pub mod validation;
pub mod wizard;

pub use catalog::{parse_add_on_codes, AddOn, BillingMode, RoomCategory};
pub use domain::reservation::{
    EvidenceId, GuestIdentity, PaymentMethod, ReferenceCode, Reservation, ReservationId,
    ReservationStatus,
};
pub use errors::DomainError;
pub use pricing::{quote_stay, PricingEngine, RackRatePricingEngine, StayInput, StayQuote};
pub use validation::{merge, validate, EffectiveStay, RejectionReason, ReservationPatch};
pub use wizard::{
    BookingPhase, BookingWizard, CardBrand, EvidenceFile, PaymentSetup, PreparedSubmission,
    WizardError,
};
