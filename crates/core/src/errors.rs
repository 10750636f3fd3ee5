use thiserror::Error;

use crate::domain::reservation::ReservationStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid reservation status transition from {from:?} to {to:?}")]
    InvalidStatusTransition { from: ReservationStatus, to: ReservationStatus },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}
