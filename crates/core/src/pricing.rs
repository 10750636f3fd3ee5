use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::catalog::{AddOn, BillingMode, RoomCategory};

/// Priced breakdown of a stay, in whole pesos.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayQuote {
    pub room_subtotal: i64,
    pub add_on_subtotal: i64,
    pub total: i64,
    pub nights: i64,
}

/// Inputs covering the half-open stay interval `[check_in, check_out)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StayInput<'a> {
    pub room: RoomCategory,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: u32,
    pub children: u32,
    pub add_ons: &'a [AddOn],
}

pub trait PricingEngine: Send + Sync {
    fn price(&self, input: &StayInput<'_>) -> StayQuote;
}

/// Rack-rate pricing straight from the catalog. Both the booking wizard and
/// the conversational orchestrator price through this single engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct RackRatePricingEngine;

impl PricingEngine for RackRatePricingEngine {
    fn price(&self, input: &StayInput<'_>) -> StayQuote {
        quote_stay(input)
    }
}

/// Friday, Saturday and Sunday nights bill at the weekend rate.
pub fn is_weekend_rate(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Fri | Weekday::Sat | Weekday::Sun)
}

pub fn nightly_rate(room: RoomCategory, night: NaiveDate) -> i64 {
    if is_weekend_rate(night) {
        room.weekend_rate()
    } else {
        room.weekday_rate()
    }
}

/// Sums per-night room rates over the stay interval plus add-on charges.
/// An empty or inverted interval prices to zero nights; refusing such
/// ranges is the validation engine's job, not this one's.
pub fn quote_stay(input: &StayInput<'_>) -> StayQuote {
    let mut room_subtotal = 0;
    let mut nights = 0;
    let mut night = input.check_in;
    while night < input.check_out {
        room_subtotal += nightly_rate(input.room, night);
        nights += 1;
        match night.succ_opt() {
            Some(next) => night = next,
            None => break,
        }
    }

    let total_guests = i64::from(input.adults) + i64::from(input.children);
    let add_on_subtotal = input
        .add_ons
        .iter()
        .map(|add_on| match add_on.billing() {
            BillingMode::PerGuestPerNight => add_on.price() * nights * total_guests,
            BillingMode::OneTime => add_on.price(),
        })
        .sum();

    StayQuote {
        room_subtotal,
        add_on_subtotal,
        total: room_subtotal + add_on_subtotal,
        nights,
    }
}
