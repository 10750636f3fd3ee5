//! End-to-end flows through the chat orchestrator with a scripted
//! completion client and the in-memory store.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};

use liwa_agent::{
    ChatOrchestrator, ChatRequest, CompletionClient, CompletionError, CompletionOutcome,
};
use liwa_core::catalog::{AddOn, RoomCategory};
use liwa_core::domain::reservation::{
    GuestIdentity, PaymentMethod, ReferenceCode, Reservation, ReservationId, ReservationStatus,
};
use liwa_db::repositories::{InMemoryReservationStore, ReservationStore};

struct ScriptedCompletionClient {
    outcomes: Mutex<VecDeque<CompletionOutcome>>,
}

impl ScriptedCompletionClient {
    fn new(outcomes: Vec<CompletionOutcome>) -> Self {
        Self { outcomes: Mutex::new(outcomes.into_iter().collect()) }
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, _request: &ChatRequest) -> Result<CompletionOutcome, CompletionError> {
        self.outcomes
            .lock()
            .expect("script lock")
            .pop_front()
            .ok_or_else(|| CompletionError::Malformed("script exhausted".to_string()))
    }
}

fn update_call(arguments: &str) -> CompletionOutcome {
    CompletionOutcome::ToolCall {
        name: "updateBooking".to_string(),
        arguments: arguments.to_string(),
    }
}

fn cancel_call(confirmation: bool) -> CompletionOutcome {
    CompletionOutcome::ToolCall {
        name: "cancelBooking".to_string(),
        arguments: format!("{{\"confirmation\":{confirmation}}}"),
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn today() -> NaiveDate {
    date(2025, 6, 1)
}

fn pending_reservation(reference: &str) -> Reservation {
    Reservation {
        id: ReservationId(format!("id-{reference}")),
        reference: ReferenceCode(reference.to_string()),
        guest: GuestIdentity {
            first_name: "Ana".to_string(),
            last_name: "Reyes".to_string(),
            email: "ana@example.com".to_string(),
            phone: "0917 555 0155".to_string(),
        },
        room: RoomCategory::StandardTepee,
        // Fri and Sat nights, both at the weekend rate.
        check_in: date(2025, 6, 6),
        check_out: date(2025, 6, 8),
        adults: 2,
        children: 1,
        add_ons: vec![AddOn::Breakfast],
        total_amount: 12_098,
        status: ReservationStatus::Pending,
        payment_method: PaymentMethod::Gcash,
        evidence: None,
        version: 0,
        created_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
    }
}

async fn seeded_store(reservation: &Reservation) -> InMemoryReservationStore {
    let store = InMemoryReservationStore::new();
    store.create(reservation.clone()).await.expect("seed reservation");
    store
}

#[tokio::test]
async fn accepted_update_reprices_and_writes_once() {
    let reservation = pending_reservation("REF123456789");
    let store = seeded_store(&reservation).await;
    let client = ScriptedCompletionClient::new(vec![update_call(
        r#"{"roomType": "deluxe-tepee", "adults": 4}"#,
    )]);

    let mut orchestrator = ChatOrchestrator::new(store.clone(), client, 10);
    let reply = orchestrator
        .handle_turn("Please upgrade my booking REF123456789 to a deluxe tepee for 4 adults", today())
        .await
        .expect("turn succeeds");

    assert!(reply.contains("Deluxe Tepee"), "reply should name the new room: {reply}");
    // 2 weekend nights at 7,499 plus breakfast for 5 guests over 2 nights.
    assert!(reply.contains("P18,498"), "reply should carry the repriced total: {reply}");

    let stored = store
        .find_by_reference(&reservation.reference)
        .await
        .expect("find")
        .expect("still present");
    assert_eq!(stored.room, RoomCategory::DeluxeTepee);
    assert_eq!(stored.adults, 4);
    assert_eq!(stored.children, 1);
    assert_eq!(stored.total_amount, 18_498);
    assert_eq!(stored.version, 1, "exactly one write");
    assert_eq!(stored.status, ReservationStatus::Pending);
}

#[tokio::test]
async fn repeating_an_update_is_idempotent_on_price() {
    let reservation = pending_reservation("REF123456789");
    let store = seeded_store(&reservation).await;
    let patch = r#"{"checkOutDate": "2025-06-09"}"#;
    let client =
        ScriptedCompletionClient::new(vec![update_call(patch), update_call(patch)]);

    let mut orchestrator = ChatOrchestrator::new(store.clone(), client, 10);
    orchestrator
        .handle_turn("Extend REF123456789 to June 9 please", today())
        .await
        .expect("first turn");
    orchestrator.handle_turn("Extend it to June 9 please", today()).await.expect("second turn");

    let stored = store
        .find_by_reference(&reservation.reference)
        .await
        .expect("find")
        .expect("still present");
    // Fri, Sat and Sun nights are all weekend-rated; breakfast for 3
    // guests over 3 nights.
    assert_eq!(stored.total_amount, 4_999 * 3 + 350 * 3 * 3);
    assert_eq!(stored.version, 2, "each accepted call writes exactly once");
}

#[tokio::test]
async fn updates_to_non_pending_bookings_leave_the_store_unchanged() {
    let mut reservation = pending_reservation("REF123456789");
    reservation.status = ReservationStatus::Completed;
    let store = seeded_store(&reservation).await;
    let client =
        ScriptedCompletionClient::new(vec![update_call(r#"{"adults": 3}"#)]);

    let mut orchestrator = ChatOrchestrator::new(store.clone(), client, 10);
    let reply = orchestrator
        .handle_turn("Change REF123456789 to 3 adults", today())
        .await
        .expect("turn succeeds");

    assert!(reply.contains("no longer pending"), "rejection reply: {reply}");

    let stored = store
        .find_by_reference(&reservation.reference)
        .await
        .expect("find")
        .expect("still present");
    assert_eq!(stored, reservation, "rejection must not touch the store");
}

#[tokio::test]
async fn capacity_is_enforced_whichever_field_moved() {
    let mut reservation = pending_reservation("REF123456789");
    reservation.room = RoomCategory::CoupleTepee;
    reservation.adults = 2;
    reservation.children = 0;
    let store = seeded_store(&reservation).await;
    // Only children changes, but the effective party of 3 exceeds the
    // couple tepee's capacity of 2.
    let client =
        ScriptedCompletionClient::new(vec![update_call(r#"{"children": 1}"#)]);

    let mut orchestrator = ChatOrchestrator::new(store.clone(), client, 10);
    let reply = orchestrator
        .handle_turn("Add a child to REF123456789", today())
        .await
        .expect("turn succeeds");

    assert!(reply.contains("capacity"), "rejection reply: {reply}");

    let stored = store
        .find_by_reference(&reservation.reference)
        .await
        .expect("find")
        .expect("still present");
    assert_eq!(stored.version, 0);
    assert_eq!(stored.children, 0);
}

#[tokio::test]
async fn cancellation_without_confirmation_never_contacts_the_store() {
    let reservation = pending_reservation("REF123456789");
    let store = seeded_store(&reservation).await;
    let client = ScriptedCompletionClient::new(vec![cancel_call(false)]);

    let mut orchestrator = ChatOrchestrator::new(store.clone(), client, 10);
    let reply = orchestrator
        .handle_turn("Cancel REF123456789", today())
        .await
        .expect("turn succeeds");

    assert!(reply.to_lowercase().contains("confirm"), "should ask to confirm: {reply}");

    let stored = store
        .find_by_reference(&reservation.reference)
        .await
        .expect("find")
        .expect("still present");
    assert_eq!(stored.status, ReservationStatus::Pending);
    assert_eq!(stored.version, 0);
}

#[tokio::test]
async fn confirmed_cancellation_moves_to_cancelled() {
    let reservation = pending_reservation("REF123456789");
    let store = seeded_store(&reservation).await;
    let client = ScriptedCompletionClient::new(vec![cancel_call(true)]);

    let mut orchestrator = ChatOrchestrator::new(store.clone(), client, 10);
    let reply = orchestrator
        .handle_turn("Yes, cancel REF123456789, I'm sure", today())
        .await
        .expect("turn succeeds");

    assert!(reply.contains("cancelled"), "cancellation reply: {reply}");
    assert!(reply.contains("5-7 business days"), "refund timeline: {reply}");

    let stored = store
        .find_by_reference(&reservation.reference)
        .await
        .expect("find")
        .expect("still present");
    assert_eq!(stored.status, ReservationStatus::Cancelled);
    assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn cancelling_an_already_cancelled_booking_is_rejected_without_writes() {
    let mut reservation = pending_reservation("REF123456789");
    reservation.status = ReservationStatus::Cancelled;
    let store = seeded_store(&reservation).await;
    let client = ScriptedCompletionClient::new(vec![cancel_call(true)]);

    let mut orchestrator = ChatOrchestrator::new(store.clone(), client, 10);
    let reply = orchestrator
        .handle_turn("Cancel REF123456789, confirmed", today())
        .await
        .expect("turn succeeds");

    assert!(reply.contains("no longer pending"), "rejection reply: {reply}");

    let stored = store
        .find_by_reference(&reservation.reference)
        .await
        .expect("find")
        .expect("still present");
    assert_eq!(stored.status, ReservationStatus::Cancelled);
    assert_eq!(stored.version, 0, "no write on rejection");
}

#[tokio::test]
async fn tool_calls_without_a_resolvable_reference_ask_for_one() {
    let store = InMemoryReservationStore::new();
    let client =
        ScriptedCompletionClient::new(vec![update_call(r#"{"adults": 2}"#)]);

    let mut orchestrator = ChatOrchestrator::new(store, client, 10);
    let reply = orchestrator
        .handle_turn("Change my booking to 2 adults", today())
        .await
        .expect("turn succeeds");

    assert!(reply.contains("reference code"), "should ask for a reference: {reply}");
}

#[tokio::test]
async fn unknown_patch_keys_yield_a_polite_rejection() {
    let reservation = pending_reservation("REF123456789");
    let store = seeded_store(&reservation).await;
    let client = ScriptedCompletionClient::new(vec![update_call(
        r#"{"totalAmount": 1, "adults": 2}"#,
    )]);

    let mut orchestrator = ChatOrchestrator::new(store.clone(), client, 10);
    let reply = orchestrator
        .handle_turn("Set my total for REF123456789 to 1 peso", today())
        .await
        .expect("turn succeeds");

    assert!(reply.contains("rephrase"), "parse rejection reply: {reply}");

    let stored = store
        .find_by_reference(&reservation.reference)
        .await
        .expect("find")
        .expect("still present");
    assert_eq!(stored.version, 0, "rejected tool call must not write");
}

#[tokio::test]
async fn plain_text_replies_pass_through() {
    let store = InMemoryReservationStore::new();
    let client = ScriptedCompletionClient::new(vec![CompletionOutcome::Text(
        "Welcome to Liwa! How can I help?".to_string(),
    )]);

    let mut orchestrator = ChatOrchestrator::new(store, client, 10);
    let reply = orchestrator.handle_turn("Hello!", today()).await.expect("turn succeeds");
    assert_eq!(reply, "Welcome to Liwa! How can I help?");
}
