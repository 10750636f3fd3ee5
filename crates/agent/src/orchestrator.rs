use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use liwa_core::domain::reservation::{Reservation, ReservationStatus};
use liwa_core::pricing::{PricingEngine, RackRatePricingEngine, StayInput};
use liwa_core::validation::{self, RejectionReason, ReservationPatch};
use liwa_db::repositories::{ReservationChanges, ReservationStore, StoreError};

use crate::conversation::{ConversationContext, Speaker};
use crate::llm::{ChatMessage, ChatRequest, CompletionClient, CompletionError, CompletionOutcome};
use crate::prompts::system_prompt;
use crate::tools::{tool_schemas, CancelBookingArgs, ToolInvocation};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives one guest conversation: relays turns to the completion model and
/// executes the tool calls it emits. Validation rejections and
/// confirmations are rendered as ordinary replies; only infrastructure
/// failures surface as errors.
pub struct ChatOrchestrator<S, C> {
    store: S,
    client: C,
    pricing: RackRatePricingEngine,
    context: ConversationContext,
}

impl<S, C> ChatOrchestrator<S, C>
where
    S: ReservationStore,
    C: CompletionClient,
{
    pub fn new(store: S, client: C, history_window: usize) -> Self {
        Self {
            store,
            client,
            pricing: RackRatePricingEngine,
            context: ConversationContext::new(history_window),
        }
    }

    pub async fn handle_turn(
        &mut self,
        user_text: &str,
        today: NaiveDate,
    ) -> Result<String, AgentError> {
        self.context.push(Speaker::Guest, user_text);

        let request = ChatRequest {
            system: system_prompt(today),
            messages: self
                .context
                .turns()
                .map(|turn| ChatMessage { role: turn.speaker.role(), content: turn.content.clone() })
                .collect(),
            tools: tool_schemas(),
        };

        let reply = match self.client.complete(&request).await? {
            CompletionOutcome::Text(text) => text,
            CompletionOutcome::ToolCall { name, arguments } => {
                match ToolInvocation::parse(&name, &arguments) {
                    Ok(ToolInvocation::UpdateBooking(patch)) => {
                        self.update_booking(patch, today).await?
                    }
                    Ok(ToolInvocation::CancelBooking(args)) => self.cancel_booking(args).await?,
                    Err(error) => {
                        warn!(event_name = "tool_call_rejected", tool = %name, error = %error);
                        "Sorry, I couldn't process that request. Could you rephrase what you'd \
                         like to change about your booking?"
                            .to_string()
                    }
                }
            }
        };

        self.context.push(Speaker::Agent, reply.clone());
        Ok(reply)
    }

    /// Applies a guest-requested change: validate against the stored
    /// reservation, reprice the full effective stay, and persist with a
    /// single conditional write. Rejections leave the store untouched.
    async fn update_booking(
        &self,
        patch: ReservationPatch,
        today: NaiveDate,
    ) -> Result<String, AgentError> {
        let Some(reference) = self.context.find_reference() else {
            return Ok(MISSING_REFERENCE_REPLY.to_string());
        };

        let Some(reservation) = self.store.find_by_reference(&reference).await? else {
            return Ok(format!(
                "I couldn't find a booking with reference {}. Could you double-check the code?",
                reference.0
            ));
        };

        if let Err(reason) = validation::validate(&reservation, &patch, today) {
            warn!(
                event_name = "update_rejected",
                reference = %reference.0,
                code = reason.code(),
            );
            return Ok(reason.user_message().to_string());
        }

        let effective = validation::merge(&reservation, &patch);
        let quote = self.pricing.price(&StayInput {
            room: effective.room,
            check_in: effective.check_in,
            check_out: effective.check_out,
            adults: effective.adults,
            children: effective.children,
            add_ons: &effective.add_ons,
        });

        let changes = ReservationChanges {
            room: effective.room,
            check_in: effective.check_in,
            check_out: effective.check_out,
            adults: effective.adults,
            children: effective.children,
            phone: effective.phone,
            add_ons: effective.add_ons,
            total_amount: quote.total,
        };

        let updated =
            match self.store.update_fields(&reference, changes, reservation.version).await {
                Ok(updated) => updated,
                Err(StoreError::VersionConflict { .. }) => {
                    return Ok(
                        "Your booking was changed by another request while I was working on \
                         this one. Nothing was applied; please try again."
                            .to_string(),
                    );
                }
                Err(error) => return Err(error.into()),
            };

        info!(
            event_name = "booking_updated",
            reference = %reference.0,
            total_amount = updated.total_amount,
            version = updated.version,
        );

        Ok(render_update_confirmation(&updated))
    }

    /// Cancels the referenced booking. Without an explicit confirmation
    /// the store is never contacted.
    async fn cancel_booking(&self, args: CancelBookingArgs) -> Result<String, AgentError> {
        if !args.confirmation {
            return Ok(
                "Just to be sure: do you want me to cancel this booking? Cancellation cannot \
                 be undone. Please confirm."
                    .to_string(),
            );
        }

        let Some(reference) = self.context.find_reference() else {
            return Ok(MISSING_REFERENCE_REPLY.to_string());
        };

        let Some(reservation) = self.store.find_by_reference(&reference).await? else {
            return Ok(format!(
                "I couldn't find a booking with reference {}. Could you double-check the code?",
                reference.0
            ));
        };

        if reservation.status != ReservationStatus::Pending {
            warn!(
                event_name = "cancel_rejected",
                reference = %reference.0,
                code = RejectionReason::NotPending.code(),
            );
            return Ok(RejectionReason::NotPending.user_message().to_string());
        }

        let cancelled = match self
            .store
            .update_status(&reference, ReservationStatus::Cancelled, reservation.version)
            .await
        {
            Ok(cancelled) => cancelled,
            Err(StoreError::VersionConflict { .. }) => {
                return Ok(
                    "Your booking was changed by another request while I was working on this \
                     one. Nothing was applied; please try again."
                        .to_string(),
                );
            }
            Err(error) => return Err(error.into()),
        };

        info!(event_name = "booking_cancelled", reference = %cancelled.reference.0);

        Ok(format!(
            "Your booking {} has been cancelled. Any payment made will be refunded to your \
             original payment method within 5-7 business days.",
            cancelled.reference.0
        ))
    }
}

const MISSING_REFERENCE_REPLY: &str =
    "Which booking is this about? Please share your reference code (it looks like \
     REF followed by 9 digits).";

fn render_update_confirmation(reservation: &Reservation) -> String {
    let add_ons = if reservation.add_ons.is_empty() {
        "none".to_string()
    } else {
        reservation
            .add_ons
            .iter()
            .map(|add_on| add_on.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "Your booking {reference} is updated:\n\
         - Room: {room}\n\
         - Stay: {check_in} to {check_out} ({nights} night{night_plural})\n\
         - Guests: {adults} adult{adult_plural}, {children} child{child_plural}\n\
         - Add-ons: {add_ons}\n\
         - New total: {total}",
        reference = reservation.reference.0,
        room = reservation.room.display_name(),
        check_in = reservation.check_in,
        check_out = reservation.check_out,
        nights = reservation.nights(),
        night_plural = if reservation.nights() == 1 { "" } else { "s" },
        adults = reservation.adults,
        adult_plural = if reservation.adults == 1 { "" } else { "s" },
        children = reservation.children,
        child_plural = if reservation.children == 1 { "" } else { "ren" },
        add_ons = add_ons,
        total = format_pesos(reservation.total_amount),
    )
}

/// Renders a whole-peso amount with thousands separators.
fn format_pesos(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("P{sign}{grouped}")
}
