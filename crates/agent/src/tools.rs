use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use liwa_core::validation::ReservationPatch;

pub const UPDATE_BOOKING: &str = "updateBooking";
pub const CANCEL_BOOKING: &str = "cancelBooking";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CancelBookingArgs {
    pub confirmation: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ToolInvocation {
    UpdateBooking(ReservationPatch),
    CancelBooking(CancelBookingArgs),
}

#[derive(Debug, Error)]
pub enum ToolParseError {
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error("invalid arguments for `{tool}`: {message}")]
    InvalidArguments { tool: &'static str, message: String },
}

impl ToolInvocation {
    /// Parses a raw tool call. Unknown argument keys are rejected rather
    /// than silently dropped, so a misbehaving model cannot smuggle in
    /// fields the update surface does not allow.
    pub fn parse(name: &str, arguments: &str) -> Result<Self, ToolParseError> {
        match name {
            UPDATE_BOOKING => serde_json::from_str::<ReservationPatch>(arguments)
                .map(Self::UpdateBooking)
                .map_err(|error| ToolParseError::InvalidArguments {
                    tool: UPDATE_BOOKING,
                    message: error.to_string(),
                }),
            CANCEL_BOOKING => serde_json::from_str::<CancelBookingArgs>(arguments)
                .map(Self::CancelBooking)
                .map_err(|error| ToolParseError::InvalidArguments {
                    tool: CANCEL_BOOKING,
                    message: error.to_string(),
                }),
            other => Err(ToolParseError::UnknownTool(other.to_string())),
        }
    }
}

/// Tool schemas advertised to the completion endpoint.
pub fn tool_schemas() -> Vec<Value> {
    vec![
        json!({
            "type": "function",
            "function": {
                "name": UPDATE_BOOKING,
                "description": "Update fields of the pending booking the guest referred to most recently. Include only the fields the guest asked to change.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "roomType": {
                            "type": "string",
                            "description": "New room type, e.g. 'standard-tepee' or 'Deluxe Tepee'"
                        },
                        "checkInDate": {
                            "type": "string",
                            "description": "New check-in date, YYYY-MM-DD"
                        },
                        "checkOutDate": {
                            "type": "string",
                            "description": "New check-out date, YYYY-MM-DD"
                        },
                        "adults": { "type": "integer" },
                        "children": { "type": "integer" },
                        "phoneNumber": { "type": "string" },
                        "addOns": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Full replacement list of add-on codes"
                        }
                    },
                    "additionalProperties": false
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": CANCEL_BOOKING,
                "description": "Cancel the pending booking the guest referred to most recently. Set confirmation to true only after the guest explicitly confirmed.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "confirmation": {
                            "type": "boolean",
                            "description": "Whether the guest explicitly confirmed the cancellation"
                        }
                    },
                    "required": ["confirmation"],
                    "additionalProperties": false
                }
            }
        }),
    ]
}
