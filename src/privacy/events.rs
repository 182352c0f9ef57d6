//! Audit events

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

pub mod event_types {
    pub const SHIELD: &str = "shield";
    pub const PRIVATE_TRANSFER: &str = "private_transfer";
    pub const UNSHIELD: &str = "unshield";
    pub const UPDATE_PARAMS: &str = "update_params";
}

/// Emitted after a successful commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PoolEvent {
    Shield {
        sender: String,
        denom: String,
        amount: u64,
        deposit_index: u64,
        block_height: u64,
    },
    PrivateTransfer {
        denom: String,
        input_count: usize,
        output_count: usize,
        block_height: u64,
    },
    Unshield {
        recipient: String,
        denom: String,
        amount: u64,
        deposit_index: u64,
        block_height: u64,
    },
    UpdateParams {
        authority: String,
    },
}

impl PoolEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            PoolEvent::Shield { .. } => event_types::SHIELD,
            PoolEvent::PrivateTransfer { .. } => event_types::PRIVATE_TRANSFER,
            PoolEvent::Unshield { .. } => event_types::UNSHIELD,
            PoolEvent::UpdateParams { .. } => event_types::UPDATE_PARAMS,
        }
    }

    /// Flat key/value view, in emission order
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        match self {
            PoolEvent::Shield {
                sender,
                denom,
                amount,
                deposit_index,
                block_height,
            } => vec![
                ("sender", sender.clone()),
                ("denom", denom.clone()),
                ("amount", amount.to_string()),
                ("deposit_index", deposit_index.to_string()),
                ("block_height", block_height.to_string()),
            ],
            PoolEvent::PrivateTransfer {
                denom,
                input_count,
                output_count,
                block_height,
            } => vec![
                ("denom", denom.clone()),
                ("input_count", input_count.to_string()),
                ("output_count", output_count.to_string()),
                ("block_height", block_height.to_string()),
            ],
            PoolEvent::Unshield {
                recipient,
                denom,
                amount,
                deposit_index,
                block_height,
            } => vec![
                ("recipient", recipient.clone()),
                ("denom", denom.clone()),
                ("amount", amount.to_string()),
                ("deposit_index", deposit_index.to_string()),
                ("block_height", block_height.to_string()),
            ],
            PoolEvent::UpdateParams { authority } => vec![("authority", authority.clone())],
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: PoolEvent);
}

/// Collects events for inspection
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<PoolEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PoolEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: PoolEvent) {
        self.events.lock().push(event);
    }
}

/// Writes events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: PoolEvent) {
        let attrs = event
            .attributes()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        log::info!("event {} {}", event.event_type(), attrs);
    }
}
