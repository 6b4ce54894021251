//! Domain events emitted by the transaction handlers
//!
//! Events are typed payloads wrapped in an envelope carrying a
//! fully-qualified event type name. The namespace half of that name comes
//! from configuration through [`EventFactory`] rather than an ambient
//! constant, so two deployments can run distinct namespaces side by side.

use crate::types::ShipmentId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Which side of the temperature band a reading breached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureViolation {
    /// Reading strictly below the contract minimum
    BelowThreshold,
    /// Reading strictly above the contract maximum
    AboveThreshold,
}

impl fmt::Display for TemperatureViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TemperatureViolation::BelowThreshold => "Temperature Below Threshold",
            TemperatureViolation::AboveThreshold => "Temperature Above Threshold",
        };
        write!(f, "{}", s)
    }
}

/// Typed event payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EventPayload {
    /// A temperature reading breached the contract band
    #[serde(rename_all = "camelCase")]
    TemperatureThreshold {
        /// Shipment the reading belongs to
        shipment: ShipmentId,
        /// The offending reading, in centigrade
        temperature: Decimal,
        /// Which threshold was breached
        violation: TemperatureViolation,
        /// Human-readable description citing the breached threshold
        message: String,
    },

    /// A GPS reading placed the shipment at a position
    #[serde(rename_all = "camelCase")]
    ShipmentInPort {
        /// Shipment the reading belongs to
        shipment: ShipmentId,
        /// Position notice embedding LAT/LONG
        message: String,
    },

    /// Pickup arrival recorded after the appointment
    #[serde(rename_all = "camelCase")]
    ShipmentLatePickup {
        /// Shipment that was picked up late
        shipment: ShipmentId,
        /// Rounded minutes past the appointment
        minutes_late: i64,
        /// Notice stating minutes-late and the scheduled time
        message: String,
    },

    /// Delivery recorded; settlement figures attached
    #[serde(rename_all = "camelCase")]
    ShipmentHasArrived {
        /// Delivered shipment
        shipment: ShipmentId,
        /// Base payout before penalties
        shipment_amount: Decimal,
        /// Total penalty deducted
        penalty: Decimal,
        /// Arrival or lateness notice
        message: String,
    },
}

impl EventPayload {
    /// Unqualified event type name
    pub fn type_name(&self) -> &'static str {
        match self {
            EventPayload::TemperatureThreshold { .. } => "TemperatureThresholdEvent",
            EventPayload::ShipmentInPort { .. } => "ShipmentInPortEvent",
            EventPayload::ShipmentLatePickup { .. } => "ShipmentLatePickupEvent",
            EventPayload::ShipmentHasArrived { .. } => "ShipmentHasArrived",
        }
    }
}

/// Envelope around an event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    /// Unique event id
    pub event_id: Uuid,

    /// Fully-qualified type name, `<namespace>.<EventName>`
    pub event_type: String,

    /// The typed payload
    pub payload: EventPayload,
}

/// Constructs namespaced event envelopes
///
/// Stands in for the ledger substrate's object factory: the handlers hand it
/// a typed payload and get back an envelope stamped with the configured
/// namespace.
#[derive(Debug, Clone)]
pub struct EventFactory {
    namespace: String,
}

impl EventFactory {
    /// Create a factory for the given event namespace
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// The configured namespace
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Wrap a payload in a namespaced envelope
    pub fn event(&self, payload: EventPayload) -> DomainEvent {
        DomainEvent {
            event_id: Uuid::new_v4(),
            event_type: format!("{}.{}", self.namespace, payload.type_name()),
            payload,
        }
    }
}
