//! Wire transaction shapes and handler outcomes

use freight_core::TemperatureViolation;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inbound transaction against one shipment aggregate
///
/// Timestamps arrive as `YYYY-MM-DD HH:MM:SS` strings and are parsed before
/// any mutation; a malformed timestamp aborts the transaction outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Transaction {
    /// Carrier accepted the shipment
    #[serde(rename_all = "camelCase")]
    ShipmentAccepted {
        /// Shipment id
        shipment: String,
    },

    /// Freight picked up at the origin stop
    #[serde(rename_all = "camelCase")]
    ShipmentPickedUp {
        /// Shipment id
        shipment: String,
        /// Arrival time at the pickup stop
        actual_pickup_time: String,
    },

    /// Freight received by the customer; triggers settlement
    #[serde(rename_all = "camelCase")]
    ShipmentReceived {
        /// Shipment id
        shipment: String,
        /// Arrival time at the delivery stop
        actual_delivered_time: String,
    },

    /// Sensor temperature reading
    #[serde(rename_all = "camelCase")]
    TemperatureReading {
        /// Shipment id
        shipment: String,
        /// Temperature in centigrade
        centigrade: Decimal,
    },

    /// Sensor GPS reading
    #[serde(rename_all = "camelCase")]
    GpsReading {
        /// Shipment id
        shipment: String,
        /// Latitude in decimal degrees
        latitude: Decimal,
        /// Latitude hemisphere indicator (N/S)
        latitude_dir: String,
        /// Longitude in decimal degrees
        longitude: Decimal,
        /// Longitude hemisphere indicator (E/W)
        longitude_dir: String,
    },
}

impl Transaction {
    /// Shipment id this transaction targets
    pub fn shipment(&self) -> &str {
        match self {
            Transaction::ShipmentAccepted { shipment }
            | Transaction::ShipmentPickedUp { shipment, .. }
            | Transaction::ShipmentReceived { shipment, .. }
            | Transaction::TemperatureReading { shipment, .. }
            | Transaction::GpsReading { shipment, .. } => shipment,
        }
    }
}

/// Result of a pickup transaction
///
/// Missing stops are reported here rather than as errors so a structurally
/// incomplete shipment does not block processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickupOutcome {
    /// Arrival recorded on the pickup stop
    Recorded {
        /// Rounded minutes past the appointment, when late
        minutes_late: Option<i64>,
    },
    /// Shipment has no load stops at all; nothing recorded
    MissingLoadStops,
    /// No stop of type PICKUP; nothing recorded
    MissingPickupStop,
}

/// Figures produced by the delivery settlement pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementSummary {
    /// Base payout, unit price times unit count
    pub base_payout: Decimal,

    /// Total penalty deducted
    pub penalty: Decimal,

    /// Base payout minus penalty; may be negative
    pub net_payout: Decimal,

    /// Arrival or lateness notice carried on the settlement event
    pub message: String,
}

/// Outcome of one dispatched transaction
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Shipment accepted
    Accepted,
    /// Pickup processed
    PickedUp(PickupOutcome),
    /// Delivery settled
    Delivered(SettlementSummary),
    /// Temperature reading appended
    TemperatureRecorded {
        /// Threshold breach, if the reading was out of band
        violation: Option<TemperatureViolation>,
    },
    /// GPS reading appended
    GpsRecorded,
}
