//! Core types for the freight ledger
//!
//! All types are designed for:
//! - Deterministic serialization (serde)
//! - Exact arithmetic (Decimal for money and temperature)
//! - Append-only telemetry sequences (always initialized, never optional)

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shipment identifier in the asset registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShipmentId(String);

impl ShipmentId {
    /// Create new shipment ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Contract identifier in the asset registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId(String);

impl ContractId {
    /// Create new contract ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Participant identifier in the participant registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create new participant ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shipment lifecycle status
///
/// Transitions are monotonic: CREATED → ACCEPTED → PICKEDUP → DELIVERED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ShipmentStatus {
    /// Shipment created, not yet accepted by a carrier
    Created = 1,
    /// Carrier accepted the shipment
    Accepted = 2,
    /// Freight picked up at the origin stop
    PickedUp = 3,
    /// Freight delivered, settlement complete
    Delivered = 4,
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShipmentStatus::Created => "CREATED",
            ShipmentStatus::Accepted => "ACCEPTED",
            ShipmentStatus::PickedUp => "PICKEDUP",
            ShipmentStatus::Delivered => "DELIVERED",
        };
        write!(f, "{}", s)
    }
}

/// Load stop kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopType {
    /// Origin stop where freight is loaded
    Pickup,
    /// Destination stop where freight is unloaded
    Delivery,
}

/// Scheduled pickup or delivery location/time
///
/// `actual_time` is absent until the corresponding milestone transaction
/// records the arrival.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadStop {
    /// Pickup or delivery
    pub stop_type: StopType,

    /// Scheduled appointment time
    pub appointment_time: NaiveDateTime,

    /// Recorded arrival time, if any
    pub actual_time: Option<NaiveDateTime>,
}

impl LoadStop {
    /// Create a scheduled stop with no recorded arrival
    pub fn scheduled(stop_type: StopType, appointment_time: NaiveDateTime) -> Self {
        Self {
            stop_type,
            appointment_time,
            actual_time: None,
        }
    }

    /// True when an arrival is recorded and it is after the appointment
    pub fn is_late(&self) -> bool {
        match self.actual_time {
            Some(actual) => actual > self.appointment_time,
            None => false,
        }
    }
}

/// A single temperature reading, immutable once recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    /// Temperature in centigrade
    pub centigrade: Decimal,
}

/// A single GPS reading, immutable once recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsReading {
    /// Latitude in decimal degrees
    pub latitude: Decimal,

    /// Latitude hemisphere indicator (N/S)
    pub latitude_dir: String,

    /// Longitude in decimal degrees
    pub longitude: Decimal,

    /// Longitude hemisphere indicator (E/W)
    pub longitude_dir: String,
}

impl GpsReading {
    /// Position string as embedded in the in-port event message
    pub fn position(&self) -> String {
        format!(
            "LAT:{}{} LONG:{}{}",
            self.latitude, self.latitude_dir, self.longitude, self.longitude_dir
        )
    }
}

/// Participant role in a freight contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantRole {
    /// Pays for the shipment
    Customer,
    /// Arranges the shipment, takes a margin
    Broker,
    /// Moves the freight
    Carrier,
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParticipantRole::Customer => "Customer",
            ParticipantRole::Broker => "Broker",
            ParticipantRole::Carrier => "Carrier",
        };
        write!(f, "{}", s)
    }
}

/// A settling party holding an account balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Registry id
    pub id: ParticipantId,

    /// Customer, broker, or carrier
    pub role: ParticipantRole,

    /// Current account balance (exact decimal)
    pub account_balance: Decimal,
}

/// Commercial terms binding customer, broker, and carrier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    /// Registry id
    pub id: ContractId,

    /// Payout per unit of freight
    pub unit_price: Decimal,

    /// Lower bound of the permitted temperature band (inclusive)
    pub min_temperature: Decimal,

    /// Upper bound of the permitted temperature band (inclusive)
    pub max_temperature: Decimal,

    /// Penalty per reading strictly below the band
    pub min_temp_violation_penalty: Decimal,

    /// Penalty per reading strictly above the band
    pub max_temp_violation_penalty: Decimal,

    /// Flat fee when pickup arrival is after the appointment
    pub pickup_late_fee: Decimal,

    /// Flat fee when delivery arrival is after the appointment
    pub delivery_late_fee: Decimal,

    /// Broker share of the net payout, in percent (0-100)
    pub broker_margin: Decimal,

    /// Customer participant
    pub customer: ParticipantId,

    /// Broker participant
    pub broker: ParticipantId,

    /// Carrier participant
    pub carrier: ParticipantId,
}

impl Contract {
    /// Check contract invariants
    pub fn validate(&self) -> Result<()> {
        if self.broker_margin < Decimal::ZERO || self.broker_margin > Decimal::from(100) {
            return Err(Error::InvariantViolation(format!(
                "broker margin {} outside [0, 100] on contract {}",
                self.broker_margin, self.id
            )));
        }
        Ok(())
    }

    /// Split a net payout into (broker credit, carrier credit)
    ///
    /// The carrier takes the remainder after the broker share, so the two
    /// credits sum to the net payout exactly.
    pub fn split_net(&self, net_payout: Decimal) -> (Decimal, Decimal) {
        let broker_credit = net_payout * self.broker_margin / Decimal::from(100);
        let carrier_credit = net_payout - broker_credit;
        (broker_credit, carrier_credit)
    }
}

/// A tracked freight movement under a contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    /// Registry id
    pub id: ShipmentId,

    /// Lifecycle status
    pub status: ShipmentStatus,

    /// Number of freight units
    pub unit_count: u64,

    /// Governing contract
    pub contract: ContractId,

    /// Accumulated temperature readings, append-only
    #[serde(default)]
    pub temperature_readings: Vec<TemperatureReading>,

    /// Accumulated GPS readings, append-only
    #[serde(default)]
    pub gps_readings: Vec<GpsReading>,

    /// At most one PICKUP and one DELIVERY stop
    #[serde(default)]
    pub load_stops: Vec<LoadStop>,

    /// Base payout stored at settlement
    pub total_amount: Decimal,

    /// Total penalty stored at settlement
    pub total_penalty: Decimal,
}

impl Shipment {
    /// Create a shipment in CREATED status with empty telemetry
    pub fn new(id: ShipmentId, contract: ContractId, unit_count: u64) -> Self {
        Self {
            id,
            status: ShipmentStatus::Created,
            unit_count,
            contract,
            temperature_readings: Vec::new(),
            gps_readings: Vec::new(),
            load_stops: Vec::new(),
            total_amount: Decimal::ZERO,
            total_penalty: Decimal::ZERO,
        }
    }

    /// The PICKUP stop, if present
    pub fn pickup_stop(&self) -> Option<&LoadStop> {
        self.load_stops
            .iter()
            .find(|ls| ls.stop_type == StopType::Pickup)
    }

    /// Mutable access to the PICKUP stop
    pub fn pickup_stop_mut(&mut self) -> Option<&mut LoadStop> {
        self.load_stops
            .iter_mut()
            .find(|ls| ls.stop_type == StopType::Pickup)
    }

    /// Mutable access to the DELIVERY stop
    pub fn delivery_stop_mut(&mut self) -> Option<&mut LoadStop> {
        self.load_stops
            .iter_mut()
            .find(|ls| ls.stop_type == StopType::Delivery)
    }
}
