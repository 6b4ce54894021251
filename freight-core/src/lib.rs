//! Freight ledger core
//!
//! Domain model and collaborator boundaries for the freight settlement rail.
//!
//! # Architecture
//!
//! The core is deliberately small: typed entities (shipments, contracts,
//! participants), temporal parsing for the fixed wire timestamp format, and
//! two narrow traits over the surrounding ledger substrate:
//!
//! 1. **Entity store**: load/save shipments, contracts, and participants
//! 2. **Event emitter**: fire-and-forget domain events
//!
//! All monetary and temperature arithmetic uses [`rust_decimal::Decimal`],
//! never floats, so penalty sums and balance splits are exact.
//!
//! # Example
//!
//! ```
//! use freight_core::time::parse_timestamp;
//!
//! let at = parse_timestamp("2023-01-01 10:15:00").unwrap();
//! assert_eq!(at.to_string(), "2023-01-01 10:15:00");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod error;
pub mod events;
pub mod registry;
pub mod time;
pub mod types;

// Re-exports
pub use error::{Error, Result};
pub use events::{DomainEvent, EventFactory, EventPayload, TemperatureViolation};
pub use registry::{EntityStore, EventEmitter, MemoryRegistry, RecordingEmitter};
pub use types::*;
