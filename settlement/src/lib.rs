//! Freight settlement engine
//!
//! Deterministic settlement and violation detection for freight shipments on
//! a ledger: telemetry and milestone transactions mutate a shipment/contract
//! aggregate, accrue penalties, and — at delivery — transfer balances across
//! customer, broker, and carrier.
//!
//! # Transaction flow
//!
//! 1. **Dispatch**: an inbound [`Transaction`] is routed to exactly one
//!    handler; wire timestamps are parsed before any mutation
//! 2. **Mutation**: the handler appends readings or advances the shipment
//!    status in memory
//! 3. **Events**: domain events are emitted before persistence begins
//! 4. **Persistence**: each save is awaited in order; at delivery the order
//!    is customer, broker, carrier, shipment
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use freight_core::{MemoryRegistry, RecordingEmitter};
//! use settlement::{Config, SettlementEngine, Transaction};
//!
//! #[tokio::main]
//! async fn main() -> settlement::Result<()> {
//!     let engine = SettlementEngine::new(
//!         Config::default(),
//!         Arc::new(MemoryRegistry::new()),
//!         Arc::new(RecordingEmitter::new()),
//!     );
//!
//!     let outcome = engine
//!         .process(Transaction::ShipmentAccepted {
//!             shipment: "SHIP-1".to_string(),
//!         })
//!         .await?;
//!     println!("processed: {:?}", outcome);
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod engine;
pub mod error;
pub mod milestones;
pub mod telemetry;
pub mod types;

// Re-exports
pub use config::Config;
pub use engine::SettlementEngine;
pub use error::{Error, Result};
pub use types::*;
