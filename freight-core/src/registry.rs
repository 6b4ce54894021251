//! Collaborator boundaries: entity store and event emitter
//!
//! The surrounding ledger substrate owns persistence and the event bus. The
//! core reaches both through the traits here; [`MemoryRegistry`] and
//! [`RecordingEmitter`] are the in-process implementations used by tests and
//! the demo binary.

use crate::{
    error::{Error, Result},
    events::DomainEvent,
    types::{Contract, ContractId, Participant, ParticipantId, Shipment, ShipmentId},
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// Persistence boundary over the asset and participant registries
///
/// Saves acknowledge asynchronously; callers must await each save before
/// issuing a dependent one, because partially-applied transactions are
/// externally observable.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Load a shipment by id
    async fn load_shipment(&self, id: &ShipmentId) -> Result<Shipment>;

    /// Load a contract by id
    async fn load_contract(&self, id: &ContractId) -> Result<Contract>;

    /// Load a participant by id
    async fn load_participant(&self, id: &ParticipantId) -> Result<Participant>;

    /// Persist a shipment
    async fn save_shipment(&self, shipment: &Shipment) -> Result<()>;

    /// Persist a participant
    async fn save_participant(&self, participant: &Participant) -> Result<()>;
}

/// Event bus boundary, fire-and-forget
///
/// Handlers emit before the persistence chain begins, so an event may be
/// observed even when a later save fails.
#[async_trait]
pub trait EventEmitter: Send + Sync {
    /// Publish a domain event
    async fn emit(&self, event: DomainEvent);
}

/// In-memory entity store
///
/// Backs the demo binary and the test suites. A save budget can be set to
/// make saves past the budget fail, to exercise the partial-commit exposure
/// of the sequential persistence chain.
#[derive(Default)]
pub struct MemoryRegistry {
    shipments: RwLock<HashMap<ShipmentId, Shipment>>,
    contracts: RwLock<HashMap<ContractId, Contract>>,
    participants: RwLock<HashMap<ParticipantId, Participant>>,
    saves_done: RwLock<u64>,
    save_budget: RwLock<Option<u64>>,
}

impl MemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a shipment
    pub async fn insert_shipment(&self, shipment: Shipment) {
        self.shipments
            .write()
            .await
            .insert(shipment.id.clone(), shipment);
    }

    /// Seed a contract
    pub async fn insert_contract(&self, contract: Contract) {
        self.contracts
            .write()
            .await
            .insert(contract.id.clone(), contract);
    }

    /// Seed a participant
    pub async fn insert_participant(&self, participant: Participant) {
        self.participants
            .write()
            .await
            .insert(participant.id.clone(), participant);
    }

    /// Allow only the next `budget` saves to succeed
    pub async fn fail_saves_after(&self, budget: u64) {
        *self.save_budget.write().await = Some(budget);
        *self.saves_done.write().await = 0;
    }

    async fn charge_save(&self, what: &str) -> Result<()> {
        let mut done = self.saves_done.write().await;
        *done += 1;
        if let Some(budget) = *self.save_budget.read().await {
            if *done > budget {
                return Err(Error::Persistence(format!(
                    "save budget exhausted at {}",
                    what
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for MemoryRegistry {
    async fn load_shipment(&self, id: &ShipmentId) -> Result<Shipment> {
        self.shipments
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("shipment {}", id)))
    }

    async fn load_contract(&self, id: &ContractId) -> Result<Contract> {
        self.contracts
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("contract {}", id)))
    }

    async fn load_participant(&self, id: &ParticipantId) -> Result<Participant> {
        self.participants
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("participant {}", id)))
    }

    async fn save_shipment(&self, shipment: &Shipment) -> Result<()> {
        self.charge_save(shipment.id.as_str()).await?;
        self.shipments
            .write()
            .await
            .insert(shipment.id.clone(), shipment.clone());
        Ok(())
    }

    async fn save_participant(&self, participant: &Participant) -> Result<()> {
        self.charge_save(participant.id.as_str()).await?;
        self.participants
            .write()
            .await
            .insert(participant.id.clone(), participant.clone());
        Ok(())
    }
}

/// Emitter that records every event and logs it
#[derive(Default)]
pub struct RecordingEmitter {
    events: RwLock<Vec<DomainEvent>>,
}

impl RecordingEmitter {
    /// Create an empty emitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub async fn events(&self) -> Vec<DomainEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl EventEmitter for RecordingEmitter {
    async fn emit(&self, event: DomainEvent) {
        info!(event_type = %event.event_type, "emitting domain event");
        self.events.write().await.push(event);
    }
}
