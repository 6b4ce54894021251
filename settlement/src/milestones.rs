//! Milestone transitioner
//!
//! Advances shipment status through ACCEPTED and PICKEDUP and records actual
//! arrival times on load stops. Delivery is handled by the settlement engine
//! since it triggers the full settlement pass.

use crate::{
    error::Result,
    types::PickupOutcome,
};
use freight_core::{
    time::minutes_between, EntityStore, EventEmitter, EventFactory, EventPayload, Shipment,
    ShipmentStatus,
};
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{info, warn};

/// Advances shipment lifecycle status
pub struct MilestoneTransitioner {
    store: Arc<dyn EntityStore>,
    emitter: Arc<dyn EventEmitter>,
    factory: EventFactory,
}

impl MilestoneTransitioner {
    /// Create a transitioner bound to the given collaborators
    pub fn new(
        store: Arc<dyn EntityStore>,
        emitter: Arc<dyn EventEmitter>,
        factory: EventFactory,
    ) -> Self {
        Self {
            store,
            emitter,
            factory,
        }
    }

    /// Mark the shipment ACCEPTED and persist
    ///
    /// No precondition on the prior status; a DELIVERED shipment can be
    /// re-accepted. Tightening this is an open design question.
    pub async fn accept(&self, shipment: &mut Shipment) -> Result<()> {
        shipment.status = ShipmentStatus::Accepted;
        info!(shipment = %shipment.id, "shipment accepted");
        self.store.save_shipment(shipment).await?;
        Ok(())
    }

    /// Mark the shipment PICKEDUP and stamp the pickup stop
    ///
    /// A shipment without load stops, or without a PICKUP stop, reports the
    /// missing structure as a non-fatal outcome and leaves the registry
    /// untouched. A late arrival emits a late-pickup event; the shipment is
    /// persisted whether late or not.
    pub async fn pickup(
        &self,
        shipment: &mut Shipment,
        actual_pickup_time: NaiveDateTime,
    ) -> Result<PickupOutcome> {
        shipment.status = ShipmentStatus::PickedUp;

        if shipment.load_stops.is_empty() {
            warn!(shipment = %shipment.id, "load stops not defined, pickup not recorded");
            return Ok(PickupOutcome::MissingLoadStops);
        }

        let appointment_time = match shipment.pickup_stop_mut() {
            Some(stop) => {
                stop.actual_time = Some(actual_pickup_time);
                stop.appointment_time
            }
            None => {
                warn!(shipment = %shipment.id, "pickup stop not defined, pickup not recorded");
                return Ok(PickupOutcome::MissingPickupStop);
            }
        };

        let minutes_late = if actual_pickup_time > appointment_time {
            let minutes = minutes_between(appointment_time, actual_pickup_time);
            let message = format!(
                "Shipment picked up {} minutes late (scheduled {})",
                minutes, appointment_time
            );
            self.emitter
                .emit(self.factory.event(EventPayload::ShipmentLatePickup {
                    shipment: shipment.id.clone(),
                    minutes_late: minutes,
                    message,
                }))
                .await;
            Some(minutes)
        } else {
            None
        };

        self.store.save_shipment(shipment).await?;
        Ok(PickupOutcome::Recorded { minutes_late })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freight_core::{
        time::parse_timestamp, ContractId, LoadStop, MemoryRegistry, RecordingEmitter, ShipmentId,
        StopType,
    };

    fn transitioner() -> (
        MilestoneTransitioner,
        Arc<MemoryRegistry>,
        Arc<RecordingEmitter>,
    ) {
        let store = Arc::new(MemoryRegistry::new());
        let emitter = Arc::new(RecordingEmitter::new());
        let transitioner = MilestoneTransitioner::new(
            store.clone(),
            emitter.clone(),
            EventFactory::new("org.test.freight"),
        );
        (transitioner, store, emitter)
    }

    fn shipment_with_pickup_at(appointment: &str) -> Shipment {
        let mut shipment =
            Shipment::new(ShipmentId::new("SHIP-1"), ContractId::new("CON-1"), 100);
        shipment.load_stops.push(LoadStop::scheduled(
            StopType::Pickup,
            parse_timestamp(appointment).unwrap(),
        ));
        shipment
    }

    #[tokio::test]
    async fn test_accept_is_permissive() {
        let (transitioner, store, _) = transitioner();
        let mut shipment =
            Shipment::new(ShipmentId::new("SHIP-1"), ContractId::new("CON-1"), 100);
        shipment.status = ShipmentStatus::Delivered;

        transitioner.accept(&mut shipment).await.unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Accepted);

        let saved = store.load_shipment(&shipment.id).await.unwrap();
        assert_eq!(saved.status, ShipmentStatus::Accepted);
    }

    #[tokio::test]
    async fn test_on_time_pickup_emits_nothing() {
        let (transitioner, _, emitter) = transitioner();
        let mut shipment = shipment_with_pickup_at("2023-01-01 10:00:00");

        let outcome = transitioner
            .pickup(&mut shipment, parse_timestamp("2023-01-01 09:55:00").unwrap())
            .await
            .unwrap();

        assert_eq!(outcome, PickupOutcome::Recorded { minutes_late: None });
        assert!(emitter.events().await.is_empty());
        assert!(shipment.pickup_stop().unwrap().actual_time.is_some());
    }

    #[tokio::test]
    async fn test_late_pickup_reports_minutes() {
        let (transitioner, _, emitter) = transitioner();
        let mut shipment = shipment_with_pickup_at("2023-01-01 10:00:00");

        let outcome = transitioner
            .pickup(&mut shipment, parse_timestamp("2023-01-01 10:15:00").unwrap())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PickupOutcome::Recorded {
                minutes_late: Some(15)
            }
        );

        let events = emitter.events().await;
        assert_eq!(events.len(), 1);
        match &events[0].payload {
            EventPayload::ShipmentLatePickup {
                minutes_late,
                message,
                ..
            } => {
                assert_eq!(*minutes_late, 15);
                assert!(message.contains("15 minutes"));
                assert!(message.contains("2023-01-01 10:00:00"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pickup_without_stops_is_non_fatal() {
        let (transitioner, store, _) = transitioner();
        let mut shipment =
            Shipment::new(ShipmentId::new("SHIP-1"), ContractId::new("CON-1"), 100);

        let outcome = transitioner
            .pickup(&mut shipment, parse_timestamp("2023-01-01 10:00:00").unwrap())
            .await
            .unwrap();

        assert_eq!(outcome, PickupOutcome::MissingLoadStops);
        // Nothing recorded, nothing persisted.
        assert!(store.load_shipment(&shipment.id).await.is_err());
    }

    #[tokio::test]
    async fn test_pickup_without_pickup_stop_is_non_fatal() {
        let (transitioner, _, _) = transitioner();
        let mut shipment =
            Shipment::new(ShipmentId::new("SHIP-1"), ContractId::new("CON-1"), 100);
        shipment.load_stops.push(LoadStop::scheduled(
            StopType::Delivery,
            parse_timestamp("2023-01-02 10:00:00").unwrap(),
        ));

        let outcome = transitioner
            .pickup(&mut shipment, parse_timestamp("2023-01-01 10:00:00").unwrap())
            .await
            .unwrap();

        assert_eq!(outcome, PickupOutcome::MissingPickupStop);
    }
}
