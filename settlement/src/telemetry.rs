//! Telemetry recorder
//!
//! Appends temperature and GPS readings to a shipment, detects out-of-band
//! temperatures against the contract band, and emits the corresponding
//! domain events. Reading sequences are append-only; replaying the same
//! reading appends again and emits again.

use crate::{error::Result, types::Outcome};
use freight_core::{
    Contract, EntityStore, EventEmitter, EventFactory, EventPayload, GpsReading, Shipment,
    TemperatureReading, TemperatureViolation,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Records sensor readings against a shipment
pub struct TelemetryRecorder {
    store: Arc<dyn EntityStore>,
    emitter: Arc<dyn EventEmitter>,
    factory: EventFactory,
}

impl TelemetryRecorder {
    /// Create a recorder bound to the given collaborators
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

    /// Append a temperature reading and flag threshold breaches
    ///
    /// A reading strictly below the contract minimum or strictly above the
    /// maximum emits a threshold event; readings exactly on a bound are in
    /// band. The shipment is persisted either way.
    pub async fn record_temperature(
        &self,
        shipment: &mut Shipment,
        contract: &Contract,
        reading: TemperatureReading,
    ) -> Result<Outcome> {
        let centigrade = reading.centigrade;
        shipment.temperature_readings.push(reading);

        let violation = if centigrade < contract.min_temperature {
            Some(TemperatureViolation::BelowThreshold)
        } else if centigrade > contract.max_temperature {
            Some(TemperatureViolation::AboveThreshold)
        } else {
            None
        };

        if let Some(violation) = violation {
            let message = match violation {
                TemperatureViolation::BelowThreshold => format!(
                    "Temperature threshold violated for shipment {}: {}C is below the minimum of {}C",
                    shipment.id, centigrade, contract.min_temperature
                ),
                TemperatureViolation::AboveThreshold => format!(
                    "Temperature threshold violated for shipment {}: {}C is above the maximum of {}C",
                    shipment.id, centigrade, contract.max_temperature
                ),
            };
            warn!(shipment = %shipment.id, %centigrade, "{}", violation);

            self.emitter
                .emit(self.factory.event(EventPayload::TemperatureThreshold {
                    shipment: shipment.id.clone(),
                    temperature: centigrade,
                    violation,
                    message,
                }))
                .await;
        } else {
            debug!(shipment = %shipment.id, %centigrade, "temperature reading in band");
        }

        self.store.save_shipment(shipment).await?;
        Ok(Outcome::TemperatureRecorded { violation })
    }

    /// Append a GPS reading and emit the in-port event
    ///
    /// Always emits; there is no business-rule branching on position.
    pub async fn record_gps(
        &self,
        shipment: &mut Shipment,
        reading: GpsReading,
    ) -> Result<Outcome> {
        let message = format!("Shipment has reached at {}", reading.position());
        shipment.gps_readings.push(reading);

        self.emitter
            .emit(self.factory.event(EventPayload::ShipmentInPort {
                shipment: shipment.id.clone(),
                message,
            }))
            .await;

        self.store.save_shipment(shipment).await?;
        Ok(Outcome::GpsRecorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freight_core::{
        ContractId, DomainEvent, MemoryRegistry, ParticipantId, RecordingEmitter, ShipmentId,
    };
    use rust_decimal::Decimal;

    fn test_contract() -> Contract {
        Contract {
            id: ContractId::new("CON-1"),
            unit_price: Decimal::from(10),
            min_temperature: Decimal::from(2),
            max_temperature: Decimal::from(8),
            min_temp_violation_penalty: Decimal::from(50),
            max_temp_violation_penalty: Decimal::from(60),
            pickup_late_fee: Decimal::from(100),
            delivery_late_fee: Decimal::from(200),
            broker_margin: Decimal::from(20),
            customer: ParticipantId::new("CUST-1"),
            broker: ParticipantId::new("BROK-1"),
            carrier: ParticipantId::new("CARR-1"),
        }
    }

    fn recorder() -> (TelemetryRecorder, Arc<MemoryRegistry>, Arc<RecordingEmitter>) {
        let store = Arc::new(MemoryRegistry::new());
        let emitter = Arc::new(RecordingEmitter::new());
        let recorder = TelemetryRecorder::new(
            store.clone(),
            emitter.clone(),
            EventFactory::new("org.test.freight"),
        );
        (recorder, store, emitter)
    }

    fn test_shipment() -> Shipment {
        Shipment::new(ShipmentId::new("SHIP-1"), ContractId::new("CON-1"), 100)
    }

    #[tokio::test]
    async fn test_reading_below_minimum_emits_violation() {
        let (recorder, store, emitter) = recorder();
        let contract = test_contract();
        let mut shipment = test_shipment();

        let outcome = recorder
            .record_temperature(
                &mut shipment,
                &contract,
                TemperatureReading {
                    centigrade: Decimal::from(1),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::TemperatureRecorded {
                violation: Some(TemperatureViolation::BelowThreshold)
            }
        );

        let events = emitter.events().await;
        assert_eq!(events.len(), 1);
        match &events[0] {
            DomainEvent {
                payload:
                    EventPayload::TemperatureThreshold {
                        violation, message, ..
                    },
                ..
            } => {
                assert_eq!(*violation, TemperatureViolation::BelowThreshold);
                assert!(message.contains("minimum of 2"));
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let saved = store.load_shipment(&shipment.id).await.unwrap();
        assert_eq!(saved.temperature_readings.len(), 1);
    }

    #[tokio::test]
    async fn test_boundary_readings_are_in_band() {
        let (recorder, _store, emitter) = recorder();
        let contract = test_contract();
        let mut shipment = test_shipment();

        for bound in [contract.min_temperature, contract.max_temperature] {
            let outcome = recorder
                .record_temperature(
                    &mut shipment,
                    &contract,
                    TemperatureReading { centigrade: bound },
                )
                .await
                .unwrap();
            assert_eq!(outcome, Outcome::TemperatureRecorded { violation: None });
        }

        assert!(emitter.events().await.is_empty());
        assert_eq!(shipment.temperature_readings.len(), 2);
    }

    #[tokio::test]
    async fn test_reading_above_maximum_emits_violation() {
        let (recorder, _store, emitter) = recorder();
        let contract = test_contract();
        let mut shipment = test_shipment();

        recorder
            .record_temperature(
                &mut shipment,
                &contract,
                TemperatureReading {
                    centigrade: Decimal::from(9),
                },
            )
            .await
            .unwrap();

        let events = emitter.events().await;
        assert_eq!(events.len(), 1);
        assert!(events[0].event_type.ends_with("TemperatureThresholdEvent"));
    }

    #[tokio::test]
    async fn test_gps_replay_appends_twice() {
        let (recorder, store, emitter) = recorder();
        let mut shipment = test_shipment();
        let reading = GpsReading {
            latitude: Decimal::new(407, 1),
            latitude_dir: "N".to_string(),
            longitude: Decimal::new(740, 1),
            longitude_dir: "W".to_string(),
        };

        recorder
            .record_gps(&mut shipment, reading.clone())
            .await
            .unwrap();
        recorder.record_gps(&mut shipment, reading).await.unwrap();

        let events = emitter.events().await;
        assert_eq!(events.len(), 2);
        match &events[0].payload {
            EventPayload::ShipmentInPort { message, .. } => {
                assert_eq!(message, "Shipment has reached at LAT:40.7N LONG:74.0W");
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let saved = store.load_shipment(&shipment.id).await.unwrap();
        assert_eq!(saved.gps_readings.len(), 2);
    }
}
