//! Settlement engine and transaction dispatcher
//!
//! The engine is the front door for inbound transactions: it parses wire
//! timestamps before any mutation, loads the shipment aggregate through the
//! entity store, routes to exactly one handler, and runs the delivery
//! settlement pass.
//!
//! # Settlement pass
//!
//! On delivery the engine aggregates violation counts over the entire
//! accumulated reading sequence, adds lateness fees from the load stops,
//! nets the payout, and moves balances:
//!
//! ```text
//! base    = unit_price × unit_count
//! penalty = below×min_penalty + above×max_penalty + late fees
//! net     = base − penalty        (may be negative, no floor)
//!
//! customer −= net
//! broker   += net × margin/100
//! carrier  += net − broker credit
//! ```
//!
//! The three balance deltas conserve exactly. Persistence runs after the
//! settlement event is emitted, in the order customer, broker, carrier,
//! shipment, each save awaited; a failed save aborts the chain and leaves
//! earlier saves committed.

use crate::{
    config::Config,
    error::Result,
    milestones::MilestoneTransitioner,
    telemetry::TelemetryRecorder,
    types::{Outcome, SettlementSummary, Transaction},
};
use chrono::NaiveDateTime;
use freight_core::{
    time::{minutes_between, parse_timestamp},
    Contract, ContractId, EntityStore, EventEmitter, EventFactory, EventPayload, GpsReading,
    Shipment, ShipmentId, ShipmentStatus, TemperatureReading,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// Default arrival notice when delivery is on time or stops are missing
const ARRIVAL_MESSAGE: &str = "Shipment has arrived at the destination";

/// Settlement engine
pub struct SettlementEngine {
    /// Entity store boundary
    store: Arc<dyn EntityStore>,

    /// Event bus boundary
    emitter: Arc<dyn EventEmitter>,

    /// Namespaced event construction
    factory: EventFactory,

    /// Telemetry recorder
    telemetry: TelemetryRecorder,

    /// Milestone transitioner
    milestones: MilestoneTransitioner,
}

impl SettlementEngine {
    /// Create a new settlement engine
    pub fn new(
        config: Config,
        store: Arc<dyn EntityStore>,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        let factory = EventFactory::new(config.namespace.clone());
        let telemetry =
            TelemetryRecorder::new(store.clone(), emitter.clone(), factory.clone());
        let milestones =
            MilestoneTransitioner::new(store.clone(), emitter.clone(), factory.clone());

        Self {
            store,
            emitter,
            factory,
            telemetry,
            milestones,
        }
    }

    /// Dispatch one inbound transaction to its handler
    ///
    /// Wire timestamps are parsed before the shipment is loaded, so a
    /// malformed timestamp aborts with no mutation and no persistence.
    pub async fn process(&self, transaction: Transaction) -> Result<Outcome> {
        let shipment_id = ShipmentId::new(transaction.shipment());

        match transaction {
            Transaction::ShipmentAccepted { .. } => {
                let mut shipment = self.store.load_shipment(&shipment_id).await?;
                self.milestones.accept(&mut shipment).await?;
                Ok(Outcome::Accepted)
            }

            Transaction::ShipmentPickedUp {
                actual_pickup_time, ..
            } => {
                let actual = parse_timestamp(&actual_pickup_time)?;
                let mut shipment = self.store.load_shipment(&shipment_id).await?;
                let outcome = self.milestones.pickup(&mut shipment, actual).await?;
                Ok(Outcome::PickedUp(outcome))
            }

            Transaction::ShipmentReceived {
                actual_delivered_time,
                ..
            } => {
                let actual = parse_timestamp(&actual_delivered_time)?;
                let mut shipment = self.store.load_shipment(&shipment_id).await?;
                let contract = self.load_contract(&shipment.contract).await?;
                let summary = self.settle(&mut shipment, &contract, actual).await?;
                Ok(Outcome::Delivered(summary))
            }

            Transaction::TemperatureReading { centigrade, .. } => {
                let mut shipment = self.store.load_shipment(&shipment_id).await?;
                let contract = self.load_contract(&shipment.contract).await?;
                self.telemetry
                    .record_temperature(&mut shipment, &contract, TemperatureReading { centigrade })
                    .await
            }

            Transaction::GpsReading {
                latitude,
                latitude_dir,
                longitude,
                longitude_dir,
                ..
            } => {
                let mut shipment = self.store.load_shipment(&shipment_id).await?;
                self.telemetry
                    .record_gps(
                        &mut shipment,
                        GpsReading {
                            latitude,
                            latitude_dir,
                            longitude,
                            longitude_dir,
                        },
                    )
                    .await
            }
        }
    }

    async fn load_contract(&self, id: &ContractId) -> Result<Contract> {
        let contract = self.store.load_contract(id).await?;
        contract.validate()?;
        Ok(contract)
    }

    /// Run the delivery settlement pass
    ///
    /// Penalties are computed over the entire accumulated reading sequence
    /// and the load stops; the net payout (which may be negative) is moved
    /// from the customer to broker and carrier per the contract margin.
    pub async fn settle(
        &self,
        shipment: &mut Shipment,
        contract: &Contract,
        actual_delivered_time: NaiveDateTime,
    ) -> Result<SettlementSummary> {
        shipment.status = ShipmentStatus::Delivered;

        let base_payout = contract.unit_price * Decimal::from(shipment.unit_count);
        let mut penalty = Decimal::ZERO;

        // Temperature penalties over the full accumulated sequence.
        let below_count = shipment
            .temperature_readings
            .iter()
            .filter(|r| r.centigrade < contract.min_temperature)
            .count();
        let above_count = shipment
            .temperature_readings
            .iter()
            .filter(|r| r.centigrade > contract.max_temperature)
            .count();

        if below_count > 0 {
            let below_penalty =
                Decimal::from(below_count as u64) * contract.min_temp_violation_penalty;
            info!(shipment = %shipment.id, below_count, %below_penalty, "minimum temperature penalty");
            penalty += below_penalty;
        }
        if above_count > 0 {
            let above_penalty =
                Decimal::from(above_count as u64) * contract.max_temp_violation_penalty;
            info!(shipment = %shipment.id, above_count, %above_penalty, "maximum temperature penalty");
            penalty += above_penalty;
        }

        // Lateness fees from the load stops. A shipment without stops skips
        // the whole step, non-fatally.
        let mut message = ARRIVAL_MESSAGE.to_string();
        if !shipment.load_stops.is_empty() {
            if let Some(pickup) = shipment.pickup_stop() {
                if pickup.is_late() {
                    penalty += contract.pickup_late_fee;
                }
            }

            if let Some(delivery) = shipment.delivery_stop_mut() {
                delivery.actual_time = Some(actual_delivered_time);
                if actual_delivered_time > delivery.appointment_time {
                    penalty += contract.delivery_late_fee;
                    let minutes =
                        minutes_between(delivery.appointment_time, actual_delivered_time);
                    message = format!(
                        "Shipment delivered {} minutes late (scheduled {})",
                        minutes, delivery.appointment_time
                    );
                }
            }
        }

        // Net payout may be negative; no floor is enforced.
        let net_payout = base_payout - penalty;
        let (broker_credit, carrier_credit) = contract.split_net(net_payout);

        let mut customer = self.store.load_participant(&contract.customer).await?;
        let mut broker = self.store.load_participant(&contract.broker).await?;
        let mut carrier = self.store.load_participant(&contract.carrier).await?;

        customer.account_balance -= net_payout;
        broker.account_balance += broker_credit;
        carrier.account_balance += carrier_credit;

        shipment.total_amount = base_payout;
        shipment.total_penalty = penalty;

        info!(
            shipment = %shipment.id,
            %base_payout,
            %penalty,
            %net_payout,
            "shipment delivered, settling"
        );

        // Events precede the persistence chain; an event may be observed
        // even when a later save fails.
        self.emitter
            .emit(self.factory.event(EventPayload::ShipmentHasArrived {
                shipment: shipment.id.clone(),
                shipment_amount: base_payout,
                penalty,
                message: message.clone(),
            }))
            .await;

        // Each save acknowledges before the next; a failure here leaves the
        // earlier saves committed.
        self.store.save_participant(&customer).await?;
        self.store.save_participant(&broker).await?;
        self.store.save_participant(&carrier).await?;
        self.store.save_shipment(shipment).await?;

        Ok(SettlementSummary {
            base_payout,
            penalty,
            net_payout,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freight_core::{
        Error as CoreError, LoadStop, MemoryRegistry, Participant, ParticipantId,
        ParticipantRole, RecordingEmitter, StopType,
    };

    struct Fixture {
        engine: SettlementEngine,
        store: Arc<MemoryRegistry>,
        emitter: Arc<RecordingEmitter>,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryRegistry::new());
        let emitter = Arc::new(RecordingEmitter::new());

        for (id, role) in [
            ("CUST-1", ParticipantRole::Customer),
            ("BROK-1", ParticipantRole::Broker),
            ("CARR-1", ParticipantRole::Carrier),
        ] {
            store
                .insert_participant(Participant {
                    id: ParticipantId::new(id),
                    role,
                    account_balance: Decimal::ZERO,
                })
                .await;
        }

        store
            .insert_contract(Contract {
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
            })
            .await;

        let engine = SettlementEngine::new(
            Config::default(),
            store.clone(),
            emitter.clone(),
        );
        Fixture {
            engine,
            store,
            emitter,
        }
    }

    fn base_shipment() -> Shipment {
        Shipment::new(ShipmentId::new("SHIP-1"), ContractId::new("CON-1"), 100)
    }

    async fn balance(store: &MemoryRegistry, id: &str) -> Decimal {
        store
            .load_participant(&ParticipantId::new(id))
            .await
            .unwrap()
            .account_balance
    }

    #[tokio::test]
    async fn test_settle_without_stops_uses_base_and_temperature_only() {
        let fx = fixture().await;
        let contract = fx.engine.load_contract(&ContractId::new("CON-1")).await.unwrap();

        let mut shipment = base_shipment();
        shipment.temperature_readings.push(TemperatureReading {
            centigrade: Decimal::from(1), // one reading at min − 1
        });

        let delivered_at = parse_timestamp("2023-01-05 12:00:00").unwrap();
        let summary = fx
            .engine
            .settle(&mut shipment, &contract, delivered_at)
            .await
            .unwrap();

        assert_eq!(summary.base_payout, Decimal::from(1000));
        assert_eq!(summary.penalty, Decimal::from(50));
        assert_eq!(summary.net_payout, Decimal::from(950));
        assert_eq!(summary.message, ARRIVAL_MESSAGE);

        assert_eq!(balance(&fx.store, "CUST-1").await, Decimal::from(-950));
        assert_eq!(balance(&fx.store, "BROK-1").await, Decimal::from(190));
        assert_eq!(balance(&fx.store, "CARR-1").await, Decimal::from(760));

        let saved = fx.store.load_shipment(&shipment.id).await.unwrap();
        assert_eq!(saved.status, ShipmentStatus::Delivered);
        assert_eq!(saved.total_amount, Decimal::from(1000));
        assert_eq!(saved.total_penalty, Decimal::from(50));
    }

    #[tokio::test]
    async fn test_settle_counts_full_accumulated_sequence() {
        let fx = fixture().await;
        let contract = fx.engine.load_contract(&ContractId::new("CON-1")).await.unwrap();

        let mut shipment = base_shipment();
        for c in [1, 0, 9, 5, 2, 8] {
            shipment.temperature_readings.push(TemperatureReading {
                centigrade: Decimal::from(c),
            });
        }

        let delivered_at = parse_timestamp("2023-01-05 12:00:00").unwrap();
        let summary = fx
            .engine
            .settle(&mut shipment, &contract, delivered_at)
            .await
            .unwrap();

        // Two below (1, 0), one above (9), boundaries in band.
        assert_eq!(summary.penalty, Decimal::from(2 * 50 + 60));
    }

    #[tokio::test]
    async fn test_settle_applies_late_fees_and_message() {
        let fx = fixture().await;
        let contract = fx.engine.load_contract(&ContractId::new("CON-1")).await.unwrap();

        let mut shipment = base_shipment();
        let mut pickup = LoadStop::scheduled(
            StopType::Pickup,
            parse_timestamp("2023-01-01 10:00:00").unwrap(),
        );
        pickup.actual_time = Some(parse_timestamp("2023-01-01 10:30:00").unwrap());
        shipment.load_stops.push(pickup);
        shipment.load_stops.push(LoadStop::scheduled(
            StopType::Delivery,
            parse_timestamp("2023-01-05 12:00:00").unwrap(),
        ));

        let delivered_at = parse_timestamp("2023-01-05 12:45:00").unwrap();
        let summary = fx
            .engine
            .settle(&mut shipment, &contract, delivered_at)
            .await
            .unwrap();

        // Pickup fee 100 + delivery fee 200.
        assert_eq!(summary.penalty, Decimal::from(300));
        assert!(summary.message.contains("45 minutes"));

        let saved = fx.store.load_shipment(&shipment.id).await.unwrap();
        let delivery = saved
            .load_stops
            .iter()
            .find(|ls| ls.stop_type == StopType::Delivery)
            .unwrap();
        assert_eq!(delivery.actual_time, Some(delivered_at));
    }

    #[tokio::test]
    async fn test_net_payout_can_go_negative() {
        let fx = fixture().await;
        let contract = fx.engine.load_contract(&ContractId::new("CON-1")).await.unwrap();

        let mut shipment =
            Shipment::new(ShipmentId::new("SHIP-1"), ContractId::new("CON-1"), 1);
        // Base payout 10, penalties 3 × 50 = 150.
        for _ in 0..3 {
            shipment.temperature_readings.push(TemperatureReading {
                centigrade: Decimal::from(0),
            });
        }

        let delivered_at = parse_timestamp("2023-01-05 12:00:00").unwrap();
        let summary = fx
            .engine
            .settle(&mut shipment, &contract, delivered_at)
            .await
            .unwrap();

        assert_eq!(summary.net_payout, Decimal::from(-140));
        // Conservation holds for negative nets too.
        assert_eq!(balance(&fx.store, "CUST-1").await, Decimal::from(140));
        assert_eq!(
            balance(&fx.store, "BROK-1").await + balance(&fx.store, "CARR-1").await,
            Decimal::from(-140)
        );
    }

    #[tokio::test]
    async fn test_persistence_failure_leaves_earlier_saves_committed() {
        let fx = fixture().await;
        let contract = fx.engine.load_contract(&ContractId::new("CON-1")).await.unwrap();
        let mut shipment = base_shipment();

        // Customer save succeeds, broker save fails.
        fx.store.fail_saves_after(1).await;

        let delivered_at = parse_timestamp("2023-01-05 12:00:00").unwrap();
        let result = fx.engine.settle(&mut shipment, &contract, delivered_at).await;

        assert!(matches!(
            result,
            Err(crate::Error::Core(CoreError::Persistence(_)))
        ));
        // Customer debit committed, broker credit lost, shipment not saved.
        assert_eq!(balance(&fx.store, "CUST-1").await, Decimal::from(-1000));
        assert_eq!(balance(&fx.store, "BROK-1").await, Decimal::ZERO);
        assert!(fx.store.load_shipment(&shipment.id).await.is_err());
        // The arrival event was already emitted before the chain began.
        assert_eq!(fx.emitter.events().await.len(), 1);
    }
}
