//! End-to-end demo of the freight settlement rail
//!
//! Seeds an in-memory registry with one contract and one shipment, then
//! drives the full lifecycle: accept, telemetry, pickup, delivery. Prints
//! the emitted events and final balances.

use anyhow::Result;
use freight_core::{
    time::parse_timestamp, Contract, ContractId, EntityStore, LoadStop, MemoryRegistry,
    Participant, ParticipantId, ParticipantRole, RecordingEmitter, Shipment, ShipmentId, StopType,
};
use rust_decimal::Decimal;
use settlement::{Config, SettlementEngine, Transaction};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let store = Arc::new(MemoryRegistry::new());
    let emitter = Arc::new(RecordingEmitter::new());

    seed(&store).await?;

    let engine = SettlementEngine::new(Config::default(), store.clone(), emitter.clone());

    let transactions = vec![
        Transaction::ShipmentAccepted {
            shipment: "SHIP-1".to_string(),
        },
        Transaction::TemperatureReading {
            shipment: "SHIP-1".to_string(),
            centigrade: Decimal::from(4),
        },
        Transaction::TemperatureReading {
            shipment: "SHIP-1".to_string(),
            centigrade: Decimal::from(1),
        },
        Transaction::GpsReading {
            shipment: "SHIP-1".to_string(),
            latitude: Decimal::new(407, 1),
            latitude_dir: "N".to_string(),
            longitude: Decimal::new(740, 1),
            longitude_dir: "W".to_string(),
        },
        Transaction::ShipmentPickedUp {
            shipment: "SHIP-1".to_string(),
            actual_pickup_time: "2023-01-01 10:15:00".to_string(),
        },
        Transaction::ShipmentReceived {
            shipment: "SHIP-1".to_string(),
            actual_delivered_time: "2023-01-05 11:30:00".to_string(),
        },
    ];

    for transaction in transactions {
        let outcome = engine.process(transaction).await?;
        println!("outcome: {:?}", outcome);
    }

    println!();
    for event in emitter.events().await {
        println!("event {}: {:?}", event.event_type, event.payload);
    }

    println!();
    for id in ["CUST-1", "BROK-1", "CARR-1"] {
        let participant = store.load_participant(&ParticipantId::new(id)).await?;
        println!(
            "{} ({}) balance: {}",
            id, participant.role, participant.account_balance
        );
    }

    Ok(())
}

async fn seed(store: &MemoryRegistry) -> Result<()> {
    for (id, role) in [
        ("CUST-1", ParticipantRole::Customer),
        ("BROK-1", ParticipantRole::Broker),
        ("CARR-1", ParticipantRole::Carrier),
    ] {
        store
            .insert_participant(Participant {
                id: ParticipantId::new(id),
                role,
                account_balance: Decimal::from(10_000),
            })
            .await;
    }

    let contract = Contract {
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
    };
    contract.validate()?;
    store.insert_contract(contract).await;

    let mut shipment = Shipment::new(ShipmentId::new("SHIP-1"), ContractId::new("CON-1"), 100);
    shipment.load_stops.push(LoadStop::scheduled(
        StopType::Pickup,
        parse_timestamp("2023-01-01 10:00:00")?,
    ));
    shipment.load_stops.push(LoadStop::scheduled(
        StopType::Delivery,
        parse_timestamp("2023-01-05 12:00:00")?,
    ));
    store.insert_shipment(shipment).await;

    Ok(())
}
