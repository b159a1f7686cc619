//! Shared fixtures for the integration tests

#![allow(dead_code)]

use edge_server::{Config, ServerState, Session, SessionInfo};
use rust_decimal::Decimal;
use shared::message::{EventPayload, Room};
use shared::models::{
    Actor, CustomerInfo, DiningTableCreate, ProductType, ProductUpsert, Role, TableSection,
};

pub const TABLE_5: i64 = 5;
pub const TABLE_8: i64 = 8;
pub const PICANHA: i64 = 100;
pub const GUARANA: i64 = 200;
pub const CPF: &str = "529.982.247-25";

pub fn admin() -> Actor {
    Actor::staff(1, "Admin", Role::Admin)
}

pub fn waiter() -> Actor {
    Actor::staff(7, "Carlos", Role::Waiter)
}

pub fn kitchen() -> Actor {
    Actor::staff(50, "Cozinha", Role::Kitchen)
}

pub fn bruna() -> CustomerInfo {
    CustomerInfo {
        name: "Bruna".into(),
        cpf: CPF.into(),
        phone: None,
        email: None,
    }
}

/// In-memory state with tables 5 and 8, a food and a beverage product
pub async fn seeded_state() -> ServerState {
    let state = ServerState::in_memory(Config::for_tests("./target/test-data")).unwrap();
    let coordinator = state.coordinator();
    for (id, number) in [(TABLE_5, "5"), (TABLE_8, "8")] {
        coordinator
            .create_table(
                DiningTableCreate {
                    id: Some(id),
                    number: number.into(),
                    section: TableSection::Main,
                },
                &admin(),
            )
            .await
            .unwrap();
    }
    for (id, name, price, product_type) in [
        (PICANHA, "Picanha", Decimal::new(8900, 2), ProductType::Food),
        (GUARANA, "Guaraná", Decimal::new(700, 2), ProductType::Beverage),
    ] {
        coordinator
            .upsert_product(
                ProductUpsert {
                    id: Some(id),
                    name: name.into(),
                    price,
                    product_type,
                    available: true,
                },
                &admin(),
            )
            .await
            .unwrap();
    }
    state
}

/// Connect a staff session already joined to `room`
pub fn staff_session(state: &ServerState, user_id: i64, role: Role, room: Room) -> Session {
    let session = state.gateway.connect(SessionInfo::staff(user_id, role));
    session.join(room).unwrap();
    session
}

/// Drain everything queued for a session
pub fn drain(session: &mut Session) -> Vec<EventPayload> {
    std::iter::from_fn(|| session.try_recv())
        .map(|event| event.payload)
        .collect()
}

pub fn names(events: &[EventPayload]) -> Vec<&'static str> {
    events.iter().map(|e| e.name()).collect()
}
