use super::*;
use crate::realtime::PublishReport;
use crate::store::RedbEntityStore;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use shared::models::{
    CallStatus, DiningTableCreate, ItemStatus, OrderStatus, PaymentMethod, ProductType,
    ProductUpsert, TableSection, TableStatus,
};

mod test_concurrency;
mod test_tables;

const TABLE_5: i64 = 5;
const TABLE_8: i64 = 8;
const FEIJOADA: i64 = 100;
const CAIPIRINHA: i64 = 200;
const SOLD_OUT: i64 = 300;
const CPF: &str = "123.456.789-09";

/// Records every published payload in order
#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<EventPayload>>,
}

impl EventSink for RecordingSink {
    fn publish(&self, payload: EventPayload) -> PublishReport {
        let mut events = self.events.lock();
        events.push(payload);
        PublishReport {
            seq: events.len() as u64,
            ..Default::default()
        }
    }
}

impl RecordingSink {
    fn take(&self) -> Vec<EventPayload> {
        std::mem::take(&mut *self.events.lock())
    }

    fn names(&self) -> Vec<&'static str> {
        self.take().iter().map(|e| e.name()).collect()
    }
}

struct Harness {
    coordinator: Arc<LifecycleCoordinator>,
    events: Arc<RecordingSink>,
}

fn admin() -> Actor {
    Actor::staff(1, "Admin", Role::Admin)
}

fn manager() -> Actor {
    Actor::staff(2, "Manager", Role::Manager)
}

fn waiter(id: i64) -> Actor {
    Actor::staff(id, format!("Waiter {}", id), Role::Waiter)
}

fn kitchen() -> Actor {
    Actor::staff(50, "Kitchen", Role::Kitchen)
}

fn customer() -> Actor {
    Actor::customer("Ana")
}

fn ana() -> CustomerInfo {
    CustomerInfo {
        name: "Ana".to_string(),
        cpf: CPF.to_string(),
        phone: None,
        email: None,
    }
}

async fn create_test_coordinator_with_timeout(timeout: Duration) -> Harness {
    let store = Arc::new(RedbEntityStore::open_in_memory().unwrap());
    let events = Arc::new(RecordingSink::default());
    let coordinator = Arc::new(LifecycleCoordinator::new(store, events.clone(), timeout));

    for (id, number) in [(TABLE_5, "5"), (TABLE_8, "8")] {
        coordinator
            .create_table(
                DiningTableCreate {
                    id: Some(id),
                    number: number.to_string(),
                    section: TableSection::Main,
                },
                &admin(),
            )
            .await
            .unwrap();
    }
    for (id, name, price, product_type, available) in [
        (FEIJOADA, "Feijoada", Decimal::new(4000, 2), ProductType::Food, true),
        (CAIPIRINHA, "Caipirinha", Decimal::new(850, 2), ProductType::Beverage, true),
        (SOLD_OUT, "Moqueca", Decimal::new(5500, 2), ProductType::Food, false),
    ] {
        coordinator
            .upsert_product(
                ProductUpsert {
                    id: Some(id),
                    name: name.to_string(),
                    price,
                    product_type,
                    available,
                },
                &admin(),
            )
            .await
            .unwrap();
    }
    events.take();

    Harness {
        coordinator,
        events,
    }
}

async fn create_test_coordinator() -> Harness {
    create_test_coordinator_with_timeout(Duration::from_secs(2)).await
}

// ========================================================================
// Helper: open a table and add items
// ========================================================================

async fn open_staff_table(h: &Harness, table_id: i64) -> Order {
    h.coordinator
        .open_table(
            table_id,
            OpenTable {
                occupants: 2,
                ..Default::default()
            },
            &waiter(7),
        )
        .await
        .unwrap()
}

async fn open_customer_table(h: &Harness, table_id: i64) -> Order {
    let table = h.coordinator.get_table(table_id).await.unwrap();
    h.coordinator
        .open_table_by_qr(&table.qr_token, 2, ana())
        .await
        .unwrap()
}

fn staff_item(product_id: i64, quantity: u32) -> AddItem {
    AddItem {
        product_id,
        quantity,
        notes: None,
        customer_cpf: None,
    }
}

fn customer_item(product_id: i64, quantity: u32) -> AddItem {
    AddItem {
        customer_cpf: Some(CPF.to_string()),
        ..staff_item(product_id, quantity)
    }
}

async fn add(h: &Harness, order_id: i64, product_id: i64, quantity: u32) -> OrderItem {
    h.coordinator
        .add_item(order_id, staff_item(product_id, quantity), &waiter(7))
        .await
        .unwrap()
}

/// Walk an item to `ready` as front-of-house
async fn make_ready(h: &Harness, item_id: i64) {
    for status in [ItemStatus::Preparing, ItemStatus::Ready] {
        h.coordinator
            .change_item_status(item_id, status, &waiter(7))
            .await
            .unwrap();
    }
}
