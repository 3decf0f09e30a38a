//! PostgreSQL integration tests.
//!
//! These tests share one PostgreSQL container and are ignored by default
//! because they need a running Docker daemon. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use chrono::Utc;
use common::{StoreId, UserId};
use domain::{BasketLine, DiscountRate, Money, Order, OrderLine, Payment, PaymentStatus, User};
use serial_test::serial;
use sqlx::PgPool;
use store::{BasketStore, MarketStore, PostgresStore, StoreError};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info; the container stays alive for all tests.
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn setup_store() -> PostgresStore {
    let info = get_container_info().await;
    let pool = PgPool::connect(&info.connection_string).await.unwrap();
    let store = PostgresStore::new(pool);
    store.run_migrations().await.unwrap();
    store
}

async fn seeded_user(store: &PostgresStore) -> UserId {
    let user_id = UserId::new();
    store
        .save_user(User::new(user_id, "integration-user"))
        .await
        .unwrap();
    user_id
}

fn sample_order(user_id: UserId) -> Order {
    Order::from_basket(
        user_id,
        vec![BasketLine::new(
            StoreId::new(),
            OrderLine::new("SKU-001", "Fried Chicken", 2, Money::from_cents(5000)),
        )],
        DiscountRate::ZERO,
    )
    .unwrap()
}

#[tokio::test]
#[serial]
#[ignore = "requires a running Docker daemon"]
async fn order_roundtrip() {
    let store = setup_store().await;
    let user_id = seeded_user(&store).await;

    let order = sample_order(user_id);
    let version = store.save_order(&order).await.unwrap();
    assert_eq!(version, 1);

    let loaded = store.load_order(order.id()).await.unwrap();
    assert_eq!(loaded.id(), order.id());
    assert_eq!(loaded.lines().len(), 1);
    assert_eq!(loaded.total_pay().cents(), 10000);
    assert_eq!(loaded.version(), 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires a running Docker daemon"]
async fn stale_order_save_conflicts() {
    let store = setup_store().await;
    let user_id = seeded_user(&store).await;

    let order = sample_order(user_id);
    store.save_order(&order).await.unwrap();

    let result = store.save_order(&order).await;
    assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
}

#[tokio::test]
#[serial]
#[ignore = "requires a running Docker daemon"]
async fn transaction_id_lookup() {
    let store = setup_store().await;
    let user_id = seeded_user(&store).await;

    let mut order = sample_order(user_id);
    order
        .mark_ready_for_payment("T-PG-1".into(), user_id)
        .unwrap();
    store.save_order(&order).await.unwrap();

    let loaded = store
        .load_order_by_transaction_id(&"T-PG-1".into())
        .await
        .unwrap();
    assert_eq!(loaded.id(), order.id());

    let missing = store.load_order_by_transaction_id(&"T-PG-0".into()).await;
    assert!(matches!(missing, Err(StoreError::NoOrderForTransaction(_))));
}

#[tokio::test]
#[serial]
#[ignore = "requires a running Docker daemon"]
async fn unique_payment_per_order_enforced() {
    let store = setup_store().await;
    let user_id = seeded_user(&store).await;

    let order = sample_order(user_id);
    store.save_order(&order).await.unwrap();

    let payment = Payment::approved(
        order.id(),
        "T-PG-2".into(),
        "Fried Chicken",
        Money::from_cents(10000),
        Utc::now(),
    );
    store.save_payment(&payment).await.unwrap();

    let duplicate = Payment::approved(
        order.id(),
        "T-PG-2".into(),
        "Fried Chicken",
        Money::from_cents(10000),
        Utc::now(),
    );
    let result = store.save_payment(&duplicate).await;
    assert!(matches!(result, Err(StoreError::PaymentAlreadyExists(_))));
}

#[tokio::test]
#[serial]
#[ignore = "requires a running Docker daemon"]
async fn refund_update_roundtrip() {
    let store = setup_store().await;
    let user_id = seeded_user(&store).await;

    let order = sample_order(user_id);
    store.save_order(&order).await.unwrap();

    let mut payment = Payment::approved(
        order.id(),
        "T-PG-3".into(),
        "Fried Chicken",
        Money::from_cents(10000),
        Utc::now(),
    );
    store.save_payment(&payment).await.unwrap();

    payment
        .mark_refunded(Money::from_cents(10000), Utc::now())
        .unwrap();
    store.save_payment(&payment).await.unwrap();

    let loaded = store.load_payment_for_order(order.id()).await.unwrap();
    assert_eq!(loaded.status(), PaymentStatus::Refunded);
    assert_eq!(loaded.refund_amount().unwrap().cents(), 10000);
    assert!(loaded.canceled_at().is_some());
}

#[tokio::test]
#[serial]
#[ignore = "requires a running Docker daemon"]
async fn basket_take_clears() {
    let store = setup_store().await;
    let user_id = seeded_user(&store).await;

    for i in 0..2 {
        store
            .add_basket_line(
                user_id,
                BasketLine::new(
                    StoreId::new(),
                    OrderLine::new(
                        format!("SKU-{i:03}"),
                        "Side Dish",
                        1,
                        Money::from_cents(1500),
                    ),
                ),
            )
            .await
            .unwrap();
    }

    let taken = store.take_basket(user_id).await.unwrap();
    assert_eq!(taken.len(), 2);
    assert_eq!(taken[0].line.product_id.as_str(), "SKU-000");

    assert!(store.take_basket(user_id).await.unwrap().is_empty());
}
