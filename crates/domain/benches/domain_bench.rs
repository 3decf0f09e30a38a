use common::{StoreId, TransactionId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{BasketLine, DiscountRate, Money, Order, OrderLine};

fn basket(store_id: StoreId, lines: usize) -> Vec<BasketLine> {
    (0..lines)
        .map(|i| {
            BasketLine::new(
                store_id,
                OrderLine::new(
                    format!("SKU-{i:03}"),
                    format!("Benchmark Item {i}"),
                    2,
                    Money::from_cents(1500),
                ),
            )
        })
        .collect()
}

fn bench_from_basket(c: &mut Criterion) {
    let store_id = StoreId::new();

    c.bench_function("domain/order_from_basket_10_lines", |b| {
        b.iter(|| {
            let order = Order::from_basket(
                UserId::new(),
                basket(store_id, 10),
                DiscountRate::new(10).unwrap(),
            )
            .unwrap();
            assert!(order.total_pay().is_positive());
        });
    });
}

fn bench_payment_lifecycle(c: &mut Criterion) {
    let store_id = StoreId::new();

    c.bench_function("domain/order_payment_transitions", |b| {
        b.iter(|| {
            let mut order =
                Order::from_basket(UserId::new(), basket(store_id, 3), DiscountRate::ZERO).unwrap();
            let actor = order.user_id();
            order
                .mark_ready_for_payment(TransactionId::new("T-BENCH"), actor)
                .unwrap();
            order.mark_paid(actor).unwrap();
            order.mark_canceled(actor).unwrap();
        });
    });
}

criterion_group!(benches, bench_from_basket, bench_payment_lifecycle);
criterion_main!(benches);
