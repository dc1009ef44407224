use super::*;
use crate::models::Order;
use oms_api::{OrderId, OrderRequest, OrderType, Side, Symbol};

fn order(id: u64, symbol: &str, side: Side, quantity: u64, price: f64) -> Order {
    Order::new(
        OrderId::new(id),
        &OrderRequest::new(symbol, side, quantity, price, OrderType::Limit),
    )
}

fn books() -> Vec<Box<dyn Book>> {
    vec![BookKind::Naive.build(), BookKind::Indexed.build()]
}

fn ids(book: &dyn Book, symbol: &Symbol, side: Side) -> Vec<u64> {
    book.orders(symbol, side)
        .iter()
        .map(|o| o.id().value())
        .collect()
}

fn assert_sorted(book: &dyn Book, symbol: &Symbol) {
    for side in [Side::Buy, Side::Sell] {
        let orders = book.orders(symbol, side);
        for pair in orders.windows(2) {
            let first = PriceKey::from_price(pair[0].price());
            let second = PriceKey::from_price(pair[1].price());
            let ordered = match side {
                Side::Buy => first >= second,
                Side::Sell => first <= second,
            };
            assert!(
                ordered,
                "{} {} out of order in {}: {:?} before {:?}",
                symbol,
                side,
                book.name(),
                first,
                second
            );
        }
    }
}

#[test]
fn price_key_rounds_to_tick_grid() {
    assert_eq!(PriceKey::from_price(189.5), PriceKey::from_price(189.50004));
    assert_ne!(PriceKey::from_price(189.5), PriceKey::from_price(189.5001));
    assert_eq!(PriceKey::from_price(189.5).to_price(), 189.5);
}

#[test]
fn bids_descend_asks_ascend() {
    let aapl = Symbol::new("AAPL");
    for mut book in books() {
        book.add(order(1, "AAPL", Side::Buy, 100, 189.50)).unwrap();
        book.add(order(2, "AAPL", Side::Buy, 100, 190.00)).unwrap();
        book.add(order(3, "AAPL", Side::Buy, 100, 189.75)).unwrap();
        book.add(order(4, "AAPL", Side::Sell, 100, 191.00)).unwrap();
        book.add(order(5, "AAPL", Side::Sell, 100, 190.50)).unwrap();
        book.add(order(6, "AAPL", Side::Sell, 100, 190.75)).unwrap();

        assert_eq!(ids(book.as_ref(), &aapl, Side::Buy), vec![2, 3, 1]);
        assert_eq!(ids(book.as_ref(), &aapl, Side::Sell), vec![5, 6, 4]);
        assert_eq!(book.best(&aapl, Side::Buy).unwrap().id().value(), 2);
        assert_eq!(book.best(&aapl, Side::Sell).unwrap().id().value(), 5);
        assert_sorted(book.as_ref(), &aapl);
    }
}

#[test]
fn ties_break_by_arrival() {
    let aapl = Symbol::new("AAPL");
    for mut book in books() {
        for id in 1..=3 {
            book.add(order(id, "AAPL", Side::Buy, 100, 189.50)).unwrap();
        }
        assert_eq!(ids(book.as_ref(), &aapl, Side::Buy), vec![1, 2, 3]);
        assert_eq!(book.best(&aapl, Side::Buy).unwrap().id().value(), 1);
    }
}

#[test]
fn duplicate_id_rejected_across_the_whole_book() {
    for mut book in books() {
        book.add(order(1, "AAPL", Side::Buy, 100, 189.50)).unwrap();
        assert_eq!(
            book.add(order(1, "MSFT", Side::Sell, 50, 402.00)),
            Err(BookError::DuplicateId(OrderId::new(1))),
            "{}",
            book.name()
        );
        assert_eq!(book.len(), 1);
    }
}

#[test]
fn remove_returns_the_order_and_twice_fails() {
    for mut book in books() {
        book.add(order(1, "AAPL", Side::Buy, 100, 189.50)).unwrap();
        let removed = book.remove(OrderId::new(1)).unwrap();
        assert_eq!(removed.id().value(), 1);
        assert_eq!(removed.quantity(), 100);
        assert_eq!(
            book.remove(OrderId::new(1)),
            Err(BookError::NotFound(OrderId::new(1)))
        );
        assert_eq!(
            book.remove(OrderId::new(7)),
            Err(BookError::NotFound(OrderId::new(7)))
        );
        assert!(book.is_empty());
    }
}

#[test]
fn amend_rejects_zero_quantity_and_unknown_ids() {
    for mut book in books() {
        book.add(order(1, "AAPL", Side::Buy, 100, 189.50)).unwrap();
        assert_eq!(
            book.amend(OrderId::new(1), 0, None),
            Err(BookError::InvalidQuantity(0))
        );
        assert_eq!(
            book.amend(OrderId::new(9), 50, None),
            Err(BookError::NotFound(OrderId::new(9)))
        );
        assert_eq!(book.get(OrderId::new(1)).unwrap().quantity(), 100);
    }
}

#[test]
fn quantity_amend_keeps_the_time_slot() {
    let aapl = Symbol::new("AAPL");
    for mut book in books() {
        for id in 1..=3 {
            book.add(order(id, "AAPL", Side::Buy, 100, 189.50)).unwrap();
        }
        book.amend(OrderId::new(2), 40, None).unwrap();
        assert_eq!(ids(book.as_ref(), &aapl, Side::Buy), vec![1, 2, 3]);
        assert_eq!(book.get(OrderId::new(2)).unwrap().quantity(), 40);
    }
}

#[test]
fn price_amend_moves_to_the_new_level_tail() {
    let aapl = Symbol::new("AAPL");
    for mut book in books() {
        book.add(order(1, "AAPL", Side::Sell, 100, 190.00)).unwrap();
        book.add(order(2, "AAPL", Side::Sell, 100, 190.00)).unwrap();
        book.add(order(3, "AAPL", Side::Sell, 100, 191.00)).unwrap();

        book.amend(OrderId::new(1), 100, Some(191.00)).unwrap();

        assert_eq!(ids(book.as_ref(), &aapl, Side::Sell), vec![2, 3, 1]);
        assert_eq!(
            book.at_price(&aapl, Side::Sell, 191.00),
            vec![OrderId::new(3), OrderId::new(1)]
        );
        assert_sorted(book.as_ref(), &aapl);
    }
}

#[test]
fn same_tick_price_amend_keeps_the_time_slot() {
    let aapl = Symbol::new("AAPL");
    for mut book in books() {
        book.add(order(1, "AAPL", Side::Buy, 100, 189.50)).unwrap();
        book.add(order(2, "AAPL", Side::Buy, 100, 189.50)).unwrap();

        book.amend(OrderId::new(1), 100, Some(189.50004)).unwrap();

        assert_eq!(ids(book.as_ref(), &aapl, Side::Buy), vec![1, 2]);
    }
}

#[test]
fn at_price_rounds_the_query_to_the_grid() {
    let aapl = Symbol::new("AAPL");
    for mut book in books() {
        book.add(order(1, "AAPL", Side::Buy, 100, 189.50)).unwrap();
        assert_eq!(
            book.at_price(&aapl, Side::Buy, 189.50004),
            vec![OrderId::new(1)]
        );
        assert!(book.at_price(&aapl, Side::Buy, 189.49).is_empty());
        assert!(book.at_price(&aapl, Side::Sell, 189.50).is_empty());
    }
}

#[test]
fn best_is_none_for_empty_or_unknown_sides() {
    let aapl = Symbol::new("AAPL");
    let msft = Symbol::new("MSFT");
    for mut book in books() {
        assert!(book.best(&aapl, Side::Buy).is_none());
        book.add(order(1, "AAPL", Side::Buy, 100, 189.50)).unwrap();
        assert!(book.best(&aapl, Side::Sell).is_none());
        assert!(book.best(&msft, Side::Buy).is_none());
        book.remove(OrderId::new(1)).unwrap();
        assert!(book.best(&aapl, Side::Buy).is_none());
    }
}

#[test]
fn symbols_do_not_interfere() {
    let aapl = Symbol::new("AAPL");
    let msft = Symbol::new("MSFT");
    for mut book in books() {
        book.add(order(1, "AAPL", Side::Buy, 100, 189.50)).unwrap();
        book.add(order(2, "MSFT", Side::Buy, 50, 402.00)).unwrap();

        assert_eq!(book.best(&aapl, Side::Buy).unwrap().id().value(), 1);
        assert_eq!(book.best(&msft, Side::Buy).unwrap().id().value(), 2);

        book.remove(OrderId::new(1)).unwrap();
        assert_eq!(book.best(&msft, Side::Buy).unwrap().id().value(), 2);
    }
}

/// Runs a deterministic mix of adds, removes and amends through both
/// implementations and compares every observable after every step.
#[test]
fn strategies_agree_on_scripted_churn() {
    let mut naive = NaiveBook::new();
    let mut indexed = IndexedBook::new();
    let symbols = [Symbol::new("AAPL"), Symbol::new("MSFT")];
    let prices = [10.0, 10.5, 9.75, 10.25, 10.0, 11.0, 9.5, 10.5];

    let mut next_id = 1u64;
    let mut live: Vec<u64> = Vec::new();

    for step in 0..60u64 {
        let symbol = &symbols[(step % 2) as usize];
        let side = if step % 3 == 0 { Side::Sell } else { Side::Buy };
        let price = prices[(step % 8) as usize];

        let incoming = order(next_id, symbol.as_str(), side, 10 + step, price);
        naive.add(incoming.clone()).unwrap();
        indexed.add(incoming).unwrap();
        live.push(next_id);
        next_id += 1;

        if step % 4 == 3 {
            let id = OrderId::new(live.remove(0));
            let a = naive.remove(id).unwrap();
            let b = indexed.remove(id).unwrap();
            assert_eq!(a.id(), b.id());
        }
        if step % 5 == 2 {
            let id = OrderId::new(live[live.len() / 2]);
            let new_price = (step % 10 == 2).then(|| prices[((step + 3) % 8) as usize]);
            naive.amend(id, 100 + step, new_price).unwrap();
            indexed.amend(id, 100 + step, new_price).unwrap();
        }

        for symbol in &symbols {
            for side in [Side::Buy, Side::Sell] {
                assert_eq!(
                    ids(&naive, symbol, side),
                    ids(&indexed, symbol, side),
                    "step {step}: {side} side of {symbol} diverged"
                );
                assert_eq!(
                    naive.best(symbol, side).map(Order::id),
                    indexed.best(symbol, side).map(Order::id),
                    "step {step}: best {side} of {symbol} diverged"
                );
                for price in prices {
                    assert_eq!(
                        naive.at_price(symbol, side, price),
                        indexed.at_price(symbol, side, price),
                        "step {step}: level {price} of {symbol} {side} diverged"
                    );
                }
            }
            assert_sorted(&naive, symbol);
            assert_sorted(&indexed, symbol);
        }
        assert_eq!(naive.len(), indexed.len());
    }
    assert!(naive.len() > 20);
}
