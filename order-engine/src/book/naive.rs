use super::{Book, BookError, PriceKey};
use crate::models::Order;
use oms_api::{OrderId, Side, Symbol};
use std::cmp::Reverse;
use std::collections::HashMap;

#[derive(Default)]
struct SymbolSides {
    bids: Vec<Order>,
    asks: Vec<Order>,
}

impl SymbolSides {
    fn side(&self, side: Side) -> &[Order] {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut Vec<Order> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }
}

/// Correctness baseline: flat vectors re-sorted after every mutation and
/// scanned linearly for lookups. O(n log n) writes, O(n) reads. Slow past a
/// few thousand resting orders, but simple enough to trust, which is the
/// point: the indexed implementation is tested against this one.
#[derive(Default)]
pub struct NaiveBook {
    symbols: HashMap<Symbol, SymbolSides>,
}

impl NaiveBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn locate(&self, id: OrderId) -> Option<(Symbol, Side, usize)> {
        for (symbol, sides) in &self.symbols {
            for side in [Side::Buy, Side::Sell] {
                if let Some(pos) = sides.side(side).iter().position(|o| o.id() == id) {
                    return Some((symbol.clone(), side, pos));
                }
            }
        }
        None
    }

    /// Stable sort on the price key alone, so arrival order survives within
    /// a level.
    fn sort_side(orders: &mut [Order], side: Side) {
        match side {
            Side::Buy => orders.sort_by_key(|o| Reverse(PriceKey::from_price(o.price()))),
            Side::Sell => orders.sort_by_key(|o| PriceKey::from_price(o.price())),
        }
    }
}

impl Book for NaiveBook {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn add(&mut self, order: Order) -> Result<(), BookError> {
        if self.locate(order.id()).is_some() {
            return Err(BookError::DuplicateId(order.id()));
        }
        let side = order.side();
        let orders = self
            .symbols
            .entry(order.symbol().clone())
            .or_default()
            .side_mut(side);
        orders.push(order);
        Self::sort_side(orders, side);
        Ok(())
    }

    fn amend(
        &mut self,
        id: OrderId,
        new_quantity: u64,
        new_price: Option<f64>,
    ) -> Result<(), BookError> {
        if new_quantity == 0 {
            return Err(BookError::InvalidQuantity(0));
        }
        let (symbol, side, pos) = self.locate(id).ok_or(BookError::NotFound(id))?;
        let orders = self
            .symbols
            .get_mut(&symbol)
            .ok_or(BookError::NotFound(id))?
            .side_mut(side);
        orders[pos].set_quantity(new_quantity);
        if let Some(price) = new_price {
            if PriceKey::from_price(price) == PriceKey::from_price(orders[pos].price()) {
                // same tick: slot unchanged
                orders[pos].set_price(price);
            } else {
                // push-then-stable-sort lands the order at the tail of its
                // new level
                let mut order = orders.remove(pos);
                order.set_price(price);
                orders.push(order);
                Self::sort_side(orders, side);
            }
        }
        Ok(())
    }

    fn remove(&mut self, id: OrderId) -> Result<Order, BookError> {
        let (symbol, side, pos) = self.locate(id).ok_or(BookError::NotFound(id))?;
        let orders = self
            .symbols
            .get_mut(&symbol)
            .ok_or(BookError::NotFound(id))?
            .side_mut(side);
        Ok(orders.remove(pos))
    }

    fn best(&self, symbol: &Symbol, side: Side) -> Option<&Order> {
        self.symbols
            .get(symbol)
            .and_then(|sides| sides.side(side).first())
    }

    fn at_price(&self, symbol: &Symbol, side: Side, price: f64) -> Vec<OrderId> {
        let key = PriceKey::from_price(price);
        match self.symbols.get(symbol) {
            Some(sides) => sides
                .side(side)
                .iter()
                .filter(|o| PriceKey::from_price(o.price()) == key)
                .map(|o| o.id())
                .collect(),
            None => Vec::new(),
        }
    }

    fn orders(&self, symbol: &Symbol, side: Side) -> Vec<&Order> {
        match self.symbols.get(symbol) {
            Some(sides) => sides.side(side).iter().collect(),
            None => Vec::new(),
        }
    }

    fn get(&self, id: OrderId) -> Option<&Order> {
        self.symbols
            .values()
            .flat_map(|sides| sides.bids.iter().chain(sides.asks.iter()))
            .find(|o| o.id() == id)
    }

    fn len(&self) -> usize {
        self.symbols
            .values()
            .map(|sides| sides.bids.len() + sides.asks.len())
            .sum()
    }
}
