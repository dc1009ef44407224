use super::{Book, BookError, PriceKey};
use crate::models::Order;
use log::debug;
use oms_api::{OrderId, Side, Symbol};
use std::collections::{BTreeMap, HashMap, VecDeque};

#[derive(Clone)]
struct Location {
    symbol: Symbol,
    side: Side,
    key: PriceKey,
}

/// One side's levels: a balanced tree of price ticks, each level a FIFO
/// queue of ids. Iteration direction depends on which side this is.
struct SideLevels {
    side: Side,
    levels: BTreeMap<PriceKey, VecDeque<OrderId>>,
}

impl SideLevels {
    fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    fn push(&mut self, key: PriceKey, id: OrderId) {
        self.levels.entry(key).or_default().push_back(id);
    }

    fn remove(&mut self, key: PriceKey, id: OrderId) {
        if let Some(level) = self.levels.get_mut(&key) {
            if let Some(pos) = level.iter().position(|&queued| queued == id) {
                level.remove(pos);
            }
            if level.is_empty() {
                self.levels.remove(&key);
            }
        }
    }

    fn best(&self) -> Option<OrderId> {
        let level = match self.side {
            Side::Buy => self.levels.values().next_back(),
            Side::Sell => self.levels.values().next(),
        };
        level.and_then(|ids| ids.front().copied())
    }

    fn ids_at(&self, key: PriceKey) -> Vec<OrderId> {
        self.levels
            .get(&key)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every id on this side, best level first, FIFO within a level.
    fn ordered_ids(&self) -> Vec<OrderId> {
        let levels: Box<dyn Iterator<Item = &VecDeque<OrderId>>> = match self.side {
            Side::Buy => Box::new(self.levels.values().rev()),
            Side::Sell => Box::new(self.levels.values()),
        };
        levels.flat_map(|ids| ids.iter().copied()).collect()
    }
}

struct SymbolLevels {
    bids: SideLevels,
    asks: SideLevels,
}

impl SymbolLevels {
    fn new() -> Self {
        Self {
            bids: SideLevels::new(Side::Buy),
            asks: SideLevels::new(Side::Sell),
        }
    }

    fn side(&self, side: Side) -> &SideLevels {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideLevels {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }
}

/// The production implementation: an arena of order records, an id-to-level
/// index, and one level tree per (symbol, side). Add and remove cost
/// O(log levels); best is an edge read; amend only touches the tree when
/// the price tick actually changes. Iteration is level-ordered and
/// entirely loop-based.
#[derive(Default)]
pub struct IndexedBook {
    orders: HashMap<OrderId, Order>,
    locations: HashMap<OrderId, Location>,
    symbols: HashMap<Symbol, SymbolLevels>,
}

impl IndexedBook {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Book for IndexedBook {
    fn name(&self) -> &'static str {
        "indexed"
    }

    fn add(&mut self, order: Order) -> Result<(), BookError> {
        let id = order.id();
        if self.orders.contains_key(&id) {
            return Err(BookError::DuplicateId(id));
        }
        let location = Location {
            symbol: order.symbol().clone(),
            side: order.side(),
            key: PriceKey::from_price(order.price()),
        };
        self.symbols
            .entry(location.symbol.clone())
            .or_insert_with(SymbolLevels::new)
            .side_mut(location.side)
            .push(location.key, id);
        self.locations.insert(id, location);
        self.orders.insert(id, order);
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
        let location = self
            .locations
            .get(&id)
            .ok_or(BookError::NotFound(id))?
            .clone();
        let order = self.orders.get_mut(&id).ok_or(BookError::NotFound(id))?;
        order.set_quantity(new_quantity);
        if let Some(price) = new_price {
            order.set_price(price);
            let new_key = PriceKey::from_price(price);
            if new_key != location.key {
                if let Some(levels) = self.symbols.get_mut(&location.symbol) {
                    let side = levels.side_mut(location.side);
                    side.remove(location.key, id);
                    side.push(new_key, id);
                }
                self.locations.insert(
                    id,
                    Location {
                        key: new_key,
                        ..location
                    },
                );
                debug!("order {id} re-priced to the tail of its new level");
            }
        }
        Ok(())
    }

    fn remove(&mut self, id: OrderId) -> Result<Order, BookError> {
        let location = self.locations.remove(&id).ok_or(BookError::NotFound(id))?;
        if let Some(levels) = self.symbols.get_mut(&location.symbol) {
            levels.side_mut(location.side).remove(location.key, id);
        }
        self.orders.remove(&id).ok_or(BookError::NotFound(id))
    }

    fn best(&self, symbol: &Symbol, side: Side) -> Option<&Order> {
        let id = self.symbols.get(symbol)?.side(side).best()?;
        self.orders.get(&id)
    }

    fn at_price(&self, symbol: &Symbol, side: Side, price: f64) -> Vec<OrderId> {
        match self.symbols.get(symbol) {
            Some(levels) => levels.side(side).ids_at(PriceKey::from_price(price)),
            None => Vec::new(),
        }
    }

    fn orders(&self, symbol: &Symbol, side: Side) -> Vec<&Order> {
        match self.symbols.get(symbol) {
            Some(levels) => levels
                .side(side)
                .ordered_ids()
                .into_iter()
                .filter_map(|id| self.orders.get(&id))
                .collect(),
            None => Vec::new(),
        }
    }

    fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    fn len(&self) -> usize {
        self.orders.len()
    }
}
