use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockKind {
    Drink,
    Food,
}

impl StockKind {
    pub fn rack_label(self) -> &'static str {
        match self {
            StockKind::Drink => "drinks",
            StockKind::Food => "food",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockBatch {
    pub item: String,
    pub quantity: u32,
    pub purchased_day: u32,
    pub shelf_life_days: u32,
}

impl StockBatch {
    fn is_spoiled(&self, today: u32) -> bool {
        today.saturating_sub(self.purchased_day) > self.shelf_life_days
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rack {
    capacity: u32,
    batches: Vec<StockBatch>,
}

impl Rack {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            batches: Vec::new(),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub(crate) fn set_capacity(&mut self, capacity: u32) {
        self.capacity = capacity;
    }

    pub fn count(&self) -> u32 {
        self.batches.iter().map(|b| b.quantity).sum()
    }

    pub fn free_space(&self) -> u32 {
        self.capacity.saturating_sub(self.count())
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn stock_of(&self, item: &str) -> u32 {
        self.batches
            .iter()
            .filter(|b| b.item == item)
            .map(|b| b.quantity)
            .sum()
    }

    /// Quantity on hand per item, sorted by id.
    pub fn summary(&self) -> BTreeMap<String, u32> {
        let mut out = BTreeMap::new();
        for batch in &self.batches {
            *out.entry(batch.item.clone()).or_insert(0) += batch.quantity;
        }
        out
    }

    /// Stores as much as fits and returns the quantity accepted.
    pub(crate) fn add(&mut self, item: &str, quantity: u32, day: u32, shelf_life_days: u32) -> u32 {
        let accepted = quantity.min(self.free_space());
        if accepted == 0 {
            return 0;
        }
        self.batches.push(StockBatch {
            item: item.to_string(),
            quantity: accepted,
            purchased_day: day,
            shelf_life_days,
        });
        accepted
    }

    /// Takes one unit of `item`, oldest batch first.
    pub(crate) fn take(&mut self, item: &str) -> bool {
        let Some(idx) = self
            .batches
            .iter()
            .enumerate()
            .filter(|(_, b)| b.item == item && b.quantity > 0)
            .min_by_key(|(_, b)| b.purchased_day)
            .map(|(idx, _)| idx)
        else {
            return false;
        };
        self.batches[idx].quantity -= 1;
        if self.batches[idx].quantity == 0 {
            self.batches.remove(idx);
        }
        true
    }

    /// Takes one unit of a random item in stock.
    pub(crate) fn take_any<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<String> {
        let items: Vec<String> = self.summary().into_keys().collect();
        if items.is_empty() {
            return None;
        }
        let item = items[rng.gen_range(0..items.len())].clone();
        self.take(&item).then_some(item)
    }

    /// Drops every batch older than its shelf life. Returns units lost.
    pub(crate) fn remove_spoiled(&mut self, today: u32) -> u32 {
        let before = self.count();
        self.batches.retain(|b| !b.is_spoiled(today));
        before - self.count()
    }

    pub(crate) fn remove_random<R: Rng + ?Sized>(&mut self, units: u32, rng: &mut R) -> u32 {
        let mut removed = 0;
        for _ in 0..units {
            if self.take_any(rng).is_none() {
                break;
            }
            removed += 1;
        }
        removed
    }

    pub(crate) fn clear(&mut self) {
        self.batches.clear();
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub drinks: Rack,
    pub food: Rack,
    /// Par level per item, restocked before every opening.
    #[serde(default)]
    pub standing_order: BTreeMap<String, u32>,
}

impl Inventory {
    pub fn new(drinks_capacity: u32, food_capacity: u32) -> Self {
        Self {
            drinks: Rack::new(drinks_capacity),
            food: Rack::new(food_capacity),
            standing_order: BTreeMap::new(),
        }
    }

    pub fn rack(&self, kind: StockKind) -> &Rack {
        match kind {
            StockKind::Drink => &self.drinks,
            StockKind::Food => &self.food,
        }
    }

    pub(crate) fn rack_mut(&mut self, kind: StockKind) -> &mut Rack {
        match kind {
            StockKind::Drink => &mut self.drinks,
            StockKind::Food => &mut self.food,
        }
    }
}
