//! Game-specific components

use rpg_engine::prelude::*;

/// Hit points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Health {
    /// Current health
    pub current: u32,

    /// Maximum health
    pub max: u32,
}

impl Component for Health {
    const TYPE_NAME: &'static str = "health";
}

impl Health {
    /// Create a new health component at full health
    pub const fn new(max_health: u32) -> Self {
        Self {
            current: max_health,
            max: max_health,
        }
    }

    /// Take damage
    pub fn take_damage(&mut self, damage: u32) {
        self.current = self.current.saturating_sub(damage);
    }

    /// Heal, never past the maximum
    pub fn heal(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }

    /// Check if dead
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Check if at full health
    pub const fn is_full(&self) -> bool {
        self.current == self.max
    }
}

/// Passive healing over game time
#[derive(Debug, Clone, PartialEq)]
pub struct Regeneration {
    /// Health restored per game second
    pub per_second: f32,

    /// Fractional health not yet applied
    pub carry: f32,
}

impl Component for Regeneration {
    const TYPE_NAME: &'static str = "regeneration";
}

impl Regeneration {
    /// Create a regeneration component
    pub const fn new(per_second: f32) -> Self {
        Self { per_second, carry: 0.0 }
    }
}

/// Gold purse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wallet {
    /// Gold on hand
    pub gold: u64,
}

impl Component for Wallet {
    const TYPE_NAME: &'static str = "wallet";
}

impl Wallet {
    /// Add gold
    pub fn deposit(&mut self, amount: u64) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Remove gold if there is enough; returns whether it was taken
    pub fn withdraw(&mut self, amount: u64) -> bool {
        if self.gold < amount {
            return false;
        }
        self.gold -= amount;
        true
    }
}

/// A stall selling a single item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shop {
    /// Item on sale
    pub item: String,

    /// Price per unit
    pub price: u64,

    /// Units left today
    pub stock: u32,

    /// Stock level restored every morning
    pub restock_to: u32,
}

impl Component for Shop {
    const TYPE_NAME: &'static str = "shop";
}

impl Shop {
    /// Create a fully stocked shop
    pub fn new(item: impl Into<String>, price: u64, stock: u32) -> Self {
        Self {
            item: item.into(),
            price,
            stock,
            restock_to: stock,
        }
    }

    /// Refill to the daily stock level
    pub fn restock(&mut self) {
        self.stock = self.stock.max(self.restock_to);
    }
}

/// Workbench that turns out one item per craft cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CraftingStation {
    /// What is being made
    pub recipe: String,

    /// Game seconds per item
    pub craft_seconds: f64,

    /// Gold paid to the owner per finished item
    pub reward: u64,

    /// Who gets paid
    pub owner: Option<Entity>,

    /// Items finished so far
    pub crafted: u32,

    /// Whether a craft cycle is running
    pub in_progress: bool,
}

impl Component for CraftingStation {
    const TYPE_NAME: &'static str = "crafting_station";
}

impl CraftingStation {
    /// Create an idle station
    pub fn new(recipe: impl Into<String>, craft_seconds: f64, reward: u64) -> Self {
        Self {
            recipe: recipe.into(),
            craft_seconds,
            reward,
            owner: None,
            crafted: 0,
            in_progress: false,
        }
    }

    /// Pay rewards to `owner`
    pub const fn owned_by(mut self, owner: Entity) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Village calendar
#[derive(Debug, Clone, PartialEq)]
pub struct TimeOfDay {
    /// Day number, starting at 1
    pub day: u32,

    /// Hour of day in `[0, 24)`
    pub hour: f32,
}

impl Component for TimeOfDay {
    const TYPE_NAME: &'static str = "time_of_day";
}

impl TimeOfDay {
    /// Start of the given day at `hour`
    pub const fn new(day: u32, hour: f32) -> Self {
        Self { day, hour }
    }

    /// Move the clock forward; returns how many midnights were crossed
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn advance(&mut self, hours: f32) -> u32 {
        self.hour += hours.max(0.0);
        let days = (self.hour / 24.0).floor();
        self.hour -= days * 24.0;
        let days = days as u32;
        self.day += days;
        days
    }
}
