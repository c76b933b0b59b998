//! Event kinds exchanged between village systems

use rpg_engine::prelude::*;

/// Gold should be paid into `target`'s wallet; args: `target`, `amount`
pub const GOLD_AWARDED: &str = "gold_awarded";

/// A new day began; args: `day`
pub const DAY_STARTED: &str = "day_started";

/// A crafting station finished an item; args: `station`, `recipe`
pub const ITEM_CRAFTED: &str = "item_crafted";

/// Someone wants to buy from a shop; args: `buyer`, `shop`
pub const PURCHASE_REQUESTED: &str = "purchase_requested";

/// A purchase went through; args: `buyer`, `shop`, `item`, `price`
pub const ITEM_PURCHASED: &str = "item_purchased";

/// Build a [`GOLD_AWARDED`] event
pub fn gold_awarded(target: Entity, amount: u64) -> Event {
    Event::new(GOLD_AWARDED)
        .with_arg("target", target)
        .with_arg("amount", i64::try_from(amount).unwrap_or(i64::MAX))
}

/// Build a [`PURCHASE_REQUESTED`] event
pub fn purchase_requested(buyer: Entity, shop: Entity) -> Event {
    Event::new(PURCHASE_REQUESTED)
        .with_arg("buyer", buyer)
        .with_arg("shop", shop)
}
