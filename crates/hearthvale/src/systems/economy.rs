//! Gold, shops and purchases

use log::{debug, info};
use rpg_engine::prelude::*;

use crate::components::{Shop, Wallet};
use crate::events::{gold_awarded, DAY_STARTED, GOLD_AWARDED, ITEM_PURCHASED, PURCHASE_REQUESTED};

/// Settles payments and purchases through event handlers
///
/// The handlers are registered on initialize and removed on shutdown. The
/// per-tick update only tracks how much gold is in circulation.
pub struct EconomySystem {
    required: Vec<ComponentType>,
    subscriptions: Vec<SubscriptionId>,
    gold_in_circulation: Option<u64>,
}

impl EconomySystem {
    /// Creates the system
    pub fn new() -> Self {
        Self {
            required: vec![ComponentType::of::<Wallet>()],
            subscriptions: Vec::new(),
            gold_in_circulation: None,
        }
    }

    /// Total gold across all wallets as of the last update
    pub const fn gold_in_circulation(&self) -> Option<u64> {
        self.gold_in_circulation
    }
}

impl Default for EconomySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for EconomySystem {
    fn name(&self) -> &str {
        "economy"
    }

    fn required_components(&self) -> &[ComponentType] {
        &self.required
    }

    fn on_initialize(&mut self, ctx: &mut SystemContext<'_>) -> Result<(), SystemError> {
        self.subscriptions = vec![
            ctx.events.subscribe(GOLD_AWARDED, award_gold),
            ctx.events.subscribe(PURCHASE_REQUESTED, settle_purchase),
            ctx.events.subscribe(DAY_STARTED, restock_shops),
        ];
        Ok(())
    }

    fn update(&mut self, ctx: &mut SystemContext<'_>, _delta_time: f32) {
        let total = self
            .get_entities(ctx)
            .into_iter()
            .filter_map(|entity| ctx.get_component::<Wallet>(entity))
            .map(|wallet| wallet.gold)
            .fold(0_u64, u64::saturating_add);

        if self.gold_in_circulation != Some(total) {
            debug!("Gold in circulation: {total}");
            self.gold_in_circulation = Some(total);
        }
    }

    fn shutdown(&mut self, ctx: &mut SystemContext<'_>) -> Result<(), SystemError> {
        for id in self.subscriptions.drain(..) {
            ctx.events.unsubscribe(id);
        }
        Ok(())
    }
}

fn award_gold(event: &Event, ctx: &mut EventContext<'_>) -> HandlerResult {
    let target = event.get_entity("target").ok_or("gold award without a target")?;
    let amount = u64::try_from(event.get_int("amount").ok_or("gold award without an amount")?)?;

    match ctx.components.get_component_mut::<Wallet>(target) {
        Some(wallet) => wallet.deposit(amount),
        None => {
            ctx.components.add_component(target, Wallet { gold: amount });
        }
    }
    Ok(())
}

fn settle_purchase(event: &Event, ctx: &mut EventContext<'_>) -> HandlerResult {
    let buyer = event.get_entity("buyer").ok_or("purchase without a buyer")?;
    let shop_entity = event.get_entity("shop").ok_or("purchase without a shop")?;

    let shop = ctx
        .components
        .get_component::<Shop>(shop_entity)
        .ok_or("purchase from an entity that is not a shop")?;
    if shop.stock == 0 {
        info!("{} is sold out of {}", shop_entity, shop.item);
        return Ok(());
    }
    let (item, price) = (shop.item.clone(), shop.price);

    let paid = ctx
        .components
        .get_component_mut::<Wallet>(buyer)
        .is_some_and(|wallet| wallet.withdraw(price));
    if !paid {
        info!("{buyer} cannot afford {item} at {price} gold");
        return Ok(());
    }

    if let Some(shop) = ctx.components.get_component_mut::<Shop>(shop_entity) {
        shop.stock -= 1;
    }
    debug!("{buyer} bought {item} for {price} gold");

    ctx.emit(&gold_awarded(shop_entity, price))?;
    let purchased = Event::new(ITEM_PURCHASED)
        .with_arg("buyer", buyer)
        .with_arg("shop", shop_entity)
        .with_arg("item", item)
        .with_arg("price", i64::try_from(price)?);
    ctx.emit(&purchased)?;
    Ok(())
}

fn restock_shops(_event: &Event, ctx: &mut EventContext<'_>) -> HandlerResult {
    for (_, shop) in ctx.components.get_all_components_mut::<Shop>() {
        shop.restock();
    }
    Ok(())
}
