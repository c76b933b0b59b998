//! Crafting stations on game-time timers

use log::{debug, info, warn};
use rpg_engine::prelude::*;

use crate::components::CraftingStation;
use crate::events::{gold_awarded, ITEM_CRAFTED};

/// Runs one craft cycle at a time on every [`CraftingStation`]
///
/// Cycles are timed in game time, so pausing or slowing the clock slows the
/// workshops with it.
pub struct CraftingSystem {
    required: Vec<ComponentType>,
    queue: TimerQueue<Entity>,
}

impl CraftingSystem {
    /// Creates the system with no cycles running
    pub fn new() -> Self {
        Self {
            required: vec![ComponentType::of::<CraftingStation>()],
            queue: TimerQueue::new(),
        }
    }

    /// Number of craft cycles in progress
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn finish(ctx: &mut SystemContext<'_>, entity: Entity) {
        let Some(station) = ctx.get_component_mut::<CraftingStation>(entity) else {
            debug!("Crafting station {entity} vanished mid-cycle");
            return;
        };
        station.in_progress = false;
        station.crafted += 1;
        let recipe = station.recipe.clone();
        let payout = station.owner.filter(|_| station.reward > 0).map(|owner| (owner, station.reward));

        debug!("{entity} finished {recipe}");
        let crafted = Event::new(ITEM_CRAFTED).with_arg("station", entity).with_arg("recipe", recipe);
        if let Err(err) = ctx.emit(crafted) {
            warn!("Could not announce craft at {entity}: {err}");
        }
        if let Some((owner, reward)) = payout {
            if let Err(err) = ctx.emit(gold_awarded(owner, reward)) {
                warn!("Could not pay {owner} for craft at {entity}: {err}");
            }
        }
    }
}

impl Default for CraftingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CraftingSystem {
    fn name(&self) -> &str {
        "crafting"
    }

    fn required_components(&self) -> &[ComponentType] {
        &self.required
    }

    fn update(&mut self, ctx: &mut SystemContext<'_>, _delta_time: f32) {
        for (_, entity) in self.queue.update(ctx.time) {
            Self::finish(ctx, entity);
        }

        for entity in self.get_entities(ctx) {
            let Some(station) = ctx.get_component_mut::<CraftingStation>(entity) else {
                continue;
            };
            if station.in_progress {
                continue;
            }
            station.in_progress = true;
            let delay_ms = station.craft_seconds.max(0.0) * 1000.0;
            self.queue.schedule_once(delay_ms, entity, ctx.time);
        }
    }

    fn shutdown(&mut self, _ctx: &mut SystemContext<'_>) -> Result<(), SystemError> {
        if !self.queue.is_empty() {
            info!("Abandoning {} unfinished crafts", self.queue.len());
        }
        self.queue.clear();
        Ok(())
    }
}
