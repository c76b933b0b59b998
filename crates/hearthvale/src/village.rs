//! Village setup and the headless tick loop

use log::{debug, info, warn};
use rpg_engine::prelude::*;

use crate::components::{CraftingStation, Health, Regeneration, Shop, TimeOfDay, Wallet};
use crate::config::{GameConfig, VillageConfig};
use crate::events::purchase_requested;
use crate::systems::{CraftingSystem, EconomySystem, RegenSystem, TimeOfDaySystem};

/// Entities created by [`spawn`]
#[derive(Debug, Clone, Copy)]
pub struct Village {
    /// The player character
    pub hero: Entity,
    /// Market stall
    pub market: Entity,
    /// Smithy, paying the hero per item
    pub smithy: Entity,
}

/// State of the village after a run
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Ticks executed
    pub ticks: u64,
    /// Calendar day
    pub day: u32,
    /// Hour of day
    pub hour: f32,
    /// Hero health
    pub hero_health: u32,
    /// Hero gold
    pub hero_gold: u64,
    /// Items the smithy finished
    pub crafted: u32,
    /// Items left at the market
    pub market_stock: u32,
}

/// Create the starting entities
pub fn spawn(world: &mut World, config: &VillageConfig) -> Village {
    let hero = world.create_entity();
    let market = world.create_entity();
    let smithy = world.create_entity();
    let components = world.components_mut();

    let mut health = Health::new(config.hero_health);
    health.take_damage(config.hero_wounds);
    components.add_component(hero, health);
    components.add_component(hero, Regeneration::new(config.hero_regen_per_second));
    components.add_component(hero, Wallet { gold: config.starting_gold });

    components.add_component(market, Shop::new(config.shop_item.clone(), config.shop_price, config.shop_stock));
    components.add_component(market, Wallet::default());

    components.add_component(
        smithy,
        CraftingStation::new(config.recipe.clone(), config.craft_seconds, config.craft_reward).owned_by(hero),
    );

    debug!("Spawned hero {hero}, market {market}, smithy {smithy}");
    Village { hero, market, smithy }
}

/// Build the world, run the configured number of ticks and shut down
///
/// Game time follows the ticks exactly: a [`ManualClock`] is advanced by
/// `tick_seconds` before every update, so runs are reproducible.
pub fn run(config: &GameConfig) -> Result<Summary, Box<dyn std::error::Error>> {
    let clock = ManualClock::new();
    let mut world = World::from_config(&config.engine, TimeManager::with_clock(clock.clone()));
    let village = spawn(&mut world, &config.village);

    let sim = &config.simulation;
    world.add_system(TimeOfDaySystem::new(sim.hours_per_second, sim.start_hour))?;
    world.add_system(RegenSystem::new())?;
    world.add_system(CraftingSystem::new())?;
    world.add_system(EconomySystem::new())?;
    world.initialize()?;
    info!("Hearthvale wakes up with systems {:?}", world.system_names());

    for tick in 1..=sim.ticks {
        clock.advance(f64::from(sim.tick_seconds) * 1000.0);
        world.update(sim.tick_seconds);

        if sim.purchase_every_ticks > 0 && tick % sim.purchase_every_ticks == 0 {
            let report = world.emit(&purchase_requested(village.hero, village.market))?;
            if report.failed > 0 {
                warn!("Purchase on tick {tick} failed in {} handler(s)", report.failed);
            }
        }
    }

    let summary = summarize(&world, village);
    world.shutdown()?;
    Ok(summary)
}

fn summarize(world: &World, village: Village) -> Summary {
    let components = world.components();
    let calendar = components.get_all_components::<TimeOfDay>().next().map(|(_, clock)| clock.clone());

    Summary {
        ticks: world.tick_count(),
        day: calendar.as_ref().map_or(0, |clock| clock.day),
        hour: calendar.as_ref().map_or(0.0, |clock| clock.hour),
        hero_health: components.get_component::<Health>(village.hero).map_or(0, |health| health.current),
        hero_gold: components.get_component::<Wallet>(village.hero).map_or(0, |wallet| wallet.gold),
        crafted: components
            .get_component::<CraftingStation>(village.smithy)
            .map_or(0, |station| station.crafted),
        market_stock: components.get_component::<Shop>(village.market).map_or(0, |shop| shop.stock),
    }
}
