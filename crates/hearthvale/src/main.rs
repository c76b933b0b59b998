//! Hearthvale entry point
//!
//! Usage: `hearthvale [config.toml|config.ron]`

use log::info;
use rpg_engine::foundation::logging;
use rpg_engine::prelude::Config;

use hearthvale::config::{GameConfig, DEFAULT_CONFIG_PATH};
use hearthvale::village;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let loaded = GameConfig::load_if_present(&path)?;
    let found = loaded.is_some();
    let config = loaded.unwrap_or_default();
    logging::init_with_filter(&config.engine.logging.filter);
    if found {
        info!("Loaded config from {path}");
    } else {
        info!("No config at {path}, using defaults");
    }
    config.validate()?;

    info!("Running Hearthvale for {} ticks", config.simulation.ticks);
    let summary = village::run(&config)?;

    info!(
        "Day {} at {:.1}h: hero has {} hp and {} gold, smithy made {} items, market has {} left",
        summary.day, summary.hour, summary.hero_health, summary.hero_gold, summary.crafted, summary.market_stock
    );
    Ok(())
}
