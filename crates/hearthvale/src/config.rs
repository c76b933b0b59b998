//! Game configuration

use rpg_engine::prelude::*;
use serde::{Deserialize, Serialize};

/// Default config file looked up next to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "hearthvale.toml";

/// Game configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Engine settings
    pub engine: EngineConfig,

    /// Tick loop settings
    pub simulation: SimulationConfig,

    /// Starting village
    pub village: VillageConfig,
}

/// Tick loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of ticks to run
    pub ticks: u32,

    /// Seconds of simulated time per tick
    pub tick_seconds: f32,

    /// Game hours that pass per game second
    pub hours_per_second: f32,

    /// Hour of day the simulation starts at
    pub start_hour: f32,

    /// The hero tries to buy something every this many ticks (0 disables)
    pub purchase_every_ticks: u32,
}

/// Starting village configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VillageConfig {
    /// Hero maximum health
    pub hero_health: u32,

    /// Damage the hero starts with
    pub hero_wounds: u32,

    /// Hero regeneration per game second
    pub hero_regen_per_second: f32,

    /// Hero starting gold
    pub starting_gold: u64,

    /// Item sold at the market stall
    pub shop_item: String,

    /// Price of the item
    pub shop_price: u64,

    /// Daily stock of the item
    pub shop_stock: u32,

    /// Item the smithy produces
    pub recipe: String,

    /// Game seconds per crafted item
    pub craft_seconds: f64,

    /// Gold paid to the hero per crafted item
    pub craft_reward: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks: 240,
            tick_seconds: 0.5,
            hours_per_second: 0.5,
            start_hour: 6.0,
            purchase_every_ticks: 20,
        }
    }
}

impl Default for VillageConfig {
    fn default() -> Self {
        Self {
            hero_health: 30,
            hero_wounds: 12,
            hero_regen_per_second: 0.25,
            starting_gold: 20,
            shop_item: "bread".to_string(),
            shop_price: 3,
            shop_stock: 5,
            recipe: "horseshoe".to_string(),
            craft_seconds: 8.0,
            craft_reward: 4,
        }
    }
}

impl GameConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.engine.validate()?;
        if !self.simulation.tick_seconds.is_finite() || self.simulation.tick_seconds < 0.0 {
            return Err(format!("Tick length must be non-negative, got {}", self.simulation.tick_seconds));
        }
        if self.village.hero_health == 0 {
            return Err("Hero health must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Config for GameConfig {}
