use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::nav::error::NavResult;
use crate::nav::fixed_math::{tick_delta, FixedNum};
use crate::nav::occupancy::layers;

pub const INITIAL_CONFIG_PATH: &str = "assets/nav_config.ron";

/// Navigation parameters loaded once at startup.
///
/// Plain floats so the file stays hand-editable; converted to [`NavConfig`]
/// before the first tick and never read again.
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NavInitialConfig {
    pub tick_rate: f64,
    /// World units per second.
    pub follow_speed: f32,
    /// Seconds between stall checks.
    pub stall_check_interval: f32,
    /// How far an agent may fall short of the expected distance before it replans.
    pub stall_tolerance: f32,
    /// Distance at which a waypoint counts as reached.
    pub arrival_tolerance: f32,
    /// 0 means every queued search runs in the tick it is picked up.
    pub max_searches_per_tick: usize,
    pub agent_radius: f32,
    pub obstacle_layer_mask: u32,
}

impl Default for NavInitialConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20.0,
            follow_speed: 4.0,
            stall_check_interval: 0.5,
            stall_tolerance: 0.2,
            arrival_tolerance: 0.0,
            max_searches_per_tick: 16,
            agent_radius: 0.3,
            obstacle_layer_mask: layers::OBSTACLE,
        }
    }
}

impl NavInitialConfig {
    pub fn from_ron_str(contents: &str) -> NavResult<Self> {
        Ok(ron::from_str(contents)?)
    }

    pub fn from_ron_file(path: impl AsRef<Path>) -> NavResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }
}

/// Deterministic navigation configuration used by the fixed-step systems.
#[derive(Resource, Clone, Debug)]
pub struct NavConfig {
    pub tick_rate: f64,
    /// Simulated seconds per tick.
    pub tick_delta: FixedNum,
    pub follow_speed: FixedNum,
    pub stall_check_interval: FixedNum,
    pub stall_tolerance: FixedNum,
    pub arrival_tolerance: FixedNum,
    pub max_searches_per_tick: usize,
    pub agent_radius: FixedNum,
    pub obstacle_layer_mask: u32,
}

impl From<&NavInitialConfig> for NavConfig {
    fn from(config: &NavInitialConfig) -> Self {
        Self {
            tick_rate: config.tick_rate,
            tick_delta: tick_delta(config.tick_rate),
            follow_speed: FixedNum::from_num(config.follow_speed),
            stall_check_interval: FixedNum::from_num(config.stall_check_interval),
            stall_tolerance: FixedNum::from_num(config.stall_tolerance),
            arrival_tolerance: FixedNum::from_num(config.arrival_tolerance),
            max_searches_per_tick: config.max_searches_per_tick,
            agent_radius: FixedNum::from_num(config.agent_radius),
            obstacle_layer_mask: config.obstacle_layer_mask,
        }
    }
}

impl Default for NavConfig {
    fn default() -> Self {
        Self::from(&NavInitialConfig::default())
    }
}

pub struct NavConfigPlugin;

impl Plugin for NavConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NavConfig>()
            .add_systems(Startup, (load_initial_config, init_nav_config_from_initial).chain());
    }
}

/// Read `assets/nav_config.ron` unless a config was inserted up front.
fn load_initial_config(mut commands: Commands, existing: Option<Res<NavInitialConfig>>) {
    if existing.is_some() {
        debug!("NavInitialConfig already present, skipping {}", INITIAL_CONFIG_PATH);
        return;
    }

    match NavInitialConfig::from_ron_file(INITIAL_CONFIG_PATH) {
        Ok(config) => {
            info!("Loaded nav config from {}", INITIAL_CONFIG_PATH);
            commands.insert_resource(config);
        }
        Err(e) => {
            error!("Failed to load {}: {}", INITIAL_CONFIG_PATH, e);
            error!("Using default NavInitialConfig");
            commands.insert_resource(NavInitialConfig::default());
        }
    }
}

fn init_nav_config_from_initial(
    mut nav_config: ResMut<NavConfig>,
    initial_config: Option<Res<NavInitialConfig>>,
    fixed_time: Option<ResMut<Time<Fixed>>>,
) {
    let config = match &initial_config {
        Some(cfg) => cfg.as_ref(),
        None => {
            warn!("NavInitialConfig not found, using defaults");
            &NavInitialConfig::default()
        }
    };

    *nav_config = NavConfig::from(config);

    if let Some(mut fixed_time) = fixed_time {
        if config.tick_rate > 0.0 {
            fixed_time.set_timestep_seconds(1.0 / config.tick_rate);
        }
    }

    info!(
        "NavConfig initialized: {} ticks/s, speed {}, stall check every {}s",
        config.tick_rate, config.follow_speed, config.stall_check_interval
    );
}
