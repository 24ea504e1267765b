use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gridwalk::nav::agent::{agent_bundle, FollowCompleted, StartFollow};
use gridwalk::nav::fixed_math::{FixedNum, FixedVec2};
use gridwalk::nav::grid::{load_map, save_map, NavGrid, NavMapData};
use gridwalk::nav::occupancy::StaticColliders;
use gridwalk::nav::simulation::{NavSet, SimTick};
use gridwalk::nav::NavPlugin;

const DEMO_LAYOUT: &[&str] = &[
    "............",
    "..####......",
    "..#.....##..",
    "..#..E..#...",
    "..####..#...",
    ".......##...",
    "............",
    "S...........",
];

const MAX_DEMO_TICKS: u64 = 2_000;

fn setup_file_logging() -> std::io::Result<PathBuf> {
    let log_dir = PathBuf::from("logs");
    fs::create_dir_all(&log_dir)?;

    // Keep only the last 25 runs
    cleanup_old_logs(&log_dir, 25);

    let now = chrono::Local::now();
    let log_filename = format!("gridwalk_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_file_path = log_dir.join(&log_filename);

    let file_appender = RollingFileAppender::new(Rotation::NEVER, &log_dir, &log_filename);

    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);

    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bevy_ecs=info,gridwalk=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(log_file_path)
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };

    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|s| s.starts_with("gridwalk") && s.ends_with(".log"))
        })
        .collect();

    // Oldest first
    log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

    if log_files.len() > keep_count {
        for file in log_files.iter().take(log_files.len() - keep_count) {
            let _ = fs::remove_file(file.path());
        }
    }
}

/// Agents to spawn and where each one should go.
#[derive(Resource, Debug, Clone)]
struct DemoScenario {
    routes: Vec<(FixedVec2, FixedVec2)>,
}

#[derive(Resource, Debug, Default)]
struct DemoProgress {
    remaining: usize,
}

fn builtin_map() -> Result<NavMapData, gridwalk::nav::error::NavError> {
    let grid = NavGrid::from_rows(DEMO_LAYOUT, FixedNum::from_num(0.5), FixedVec2::ZERO)?;
    let spawn_points = vec![
        grid.grid_to_world(0, 0),
        grid.grid_to_world(5, 4),
        grid.grid_to_world(11, 7),
        grid.grid_to_world(11, 0),
    ];
    Ok(NavMapData::new(grid, spawn_points))
}

/// Pair each spawn point with the one after it so every agent crosses the map.
fn routes_for(map: &NavMapData) -> Vec<(FixedVec2, FixedVec2)> {
    let points = &map.spawn_points;
    if points.len() < 2 {
        let far_corner = map.grid.grid_to_world(map.grid.width() - 1, map.grid.height() - 1);
        return vec![(map.grid.grid_to_world(0, 0), far_corner)];
    }
    (0..points.len())
        .map(|i| (points[i], points[(i + 1) % points.len()]))
        .collect()
}

fn spawn_agents(
    mut commands: Commands,
    scenario: Res<DemoScenario>,
    mut progress: ResMut<DemoProgress>,
    mut start_follow: MessageWriter<StartFollow>,
) {
    for &(start, target) in &scenario.routes {
        let entity = commands.spawn(agent_bundle(start)).id();
        start_follow.write(StartFollow { entity, target });
        info!("Agent {:?}: {:?} -> {:?}", entity, start.to_vec2(), target.to_vec2());
    }
    progress.remaining = scenario.routes.len();
}

fn track_completions(
    mut completed: MessageReader<FollowCompleted>,
    mut progress: ResMut<DemoProgress>,
    tick: Res<SimTick>,
    mut exit: MessageWriter<AppExit>,
) {
    for done in completed.read() {
        progress.remaining = progress.remaining.saturating_sub(1);
        info!(
            "Agent {:?} arrived at {:?} on tick {} ({} still walking)",
            done.entity,
            done.target.to_vec2(),
            tick.0,
            progress.remaining
        );
    }

    if progress.remaining == 0 {
        info!("All agents arrived after {} ticks", tick.0);
        exit.write(AppExit::Success);
    } else if tick.0 >= MAX_DEMO_TICKS {
        warn!("Giving up after {} ticks with {} agents still walking", tick.0, progress.remaining);
        exit.write(AppExit::error());
    }
}

fn main() -> AppExit {
    match setup_file_logging() {
        Ok(log_file) => println!("Logging to {}", log_file.display()),
        Err(e) => eprintln!("File logging disabled: {}", e),
    }

    let mut args = std::env::args().skip(1);
    let map = match args.next().as_deref() {
        Some("--export") => {
            let Some(path) = args.next() else {
                error!("usage: gridwalk --export <map.bin>");
                return AppExit::error();
            };
            return match builtin_map().and_then(|map| save_map(&path, &map)) {
                Ok(()) => {
                    info!("Wrote built-in map to {}", path);
                    AppExit::Success
                }
                Err(e) => {
                    error!("Failed to export map: {}", e);
                    AppExit::error()
                }
            };
        }
        Some(path) => load_map(path).inspect(|_| info!("Loaded map from {}", path)),
        None => builtin_map(),
    };

    let map = match map {
        Ok(map) => map,
        Err(e) => {
            error!("Failed to prepare map: {}", e);
            return AppExit::error();
        }
    };

    info!(
        "Map {}x{} with {} spawn points",
        map.grid.width(),
        map.grid.height(),
        map.spawn_points.len()
    );

    let colliders = StaticColliders::from_grid_obstacles(&map.grid, map.grid.node_radius());
    let routes = routes_for(&map);

    App::new()
        .add_plugins(MinimalPlugins)
        .add_plugins(NavPlugin)
        .insert_resource(map.grid)
        .insert_resource(colliders)
        .insert_resource(DemoScenario { routes })
        .init_resource::<DemoProgress>()
        .add_systems(Startup, spawn_agents)
        .add_systems(FixedUpdate, track_completions.after(NavSet::Follow))
        .run()
}
