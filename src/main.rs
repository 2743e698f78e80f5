use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use grid_astar::astar::find_path_counted;
use grid_astar::config::{Cli, Config};
use grid_astar::map::Map;
use grid_astar::scenario::{Route, Scenario};
use grid_astar::stat::{RouteRecord, Stats};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {path:?}"))?;
            Config::from_yaml_str(&raw)?
        }
        None => Config::default(),
    };
    let config = config.override_from_command_line(&cli)?;

    let map = Map::from_file(&config.map_path)?;
    info!(
        "map {:?} loaded: {}x{}",
        config.map_path, map.width, map.height
    );

    let routes: Vec<Route> = match &config.scen_path {
        Some(path) => {
            let scenario = Scenario::load_from_scen(path)?;
            info!("scenario {:?}: {} routes", path, scenario.routes.len());
            scenario.routes
        }
        None => {
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            Scenario::random_routes(&map, config.routes, &mut rng)
        }
    };

    // One buffer reused across all routes; entries past the returned length
    // are stale.
    let mut out_buffer = vec![0i32; config.buffer_capacity];
    let mut stats = Stats::default();
    for (index, route) in routes.iter().enumerate() {
        let started = Instant::now();
        let (path_length, nodes_expanded) = find_path_counted(
            route.start_x,
            route.start_y,
            route.goal_x,
            route.goal_y,
            map.cells(),
            map.width,
            map.height,
            &mut out_buffer,
        );
        let wall_time_us = started.elapsed().as_micros();

        debug!(
            "route {}: ({}, {}) -> ({}, {}) manhattan {} length {} expanded {} in {}us",
            index,
            route.start_x,
            route.start_y,
            route.goal_x,
            route.goal_y,
            route.manhattan(),
            path_length,
            nodes_expanded,
            wall_time_us
        );
        stats.record(&RouteRecord {
            manhattan: route.manhattan(),
            path_length,
            nodes_expanded,
            wall_time_us,
        });
    }

    stats.print();
    Ok(())
}
