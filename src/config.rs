use anyhow::bail;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(name = "grid-astar", about = "A* shortest paths on 2D grid maps.", version = "0.1")]
pub struct Cli {
    #[arg(long, short, help = "Path to the YAML config file")]
    pub config: Option<String>,
    #[arg(long, help = "Path to the map file")]
    pub map: Option<String>,
    #[arg(long, help = "Path to a scenario file with routes to solve")]
    pub scen: Option<String>,
    #[arg(long, help = "Number of random routes when no scenario is given")]
    pub routes: Option<usize>,
    #[arg(long, help = "Seed for random route generation")]
    pub seed: Option<u64>,
    #[arg(long, help = "Capacity of the path output buffer")]
    pub buffer_capacity: Option<usize>,
}

#[derive(Serialize, Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub map_path: String,
    pub scen_path: Option<String>,
    pub routes: usize,
    pub seed: Option<u64>,
    pub buffer_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            map_path: "map_file/test/test.map".to_string(),
            scen_path: None,
            routes: 100,
            seed: None,
            buffer_capacity: 1024,
        }
    }
}

impl Config {
    pub fn from_yaml_str(config_str: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(config_str)?;
        config.validate()
    }

    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(map) = &cli.map {
            self.map_path = map.clone();
        }
        if let Some(scen) = &cli.scen {
            self.scen_path = Some(scen.clone());
        }
        if let Some(routes) = cli.routes {
            self.routes = routes;
        }
        if let Some(seed) = cli.seed {
            self.seed = Some(seed);
        }
        if let Some(capacity) = cli.buffer_capacity {
            self.buffer_capacity = capacity;
        }
        self.validate()
    }

    pub fn validate(self) -> anyhow::Result<Self> {
        if self.map_path.is_empty() {
            bail!("map_path must not be empty");
        }
        if self.scen_path.is_none() && self.routes == 0 {
            bail!("routes must be positive when no scenario file is given");
        }
        Ok(self)
    }
}
