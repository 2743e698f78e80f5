use anyhow::{Context, Result};
use rand::Rng;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::map::Map;

/// One start/goal pair to solve.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Route {
    pub start_x: i32,
    pub start_y: i32,
    pub goal_x: i32,
    pub goal_y: i32,
}

impl Route {
    /// Shortest conceivable path length, ignoring obstacles.
    pub fn manhattan(&self) -> i32 {
        (self.goal_x - self.start_x).abs() + (self.goal_y - self.start_y).abs()
    }
}

#[derive(Debug)]
pub struct Scenario {
    pub map: String,
    pub map_width: i32,
    pub map_height: i32,
    pub routes: Vec<Route>,
}

impl Scenario {
    /// Loads a MovingAI `.scen` file. Columns per line: bucket, map name,
    /// map width, map height, start x, start y, goal x, goal y, optimal
    /// length. The bucket and optimal-length columns are ignored.
    pub fn load_from_scen(path: &str) -> Result<Scenario> {
        let file =
            File::open(path).with_context(|| format!("failed to open scenario file {path:?}"))?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        // First line is "version x.x".
        let _version = lines.next().context("empty scenario file")??;

        let mut scenario = Scenario {
            map: String::new(),
            map_width: 0,
            map_height: 0,
            routes: Vec::new(),
        };

        for line in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();

            if scenario.map.is_empty() {
                // Map details come from the first route entry.
                scenario.map = parts[1].to_string();
                scenario.map_width = parts[2].parse().unwrap();
                scenario.map_height = parts[3].parse().unwrap();
            }

            scenario.routes.push(Route {
                start_x: parts[4].parse().unwrap(),
                start_y: parts[5].parse().unwrap(),
                goal_x: parts[6].parse().unwrap(),
                goal_y: parts[7].parse().unwrap(),
            });
        }

        Ok(scenario)
    }

    /// Draws `count` routes with uniformly random traversable endpoints.
    pub fn random_routes<R: Rng + ?Sized>(map: &Map, count: usize, rng: &mut R) -> Vec<Route> {
        (0..count)
            .map(|_| {
                let (start_x, start_y) = sample_traversable(map, rng);
                let (goal_x, goal_y) = sample_traversable(map, rng);
                Route {
                    start_x,
                    start_y,
                    goal_x,
                    goal_y,
                }
            })
            .collect()
    }
}

fn sample_traversable<R: Rng + ?Sized>(map: &Map, rng: &mut R) -> (i32, i32) {
    loop {
        let x = rng.gen_range(0..map.width);
        let y = rng.gen_range(0..map.height);
        if map.is_traversable(x, y) {
            return (x, y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_load_scen() {
        let scenario = Scenario::load_from_scen("map_file/test/test.scen").unwrap();

        assert_eq!(scenario.map, "test.map");
        assert_eq!(scenario.map_width, 8);
        assert_eq!(scenario.map_height, 8);
        assert_eq!(scenario.routes.len(), 3);
        assert_eq!(
            scenario.routes[0],
            Route {
                start_x: 0,
                start_y: 0,
                goal_x: 7,
                goal_y: 7,
            }
        );
        assert_eq!(scenario.routes[0].manhattan(), 14);
    }

    #[test]
    fn test_random_routes_are_traversable() {
        let map = Map::from_file("map_file/test/test.map").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let routes = Scenario::random_routes(&map, 50, &mut rng);

        assert_eq!(routes.len(), 50);
        for route in &routes {
            assert!(map.is_traversable(route.start_x, route.start_y));
            assert!(map.is_traversable(route.goal_x, route.goal_y));
        }
    }
}
