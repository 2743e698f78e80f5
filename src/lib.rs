pub mod astar;
pub mod config;
pub mod grid;
pub mod heap;
pub mod map;
pub mod scenario;
pub mod stat;
pub mod tree;

pub use astar::{find_path, find_path_counted, Pathfinder, NO_PATH};
pub use grid::{Cell, Grid};
