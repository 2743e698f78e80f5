use tracing::info;

/// Measurements for one solved (or failed) route.
#[derive(Debug, Clone, Copy)]
pub struct RouteRecord {
    pub manhattan: i32,
    pub path_length: i32,
    pub nodes_expanded: u32,
    pub wall_time_us: u128,
}

#[derive(Debug, Default)]
pub struct Stats {
    pub routes: usize,
    pub solved: usize,
    pub nodes_expanded: u64,
    pub time_us: u128,
}

impl Stats {
    pub fn record(&mut self, record: &RouteRecord) {
        self.routes += 1;
        if record.path_length >= 0 {
            self.solved += 1;
        }
        self.nodes_expanded += u64::from(record.nodes_expanded);
        self.time_us += record.wall_time_us;
    }

    pub fn print(&self) {
        let mean_expanded = self.nodes_expanded.checked_div(self.routes as u64).unwrap_or(0);
        let mean_time = self.time_us.checked_div(self.routes as u128).unwrap_or(0);
        info!(
            "Routes {:?} Solved {:?} Unsolved {:?} Expanded nodes total {:?} mean {:?} Time(microseconds) total {:?} mean {:?}",
            self.routes,
            self.solved,
            self.routes - self.solved,
            self.nodes_expanded,
            mean_expanded,
            self.time_us,
            mean_time
        );
    }
}
