use tracing::{debug, instrument, trace};

use crate::grid::{Cell, Grid, NeighborList};
use crate::heap::MinHeap;
use crate::tree::RbTree;

/// Sentinel returned when no path exists or the shortest path does not fit
/// into the output buffer.
pub const NO_PATH: i32 = -1;

/// Index of a `SearchNode` in the pathfinder's arena.
type NodeRef = usize;

#[derive(Debug, Clone, Copy)]
struct SearchNode {
    id: u32,
    g: i32,
    f: f32,
    predecessor: Option<NodeRef>,
}

/// Single-use A* driver.
///
/// All search nodes live in an arena owned by the pathfinder; the open heap
/// and the closed tree only hold arena indices. A node sits in exactly one
/// of the two containers at any time: popping moves it from open to closed,
/// and nothing is ever removed from closed. Dropping the pathfinder releases
/// every node regardless of how the search ended.
pub struct Pathfinder<'a> {
    grid: Grid<'a>,
    open: MinHeap<f32, NodeRef>,
    closed: RbTree<u32, NodeRef>,
    nodes: Vec<SearchNode>,
    out_buffer: &'a mut [i32],
    nodes_expanded: u32,
}

impl<'a> Pathfinder<'a> {
    pub fn new(grid: Grid<'a>, out_buffer: &'a mut [i32]) -> Self {
        Pathfinder {
            grid,
            open: MinHeap::new(),
            closed: RbTree::new(),
            nodes: Vec::new(),
            out_buffer,
            nodes_expanded: 0,
        }
    }

    /// Number of search nodes allocated during the search, not counting
    /// the start node.
    pub fn nodes_expanded(&self) -> u32 {
        self.nodes_expanded
    }

    #[instrument(skip_all, name = "a_star", fields(start = format!("{start:?}"), target = format!("{target:?}")), level = "debug")]
    pub fn search(&mut self, start: Cell, target: Cell) -> i32 {
        let target_id = self.grid.cell_id(target);
        self.grid.set_target(target);

        // The start's own heuristic never matters, it is popped first.
        let start_node = SearchNode {
            id: self.grid.cell_id(start),
            g: 0,
            f: 0.0,
            predecessor: None,
        };
        self.nodes.push(start_node);
        self.open.insert(start_node.f, 0);

        let mut neighbors = NeighborList::default();
        let mut path_length = NO_PATH;
        while let Ok(item) = self.open.pop_min() {
            let cur = item.data;
            trace!(
                "expand node: id {} g {} f {}",
                self.nodes[cur].id,
                self.nodes[cur].g,
                item.key
            );
            self.closed.insert(self.nodes[cur].id, cur);
            if self.nodes[cur].id == target_id {
                path_length = self.backtrack(cur);
                break;
            }
            self.expand(cur, &mut neighbors);
        }

        debug!(
            "search finished: path length {}, nodes expanded {}",
            path_length, self.nodes_expanded
        );
        path_length
    }

    fn expand(&mut self, cur: NodeRef, neighbors: &mut NeighborList) {
        let capacity = self.out_buffer.len() as i32;
        let cur_id = self.nodes[cur].id;
        let prev_id = self.nodes[cur].predecessor.map(|p| self.nodes[p].id);
        let g_next = self.nodes[cur].g + 1;

        self.grid.neighbors_into(cur_id, prev_id, neighbors);
        for &succ_id in neighbors.as_slice() {
            if self.closed.contains(&succ_id) {
                continue;
            }

            let open_entry = self
                .open
                .find_by(|item| self.nodes[item.data].id == succ_id)
                .and_then(|slot| self.open.get(slot).map(|item| (slot, item.data)));
            if let Some((_, node_ref)) = open_entry {
                if self.nodes[node_ref].g <= g_next {
                    continue;
                }
            }

            // Unit edges: g plus the Manhattan distance bounds the length of
            // any path through this neighbor from below, so nothing that
            // cannot fit into the output buffer is worth queueing.
            if g_next + self.grid.manhattan(succ_id) > capacity {
                continue;
            }

            let f_next = g_next as f32 + self.grid.heuristic(succ_id);
            match open_entry {
                Some((slot, node_ref)) => {
                    let node = &mut self.nodes[node_ref];
                    node.g = g_next;
                    node.f = f_next;
                    node.predecessor = Some(cur);
                    self.open
                        .change_key(slot, f_next)
                        .expect("open-set slot came from find_by");
                }
                None => {
                    self.nodes_expanded += 1;
                    let node_ref = self.nodes.len();
                    let node = SearchNode {
                        id: succ_id,
                        g: g_next,
                        f: f_next,
                        predecessor: Some(cur),
                    };
                    self.nodes.push(node);
                    self.open.insert(node.f, node_ref);
                }
            }
        }
    }

    /// Walks the predecessor chain from the goal, writing each cell id at
    /// buffer index `g - 1` so the entries run start-adjacent to goal. The
    /// start itself (predecessor `None`) is not written.
    fn backtrack(&mut self, goal: NodeRef) -> i32 {
        let mut cur = goal;
        while let Some(prev) = self.nodes[cur].predecessor {
            self.out_buffer[(self.nodes[cur].g - 1) as usize] = self.nodes[cur].id as i32;
            cur = prev;
        }
        self.nodes[goal].g
    }
}

/// Finds a shortest path between two traversable cells on a rectangular
/// grid, moving in the four cardinal directions only.
///
/// `map` is row-major, `width * height` bytes, `0` blocked and anything
/// else traversable. On success the cell ids of the path, excluding the
/// start but including the target, are written to `out_buffer` and the
/// path length is returned; `length == 0` means start and target coincide.
/// Returns [`NO_PATH`] when no path exists or the shortest path is longer
/// than `out_buffer`. A path of exactly `out_buffer.len()` moves fits.
///
/// The caller guarantees that both endpoints are inside the grid and
/// traversable.
#[allow(clippy::too_many_arguments)]
pub fn find_path(
    start_x: i32,
    start_y: i32,
    target_x: i32,
    target_y: i32,
    map: &[u8],
    width: i32,
    height: i32,
    out_buffer: &mut [i32],
) -> i32 {
    find_path_counted(
        start_x, start_y, target_x, target_y, map, width, height, out_buffer,
    )
    .0
}

/// Same contract as [`find_path`], additionally reporting how many search
/// nodes the run allocated. Purely observational; the path result is
/// identical.
#[allow(clippy::too_many_arguments)]
pub fn find_path_counted(
    start_x: i32,
    start_y: i32,
    target_x: i32,
    target_y: i32,
    map: &[u8],
    width: i32,
    height: i32,
    out_buffer: &mut [i32],
) -> (i32, u32) {
    let grid = Grid::new(width, height, map);
    let mut pathfinder = Pathfinder::new(grid, out_buffer);
    let length = pathfinder.search(Cell::new(start_x, start_y), Cell::new(target_x, target_y));
    (length, pathfinder.nodes_expanded())
}
