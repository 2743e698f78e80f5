use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};

/// An owned grid map loaded from a MovingAI `.map` file.
///
/// `.` parses as traversable and `@` as blocked; unknown glyphs fall back
/// to traversable. Cells are stored row-major as the bytes `find_path`
/// consumes directly.
#[derive(Debug, Clone)]
pub struct Map {
    pub width: i32,
    pub height: i32,
    cells: Vec<u8>,
}

impl Map {
    pub fn from_file(path: &str) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("failed to open map file {path:?}"))?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let _type = lines.next().context("missing type line")??;
        let height = lines
            .next()
            .context("missing height line")??
            .split_whitespace()
            .last()
            .context("malformed height line")?
            .parse::<i32>()?;
        let width = lines
            .next()
            .context("missing width line")??
            .split_whitespace()
            .last()
            .context("malformed width line")?
            .parse::<i32>()?;
        let _map = lines.next().context("missing map line")??;

        let mut cells = Vec::with_capacity((width * height) as usize);
        for line in lines.take(height as usize) {
            for ch in line?.chars() {
                cells.push(match ch {
                    '@' => 0,
                    _ => 1,
                });
            }
        }
        if cells.len() != (width * height) as usize {
            bail!(
                "map body has {} cells, header says {}x{}",
                cells.len(),
                width,
                height
            );
        }

        Ok(Map {
            width,
            height,
            cells,
        })
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn is_traversable(&self, x: i32, y: i32) -> bool {
        self.cells[(x + y * self.width) as usize] != 0
    }
}
