use std::path::Path;

use nalgebra_glm as glm;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{EngineError, Result};

/// Tile id meaning "nothing here".
pub const EMPTY_TILE: i32 = -1;

/// Row-major grid of tile ids, immutable once loaded. Negative ids are
/// empty cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMap {
    width: i32,
    height: i32,
    data: Vec<i32>,
}

impl TileMap {
    /// Builds a map from `rows[y][x]`. Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<i32>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(EngineError::MapLoad("tile grid is empty".to_owned()));
        }
        let mut data = Vec::with_capacity(width * height);
        for (y, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(EngineError::MapLoad(format!(
                    "row {} has {} cells, expected {}",
                    y,
                    row.len(),
                    width
                )));
            }
            data.extend(row);
        }
        Ok(Self {
            width: width as i32,
            height: height as i32,
            data,
        })
    }

    /// Parses rows of integers. A line containing a comma is split on
    /// every comma, so an empty field is an error; otherwise cells are
    /// separated by runs of whitespace. Blank lines are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut rows = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let cells: Vec<&str> = if line.contains(',') {
                line.split(',').map(str::trim).collect()
            } else {
                line.split_whitespace().collect()
            };
            let row = cells
                .into_iter()
                .enumerate()
                .map(|(column, cell)| {
                    if cell.is_empty() {
                        return Err(EngineError::MapLoad(format!(
                            "line {}: cell {} is empty",
                            line_no + 1,
                            column + 1
                        )));
                    }
                    cell.parse::<i32>().map_err(|_| {
                        EngineError::MapLoad(format!(
                            "line {}: {:?} is not an integer",
                            line_no + 1,
                            cell
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }
        Self::from_rows(rows)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let map = Self::parse(&text)?;
        log::info!(
            "Loaded map {:?}: {}x{} tiles",
            path,
            map.width,
            map.height
        );
        Ok(map)
    }

    /// Random map drawing every cell from `ids`.
    pub fn generate(width: i32, height: i32, ids: &[i32], seed: u64) -> Result<Self> {
        if width <= 0 || height <= 0 || ids.is_empty() {
            return Err(EngineError::MapLoad(format!(
                "cannot generate a {}x{} map from {} ids",
                width,
                height,
                ids.len()
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let data = (0..width * height)
            .map(|_| ids[rng.gen_range(0..ids.len())])
            .collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Tile id at `pos`, or `None` outside the map.
    pub fn get(&self, pos: &glm::IVec2) -> Option<i32> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        Some(self.data[(pos.y * self.width + pos.x) as usize])
    }

    /// Number of chunks along each axis; edge chunks may be partial.
    pub fn chunk_extent(&self, side: i32) -> glm::IVec2 {
        glm::vec2(
            (self.width + side - 1).div_euclid(side),
            (self.height + side - 1).div_euclid(side),
        )
    }

    /// Non-empty cells of one chunk as `(local_pos, tile_id)` in row-major
    /// order. Cells past the map edge are skipped.
    pub fn chunk_block(
        &self,
        chunk: &glm::IVec2,
        side: i32,
    ) -> impl Iterator<Item = (glm::IVec2, i32)> + '_ {
        let origin = chunk * side;
        (0..side)
            .flat_map(move |ly| (0..side).map(move |lx| glm::vec2(lx, ly)))
            .filter_map(move |local| {
                self.get(&(origin + local))
                    .filter(|&id| id >= 0)
                    .map(|id| (local, id))
            })
    }

    /// Distinct non-empty ids, sorted.
    pub fn distinct_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.data.iter().copied().filter(|&id| id >= 0).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
