use thiserror::Error;

use super::geometry::{Rect, Vec2};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TileType {
    #[default]
    Passable,
    Solid,
    JumpThroughPlatform,
}

impl TileType {
    fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' | ' ' => Some(Self::Passable),
            '#' => Some(Self::Solid),
            '=' => Some(Self::JumpThroughPlatform),
            _ => None,
        }
    }

    pub fn blocks_movement(self) -> bool {
        !matches!(self, Self::Passable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub col: u32,
    pub row: u32,
    pub tile_type: TileType,
    pub bounds: Rect,
}

/// Read-only tile lookups consumed by the collision resolver.
///
/// Off-map coordinates are open air: lookups return `None` instead of failing.
pub trait TileQuery {
    fn tile_at(&self, col: i32, row: i32) -> Option<Tile>;
    fn tiles_overlapping(&self, area: &Rect) -> Vec<Tile>;
}

/// Tilemap origin convention:
/// - `origin` is the world position of the top-left corner of tile (0,0).
/// - Tile (col,row) covers `origin + (col, row) * tile_size` with side `tile_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tilemap {
    width: u32,
    height: u32,
    tile_size: f32,
    origin: Vec2,
    tiles: Vec<TileType>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tile size must be a positive finite number, got {0}")]
    InvalidTileSize(f32),
    #[error("row {row} has {actual} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown tile glyph {glyph:?} at column {col}, row {row}")]
    UnknownGlyph { glyph: char, col: usize, row: usize },
}

impl Tilemap {
    pub fn new(
        width: u32,
        height: u32,
        tile_size: f32,
        origin: Vec2,
        tiles: Vec<TileType>,
    ) -> Result<Self, TilemapError> {
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(TilemapError::InvalidTileSize(tile_size));
        }
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(TilemapError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tile_size,
            origin,
            tiles,
        })
    }

    /// Builds a map from text rows: `#` solid, `=` jump-through platform,
    /// `.` or space passable.
    pub fn from_rows(tile_size: f32, rows: &[&str]) -> Result<Self, TilemapError> {
        let width = rows.first().map_or(0, |row| row.chars().count());
        let mut tiles = Vec::with_capacity(width * rows.len());
        for (row_index, row) in rows.iter().enumerate() {
            let columns = row.chars().count();
            if columns != width {
                return Err(TilemapError::RaggedRow {
                    row: row_index,
                    expected: width,
                    actual: columns,
                });
            }
            for (col, glyph) in row.chars().enumerate() {
                let tile_type = TileType::from_glyph(glyph).ok_or(TilemapError::UnknownGlyph {
                    glyph,
                    col,
                    row: row_index,
                })?;
                tiles.push(tile_type);
            }
        }
        Self::new(
            width as u32,
            rows.len() as u32,
            tile_size,
            Vec2::ZERO,
            tiles,
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * self.tile_size
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * self.tile_size
    }

    pub fn index_of(&self, col: u32, row: u32) -> Option<usize> {
        if col >= self.width || row >= self.height {
            return None;
        }
        Some(row as usize * self.width as usize + col as usize)
    }

    pub fn tile_type_at(&self, col: u32, row: u32) -> Option<TileType> {
        self.index_of(col, row)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Top-left world position of a tile, the anchor spawn points are given in.
    pub fn tile_location(&self, col: u32, row: u32) -> Vec2 {
        Vec2 {
            x: self.origin.x + col as f32 * self.tile_size,
            y: self.origin.y + row as f32 * self.tile_size,
        }
    }

    fn tile_bounds(&self, col: u32, row: u32) -> Rect {
        let location = self.tile_location(col, row);
        Rect::new(location.x, location.y, self.tile_size, self.tile_size)
    }

    /// Inclusive column/row span covered by `area`, clipped to the grid.
    fn covered_span(&self, area: &Rect) -> Option<(u32, u32, u32, u32)> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let raw_col_min = ((area.left() - self.origin.x) / self.tile_size).floor() as i64;
        let raw_col_max = ((area.right() - self.origin.x) / self.tile_size).ceil() as i64 - 1;
        let raw_row_min = ((area.top() - self.origin.y) / self.tile_size).floor() as i64;
        let raw_row_max = ((area.bottom() - self.origin.y) / self.tile_size).ceil() as i64 - 1;

        let col_min = raw_col_min.max(0);
        let col_max = raw_col_max.min(self.width as i64 - 1);
        let row_min = raw_row_min.max(0);
        let row_max = raw_row_max.min(self.height as i64 - 1);
        if col_min > col_max || row_min > row_max {
            return None;
        }
        Some((
            col_min as u32,
            col_max as u32,
            row_min as u32,
            row_max as u32,
        ))
    }
}

impl TileQuery for Tilemap {
    fn tile_at(&self, col: i32, row: i32) -> Option<Tile> {
        let col = u32::try_from(col).ok()?;
        let row = u32::try_from(row).ok()?;
        let tile_type = self.tile_type_at(col, row)?;
        Some(Tile {
            col,
            row,
            tile_type,
            bounds: self.tile_bounds(col, row),
        })
    }

    fn tiles_overlapping(&self, area: &Rect) -> Vec<Tile> {
        let Some((col_min, col_max, row_min, row_max)) = self.covered_span(area) else {
            return Vec::new();
        };
        let mut tiles = Vec::new();
        for row in row_min..=row_max {
            for col in col_min..=col_max {
                if let Some(tile_type) = self.tile_type_at(col, row) {
                    tiles.push(Tile {
                        col,
                        row,
                        tile_type,
                        bounds: self.tile_bounds(col, row),
                    });
                }
            }
        }
        tiles
    }
}
