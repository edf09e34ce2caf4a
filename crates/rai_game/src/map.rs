//! Static tile grid the level is built from.
//!
//! The map is addressed by (column, row) with row 0 at the top. The centre of
//! cell `(c, r)` sits at world `(c * tile_size, -r * tile_size)`, so the grid
//! hangs downward from the origin while world y grows upward. Tile id 0 is
//! empty space; every other id is solid and doubles as the tileset cell it is
//! drawn with.

use glam::Vec2;
use rai_core::animation::SheetLayout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tileset {
    pub texture: String,
    pub sheet: SheetLayout,
}

/// World-space edges of the whole grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapBounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

/// One drawable tile produced by [`TileMap::tile_quads`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileQuad {
    pub center: Vec2,
    pub size: f32,
    pub uv: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct TileMap {
    width: u32,
    height: u32,
    tile_size: f32,
    tiles: Vec<u32>,
    pub tileset: Tileset,
}

impl TileMap {
    pub fn new(
        width: u32,
        height: u32,
        tile_size: f32,
        tiles: Vec<u32>,
        tileset: Tileset,
    ) -> Result<Self, String> {
        if width == 0 || height == 0 {
            return Err(format!(
                "Map validation failed: grid must be at least 1x1, got {width}x{height}"
            ));
        }
        let expected = width as usize * height as usize;
        if tiles.len() != expected {
            return Err(format!(
                "Map validation failed: {width}x{height} grid needs {expected} tiles, found {}",
                tiles.len()
            ));
        }
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(format!(
                "Map validation failed: tile_size must be > 0, got {tile_size}"
            ));
        }
        tileset.sheet.validate()?;

        Ok(Self {
            width,
            height,
            tile_size,
            tiles,
            tileset,
        })
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

    /// Grid cell containing `point`, or `None` outside the grid.
    pub fn cell_at(&self, point: Vec2) -> Option<(u32, u32)> {
        let half = self.tile_size * 0.5;
        let col = ((point.x + half) / self.tile_size).floor();
        let row = ((-point.y + half) / self.tile_size).floor();
        if col < 0.0 || row < 0.0 || col >= self.width as f32 || row >= self.height as f32 {
            return None;
        }
        Some((col as u32, row as u32))
    }

    pub fn tile_at(&self, point: Vec2) -> Option<u32> {
        let (col, row) = self.cell_at(point)?;
        Some(self.tiles[(row * self.width + col) as usize])
    }

    pub fn tile_center(&self, col: u32, row: u32) -> Vec2 {
        Vec2::new(
            col as f32 * self.tile_size,
            -(row as f32) * self.tile_size,
        )
    }

    /// Penetration of `point` into the solid tile under it, measured per axis
    /// from the nearest tile edge. Empty cells and anything outside the grid
    /// give `None`.
    pub fn is_solid(&self, point: Vec2) -> Option<Vec2> {
        let (col, row) = self.cell_at(point)?;
        if self.tiles[(row * self.width + col) as usize] == 0 {
            return None;
        }
        let center = self.tile_center(col, row);
        let half = self.tile_size * 0.5;
        Some(Vec2::new(
            half - (point.x - center.x).abs(),
            half - (point.y - center.y).abs(),
        ))
    }

    pub fn bounds(&self) -> MapBounds {
        let half = self.tile_size * 0.5;
        MapBounds {
            left: -half,
            right: (self.width - 1) as f32 * self.tile_size + half,
            top: half,
            bottom: -((self.height - 1) as f32 * self.tile_size) - half,
        }
    }

    /// Drawable quads for every non-empty tile, in row-major order.
    pub fn tile_quads(&self) -> impl Iterator<Item = TileQuad> + '_ {
        self.tiles.iter().enumerate().filter_map(move |(i, &tile)| {
            if tile == 0 {
                return None;
            }
            let col = i as u32 % self.width;
            let row = i as u32 / self.width;
            Some(TileQuad {
                center: self.tile_center(col, row),
                size: self.tile_size,
                uv: self.tileset.sheet.uv_rect(tile),
            })
        })
    }
}

#[cfg(test)]
pub(crate) fn test_tileset() -> Tileset {
    Tileset {
        texture: "assets/images/world_tileset.png".to_string(),
        sheet: SheetLayout { cols: 16, rows: 16 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_map() -> TileMap {
        // 4x3 grid, bottom row solid, one block on the middle row.
        let tiles = vec![
            0, 0, 0, 0, //
            0, 0, 3, 0, //
            1, 1, 1, 1,
        ];
        TileMap::new(4, 3, 1.0, tiles, test_tileset()).expect("valid map")
    }

    #[test]
    fn rejects_wrong_tile_count() {
        let err = TileMap::new(4, 3, 1.0, vec![0; 11], test_tileset()).unwrap_err();
        assert!(err.contains("needs 12 tiles"));
    }

    #[test]
    fn rejects_empty_grid_and_bad_tile_size() {
        assert!(TileMap::new(0, 3, 1.0, vec![], test_tileset()).is_err());
        assert!(TileMap::new(1, 1, 0.0, vec![1], test_tileset()).is_err());
        assert!(TileMap::new(1, 1, f32::NAN, vec![1], test_tileset()).is_err());
    }

    #[test]
    fn cell_lookup_uses_tile_centres() {
        let map = floor_map();
        assert_eq!(map.cell_at(Vec2::new(0.0, 0.0)), Some((0, 0)));
        assert_eq!(map.cell_at(Vec2::new(0.49, -0.49)), Some((0, 0)));
        assert_eq!(map.cell_at(Vec2::new(0.5, -0.5)), Some((1, 1)));
        assert_eq!(map.cell_at(Vec2::new(3.0, -2.0)), Some((3, 2)));
        assert_eq!(map.tile_center(2, 1), Vec2::new(2.0, -1.0));
    }

    #[test]
    fn outside_the_grid_is_empty() {
        let map = floor_map();
        assert_eq!(map.tile_at(Vec2::new(-0.6, 0.0)), None);
        assert_eq!(map.tile_at(Vec2::new(0.0, 0.6)), None);
        assert_eq!(map.tile_at(Vec2::new(3.6, -2.0)), None);
        assert_eq!(map.tile_at(Vec2::new(0.0, -2.6)), None);
        assert!(map.is_solid(Vec2::new(0.0, -2.6)).is_none());
    }

    #[test]
    fn solid_tile_reports_penetration_per_axis() {
        let map = floor_map();
        let pen = map
            .is_solid(Vec2::new(1.2, -1.6))
            .expect("bottom row is solid");
        assert!((pen.x - 0.3).abs() < 1e-5);
        assert!((pen.y - 0.1).abs() < 1e-5);
        assert!(map.is_solid(Vec2::new(0.0, -1.0)).is_none());
        assert_eq!(map.tile_at(Vec2::new(2.0, -1.0)), Some(3));
    }

    #[test]
    fn bounds_span_every_cell() {
        let bounds = floor_map().bounds();
        assert_eq!(bounds.left, -0.5);
        assert_eq!(bounds.right, 3.5);
        assert_eq!(bounds.top, 0.5);
        assert_eq!(bounds.bottom, -2.5);
    }

    #[test]
    fn tile_quads_skip_empty_cells() {
        let map = floor_map();
        let quads: Vec<TileQuad> = map.tile_quads().collect();
        assert_eq!(quads.len(), 5);
        assert_eq!(quads[0].center, Vec2::new(2.0, -1.0));
        assert_eq!(quads[0].uv, map.tileset.sheet.uv_rect(3));
        assert_eq!(quads[1].center, Vec2::new(0.0, -2.0));
    }
}
