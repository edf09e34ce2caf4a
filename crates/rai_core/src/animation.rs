//! Direction-keyed sprite-sheet animation.
//!
//! Each animated sprite owns a table of four frame lists, one per facing
//! direction. Frames are cell indices into a uniform sprite sheet. All frames
//! share one fixed duration; elapsed time is tracked in integer microseconds
//! so that advancement is identical on every platform under the fixed-step
//! simulation.

use serde::Deserialize;

/// How long one animation frame stays on screen.
pub const FRAME_DURATION_US: u64 = 250_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Left,
    Right,
    Up,
    #[default]
    Down,
}

impl Facing {
    pub const ALL: [Facing; 4] = [Facing::Left, Facing::Right, Facing::Up, Facing::Down];

    pub fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// A sprite sheet cut into a uniform `cols` x `rows` grid, indexed row-major
/// from the top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SheetLayout {
    pub cols: u32,
    pub rows: u32,
}

impl SheetLayout {
    pub fn cell_count(&self) -> u32 {
        self.cols * self.rows
    }

    /// UV rectangle `[u0, v0, u1, v1]` of a cell, with v0 at the top edge.
    pub fn uv_rect(&self, index: u32) -> [f32; 4] {
        let cols = self.cols.max(1);
        let rows = self.rows.max(1);
        let w = 1.0 / cols as f32;
        let h = 1.0 / rows as f32;
        let u0 = (index % cols) as f32 * w;
        let v0 = (index / cols) as f32 * h;
        [u0, v0, u0 + w, v0 + h]
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.cols == 0 || self.rows == 0 {
            return Err("sheet must have at least one column and one row".to_string());
        }
        Ok(())
    }
}

/// Frame indices per facing direction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnimationTable {
    pub left: Vec<u32>,
    pub right: Vec<u32>,
    pub up: Vec<u32>,
    pub down: Vec<u32>,
}

impl AnimationTable {
    pub fn frames(&self, facing: Facing) -> &[u32] {
        match facing {
            Facing::Left => &self.left,
            Facing::Right => &self.right,
            Facing::Up => &self.up,
            Facing::Down => &self.down,
        }
    }

    /// Every direction needs at least one frame and every frame must exist
    /// on the sheet.
    pub fn validate(&self, sheet: SheetLayout) -> Result<(), String> {
        for facing in Facing::ALL {
            let frames = self.frames(facing);
            if frames.is_empty() {
                return Err(format!("animation '{}' has no frames", facing.label()));
            }
            if let Some(&bad) = frames.iter().find(|&&f| f >= sheet.cell_count()) {
                return Err(format!(
                    "animation '{}' frame {} is outside the {}x{} sheet",
                    facing.label(),
                    bad,
                    sheet.cols,
                    sheet.rows
                ));
            }
        }
        Ok(())
    }
}

/// Runtime state for one animated sprite.
#[derive(Debug, Clone, Default)]
pub struct AnimationState {
    pub facing: Facing,
    pub frame_index: usize,
    pub elapsed_us: u64,
}

impl AnimationState {
    pub fn new(facing: Facing) -> Self {
        Self {
            facing,
            frame_index: 0,
            elapsed_us: 0,
        }
    }

    /// Switching direction keeps the frame position so walk cycles stay in step.
    pub fn set_facing(&mut self, facing: Facing) {
        self.facing = facing;
    }

    /// Advance by `dt_us` and return the sheet cell to draw.
    pub fn tick(&mut self, dt_us: u64, table: &AnimationTable) -> u32 {
        let frames = table.frames(self.facing);
        if frames.is_empty() {
            return 0;
        }

        self.elapsed_us += dt_us;
        if self.elapsed_us >= FRAME_DURATION_US {
            self.elapsed_us = 0;
            self.frame_index = (self.frame_index + 1) % frames.len();
        }

        frames[self.frame_index % frames.len()]
    }

    pub fn current_cell(&self, table: &AnimationTable) -> u32 {
        let frames = table.frames(self.facing);
        if frames.is_empty() {
            return 0;
        }
        frames[self.frame_index % frames.len()]
    }
}

/// Convert a fixed-step delta in seconds into whole microseconds.
pub fn seconds_to_us(dt: f32) -> u64 {
    (f64::from(dt) * 1_000_000.0).round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_table() -> AnimationTable {
        AnimationTable {
            left: vec![4, 5, 6, 7],
            right: vec![8, 9, 10, 11],
            up: vec![12, 13, 14, 15],
            down: vec![0, 1, 2, 3],
        }
    }

    #[test]
    fn tick_holds_frame_until_duration_elapses() {
        let table = walk_table();
        let mut state = AnimationState::new(Facing::Right);
        assert_eq!(state.tick(0, &table), 8);
        assert_eq!(state.tick(FRAME_DURATION_US - 1, &table), 8);
        assert_eq!(state.tick(1, &table), 9);
        assert_eq!(state.elapsed_us, 0);
    }

    #[test]
    fn elapsed_resets_instead_of_carrying_over() {
        let table = walk_table();
        let mut state = AnimationState::new(Facing::Down);
        // Overshoot by a lot: only one frame advances and the excess is dropped.
        assert_eq!(state.tick(FRAME_DURATION_US * 3, &table), 1);
        assert_eq!(state.elapsed_us, 0);
    }

    #[test]
    fn frames_wrap_modulo_count() {
        let table = walk_table();
        let mut state = AnimationState::new(Facing::Left);
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(state.tick(FRAME_DURATION_US, &table));
        }
        assert_eq!(seen, vec![5, 6, 7, 4, 5]);
    }

    #[test]
    fn fixed_step_ticks_advance_every_fifteen_steps() {
        let table = walk_table();
        let mut state = AnimationState::new(Facing::Up);
        let dt_us = seconds_to_us(1.0 / 60.0);
        assert_eq!(dt_us, 16_667);
        for _ in 0..14 {
            assert_eq!(state.tick(dt_us, &table), 12);
        }
        assert_eq!(state.tick(dt_us, &table), 13);
    }

    #[test]
    fn facing_change_keeps_frame_position() {
        let table = walk_table();
        let mut state = AnimationState::new(Facing::Right);
        state.tick(FRAME_DURATION_US, &table);
        state.set_facing(Facing::Left);
        assert_eq!(state.current_cell(&table), 5);
    }

    #[test]
    fn determinism_identical_results() {
        let table = walk_table();
        let mut a = AnimationState::new(Facing::Right);
        let mut b = AnimationState::new(Facing::Right);
        for _ in 0..200 {
            assert_eq!(a.tick(16_667, &table), b.tick(16_667, &table));
        }
        assert_eq!(a.frame_index, b.frame_index);
        assert_eq!(a.elapsed_us, b.elapsed_us);
    }

    #[test]
    fn uv_rect_maps_row_major_cells() {
        let sheet = SheetLayout { cols: 4, rows: 4 };
        assert_eq!(sheet.uv_rect(0), [0.0, 0.0, 0.25, 0.25]);
        assert_eq!(sheet.uv_rect(5), [0.25, 0.25, 0.5, 0.5]);
        assert_eq!(sheet.uv_rect(15), [0.75, 0.75, 1.0, 1.0]);
    }

    #[test]
    fn validate_rejects_empty_direction() {
        let mut table = walk_table();
        table.up.clear();
        let err = table
            .validate(SheetLayout { cols: 4, rows: 4 })
            .expect_err("empty direction should fail");
        assert!(err.contains("'up' has no frames"));
    }

    #[test]
    fn validate_rejects_frame_outside_sheet() {
        let table = walk_table();
        let err = table
            .validate(SheetLayout { cols: 4, rows: 2 })
            .expect_err("frame 8 does not fit on a 4x2 sheet");
        assert!(err.contains("outside the 4x2 sheet"));
    }

    #[test]
    fn table_deserializes_from_json() {
        let table: AnimationTable = serde_json::from_str(
            r#"{ "left": [4,5], "right": [8,9], "up": [12], "down": [0,1,2] }"#,
        )
        .expect("table should parse");
        assert_eq!(table.frames(Facing::Down), &[0, 1, 2]);
        assert!(table.validate(SheetLayout { cols: 4, rows: 4 }).is_ok());
    }
}
