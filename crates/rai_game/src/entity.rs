//! Player and enemy actors: integration, tile collision and sprite state.
//!
//! Motion is split per axis. Vertical motion is velocity driven and picks up
//! gravity through `acceleration`; horizontal motion is the movement intent
//! times `speed` with no momentum. Y is integrated and resolved before X, and
//! each edge is probed at its centre plus two corner samples pulled in by
//! `PROBE_INSET` so a wall touching the side does not read as floor.

use glam::Vec2;
use rai_core::animation::{
    seconds_to_us, AnimationState, AnimationTable, Facing, SheetLayout,
};

use crate::ai::{Ai, AiState, Behavior};
use crate::map::TileMap;

const PROBE_INSET: f32 = 0.001;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactState {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl ContactState {
    pub fn as_array(&self) -> [bool; 4] {
        [self.top, self.bottom, self.left, self.right]
    }
}

/// Physical state shared by every actor.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Movement intent in [-1, 1] per axis. Only x is consumed.
    pub movement: Vec2,
    pub speed: f32,
    pub jumping_power: f32,
    pub half_extents: Vec2,
    pub contacts: ContactState,
}

impl Body {
    pub fn new(position: Vec2, half_extents: Vec2, speed: f32, jumping_power: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            movement: Vec2::ZERO,
            speed,
            jumping_power,
            half_extents,
            contacts: ContactState::default(),
        }
    }

    /// Grounded jump. Returns whether the impulse was applied.
    pub fn jump(&mut self) -> bool {
        if !self.contacts.bottom {
            return false;
        }
        self.velocity.y = self.jumping_power;
        true
    }

    pub fn overlaps(&self, other: &Body) -> bool {
        let delta = (self.position - other.position).abs();
        let reach = self.half_extents + other.half_extents;
        delta.x < reach.x && delta.y < reach.y
    }

    fn resolve_map_y(&mut self, map: &TileMap) {
        let side = self.half_extents.x - PROBE_INSET;
        let probes = [0.0, -side, side];

        if self.velocity.y > 0.0 {
            let edge = self.position.y + self.half_extents.y;
            let hit = probes
                .iter()
                .find_map(|&dx| map.is_solid(Vec2::new(self.position.x + dx, edge)));
            if let Some(pen) = hit {
                self.position.y -= pen.y;
                self.velocity.y = 0.0;
                self.contacts.top = true;
            }
        } else if self.velocity.y < 0.0 {
            let edge = self.position.y - self.half_extents.y;
            let hit = probes
                .iter()
                .find_map(|&dx| map.is_solid(Vec2::new(self.position.x + dx, edge)));
            if let Some(pen) = hit {
                self.position.y += pen.y;
                self.velocity.y = 0.0;
                self.contacts.bottom = true;
            }
        }
    }

    fn resolve_map_x(&mut self, map: &TileMap) {
        let side = self.half_extents.y - PROBE_INSET;
        let probes = [0.0, side, -side];

        if self.velocity.x < 0.0 {
            let edge = self.position.x - self.half_extents.x;
            let hit = probes
                .iter()
                .find_map(|&dy| map.is_solid(Vec2::new(edge, self.position.y + dy)));
            if let Some(pen) = hit {
                self.position.x += pen.x;
                self.contacts.left = true;
            }
        } else if self.velocity.x > 0.0 {
            let edge = self.position.x + self.half_extents.x;
            let hit = probes
                .iter()
                .find_map(|&dy| map.is_solid(Vec2::new(edge, self.position.y + dy)));
            if let Some(pen) = hit {
                self.position.x -= pen.x;
                self.contacts.right = true;
            }
        }
    }

    fn resolve_bodies_y(&mut self, others: &[Entity]) {
        for other in others.iter().filter(|o| o.is_active()) {
            if !self.overlaps(&other.body) {
                continue;
            }
            let distance = (self.position.y - other.body.position.y).abs();
            let overlap = (distance - self.half_extents.y - other.body.half_extents.y).abs();
            if self.velocity.y > 0.0 {
                self.position.y -= overlap;
                self.velocity.y = 0.0;
                self.contacts.top = true;
            } else if self.velocity.y < 0.0 {
                self.position.y += overlap;
                self.velocity.y = 0.0;
                self.contacts.bottom = true;
            }
        }
    }

    fn resolve_bodies_x(&mut self, others: &[Entity]) {
        for other in others.iter().filter(|o| o.is_active()) {
            if !self.overlaps(&other.body) {
                continue;
            }
            let distance = (self.position.x - other.body.position.x).abs();
            let overlap = (distance - self.half_extents.x - other.body.half_extents.x).abs();
            if self.velocity.x > 0.0 {
                self.position.x -= overlap;
                self.contacts.right = true;
            } else if self.velocity.x < 0.0 {
                self.position.x += overlap;
                self.contacts.left = true;
            }
        }
    }
}

/// Texture and frame layout an actor is drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteSheet {
    pub texture: String,
    pub sheet: SheetLayout,
    pub animations: AnimationTable,
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub ai: Ai,
    pub state: AiState,
}

#[derive(Debug, Clone)]
pub enum EntityKind {
    Player,
    Enemy(Enemy),
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub body: Body,
    pub kind: EntityKind,
    pub sprite: SpriteSheet,
    pub animation: AnimationState,
    active: bool,
}

impl Entity {
    pub fn player(body: Body, sprite: SpriteSheet) -> Self {
        Self::new(body, EntityKind::Player, sprite)
    }

    /// Enemies start with the intent their behaviour wants, so the first tick
    /// already moves them.
    pub fn enemy(mut body: Body, ai: Ai, state: AiState, sprite: SpriteSheet) -> Self {
        ai.prime(state, &mut body);
        Self::new(body, EntityKind::Enemy(Enemy { ai, state }), sprite)
    }

    fn new(body: Body, kind: EntityKind, sprite: SpriteSheet) -> Self {
        let animation = AnimationState::new(Facing::default());
        Self {
            body,
            kind,
            sprite,
            animation,
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn jump(&mut self) -> bool {
        self.body.jump()
    }

    /// Box overlap test. Does not look at `active`; callers filter first.
    pub fn check_collision(&self, other: &Entity) -> bool {
        self.body.overlaps(&other.body)
    }

    /// Advance one fixed step against the map and, optionally, other actors.
    pub fn update(&mut self, dt: f32, others: &[Entity], map: &TileMap) {
        if !self.active {
            return;
        }

        let body = &mut self.body;
        body.contacts = ContactState::default();

        body.velocity.x = body.movement.x * body.speed;
        body.velocity += body.acceleration * dt;

        body.position.y += body.velocity.y * dt;
        body.resolve_map_y(map);
        body.resolve_bodies_y(others);

        body.position.x += body.velocity.x * dt;
        body.resolve_map_x(map);
        body.resolve_bodies_x(others);

        if body.movement.x < 0.0 {
            self.animation.set_facing(Facing::Left);
        } else if body.movement.x > 0.0 {
            self.animation.set_facing(Facing::Right);
        }
        self.animation.tick(seconds_to_us(dt), &self.sprite.animations);
    }

    /// Let an enemy's behaviour react to the step that just ran.
    pub fn run_ai(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        if let EntityKind::Enemy(enemy) = &mut self.kind {
            enemy.ai.think(enemy.state, &mut self.body, dt);
        }
    }

    /// UV rectangle of the frame currently shown.
    pub fn uv_rect(&self) -> [f32; 4] {
        let cell = self.animation.current_cell(&self.sprite.animations);
        self.sprite.sheet.uv_rect(cell)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::map::{test_tileset, TileMap};

    pub const GRAVITY: f32 = -4.905;

    pub fn sprite(texture: &str) -> SpriteSheet {
        SpriteSheet {
            texture: texture.to_string(),
            sheet: SheetLayout { cols: 4, rows: 4 },
            animations: AnimationTable {
                left: vec![4, 5, 6, 7],
                right: vec![8, 9, 10, 11],
                up: vec![12, 13, 14, 15],
                down: vec![0, 1, 2, 3],
            },
        }
    }

    pub fn body_at(x: f32, y: f32) -> Body {
        let mut body = Body::new(Vec2::new(x, y), Vec2::splat(0.45), 5.0, 3.0);
        body.acceleration = Vec2::new(0.0, GRAVITY);
        body
    }

    /// 8x8 grid: solid bottom row plus walls in columns 0 and 7 on row 6.
    pub fn walled_floor() -> TileMap {
        let mut tiles = vec![0; 64];
        for col in 0..8 {
            tiles[7 * 8 + col] = 1;
        }
        tiles[6 * 8] = 3;
        tiles[6 * 8 + 7] = 3;
        TileMap::new(8, 8, 1.0, tiles, test_tileset()).expect("valid map")
    }

    /// 1x8 column whose only solid tile is the bottom cell (0, 7).
    pub fn single_floor_tile() -> TileMap {
        let mut tiles = vec![0; 8];
        tiles[7] = 1;
        TileMap::new(1, 8, 1.0, tiles, test_tileset()).expect("valid map")
    }
}
