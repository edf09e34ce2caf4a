use glam::Vec2;
use rai_core::animation::{AnimationTable, SheetLayout};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::ai::{Ai, AiState, AiType, Jumper, Walker};
use crate::entity::{Body, Entity, SpriteSheet};
use crate::game::{Game, ENEMY_COUNT};
use crate::map::{TileMap, Tileset};

const SUPPORTED_VERSION: &str = "0.1";

#[derive(Debug, Deserialize, Clone)]
pub struct LevelFile {
    pub version: String,
    pub level_id: String,
    pub map: MapSection,
    pub gravity: f32,
    #[serde(default)]
    pub camera: CameraSection,
    pub player: ActorSection,
    pub enemies: Vec<EnemySection>,
    #[serde(default)]
    pub audio: Option<AudioSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapSection {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    pub tileset: TilesetSection,
    pub tiles: Vec<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TilesetSection {
    pub texture: String,
    pub cols: u32,
    pub rows: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CameraSection {
    #[serde(default = "default_view_width")]
    pub view_width: f32,
    #[serde(default = "default_horizontal_lead")]
    pub horizontal_lead: f32,
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            view_width: default_view_width(),
            horizontal_lead: default_horizontal_lead(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ActorSection {
    pub texture: String,
    pub sheet: SheetLayout,
    pub position: [f32; 2],
    pub speed: f32,
    pub jumping_power: f32,
    pub size: [f32; 2],
    pub animation: AnimationTable,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnemySection {
    #[serde(flatten)]
    pub actor: ActorSection,
    pub ai: AiSection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiSection {
    #[serde(rename = "type")]
    pub kind: AiType,
    pub state: AiState,
    /// Walker only: starting direction, negative for left.
    #[serde(default = "default_heading")]
    pub heading: f32,
    /// Walker only: seconds between turns in open space.
    #[serde(default)]
    pub turn_after: Option<f32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AudioSection {
    #[serde(default)]
    pub music: Option<String>,
    #[serde(default)]
    pub jump_sfx: Option<String>,
    #[serde(default = "default_music_volume")]
    pub music_volume: f32,
}

pub fn load_level_from_path(path: &Path) -> Result<LevelFile, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let level: LevelFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse level JSON {}: {e}", path.display()))?;
    validate_level(&level)?;
    Ok(level)
}

pub fn validate_level(level: &LevelFile) -> Result<(), String> {
    if level.version != SUPPORTED_VERSION {
        return Err(format!(
            "Level validation failed: unsupported version '{}' (expected '{SUPPORTED_VERSION}')",
            level.version
        ));
    }

    let map = &level.map;
    if map.width == 0 || map.height == 0 {
        return Err("Level validation failed: map width and height must be > 0".to_string());
    }
    let expected = map.width as usize * map.height as usize;
    if map.tiles.len() != expected {
        return Err(format!(
            "Level validation failed: map is {}x{} but has {} tiles (expected {expected})",
            map.width,
            map.height,
            map.tiles.len()
        ));
    }
    if !(map.tile_size > 0.0) {
        return Err("Level validation failed: tile_size must be > 0".to_string());
    }
    if map.tileset.cols == 0 || map.tileset.rows == 0 {
        return Err("Level validation failed: tileset needs at least one cell".to_string());
    }
    if !(level.camera.view_width > 0.0) {
        return Err("Level validation failed: camera view_width must be > 0".to_string());
    }

    validate_actor("player", &level.player)?;

    if level.enemies.len() != ENEMY_COUNT {
        return Err(format!(
            "Level validation failed: expected {ENEMY_COUNT} enemies, found {}",
            level.enemies.len()
        ));
    }
    for (index, enemy) in level.enemies.iter().enumerate() {
        validate_actor(&format!("enemy {index}"), &enemy.actor)?;
        if let Some(t) = enemy.ai.turn_after {
            if !(t > 0.0) {
                return Err(format!(
                    "Level validation failed: enemy {index} turn_after must be > 0"
                ));
            }
        }
    }

    if let Some(audio) = &level.audio {
        if !(0.0..=1.0).contains(&audio.music_volume) {
            return Err("Level validation failed: music_volume must be within 0..=1".to_string());
        }
    }

    Ok(())
}

fn validate_actor(name: &str, actor: &ActorSection) -> Result<(), String> {
    if actor.size[0] <= 0.0 || actor.size[1] <= 0.0 {
        return Err(format!(
            "Level validation failed: {name} size must be > 0 on both axes"
        ));
    }
    actor
        .sheet
        .validate()
        .and_then(|_| actor.animation.validate(actor.sheet))
        .map_err(|e| format!("Level validation failed: {name} {e}"))
}

/// Instantiate the runtime game from a validated level.
pub fn build_game(level: &LevelFile) -> Result<Game, String> {
    let map = TileMap::new(
        level.map.width,
        level.map.height,
        level.map.tile_size,
        level.map.tiles.clone(),
        Tileset {
            texture: level.map.tileset.texture.clone(),
            sheet: SheetLayout {
                cols: level.map.tileset.cols,
                rows: level.map.tileset.rows,
            },
        },
    )?;

    let gravity = Vec2::new(0.0, level.gravity);
    let player = Entity::player(build_body(&level.player, gravity), build_sprite(&level.player));

    let enemies: Vec<Entity> = level
        .enemies
        .iter()
        .map(|enemy| {
            let ai = match enemy.ai.kind {
                AiType::Walker => Ai::Walker(Walker::new(enemy.ai.heading, enemy.ai.turn_after)),
                AiType::Jumper => Ai::Jumper(Jumper),
            };
            Entity::enemy(
                build_body(&enemy.actor, gravity),
                ai,
                enemy.ai.state,
                build_sprite(&enemy.actor),
            )
        })
        .collect();
    let enemies: [Entity; ENEMY_COUNT] = enemies.try_into().map_err(|v: Vec<Entity>| {
        format!("Expected {ENEMY_COUNT} enemies, found {}", v.len())
    })?;

    let bounds = map.bounds();
    log::info!(
        "Level '{}' ready: {}x{} tiles spanning x {:.1}..{:.1}, y {:.1}..{:.1}",
        level.level_id,
        level.map.width,
        level.map.height,
        bounds.left,
        bounds.right,
        bounds.bottom,
        bounds.top
    );

    Ok(Game::new(map, player, enemies, level.camera.horizontal_lead))
}

fn build_body(actor: &ActorSection, gravity: Vec2) -> Body {
    let mut body = Body::new(
        Vec2::from(actor.position),
        Vec2::from(actor.size) * 0.5,
        actor.speed,
        actor.jumping_power,
    );
    body.acceleration = gravity;
    body
}

fn build_sprite(actor: &ActorSection) -> SpriteSheet {
    SpriteSheet {
        texture: actor.texture.clone(),
        sheet: actor.sheet,
        animations: actor.animation.clone(),
    }
}

const fn default_tile_size() -> f32 {
    1.0
}

const fn default_view_width() -> f32 {
    10.0
}

const fn default_horizontal_lead() -> f32 {
    0.01
}

const fn default_heading() -> f32 {
    -1.0
}

const fn default_music_volume() -> f32 {
    1.0 / 16.0
}
