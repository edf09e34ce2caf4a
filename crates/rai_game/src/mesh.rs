//! CPU-side sprite mesh, rebuilt every frame.
//!
//! Quads are emitted in painter's order (player, map tiles, active enemies)
//! into one vertex/index stream. Consecutive quads that share a texture are
//! merged into a single draw call.

use std::collections::BTreeSet;
use std::sync::Arc;

use glam::Vec2;
use rai_render::vertex::QUAD_INDICES;
use rai_render::SpriteVertex;

use crate::entity::Entity;
use crate::game::Game;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// A contiguous run of indices drawn with one texture binding.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub texture_key: Arc<str>,
    pub index_start: u32,
    pub index_count: u32,
}

struct QuadSpec<'a> {
    texture_key: &'a str,
    center: Vec2,
    size: Vec2,
    uv: [f32; 4],
}

#[derive(Debug, Default)]
pub struct SceneMesh {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
    pub draw_calls: Vec<DrawCall>,
}

impl SceneMesh {
    pub fn build(game: &Game) -> Self {
        let tile_count = game.map.tile_quads().count();
        let quad_estimate = tile_count + 1 + game.enemies.len();
        let mut mesh = Self {
            vertices: Vec::with_capacity(quad_estimate * 4),
            indices: Vec::with_capacity(quad_estimate * 6),
            draw_calls: Vec::with_capacity(4),
        };
        let sprite_size = Vec2::splat(game.map.tile_size());

        mesh.add_entity(&game.player, sprite_size);

        let tileset = game.map.tileset.texture.as_str();
        for tile in game.map.tile_quads() {
            mesh.add_quad(QuadSpec {
                texture_key: tileset,
                center: tile.center,
                size: Vec2::splat(tile.size),
                uv: tile.uv,
            });
        }

        for enemy in game.enemies.iter().filter(|e| e.is_active()) {
            mesh.add_entity(enemy, sprite_size);
        }

        mesh
    }

    pub fn sprite_count(&self) -> usize {
        self.vertices.len() / 4
    }

    fn add_entity(&mut self, entity: &Entity, size: Vec2) {
        self.add_quad(QuadSpec {
            texture_key: &entity.sprite.texture,
            center: entity.body.position,
            size,
            uv: entity.uv_rect(),
        });
    }

    fn add_quad(&mut self, spec: QuadSpec<'_>) {
        let base_index = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&SpriteVertex::quad(
            spec.center.to_array(),
            spec.size.to_array(),
            spec.uv,
            WHITE,
        ));

        let draw_start = self.indices.len() as u32;
        self.indices.extend(QUAD_INDICES.iter().map(|i| base_index + i));

        push_draw_call(
            &mut self.draw_calls,
            spec.texture_key,
            draw_start,
            QUAD_INDICES.len() as u32,
        );
    }
}

/// Append a draw call, extending the previous one when the texture matches
/// and the indices are contiguous.
fn push_draw_call(
    draw_calls: &mut Vec<DrawCall>,
    texture_key: &str,
    index_start: u32,
    index_count: u32,
) {
    if let Some(last) = draw_calls.last_mut() {
        let contiguous = last.index_start + last.index_count == index_start;
        if &*last.texture_key == texture_key && contiguous {
            last.index_count += index_count;
            return;
        }
    }
    draw_calls.push(DrawCall {
        texture_key: Arc::from(texture_key),
        index_start,
        index_count,
    });
}

/// Every texture the level can draw with, in a stable order.
pub fn texture_keys(game: &Game) -> BTreeSet<String> {
    std::iter::once(&game.player)
        .chain(game.enemies.iter())
        .map(|e| e.sprite.texture.clone())
        .chain(std::iter::once(game.map.tileset.texture.clone()))
        .collect()
}
