//! Game context: owns the level and drives it at a fixed step.
//!
//! A frame turns input into a [`PlayerIntent`], feeds wall-clock time into the
//! accumulator and then runs whole ticks. One tick updates the player, then
//! each enemy followed by its behaviour and the stomp check.

use glam::Vec2;
use rai_core::input::{InputState, Key};
use rai_core::time::TimeState;

use crate::ai::Behavior;
use crate::entity::{Entity, EntityKind};
use crate::map::TileMap;

pub const ENEMY_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Running,
    Paused,
    Terminated,
}

impl GameStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Terminated => "terminated",
        }
    }
}

/// What the player asked for this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerIntent {
    pub move_x: f32,
    pub jump: bool,
    pub quit: bool,
}

impl PlayerIntent {
    /// Left wins over Right when both are held. Jump only counts on the press.
    pub fn from_input(input: &InputState) -> Self {
        let move_x = if input.is_held(Key::Left) {
            -1.0
        } else if input.is_held(Key::Right) {
            1.0
        } else {
            0.0
        };
        Self {
            move_x,
            jump: input.is_just_pressed(Key::Space),
            quit: input.quit_requested(),
        }
    }
}

/// Outcome of one frame, for the caller's side effects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub steps: u32,
    pub jumped: bool,
    pub enemies_defeated: u32,
}

pub struct Game {
    pub map: TileMap,
    pub player: Entity,
    pub enemies: [Entity; ENEMY_COUNT],
    pub enemies_killed: u32,
    pub time: TimeState,
    pub camera: Vec2,
    pub camera_lead: f32,
    status: GameStatus,
}

/// The player defeats an enemy by touching it from above its top edge.
pub fn is_stomp(player: &Entity, enemy: &Entity) -> bool {
    player.check_collision(enemy)
        && player.body.position.y > enemy.body.position.y + enemy.body.half_extents.y
}

impl Game {
    pub fn new(
        map: TileMap,
        player: Entity,
        enemies: [Entity; ENEMY_COUNT],
        camera_lead: f32,
    ) -> Self {
        let mut game = Self {
            map,
            player,
            enemies,
            enemies_killed: 0,
            time: TimeState::new(),
            camera: Vec2::ZERO,
            camera_lead,
            status: GameStatus::Running,
        };
        game.update_camera();
        game
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_terminated(&self) -> bool {
        self.status == GameStatus::Terminated
    }

    pub fn active_enemies(&self) -> usize {
        self.enemies.iter().filter(|e| e.is_active()).count()
    }

    /// Pause or resume. Terminated is final.
    pub fn toggle_pause(&mut self) {
        self.status = match self.status {
            GameStatus::Running => GameStatus::Paused,
            GameStatus::Paused => GameStatus::Running,
            GameStatus::Terminated => return,
        };
        log::info!("Simulation {}", self.status.label());
    }

    pub fn terminate(&mut self) {
        if self.status != GameStatus::Terminated {
            self.status = GameStatus::Terminated;
            log::info!(
                "Game over after {} steps, {} enemies defeated",
                self.time.fixed_step_count,
                self.enemies_killed
            );
        }
    }

    /// One frame against the wall clock.
    pub fn update(&mut self, intent: PlayerIntent) -> FrameReport {
        let jumped = self.apply_intent(intent);
        if self.is_terminated() {
            return FrameReport::default();
        }
        self.time.begin_frame();
        self.run_frame(jumped)
    }

    /// One frame with an explicit elapsed time. Replays and tests go through
    /// here so the step count does not depend on the host clock.
    pub fn update_with_delta(&mut self, intent: PlayerIntent, real_dt: f64) -> FrameReport {
        let jumped = self.apply_intent(intent);
        if self.is_terminated() {
            return FrameReport::default();
        }
        self.time.advance(real_dt);
        self.run_frame(jumped)
    }

    /// Run exactly one tick while paused.
    pub fn single_step(&mut self) -> FrameReport {
        if self.status != GameStatus::Paused {
            return FrameReport::default();
        }
        let enemies_defeated = self.tick(self.time.fixed_dt as f32);
        self.time.fixed_step_count += 1;
        self.time.total_time += self.time.fixed_dt;
        self.update_camera();
        FrameReport {
            steps: 1,
            jumped: false,
            enemies_defeated,
        }
    }

    fn apply_intent(&mut self, intent: PlayerIntent) -> bool {
        if intent.quit {
            self.terminate();
            return false;
        }
        self.player.body.movement = Vec2::new(intent.move_x.clamp(-1.0, 1.0), 0.0);
        self.status == GameStatus::Running && intent.jump && self.player.jump()
    }

    fn run_frame(&mut self, jumped: bool) -> FrameReport {
        let mut report = FrameReport {
            jumped,
            ..FrameReport::default()
        };

        if self.status == GameStatus::Paused {
            self.time.discard_accumulator();
            return report;
        }

        let dt = self.time.fixed_dt as f32;
        while self.time.should_step() {
            report.enemies_defeated += self.tick(dt);
            report.steps += 1;
        }
        self.update_camera();
        report
    }

    /// One fixed step. Returns the number of enemies defeated in it.
    fn tick(&mut self, dt: f32) -> u32 {
        self.player.update(dt, &[], &self.map);

        let mut defeated = 0;
        for (index, enemy) in self.enemies.iter_mut().enumerate() {
            enemy.update(dt, &[], &self.map);
            enemy.run_ai(dt);

            if enemy.is_active() && self.player.is_active() && is_stomp(&self.player, enemy) {
                enemy.deactivate();
                let kind = match &enemy.kind {
                    EntityKind::Enemy(e) => e.ai.ai_type().label(),
                    EntityKind::Player => "player",
                };
                self.enemies_killed += 1;
                defeated += 1;
                log::info!(
                    "Enemy {index} ({kind}) defeated at ({:.2}, {:.2}), total {}",
                    enemy.body.position.x,
                    enemy.body.position.y,
                    self.enemies_killed
                );
            }
        }
        defeated
    }

    fn update_camera(&mut self) {
        let p = self.player.body.position;
        self.camera = Vec2::new(p.x * (1.0 + self.camera_lead), p.y);
    }
}
