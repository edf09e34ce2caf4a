//! Enemy behaviours.
//!
//! A behaviour runs once per fixed step, after physics, and only reads the
//! body it drives: its contact flags and its own timers. Nothing here looks at
//! the player or at input.

use serde::Deserialize;

use crate::entity::Body;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiType {
    Walker,
    Jumper,
}

impl AiType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Walker => "walker",
            Self::Jumper => "jumper",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiState {
    Walking,
    Jumping,
    Idle,
}

pub trait Behavior {
    fn ai_type(&self) -> AiType;

    /// Set the starting intent before the first step.
    fn prime(&self, state: AiState, body: &mut Body);

    /// React to the step that just ran.
    fn think(&mut self, state: AiState, body: &mut Body, dt: f32);
}

/// Patrols left and right, turning at walls and optionally on a timer.
#[derive(Debug, Clone, PartialEq)]
pub struct Walker {
    heading: f32,
    turn_after: Option<f32>,
    elapsed: f32,
}

impl Walker {
    pub fn new(heading: f32, turn_after: Option<f32>) -> Self {
        Self {
            heading: if heading < 0.0 { -1.0 } else { 1.0 },
            turn_after: turn_after.filter(|t| *t > 0.0),
            elapsed: 0.0,
        }
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    fn turn(&mut self) {
        self.heading = -self.heading;
        self.elapsed = 0.0;
    }
}

impl Behavior for Walker {
    fn ai_type(&self) -> AiType {
        AiType::Walker
    }

    fn prime(&self, state: AiState, body: &mut Body) {
        if state == AiState::Walking {
            body.movement.x = self.heading;
        }
    }

    fn think(&mut self, state: AiState, body: &mut Body, dt: f32) {
        if state != AiState::Walking {
            return;
        }

        let blocked = (body.contacts.left && self.heading < 0.0)
            || (body.contacts.right && self.heading > 0.0);
        if blocked {
            self.turn();
        } else if let Some(limit) = self.turn_after {
            self.elapsed += dt;
            if self.elapsed >= limit {
                self.turn();
            }
        }

        body.movement.x = self.heading;
    }
}

/// Bounces in place: every grounded step re-applies the jump impulse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Jumper;

impl Behavior for Jumper {
    fn ai_type(&self) -> AiType {
        AiType::Jumper
    }

    fn prime(&self, _state: AiState, body: &mut Body) {
        body.movement.x = 0.0;
    }

    fn think(&mut self, state: AiState, body: &mut Body, _dt: f32) {
        if state == AiState::Jumping && body.contacts.bottom {
            body.velocity.y = body.jumping_power;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ai {
    Walker(Walker),
    Jumper(Jumper),
}

impl Behavior for Ai {
    fn ai_type(&self) -> AiType {
        match self {
            Self::Walker(walker) => walker.ai_type(),
            Self::Jumper(jumper) => jumper.ai_type(),
        }
    }

    fn prime(&self, state: AiState, body: &mut Body) {
        match self {
            Self::Walker(walker) => walker.prime(state, body),
            Self::Jumper(jumper) => jumper.prime(state, body),
        }
    }

    fn think(&mut self, state: AiState, body: &mut Body, dt: f32) {
        match self {
            Self::Walker(walker) => walker.think(state, body, dt),
            Self::Jumper(jumper) => jumper.think(state, body, dt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::test_support::*;
    use crate::entity::Entity;

    const DT: f32 = 1.0 / 60.0;

    fn step(enemy: &mut Entity, map: &crate::map::TileMap) {
        enemy.update(DT, &[], map);
        enemy.run_ai(DT);
    }

    fn walker_heading(enemy: &Entity) -> f32 {
        match &enemy.kind {
            crate::entity::EntityKind::Enemy(e) => match &e.ai {
                Ai::Walker(w) => w.heading(),
                Ai::Jumper(_) => panic!("expected walker"),
            },
            crate::entity::EntityKind::Player => panic!("expected enemy"),
        }
    }

    #[test]
    fn walker_starts_moving_on_spawn() {
        let enemy = Entity::enemy(
            body_at(3.0, -6.05),
            Ai::Walker(Walker::new(-1.0, None)),
            AiState::Walking,
            sprite("e.png"),
        );
        assert_eq!(enemy.body.movement.x, -1.0);
    }

    #[test]
    fn walker_reverses_within_one_tick_of_wall_contact() {
        let map = walled_floor();
        let mut enemy = Entity::enemy(
            body_at(1.2, -6.05),
            Ai::Walker(Walker::new(-1.0, None)),
            AiState::Walking,
            sprite("e.png"),
        );

        let mut hit_tick = None;
        for tick in 0..60 {
            step(&mut enemy, &map);
            if enemy.body.contacts.left {
                hit_tick = Some(tick);
                break;
            }
        }
        assert!(hit_tick.is_some(), "walker never reached the wall");
        assert_eq!(walker_heading(&enemy), 1.0);
        assert_eq!(enemy.body.movement.x, 1.0);

        let x = enemy.body.position.x;
        step(&mut enemy, &map);
        assert!(enemy.body.position.x > x);
    }

    #[test]
    fn walker_patrols_between_walls() {
        let map = walled_floor();
        let mut enemy = Entity::enemy(
            body_at(3.5, -6.05),
            Ai::Walker(Walker::new(1.0, None)),
            AiState::Walking,
            sprite("e.png"),
        );
        let mut turns = 0;
        let mut last = walker_heading(&enemy);
        for _ in 0..600 {
            step(&mut enemy, &map);
            let heading = walker_heading(&enemy);
            if heading != last {
                turns += 1;
                last = heading;
            }
            assert!(enemy.body.position.x > 0.9 && enemy.body.position.x < 6.1);
        }
        assert!(turns >= 3, "only {turns} turns in ten seconds");
    }

    #[test]
    fn walker_timer_turns_in_open_space() {
        let mut walker = Walker::new(1.0, Some(0.5));
        let mut body = body_at(0.0, 0.0);
        for _ in 0..29 {
            walker.think(AiState::Walking, &mut body, DT);
        }
        assert_eq!(walker.heading(), 1.0);
        walker.think(AiState::Walking, &mut body, DT);
        walker.think(AiState::Walking, &mut body, DT);
        assert_eq!(walker.heading(), -1.0);
        assert_eq!(body.movement.x, -1.0);
    }

    #[test]
    fn jumper_bounces_with_constant_height() {
        let map = walled_floor();
        let mut enemy = Entity::enemy(
            body_at(3.5, -6.05),
            Ai::Jumper(Jumper),
            AiState::Jumping,
            sprite("e.png"),
        );
        enemy.body.jumping_power = 2.0;

        let mut peaks = Vec::new();
        let mut rising = false;
        let mut last_y = enemy.body.position.y;
        for _ in 0..600 {
            step(&mut enemy, &map);
            if enemy.body.contacts.bottom {
                assert_eq!(enemy.body.velocity.y, 2.0);
            }
            let y = enemy.body.position.y;
            if rising && y < last_y {
                peaks.push(last_y);
            }
            rising = y > last_y;
            last_y = y;
        }

        assert!(peaks.len() >= 3, "expected repeated bounces");
        for peak in &peaks[1..] {
            assert!((peak - peaks[0]).abs() < 1e-3);
        }
        assert_eq!(enemy.body.position.x, 3.5);
    }

    #[test]
    fn idle_behaviours_do_nothing() {
        let mut body = body_at(0.0, 0.0);
        body.contacts.bottom = true;
        body.contacts.left = true;

        let mut walker = Walker::new(-1.0, Some(0.1));
        walker.think(AiState::Idle, &mut body, 1.0);
        assert_eq!(walker.heading(), -1.0);
        assert_eq!(body.movement.x, 0.0);

        let mut jumper = Ai::Jumper(Jumper);
        jumper.think(AiState::Idle, &mut body, DT);
        assert_eq!(body.velocity.y, 0.0);
        assert_eq!(jumper.ai_type(), AiType::Jumper);
    }
}
