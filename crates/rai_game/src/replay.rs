use crate::game::PlayerIntent;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    /// Wall-clock time fed into the game per recorded frame.
    #[serde(default = "default_frame_dt")]
    pub frame_dt: f64,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub move_x: f32,
    #[serde(default)]
    pub jump: bool,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded_intents(&self) -> Vec<PlayerIntent> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for _ in 0..frame.repeat.max(1) {
                out.push(PlayerIntent {
                    move_x: frame.move_x.clamp(-1.0, 1.0),
                    jump: frame.jump,
                    quit: false,
                });
            }
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.frame_dt <= 0.0 {
        return Err("Replay validation failed: frame_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_frame_dt() -> f64 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::test_support::sample_game;
    use crate::game::Game;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "rai_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn play(replay: &ReplaySequence) -> (Game, u32) {
        let mut game = sample_game();
        let mut jumps = 0;
        for intent in replay.expanded_intents() {
            if game.update_with_delta(intent, replay.frame_dt).jumped {
                jumps += 1;
            }
        }
        (game, jumps)
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "frames": [
                { "move_x": 3.0, "repeat": 3 },
                { "jump": true }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let expanded = replay.expanded_intents();
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[0].move_x, 1.0);
        assert!(expanded[3].jump);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn empty_replay_is_rejected() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).unwrap_err();
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_run_is_deterministic() {
        let path = temp_file_path("deterministic");
        fs::write(
            &path,
            r#"{
              "frame_dt": 0.021,
              "frames": [
                { "move_x": 1.0, "repeat": 40 },
                { "move_x": 1.0, "jump": true },
                { "move_x": 1.0, "repeat": 90 },
                { "move_x": -1.0, "jump": true },
                { "move_x": -1.0, "repeat": 60 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let (run_a, jumps_a) = play(&replay);
        let (run_b, jumps_b) = play(&replay);

        assert_eq!(run_a.player.body, run_b.player.body);
        assert_eq!(jumps_a, jumps_b);
        assert!(jumps_a >= 1);
        assert_eq!(run_a.enemies_killed, run_b.enemies_killed);
        assert_eq!(run_a.time.fixed_step_count, run_b.time.fixed_step_count);
        for (a, b) in run_a.enemies.iter().zip(&run_b.enemies) {
            assert_eq!(a.body, b.body);
            assert_eq!(a.is_active(), b.is_active());
        }

        let _ = fs::remove_file(path);
    }
}
