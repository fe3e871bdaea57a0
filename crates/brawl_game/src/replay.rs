//! Recorded P1 input for headless, deterministic match runs.
//!
//! A replay lists runs of identical intents. Press edges in a run fire on its
//! first step only, the same way the runtime hands an edge to a single fixed
//! step.

use std::fs;
use std::path::Path;

use brawl_core::time::{DEFAULT_FIXED_DT, DEFAULT_MAX_FRAME_DT};
use serde::{Deserialize, Serialize};

use crate::fighter::{Fighter, FighterIntent};
use crate::sim::{digest, HudSnapshot, MatchSim};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaySequence {
    /// Seconds per simulated step.
    #[serde(default = "runtime_step")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayFrame {
    pub left: bool,
    pub right: bool,
    /// Jump held for the whole run.
    pub jump: bool,
    pub jump_pressed: bool,
    pub dash_pressed: bool,
    pub attack_pressed: bool,
    /// Steps this intent is held for; absent means one.
    pub repeat: Option<u32>,
}

impl ReplayFrame {
    fn steps(&self) -> u32 {
        self.repeat.unwrap_or(1)
    }

    fn intent(&self, first: bool) -> FighterIntent {
        FighterIntent {
            left: self.left,
            right: self.right,
            jump_pressed: first && self.jump_pressed,
            jump_held: self.jump || (first && self.jump_pressed),
            dash_pressed: first && self.dash_pressed,
            attack_pressed: first && self.attack_pressed,
        }
    }
}

/// Final state of a replayed match.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    pub p1: Fighter,
    pub p2: Fighter,
    pub hud: HudSnapshot,
    pub digest: String,
}

impl ReplaySequence {
    /// Walk in, jab, hop, dash back out, then idle for a second.
    pub fn demo() -> Self {
        let run = |steps: u32, frame: ReplayFrame| ReplayFrame {
            repeat: Some(steps),
            ..frame
        };
        Self {
            fixed_dt: runtime_step(),
            frames: vec![
                run(
                    150,
                    ReplayFrame {
                        right: true,
                        ..ReplayFrame::default()
                    },
                ),
                run(
                    40,
                    ReplayFrame {
                        attack_pressed: true,
                        ..ReplayFrame::default()
                    },
                ),
                run(
                    50,
                    ReplayFrame {
                        right: true,
                        jump_pressed: true,
                        ..ReplayFrame::default()
                    },
                ),
                run(
                    30,
                    ReplayFrame {
                        left: true,
                        dash_pressed: true,
                        ..ReplayFrame::default()
                    },
                ),
                run(120, ReplayFrame::default()),
            ],
        }
    }

    pub fn expanded_intents(&self) -> Vec<FighterIntent> {
        self.frames
            .iter()
            .flat_map(|frame| (0..frame.steps()).map(move |i| frame.intent(i == 0)))
            .collect()
    }

    /// Feeds every intent into `sim`, starting from freshly spawned fighters.
    pub fn run(&self, sim: &mut MatchSim) -> ReplayOutcome {
        let (mut p1, mut p2) = sim.spawn_fighters();
        let mut hud = sim.hud(&p1, &p2);
        for intent in self.expanded_intents() {
            hud = sim.step(&mut p1, &mut p2, &intent, self.fixed_dt);
        }
        ReplayOutcome {
            digest: digest(&p1, &p2),
            p1,
            p2,
            hud,
        }
    }

    /// Simulated seconds covered by the whole replay.
    pub fn duration(&self) -> f32 {
        let steps: u32 = self.frames.iter().map(ReplayFrame::steps).sum();
        steps as f32 * self.fixed_dt
    }
}

/// Reads a replay of P1 intents from JSON and checks it can drive a match.
pub fn load_replay(path: &Path) -> Result<ReplaySequence, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Cannot open replay {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Replay {} is not valid intent JSON: {e}", path.display()))?;
    check_playable(&replay).map_err(|reason| format!("Replay {}: {reason}", path.display()))?;
    Ok(replay)
}

fn check_playable(replay: &ReplaySequence) -> Result<(), String> {
    let max_step = DEFAULT_MAX_FRAME_DT as f32;
    if !(replay.fixed_dt > 0.0 && replay.fixed_dt <= max_step) {
        return Err(format!(
            "step length {} s must lie in (0, {max_step}]",
            replay.fixed_dt
        ));
    }
    if replay.frames.is_empty() {
        return Err("no intents to feed P1".to_string());
    }
    if let Some(index) = replay.frames.iter().position(|frame| frame.steps() == 0) {
        return Err(format!("run {index} holds its intent for zero steps"));
    }
    Ok(())
}

fn runtime_step() -> f32 {
    DEFAULT_FIXED_DT as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Difficulty, MatchConfig};
    use crate::tuning::Tuning;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "brawl_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn cpu_match(seed: u64) -> MatchSim {
        let config = MatchConfig {
            difficulty: Difficulty::Hard,
            ..MatchConfig::default()
        };
        MatchSim::new(config, Tuning::default(), seed)
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "frames": [
                { "right": true, "repeat": 3 },
                { "attack_pressed": true, "repeat": 2 },
                { "jump_pressed": true }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay(&path).expect("replay should load");
        assert_eq!(replay.fixed_dt, DEFAULT_FIXED_DT as f32);
        let expanded = replay.expanded_intents();
        assert_eq!(expanded.len(), 6);
        assert!(expanded[0].right);
        assert!(expanded[3].attack_pressed);
        assert!(!expanded[4].attack_pressed, "edge fires once per run");
        assert!(expanded[5].jump_pressed && expanded[5].jump_held);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn unplayable_replays_are_rejected() {
        for (hint, body, needle) in [
            ("empty", r#"{ "frames": [] }"#, "no intents"),
            (
                "slow",
                r#"{ "fixed_dt": 0.5, "frames": [{ "left": true }] }"#,
                "step length",
            ),
            (
                "zero",
                r#"{ "frames": [{ "left": true }, { "repeat": 0 }] }"#,
                "run 1",
            ),
        ] {
            let path = temp_file_path(hint);
            fs::write(&path, body).expect("write replay file");
            let err = load_replay(&path).expect_err("replay should be refused");
            assert!(err.contains(needle), "{hint}: {err}");
            let _ = fs::remove_file(path);
        }
    }

    #[test]
    fn replaying_twice_gives_identical_digests() {
        let replay = ReplaySequence::demo();
        let json = serde_json::to_string(&replay).expect("serialize replay");
        let reloaded: ReplaySequence = serde_json::from_str(&json).expect("parse replay");

        let first = replay.run(&mut cpu_match(99));
        let second = reloaded.run(&mut cpu_match(99));
        assert_eq!(first.digest, second.digest);
        assert_eq!(first.p1, second.p1);
        assert_eq!(first.hud, second.hud);
    }

    #[test]
    fn demo_advances_the_countdown() {
        let replay = ReplaySequence::demo();
        assert!((replay.duration() - 3.25).abs() < 1e-3);
        let outcome = replay.run(&mut cpu_match(1));
        assert!((outcome.hud.timer - (99.0 - replay.duration())).abs() < 1e-2);
        assert!(outcome.p1.hp <= Fighter::MAX_HP);
    }
}
