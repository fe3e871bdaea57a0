//! Match configuration handed in by the host when the preview scene is pushed.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMethod {
    #[default]
    Keyboard,
    Gamepad,
    /// Player one is driven by the CPU as well.
    Ai,
}

/// Immutable for the lifetime of a scene; only the derived countdown moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub rounds: u32,
    /// Round length in seconds.
    #[serde(alias = "timeLimit")]
    pub time_limit: f32,
    pub difficulty: Difficulty,
    pub control: ControlMethod,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            rounds: 3,
            time_limit: 99.0,
            difficulty: Difficulty::Normal,
            control: ControlMethod::Keyboard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchMeta {
    #[serde(alias = "p1")]
    pub p1_name: String,
    #[serde(alias = "p2")]
    pub p2_name: String,
    pub stage: String,
}

impl Default for MatchMeta {
    fn default() -> Self {
        Self {
            p1_name: "Rhea".to_string(),
            p2_name: "Kato".to_string(),
            stage: "Dojo Dusk".to_string(),
        }
    }
}

/// Everything needed to start a preview: rules, names, and the AI seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSetup {
    pub config: MatchConfig,
    pub meta: MatchMeta,
    pub ai_seed: u64,
}

impl Default for MatchSetup {
    fn default() -> Self {
        Self {
            config: MatchConfig::default(),
            meta: MatchMeta::default(),
            ai_seed: 0x5eed,
        }
    }
}

pub fn load_match_config_from_path(path: &Path) -> Result<MatchSetup, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let setup: MatchSetup = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse match JSON {}: {e}", path.display()))?;
    validate_match_config(&setup.config)?;
    Ok(setup)
}

pub fn validate_match_config(config: &MatchConfig) -> Result<(), String> {
    if config.rounds == 0 {
        return Err("Match validation failed: rounds must be >= 1".to_string());
    }
    if !(config.time_limit.is_finite() && config.time_limit >= 0.0) {
        return Err(format!(
            "Match validation failed: time_limit must be a finite number >= 0 (got {})",
            config.time_limit
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "brawl_match_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn empty_object_uses_defaults() {
        let setup: MatchSetup = serde_json::from_str("{}").expect("parse empty setup");
        assert_eq!(setup.config.rounds, 3);
        assert_eq!(setup.config.time_limit, 99.0);
        assert_eq!(setup.config.difficulty, Difficulty::Normal);
        assert_eq!(setup.config.control, ControlMethod::Keyboard);
    }

    #[test]
    fn load_accepts_host_field_names() {
        let path = temp_file_path("host");
        fs::write(
            &path,
            r#"{
              "config": {"rounds": 1, "timeLimit": 30, "difficulty": "Hard", "control": "Ai"},
              "meta": {"p1": "Miya", "p2": "Dax", "stage": "Sky Bridge"},
              "ai_seed": 7
            }"#,
        )
        .expect("write temp file");

        let setup = load_match_config_from_path(&path).expect("host config should load");
        assert_eq!(setup.config.time_limit, 30.0);
        assert_eq!(setup.config.difficulty, Difficulty::Hard);
        assert_eq!(setup.config.control, ControlMethod::Ai);
        assert_eq!(setup.meta.p1_name, "Miya");
        assert_eq!(setup.meta.stage, "Sky Bridge");
        assert_eq!(setup.ai_seed, 7);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_rejects_zero_rounds() {
        let path = temp_file_path("rounds");
        fs::write(&path, r#"{"config": {"rounds": 0}}"#).expect("write temp file");
        let err = load_match_config_from_path(&path).expect_err("zero rounds should fail");
        assert!(err.contains("rounds"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn negative_time_limit_is_invalid() {
        let config = MatchConfig {
            time_limit: -1.0,
            ..MatchConfig::default()
        };
        assert!(validate_match_config(&config).is_err());
    }
}
