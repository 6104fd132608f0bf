//! City configuration: map size, difficulty, starting options and the
//! optional scenario.
//!
//! RULE: Every per-difficulty number lives on `GameLevel`. Subsystems
//! ask the level for its table value; they never branch on the level
//! themselves.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameLevel {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl GameLevel {
    pub fn index(self) -> i32 {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }

    pub fn from_index(index: i32) -> Self {
        match index {
            0 => Self::Easy,
            2 => Self::Hard,
            _ => Self::Medium,
        }
    }

    /// Upper bound of the phase-15 disaster roll; a disaster happens when
    /// `rand[0, chance]` comes up zero.
    pub fn disaster_chance(self) -> i32 {
        match self {
            Self::Easy => 480,
            Self::Medium => 240,
            Self::Hard => 60,
        }
    }

    /// Meltdown roll for a nuclear plant, `1 / (chance + 1)` per visit.
    pub fn meltdown_chance(self) -> i32 {
        match self {
            Self::Easy => 30_000,
            Self::Medium => 20_000,
            Self::Hard => 10_000,
        }
    }

    pub fn tax_multiplier(self) -> f64 {
        match self {
            Self::Easy => 1.4,
            Self::Medium => 1.2,
            Self::Hard => 0.8,
        }
    }

    pub fn road_cost_multiplier(self) -> f64 {
        match self {
            Self::Easy => 0.7,
            Self::Medium => 0.9,
            Self::Hard => 1.2,
        }
    }

    /// Outside-market factor applied to projected industrial population.
    pub fn industry_market(self) -> f64 {
        match self {
            Self::Easy => 1.2,
            Self::Medium => 1.1,
            Self::Hard => 0.98,
        }
    }

    pub fn starting_funds(self) -> i64 {
        match self {
            Self::Easy => 20_000,
            Self::Medium => 10_000,
            Self::Hard => 5_000,
        }
    }
}

/// Forced disasters of a scenario, independent of the random roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioDisaster {
    Earthquake,
    Firebombs,
    Monster,
    Meltdown,
    Flood,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub disaster: ScenarioDisaster,
    /// Phase-15 invocations until the scenario disaster strikes.
    pub wait: u32,
}

fn default_width() -> usize {
    120
}

fn default_height() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_tax_rate() -> i32 {
    7
}

fn default_percent() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default)]
    pub level: GameLevel,
    #[serde(default = "default_true")]
    pub disasters_enabled: bool,
    #[serde(default = "default_true")]
    pub auto_budget: bool,
    #[serde(default = "default_tax_rate")]
    pub tax_rate: i32,
    #[serde(default = "default_percent")]
    pub road_percent: f64,
    #[serde(default = "default_percent")]
    pub fire_percent: f64,
    #[serde(default = "default_percent")]
    pub police_percent: f64,
    /// Overrides the level's starting funds.
    #[serde(default)]
    pub starting_funds: Option<i64>,
    #[serde(default)]
    pub scenario: Option<ScenarioConfig>,
}

impl SimConfig {
    /// Load from the data/ directory: `city.json` is required,
    /// `scenario.json` is optional and overrides any inline scenario.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/city.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let mut config: SimConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;

        let scenario_path = format!("{data_dir}/scenario.json");
        if std::path::Path::new(&scenario_path).exists() {
            let scenario_content = std::fs::read_to_string(&scenario_path)
                .map_err(|e| anyhow::anyhow!("Cannot read {scenario_path}: {e}"))?;
            let scenario: ScenarioConfig = serde_json::from_str(&scenario_content)
                .map_err(|e| anyhow::anyhow!("Cannot parse {scenario_path}: {e}"))?;
            config.scenario = Some(scenario);
        }

        config.validate()?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in tests.
    /// Disasters are off so growth tests are not disturbed by fires.
    pub fn default_test() -> Self {
        Self {
            width: 120,
            height: 100,
            level: GameLevel::Medium,
            disasters_enabled: false,
            auto_budget: true,
            tax_rate: 7,
            road_percent: 1.0,
            fire_percent: 1.0,
            police_percent: 1.0,
            starting_funds: None,
            scenario: None,
        }
    }

    pub fn initial_funds(&self) -> i64 {
        self.starting_funds.unwrap_or_else(|| self.level.starting_funds())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.width < 16 || self.height < 16 {
            anyhow::bail!("map must be at least 16x16, got {}x{}", self.width, self.height);
        }
        if !(0..=20).contains(&self.tax_rate) {
            anyhow::bail!("tax_rate {} outside 0..=20", self.tax_rate);
        }
        for (name, p) in [
            ("road_percent", self.road_percent),
            ("fire_percent", self.fire_percent),
            ("police_percent", self.police_percent),
        ] {
            if !(0.0..=1.0).contains(&p) {
                anyhow::bail!("{name} {p} outside 0.0..=1.0");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_city_file_fills_defaults() {
        let config: SimConfig =
            serde_json::from_str(r#"{ "level": "hard", "tax_rate": 9 }"#).unwrap();
        assert_eq!(config.width, 120);
        assert_eq!(config.level, GameLevel::Hard);
        assert!(config.disasters_enabled);
        assert_eq!(config.initial_funds(), 5_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn out_of_range_tax_is_rejected() {
        let mut config = SimConfig::default_test();
        config.tax_rate = 40;
        assert!(config.validate().is_err());
    }
}
