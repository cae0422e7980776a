use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use mamono_core::{ModeCatalog, ModeConfig, ModeId};
use mamono_sync::ClientConfig;
use serde::Deserialize;

/// Simulator settings file.
///
/// ```toml
/// [client]
/// long-press-ms = 500
///
/// [modes.easy]
/// rows = 9
/// cols = 9
/// hp = 10
/// monsters = [5, 3, 2]
/// level_curve = "power_of_two"
/// exp_reward = "linear"
/// combat = "threshold"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Replacements for built-in modes.
    pub modes: BTreeMap<ModeId, ModeConfig>,
    pub client: ClientConfig,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read settings from {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.catalog()?;
        Ok(settings)
    }

    /// Built-in modes with the overrides applied, each one validated.
    pub fn catalog(&self) -> Result<ModeCatalog> {
        let mut catalog = ModeCatalog::builtin();
        for (&id, config) in &self.modes {
            catalog
                .insert(id, config.clone())
                .with_context(|| format!("Mode {}", id))?;
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mamono_core::{CombatPolicy, ExpReward, LevelCurve};

    #[test]
    fn empty_file_keeps_presets() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings.catalog().unwrap(), ModeCatalog::builtin());
        assert_eq!(settings.client, ClientConfig::default());
    }

    #[test]
    fn overrides_replace_one_mode() {
        let settings = Settings::parse(
            r#"
            [client]
            long-press-ms = 500

            [modes.hugeExtreme]
            rows = 9
            cols = 9
            hp = 10
            monsters = [5, 3, 2]
            level_curve = "power_of_two"
            exp_reward = "linear"
            combat = "threshold"
            "#,
        )
        .unwrap();

        let mode = settings.catalog().unwrap().get(ModeId::HugeExtreme);
        assert_eq!(mode.size(), (9, 9));
        assert_eq!(mode.level_curve, LevelCurve::PowerOfTwo);
        assert_eq!(mode.exp_reward, ExpReward::Linear);
        assert_eq!(mode.combat, CombatPolicy::Threshold);
        assert_eq!(settings.client.long_press_ms, 500);
    }

    #[test]
    fn table_curves_parse() {
        let settings = Settings::parse(
            r#"
            [modes.easy]
            rows = 4
            cols = 4
            hp = 3
            monsters = [2]
            level_curve = { table = [0, 1] }
            exp_reward = "exponential"
            combat = "hp_pool"
            "#,
        )
        .unwrap();

        let mode = settings.catalog().unwrap().get(ModeId::Easy);
        assert_eq!(mode.level_curve, LevelCurve::Table(vec![0, 1]));
    }

    #[test]
    fn invalid_modes_are_rejected() {
        let err = Settings::parse(
            r#"
            [modes.easy]
            rows = 2
            cols = 2
            hp = 3
            monsters = [5]
            level_curve = "power_of_two"
            exp_reward = "linear"
            combat = "threshold"
            "#,
        )
        .unwrap_err();

        assert!(format!("{:#}", err).contains("more monsters than cells"));
        assert!(Settings::parse("[bogus]").is_err());
    }
}
