//! Mapping engine configuration.

use serde::{Deserialize, Serialize};

use crate::errors::MapResult;

/// How child maps are re-evaluated after their parent runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceMode {
    #[default]
    /// Repeat passes until one changes nothing, within a bound derived from
    /// the depth of the child map tree.
    FixedPoint,
    /// Always run exactly this many passes.
    FixedPasses(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapEngineConfig {
    pub convergence: ConvergenceMode,

    /// Upper bound on passes in `FixedPoint` mode.
    pub max_convergence_passes: u32,

    /// Placed between the abstract target label and the source label when
    /// naming a generated target.
    pub target_label_separator: String,
}

impl Default for MapEngineConfig {
    fn default() -> Self {
        Self {
            convergence: ConvergenceMode::default(),
            max_convergence_passes: 16,
            target_label_separator: "From".to_string(),
        }
    }
}

impl MapEngineConfig {
    /// Load from a TOML document; missing keys keep their defaults.
    pub fn from_toml(source: &str) -> MapResult<Self> {
        Ok(crl_core::from_toml_str(source)?)
    }

    pub fn with_convergence(mut self, convergence: ConvergenceMode) -> Self {
        self.convergence = convergence;
        self
    }

    pub fn with_target_label_separator(mut self, separator: impl Into<String>) -> Self {
        self.target_label_separator = separator.into();
        self
    }

    /// Label for a target generated from `source_label`.
    pub fn target_label(&self, abstract_target_label: &str, source_label: &str) -> String {
        format!(
            "{}{}{}",
            abstract_target_label, self.target_label_separator, source_label
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MapEngineConfig::default();
        assert_eq!(config.convergence, ConvergenceMode::FixedPoint);
        assert_eq!(config.max_convergence_passes, 16);
        assert_eq!(config.target_label("Target", "Source"), "TargetFromSource");
    }

    #[test]
    fn test_builder() {
        let config = MapEngineConfig::default()
            .with_convergence(ConvergenceMode::FixedPasses(2))
            .with_target_label_separator("_of_");
        assert_eq!(config.convergence, ConvergenceMode::FixedPasses(2));
        assert_eq!(config.target_label("A", "b"), "A_of_b");
    }

    #[test]
    fn test_from_toml() {
        assert_eq!(
            MapEngineConfig::from_toml("").unwrap(),
            MapEngineConfig::default()
        );

        let partial = MapEngineConfig::from_toml("max_convergence_passes = 4").unwrap();
        assert_eq!(partial.max_convergence_passes, 4);
        assert_eq!(partial.convergence, ConvergenceMode::FixedPoint);
        assert_eq!(partial.target_label_separator, "From");

        let legacy = MapEngineConfig::from_toml(
            r#"
            convergence = { fixed_passes = 2 }
            target_label_separator = " for "
            "#,
        )
        .unwrap();
        assert_eq!(legacy.convergence, ConvergenceMode::FixedPasses(2));
        assert_eq!(legacy.target_label("Row", "x"), "Row for x");

        assert!(MapEngineConfig::from_toml("max_convergence_passes = \"many\"").is_err());
    }
}
