//! Analysis configuration, loaded from an optional TOML file.
//!
//! Every field has a default, so a file only needs the values it changes:
//!
//! ```toml
//! n_points = 2000
//!
//! [params]
//! alpha = 1.1
//!
//! [sweep]
//! alphas = [0.6, 0.9, 1.2, 1.5]
//! ```

use anyhow::{Context, Result};
use lotka_core::integrate::{IntegrationSettings, TimeSpan};
use lotka_core::model::{ModelParameters, State};
use lotka_core::sweep::SweepPlan;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub params: ModelParameters,
    pub initial_state: State,
    pub span: TimeSpan,
    pub n_points: usize,
    pub integration: IntegrationSettings,
    pub sweep: SweepConfig,
    pub equilibria: EquilibriaConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            params: ModelParameters::default(),
            initial_state: State::new(10.0, 5.0),
            span: TimeSpan::new(0.0, 25.0),
            n_points: 1200,
            integration: IntegrationSettings::default(),
            sweep: SweepConfig::default(),
            equilibria: EquilibriaConfig::default(),
        }
    }
}

/// Variants for the sensitivity sweep. Base parameters, initial state and tolerances
/// come from the top level of the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    pub alphas: Vec<f64>,
    pub gammas: Vec<f64>,
    pub span: TimeSpan,
    pub n_points: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        let plan = SweepPlan::default();
        Self {
            alphas: plan.alphas,
            gammas: plan.gammas,
            span: plan.span,
            n_points: plan.n_points,
        }
    }
}

/// Runs started exactly at each equilibrium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EquilibriaConfig {
    pub span: TimeSpan,
    pub n_points: usize,
}

impl Default for EquilibriaConfig {
    fn default() -> Self {
        Self {
            span: TimeSpan::new(0.0, 25.0),
            n_points: 1200,
        }
    }
}

impl AnalysisConfig {
    /// Reads `path` when given; otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn sweep_plan(&self) -> SweepPlan {
        SweepPlan {
            base: self.params,
            alphas: self.sweep.alphas.clone(),
            gammas: self.sweep.gammas.clone(),
            initial_state: self.initial_state,
            span: self.sweep.span,
            n_points: self.sweep.n_points,
            integration: self.integration,
        }
    }
}
