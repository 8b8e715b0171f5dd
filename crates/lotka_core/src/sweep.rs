use crate::error::Result;
use crate::integrate::{simulate, IntegrationSettings, TimeSpan, Trajectory};
use crate::model::{ModelParameters, State};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweptParameter {
    Alpha,
    Gamma,
}

impl SweptParameter {
    pub fn symbol(&self) -> &'static str {
        match self {
            SweptParameter::Alpha => "α",
            SweptParameter::Gamma => "γ",
        }
    }

    /// Base parameters with this coefficient replaced by `value`.
    pub fn apply(&self, base: ModelParameters, value: f64) -> ModelParameters {
        match self {
            SweptParameter::Alpha => base.with_alpha(value),
            SweptParameter::Gamma => base.with_gamma(value),
        }
    }
}

/// One-at-a-time variation of `alpha` and `gamma` around a base parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepPlan {
    pub base: ModelParameters,
    pub alphas: Vec<f64>,
    pub gammas: Vec<f64>,
    pub initial_state: State,
    pub span: TimeSpan,
    pub n_points: usize,
    pub integration: IntegrationSettings,
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            base: ModelParameters::default(),
            alphas: vec![0.8, 1.0, 1.2],
            gammas: vec![1.2, 1.5, 1.8],
            initial_state: State::new(10.0, 5.0),
            span: TimeSpan::new(0.0, 40.0),
            n_points: 800,
            integration: IntegrationSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRun {
    pub parameter: SweptParameter,
    pub value: f64,
    pub params: ModelParameters,
    pub trajectory: Trajectory,
}

impl SweepRun {
    /// Legend label naming the varied value, e.g. `α=0.8`.
    pub fn label(&self) -> String {
        format!("{}={:.1}", self.parameter.symbol(), self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sweep {
    pub alpha_runs: Vec<SweepRun>,
    pub gamma_runs: Vec<SweepRun>,
}

impl Sweep {
    pub fn runs(&self, parameter: SweptParameter) -> &[SweepRun] {
        match parameter {
            SweptParameter::Alpha => &self.alpha_runs,
            SweptParameter::Gamma => &self.gamma_runs,
        }
    }
}

/// Integrates every variant of the plan.
///
/// Runs share no state and are evaluated on the rayon pool; results keep the order of
/// `alphas` and `gammas`. The first failing run aborts the sweep.
pub fn run_sweep(plan: &SweepPlan) -> Result<Sweep> {
    let jobs: Vec<(SweptParameter, f64)> = plan
        .alphas
        .iter()
        .map(|&v| (SweptParameter::Alpha, v))
        .chain(plan.gammas.iter().map(|&v| (SweptParameter::Gamma, v)))
        .collect();

    let runs = jobs
        .par_iter()
        .map(|&(parameter, value)| -> Result<SweepRun> {
            let params = parameter.apply(plan.base, value);
            let trajectory = simulate(
                &params,
                plan.initial_state,
                plan.span,
                plan.n_points,
                &plan.integration,
            )?;
            info!(
                "sweep run {}={} finished ({} accepted steps)",
                parameter.symbol(),
                value,
                trajectory.stats().accepted_steps
            );
            Ok(SweepRun {
                parameter,
                value,
                params,
                trajectory,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let (alpha_runs, gamma_runs): (Vec<_>, Vec<_>) = runs
        .into_iter()
        .partition(|run| run.parameter == SweptParameter::Alpha);

    Ok(Sweep {
        alpha_runs,
        gamma_runs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LotkaError;

    fn small_plan() -> SweepPlan {
        SweepPlan {
            span: TimeSpan::new(0.0, 5.0),
            n_points: 50,
            ..SweepPlan::default()
        }
    }

    #[test]
    fn runs_keep_input_order_and_labels() {
        let sweep = run_sweep(&small_plan()).expect("sweep should integrate");
        let alpha_labels: Vec<String> = sweep.alpha_runs.iter().map(SweepRun::label).collect();
        let gamma_labels: Vec<String> = sweep.gamma_runs.iter().map(SweepRun::label).collect();
        assert_eq!(alpha_labels, vec!["α=0.8", "α=1.0", "α=1.2"]);
        assert_eq!(gamma_labels, vec!["γ=1.2", "γ=1.5", "γ=1.8"]);
    }

    #[test]
    fn only_the_swept_coefficient_changes() {
        let plan = small_plan();
        let sweep = run_sweep(&plan).expect("sweep should integrate");
        for run in &sweep.alpha_runs {
            assert_eq!(run.params, plan.base.with_alpha(run.value));
            assert_eq!(run.params.gamma(), plan.base.gamma());
        }
        for run in sweep.runs(SweptParameter::Gamma) {
            assert_eq!(run.params, plan.base.with_gamma(run.value));
            assert_eq!(run.params.alpha(), plan.base.alpha());
        }
    }

    #[test]
    fn parallel_runs_match_sequential_integration() {
        let plan = small_plan();
        let sweep = run_sweep(&plan).expect("sweep should integrate");
        let run = &sweep.gamma_runs[2];
        let direct = simulate(
            &run.params,
            plan.initial_state,
            plan.span,
            plan.n_points,
            &plan.integration,
        )
        .expect("direct run should integrate");
        assert_eq!(run.trajectory, direct);
        assert_eq!(run.trajectory.len(), plan.n_points);
    }

    #[test]
    fn empty_variant_lists_yield_empty_sweep() {
        let plan = SweepPlan {
            alphas: Vec::new(),
            gammas: Vec::new(),
            ..small_plan()
        };
        let sweep = run_sweep(&plan).expect("nothing to integrate");
        assert!(sweep.alpha_runs.is_empty());
        assert!(sweep.gamma_runs.is_empty());
    }

    #[test]
    fn failing_run_aborts_sweep() {
        let plan = SweepPlan {
            n_points: 1,
            ..small_plan()
        };
        let err = run_sweep(&plan).expect_err("one sample point is invalid");
        assert!(matches!(err, LotkaError::InvalidSettings(_)));
    }
}
