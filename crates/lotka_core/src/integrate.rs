use crate::error::{LotkaError, Result};
use crate::model::{LotkaVolterra, ModelParameters, State};
use crate::solvers::DormandPrince;
use crate::traits::{AdaptiveStepper, DynamicalSystem, Tolerances};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntegrationSettings {
    pub rtol: f64,
    pub atol: f64,
    /// Upper bound on attempted steps (accepted and rejected) for one trajectory.
    pub max_steps: usize,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            rtol: 1e-8,
            atol: 1e-10,
            max_steps: 100_000,
        }
    }
}

impl IntegrationSettings {
    fn validate(&self) -> Result<()> {
        if !self.rtol.is_finite() || self.rtol <= 0.0 {
            return Err(LotkaError::InvalidSettings(
                "rtol must be finite and positive".into(),
            ));
        }
        if !self.atol.is_finite() || self.atol <= 0.0 {
            return Err(LotkaError::InvalidSettings(
                "atol must be finite and positive".into(),
            ));
        }
        if self.max_steps == 0 {
            return Err(LotkaError::InvalidSettings(
                "max_steps must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    fn tolerances(&self) -> Tolerances<f64> {
        Tolerances {
            rtol: self.rtol,
            atol: self.atol,
        }
    }
}

/// Closed time interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeSpan {
    pub start: f64,
    pub end: f64,
}

impl TimeSpan {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    fn validate(&self) -> Result<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(LotkaError::InvalidSettings(
                "time span bounds must be finite".into(),
            ));
        }
        if self.end <= self.start {
            return Err(LotkaError::InvalidSettings(format!(
                "time span must be increasing, got ({}, {})",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// Uniform grid of `n_points` samples over the span; the last sample is exactly `end`.
pub fn sample_times(span: TimeSpan, n_points: usize) -> Vec<f64> {
    match n_points {
        0 => Vec::new(),
        1 => vec![span.start],
        _ => {
            let last = n_points - 1;
            let step = span.duration() / last as f64;
            (0..n_points)
                .map(|i| {
                    if i == last {
                        span.end
                    } else {
                        span.start + i as f64 * step
                    }
                })
                .collect()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntegrationStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub evaluations: usize,
}

/// Sampled solution `(t, X(t), Y(t))` of one integration run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    times: Vec<f64>,
    prey: Vec<f64>,
    predator: Vec<f64>,
    stats: IntegrationStats,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn prey(&self) -> &[f64] {
        &self.prey
    }

    pub fn predator(&self) -> &[f64] {
        &self.predator
    }

    pub fn stats(&self) -> IntegrationStats {
        self.stats
    }

    pub fn state_at(&self, index: usize) -> Option<State> {
        Some(State::new(
            *self.prey.get(index)?,
            *self.predator.get(index)?,
        ))
    }

    pub fn initial_state(&self) -> Option<State> {
        self.state_at(0)
    }

    pub fn final_state(&self) -> Option<State> {
        self.state_at(self.len().checked_sub(1)?)
    }

    pub fn samples(&self) -> impl Iterator<Item = (f64, State)> + '_ {
        self.times
            .iter()
            .zip(self.prey.iter().zip(self.predator.iter()))
            .map(|(&t, (&x, &y))| (t, State::new(x, y)))
    }
}

/// Integrates the system from `initial` across `span`, sampling `n_points` uniform times.
///
/// Each step is clamped to land exactly on the next sample, while the controller's
/// preferred step size carries over between samples.
///
/// # Errors
///
/// `InvalidSettings` for malformed inputs and `IntegrationFailure` when the step size
/// collapses, the step budget runs out, or the state stops being finite.
pub fn simulate(
    params: &ModelParameters,
    initial: State,
    span: TimeSpan,
    n_points: usize,
    settings: &IntegrationSettings,
) -> Result<Trajectory> {
    settings.validate()?;
    span.validate()?;
    if n_points < 2 {
        return Err(LotkaError::InvalidSettings(format!(
            "at least two sample points are required, got {n_points}"
        )));
    }
    if !initial.is_finite() {
        return Err(LotkaError::InvalidSettings(
            "initial state must be finite".into(),
        ));
    }

    let system = LotkaVolterra::new(*params);
    let tolerances = settings.tolerances();
    let times = sample_times(span, n_points);
    let mut stepper = DormandPrince::<f64>::new(DynamicalSystem::<f64>::dimension(&system));

    let mut prey = Vec::with_capacity(n_points);
    let mut predator = Vec::with_capacity(n_points);
    prey.push(initial.prey);
    predator.push(initial.predator);

    let mut t = span.start;
    let mut state = initial.as_array();
    let mut candidate = [0.0; 2];
    let mut h = stepper.initial_step(&system, t, &state, span.duration(), tolerances);
    let mut stats = IntegrationStats::default();
    let mut attempts = 0usize;

    for &target in &times[1..] {
        while t < target {
            let min_step = 10.0 * f64::EPSILON * t.abs().max(f64::MIN_POSITIVE);
            if h < min_step {
                warn!("step size {h:e} collapsed below {min_step:e} at t = {t}");
                return Err(LotkaError::IntegrationFailure {
                    t,
                    message: format!(
                        "required step size {h:e} is below the spacing of representable times"
                    ),
                });
            }
            if attempts >= settings.max_steps {
                return Err(LotkaError::IntegrationFailure {
                    t,
                    message: format!(
                        "step budget of {} exhausted before reaching t = {target}",
                        settings.max_steps
                    ),
                });
            }

            let remaining = target - t;
            let clamped = h >= remaining;
            let dt = if clamped { remaining } else { h };
            let err = stepper.attempt(&system, t, &state, dt, tolerances, &mut candidate);
            attempts += 1;

            let finite = err.is_finite() && candidate.iter().all(|v| v.is_finite());
            if finite && err <= 1.0 {
                stepper.accept();
                stats.accepted_steps += 1;
                t = if clamped { target } else { t + dt };
                state = candidate;

                let factor = if err == 0.0 {
                    MAX_FACTOR
                } else {
                    (SAFETY * err.powf(-0.2)).min(MAX_FACTOR)
                };
                h = if clamped {
                    h.max(dt * factor)
                } else {
                    dt * factor
                };
            } else {
                stats.rejected_steps += 1;
                let factor = if finite {
                    (SAFETY * err.powf(-0.2)).max(MIN_FACTOR)
                } else {
                    MIN_FACTOR
                };
                trace!("rejected step dt = {dt:e} at t = {t} (error norm {err:e})");
                h = dt * factor;
            }
        }
        prey.push(state[0]);
        predator.push(state[1]);
    }

    stats.evaluations = stepper.evaluations();
    debug!(
        "integrated {} samples over [{}, {}]: {} accepted, {} rejected, {} evaluations",
        n_points,
        span.start,
        span.end,
        stats.accepted_steps,
        stats.rejected_steps,
        stats.evaluations
    );

    Ok(Trajectory {
        times,
        prey,
        predator,
        stats,
    })
}
