use crate::traits::{lit, DynamicalSystem, Scalar};
use serde::{Deserialize, Serialize};

/// Coefficients of the Lotka-Volterra system.
///
/// - `alpha`: prey growth rate without predators
/// - `beta`: predation rate (prey-predator coupling)
/// - `gamma`: predator mortality rate without prey
/// - `delta`: conversion of consumed prey into predator growth
///
/// Values are fixed at construction; sweeps derive new parameter sets with
/// [`ModelParameters::with_alpha`] and [`ModelParameters::with_gamma`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelParameters {
    alpha: f64,
    beta: f64,
    gamma: f64,
    delta: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self::new(1.0, 0.1, 1.5, 0.075)
    }
}

impl ModelParameters {
    pub const fn new(alpha: f64, beta: f64, gamma: f64, delta: f64) -> Self {
        Self {
            alpha,
            beta,
            gamma,
            delta,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn with_alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    pub fn with_gamma(self, gamma: f64) -> Self {
        Self { gamma, ..self }
    }

    /// True when every coefficient is finite and strictly positive.
    pub fn is_positive(&self) -> bool {
        [self.alpha, self.beta, self.gamma, self.delta]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

/// Prey (`X`) and predator (`Y`) populations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct State {
    pub prey: f64,
    pub predator: f64,
}

impl State {
    pub const ORIGIN: State = State::new(0.0, 0.0);

    pub const fn new(prey: f64, predator: f64) -> Self {
        Self { prey, predator }
    }

    pub fn is_finite(&self) -> bool {
        self.prey.is_finite() && self.predator.is_finite()
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.prey, self.predator]
    }

    /// Largest absolute component.
    pub fn max_abs(&self) -> f64 {
        self.prey.abs().max(self.predator.abs())
    }
}

impl From<[f64; 2]> for State {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

/// Instantaneous rates of change `(dX/dt, dY/dt)`.
///
/// The system is autonomous; `_t` is accepted to match the usual `f(t, z)` signature.
pub fn derivatives(_t: f64, state: State, params: &ModelParameters) -> State {
    let system = LotkaVolterra::new(*params);
    let mut out = [0.0; 2];
    DynamicalSystem::<f64>::apply(&system, 0.0, &state.as_array(), &mut out);
    State::from(out)
}

/// First integral `V = delta*X - gamma*ln X + beta*Y - alpha*ln Y`.
///
/// Constant along exact trajectories in the open positive quadrant; `None` elsewhere.
pub fn conserved_quantity(state: State, params: &ModelParameters) -> Option<f64> {
    if state.prey <= 0.0 || state.predator <= 0.0 {
        return None;
    }
    Some(
        params.delta * state.prey - params.gamma * state.prey.ln() + params.beta * state.predator
            - params.alpha * state.predator.ln(),
    )
}

/// The predator-prey vector field bound to one parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LotkaVolterra {
    params: ModelParameters,
}

impl LotkaVolterra {
    pub fn new(params: ModelParameters) -> Self {
        Self { params }
    }

    /// Analytic Jacobian, row-major: `[[dfx/dX, dfx/dY], [dfy/dX, dfy/dY]]`.
    pub fn jacobian(&self, state: State) -> [[f64; 2]; 2] {
        let p = &self.params;
        let (x, y) = (state.prey, state.predator);
        [
            [p.alpha - p.beta * y, -p.beta * x],
            [p.delta * y, p.delta * x - p.gamma],
        ]
    }
}

impl<T: Scalar> DynamicalSystem<T> for LotkaVolterra {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let alpha: T = lit(self.params.alpha);
        let beta: T = lit(self.params.beta);
        let gamma: T = lit(self.params.gamma);
        let delta: T = lit(self.params.delta);

        let (prey, predator) = (x[0], x[1]);
        let encounters = prey * predator;
        out[0] = alpha * prey - beta * encounters;
        out[1] = delta * encounters - gamma * predator;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivatives_match_closed_form() {
        let params = ModelParameters::new(1.0, 0.1, 1.5, 0.075);
        let rates = derivatives(0.0, State::new(10.0, 5.0), &params);
        // 1*10 - 0.1*50 = 5, 0.075*50 - 1.5*5 = -3.75
        assert!((rates.prey - 5.0).abs() < 1e-12);
        assert!((rates.predator + 3.75).abs() < 1e-12);
    }

    #[test]
    fn derivatives_ignore_time() {
        let params = ModelParameters::default();
        let state = State::new(12.0, 7.0);
        assert_eq!(
            derivatives(0.0, state, &params),
            derivatives(123.0, state, &params)
        );
    }

    #[test]
    fn vector_field_evaluates_in_single_precision() {
        let system = LotkaVolterra::new(ModelParameters::default());
        let mut out = [0.0f32; 2];
        system.apply(0.0f32, &[10.0f32, 5.0f32], &mut out);
        assert!((out[0] - 5.0).abs() < 1e-5);
        assert!((out[1] + 3.75).abs() < 1e-5);
        assert_eq!(DynamicalSystem::<f32>::dimension(&system), 2);
    }

    #[test]
    fn vector_field_stays_finite_for_large_populations() {
        let params = ModelParameters::default();
        let rates = derivatives(0.0, State::new(1.0e3, 1.0e3), &params);
        assert!(rates.is_finite());
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let params = ModelParameters::new(0.8, 0.2, 1.1, 0.05);
        let system = LotkaVolterra::new(params);
        let state = State::new(14.0, 6.0);
        let jac = system.jacobian(state);
        let h = 1e-6;

        let fd = |dx: f64, dy: f64| {
            let plus = derivatives(0.0, State::new(state.prey + dx, state.predator + dy), &params);
            let minus = derivatives(0.0, State::new(state.prey - dx, state.predator - dy), &params);
            (
                (plus.prey - minus.prey) / (2.0 * h),
                (plus.predator - minus.predator) / (2.0 * h),
            )
        };
        let (a, c) = fd(h, 0.0);
        let (b, d) = fd(0.0, h);
        assert!((jac[0][0] - a).abs() < 1e-6);
        assert!((jac[0][1] - b).abs() < 1e-6);
        assert!((jac[1][0] - c).abs() < 1e-6);
        assert!((jac[1][1] - d).abs() < 1e-6);
    }

    #[test]
    fn conserved_quantity_requires_positive_quadrant() {
        let params = ModelParameters::default();
        assert!(conserved_quantity(State::ORIGIN, &params).is_none());
        assert!(conserved_quantity(State::new(-1.0, 3.0), &params).is_none());
        assert!(conserved_quantity(State::new(10.0, 5.0), &params).is_some());
    }

    #[test]
    fn derived_parameters_leave_base_untouched() {
        let base = ModelParameters::default();
        let varied = base.with_alpha(1.2).with_gamma(1.8);
        assert_eq!(base.alpha(), 1.0);
        assert_eq!(base.gamma(), 1.5);
        assert_eq!(varied.alpha(), 1.2);
        assert_eq!(varied.gamma(), 1.8);
        assert_eq!(varied.beta(), base.beta());
        assert_eq!(varied.delta(), base.delta());
    }

    #[test]
    fn positivity_check_rejects_zero_and_nan() {
        assert!(ModelParameters::default().is_positive());
        assert!(!ModelParameters::new(1.0, 0.0, 1.5, 0.075).is_positive());
        assert!(!ModelParameters::new(f64::NAN, 0.1, 1.5, 0.075).is_positive());
    }
}
