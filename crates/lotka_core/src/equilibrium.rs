use crate::error::{LotkaError, Result};
use crate::model::{derivatives, LotkaVolterra, ModelParameters, State};
use nalgebra::{Complex, Matrix2};
use serde::{Deserialize, Serialize};

/// The two fixed points of the system: extinction `(0, 0)` and coexistence
/// `(gamma/delta, alpha/beta)`.
pub fn equilibrium_points(params: &ModelParameters) -> Result<[State; 2]> {
    let named = [
        ("alpha", params.alpha()),
        ("beta", params.beta()),
        ("gamma", params.gamma()),
        ("delta", params.delta()),
    ];
    if let Some(&(parameter, value)) = named.iter().find(|(_, v)| !v.is_finite()) {
        return Err(LotkaError::NonFiniteParameter { parameter, value });
    }
    if params.delta() == 0.0 {
        return Err(LotkaError::DegenerateParameter { parameter: "delta" });
    }
    if params.beta() == 0.0 {
        return Err(LotkaError::DegenerateParameter { parameter: "beta" });
    }
    let coexistence = State::new(
        params.gamma() / params.delta(),
        params.alpha() / params.beta(),
    );
    // Finite coefficients can still overflow when the divisor is tiny.
    if !coexistence.prey.is_finite() {
        return Err(LotkaError::DegenerateParameter { parameter: "delta" });
    }
    if !coexistence.predator.is_finite() {
        return Err(LotkaError::DegenerateParameter { parameter: "beta" });
    }
    Ok([State::ORIGIN, coexistence])
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexNumber {
    pub re: f64,
    pub im: f64,
}

impl From<Complex<f64>> for ComplexNumber {
    fn from(value: Complex<f64>) -> Self {
        Self {
            re: value.re,
            im: value.im,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquilibriumKind {
    Saddle,
    Center,
    StableNode,
    UnstableNode,
    StableFocus,
    UnstableFocus,
    /// At least one eigenvalue is zero; linearization is inconclusive.
    Degenerate,
}

impl EquilibriumKind {
    pub fn label(&self) -> &'static str {
        match self {
            EquilibriumKind::Saddle => "saddle",
            EquilibriumKind::Center => "center",
            EquilibriumKind::StableNode => "stable node",
            EquilibriumKind::UnstableNode => "unstable node",
            EquilibriumKind::StableFocus => "stable focus",
            EquilibriumKind::UnstableFocus => "unstable focus",
            EquilibriumKind::Degenerate => "degenerate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumReport {
    pub state: State,
    /// Vector field evaluated at `state`; zero up to rounding.
    pub residual: State,
    pub jacobian: [[f64; 2]; 2],
    pub eigenvalues: [ComplexNumber; 2],
    pub kind: EquilibriumKind,
}

/// Equilibria together with the linear stability of each.
pub fn analyze_equilibria(params: &ModelParameters) -> Result<[EquilibriumReport; 2]> {
    let [origin, coexistence] = equilibrium_points(params)?;
    Ok([analyze_point(params, origin), analyze_point(params, coexistence)])
}

fn analyze_point(params: &ModelParameters, state: State) -> EquilibriumReport {
    let jacobian = LotkaVolterra::new(*params).jacobian(state);
    let matrix = Matrix2::new(
        jacobian[0][0],
        jacobian[0][1],
        jacobian[1][0],
        jacobian[1][1],
    );
    let eigenvalues = matrix.complex_eigenvalues();
    let pair = [eigenvalues[0], eigenvalues[1]];

    EquilibriumReport {
        state,
        residual: derivatives(0.0, state, params),
        jacobian,
        eigenvalues: [pair[0].into(), pair[1].into()],
        kind: classify(&pair),
    }
}

/// Classifies a planar fixed point from the eigenvalues of its Jacobian.
pub fn classify(eigenvalues: &[Complex<f64>; 2]) -> EquilibriumKind {
    let scale = eigenvalues
        .iter()
        .map(|l| l.norm())
        .fold(1.0f64, f64::max);
    let tol = 1e-9 * scale;
    let [l1, l2] = *eigenvalues;

    if l1.im.abs() > tol {
        // Complex conjugate pair: both share the real part.
        return if l1.re.abs() <= tol {
            EquilibriumKind::Center
        } else if l1.re < 0.0 {
            EquilibriumKind::StableFocus
        } else {
            EquilibriumKind::UnstableFocus
        };
    }

    let (a, b) = (l1.re, l2.re);
    if a.abs() <= tol || b.abs() <= tol {
        EquilibriumKind::Degenerate
    } else if a < 0.0 && b < 0.0 {
        EquilibriumKind::StableNode
    } else if a > 0.0 && b > 0.0 {
        EquilibriumKind::UnstableNode
    } else {
        EquilibriumKind::Saddle
    }
}

/// Period `2*pi / sqrt(alpha*gamma)` of small oscillations around the coexistence point.
pub fn linearized_period(params: &ModelParameters) -> Option<f64> {
    let product = params.alpha() * params.gamma();
    if product > 0.0 && product.is_finite() {
        Some(2.0 * std::f64::consts::PI / product.sqrt())
    } else {
        None
    }
}

/// Non-trivial nullclines. Besides these, `X = 0` is a prey nullcline and `Y = 0` a
/// predator nullcline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nullclines {
    /// `dX/dt = 0` along the horizontal line `Y = alpha/beta`.
    pub prey_level: f64,
    /// `dY/dt = 0` along the vertical line `X = gamma/delta`.
    pub predator_level: f64,
}

pub fn nullclines(params: &ModelParameters) -> Result<Nullclines> {
    let [_, coexistence] = equilibrium_points(params)?;
    Ok(Nullclines {
        prey_level: coexistence.predator,
        predator_level: coexistence.prey,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMETER_SETS: [(f64, f64, f64, f64); 5] = [
        (1.0, 0.1, 1.5, 0.075),
        (0.8, 0.1, 1.5, 0.075),
        (1.2, 0.1, 1.8, 0.075),
        (2.0, 0.5, 0.3, 0.02),
        (0.05, 3.0, 7.0, 1.5),
    ];

    #[test]
    fn equilibria_match_closed_form() {
        for (a, b, g, d) in PARAMETER_SETS {
            let params = ModelParameters::new(a, b, g, d);
            let [e0, e1] = equilibrium_points(&params).expect("positive parameters");
            assert_eq!(e0, State::ORIGIN);
            assert!((e1.prey - g / d).abs() < 1e-12);
            assert!((e1.predator - a / b).abs() < 1e-12);
        }
    }

    #[test]
    fn vector_field_vanishes_at_equilibria() {
        for (a, b, g, d) in PARAMETER_SETS {
            let params = ModelParameters::new(a, b, g, d);
            for point in equilibrium_points(&params).expect("positive parameters") {
                let rates = derivatives(0.0, point, &params);
                assert!(rates.prey.abs() < 1e-6, "dX/dt = {} at {point:?}", rates.prey);
                assert!(
                    rates.predator.abs() < 1e-6,
                    "dY/dt = {} at {point:?}",
                    rates.predator
                );
            }
        }
    }

    #[test]
    fn zero_delta_is_degenerate() {
        let err = equilibrium_points(&ModelParameters::new(1.0, 0.1, 1.5, 0.0))
            .expect_err("delta = 0 has no coexistence point");
        assert_eq!(err, LotkaError::DegenerateParameter { parameter: "delta" });
    }

    #[test]
    fn zero_beta_is_degenerate() {
        let err = equilibrium_points(&ModelParameters::new(1.0, 0.0, 1.5, 0.075))
            .expect_err("beta = 0 has no coexistence point");
        assert_eq!(err, LotkaError::DegenerateParameter { parameter: "beta" });
    }

    #[test]
    fn non_finite_coefficient_is_named() {
        let err = equilibrium_points(&ModelParameters::new(f64::NAN, 0.1, 1.5, 0.075))
            .expect_err("NaN alpha has no equilibrium");
        assert!(matches!(
            err,
            LotkaError::NonFiniteParameter { parameter: "alpha", .. }
        ));
        assert!(err.to_string().contains("alpha"));

        let err = equilibrium_points(&ModelParameters::new(1.0, 0.1, f64::INFINITY, 0.075))
            .expect_err("infinite gamma has no equilibrium");
        assert!(matches!(
            err,
            LotkaError::NonFiniteParameter { parameter: "gamma", .. }
        ));
    }

    #[test]
    fn tiny_divisor_is_degenerate() {
        let err = equilibrium_points(&ModelParameters::new(1.0, 0.1, 1.0e300, 1.0e-300))
            .expect_err("gamma/delta overflows");
        assert_eq!(err, LotkaError::DegenerateParameter { parameter: "delta" });
    }

    #[test]
    fn origin_is_saddle_and_coexistence_is_center() {
        let params = ModelParameters::default();
        let [origin, coexistence] = analyze_equilibria(&params).expect("positive parameters");

        assert_eq!(origin.kind, EquilibriumKind::Saddle);
        let mut reals = [origin.eigenvalues[0].re, origin.eigenvalues[1].re];
        reals.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((reals[0] + 1.5).abs() < 1e-9);
        assert!((reals[1] - 1.0).abs() < 1e-9);

        assert_eq!(coexistence.kind, EquilibriumKind::Center);
        let omega = (params.alpha() * params.gamma()).sqrt();
        for lambda in coexistence.eigenvalues {
            assert!(lambda.re.abs() < 1e-9);
            assert!((lambda.im.abs() - omega).abs() < 1e-9);
        }
        assert!(coexistence.residual.max_abs() < 1e-6);
    }

    #[test]
    fn classify_covers_planar_cases() {
        let c = |re: f64, im: f64| Complex::new(re, im);
        assert_eq!(classify(&[c(-1.0, 0.0), c(-2.0, 0.0)]), EquilibriumKind::StableNode);
        assert_eq!(classify(&[c(1.0, 0.0), c(2.0, 0.0)]), EquilibriumKind::UnstableNode);
        assert_eq!(classify(&[c(-1.0, 0.0), c(2.0, 0.0)]), EquilibriumKind::Saddle);
        assert_eq!(classify(&[c(-0.5, 1.0), c(-0.5, -1.0)]), EquilibriumKind::StableFocus);
        assert_eq!(classify(&[c(0.5, 1.0), c(0.5, -1.0)]), EquilibriumKind::UnstableFocus);
        assert_eq!(classify(&[c(0.0, 1.0), c(0.0, -1.0)]), EquilibriumKind::Center);
        assert_eq!(classify(&[c(0.0, 0.0), c(-1.0, 0.0)]), EquilibriumKind::Degenerate);
    }

    #[test]
    fn linearized_period_uses_alpha_gamma() {
        let period = linearized_period(&ModelParameters::new(1.0, 0.1, 4.0, 0.075))
            .expect("positive rates");
        assert!((period - std::f64::consts::PI).abs() < 1e-12);
        assert!(linearized_period(&ModelParameters::new(0.0, 0.1, 1.5, 0.075)).is_none());
    }

    #[test]
    fn nullclines_cross_at_coexistence_point() {
        let params = ModelParameters::default();
        let lines = nullclines(&params).expect("positive parameters");
        assert!((lines.prey_level - 10.0).abs() < 1e-12);
        assert!((lines.predator_level - 20.0).abs() < 1e-12);
    }
}
