use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars in our dynamical systems.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + Send + Sync + 'static {}

impl<T: Float + FromPrimitive + Debug + Send + Sync + 'static> Scalar for T {}

/// Converts an `f64` literal into the scalar type.
///
/// Every `Float` can represent an `f64` (possibly rounded), so the NaN fallback only
/// triggers for exotic scalar types and surfaces as a non-finite step downstream.
pub(crate) fn lit<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

/// Represents a continuous-time dynamical system `dx/dt = f(t, x)`.
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// t: current time
    /// x: current state
    /// out: buffer to write dx/dt
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

/// Error tolerances bounding the local truncation error of one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances<T> {
    pub rtol: T,
    pub atol: T,
}

/// A solver that attempts steps with an embedded error estimate.
pub trait AdaptiveStepper<T: Scalar> {
    /// Order of the error estimator, used by step-size control.
    fn error_order(&self) -> usize;

    /// Attempts one step of size dt from (t, state), writing the candidate into `out`.
    /// Returns the RMS error norm weighted by `tolerances`; at most one means acceptable.
    fn attempt(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: T,
        state: &[T],
        dt: T,
        tolerances: Tolerances<T>,
        out: &mut [T],
    ) -> T;

    /// Commits the last attempted step. The caller must adopt the candidate state.
    fn accept(&mut self);

    /// Number of right-hand side evaluations performed so far.
    fn evaluations(&self) -> usize;
}
