//! The `lotka_core` crate provides the numerical engine for the `lotka` CLI.
//!
//! Key components:
//! - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (autonomous flows),
//!   `AdaptiveStepper` (embedded Runge-Kutta solvers).
//! - **Model**: `ModelParameters`, `State` and the `LotkaVolterra` vector field.
//! - **Solvers**: the Dormand-Prince 5(4) pair with FSAL stage reuse.
//! - **Integrate**: sampling a trajectory onto a uniform time grid with error control.
//! - **Equilibrium**: the two fixed points and their linear stability.
//! - **Sweep**: one-parameter sensitivity runs evaluated in parallel.
pub mod equilibrium;
pub mod error;
pub mod integrate;
pub mod model;
pub mod solvers;
pub mod sweep;
pub mod traits;

pub use error::{LotkaError, Result};
