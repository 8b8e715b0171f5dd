use crate::traits::{lit, AdaptiveStepper, DynamicalSystem, Scalar, Tolerances};

/// Dormand-Prince 5(4) Solver
///
/// Advances with the fifth-order solution and estimates the local error from the
/// embedded fourth-order weights. The last stage is evaluated at the new state, so an
/// accepted step hands it over as the first stage of the next one (FSAL).
pub struct DormandPrince<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    k5: Vec<T>,
    k6: Vec<T>,
    k7: Vec<T>,
    tmp: Vec<T>,
    // k1 holds f(t, state) for the state the caller will pass next.
    first_stage_ready: bool,
    evaluations: usize,
}

impl<T: Scalar> DormandPrince<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            k5: vec![z; dim],
            k6: vec![z; dim],
            k7: vec![z; dim],
            tmp: vec![z; dim],
            first_stage_ready: false,
            evaluations: 0,
        }
    }

    fn evaluate(&mut self, system: &impl DynamicalSystem<T>, t: T, stage: Stage) {
        let out = match stage {
            Stage::K1 => &mut self.k1,
            Stage::K2 => &mut self.k2,
            Stage::K3 => &mut self.k3,
            Stage::K4 => &mut self.k4,
            Stage::K5 => &mut self.k5,
            Stage::K6 => &mut self.k6,
            Stage::K7 => &mut self.k7,
        };
        system.apply(t, &self.tmp, out);
        self.evaluations += 1;
    }

    fn ensure_first_stage(&mut self, system: &impl DynamicalSystem<T>, t: T, state: &[T]) {
        if !self.first_stage_ready {
            self.tmp.copy_from_slice(state);
            self.evaluate(system, t, Stage::K1);
            self.first_stage_ready = true;
        }
    }

    /// Picks a starting step size for the span `[t0, t0 + span]`.
    ///
    /// Follows Hairer, Norsett & Wanner (II.4): the step is sized so that an explicit
    /// Euler step would change the scaled state by about 1%, then refined with a second
    /// derivative estimate.
    pub fn initial_step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t0: T,
        state: &[T],
        span: T,
        tolerances: Tolerances<T>,
    ) -> T {
        let dim = state.len();
        if dim == 0 {
            return span;
        }
        self.ensure_first_stage(system, t0, state);

        let small: T = lit(1e-5);
        let tiny: T = lit(1e-15);
        let floor: T = lit(1e-6);
        let hundredth: T = lit(0.01);
        let dim_t: T = lit(dim as f64);

        let scale = |i: usize| tolerances.atol + state[i].abs() * tolerances.rtol;
        let rms = |f: &dyn Fn(usize) -> T| {
            let mut sum = T::zero();
            for i in 0..dim {
                let v = f(i);
                sum = sum + v * v;
            }
            (sum / dim_t).sqrt()
        };

        let d0 = rms(&|i: usize| state[i] / scale(i));
        let d1 = rms(&|i: usize| self.k1[i] / scale(i));
        let h0 = (if d0 < small || d1 < small {
            floor
        } else {
            hundredth * d0 / d1
        })
        .min(span);

        for i in 0..dim {
            self.tmp[i] = state[i] + h0 * self.k1[i];
        }
        self.evaluate(system, t0 + h0, Stage::K2);
        let d2 = rms(&|i: usize| (self.k2[i] - self.k1[i]) / scale(i)) / h0;

        let order_inv: T = lit(1.0 / (self.error_order() as f64 + 1.0));
        let h1 = if d1 <= tiny && d2 <= tiny {
            floor.max(h0 * lit::<T>(1e-3))
        } else {
            (hundredth / d1.max(d2)).powf(order_inv)
        };

        (h0 * lit::<T>(100.0)).min(h1).min(span)
    }
}

#[derive(Clone, Copy)]
enum Stage {
    K1,
    K2,
    K3,
    K4,
    K5,
    K6,
    K7,
}

impl<T: Scalar> AdaptiveStepper<T> for DormandPrince<T> {
    fn error_order(&self) -> usize {
        4
    }

    fn attempt(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: T,
        state: &[T],
        dt: T,
        tolerances: Tolerances<T>,
        out: &mut [T],
    ) -> T {
        let n = state.len();
        self.ensure_first_stage(system, t, state);

        // Dormand-Prince coefficients
        let c2: T = lit(1.0 / 5.0);
        let c3: T = lit(3.0 / 10.0);
        let c4: T = lit(4.0 / 5.0);
        let c5: T = lit(8.0 / 9.0);

        let a21: T = lit(1.0 / 5.0);

        let a31: T = lit(3.0 / 40.0);
        let a32: T = lit(9.0 / 40.0);

        let a41: T = lit(44.0 / 45.0);
        let a42: T = lit(-56.0 / 15.0);
        let a43: T = lit(32.0 / 9.0);

        let a51: T = lit(19372.0 / 6561.0);
        let a52: T = lit(-25360.0 / 2187.0);
        let a53: T = lit(64448.0 / 6561.0);
        let a54: T = lit(-212.0 / 729.0);

        let a61: T = lit(9017.0 / 3168.0);
        let a62: T = lit(-355.0 / 33.0);
        let a63: T = lit(46732.0 / 5247.0);
        let a64: T = lit(49.0 / 176.0);
        let a65: T = lit(-5103.0 / 18656.0);

        // 5th-order weights; b2 and b7 vanish.
        let b1: T = lit(35.0 / 384.0);
        let b3: T = lit(500.0 / 1113.0);
        let b4: T = lit(125.0 / 192.0);
        let b5: T = lit(-2187.0 / 6784.0);
        let b6: T = lit(11.0 / 84.0);

        // Difference between the 5th- and 4th-order weights.
        let e1: T = lit(71.0 / 57600.0);
        let e3: T = lit(-71.0 / 16695.0);
        let e4: T = lit(71.0 / 1920.0);
        let e5: T = lit(-17253.0 / 339200.0);
        let e6: T = lit(22.0 / 525.0);
        let e7: T = lit(-1.0 / 40.0);

        // k2
        for i in 0..n {
            self.tmp[i] = state[i] + dt * (a21 * self.k1[i]);
        }
        self.evaluate(system, t + c2 * dt, Stage::K2);

        // k3
        for i in 0..n {
            self.tmp[i] = state[i] + dt * (a31 * self.k1[i] + a32 * self.k2[i]);
        }
        self.evaluate(system, t + c3 * dt, Stage::K3);

        // k4
        for i in 0..n {
            self.tmp[i] =
                state[i] + dt * (a41 * self.k1[i] + a42 * self.k2[i] + a43 * self.k3[i]);
        }
        self.evaluate(system, t + c4 * dt, Stage::K4);

        // k5
        for i in 0..n {
            self.tmp[i] = state[i]
                + dt * (a51 * self.k1[i] + a52 * self.k2[i] + a53 * self.k3[i] + a54 * self.k4[i]);
        }
        self.evaluate(system, t + c5 * dt, Stage::K5);

        // k6
        for i in 0..n {
            self.tmp[i] = state[i]
                + dt * (a61 * self.k1[i]
                    + a62 * self.k2[i]
                    + a63 * self.k3[i]
                    + a64 * self.k4[i]
                    + a65 * self.k5[i]);
        }
        self.evaluate(system, t + dt, Stage::K6);

        // Candidate solution, then k7 = f(t + dt, candidate)
        for i in 0..n {
            out[i] = state[i]
                + dt * (b1 * self.k1[i]
                    + b3 * self.k3[i]
                    + b4 * self.k4[i]
                    + b5 * self.k5[i]
                    + b6 * self.k6[i]);
        }
        self.tmp.copy_from_slice(out);
        self.evaluate(system, t + dt, Stage::K7);

        // Weighted RMS of the embedded error estimate
        let mut sum = T::zero();
        for i in 0..n {
            let err = dt
                * (e1 * self.k1[i]
                    + e3 * self.k3[i]
                    + e4 * self.k4[i]
                    + e5 * self.k5[i]
                    + e6 * self.k6[i]
                    + e7 * self.k7[i]);
            let scale = tolerances.atol + tolerances.rtol * state[i].abs().max(out[i].abs());
            let ratio = err / scale;
            sum = sum + ratio * ratio;
        }
        if n == 0 {
            return T::zero();
        }
        (sum / lit::<T>(n as f64)).sqrt()
    }

    fn accept(&mut self) {
        std::mem::swap(&mut self.k1, &mut self.k7);
        self.first_stage_ready = true;
    }

    fn evaluations(&self) -> usize {
        self.evaluations
    }
}
