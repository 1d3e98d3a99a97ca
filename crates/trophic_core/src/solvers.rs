use crate::traits::{DynamicalSystem, Scalar};

const C: [f64; 6] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];

const A: [[f64; 5]; 6] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0],
    [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        0.0,
    ],
    [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
    ],
];

// 5th order weights
const B: [f64; 6] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];

// Difference between the 5th and embedded 4th order weights (7 stages, FSAL).
const E: [f64; 7] = [
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];

// Quartic continuous extension; row s multiplies stage s, column c multiplies theta^(c+1).
const P: [[f64; 4]; 7] = [
    [
        1.0,
        -8048581381.0 / 2820520608.0,
        8663915743.0 / 2820520608.0,
        -12715105075.0 / 11282082432.0,
    ],
    [0.0, 0.0, 0.0, 0.0],
    [
        0.0,
        131558114200.0 / 32700410799.0,
        -68118460800.0 / 10900136933.0,
        87487479700.0 / 32700410799.0,
    ],
    [
        0.0,
        -1754552775.0 / 470086768.0,
        14199869525.0 / 1410260304.0,
        -10690763975.0 / 1880347072.0,
    ],
    [
        0.0,
        127303824393.0 / 49829197408.0,
        -318862633887.0 / 49829197408.0,
        701980252875.0 / 199316789632.0,
    ],
    [
        0.0,
        -282668133.0 / 205662961.0,
        2019193451.0 / 616988883.0,
        -1453857185.0 / 822651844.0,
    ],
    [
        0.0,
        40617522.0 / 29380423.0,
        -110615467.0 / 29380423.0,
        69997945.0 / 29380423.0,
    ],
];

/// Order of the embedded error estimate, used for step-size control.
pub const ERROR_ESTIMATOR_ORDER: i32 = 4;

/// Dormand-Prince 5(4) stepper with first-same-as-last stages and dense output.
///
/// The stepper only attempts steps; acceptance and step-size control live in
/// the integration driver.
pub struct DormandPrince45<T: Scalar> {
    k: [Vec<T>; 7],
    tmp: Vec<T>,
    y_old: Vec<T>,
    t_old: T,
    h_last: T,
}

impl<T: Scalar> DormandPrince45<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::from_f64(0.0).unwrap();
        Self {
            k: std::array::from_fn(|_| vec![z; dim]),
            tmp: vec![z; dim],
            y_old: vec![z; dim],
            t_old: z,
            h_last: z,
        }
    }

    /// Seeds the first stage with f(t, y). Must be called before the first attempt.
    pub fn prime(&mut self, system: &impl DynamicalSystem<T>, t: T, state: &[T]) {
        system.apply(t, state, &mut self.k[0]);
    }

    /// Derivative at the start of the next attempt.
    pub fn derivative(&self) -> &[T] {
        &self.k[0]
    }

    /// Attempts a step of size `h` from (t, state).
    ///
    /// Writes the 5th order solution into `y_new` and the local error estimate
    /// into `error`. Nothing is committed until [`accept`](Self::accept).
    pub fn attempt(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: T,
        state: &[T],
        h: T,
        y_new: &mut [T],
        error: &mut [T],
    ) {
        let dim = state.len();

        for s in 1..6 {
            for i in 0..dim {
                let mut acc = T::from_f64(0.0).unwrap();
                for j in 0..s {
                    acc = acc + T::from_f64(A[s][j]).unwrap() * self.k[j][i];
                }
                self.tmp[i] = state[i] + h * acc;
            }
            let ts = t + T::from_f64(C[s]).unwrap() * h;
            system.apply(ts, &self.tmp, &mut self.k[s]);
        }

        for i in 0..dim {
            let mut acc = T::from_f64(0.0).unwrap();
            for j in 0..6 {
                acc = acc + T::from_f64(B[j]).unwrap() * self.k[j][i];
            }
            y_new[i] = state[i] + h * acc;
        }

        system.apply(t + h, y_new, &mut self.k[6]);

        for i in 0..dim {
            let mut acc = T::from_f64(0.0).unwrap();
            for j in 0..7 {
                acc = acc + T::from_f64(E[j]).unwrap() * self.k[j][i];
            }
            error[i] = h * acc;
        }
    }

    /// Records the interpolation data for the step just attempted.
    ///
    /// After this call [`interpolate`](Self::interpolate) covers [t, t + h].
    pub fn accept(&mut self, t: T, state: &[T], h: T) {
        self.t_old = t;
        self.h_last = h;
        self.y_old.copy_from_slice(state);
    }

    /// Evaluates the continuous extension of the last accepted step at `t`.
    pub fn interpolate(&self, t: T, out: &mut [T]) {
        let theta = (t - self.t_old) / self.h_last;
        let mut powers = [theta; 4];
        for c in 1..4 {
            powers[c] = powers[c - 1] * theta;
        }
        for i in 0..out.len() {
            let mut acc = T::from_f64(0.0).unwrap();
            for c in 0..4 {
                let mut q = T::from_f64(0.0).unwrap();
                for s in 0..7 {
                    q = q + self.k[s][i] * T::from_f64(P[s][c]).unwrap();
                }
                acc = acc + q * powers[c];
            }
            out[i] = self.y_old[i] + self.h_last * acc;
        }
    }

    /// Shifts the last stage into the first slot for the next step.
    ///
    /// Must be called after all interpolation for the accepted step is done.
    pub fn advance(&mut self) {
        self.k.swap(0, 6);
    }
}
