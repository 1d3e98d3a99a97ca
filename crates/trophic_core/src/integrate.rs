//! Adaptive integration driver.
//!
//! Advances a [`DynamicalSystem`] from `t = 0` to `t = time_span` with the
//! Dormand-Prince 5(4) pair under local error control, then reports the
//! trajectory on a fixed grid of evenly spaced samples that is independent of
//! the internal steps. A run either produces the whole trajectory or fails.

use crate::error::{config_bail, Result, SimulationError};
use crate::solvers::{DormandPrince45, ERROR_ESTIMATOR_ORDER};
use crate::traits::DynamicalSystem;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegratorSettings {
    pub rtol: f64,
    pub atol: f64,
    /// Upper bound on step attempts (accepted plus rejected).
    pub max_steps: usize,
    /// Number of evenly spaced report points, endpoints included.
    pub sample_count: usize,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            rtol: 1e-3,
            atol: 1e-6,
            max_steps: 100_000,
            sample_count: 1000,
        }
    }
}

impl IntegratorSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.rtol > 0.0) {
            config_bail!("rtol must be positive.");
        }
        if !(self.atol > 0.0) {
            config_bail!("atol must be positive.");
        }
        if self.max_steps == 0 {
            config_bail!("max_steps must be greater than zero.");
        }
        if self.sample_count < 2 {
            config_bail!(
                "sample_count must be at least 2, got {}.",
                self.sample_count
            );
        }
        Ok(())
    }
}

/// A sampled trajectory: row `k` of `populations` is the state at `times[k]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    times: Vec<f64>,
    populations: Vec<Vec<f64>>,
}

impl SimulationResult {
    /// Builds a result from raw parts, checking its shape.
    ///
    /// `times` must be strictly increasing, there must be one row per time,
    /// and every row must have the same width.
    pub fn from_parts(times: Vec<f64>, populations: Vec<Vec<f64>>) -> Result<Self> {
        if times.len() != populations.len() {
            config_bail!(
                "Trajectory has {} times but {} population rows.",
                times.len(),
                populations.len()
            );
        }
        if times.windows(2).any(|w| !(w[0] < w[1])) {
            config_bail!("Trajectory times must be strictly increasing.");
        }
        if let Some(first) = populations.first() {
            let width = first.len();
            if populations.iter().any(|row| row.len() != width) {
                config_bail!("Every population row must have {} entries.", width);
            }
        }
        Ok(Self { times, populations })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn populations(&self) -> &[Vec<f64>] {
        &self.populations
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn species_count(&self) -> usize {
        self.populations.first().map_or(0, Vec::len)
    }

    /// The time series of one species.
    pub fn series(&self, species: usize) -> Vec<f64> {
        self.populations.iter().map(|row| row[species]).collect()
    }

    pub fn final_state(&self) -> Option<&[f64]> {
        self.populations.last().map(Vec::as_slice)
    }
}

/// `count` evenly spaced times from 0 to `time_span`, both included.
pub fn sample_grid(time_span: f64, count: usize) -> Vec<f64> {
    let last = count.saturating_sub(1);
    let mut grid: Vec<f64> = (0..count)
        .map(|i| time_span * i as f64 / last.max(1) as f64)
        .collect();
    if let Some(end) = grid.last_mut() {
        if last > 0 {
            *end = time_span;
        }
    }
    grid
}

pub fn integrate<S: DynamicalSystem<f64>>(
    system: &S,
    initial_state: &[f64],
    time_span: f64,
    settings: &IntegratorSettings,
) -> Result<SimulationResult> {
    integrate_with_cancel(
        system,
        initial_state,
        time_span,
        settings,
        &AtomicBool::new(false),
    )
}

/// Like [`integrate`], but aborts with an integration error once `cancel`
/// is set. The flag is checked before every step attempt.
pub fn integrate_with_cancel<S: DynamicalSystem<f64>>(
    system: &S,
    initial_state: &[f64],
    time_span: f64,
    settings: &IntegratorSettings,
    cancel: &AtomicBool,
) -> Result<SimulationResult> {
    let dim = system.dimension();
    if dim == 0 {
        config_bail!("System has zero dimension.");
    }
    if initial_state.len() != dim {
        config_bail!(
            "Initial state dimension mismatch. Expected {}, got {}.",
            dim,
            initial_state.len()
        );
    }
    if !(time_span > 0.0) || !time_span.is_finite() {
        config_bail!("time_span must be a positive finite number, got {}.", time_span);
    }
    settings.validate()?;

    let result = drive(system, initial_state, time_span, settings, cancel);
    if let Err(err) = &result {
        log::warn!("{err}");
    }
    result
}

fn drive<S: DynamicalSystem<f64>>(
    system: &S,
    initial_state: &[f64],
    time_span: f64,
    settings: &IntegratorSettings,
    cancel: &AtomicBool,
) -> Result<SimulationResult> {
    let dim = initial_state.len();
    let grid = sample_grid(time_span, settings.sample_count);
    let exponent = -1.0 / (ERROR_ESTIMATOR_ORDER as f64 + 1.0);

    let mut populations = Vec::with_capacity(grid.len());
    populations.push(initial_state.to_vec());
    let mut next_sample = 1usize;

    let mut stepper = DormandPrince45::new(dim);
    let mut state = initial_state.to_vec();
    let mut y_new = vec![0.0; dim];
    let mut error = vec![0.0; dim];
    let mut t = 0.0;

    stepper.prime(system, t, &state);
    let mut h = initial_step(system, &state, stepper.derivative(), time_span, settings);
    let mut evaluations = 2usize;
    let mut attempts = 0usize;
    let mut rejected = 0usize;

    while next_sample < grid.len() {
        let mut rejected_here = false;
        loop {
            if cancel.load(Ordering::Relaxed) {
                return Err(SimulationError::Integration(format!(
                    "Integration cancelled at t = {t}."
                )));
            }
            if attempts >= settings.max_steps {
                return Err(SimulationError::Integration(format!(
                    "Exceeded {} steps before reaching t = {} (stopped at t = {}).",
                    settings.max_steps, time_span, t
                )));
            }
            let min_step = 10.0 * spacing(t);
            if !(h >= min_step) {
                return Err(SimulationError::Integration(format!(
                    "Required step size is less than spacing between numbers at t = {t}."
                )));
            }

            let mut t_new = t + h;
            if t_new > time_span {
                t_new = time_span;
            }
            let step = t_new - t;

            stepper.attempt(system, t, &state, step, &mut y_new, &mut error);
            attempts += 1;
            evaluations += 6;

            let err_norm = rms((0..dim).map(|i| {
                let scale = settings.atol + state[i].abs().max(y_new[i].abs()) * settings.rtol;
                error[i] / scale
            }));

            if err_norm < 1.0 {
                let mut factor = if err_norm == 0.0 {
                    MAX_FACTOR
                } else {
                    MAX_FACTOR.min(SAFETY * err_norm.powf(exponent))
                };
                if rejected_here {
                    factor = factor.min(1.0);
                }

                stepper.accept(t, &state, step);
                while next_sample < grid.len() && grid[next_sample] <= t_new {
                    if grid[next_sample] == t_new {
                        populations.push(y_new.clone());
                    } else {
                        let mut row = vec![0.0; dim];
                        stepper.interpolate(grid[next_sample], &mut row);
                        populations.push(row);
                    }
                    next_sample += 1;
                }
                stepper.advance();
                state.copy_from_slice(&y_new);
                t = t_new;
                h = step * factor;
                break;
            }

            rejected += 1;
            rejected_here = true;
            h = if err_norm.is_finite() {
                step * MIN_FACTOR.max(SAFETY * err_norm.powf(exponent))
            } else {
                step * MIN_FACTOR
            };
        }
    }

    log::debug!(
        "Integrated {} species to t = {} in {} accepted / {} rejected steps ({} evaluations).",
        dim,
        time_span,
        attempts - rejected,
        rejected,
        evaluations
    );

    Ok(SimulationResult {
        times: grid,
        populations,
    })
}

/// Picks the first step from the local scale of the solution and its derivative.
fn initial_step<S: DynamicalSystem<f64>>(
    system: &S,
    y0: &[f64],
    f0: &[f64],
    time_span: f64,
    settings: &IntegratorSettings,
) -> f64 {
    let dim = y0.len();
    let scale: Vec<f64> = y0
        .iter()
        .map(|y| settings.atol + y.abs() * settings.rtol)
        .collect();
    let d0 = rms((0..dim).map(|i| y0[i] / scale[i]));
    let d1 = rms((0..dim).map(|i| f0[i] / scale[i]));

    let h0 = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    };
    let h0 = h0.min(time_span);

    let y1: Vec<f64> = (0..dim).map(|i| y0[i] + h0 * f0[i]).collect();
    let mut f1 = vec![0.0; dim];
    system.apply(h0, &y1, &mut f1);
    let d2 = rms((0..dim).map(|i| (f1[i] - f0[i]) / scale[i])) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        1e-6f64.max(h0 * 1e-3)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / (ERROR_ESTIMATOR_ORDER as f64 + 1.0))
    };

    (100.0 * h0).min(h1).min(time_span)
}

fn rms(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v * v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        (sum / count as f64).sqrt()
    }
}

/// Distance from `t` to the next representable number above it (`t >= 0`).
fn spacing(t: f64) -> f64 {
    let magnitude = t.abs();
    f64::from_bits(magnitude.to_bits() + 1) - magnitude
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterSet;
    use crate::systems::PredatorPrey;

    struct Linear {
        rate: f64,
    }

    impl DynamicalSystem<f64> for Linear {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = self.rate * x[0];
        }
    }

    struct Quadratic;

    impl DynamicalSystem<f64> for Quadratic {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = x[0] * x[0];
        }
    }

    /// Decays linearly and raises `cancel` once it has been evaluated `trip_after` times.
    struct Tripwire<'a> {
        cancel: &'a AtomicBool,
        trip_after: usize,
        evaluations: std::cell::Cell<usize>,
    }

    impl DynamicalSystem<f64> for Tripwire<'_> {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            let count = self.evaluations.get() + 1;
            self.evaluations.set(count);
            if count >= self.trip_after {
                self.cancel.store(true, Ordering::Relaxed);
            }
            out[0] = -0.5 * x[0];
        }
    }

    fn assert_err_contains<T: std::fmt::Debug>(result: Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn grid_is_uniform_and_hits_endpoints() {
        let grid = sample_grid(100.0, 1000);
        assert_eq!(grid.len(), 1000);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[999], 100.0);
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
        assert!((grid[1] - 100.0 / 999.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_invalid_configuration() {
        let system = Linear { rate: 1.0 };
        let settings = IntegratorSettings::default();
        assert_err_contains(
            integrate(&system, &[1.0, 2.0], 10.0, &settings),
            "dimension mismatch",
        );
        assert_err_contains(integrate(&system, &[1.0], 0.0, &settings), "time_span");
        assert_err_contains(integrate(&system, &[1.0], -5.0, &settings), "time_span");
        assert_err_contains(
            integrate(
                &system,
                &[1.0],
                10.0,
                &IntegratorSettings {
                    sample_count: 1,
                    ..settings
                },
            ),
            "sample_count",
        );
        assert_err_contains(
            integrate(
                &system,
                &[1.0],
                10.0,
                &IntegratorSettings {
                    rtol: 0.0,
                    ..settings
                },
            ),
            "rtol",
        );
        let err = integrate(&system, &[1.0, 2.0], 10.0, &settings).unwrap_err();
        assert!(matches!(err, SimulationError::Configuration(_)));
    }

    #[test]
    fn zero_rates_hold_initial_state_exactly() {
        let system = PredatorPrey::unperturbed(ParameterSet::new(0.0, 0.0, 0.0, 0.0));
        let result = integrate(&system, &[100.0, 50.0], 100.0, &IntegratorSettings::default())
            .expect("integration should succeed");
        assert_eq!(result.len(), 1000);
        for row in result.populations() {
            assert_eq!(row, &vec![100.0, 50.0]);
        }
    }

    #[test]
    fn exponential_decay_is_accurate() {
        let system = Linear { rate: -1.0 };
        let settings = IntegratorSettings {
            rtol: 1e-8,
            atol: 1e-10,
            sample_count: 51,
            ..IntegratorSettings::default()
        };
        let result = integrate(&system, &[1.0], 5.0, &settings).expect("integration should succeed");
        for (t, row) in result.times().iter().zip(result.populations()) {
            assert!((row[0] - (-t).exp()).abs() < 1e-6, "t = {t}");
        }
    }

    #[test]
    fn integration_is_deterministic() {
        let system = PredatorPrey::unperturbed(ParameterSet::new(1.0, 0.1, 0.3, 0.1));
        let settings = IntegratorSettings::default();
        let a = integrate(&system, &[100.0, 50.0], 100.0, &settings).expect("first run");
        let b = integrate(&system, &[100.0, 50.0], 100.0, &settings).expect("second run");
        assert_eq!(a, b);
        assert!(a.times().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(a.times().len(), a.populations().len());
    }

    #[test]
    fn cancellation_aborts_without_partial_result() {
        let system = Linear { rate: 0.5 };
        let cancel = AtomicBool::new(true);
        let result = integrate_with_cancel(
            &system,
            &[1.0],
            10.0,
            &IntegratorSettings::default(),
            &cancel,
        );
        assert_err_contains(result, "cancelled");
    }

    #[test]
    fn cancellation_mid_run_stops_the_driver() {
        let cancel = AtomicBool::new(false);
        let system = Tripwire {
            cancel: &cancel,
            trip_after: 40,
            evaluations: std::cell::Cell::new(0),
        };
        let settings = IntegratorSettings {
            rtol: 1e-10,
            atol: 1e-12,
            ..IntegratorSettings::default()
        };
        let result = integrate_with_cancel(&system, &[1.0], 50.0, &settings, &cancel);
        let err = result.expect_err("cancelled run should fail");
        assert!(matches!(err, SimulationError::Integration(_)), "{err:?}");
        assert!(err.to_string().contains("cancelled"), "{err}");
        // Six evaluations per attempt: the flag is seen within one attempt of tripping.
        assert!(system.evaluations.get() < 40 + 7, "{}", system.evaluations.get());
    }

    #[test]
    fn step_budget_is_enforced() {
        let system = PredatorPrey::unperturbed(ParameterSet::new(1.0, 0.1, 0.3, 0.1));
        let settings = IntegratorSettings {
            max_steps: 3,
            ..IntegratorSettings::default()
        };
        let result = integrate(&system, &[100.0, 50.0], 100.0, &settings);
        assert_err_contains(result, "Exceeded 3 steps");
    }

    #[test]
    fn finite_time_blow_up_is_an_integration_error() {
        let result = integrate(&Quadratic, &[1.0], 2.0, &IntegratorSettings::default());
        let err = result.expect_err("blow-up should fail");
        assert!(matches!(err, SimulationError::Integration(_)), "{err:?}");
    }

    #[test]
    fn from_parts_checks_shape() {
        assert!(SimulationResult::from_parts(vec![0.0, 1.0], vec![vec![1.0], vec![2.0]]).is_ok());
        assert_err_contains(
            SimulationResult::from_parts(vec![0.0, 1.0], vec![vec![1.0]]),
            "population rows",
        );
        assert_err_contains(
            SimulationResult::from_parts(vec![0.0, 0.0], vec![vec![1.0], vec![2.0]]),
            "strictly increasing",
        );
        assert_err_contains(
            SimulationResult::from_parts(vec![0.0, 1.0], vec![vec![1.0], vec![2.0, 3.0]]),
            "entries",
        );
    }

    #[test]
    fn result_accessors_expose_columns() {
        let result = SimulationResult::from_parts(
            vec![0.0, 0.5, 1.0],
            vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]],
        )
        .expect("valid result");
        assert_eq!(result.species_count(), 2);
        assert_eq!(result.series(1), vec![10.0, 20.0, 30.0]);
        assert_eq!(result.final_state(), Some(&[3.0, 30.0][..]));
    }
}
