pub mod ecosystem;
pub mod error;
pub mod integrate;
pub mod metrics;
pub mod perturbation;
pub mod params;
pub mod presets;
pub mod simulation;
pub mod solvers;
pub mod systems;
/// The `trophic_core` crate is the numerical engine behind the Trophic simulator.
/// It integrates Lotka-Volterra predator-prey dynamics under time-varying
/// environmental stress, and generalized N-species food webs.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (right-hand sides).
/// - **Perturbation**: Folds active environmental events into effective rates at each time.
/// - **Systems**: The two-species and N-species right-hand sides.
/// - **Solvers**: Dormand-Prince 5(4) stepper with dense output, driven adaptively by `integrate`.
/// - **Metrics**: Period, phase, peak and stability statistics of a finished trajectory.
pub mod traits;

pub use error::{Result, SimulationError};
