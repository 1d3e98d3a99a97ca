use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars in our population models.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Represents a continuous-time population model (a system of first-order ODEs).
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the number of species (state dimension).
    fn dimension(&self) -> usize;

    /// Evaluates the rate of change of every population.
    /// x: current populations
    /// t: current time
    /// out: buffer to write dx/dt into
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}
