//! Derivative evaluators for the two-species and generalized food-web models.

use crate::ecosystem::SpeciesEcosystem;
use crate::params::{EnvironmentalEvent, ParameterSet};
use crate::perturbation::compose;
use crate::traits::DynamicalSystem;

/// Logistic damping `1 - x/K`; an absent capacity leaves growth unconstrained.
///
/// A finite capacity of zero divides by zero and is not guarded.
#[inline]
pub fn logistic_factor(x: f64, capacity: Option<f64>) -> f64 {
    match capacity {
        Some(k) => 1.0 - x / k,
        None => 1.0,
    }
}

/// Lotka-Volterra predator-prey system under a list of environmental events.
///
/// State layout is `[prey, predator]`.
#[derive(Debug, Clone)]
pub struct PredatorPrey {
    base: ParameterSet,
    events: Vec<EnvironmentalEvent>,
}

impl PredatorPrey {
    pub fn new(base: ParameterSet, events: Vec<EnvironmentalEvent>) -> Self {
        Self { base, events }
    }

    pub fn unperturbed(base: ParameterSet) -> Self {
        Self::new(base, Vec::new())
    }

    pub fn base(&self) -> &ParameterSet {
        &self.base
    }

    pub fn events(&self) -> &[EnvironmentalEvent] {
        &self.events
    }

    /// Parameters in effect at time `t` after folding every active event.
    pub fn effective_params(&self, t: f64) -> ParameterSet {
        compose(&self.base, t, &self.events)
    }
}

impl DynamicalSystem<f64> for PredatorPrey {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        let p = self.effective_params(t);
        let prey = x[0];
        let predator = x[1];

        out[0] = p.prey_growth * prey * logistic_factor(prey, p.prey_capacity)
            - p.predation_loss * prey * predator;
        out[1] = p.predator_growth * prey * predator - p.predator_death * predator;

        if let Some(mortality) = p.direct_mortality {
            out[0] -= mortality * prey;
            out[1] -= mortality * predator;
        }
    }
}

/// Generalized N-species system:
/// `dx_i/dt = r_i x_i (1 - x_i/K_i) + x_i * sum_{j != i} A[i][j] x_j`.
#[derive(Debug, Clone)]
pub struct FoodWeb {
    ecosystem: SpeciesEcosystem,
}

impl FoodWeb {
    pub fn new(ecosystem: SpeciesEcosystem) -> Self {
        Self { ecosystem }
    }

    pub fn ecosystem(&self) -> &SpeciesEcosystem {
        &self.ecosystem
    }
}

impl DynamicalSystem<f64> for FoodWeb {
    fn dimension(&self) -> usize {
        self.ecosystem.species_count()
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let rates = self.ecosystem.growth_rates();
        let capacities = self.ecosystem.carrying_capacities();
        let interaction = self.ecosystem.interaction();
        let n = x.len();

        for i in 0..n {
            let mut coupling = 0.0;
            for j in 0..n {
                if i != j {
                    coupling += interaction[(i, j)] * x[j];
                }
            }
            out[i] = rates[i] * x[i] * logistic_factor(x[i], capacities[i]) + x[i] * coupling;
        }
    }
}
