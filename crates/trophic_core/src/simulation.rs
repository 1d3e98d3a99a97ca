//! Run requests and the compose -> evaluate -> integrate -> analyze pipeline.
//!
//! A request is built once by the caller and consumed by value. Each run owns
//! its buffers, so independent runs may execute on separate threads.

use crate::ecosystem::SpeciesEcosystem;
use crate::error::Result;
use crate::integrate::{integrate_with_cancel, IntegratorSettings, SimulationResult};
use crate::metrics::{CommunityMetrics, EcosystemMetrics, Outlook};
use crate::params::{EnvironmentalEvent, EventRecord, ParameterSet};
use crate::systems::{FoodWeb, PredatorPrey};
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredatorPreyRequest {
    pub parameters: ParameterSet,
    /// `[prey, predator]`
    pub initial_state: [f64; 2],
    pub time_span: f64,
    #[serde(default)]
    pub events: Vec<EnvironmentalEvent>,
    #[serde(default)]
    pub settings: IntegratorSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredatorPreyOutput {
    pub result: SimulationResult,
    pub events: Vec<EventRecord>,
    pub metrics: EcosystemMetrics,
    /// Absent when a starting population is zero.
    pub outlook: Option<Outlook>,
}

impl PredatorPreyRequest {
    pub fn run(self) -> Result<PredatorPreyOutput> {
        self.run_with_cancel(&AtomicBool::new(false))
    }

    pub fn run_with_cancel(self, cancel: &AtomicBool) -> Result<PredatorPreyOutput> {
        let records = self.events.iter().map(EventRecord::from).collect();
        let system = PredatorPrey::new(self.parameters, self.events);
        let result = integrate_with_cancel(
            &system,
            &self.initial_state,
            self.time_span,
            &self.settings,
            cancel,
        )?;
        let metrics = EcosystemMetrics::from_result(&result)?;
        let outlook = Outlook::from_result(&result)?;
        log::debug!(
            "Predator-prey run finished: {} prey peaks, {} predator peaks, stability {}.",
            metrics.prey_peaks_count,
            metrics.predator_peaks_count,
            metrics.ecosystem_stability
        );
        Ok(PredatorPreyOutput {
            result,
            events: records,
            metrics,
            outlook,
        })
    }
}

/// An N-species run. Shapes are checked when the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodWebRequest {
    pub names: Vec<String>,
    pub growth_rates: Vec<f64>,
    pub interaction_matrix: Vec<Vec<f64>>,
    /// `None` leaves every species unconstrained; a `None` entry does so for one species.
    #[serde(default)]
    pub carrying_capacities: Option<Vec<Option<f64>>>,
    pub initial_populations: Vec<f64>,
    pub time_span: f64,
    #[serde(default)]
    pub settings: IntegratorSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct FoodWebOutput {
    pub names: Vec<String>,
    pub result: SimulationResult,
    pub metrics: CommunityMetrics,
}

impl FoodWebRequest {
    pub fn from_ecosystem(
        ecosystem: &SpeciesEcosystem,
        initial_populations: Vec<f64>,
        time_span: f64,
    ) -> Self {
        Self {
            names: ecosystem.names().to_vec(),
            growth_rates: ecosystem.growth_rates().to_vec(),
            interaction_matrix: ecosystem.interaction_rows(),
            carrying_capacities: Some(ecosystem.carrying_capacities().to_vec()),
            initial_populations,
            time_span,
            settings: IntegratorSettings::default(),
        }
    }

    pub fn ecosystem(&self) -> Result<SpeciesEcosystem> {
        let ecosystem = SpeciesEcosystem::new(
            self.names.clone(),
            self.growth_rates.clone(),
            &self.interaction_matrix,
            self.carrying_capacities.clone(),
        )?;
        ecosystem.check_initial_state(&self.initial_populations)?;
        Ok(ecosystem)
    }

    pub fn run(self) -> Result<FoodWebOutput> {
        self.run_with_cancel(&AtomicBool::new(false))
    }

    pub fn run_with_cancel(self, cancel: &AtomicBool) -> Result<FoodWebOutput> {
        let ecosystem = self.ecosystem()?;
        let system = FoodWeb::new(ecosystem);
        let result = integrate_with_cancel(
            &system,
            &self.initial_populations,
            self.time_span,
            &self.settings,
            cancel,
        )?;
        let metrics = CommunityMetrics::from_result(&result)?;
        Ok(FoodWebOutput {
            names: self.names,
            result,
            metrics,
        })
    }
}
