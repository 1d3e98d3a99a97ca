//! Built-in scenarios: named two-species ecosystems and example food webs.

use crate::ecosystem::SpeciesEcosystem;
use crate::error::Result;
use crate::params::{AffectedSpecies, EnvironmentalEvent, EventKind, ParameterSet};
use crate::simulation::{FoodWebRequest, PredatorPreyRequest};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Ramp length used by the scenario library for its single event.
pub const EVENT_RAMP: f64 = 10.0;

/// Seed for the Disease target of the built-in epidemic scenario.
pub const SCENARIO_SEED: u64 = 42;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub request: PredatorPreyRequest,
}

struct Row {
    name: &'static str,
    description: &'static str,
    rates: [f64; 4],
    initial: [f64; 2],
    time_span: f64,
    event: Option<(EventKind, f64, f64)>,
}

const SCENARIOS: [Row; 10] = [
    Row {
        name: "Desert Ecosystem",
        description: "A desert ecosystem with limited resources. Features lower reproduction rates and higher mortality.",
        rates: [0.6, 0.2, 0.4, 0.08],
        initial: [70.0, 30.0],
        time_span: 150.0,
        event: None,
    },
    Row {
        name: "Forest Ecosystem",
        description: "A forest ecosystem with abundant resources. Features higher reproduction rates and generally stable populations.",
        rates: [1.2, 0.15, 0.3, 0.12],
        initial: [120.0, 40.0],
        time_span: 150.0,
        event: None,
    },
    Row {
        name: "Marine Ecosystem",
        description: "A marine ecosystem with high biodiversity. Features high prey reproduction but specialized predators.",
        rates: [1.5, 0.1, 0.25, 0.08],
        initial: [200.0, 30.0],
        time_span: 150.0,
        event: None,
    },
    Row {
        name: "Unstable Ecosystem",
        description: "An ecosystem on the brink. Features extreme parameter values that lead to oscillatory behavior or population crashes.",
        rates: [1.8, 0.3, 0.2, 0.2],
        initial: [50.0, 40.0],
        time_span: 150.0,
        event: None,
    },
    Row {
        name: "Arctic Ecosystem",
        description: "A cold environment with slow growth rates but strong resilience.",
        rates: [0.5, 0.05, 0.3, 0.1],
        initial: [150.0, 20.0],
        time_span: 150.0,
        event: None,
    },
    Row {
        name: "Island Ecosystem",
        description: "An isolated ecosystem with specialized species and limited resources.",
        rates: [1.0, 0.2, 0.35, 0.15],
        initial: [80.0, 15.0],
        time_span: 150.0,
        event: None,
    },
    Row {
        name: "Grassland Ecosystem",
        description: "An open ecosystem with abundant primary producers and visible predator-prey dynamics.",
        rates: [1.3, 0.12, 0.28, 0.09],
        initial: [180.0, 35.0],
        time_span: 150.0,
        event: None,
    },
    Row {
        name: "Climate Change Scenario",
        description: "A simulation of climate change impacts on a standard ecosystem.",
        rates: [1.1, 0.1, 0.3, 0.1],
        initial: [100.0, 50.0],
        time_span: 200.0,
        event: Some((EventKind::TemperatureIncrease, 50.0, 60.0)),
    },
    Row {
        name: "Habitat Loss Scenario",
        description: "A simulation of progressive habitat destruction on ecosystem dynamics.",
        rates: [1.1, 0.1, 0.3, 0.1],
        initial: [100.0, 50.0],
        time_span: 200.0,
        event: Some((EventKind::HabitatLoss, 50.0, 70.0)),
    },
    Row {
        name: "Epidemic Scenario",
        description: "A simulation of disease outbreak affecting one or both species.",
        rates: [1.1, 0.1, 0.3, 0.1],
        initial: [100.0, 50.0],
        time_span: 200.0,
        event: Some((EventKind::Disease, 50.0, 80.0)),
    },
];

impl Row {
    fn build(&self) -> Preset {
        let [alpha, beta, gamma, delta] = self.rates;
        let events = self
            .event
            .map(|(kind, start, intensity)| {
                vec![single_event(kind, start, intensity, SCENARIO_SEED)]
            })
            .unwrap_or_default();
        Preset {
            name: self.name,
            description: self.description,
            request: PredatorPreyRequest {
                parameters: ParameterSet::new(alpha, beta, gamma, delta),
                initial_state: self.initial,
                time_span: self.time_span,
                events,
                settings: Default::default(),
            },
        }
    }
}

pub fn preset_names() -> Vec<&'static str> {
    SCENARIOS.iter().map(|row| row.name).collect()
}

pub fn presets() -> Vec<Preset> {
    SCENARIOS.iter().map(Row::build).collect()
}

pub fn preset(name: &str) -> Option<Preset> {
    SCENARIOS.iter().find(|row| row.name == name).map(Row::build)
}

/// The scenario used when nothing else has been chosen.
pub fn default_request() -> PredatorPreyRequest {
    PredatorPreyRequest {
        parameters: ParameterSet::default(),
        initial_state: [100.0, 50.0],
        time_span: 100.0,
        events: Vec::new(),
        settings: Default::default(),
    }
}

/// A single ramped event as the scenario library builds it.
///
/// Disease picks its target from a generator seeded with `seed`, so a given
/// seed always yields the same outbreak. Every other kind affects both species.
pub fn single_event(kind: EventKind, start_time: f64, intensity: f64, seed: u64) -> EnvironmentalEvent {
    let affected = match kind {
        EventKind::Disease => AffectedSpecies::random(&mut StdRng::seed_from_u64(seed)),
        _ => AffectedSpecies::Both,
    };
    EnvironmentalEvent::new(kind, start_time, intensity, EVENT_RAMP, affected)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FoodWebKind {
    Forest,
    Marine,
    Generic,
}

/// An example food web with 3 to 5 species (other counts are clamped).
pub fn food_web(kind: FoodWebKind, species: usize, time_span: f64) -> Result<FoodWebRequest> {
    let n = species.clamp(3, 5);
    let mut matrix = vec![vec![0.0; n]; n];

    let (names, growth_rates, initial, capacities): (Vec<String>, Vec<f64>, Vec<f64>, Vec<f64>) =
        match kind {
            FoodWebKind::Forest => {
                matrix[0][1] = -0.01;
                matrix[1][0] = 0.02;
                matrix[1][2] = -0.02;
                matrix[2][1] = 0.01;
                if n >= 4 {
                    matrix[0][3] = -0.005;
                    matrix[3][0] = 0.01;
                    matrix[1][3] = -0.01;
                    matrix[3][1] = -0.01;
                }
                if n >= 5 {
                    for j in 0..4 {
                        matrix[4][j] = 0.005;
                    }
                }
                (
                    take(&["Plants", "Herbivores", "Carnivores", "Omnivores", "Decomposers"], n),
                    vec![0.5, -0.2, -0.3, -0.25, 0.1][..n].to_vec(),
                    vec![500.0, 100.0, 30.0, 50.0, 200.0][..n].to_vec(),
                    vec![1000.0, 300.0, 100.0, 150.0, 500.0][..n].to_vec(),
                )
            }
            FoodWebKind::Marine => {
                let links = [(0, 1, -0.01, 0.02), (1, 2, -0.02, 0.01), (2, 3, -0.03, 0.02), (3, 4, -0.04, 0.02)];
                for &(prey, predator, loss, gain) in links.iter().take(n - 1) {
                    matrix[prey][predator] = loss;
                    matrix[predator][prey] = gain;
                }
                (
                    take(&["Phytoplankton", "Zooplankton", "Small Fish", "Large Fish", "Sharks"], n),
                    vec![0.8, -0.1, -0.2, -0.3, -0.4][..n].to_vec(),
                    vec![800.0, 200.0, 100.0, 50.0, 20.0][..n].to_vec(),
                    vec![2000.0, 500.0, 300.0, 150.0, 60.0][..n].to_vec(),
                )
            }
            FoodWebKind::Generic => {
                for i in 0..n - 1 {
                    matrix[i][i + 1] = -0.02;
                    matrix[i + 1][i] = 0.01;
                }
                let mut rates = vec![-0.2; n];
                rates[0] = 0.5;
                (
                    (1..=n).map(|i| format!("Species {i}")).collect(),
                    rates,
                    (0..n).map(|i| 100.0 * (n - i) as f64).collect(),
                    (0..n).map(|i| 200.0 * (n - i) as f64).collect(),
                )
            }
        };

    let ecosystem = SpeciesEcosystem::new(
        names,
        growth_rates,
        &matrix,
        Some(capacities.into_iter().map(Some).collect()),
    )?;
    Ok(FoodWebRequest::from_ecosystem(
        &ecosystem,
        initial,
        time_span,
    ))
}

fn take(names: &[&str], n: usize) -> Vec<String> {
    names[..n].iter().map(|s| s.to_string()).collect()
}
