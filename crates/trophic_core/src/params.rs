//! Two-species rate parameters and environmental events.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rates of the classic predator-prey system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Prey reproduction rate (alpha).
    pub prey_growth: f64,
    /// Prey loss per predator encounter (beta).
    pub predation_loss: f64,
    /// Predator death rate (gamma).
    pub predator_death: f64,
    /// Predator growth per prey encounter (delta).
    pub predator_growth: f64,
    /// Extra per-capita mortality on both species, contributed by disease.
    #[serde(default)]
    pub direct_mortality: Option<f64>,
    /// Logistic ceiling on prey growth; `None` is unconstrained.
    #[serde(default)]
    pub prey_capacity: Option<f64>,
}

impl ParameterSet {
    pub fn new(
        prey_growth: f64,
        predation_loss: f64,
        predator_death: f64,
        predator_growth: f64,
    ) -> Self {
        Self {
            prey_growth,
            predation_loss,
            predator_death,
            predator_growth,
            direct_mortality: None,
            prey_capacity: None,
        }
    }

    pub fn with_prey_capacity(mut self, capacity: f64) -> Self {
        self.prey_capacity = Some(capacity);
        self
    }

    /// Returns true when every rate agrees with `other` to within `tolerance`.
    pub fn approx_eq(&self, other: &ParameterSet, tolerance: f64) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= tolerance;
        close(self.prey_growth, other.prey_growth)
            && close(self.predation_loss, other.predation_loss)
            && close(self.predator_death, other.predator_death)
            && close(self.predator_growth, other.predator_growth)
            && close(
                self.direct_mortality.unwrap_or(0.0),
                other.direct_mortality.unwrap_or(0.0),
            )
            && self.prey_capacity == other.prey_capacity
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::new(1.0, 0.1, 0.3, 0.1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    TemperatureIncrease,
    HabitatLoss,
    ResourceDepletion,
    Disease,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::TemperatureIncrease,
        EventKind::HabitatLoss,
        EventKind::ResourceDepletion,
        EventKind::Disease,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EventKind::TemperatureIncrease => "Temperature Increase",
            EventKind::HabitatLoss => "Habitat Loss",
            EventKind::ResourceDepletion => "Resource Depletion",
            EventKind::Disease => "Disease",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AffectedSpecies {
    Prey,
    Predator,
    Both,
}

impl AffectedSpecies {
    pub fn includes_prey(self) -> bool {
        matches!(self, AffectedSpecies::Prey | AffectedSpecies::Both)
    }

    pub fn includes_predator(self) -> bool {
        matches!(self, AffectedSpecies::Predator | AffectedSpecies::Both)
    }

    /// Draws a target uniformly from the three choices.
    ///
    /// The source is injected so that a fixed seed always reproduces the
    /// same disease outbreak.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        match rng.gen_range(0..3) {
            0 => AffectedSpecies::Prey,
            1 => AffectedSpecies::Predator,
            _ => AffectedSpecies::Both,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AffectedSpecies::Prey => "prey",
            AffectedSpecies::Predator => "predator",
            AffectedSpecies::Both => "both",
        }
    }
}

/// A perturbation of the environment that ramps in from `start_time`.
///
/// `intensity` is a percentage in [-100, 100]; negative values ameliorate.
/// A `duration` of zero applies the full intensity as a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalEvent {
    pub kind: EventKind,
    pub start_time: f64,
    pub intensity: f64,
    #[serde(default)]
    pub duration: f64,
    pub affected: AffectedSpecies,
}

impl EnvironmentalEvent {
    pub fn new(
        kind: EventKind,
        start_time: f64,
        intensity: f64,
        duration: f64,
        affected: AffectedSpecies,
    ) -> Self {
        Self {
            kind,
            start_time,
            intensity,
            duration,
            affected,
        }
    }

    pub fn is_active(&self, t: f64) -> bool {
        t >= self.start_time
    }

    /// Fraction of the ramp completed at time `t`, in [0, 1].
    pub fn progress(&self, t: f64) -> f64 {
        if self.duration > 0.0 {
            ((t - self.start_time) / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Intensity in effect at time `t`; zero before the event starts.
    pub fn effective_intensity(&self, t: f64) -> f64 {
        if self.is_active(t) {
            self.intensity * self.progress(t)
        } else {
            0.0
        }
    }
}

/// Event metadata echoed back to the visualization layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub time: f64,
    pub description: String,
    pub kind: EventKind,
    pub intensity: f64,
    pub duration: f64,
    pub affected: AffectedSpecies,
}

impl From<&EnvironmentalEvent> for EventRecord {
    fn from(event: &EnvironmentalEvent) -> Self {
        Self {
            time: event.start_time,
            description: format!("{} begins", event.kind),
            kind: event.kind,
            intensity: event.intensity,
            duration: event.duration,
            affected: event.affected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn progress_ramps_linearly_then_saturates() {
        let event = EnvironmentalEvent::new(
            EventKind::HabitatLoss,
            10.0,
            80.0,
            4.0,
            AffectedSpecies::Both,
        );
        assert_eq!(event.effective_intensity(9.99), 0.0);
        assert_eq!(event.effective_intensity(10.0), 0.0);
        assert!((event.effective_intensity(11.0) - 20.0).abs() < 1e-12);
        assert!((event.effective_intensity(13.0) - 60.0).abs() < 1e-12);
        assert_eq!(event.effective_intensity(14.0), 80.0);
        assert_eq!(event.effective_intensity(500.0), 80.0);

        let mut previous = 0.0;
        for step in 0..=40 {
            let value = event.effective_intensity(10.0 + step as f64 * 0.1);
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn zero_duration_is_a_step() {
        let event =
            EnvironmentalEvent::new(EventKind::Disease, 5.0, -40.0, 0.0, AffectedSpecies::Prey);
        assert_eq!(event.effective_intensity(4.0), 0.0);
        assert_eq!(event.effective_intensity(5.0), -40.0);
    }

    #[test]
    fn affected_species_membership() {
        assert!(AffectedSpecies::Both.includes_prey());
        assert!(AffectedSpecies::Both.includes_predator());
        assert!(AffectedSpecies::Prey.includes_prey());
        assert!(!AffectedSpecies::Prey.includes_predator());
        assert!(!AffectedSpecies::Predator.includes_prey());
    }

    #[test]
    fn seeded_random_target_is_reproducible() {
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..16)
                .map(|_| AffectedSpecies::random(&mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(7), draw(7));
        let all = draw(11);
        assert!(all.iter().all(|a| matches!(
            a,
            AffectedSpecies::Prey | AffectedSpecies::Predator | AffectedSpecies::Both
        )));
    }

    #[test]
    fn event_record_describes_start() {
        let event = EnvironmentalEvent::new(
            EventKind::TemperatureIncrease,
            50.0,
            60.0,
            10.0,
            AffectedSpecies::Both,
        );
        let record = EventRecord::from(&event);
        assert_eq!(record.description, "Temperature Increase begins");
        assert_eq!(record.time, 50.0);
        assert_eq!(record.affected, AffectedSpecies::Both);
    }

    #[test]
    fn parameter_set_deserializes_with_optional_fields_absent() {
        let params: ParameterSet = serde_json::from_str(
            r#"{"prey_growth":1.0,"predation_loss":0.1,"predator_death":0.3,"predator_growth":0.1}"#,
        )
        .expect("parameters should parse");
        assert_eq!(params, ParameterSet::default());
    }
}
