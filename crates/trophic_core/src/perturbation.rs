//! Folding environmental events into the parameter set active at a time.
//!
//! Events are applied as a left fold in list order, not start-time order.
//! Each event adjusts the rates produced by the events before it rather than
//! the base rates.

use crate::params::{AffectedSpecies, EnvironmentalEvent, EventKind, ParameterSet};

/// Applies one event at `scale = intensity / 100` to an already-composed set.
type Transform = fn(&ParameterSet, f64, AffectedSpecies) -> ParameterSet;

fn transform_for(kind: EventKind) -> Transform {
    match kind {
        EventKind::TemperatureIncrease => temperature_increase,
        EventKind::HabitatLoss => habitat_loss,
        EventKind::ResourceDepletion => resource_depletion,
        EventKind::Disease => disease,
    }
}

/// Returns the effective parameters at time `t`.
///
/// Pure: neither `base` nor `events` is modified.
pub fn compose(base: &ParameterSet, t: f64, events: &[EnvironmentalEvent]) -> ParameterSet {
    events
        .iter()
        .filter(|event| event.is_active(t))
        .fold(*base, |current, event| {
            apply_event(&current, event.kind, event.effective_intensity(t), event.affected)
        })
}

/// Applies a single event at a fixed effective intensity (percent).
pub fn apply_event(
    params: &ParameterSet,
    kind: EventKind,
    intensity: f64,
    affected: AffectedSpecies,
) -> ParameterSet {
    transform_for(kind)(params, intensity / 100.0, affected)
}

fn temperature_increase(base: &ParameterSet, scale: f64, affected: AffectedSpecies) -> ParameterSet {
    let mut next = *base;
    if affected.includes_prey() {
        next.prey_growth = base.prey_growth * (1.0 - scale * 0.3);
        next.predation_loss = base.predation_loss * (1.0 + scale * 0.2);
    }
    if affected.includes_predator() {
        next.predator_death = base.predator_death * (1.0 + scale * 0.4);
        next.predator_growth = base.predator_growth * (1.0 - scale * 0.1);
    }
    next
}

fn habitat_loss(base: &ParameterSet, scale: f64, affected: AffectedSpecies) -> ParameterSet {
    let mut next = *base;
    if affected.includes_prey() {
        next.prey_growth = base.prey_growth * (1.0 - scale * 0.5);
        next.predation_loss = base.predation_loss * (1.0 + scale * 0.3);
    }
    if affected.includes_predator() {
        next.predator_death = base.predator_death * (1.0 + scale * 0.2);
        // Hunting improves while loss is mild, then declines past half intensity.
        next.predator_growth = if scale < 0.5 {
            base.predator_growth * (1.0 + scale * 0.2)
        } else {
            base.predator_growth * (1.0 - (scale - 0.5) * 0.4)
        };
    }
    next
}

fn resource_depletion(base: &ParameterSet, scale: f64, affected: AffectedSpecies) -> ParameterSet {
    let mut next = *base;
    if affected.includes_prey() {
        next.prey_growth = base.prey_growth * (1.0 - scale * 0.7);
    }
    if affected.includes_predator() {
        next.predator_growth = base.predator_growth * (1.0 - scale * 0.3);
    }
    next
}

// Disease on both species is milder per species than on either alone.
fn disease(base: &ParameterSet, scale: f64, affected: AffectedSpecies) -> ParameterSet {
    let mut next = *base;
    let mortality = base.direct_mortality.unwrap_or(0.0);
    match affected {
        AffectedSpecies::Prey => {
            next.prey_growth = base.prey_growth * (1.0 - scale * 0.4);
            next.direct_mortality = Some(mortality + scale * 0.05);
        }
        AffectedSpecies::Predator => {
            next.predator_death = base.predator_death * (1.0 + scale * 0.6);
        }
        AffectedSpecies::Both => {
            next.prey_growth = base.prey_growth * (1.0 - scale * 0.3);
            next.predator_death = base.predator_death * (1.0 + scale * 0.4);
            next.direct_mortality = Some(mortality + scale * 0.03);
        }
    }
    next
}
