//! Descriptive and oscillation statistics of a finished trajectory.
//!
//! Everything here is a deterministic function of the sampled populations.
//! Periods and phase lags are measured in sample-grid indices; they equal
//! time units only on a uniform grid, which is what the integrator produces.

use crate::error::{Result, SimulationError};
use crate::integrate::SimulationResult;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesMetrics {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub final_value: f64,
    /// Coefficient of variation; zero when the mean is not positive.
    pub cv: f64,
    pub peak_indices: Vec<usize>,
    pub peak_count: usize,
    /// Mean gap between consecutive peaks in samples; zero with fewer than two peaks.
    pub period: f64,
}

impl SpeciesMetrics {
    /// Statistics of one non-empty series.
    pub fn from_series(series: &[f64]) -> Result<Self> {
        let Some(&final_value) = series.last() else {
            return Err(SimulationError::Precondition(
                "Cannot compute statistics of an empty series.".into(),
            ));
        };
        let n = series.len() as f64;
        let mean = series.iter().sum::<f64>() / n;
        let variance = series.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;
        let std = variance.sqrt();
        let min = series.iter().copied().fold(f64::INFINITY, f64::min);
        let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let peak_indices = find_peaks(series);

        Ok(Self {
            mean,
            std,
            min,
            max,
            final_value,
            cv: coefficient_of_variation(mean, std),
            peak_count: peak_indices.len(),
            period: mean_peak_gap(&peak_indices),
            peak_indices,
        })
    }
}

pub fn coefficient_of_variation(mean: f64, std: f64) -> f64 {
    if mean > 0.0 {
        std / mean
    } else {
        0.0
    }
}

/// `1 / sum(cv)`. Unbounded (infinite) when every series is flat; capping for
/// display is left to the caller.
pub fn stability_score(cvs: &[f64]) -> f64 {
    1.0 / cvs.iter().sum::<f64>()
}

/// Strict interior local maxima: `x[i-1] < x[i] > x[i+1]`.
pub fn find_peaks(series: &[f64]) -> Vec<usize> {
    if series.len() < 3 {
        return Vec::new();
    }
    (1..series.len() - 1)
        .filter(|&i| series[i] > series[i - 1] && series[i] > series[i + 1])
        .collect()
}

pub fn mean_peak_gap(peaks: &[usize]) -> f64 {
    if peaks.len() < 2 {
        return 0.0;
    }
    let total: usize = peaks.windows(2).map(|w| w[1] - w[0]).sum();
    total as f64 / (peaks.len() - 1) as f64
}

/// Mean elapsed time between consecutive peaks, read off `times`.
///
/// Use this instead of [`mean_peak_gap`] when the grid is not uniform.
pub fn mean_peak_interval(peaks: &[usize], times: &[f64]) -> f64 {
    if peaks.len() < 2 {
        return 0.0;
    }
    let total: f64 = peaks.windows(2).map(|w| times[w[1]] - times[w[0]]).sum();
    total / (peaks.len() - 1) as f64
}

/// Samples from the first leading peak to the first lagging peak strictly after it.
pub fn phase_difference(leading: &[usize], lagging: &[usize]) -> usize {
    let Some(&first) = leading.first() else {
        return 0;
    };
    lagging
        .iter()
        .find(|&&idx| idx > first)
        .map_or(0, |&idx| idx - first)
}

fn check_trajectory(result: &SimulationResult, min_species: usize) -> Result<()> {
    if result.len() < 2 {
        return Err(SimulationError::Precondition(format!(
            "Metrics need at least two samples, got {}.",
            result.len()
        )));
    }
    if result.species_count() < min_species {
        return Err(SimulationError::Precondition(format!(
            "Metrics need at least {} species, got {}.",
            min_species,
            result.species_count()
        )));
    }
    Ok(())
}

/// Per-species statistics for a community of any size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityMetrics {
    pub species: Vec<SpeciesMetrics>,
    pub stability: f64,
}

impl CommunityMetrics {
    pub fn from_result(result: &SimulationResult) -> Result<Self> {
        check_trajectory(result, 1)?;
        let species = (0..result.species_count())
            .map(|idx| SpeciesMetrics::from_series(&result.series(idx)))
            .collect::<Result<Vec<_>>>()?;
        let cvs: Vec<f64> = species.iter().map(|s| s.cv).collect();
        Ok(Self {
            stability: stability_score(&cvs),
            species,
        })
    }
}

/// The two-species metrics record. Column 0 is prey, column 1 is predator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EcosystemMetrics {
    pub prey_mean: f64,
    pub prey_std: f64,
    pub prey_min: f64,
    pub prey_max: f64,
    pub prey_cv: f64,
    pub predator_mean: f64,
    pub predator_std: f64,
    pub predator_min: f64,
    pub predator_max: f64,
    pub predator_cv: f64,
    pub ecosystem_stability: f64,
    pub final_prey: f64,
    pub final_predator: f64,
    pub prey_period: f64,
    pub predator_period: f64,
    pub phase_difference: usize,
    pub prey_peaks_count: usize,
    pub predator_peaks_count: usize,
}

impl EcosystemMetrics {
    pub fn from_result(result: &SimulationResult) -> Result<Self> {
        check_trajectory(result, 2)?;
        let prey = SpeciesMetrics::from_series(&result.series(0))?;
        let predator = SpeciesMetrics::from_series(&result.series(1))?;

        Ok(Self {
            prey_mean: prey.mean,
            prey_std: prey.std,
            prey_min: prey.min,
            prey_max: prey.max,
            prey_cv: prey.cv,
            predator_mean: predator.mean,
            predator_std: predator.std,
            predator_min: predator.min,
            predator_max: predator.max,
            predator_cv: predator.cv,
            ecosystem_stability: stability_score(&[prey.cv, predator.cv]),
            final_prey: prey.final_value,
            final_predator: predator.final_value,
            prey_period: prey.period,
            predator_period: predator.period,
            phase_difference: phase_difference(&prey.peak_indices, &predator.peak_indices),
            prey_peaks_count: prey.peak_count,
            predator_peaks_count: predator.peak_count,
        })
    }
}

/// Coarse reading of how a two-species run ended relative to how it began.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outlook {
    /// Both populations within 10% of their starting values.
    Stable,
    /// Prey up more than 50% while predators fell more than 30%.
    PreyBoom,
    /// Prey down more than 50% while predators grew.
    PreyCollapse,
    /// Both populations down more than 30%.
    Endangered,
    Cyclic,
}

impl Outlook {
    /// `None` when a starting population is zero, since relative change is then undefined.
    pub fn from_result(result: &SimulationResult) -> Result<Option<Self>> {
        check_trajectory(result, 2)?;
        let first = &result.populations()[0];
        let last = &result.populations()[result.len() - 1];
        if first[0] == 0.0 || first[1] == 0.0 {
            return Ok(None);
        }
        let prey_change = (last[0] - first[0]) / first[0] * 100.0;
        let predator_change = (last[1] - first[1]) / first[1] * 100.0;
        Ok(Some(Self::classify(prey_change, predator_change)))
    }

    /// Classifies percentage changes; the first matching rule wins.
    pub fn classify(prey_change: f64, predator_change: f64) -> Self {
        if prey_change.abs() < 10.0 && predator_change.abs() < 10.0 {
            Outlook::Stable
        } else if prey_change > 50.0 && predator_change < -30.0 {
            Outlook::PreyBoom
        } else if prey_change < -50.0 && predator_change > 0.0 {
            Outlook::PreyCollapse
        } else if prey_change < -30.0 && predator_change < -30.0 {
            Outlook::Endangered
        } else {
            Outlook::Cyclic
        }
    }
}
