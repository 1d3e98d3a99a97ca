//! CSV rendering of finished trajectories.

use anyhow::{bail, Context, Result};
use csv::{Terminator, WriterBuilder};
use trophic_core::integrate::SimulationResult;

/// Renders a two-species run with the `Time,Prey,Predator` header.
pub fn predator_prey_csv(result: &SimulationResult) -> Result<String> {
    if result.species_count() != 2 {
        bail!(
            "Predator-prey export expects 2 species, got {}.",
            result.species_count()
        );
    }
    render(&["Prey", "Predator"], result)
}

/// Renders an N-species run with the species names as column headers.
pub fn food_web_csv<S: AsRef<str>>(names: &[S], result: &SimulationResult) -> Result<String> {
    if names.len() != result.species_count() {
        bail!(
            "Expected {} species names, got {}.",
            result.species_count(),
            names.len()
        );
    }
    let headers: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
    render(&headers, result)
}

fn render(headers: &[&str], result: &SimulationResult) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(std::iter::once("Time").chain(headers.iter().copied()))?;

    for (t, row) in result.times().iter().zip(result.populations()) {
        writer.write_record(
            std::iter::once(t.to_string()).chain(row.iter().map(f64::to_string)),
        )?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}
