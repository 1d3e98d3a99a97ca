use crate::error::{config_bail, Result};
use nalgebra::DMatrix;

/// A validated community of `S` interacting species.
///
/// `interaction[(i, j)]` is the per-capita effect of species `j` on the growth
/// of species `i`: negative when `i` is eaten by or competes with `j`,
/// positive when `i` benefits from `j`. The diagonal is ignored; self-limitation
/// comes from the carrying capacity instead.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesEcosystem {
    names: Vec<String>,
    growth_rates: Vec<f64>,
    interaction: DMatrix<f64>,
    carrying_capacities: Vec<Option<f64>>,
}

impl SpeciesEcosystem {
    /// Validates shapes and builds the ecosystem.
    ///
    /// `carrying_capacities` of `None` leaves every species unconstrained.
    pub fn new(
        names: Vec<String>,
        growth_rates: Vec<f64>,
        interaction_matrix: &[Vec<f64>],
        carrying_capacities: Option<Vec<Option<f64>>>,
    ) -> Result<Self> {
        let species = names.len();
        if species == 0 {
            config_bail!("Ecosystem must contain at least one species.");
        }
        if growth_rates.len() != species {
            config_bail!(
                "Growth rates list must match number of species. Expected {}, got {}.",
                species,
                growth_rates.len()
            );
        }
        if interaction_matrix.len() != species
            || interaction_matrix.iter().any(|row| row.len() != species)
        {
            config_bail!(
                "Interaction matrix must be square with dimensions matching number of species ({}).",
                species
            );
        }
        let carrying_capacities = match carrying_capacities {
            Some(capacities) => {
                if capacities.len() != species {
                    config_bail!(
                        "Carrying capacities list must match number of species. Expected {}, got {}.",
                        species,
                        capacities.len()
                    );
                }
                capacities
            }
            None => vec![None; species],
        };

        let interaction = DMatrix::from_fn(species, species, |i, j| interaction_matrix[i][j]);

        Ok(Self {
            names,
            growth_rates,
            interaction,
            carrying_capacities,
        })
    }

    pub fn species_count(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn growth_rates(&self) -> &[f64] {
        &self.growth_rates
    }

    pub fn interaction(&self) -> &DMatrix<f64> {
        &self.interaction
    }

    pub fn carrying_capacities(&self) -> &[Option<f64>] {
        &self.carrying_capacities
    }

    /// Checks that an initial state has one entry per species.
    pub fn check_initial_state(&self, initial: &[f64]) -> Result<()> {
        if initial.len() != self.species_count() {
            config_bail!(
                "Initial populations list must match number of species. Expected {}, got {}.",
                self.species_count(),
                initial.len()
            );
        }
        Ok(())
    }

    /// Interaction matrix as nested rows, for serialization.
    pub fn interaction_rows(&self) -> Vec<Vec<f64>> {
        (0..self.species_count())
            .map(|i| self.interaction.row(i).iter().copied().collect())
            .collect()
    }
}
