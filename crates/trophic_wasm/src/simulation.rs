//! Simulation runner exposed to the browser.

use crate::export::{food_web_csv, predator_prey_csv};
use anyhow::{anyhow, Context, Result};
use js_sys::Float64Array;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use trophic_core::integrate::SimulationResult;
use trophic_core::simulation::{
    FoodWebOutput, FoodWebRequest, PredatorPreyOutput, PredatorPreyRequest,
};
use wasm_bindgen::prelude::*;

#[derive(Debug)]
pub(crate) enum RequestKind {
    PredatorPrey(PredatorPreyRequest),
    FoodWeb(FoodWebRequest),
}

#[derive(Debug)]
pub(crate) enum OutputKind {
    PredatorPrey(PredatorPreyOutput),
    FoodWeb(FoodWebOutput),
}

impl OutputKind {
    fn result(&self) -> &SimulationResult {
        match self {
            OutputKind::PredatorPrey(output) => &output.result,
            OutputKind::FoodWeb(output) => &output.result,
        }
    }

    fn csv(&self) -> Result<String> {
        match self {
            OutputKind::PredatorPrey(output) => predator_prey_csv(&output.result),
            OutputKind::FoodWeb(output) => food_web_csv(&output.names, &output.result),
        }
    }
}

/// Runs a request to completion. The request is left untouched so it can be rerun.
pub(crate) fn execute(request: &RequestKind) -> Result<OutputKind> {
    match request {
        RequestKind::PredatorPrey(request) => request
            .clone()
            .run()
            .map(OutputKind::PredatorPrey)
            .context("Predator-prey simulation failed"),
        RequestKind::FoodWeb(request) => request
            .clone()
            .run()
            .map(OutputKind::FoodWeb)
            .context("Food web simulation failed"),
    }
}

#[wasm_bindgen]
pub struct WasmSimulation {
    request: RequestKind,
    output: Option<OutputKind>,
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", err))
}

impl WasmSimulation {
    pub(crate) fn from_request(request: RequestKind) -> Self {
        Self {
            request,
            output: None,
        }
    }

    pub(crate) fn run_native(&mut self) -> Result<&OutputKind> {
        self.output = None;
        let output = execute(&self.request)?;
        Ok(self.output.insert(output))
    }

    fn finished(&self) -> Result<&OutputKind> {
        self.output
            .as_ref()
            .ok_or_else(|| anyhow!("Simulation has not been run"))
    }

    pub(crate) fn csv_native(&self) -> Result<String> {
        self.finished()?.csv()
    }

    pub(crate) fn series_native(&self, species: usize) -> Result<Vec<f64>> {
        let result = self.finished()?.result();
        if species >= result.species_count() {
            anyhow::bail!(
                "Species index {} out of range for {} species.",
                species,
                result.species_count()
            );
        }
        Ok(result.series(species))
    }
}

#[wasm_bindgen]
impl WasmSimulation {
    /// Accepts a serialized `PredatorPreyRequest`.
    #[wasm_bindgen(constructor)]
    pub fn new(request: JsValue) -> Result<WasmSimulation, JsValue> {
        console_error_panic_hook::set_once();
        let request: PredatorPreyRequest = from_value(request)
            .map_err(|e| JsValue::from_str(&format!("Invalid predator-prey request: {}", e)))?;
        Ok(Self::from_request(RequestKind::PredatorPrey(request)))
    }

    /// Accepts a serialized `FoodWebRequest`.
    pub fn food_web(request: JsValue) -> Result<WasmSimulation, JsValue> {
        console_error_panic_hook::set_once();
        let request: FoodWebRequest = from_value(request)
            .map_err(|e| JsValue::from_str(&format!("Invalid food web request: {}", e)))?;
        Ok(Self::from_request(RequestKind::FoodWeb(request)))
    }

    pub fn is_done(&self) -> bool {
        self.output.is_some()
    }

    /// Runs the request and returns the full output record.
    pub fn run(&mut self) -> Result<JsValue, JsValue> {
        match self.run_native().map_err(to_js_error)? {
            OutputKind::PredatorPrey(output) => to_js(output),
            OutputKind::FoodWeb(output) => to_js(output),
        }
    }

    pub fn get_result(&self) -> Result<JsValue, JsValue> {
        match self.output.as_ref() {
            Some(OutputKind::PredatorPrey(output)) => to_js(output),
            Some(OutputKind::FoodWeb(output)) => to_js(output),
            None => Err(JsValue::from_str("Simulation has not been run")),
        }
    }

    /// Sample times of the last run, for charting.
    pub fn times(&self) -> Result<Float64Array, JsValue> {
        let output = self.finished().map_err(to_js_error)?;
        Ok(Float64Array::from(output.result().times()))
    }

    /// One species column of the last run, for charting.
    pub fn series(&self, species: u32) -> Result<Float64Array, JsValue> {
        let values = self.series_native(species as usize).map_err(to_js_error)?;
        Ok(Float64Array::from(values.as_slice()))
    }

    pub fn to_csv(&self) -> Result<String, JsValue> {
        self.csv_native().map_err(to_js_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trophic_core::presets::default_request;

    fn assert_err_contains(err: anyhow::Error, needle: &str) {
        let message = format!("{:#}", err);
        assert!(
            message.contains(needle),
            "expected error containing '{needle}', got '{message}'"
        );
    }

    #[test]
    fn run_then_export() {
        let mut sim = WasmSimulation::from_request(RequestKind::PredatorPrey(default_request()));
        assert!(!sim.is_done());
        assert_err_contains(sim.csv_native().unwrap_err(), "has not been run");

        match sim.run_native().expect("run") {
            OutputKind::PredatorPrey(output) => assert_eq!(output.result.len(), 1000),
            OutputKind::FoodWeb(_) => panic!("wrong output kind"),
        }
        assert!(sim.is_done());
        let csv = sim.csv_native().expect("csv");
        assert!(csv.starts_with("Time,Prey,Predator\n0,100,50\n"));
        assert_eq!(csv.lines().count(), 1001);
    }

    #[test]
    fn failures_carry_context_and_clear_output() {
        let mut request = default_request();
        request.settings.max_steps = 3;
        let mut sim = WasmSimulation::from_request(RequestKind::PredatorPrey(request));
        let err = sim.run_native().unwrap_err();
        assert_err_contains(err, "Predator-prey simulation failed");
        assert!(!sim.is_done());
    }

    #[test]
    fn food_web_export_uses_names() {
        let request = FoodWebRequest {
            names: vec!["Algae".into(), "Snails".into(), "Crayfish".into()],
            growth_rates: vec![1.0, 0.5, 0.8],
            interaction_matrix: vec![vec![0.0; 3]; 3],
            carrying_capacities: Some(vec![Some(100.0), Some(40.0), Some(10.0)]),
            initial_populations: vec![10.0, 4.0, 1.0],
            time_span: 10.0,
            settings: Default::default(),
        };
        let mut sim = WasmSimulation::from_request(RequestKind::FoodWeb(request));
        sim.run_native().expect("run");
        let csv = sim.csv_native().expect("csv");
        assert_eq!(csv.lines().next(), Some("Time,Algae,Snails,Crayfish"));

        assert_eq!(sim.series_native(2).expect("column")[0], 1.0);
        assert_err_contains(sim.series_native(3).unwrap_err(), "out of range");
    }
}
