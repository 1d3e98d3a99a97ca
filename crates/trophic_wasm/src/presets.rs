//! Scenario library bindings.

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use trophic_core::params::EventKind;
use trophic_core::presets::{self, FoodWebKind};
use trophic_core::simulation::{FoodWebRequest, PredatorPreyRequest};
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct PresetSummary {
    name: &'static str,
    description: &'static str,
}

pub(crate) fn parse_food_web_kind(name: &str) -> Result<FoodWebKind> {
    match name.to_ascii_lowercase().as_str() {
        "forest" => Ok(FoodWebKind::Forest),
        "marine" => Ok(FoodWebKind::Marine),
        "generic" => Ok(FoodWebKind::Generic),
        _ => bail!("Unknown food web '{}'.", name),
    }
}

pub(crate) fn parse_event_kind(name: &str) -> Result<EventKind> {
    EventKind::ALL
        .into_iter()
        .find(|kind| kind.label().eq_ignore_ascii_case(name))
        .ok_or_else(|| anyhow!("Unknown event type '{}'.", name))
}

pub(crate) fn preset_request(name: &str) -> Result<PredatorPreyRequest> {
    presets::preset(name)
        .map(|preset| preset.request)
        .ok_or_else(|| anyhow!("Unknown preset '{}'.", name))
}

pub(crate) fn food_web_request(kind: &str, species: u32, time_span: f64) -> Result<FoodWebRequest> {
    let kind = parse_food_web_kind(kind)?;
    presets::food_web(kind, species as usize, time_span)
        .with_context(|| format!("Failed to build the {:?} food web", kind))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", err))
}

#[wasm_bindgen]
pub fn preset_names() -> Vec<String> {
    presets::preset_names().into_iter().map(String::from).collect()
}

/// `[{ name, description }]` for every built-in scenario.
#[wasm_bindgen]
pub fn preset_summaries() -> Result<JsValue, JsValue> {
    let summaries: Vec<PresetSummary> = presets::presets()
        .into_iter()
        .map(|preset| PresetSummary {
            name: preset.name,
            description: preset.description,
        })
        .collect();
    to_js(&summaries)
}

#[wasm_bindgen]
pub fn get_preset(name: &str) -> Result<JsValue, JsValue> {
    let request = preset_request(name).map_err(to_js_error)?;
    to_js(&request)
}

#[wasm_bindgen]
pub fn get_default_request() -> Result<JsValue, JsValue> {
    to_js(&presets::default_request())
}

#[wasm_bindgen]
pub fn get_food_web(kind: &str, species: u32, time_span: f64) -> Result<JsValue, JsValue> {
    let request = food_web_request(kind, species, time_span).map_err(to_js_error)?;
    to_js(&request)
}

/// A ramped single event; `seed` only matters for Disease, which picks its target at random.
#[wasm_bindgen]
pub fn make_event(kind: &str, start_time: f64, intensity: f64, seed: u64) -> Result<JsValue, JsValue> {
    let kind = parse_event_kind(kind).map_err(to_js_error)?;
    to_js(&presets::single_event(kind, start_time, intensity, seed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_err_contains(err: anyhow::Error, needle: &str) {
        let message = format!("{:#}", err);
        assert!(
            message.contains(needle),
            "expected error containing '{needle}', got '{message}'"
        );
    }

    #[test]
    fn kinds_parse_by_name() {
        assert_eq!(parse_food_web_kind("Marine").unwrap(), FoodWebKind::Marine);
        assert_eq!(
            parse_event_kind("habitat loss").unwrap(),
            EventKind::HabitatLoss
        );
        assert_err_contains(parse_food_web_kind("desert").unwrap_err(), "Unknown food web");
        assert_err_contains(parse_event_kind("Flood").unwrap_err(), "Unknown event type");
    }

    #[test]
    fn presets_resolve_by_name() {
        for name in preset_names() {
            let request = preset_request(&name).expect("listed preset resolves");
            assert!(request.time_span > 0.0);
        }
        assert_err_contains(preset_request("Atlantis").unwrap_err(), "Unknown preset");
    }

    #[test]
    fn food_webs_are_clamped() {
        let request = food_web_request("generic", 9, 20.0).expect("web");
        assert_eq!(request.names.len(), 5);
        let request = food_web_request("forest", 1, 20.0).expect("web");
        assert_eq!(request.names.len(), 3);
    }
}
