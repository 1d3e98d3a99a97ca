//! WebAssembly bridge for `trophic_core`.
//!
//! Requests and outputs cross the boundary as plain JS objects through
//! `serde-wasm-bindgen`; errors surface as string `JsValue`s.

pub mod export;
pub mod presets;
pub mod simulation;

pub use simulation::WasmSimulation;
