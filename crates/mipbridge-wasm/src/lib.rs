//! Boundary surface of the mipbridge engine for sandboxed hosts
//!
//! Provides:
//! - `extern "C"` primitives (`mipb_*`) over integer handles, numbers and
//!   boundary-heap buffers, failing with in-band sentinels
//! - Host function-pointer callbacks for reduced-cost and Farkas pricing,
//!   incumbents and node progress
//! - A safe host-side wrapper ([`Host`]) and marshaling helpers
//! - JSON and Arrow IPC result export for JavaScript
//!
//! One lifecycle controller exists per thread (one per module instance in a
//! WASM host). Host callbacks run synchronously inside `mipb_solve` and may
//! call any non-lifecycle export.

mod arrow_export;
mod state;

pub mod alloc;
pub mod callbacks;
pub mod exports;
pub mod host;
pub mod marshal;
pub mod report;

pub use host::Host;

use wasm_bindgen::prelude::*;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Summary of the last solve as JSON
#[wasm_bindgen]
pub fn solution_json() -> Result<String, JsValue> {
    let report = report::solution_report().map_err(js_err)?;
    report.to_json().map_err(js_err)
}

/// Variable values of the best solution as an Arrow IPC stream
#[wasm_bindgen]
pub fn solution_arrow() -> Result<Vec<u8>, JsValue> {
    let report = report::solution_report().map_err(js_err)?;
    arrow_export::variables_to_arrow(&report.variables).map_err(|e| JsValue::from_str(&e))
}

/// Current LP rows (handle, name, dual, Farkas dual) as JSON; call from a
/// pricing callback
#[wasm_bindgen]
pub fn lp_rows_json() -> Result<String, JsValue> {
    let rows = report::lp_rows().map_err(js_err)?;
    serde_json::to_string(&rows).map_err(js_err)
}

/// Current LP rows as an Arrow IPC stream; call from a pricing callback
#[wasm_bindgen]
pub fn lp_rows_arrow() -> Result<Vec<u8>, JsValue> {
    let rows = report::lp_rows().map_err(js_err)?;
    arrow_export::lp_rows_to_arrow(&rows).map_err(|e| JsValue::from_str(&e))
}

/// Apply solve limits from a JSON object
#[wasm_bindgen]
pub fn apply_settings(json: &str) -> Result<(), JsValue> {
    report::apply_settings_json(json).map_err(js_err)
}

/// Add a variable from a partial JSON option object and return its handle
#[wasm_bindgen]
pub fn add_var(name: &str, json: &str) -> Result<i32, JsValue> {
    report::add_var_json(name, json).map_err(js_err)
}

/// Add a linear constraint from a partial JSON option object
#[wasm_bindgen]
pub fn add_cons(name: &str, json: &str) -> Result<i32, JsValue> {
    report::add_cons_json(name, json).map_err(js_err)
}

/// Include the pricer from a partial JSON option object
#[wasm_bindgen]
pub fn include_pricer(json: &str) -> Result<bool, JsValue> {
    report::include_pricer_json(json).map_err(js_err)
}
