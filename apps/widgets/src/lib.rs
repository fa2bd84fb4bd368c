//! Browser widgets for the build profiler web UI.
//!
//! The server renders the target elements, each carrying a `callbackUrl`
//! attribute, and then calls one of the exported functions with the element id:
//!
//! - [`linechart`] / [`create_chart`] load a frappe-charts configuration and draw it
//! - [`attach_dropdown`] echoes typed characters in a popup next to a `<select>`
//! - [`init_tooltip`] shows fetched tooltip content while the pointer hovers
//!
//! Widget failures are logged, never thrown: a widget that cannot work simply
//! does nothing.

pub mod chart;
pub mod config;
pub mod dropdown;
pub mod error;
pub mod fetch;
pub mod host;
pub mod tooltip;
pub mod web;

use tracing::error;
use wasm_bindgen::prelude::*;

pub use config::WidgetConfig;
pub use error::{Result, WidgetError};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
}

fn report(operation: &str, element_id: Option<&str>, result: Result<()>) {
    if let Err(error) = result {
        error!(operation, element_id, %error, "widget operation failed");
    }
}

#[wasm_bindgen]
pub fn linechart(element_id: &str) {
    report("linechart", Some(element_id), web::attach_chart(element_id));
}

#[wasm_bindgen(js_name = createChart)]
pub fn create_chart(element_id: &str) {
    report("createChart", Some(element_id), web::attach_chart(element_id));
}

#[wasm_bindgen(js_name = attachDropdown)]
pub fn attach_dropdown(element_id: &str) {
    report("attachDropdown", Some(element_id), web::attach_dropdown(element_id));
}

#[wasm_bindgen(js_name = initTooltip)]
pub fn init_tooltip(element_id: &str) {
    report("initTooltip", Some(element_id), web::init_tooltip(element_id));
}

#[wasm_bindgen(js_name = showTooltip)]
pub fn show_tooltip(element_id: &str) {
    report("showTooltip", Some(element_id), web::show_tooltip(element_id));
}

#[wasm_bindgen(js_name = hideTooltip)]
pub fn hide_tooltip() {
    report("hideTooltip", None, web::hide_tooltip());
}

#[wasm_bindgen(js_name = teardownTooltip)]
pub fn teardown_tooltip() {
    report("teardownTooltip", None, web::teardown_tooltip());
}

/// Replaces the widget configuration. `undefined` or `null` restores the defaults.
///
/// Unlike the widget entry points this throws on malformed options, since it
/// runs once from page setup code.
#[wasm_bindgen]
pub fn configure(options: JsValue) -> std::result::Result<(), JsValue> {
    let config = if options.is_undefined() || options.is_null() {
        WidgetConfig::default()
    } else {
        serde_wasm_bindgen::from_value::<WidgetConfig>(options).map_err(|error| {
            let error = WidgetError::Config(error.to_string());
            JsValue::from_str(&error.to_string())
        })?
    };
    web::configure(config);
    Ok(())
}
