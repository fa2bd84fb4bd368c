//! Loads a chart configuration from the server and hands it to frappe-charts.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use wasm_bindgen::prelude::*;

use crate::config::WidgetConfig;
use crate::error::{Result, WidgetError};
use crate::host::Host;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = frappe, js_name = Chart)]
    type FrappeChart;

    #[wasm_bindgen(constructor, js_namespace = frappe, js_class = "Chart", catch)]
    fn new(selector: &str, options: &JsValue) -> std::result::Result<FrappeChart, JsValue>;
}

/// Everything needed to fetch and draw one chart after the element was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub element_id: String,
    pub selector: String,
    pub url: String,
}

#[derive(Debug, Default)]
pub struct ChartLoader {
    attachments: HashMap<String, usize>,
}

impl ChartLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the chart's endpoint.
    ///
    /// Attaching the same element twice is allowed and yields a second request,
    /// which may draw a second chart into the container.
    pub fn attach<H: Host>(
        &mut self,
        host: &H,
        config: &WidgetConfig,
        element_id: &str,
    ) -> Result<ChartRequest> {
        info!("Attaching linechart to {element_id}");

        let element = host
            .element_by_id(element_id)
            .ok_or_else(|| WidgetError::element_not_found(element_id))?;
        let url = host
            .attribute(&element, &config.callback_attribute)
            .ok_or_else(|| WidgetError::missing_attribute(element_id, &config.callback_attribute))?;

        let count = self.attachments.entry(element_id.to_string()).or_insert(0);
        *count += 1;
        if *count > 1 {
            warn!(
                element_id,
                attachments = *count,
                "chart attached more than once; the container may show duplicate charts"
            );
        }

        Ok(ChartRequest {
            element_id: element_id.to_string(),
            selector: config.chart_selector(element_id),
            url,
        })
    }

    #[cfg(test)]
    pub fn attachments(&self, element_id: &str) -> usize {
        self.attachments.get(element_id).copied().unwrap_or(0)
    }
}

/// The few fields worth logging from an otherwise opaque chart configuration.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ChartSummary {
    pub title: Option<String>,
    pub kind: Option<String>,
    pub datasets: usize,
    pub labels: usize,
}

impl ChartSummary {
    pub fn of(config: &Value) -> Self {
        let text = |key: &str| config.get(key).and_then(Value::as_str).map(str::to_owned);
        let count = |key: &str| {
            config
                .get("data")
                .and_then(|data| data.get(key))
                .and_then(Value::as_array)
                .map_or(0, Vec::len)
        };

        Self {
            title: text("title"),
            kind: text("type"),
            datasets: count("datasets"),
            labels: count("labels"),
        }
    }
}

/// Draws `config` into the element matched by `selector`, without looking at its shape.
pub fn render(selector: &str, config: &Value) -> Result<()> {
    let options = config
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|error| WidgetError::Dom(error.to_string()))?;
    FrappeChart::new(selector, &options)?;
    Ok(())
}
