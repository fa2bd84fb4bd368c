use serde::Deserialize;

/// Runtime settings shared by all widgets.
///
/// Every field falls back to the value the server-rendered markup expects, so
/// pages that never call `configure` get the stock behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Attribute holding the JSON endpoint on every widget target.
    pub callback_attribute: String,
    pub dropdown_popup_class: String,
    pub tooltip_class: String,
    /// Horizontal distance in pixels between the pointer and the tooltip panel.
    pub tooltip_offset_x: i32,
    /// Vertical distance in pixels between the pointer and the tooltip panel.
    pub tooltip_offset_y: i32,
    /// Prepended to an element id to build the selector handed to the chart library.
    pub chart_selector_prefix: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            callback_attribute: "callbackUrl".to_string(),
            dropdown_popup_class: "dropdown-popup".to_string(),
            tooltip_class: "tooltipDiv".to_string(),
            tooltip_offset_x: 5,
            tooltip_offset_y: 5,
            chart_selector_prefix: "#".to_string(),
        }
    }
}

impl WidgetConfig {
    pub fn chart_selector(&self, element_id: &str) -> String {
        format!("{}{element_id}", self.chart_selector_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::WidgetConfig;

    #[test]
    fn defaults_match_server_markup() {
        let config = WidgetConfig::default();
        assert_eq!(config.callback_attribute, "callbackUrl");
        assert_eq!(config.dropdown_popup_class, "dropdown-popup");
        assert_eq!(config.tooltip_class, "tooltipDiv");
        assert_eq!((config.tooltip_offset_x, config.tooltip_offset_y), (5, 5));
    }

    #[test]
    fn partial_options_keep_remaining_defaults() {
        let config: WidgetConfig =
            serde_json::from_str(r#"{ "tooltipOffsetX": 12, "tooltipClass": "hint" }"#)
                .unwrap();

        assert_eq!(config.tooltip_offset_x, 12);
        assert_eq!(config.tooltip_offset_y, 5);
        assert_eq!(config.tooltip_class, "hint");
        assert_eq!(config.callback_attribute, "callbackUrl");
    }

    #[test]
    fn chart_selector_uses_prefix() {
        let config = WidgetConfig::default();
        assert_eq!(config.chart_selector("linechart12"), "#linechart12");
    }
}
