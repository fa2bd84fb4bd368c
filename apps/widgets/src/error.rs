use thiserror::Error;

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("failed to locate DOM element '{element_id}'")]
    ElementNotFound { element_id: String },

    #[error("element '{element_id}' has no '{attribute}' attribute")]
    MissingAttribute {
        element_id: String,
        attribute: String,
    },

    #[error("request failed ({status})")]
    RequestFailed { status: u16, body: String },

    #[error("response body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("DOM operation failed: {0}")]
    Dom(String),

    #[error("invalid widget configuration: {0}")]
    Config(String),
}

impl WidgetError {
    pub fn element_not_found(element_id: &str) -> Self {
        Self::ElementNotFound {
            element_id: element_id.to_string(),
        }
    }

    pub fn missing_attribute(element_id: &str, attribute: &str) -> Self {
        Self::MissingAttribute {
            element_id: element_id.to_string(),
            attribute: attribute.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WidgetError>;

impl From<wasm_bindgen::JsValue> for WidgetError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        use wasm_bindgen::JsCast;

        let message = value
            .as_string()
            .or_else(|| {
                value
                    .dyn_ref::<js_sys::Error>()
                    .map(|error| String::from(error.message()))
            })
            .unwrap_or_else(|| format!("{value:?}"));
        Self::Dom(message)
    }
}
