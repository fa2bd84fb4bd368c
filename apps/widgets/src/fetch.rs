//! One-shot JSON GET requests and the tickets widgets use to discard stale results.

use serde_json::Value;
use tracing::{debug, error};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::error::{Result, WidgetError};

/// Result of a single request. Failures keep the raw body for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(Value),
    Failure { status: u16, body: String },
}

impl FetchOutcome {
    #[cfg(test)]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_result(self) -> Result<Value> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure { status, body } => Err(WidgetError::RequestFailed { status, body }),
        }
    }
}

/// Status 0 stands in for requests that never produced a response.
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

/// Sorts a finished response into success or failure.
///
/// Only 2xx responses whose body parses as JSON succeed. A 2xx response with a
/// malformed body is a failure like any other, so callers never see a parse
/// error escape.
pub fn classify(status: u16, body: String) -> FetchOutcome {
    if !(200..300).contains(&status) {
        error!(status, "request failed ({status})");
        return FetchOutcome::Failure { status, body };
    }

    match serde_json::from_str(&body) {
        Ok(value) => {
            debug!(status, body = %body, "request returned");
            FetchOutcome::Success(value)
        }
        Err(parse_error) => {
            error!(status, error = %parse_error, "response body is not valid JSON");
            FetchOutcome::Failure { status, body }
        }
    }
}

/// Issues a GET to `url` and resolves once the whole body has arrived.
///
/// There is no timeout and no retry. Abandon a request by cancelling its
/// [`FetchTicket`].
pub async fn fetch_json(url: &str) -> FetchOutcome {
    match send(url).await {
        Ok((status, body)) => classify(status, body),
        Err(send_error) => {
            error!(url, error = %send_error, "request could not be completed");
            FetchOutcome::Failure {
                status: TRANSPORT_FAILURE_STATUS,
                body: send_error.to_string(),
            }
        }
    }
}

async fn send(url: &str) -> Result<(u16, String)> {
    let window = web_sys::window().ok_or_else(|| WidgetError::Dom("no window".to_string()))?;

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(url, &opts)?;
    let response_value = JsFuture::from(window.fetch_with_request(&request)).await?;
    let response = response_value
        .dyn_into::<Response>()
        .map_err(|_| WidgetError::Dom("fetch did not resolve to a Response".to_string()))?;

    let body = JsFuture::from(response.text()?).await?;
    Ok((response.status(), body.as_string().unwrap_or_default()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Tracks the single in-flight request a widget instance may have.
///
/// Issuing a new ticket or cancelling invalidates whatever was outstanding, and
/// a ticket redeems at most once.
#[derive(Debug, Default)]
pub struct FetchSlot {
    issued: u64,
    outstanding: Option<u64>,
}

impl FetchSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> FetchTicket {
        self.issued += 1;
        self.outstanding = Some(self.issued);
        FetchTicket(self.issued)
    }

    /// Returns whether a request was outstanding.
    pub fn cancel(&mut self) -> bool {
        self.outstanding.take().is_some()
    }

    pub fn redeem(&mut self, ticket: FetchTicket) -> bool {
        if self.outstanding == Some(ticket.0) {
            self.outstanding = None;
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    pub const fn is_pending(&self) -> bool {
        self.outstanding.is_some()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{classify, FetchOutcome, FetchSlot};
    use crate::error::WidgetError;

    #[test]
    fn success_statuses_deliver_parsed_body() {
        for status in [200, 204, 299] {
            let outcome = classify(status, r#"{ "tooltipText": "hi", "width": "200" }"#.into());
            assert_eq!(
                outcome,
                FetchOutcome::Success(json!({ "tooltipText": "hi", "width": "200" }))
            );
        }
    }

    #[test]
    fn other_statuses_keep_raw_body() {
        for status in [0, 199, 300, 404, 500] {
            let outcome = classify(status, "<html>oops</html>".into());
            assert_eq!(
                outcome,
                FetchOutcome::Failure {
                    status,
                    body: "<html>oops</html>".to_string()
                }
            );
        }
    }

    #[test]
    fn malformed_json_takes_failure_path() {
        let outcome = classify(200, "{ not json".into());
        assert!(!outcome.is_success());

        let Err(WidgetError::RequestFailed { status, body }) = outcome.into_result() else {
            panic!("expected request failure");
        };
        assert_eq!(status, 200);
        assert_eq!(body, "{ not json");
    }

    #[test]
    fn latest_ticket_redeems_once() {
        let mut slot = FetchSlot::new();
        let first = slot.issue();
        let second = slot.issue();

        assert!(!slot.redeem(first));
        assert!(slot.redeem(second));
        assert!(!slot.redeem(second));
        assert!(!slot.is_pending());
    }

    #[test]
    fn cancelled_ticket_never_redeems() {
        let mut slot = FetchSlot::new();
        let ticket = slot.issue();

        assert!(slot.cancel());
        assert!(!slot.cancel());
        assert!(!slot.redeem(ticket));
    }
}
