//! Hover tooltips whose content is fetched from the hovered element's endpoint.
//!
//! A [`Tooltip`] shows at most one panel at a time. The panel follows the
//! pointer while the pointer stays over the element that triggered it and is
//! removed as soon as the pointer leaves that element's box.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::WidgetConfig;
use crate::error::{Result, WidgetError};
use crate::fetch::{FetchOutcome, FetchSlot, FetchTicket};
use crate::host::Host;

/// Response body of a tooltip endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipContent {
    #[serde(default)]
    pub tooltip_text: Option<String>,
    #[serde(default)]
    pub width: Option<Value>,
}

impl TooltipContent {
    /// Width as a CSS length. Bare numbers are taken as pixels.
    pub fn css_width(&self) -> Option<String> {
        match self.width.as_ref()? {
            Value::Number(number) => Some(format!("{number}px")),
            Value::String(raw) if raw.trim().is_empty() => None,
            Value::String(raw) if raw.trim().parse::<f64>().is_ok() => {
                Some(format!("{}px", raw.trim()))
            }
            Value::String(raw) => Some(raw.trim().to_string()),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum TooltipPhase<N> {
    Hidden,
    /// Still hidden, waiting for content requested for `element_id`.
    Pending {
        element_id: String,
        ticket: FetchTicket,
    },
    Visible {
        element_id: String,
        target: N,
        panel: N,
    },
}

/// Returned by [`Tooltip::init`].
#[derive(Debug)]
pub struct TooltipAttachment<N> {
    pub target: N,
    /// Set for the first attachment only; the page-wide `mousemove` listener
    /// goes on `<body>` once.
    pub install_pointer_listener: bool,
}

/// A content request the caller must run and feed back through
/// [`Tooltip::content_arrived`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub url: String,
    pub ticket: FetchTicket,
}

#[derive(Debug)]
pub struct Tooltip<N> {
    listener_installed: bool,
    pointer: (f64, f64),
    phase: TooltipPhase<N>,
    slot: FetchSlot,
}

impl<N> Default for Tooltip<N> {
    fn default() -> Self {
        Self {
            listener_installed: false,
            pointer: (0.0, 0.0),
            phase: TooltipPhase::Hidden,
            slot: FetchSlot::new(),
        }
    }
}

enum PointerAction<N> {
    Stay,
    Follow(N),
    Hide,
    Abandon,
}

impl<N: Clone> Tooltip<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init<H: Host<Node = N>>(
        &mut self,
        host: &H,
        element_id: &str,
    ) -> Result<TooltipAttachment<N>> {
        let target = host
            .element_by_id(element_id)
            .ok_or_else(|| WidgetError::element_not_found(element_id))?;

        info!("Attaching tooltip to '{element_id}'");
        let install_pointer_listener = !self.listener_installed;
        self.listener_installed = true;

        Ok(TooltipAttachment {
            target,
            install_pointer_listener,
        })
    }

    pub const fn is_visible(&self) -> bool {
        matches!(self.phase, TooltipPhase::Visible { .. })
    }

    #[cfg(test)]
    pub const fn phase(&self) -> &TooltipPhase<N> {
        &self.phase
    }

    #[cfg(test)]
    pub const fn listener_installed(&self) -> bool {
        self.listener_installed
    }

    /// Undoes the listener claim made by [`Tooltip::init`] when the caller
    /// could not register the page-wide listener, so the next `init` retries.
    pub fn pointer_listener_failed(&mut self) {
        self.listener_installed = false;
    }

    /// Records the pointer position without touching the panel.
    pub fn track_pointer(&mut self, x: f64, y: f64) {
        self.pointer = (x, y);
    }

    /// Requests content for `element_id` unless a tooltip is already showing.
    ///
    /// A request still pending for an earlier hover is superseded.
    pub fn show<H: Host<Node = N>>(
        &mut self,
        host: &H,
        config: &WidgetConfig,
        element_id: &str,
    ) -> Result<Option<ContentRequest>> {
        debug!("mouse-enter '{element_id}'");
        if self.is_visible() {
            return Ok(None);
        }

        let element = host
            .element_by_id(element_id)
            .ok_or_else(|| WidgetError::element_not_found(element_id))?;
        let url = host
            .attribute(&element, &config.callback_attribute)
            .ok_or_else(|| WidgetError::missing_attribute(element_id, &config.callback_attribute))?;

        let ticket = self.slot.issue();
        self.phase = TooltipPhase::Pending {
            element_id: element_id.to_string(),
            ticket,
        };
        Ok(Some(ContentRequest { url, ticket }))
    }

    /// Renders fetched content if it is still wanted.
    ///
    /// Returns whether a panel was shown. Content is dropped when its request
    /// was superseded or cancelled, when it carries no text, when the element
    /// is gone, or when the pointer is no longer over the element.
    pub fn content_arrived<H: Host<Node = N>>(
        &mut self,
        host: &H,
        config: &WidgetConfig,
        ticket: FetchTicket,
        outcome: FetchOutcome,
    ) -> Result<bool> {
        if !self.slot.redeem(ticket) {
            debug!("dropping stale tooltip content");
            return Ok(false);
        }
        let TooltipPhase::Pending { element_id, .. } =
            std::mem::replace(&mut self.phase, TooltipPhase::Hidden)
        else {
            return Ok(false);
        };

        let content: TooltipContent = serde_json::from_value(outcome.into_result()?)?;
        let Some(text) = content.tooltip_text.as_deref().filter(|text| !text.is_empty()) else {
            debug!(element_id = %element_id, "no tooltip text");
            return Ok(false);
        };
        let Some(target) = host.element_by_id(&element_id) else {
            debug!(element_id = %element_id, "tooltip target left the page");
            return Ok(false);
        };
        let (x, y) = self.pointer;
        if !host.bounding_rect(&target).contains(x, y) {
            debug!(element_id = %element_id, "pointer left before the tooltip arrived");
            return Ok(false);
        }

        let panel = host.create_panel(&config.tooltip_class)?;
        if let Some(width) = content.css_width() {
            host.set_style(&panel, "width", &width)?;
        }
        self.place(host, config, &panel)?;
        host.set_inner_html(&panel, text);
        host.append_to_body(&panel)?;

        debug!("Showing tooltip for '{element_id}' at {x}, {y}");
        self.phase = TooltipPhase::Visible {
            element_id,
            target,
            panel,
        };
        Ok(true)
    }

    /// Handles a `mousemove` anywhere on the page.
    pub fn pointer_moved<H: Host<Node = N>>(
        &mut self,
        host: &H,
        config: &WidgetConfig,
        x: f64,
        y: f64,
    ) -> Result<()> {
        self.pointer = (x, y);

        let action = match &self.phase {
            TooltipPhase::Hidden => PointerAction::Stay,
            TooltipPhase::Pending { element_id, .. } => {
                let inside = host
                    .element_by_id(element_id)
                    .is_some_and(|target| host.bounding_rect(&target).contains(x, y));
                if inside {
                    PointerAction::Stay
                } else {
                    PointerAction::Abandon
                }
            }
            TooltipPhase::Visible { target, panel, .. } => {
                if host.bounding_rect(target).contains(x, y) {
                    PointerAction::Follow(panel.clone())
                } else {
                    PointerAction::Hide
                }
            }
        };

        match action {
            PointerAction::Stay => Ok(()),
            PointerAction::Follow(panel) => self.place(host, config, &panel),
            PointerAction::Hide => {
                debug!("Hiding tooltip because mouse is outside");
                self.hide(host).map(drop)
            }
            PointerAction::Abandon => {
                debug!("pointer left before tooltip content arrived");
                self.slot.cancel();
                self.phase = TooltipPhase::Hidden;
                Ok(())
            }
        }
    }

    /// Removes the panel if one is showing. A pending request is left alone.
    ///
    /// Returns whether a panel was removed.
    pub fn hide<H: Host<Node = N>>(&mut self, host: &H) -> Result<bool> {
        match std::mem::replace(&mut self.phase, TooltipPhase::Hidden) {
            TooltipPhase::Visible { panel, .. } => {
                debug!("Hiding tooltip");
                host.remove_from_body(&panel)?;
                Ok(true)
            }
            unchanged => {
                self.phase = unchanged;
                Ok(false)
            }
        }
    }

    /// Hides, drops pending content and forgets the pointer listener.
    ///
    /// Returns whether the page-wide listener was installed and must now be
    /// removed by the caller.
    pub fn teardown<H: Host<Node = N>>(&mut self, host: &H) -> Result<bool> {
        self.slot.cancel();
        let result = self.hide(host);
        if matches!(self.phase, TooltipPhase::Pending { .. }) {
            self.phase = TooltipPhase::Hidden;
        }
        let had_listener = std::mem::replace(&mut self.listener_installed, false);
        result.map(|_| had_listener)
    }

    fn place<H: Host<Node = N>>(&self, host: &H, config: &WidgetConfig, panel: &N) -> Result<()> {
        let (x, y) = self.pointer;
        let left = x + f64::from(config.tooltip_offset_x);
        let top = y + f64::from(config.tooltip_offset_y);
        host.set_style(panel, "left", &format!("{left}px"))?;
        host.set_style(panel, "top", &format!("{top}px"))
    }
}
