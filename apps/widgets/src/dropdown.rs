//! Echoes characters typed into a `<select>` in a small popup next to it.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::WidgetConfig;
use crate::error::{Result, WidgetError};
use crate::host::Host;

const BACKSPACE: &str = "Backspace";
const ENTER: &str = "Enter";

/// A `keypress` as far as the popup cares: the `KeyboardEvent.key` value and
/// whether Ctrl was held.
#[derive(Debug, Clone, Copy)]
pub struct Keystroke<'a> {
    pub key: &'a str,
    pub ctrl: bool,
}

impl<'a> Keystroke<'a> {
    pub const fn new(key: &'a str, ctrl: bool) -> Self {
        Self { key, ctrl }
    }

    fn action(self) -> KeyAction<'a> {
        if self.ctrl || self.key == ENTER {
            KeyAction::Ignore
        } else if self.key == BACKSPACE {
            KeyAction::Erase
        } else {
            KeyAction::Append(self.key)
        }
    }
}

enum KeyAction<'a> {
    Ignore,
    Erase,
    Append(&'a str),
}

#[derive(Debug)]
pub enum PopupPhase<N> {
    Idle,
    Composing { popup: N, text: String },
}

#[derive(Debug)]
pub struct DropdownState<N> {
    source: N,
    phase: PopupPhase<N>,
}

impl<N> DropdownState<N> {
    #[cfg(test)]
    pub const fn phase(&self) -> &PopupPhase<N> {
        &self.phase
    }
}

/// Per-element popup state, keyed by element id.
///
/// An entry belongs to the node that was attached; a new node rendered under
/// the same id starts over. Once a popup exists it stays. Erasing every character leaves an empty
/// popup in place, and nothing ever returns an element to idle.
#[derive(Debug)]
pub struct DropdownPopup<N> {
    states: HashMap<String, DropdownState<N>>,
}

impl<N> Default for DropdownPopup<N> {
    fn default() -> Self {
        Self {
            states: HashMap::new(),
        }
    }
}

impl<N: Clone + PartialEq> DropdownPopup<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `element_id`.
    ///
    /// Returns the source element when it was not tracked before, so the
    /// caller can register exactly one `keypress` listener on it. If the
    /// caller fails to register it, [`DropdownPopup::forget`] undoes the attach.
    pub fn attach<H: Host<Node = N>>(&mut self, host: &H, element_id: &str) -> Result<Option<N>> {
        let source = host
            .element_by_id(element_id)
            .ok_or_else(|| WidgetError::element_not_found(element_id))?;

        match self.states.get(element_id) {
            Some(state) if state.source == source => {
                debug!(element_id, "dropdown already attached");
                return Ok(None);
            }
            Some(_) => debug!(element_id, "dropdown element was replaced"),
            None => {}
        }

        info!("Attaching dropdown to '{element_id}'");
        self.states.insert(
            element_id.to_string(),
            DropdownState {
                source: source.clone(),
                phase: PopupPhase::Idle,
            },
        );
        Ok(Some(source))
    }

    pub fn key_pressed<H: Host<Node = N>>(
        &mut self,
        host: &H,
        config: &WidgetConfig,
        element_id: &str,
        keystroke: Keystroke<'_>,
    ) -> Result<()> {
        let Some(state) = self.states.get_mut(element_id) else {
            debug!(element_id, "keypress for unattached dropdown");
            return Ok(());
        };

        match keystroke.action() {
            KeyAction::Ignore => {}
            KeyAction::Erase => {
                if let PopupPhase::Composing { popup, text } = &mut state.phase {
                    if text.pop().is_some() {
                        host.set_text(popup, text);
                    }
                }
            }
            KeyAction::Append(key) => match &mut state.phase {
                PopupPhase::Composing { popup, text } => {
                    text.push_str(key);
                    host.set_text(popup, text);
                }
                PopupPhase::Idle => {
                    let popup = host.create_panel(&config.dropdown_popup_class)?;
                    host.set_text(&popup, key);
                    host.insert_after(&state.source, &popup)?;
                    state.phase = PopupPhase::Composing {
                        popup,
                        text: key.to_string(),
                    };
                }
            },
        }
        Ok(())
    }

    /// Drops the state for `element_id`, leaving any popup already shown in place.
    pub fn forget(&mut self, element_id: &str) {
        self.states.remove(element_id);
    }

    #[cfg(test)]
    pub fn is_attached(&self, element_id: &str) -> bool {
        self.states.contains_key(element_id)
    }

    #[cfg(test)]
    pub fn state(&self, element_id: &str) -> Option<&DropdownState<N>> {
        self.states.get(element_id)
    }

    /// Text currently shown in the element's popup, if one exists.
    #[cfg(test)]
    pub fn popup_text(&self, element_id: &str) -> Option<&str> {
        match &self.states.get(element_id)?.phase {
            PopupPhase::Idle => None,
            PopupPhase::Composing { text, .. } => Some(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DropdownPopup, Keystroke, PopupPhase};
    use crate::config::WidgetConfig;
    use crate::error::WidgetError;
    use crate::host::fake::FakeDom;
    use crate::host::Rect;

    fn attached(dom: &FakeDom) -> (DropdownPopup<usize>, usize) {
        let source = dom.add_element("select1", Rect::default());
        let mut dropdowns = DropdownPopup::new();
        assert_eq!(dropdowns.attach(dom, "select1").unwrap(), Some(source));
        (dropdowns, source)
    }

    fn type_keys(dom: &FakeDom, dropdowns: &mut DropdownPopup<usize>, keys: &[&str]) {
        let config = WidgetConfig::default();
        for key in keys {
            dropdowns
                .key_pressed(dom, &config, "select1", Keystroke::new(key, false))
                .unwrap();
        }
    }

    #[test]
    fn typing_with_correction_shows_remaining_text() {
        let dom = FakeDom::new();
        let (mut dropdowns, source) = attached(&dom);

        type_keys(&dom, &mut dropdowns, &["a", "b", "Backspace", "c"]);

        assert_eq!(dropdowns.popup_text("select1"), Some("ac"));
        let panels = dom.panels();
        assert_eq!(panels.len(), 1);
        let popup = dom.node(panels[0]);
        assert_eq!(popup.text, "ac");
        assert_eq!(popup.class.as_deref(), Some("dropdown-popup"));
        assert_eq!(popup.inserted_after, Some(source));
    }

    #[test]
    fn backspace_while_idle_creates_nothing() {
        let dom = FakeDom::new();
        let (mut dropdowns, _) = attached(&dom);

        type_keys(&dom, &mut dropdowns, &["Backspace"]);

        assert!(dom.panels().is_empty());
        assert!(matches!(
            dropdowns.state("select1").unwrap().phase(),
            PopupPhase::Idle
        ));
    }

    #[test]
    fn enter_and_ctrl_keys_are_ignored() {
        let dom = FakeDom::new();
        let (mut dropdowns, _) = attached(&dom);
        let config = WidgetConfig::default();

        type_keys(&dom, &mut dropdowns, &["Enter"]);
        dropdowns
            .key_pressed(&dom, &config, "select1", Keystroke::new("c", true))
            .unwrap();
        assert!(dom.panels().is_empty());

        type_keys(&dom, &mut dropdowns, &["x", "Enter"]);
        dropdowns
            .key_pressed(&dom, &config, "select1", Keystroke::new("v", true))
            .unwrap();
        assert_eq!(dropdowns.popup_text("select1"), Some("x"));
    }

    #[test]
    fn erasing_everything_keeps_empty_popup() {
        let dom = FakeDom::new();
        let (mut dropdowns, _) = attached(&dom);

        type_keys(&dom, &mut dropdowns, &["q", "Backspace", "Backspace"]);

        assert_eq!(dropdowns.popup_text("select1"), Some(""));
        assert_eq!(dom.panels().len(), 1);
        assert_eq!(dom.node(dom.panels()[0]).text, "");
    }

    #[test]
    fn backspace_removes_whole_characters() {
        let dom = FakeDom::new();
        let (mut dropdowns, _) = attached(&dom);

        type_keys(&dom, &mut dropdowns, &["ü", "ß", "Backspace"]);

        assert_eq!(dropdowns.popup_text("select1"), Some("ü"));
    }

    #[test]
    fn second_attach_registers_nothing() {
        let dom = FakeDom::new();
        let (mut dropdowns, _) = attached(&dom);
        type_keys(&dom, &mut dropdowns, &["a"]);

        assert_eq!(dropdowns.attach(&dom, "select1").unwrap(), None);
        assert_eq!(dropdowns.popup_text("select1"), Some("a"));
    }

    #[test]
    fn replaced_element_is_attached_afresh() {
        let dom = FakeDom::new();
        let (mut dropdowns, old) = attached(&dom);
        type_keys(&dom, &mut dropdowns, &["x"]);

        dom.remove_element("select1");
        let fresh = dom.add_element("select1", Rect::default());

        assert_eq!(dropdowns.attach(&dom, "select1").unwrap(), Some(fresh));
        assert_eq!(dropdowns.popup_text("select1"), None);

        type_keys(&dom, &mut dropdowns, &["a"]);

        let popups = dom.panels();
        assert_eq!(popups.len(), 2);
        let popup = dom.node(popups[1]);
        assert_eq!(popup.text, "a");
        assert_eq!(popup.inserted_after, Some(fresh));
        assert_ne!(popup.inserted_after, Some(old));
    }

    #[test]
    fn forgotten_element_can_attach_again() {
        let dom = FakeDom::new();
        let (mut dropdowns, source) = attached(&dom);

        dropdowns.forget("select1");

        assert!(!dropdowns.is_attached("select1"));
        assert_eq!(dropdowns.attach(&dom, "select1").unwrap(), Some(source));
    }

    #[test]
    fn missing_element_aborts_attach() {
        let dom = FakeDom::new();
        let mut dropdowns: DropdownPopup<usize> = DropdownPopup::new();

        let result = dropdowns.attach(&dom, "ghost");

        assert!(matches!(result, Err(WidgetError::ElementNotFound { .. })));
        assert!(!dropdowns.is_attached("ghost"));
    }

    #[test]
    fn keys_for_unknown_elements_are_dropped() {
        let dom = FakeDom::new();
        let mut dropdowns: DropdownPopup<usize> = DropdownPopup::new();

        dropdowns
            .key_pressed(&dom, &WidgetConfig::default(), "ghost", Keystroke::new("a", false))
            .unwrap();

        assert!(dom.panels().is_empty());
    }
}
