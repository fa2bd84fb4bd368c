//! Browser side: the `web-sys` [`Host`], event listeners, and the per-page
//! widget registry behind the exported functions.

use std::cell::RefCell;

use tracing::{debug, error};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, HtmlElement, KeyboardEvent, MouseEvent};

use crate::chart::{self, ChartLoader, ChartSummary};
use crate::config::WidgetConfig;
use crate::dropdown::{DropdownPopup, Keystroke};
use crate::error::{Result, WidgetError};
use crate::fetch::{fetch_json, FetchOutcome};
use crate::host::{Host, Rect};
use crate::tooltip::Tooltip;

pub struct WebHost {
    document: Document,
}

impl WebHost {
    pub fn current() -> Result<Self> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| WidgetError::Dom("no document".to_string()))?;
        Ok(Self { document })
    }

    fn body(&self) -> Result<HtmlElement> {
        self.document
            .body()
            .ok_or_else(|| WidgetError::Dom("document has no <body>".to_string()))
    }
}

impl Host for WebHost {
    type Node = HtmlElement;

    fn element_by_id(&self, id: &str) -> Option<HtmlElement> {
        self.document
            .get_element_by_id(id)?
            .dyn_into::<HtmlElement>()
            .ok()
    }

    fn attribute(&self, node: &HtmlElement, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn create_panel(&self, class: &str) -> Result<HtmlElement> {
        let element = self.document.create_element("div")?;
        element.set_class_name(class);
        element
            .dyn_into::<HtmlElement>()
            .map_err(|_| WidgetError::Dom("created <div> is not an HtmlElement".to_string()))
    }

    fn insert_after(&self, anchor: &HtmlElement, node: &HtmlElement) -> Result<()> {
        anchor.after_with_node_1(node)?;
        Ok(())
    }

    fn set_text(&self, node: &HtmlElement, text: &str) {
        node.set_inner_text(text);
    }

    fn set_inner_html(&self, node: &HtmlElement, html: &str) {
        node.set_inner_html(html);
    }

    fn set_style(&self, node: &HtmlElement, property: &str, value: &str) -> Result<()> {
        node.style().set_property(property, value)?;
        Ok(())
    }

    fn append_to_body(&self, node: &HtmlElement) -> Result<()> {
        self.body()?.append_child(node)?;
        Ok(())
    }

    fn remove_from_body(&self, node: &HtmlElement) -> Result<()> {
        self.body()?.remove_child(node)?;
        Ok(())
    }

    fn bounding_rect(&self, node: &HtmlElement) -> Rect {
        let rect = node.get_bounding_client_rect();
        Rect::new(rect.left(), rect.top(), rect.width(), rect.height())
    }
}

type MouseListener = Closure<dyn FnMut(MouseEvent)>;

#[derive(Default)]
struct Widgets {
    config: WidgetConfig,
    charts: ChartLoader,
    dropdowns: DropdownPopup<HtmlElement>,
    tooltip: Tooltip<HtmlElement>,
    pointer_listener: Option<MouseListener>,
    hover_listeners: Vec<(HtmlElement, MouseListener)>,
}

thread_local! {
    static WIDGETS: RefCell<Widgets> = RefCell::new(Widgets::default());
}

fn with_widgets<T>(f: impl FnOnce(&mut Widgets) -> T) -> T {
    WIDGETS.with(|widgets| f(&mut widgets.borrow_mut()))
}

pub fn configure(config: WidgetConfig) {
    debug!(?config, "widget configuration replaced");
    with_widgets(|widgets| widgets.config = config);
}

pub fn attach_chart(element_id: &str) -> Result<()> {
    let host = WebHost::current()?;
    let request =
        with_widgets(|widgets| widgets.charts.attach(&host, &widgets.config, element_id))?;

    spawn_local(async move {
        // failures are logged by the fetcher; the container stays empty
        let FetchOutcome::Success(options) = fetch_json(&request.url).await else {
            return;
        };
        let summary = ChartSummary::of(&options);
        debug!(
            element_id = %request.element_id,
            title = ?summary.title,
            kind = ?summary.kind,
            datasets = summary.datasets,
            labels = summary.labels,
            "creating chart"
        );
        if let Err(error) = chart::render(&request.selector, &options) {
            error!(element_id = %request.element_id, %error, "failed to create chart");
        }
    });
    Ok(())
}

pub fn attach_dropdown(element_id: &str) -> Result<()> {
    let host = WebHost::current()?;
    let Some(source) = with_widgets(|widgets| widgets.dropdowns.attach(&host, element_id))? else {
        return Ok(());
    };

    let id = element_id.to_string();
    let listener = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
        let key = event.key();
        let keystroke = Keystroke::new(&key, event.ctrl_key());
        let result = WebHost::current().and_then(|host| {
            with_widgets(|widgets| {
                widgets
                    .dropdowns
                    .key_pressed(&host, &widgets.config, &id, keystroke)
            })
        });
        if let Err(error) = result {
            error!(element_id = %id, %error, "dropdown keypress failed");
        }
    });
    if let Err(error) =
        source.add_event_listener_with_callback("keypress", listener.as_ref().unchecked_ref())
    {
        with_widgets(|widgets| widgets.dropdowns.forget(element_id));
        return Err(error.into());
    }
    // lives as long as the element
    listener.forget();
    Ok(())
}

pub fn init_tooltip(element_id: &str) -> Result<()> {
    let host = WebHost::current()?;
    let attachment = with_widgets(|widgets| widgets.tooltip.init(&host, element_id))?;

    if attachment.install_pointer_listener {
        if let Err(error) = install_pointer_listener(&host) {
            with_widgets(|widgets| widgets.tooltip.pointer_listener_failed());
            return Err(error);
        }
    }

    let id = element_id.to_string();
    let listener = MouseListener::new(move |event: MouseEvent| {
        with_widgets(|widgets| {
            widgets
                .tooltip
                .track_pointer(f64::from(event.client_x()), f64::from(event.client_y()));
        });
        if let Err(error) = show_tooltip(&id) {
            error!(element_id = %id, %error, "failed to show tooltip");
        }
    });
    attachment
        .target
        .add_event_listener_with_callback("mouseenter", listener.as_ref().unchecked_ref())?;
    with_widgets(|widgets| {
        widgets
            .hover_listeners
            .push((attachment.target, listener));
    });
    Ok(())
}

fn install_pointer_listener(host: &WebHost) -> Result<()> {
    let listener = MouseListener::new(|event: MouseEvent| {
        let (x, y) = (f64::from(event.client_x()), f64::from(event.client_y()));
        let result = WebHost::current().and_then(|host| {
            with_widgets(|widgets| {
                widgets
                    .tooltip
                    .pointer_moved(&host, &widgets.config, x, y)
            })
        });
        if let Err(error) = result {
            error!(%error, "tooltip pointer tracking failed");
        }
    });
    host.body()?
        .add_event_listener_with_callback("mousemove", listener.as_ref().unchecked_ref())?;
    with_widgets(|widgets| widgets.pointer_listener = Some(listener));
    Ok(())
}

pub fn show_tooltip(element_id: &str) -> Result<()> {
    let host = WebHost::current()?;
    let request =
        with_widgets(|widgets| widgets.tooltip.show(&host, &widgets.config, element_id))?;
    let Some(request) = request else {
        return Ok(());
    };

    spawn_local(async move {
        let outcome = fetch_json(&request.url).await;
        let result = WebHost::current().and_then(|host| {
            with_widgets(|widgets| {
                widgets
                    .tooltip
                    .content_arrived(&host, &widgets.config, request.ticket, outcome)
            })
        });
        if let Err(error) = result {
            error!(%error, "tooltip content could not be shown");
        }
    });
    Ok(())
}

pub fn hide_tooltip() -> Result<()> {
    let host = WebHost::current()?;
    with_widgets(|widgets| widgets.tooltip.hide(&host)).map(drop)
}

/// Hides the tooltip and removes every listener the tooltip registered.
pub fn teardown_tooltip() -> Result<()> {
    let host = WebHost::current()?;
    let (torn_down, pointer_listener, hover_listeners) = with_widgets(|widgets| {
        (
            widgets.tooltip.teardown(&host),
            widgets.pointer_listener.take(),
            std::mem::take(&mut widgets.hover_listeners),
        )
    });

    if let Some(listener) = pointer_listener {
        let body = host.body()?;
        remove_listener(&body, "mousemove", listener);
    }
    for (target, listener) in hover_listeners {
        remove_listener(&target, "mouseenter", listener);
    }
    torn_down.map(drop)
}

fn remove_listener(target: &HtmlElement, event: &str, listener: MouseListener) {
    if let Err(error) =
        target.remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
    {
        error!(event, error = %WidgetError::from(error), "failed to remove listener");
        // still registered, so it must outlive this call
        listener.forget();
    }
}
