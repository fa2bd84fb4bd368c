use crate::error::Result;

/// Viewport-relative box of an element, as reported by `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Left and top edges are inside, right and bottom edges are not.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.left <= x && self.top <= y && x < self.left + self.width && y < self.top + self.height
    }
}

/// The slice of the document the widgets read and mutate.
pub trait Host {
    type Node: Clone;

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Creates a detached `<div>` carrying the given class.
    fn create_panel(&self, class: &str) -> Result<Self::Node>;

    fn insert_after(&self, anchor: &Self::Node, node: &Self::Node) -> Result<()>;

    fn set_text(&self, node: &Self::Node, text: &str);

    fn set_inner_html(&self, node: &Self::Node, html: &str);

    fn set_style(&self, node: &Self::Node, property: &str, value: &str) -> Result<()>;

    fn append_to_body(&self, node: &Self::Node) -> Result<()>;

    fn remove_from_body(&self, node: &Self::Node) -> Result<()>;

    fn bounding_rect(&self, node: &Self::Node) -> Rect;
}
