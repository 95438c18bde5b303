//! Hover target abstraction
//!
//! The resolver never touches a real DOM. Hosts adapt whatever node handle
//! they have to `HoverTarget`: geometry, attributes, computed background,
//! and tree navigation.

use serde::{Deserialize, Serialize};

/// Stable identity of a hover target, assigned by the host
///
/// Two targets can resolve to the same resource key, so presentation decisions
/// compare identities, never keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u64);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Rendered bounding box in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether any part of this box overlaps `viewport`
    pub fn intersects(&self, viewport: &Rect) -> bool {
        self.x < viewport.x + viewport.width
            && self.x + self.width > viewport.x
            && self.y < viewport.y + viewport.height
            && self.y + self.height > viewport.y
    }
}

/// Anything the pointer can hover over
pub trait HoverTarget: Sized {
    fn id(&self) -> TargetId;

    /// Lowercase element name, e.g. `img` or `div`
    fn tag_name(&self) -> &str;

    fn attribute(&self, name: &str) -> Option<&str>;

    /// Browser-resolved image source (`currentSrc`, then `src`)
    fn resolved_source(&self) -> Option<&str>;

    /// Computed `background-image` value, e.g. `url("https://...")`
    fn background_image(&self) -> Option<&str>;

    fn bounding_box(&self) -> Rect;

    fn parent(&self) -> Option<Self>;

    /// Image elements below this node, in document order
    fn descendant_images(&self) -> Vec<Self>;
}
