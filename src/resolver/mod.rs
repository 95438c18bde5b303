//! Resource resolver
//!
//! Maps a hover target to the canonical image URL worth analysing.
//! Resolution order, first match wins:
//! 1. Lazy-load attribute on the node (`data-src`, `data-srcset`, `srcset`)
//! 2. The node's own resolved source, if it is an image element
//! 3. The node's CSS `background-image: url(...)`
//! 4. A descendant image (lazy attributes first, then resolved source)
//! 5. Steps 3-4 again on each ancestor, up to a fixed depth
//!
//! `None` means "not analysable" and is never an error.

pub mod snapshot;
pub mod target;

use regex::Regex;
use std::sync::OnceLock;

use crate::config::HoverConfig;
use crate::constants::{DEFAULT_MAX_ANCESTOR_DEPTH, DEFAULT_MIN_TARGET_SIZE_PX};

pub use snapshot::{DomSnapshot, ElementSpec, NodeRef};
pub use target::{HoverTarget, Rect, TargetId};

/// Attributes lazy-loading libraries park the real source in
const LAZY_ATTRIBUTES: [&str; 3] = ["data-src", "data-srcset", "srcset"];

/// Elements whose resolved source is itself an image
const IMAGE_TAGS: [&str; 2] = ["img", "image"];

static BACKGROUND_URL: OnceLock<Regex> = OnceLock::new();

fn background_url_pattern() -> &'static Regex {
    BACKGROUND_URL.get_or_init(|| {
        Regex::new(r#"url\(\s*['"]?([^'")]+?)['"]?\s*\)"#).expect("background url pattern is valid")
    })
}

#[derive(Debug, Clone)]
pub struct ResourceResolver {
    min_target_px: f64,
    max_ancestor_depth: usize,
}

impl Default for ResourceResolver {
    fn default() -> Self {
        Self {
            min_target_px: DEFAULT_MIN_TARGET_SIZE_PX,
            max_ancestor_depth: DEFAULT_MAX_ANCESTOR_DEPTH,
        }
    }
}

impl ResourceResolver {
    pub fn new(config: &HoverConfig) -> Self {
        Self {
            min_target_px: config.min_target_px,
            max_ancestor_depth: config.max_ancestor_depth,
        }
    }

    /// Whether the target is large enough to schedule (icons are ignored)
    pub fn is_qualifying<T: HoverTarget>(&self, target: &T) -> bool {
        let bounds = target.bounding_box();
        bounds.width >= self.min_target_px && bounds.height >= self.min_target_px
    }

    /// Resolve `target` to a resource identifier
    pub fn resolve<T: HoverTarget>(&self, target: &T) -> Option<String> {
        if let Some(url) = lazy_source(target) {
            return Some(url);
        }

        if is_image(target) {
            if let Some(url) = target.resolved_source().and_then(clean) {
                return Some(url);
            }
        }

        let mut depth = 0;
        let mut current: Option<T> = None;
        loop {
            let node = current.as_ref().unwrap_or(target);
            if let Some(url) = background_source(node).or_else(|| descendant_source(node)) {
                if depth > 0 {
                    tracing::trace!(depth, "Resolved hover target via ancestor");
                }
                return Some(url);
            }

            if depth == self.max_ancestor_depth {
                return None;
            }
            current = Some(node.parent()?);
            depth += 1;
        }
    }
}

fn is_image<T: HoverTarget>(node: &T) -> bool {
    IMAGE_TAGS.contains(&node.tag_name())
}

/// First usable lazy-load attribute; srcset-shaped values yield their first URL
fn lazy_source<T: HoverTarget>(node: &T) -> Option<String> {
    LAZY_ATTRIBUTES
        .iter()
        .filter_map(|name| node.attribute(name))
        .find_map(first_srcset_token)
}

fn first_srcset_token(value: &str) -> Option<String> {
    value
        .split_whitespace()
        .next()
        .map(|token| token.trim_end_matches(','))
        .and_then(clean)
}

fn background_source<T: HoverTarget>(node: &T) -> Option<String> {
    let css = node.background_image()?;
    background_url_pattern()
        .captures(css)
        .and_then(|caps| caps.get(1))
        .and_then(|m| clean(m.as_str()))
}

fn descendant_source<T: HoverTarget>(node: &T) -> Option<String> {
    node.descendant_images().iter().find_map(|img| {
        lazy_source(img).or_else(|| img.resolved_source().and_then(clean))
    })
}

fn clean(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(trimmed.to_string())
    }
}
