//! In-memory element tree
//!
//! A detached snapshot of the part of a page around a hover, used by hosts
//! that serialise the DOM across a boundary (and by tests). Nodes live in an
//! arena and are addressed by index.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::target::{HoverTarget, Rect, TargetId};

/// Description of one element
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub current_src: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub bounds: Rect,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn current_src(mut self, src: &str) -> Self {
        self.current_src = Some(src.to_string());
        self
    }

    pub fn background(mut self, css: &str) -> Self {
        self.background_image = Some(css.to_string());
        self
    }

    pub fn bounds(mut self, width: f64, height: f64) -> Self {
        self.bounds = Rect::new(0.0, 0.0, width, height);
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    spec: ElementSpec,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Arena of elements
#[derive(Debug, Clone, Default)]
pub struct DomSnapshot {
    nodes: Vec<Node>,
}

impl DomSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element under `parent` (or as a root) and return its id
    ///
    /// An unknown parent id adds the node as a root.
    pub fn add(&mut self, parent: Option<TargetId>, spec: ElementSpec) -> TargetId {
        let index = self.nodes.len();
        let parent = parent
            .map(|p| p.0 as usize)
            .filter(|&p| p < self.nodes.len());
        if let Some(p) = parent {
            self.nodes[p].children.push(index);
        }
        self.nodes.push(Node {
            spec,
            parent,
            children: Vec::new(),
        });
        TargetId(index as u64)
    }

    pub fn node(&self, id: TargetId) -> Option<NodeRef<'_>> {
        let index = usize::try_from(id.0).ok()?;
        (index < self.nodes.len()).then_some(NodeRef {
            snapshot: self,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Borrowed handle to one node of a `DomSnapshot`
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    snapshot: &'a DomSnapshot,
    index: usize,
}

impl<'a> NodeRef<'a> {
    fn data(&self) -> &'a Node {
        &self.snapshot.nodes[self.index]
    }

    fn collect_images(&self, out: &mut Vec<NodeRef<'a>>) {
        for &child in &self.data().children {
            let node = NodeRef {
                snapshot: self.snapshot,
                index: child,
            };
            if node.tag_name() == "img" {
                out.push(node);
            }
            node.collect_images(out);
        }
    }
}

impl<'a> HoverTarget for NodeRef<'a> {
    fn id(&self) -> TargetId {
        TargetId(self.index as u64)
    }

    fn tag_name(&self) -> &str {
        &self.data().spec.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.data().spec.attributes.get(name).map(String::as_str)
    }

    fn resolved_source(&self) -> Option<&str> {
        let spec = &self.data().spec;
        spec.current_src
            .as_deref()
            .or_else(|| spec.attributes.get("src").map(String::as_str))
    }

    fn background_image(&self) -> Option<&str> {
        self.data().spec.background_image.as_deref()
    }

    fn bounding_box(&self) -> Rect {
        self.data().spec.bounds
    }

    fn parent(&self) -> Option<Self> {
        self.data().parent.map(|index| NodeRef {
            snapshot: self.snapshot,
            index,
        })
    }

    fn descendant_images(&self) -> Vec<Self> {
        let mut out = Vec::new();
        self.collect_images(&mut out);
        out
    }
}
