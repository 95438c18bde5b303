// Resolving hover targets through a host-provided HoverTarget implementation

use hoverscan::resolver::{DomSnapshot, ElementSpec, HoverTarget, Rect, ResourceResolver, TargetId};

/// A host element that owns its subtree, as an FFI bridge might hand it over
#[derive(Debug, Clone)]
struct HostElement {
    id: u64,
    tag: &'static str,
    src: Option<&'static str>,
    background: Option<&'static str>,
    size: f64,
    parent: Option<Box<HostElement>>,
    images: Vec<HostElement>,
}

impl HostElement {
    fn new(id: u64, tag: &'static str, size: f64) -> Self {
        Self {
            id,
            tag,
            src: None,
            background: None,
            size,
            parent: None,
            images: Vec::new(),
        }
    }
}

impl HoverTarget for HostElement {
    fn id(&self) -> TargetId {
        TargetId(self.id)
    }

    fn tag_name(&self) -> &str {
        self.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        (name == "src").then_some(self.src).flatten()
    }

    fn resolved_source(&self) -> Option<&str> {
        self.src
    }

    fn background_image(&self) -> Option<&str> {
        self.background
    }

    fn bounding_box(&self) -> Rect {
        Rect::new(0.0, 0.0, self.size, self.size)
    }

    fn parent(&self) -> Option<Self> {
        self.parent.as_deref().cloned()
    }

    fn descendant_images(&self) -> Vec<Self> {
        self.images.clone()
    }
}

#[test]
fn test_host_overlay_div_resolves_through_parent_background() {
    let mut card = HostElement::new(1, "div", 300.0);
    card.background = Some("url('https://cdn.example/hero.webp')");

    let mut overlay = HostElement::new(2, "span", 300.0);
    overlay.parent = Some(Box::new(card));

    let resolver = ResourceResolver::default();
    assert!(resolver.is_qualifying(&overlay));
    assert_eq!(
        resolver.resolve(&overlay).as_deref(),
        Some("https://cdn.example/hero.webp")
    );
}

#[test]
fn test_host_wrapper_resolves_descendant_image() {
    let mut img = HostElement::new(3, "img", 120.0);
    img.src = Some("https://x/a.jpg");
    let mut wrapper = HostElement::new(4, "a", 200.0);
    wrapper.images.push(img);

    assert_eq!(
        ResourceResolver::default().resolve(&wrapper).as_deref(),
        Some("https://x/a.jpg")
    );
}

#[test]
fn test_snapshot_lazy_image_in_carousel() {
    let mut dom = DomSnapshot::new();
    let carousel = dom.add(None, ElementSpec::new("div").bounds(600.0, 400.0));
    let slide = dom.add(Some(carousel), ElementSpec::new("li").bounds(600.0, 400.0));
    dom.add(
        Some(slide),
        ElementSpec::new("IMG")
            .attr("src", "data:image/gif;base64,R0lGODlhAQABAAAAACw=")
            .attr("data-srcset", "https://x/large.jpg 2x, https://x/small.jpg 1x")
            .bounds(600.0, 400.0),
    );

    let resolver = ResourceResolver::default();
    let node = dom.node(carousel).unwrap();
    assert_eq!(resolver.resolve(&node).as_deref(), Some("https://x/large.jpg"));
}

#[test]
fn test_text_only_block_is_not_analyzable() {
    let mut dom = DomSnapshot::new();
    let root = dom.add(None, ElementSpec::new("body").bounds(1280.0, 4000.0));
    let paragraph = dom.add(Some(root), ElementSpec::new("p").bounds(600.0, 200.0));

    let resolver = ResourceResolver::default();
    assert!(resolver.resolve(&dom.node(paragraph).unwrap()).is_none());
}
