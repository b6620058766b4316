/// One element of an .osm document, as handed out by the reader. Attributes keep
/// document order and values are already XML-unescaped.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OsmElement {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<OsmElement>,
}

impl OsmElement {
    pub fn new(tag: &str) -> OsmElement {
        OsmElement {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> OsmElement {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_child(mut self, child: OsmElement) -> OsmElement {
        self.children.push(child);
        self
    }

    /// Shorthand for a `<tag k=".." v=".."/>` child.
    pub fn with_tag(self, key: &str, value: &str) -> OsmElement {
        self.with_child(
            OsmElement::new("tag")
                .with_attribute("k", key)
                .with_attribute("v", value)
        )
    }

    /// Shorthand for a `<nd ref=".."/>` child.
    pub fn with_node_ref(self, node_ref: &str) -> OsmElement {
        self.with_child(OsmElement::new("nd").with_attribute("ref", node_ref))
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }
}
