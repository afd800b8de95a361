use super::PKG_REL_NS;
use super::xml::Element;

#[derive(Clone, Debug, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// The relationship list of one part (`word/_rels/document.xml.rels`).
#[derive(Clone, Debug, Default)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    pub fn parse(xml_content: &str) -> Result<Self, roxmltree::Error> {
        let mut entries = Vec::new();
        let xml = roxmltree::Document::parse(xml_content)?;
        for node in xml.root_element().children() {
            if node.tag_name().name() == "Relationship"
                && let (Some(id), Some(target)) = (node.attribute("Id"), node.attribute("Target"))
            {
                entries.push(Relationship {
                    id: id.to_string(),
                    rel_type: node.attribute("Type").unwrap_or_default().to_string(),
                    target: target.to_string(),
                    external: node.attribute("TargetMode") == Some("External"),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Id of an existing relationship of `rel_type` pointing at `target`.
    pub fn find(&self, rel_type: &str, target: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|r| r.rel_type == rel_type && r.target == target)
            .map(|r| r.id.as_str())
    }

    /// Add an internal relationship and return its fresh `rIdN`.
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let next = self
            .entries
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{next}");
        self.entries.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external: false,
        });
        id
    }

    pub fn to_element(&self) -> Element {
        let mut root = Element::new("Relationships").with_attr("xmlns", PKG_REL_NS);
        for rel in &self.entries {
            let mut node = Element::new("Relationship")
                .with_attr("Id", rel.id.as_str())
                .with_attr("Type", rel.rel_type.as_str())
                .with_attr("Target", rel.target.as_str());
            if rel.external {
                node.set_attr("TargetMode", "External");
            }
            root = root.with_child(node);
        }
        root
    }
}
