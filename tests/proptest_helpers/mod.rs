#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use a2dl::config::BuildOptions;
use a2dl::diagram::{graph_model, mxfile};
use a2dl::icon::{attribute_name, Icon};
use a2dl::library::Library;
use a2dl::xml::XmlElement;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Object attributes the icon serializer owns; variables never use them.
pub const RESERVED: &[&str] = &["id", "label", "name", "placeholders", "tooltip", "link"];

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// One generated tooltip section.
#[derive(Clone, Debug)]
pub struct SectionSpec {
    pub title: String,
    /// Name as written after the marker.
    pub variable: String,
    /// Attribute the variable is stored under.
    pub attribute: String,
    pub lines: Vec<String>,
}

/// A generated icon document.
#[derive(Clone, Debug)]
pub struct IconDoc {
    pub name: String,
    pub sections: Vec<SectionSpec>,
}

impl IconDoc {
    pub fn render(&self) -> String {
        let mut doc = format!("= {}\n:icon_name: {}\n", self.name, self.name);
        for section in &self.sections {
            doc.push_str(&format!(
                "\n== {}\n:variable_name: {}\n{}\n",
                section.title,
                section.variable,
                section.lines.join("\n")
            ));
        }
        doc
    }

    pub fn build(&self) -> Icon {
        Icon::from_adoc_str(&self.render(), Path::new("."), &BuildOptions::default())
            .expect("generated document is an icon")
    }

    pub fn library(&self) -> Library {
        let mut library = Library::new("generated");
        library.push(self.build());
        library
    }
}

pub fn arb_icon_doc(max_sections: usize) -> BoxedStrategy<IconDoc> {
    assert!(max_sections > 0, "max_sections must be > 0");

    (
        icon_name_strategy(),
        proptest::collection::btree_map(
            variable_name_strategy(),
            (title_strategy(), proptest::collection::vec(body_line_strategy(), 1..4)),
            1..=max_sections,
        ),
    )
        .prop_map(|(name, sections)| IconDoc {
            name,
            sections: sections
                .into_iter()
                .map(|(variable, (title, lines))| SectionSpec {
                    title,
                    attribute: attribute_name(&variable),
                    variable,
                    lines,
                })
                .collect(),
        })
        .prop_filter("attribute names must be distinct and unreserved", |doc| {
            let mut seen = std::collections::BTreeSet::new();
            doc.sections.iter().all(|section| {
                !RESERVED.contains(&section.attribute.as_str())
                    && seen.insert(section.attribute.clone())
            })
        })
        .boxed()
}

/// Attributes a diagram author might have put on a node, minus identity.
pub fn arb_extra_attributes() -> BoxedStrategy<BTreeMap<String, String>> {
    proptest::collection::btree_map(
        proptest::string::string_regex("[a-z]{1,8}")
            .expect("valid key regex")
            .prop_filter("identity keys are set separately", |key| {
                key != "id" && key != "name"
            }),
        proptest::string::string_regex("[a-zA-Z0-9 #;=]{0,12}").expect("valid value regex"),
        0..5,
    )
    .boxed()
}

pub fn arb_node_id() -> BoxedStrategy<String> {
    proptest::string::string_regex("[a-z0-9]{1,8}")
        .expect("valid id regex")
        .boxed()
}

/// An `mxfile` holding one object node named `name` with the given identity.
pub fn diagram_with_node(
    name: &str,
    object_id: &str,
    cell_id: &str,
    extra: &BTreeMap<String, String>,
) -> String {
    let mut object = XmlElement::new("object")
        .with_attr("id", object_id)
        .with_attr("name", name);
    for (key, value) in extra {
        object.set_attr(key.as_str(), value.as_str());
    }
    object.push(
        XmlElement::new("mxCell")
            .with_attr("id", cell_id)
            .with_attr("style", "rounded=1;")
            .with_attr("vertex", "1")
            .with_attr("parent", "1")
            .with_child(
                XmlElement::new("mxGeometry")
                    .with_attr("x", "10")
                    .with_attr("y", "20")
                    .with_attr("width", "80")
                    .with_attr("height", "80")
                    .with_attr("as", "geometry"),
            ),
    );
    mxfile("Page-1", graph_model(vec![object])).to_xml_string()
}

fn icon_name_strategy() -> BoxedStrategy<String> {
    proptest::string::string_regex("[A-Z][A-Za-z0-9]{0,15}")
        .expect("valid icon name regex")
        .boxed()
}

fn variable_name_strategy() -> BoxedStrategy<String> {
    // Anything the marker line accepts: spaces, digits first, punctuation
    // and XML metacharacters included.
    proptest::string::string_regex(r#"[A-Za-z0-9_:.#/%&"<>-]([A-Za-z0-9_:.#/%&"<> -]{0,10}[A-Za-z0-9_:.#/%&"<>-])?"#)
        .expect("valid variable name regex")
        .boxed()
}

fn title_strategy() -> BoxedStrategy<String> {
    proptest::string::string_regex("[A-Z][a-z]{0,10}")
        .expect("valid title regex")
        .boxed()
}

/// Plain prose lines: no markup prefixes, no trailing whitespace.
fn body_line_strategy() -> BoxedStrategy<String> {
    proptest::string::string_regex("[a-zA-Z0-9]([a-zA-Z0-9 .,]{0,28}[a-zA-Z0-9.])?")
        .expect("valid body regex")
        .boxed()
}
