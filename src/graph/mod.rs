//! Graph layout extension.
//!
//! Builds a relation graph over icon names, lays it out, and emits a new
//! diagram: library icons where a library knows the name, generic labelled
//! boxes elsewhere, and one edge per distinct relation.

pub mod layout;

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::Path;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Deserialize;

use crate::diagram::{graph_model, mxfile, Diagram};
use crate::error::A2dlError;
use crate::icon::{format_number, Icon};
use crate::library::Library;
use crate::xml::XmlElement;

pub use layout::{Canvas, LayoutAlgorithm, Position};

const BOX_STYLE: &str = "rounded=0;whiteSpace=wrap;html=1;";
/// Default style for relation edges.
pub const EDGE_STYLE: &str = "edgeStyle=none;html=1;endArrow=classic;";
const BOX_WIDTH: f64 = 120.0;
const BOX_HEIGHT: f64 = 60.0;

/// One relation between two named nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relation {
    pub source: String,
    pub target: String,
    /// Carried through to [`GraphEdge::directed`]; it does not change how the
    /// edge is drawn.
    pub undirected: bool,
    /// Property labels shown on the edge.
    pub labels: Vec<String>,
}

impl Relation {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            undirected: false,
            labels: Vec::new(),
        }
    }

    pub fn with_labels(mut self, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn undirected(mut self) -> Self {
        self.undirected = true;
        self
    }
}

/// Payload of one de-duplicated relation edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphEdge {
    /// `source->target`, the de-duplication key.
    pub id: String,
    pub directed: bool,
    pub labels: Vec<String>,
}

/// Relation graph over icon names.
///
/// Node indices follow first appearance, so `NodeIndex::index()` doubles as
/// the position slot used by the layouts. Edges keep the relation direction;
/// adjacency queries treat the graph as undirected and ignore self-loops.
#[derive(Clone, Debug, Default)]
pub struct RelationGraph {
    graph: DiGraph<String, GraphEdge>,
    index: HashMap<String, NodeIndex>,
}

impl RelationGraph {
    /// Union all relation endpoints into one graph. The first relation with a
    /// given `source->target` key wins.
    pub fn from_relations(relations: &[Relation]) -> Self {
        let mut graph = RelationGraph::default();
        for relation in relations {
            let source = graph.intern(&relation.source);
            let target = graph.intern(&relation.target);
            if graph.graph.contains_edge(source, target) {
                continue;
            }
            graph.graph.add_edge(
                source,
                target,
                GraphEdge {
                    id: format!("{}->{}", relation.source, relation.target),
                    directed: !relation.undirected,
                    labels: relation.labels.clone(),
                },
            );
        }
        graph
    }

    fn intern(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Node names in first-appearance order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    pub fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(name).copied()
    }

    /// Edges in insertion order as `(source, target, payload)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, &GraphEdge)> {
        self.graph
            .edge_references()
            .map(|edge| (edge.source().index(), edge.target().index(), edge.weight()))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn degree(&self, idx: usize) -> usize {
        self.neighbours(idx).count()
    }

    /// Distinct undirected neighbours of `idx`, ascending.
    pub fn neighbours(&self, idx: usize) -> impl Iterator<Item = usize> {
        self.graph
            .neighbors_undirected(NodeIndex::new(idx))
            .map(|node| node.index())
            .filter(|&other| other != idx)
            .collect::<BTreeSet<_>>()
            .into_iter()
    }

    /// Each undirected adjacency once, as `(low, high)`, ascending.
    pub fn undirected_pairs(&self) -> Vec<(usize, usize)> {
        self.graph
            .edge_references()
            .map(|edge| (edge.source().index(), edge.target().index()))
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Options for [`build_graph_diagram`].
#[derive(Clone, Debug)]
pub struct GraphDiagramOptions {
    pub algorithm: LayoutAlgorithm,
    pub seed: u64,
    pub canvas: Canvas,
    pub edge_style: String,
    pub page_name: String,
}

impl Default for GraphDiagramOptions {
    fn default() -> Self {
        Self {
            algorithm: LayoutAlgorithm::default(),
            seed: 42,
            canvas: Canvas::default(),
            edge_style: EDGE_STYLE.to_string(),
            page_name: "Page-1".to_string(),
        }
    }
}

/// Lay out `relations` and emit a diagram that will be written to `path`.
///
/// Libraries are searched in order; the first one knowing a name provides
/// its icon. Nothing is written here.
pub fn build_graph_diagram(
    relations: &[Relation],
    libraries: &[Library],
    opts: &GraphDiagramOptions,
    path: &Path,
) -> Diagram {
    let graph = RelationGraph::from_relations(relations);
    let raw = opts.algorithm.layout(&graph, opts.seed);
    let positions = layout::rescale(&raw, opts.canvas);

    let mut cells = Vec::with_capacity(graph.node_count() + graph.edge_count());
    for (idx, (name, &(x, y))) in graph.nodes().zip(&positions).enumerate() {
        let node_id = node_id(idx);
        let cell = match find_icon(libraries, name) {
            Some((library, icon)) => {
                let size = library.placement(icon);
                let placement = size.at(x - size.width / 2.0, y - size.height / 2.0);
                let mut object = icon.to_object(placement);
                object.set_attr("id", node_id);
                object
            }
            None => {
                tracing::debug!(node = %name, "no library icon, emitting generic box");
                generic_box(&node_id, name, x, y)
            }
        };
        cells.push(cell);
    }

    for (idx, (source, target, edge)) in graph.edges().enumerate() {
        cells.push(
            XmlElement::new("mxCell")
                .with_attr("id", format!("e{idx}"))
                .with_attr("value", edge.labels.join("<br>"))
                .with_attr("style", opts.edge_style.as_str())
                .with_attr("edge", "1")
                .with_attr("parent", "1")
                .with_attr("source", node_id(source))
                .with_attr("target", node_id(target))
                .with_child(
                    XmlElement::new("mxGeometry")
                        .with_attr("relative", "1")
                        .with_attr("as", "geometry"),
                ),
        );
    }

    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        layout = opts.algorithm.name(),
        "built graph diagram"
    );
    Diagram::from_root(path, mxfile(&opts.page_name, graph_model(cells)))
}

fn find_icon<'a>(libraries: &'a [Library], name: &str) -> Option<(&'a Library, &'a Icon)> {
    libraries
        .iter()
        .find_map(|library| library.get(name).map(|icon| (library, icon)))
}

fn node_id(idx: usize) -> String {
    format!("n{idx}")
}

fn generic_box(id: &str, name: &str, x: f64, y: f64) -> XmlElement {
    XmlElement::new("mxCell")
        .with_attr("id", id)
        .with_attr("value", name)
        .with_attr("style", BOX_STYLE)
        .with_attr("vertex", "1")
        .with_attr("parent", "1")
        .with_child(
            XmlElement::new("mxGeometry")
                .with_attr("x", format_number(x - BOX_WIDTH / 2.0))
                .with_attr("y", format_number(y - BOX_HEIGHT / 2.0))
                .with_attr("width", format_number(BOX_WIDTH))
                .with_attr("height", format_number(BOX_HEIGHT))
                .with_attr("as", "geometry"),
        )
}

#[derive(Debug, Deserialize)]
struct RelationRow {
    source: String,
    target: String,
    #[serde(default)]
    undirected: Option<String>,
    #[serde(default)]
    labels: Option<String>,
}

/// Read relations from a CSV file with a `source,target,undirected,labels`
/// header. `labels` is `;`-separated; `undirected` accepts true/yes/1.
pub fn read_relations_csv(path: &Path) -> Result<Vec<Relation>, A2dlError> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            A2dlError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            A2dlError::Io(source)
        }
    })?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut relations = Vec::new();
    for (line, row) in reader.deserialize::<RelationRow>().enumerate() {
        let row = row.map_err(|source| A2dlError::RelationsParse {
            path: path.to_path_buf(),
            message: format!("row {}: {source}", line + 1),
        })?;
        let labels = row
            .labels
            .as_deref()
            .map(|raw| {
                raw.split(';')
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        relations.push(Relation {
            source: row.source,
            target: row.target,
            undirected: row.undirected.as_deref().is_some_and(is_truthy),
            labels,
        });
    }
    Ok(relations)
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "1"
    )
}
