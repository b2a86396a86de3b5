//! Diagram updater.
//!
//! Loads a draw.io file, fingerprints every icon node, and rewrites the
//! nodes whose `name` matches a library icon with the library's current
//! attributes. Node identity (`id`, `name`) and placement (`parent`, the
//! geometry child) belong to the diagram and survive every patch.
//!
//! Writing is guarded: in-place writes rename the original to a hidden
//! `.$<file>.bkp` sibling first and rename it back if the write fails.

pub mod codec;
mod report;
mod stamp;

pub use report::{UpdateIssue, UpdateReport};
pub use stamp::Stamp;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::A2dlError;
use crate::library::Library;
use crate::xml::{self, XmlElement, XmlNode};

/// Element names that carry an icon.
pub const OBJECT_ELEMENTS: &[&str] = &["object", "UserObject"];

const CELL_ELEMENT: &str = "mxCell";
const DIAGRAM_ELEMENT: &str = "diagram";
const MODEL_ELEMENT: &str = "mxGraphModel";

/// Which attributes a patch must leave alone.
#[derive(Clone, Debug)]
pub struct UpdateOptions {
    /// Protected attributes of the object node. Every other attribute is
    /// replaced by the library's.
    pub object_deny: Vec<String>,
    /// Protected attributes of the nested cell. Every other library cell
    /// attribute is copied over.
    pub cell_deny: Vec<String>,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            object_deny: vec!["id".to_string(), "name".to_string()],
            cell_deny: vec!["id".to_string(), "name".to_string(), "parent".to_string()],
        }
    }
}

/// Where a diagram is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Back up the original, then overwrite it.
    #[default]
    InPlace,
    /// Leave the original alone and write a `<stem>.new.<ext>` sibling.
    NewFile,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct WriteOptions {
    pub mode: WriteMode,
    /// Delete the backup after a successful write.
    pub clean: bool,
    /// Re-encode every page as a compressed payload. Off by default: the
    /// output is plain XML even when the input was compressed.
    pub recompress: bool,
}

/// A parsed draw.io document.
#[derive(Clone, Debug)]
pub struct Diagram {
    path: PathBuf,
    root: XmlElement,
    stamps: Vec<Stamp>,
    libraries: Vec<Library>,
    was_compressed: bool,
}

impl Diagram {
    /// Load the diagram at `path`.
    pub fn open(path: &Path) -> Result<Diagram, A2dlError> {
        let raw = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                A2dlError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                A2dlError::Io(source)
            }
        })?;
        Self::from_xml_str(&raw, path)
    }

    /// Parse diagram XML. `path` is where [`Diagram::write`] will write.
    ///
    /// When the document holds no icon nodes, each `<diagram>` page with a
    /// text payload is decoded as a compressed model and spliced in place.
    pub fn from_xml_str(raw: &str, path: &Path) -> Result<Diagram, A2dlError> {
        let mut root = xml::parse_element(raw, path)?;
        let mut was_compressed = false;

        if count_objects(&root) == 0 {
            was_compressed = inflate_pages(&mut root, path)?;
        }

        let mut diagram = Self::from_root(path, root);
        diagram.was_compressed = was_compressed;
        tracing::debug!(path = %path.display(), objects = diagram.stamps.len(), compressed = was_compressed, "loaded diagram");
        Ok(diagram)
    }

    /// Parse diagram bytes (must be valid UTF-8).
    pub fn from_slice(bytes: &[u8], path: &Path) -> Result<Diagram, A2dlError> {
        let raw = std::str::from_utf8(bytes).map_err(|source| A2dlError::XmlParse {
            path: path.to_path_buf(),
            message: format!("input is not valid UTF-8: {source}"),
        })?;
        Self::from_xml_str(raw, path)
    }

    /// Wrap an already-built document tree.
    pub fn from_root(path: &Path, root: XmlElement) -> Diagram {
        let stamps = collect_objects(&root).into_iter().map(Stamp::of).collect();
        Diagram {
            path: path.to_path_buf(),
            root,
            stamps,
            libraries: Vec::new(),
            was_compressed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Fingerprints taken at load time.
    pub fn stamps(&self) -> &[Stamp] {
        &self.stamps
    }

    /// Libraries applied by the latest update.
    pub fn libraries(&self) -> &[Library] {
        &self.libraries
    }

    pub fn was_compressed(&self) -> bool {
        self.was_compressed
    }

    /// Icon-bearing nodes in document order.
    pub fn objects(&self) -> Vec<&XmlElement> {
        collect_objects(&self.root)
    }

    /// Indices of objects whose current fingerprint differs from the one
    /// taken at load time.
    pub fn modified_since_load(&self) -> Vec<usize> {
        self.objects()
            .into_iter()
            .enumerate()
            .filter(|(idx, object)| self.stamps.get(*idx) != Some(&Stamp::of(object)))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Patch every node whose name matches a library icon.
    ///
    /// Libraries are applied in order, and icons within a library in library
    /// order, so later definitions win. A node without a nested cell is
    /// reported and skipped.
    pub fn update(&mut self, libraries: &[Library], opts: &UpdateOptions) -> UpdateReport {
        let before: Vec<Stamp> = self.objects().into_iter().map(Stamp::of).collect();
        let mut report = UpdateReport {
            diagram: self.path.clone(),
            libraries: libraries.iter().map(|library| library.name.clone()).collect(),
            objects: before.len(),
            ..Default::default()
        };

        for library in libraries {
            for icon in library.icons() {
                let source = icon.to_object(library.placement(icon));
                self.root.visit_mut(&mut |node| {
                    if !OBJECT_ELEMENTS.contains(&node.name.as_str())
                        || node.attr("name") != Some(icon.name.as_str())
                    {
                        return;
                    }
                    match patch_object(node, &source, opts) {
                        Ok(()) => report.matched += 1,
                        Err(err) => {
                            let id = node.attr("id").unwrap_or_default().to_string();
                            tracing::warn!(diagram = %report.diagram.display(), library = %library.name, icon = %icon.name, id = %id, error = %err, "skipping malformed node");
                            report.add(UpdateIssue {
                                name: icon.name.clone(),
                                id,
                                library: library.name.clone(),
                                message: err.to_string(),
                            });
                        }
                    }
                });
            }
        }

        report.changed = self
            .objects()
            .into_iter()
            .zip(&before)
            .filter(|(object, stamp)| Stamp::of(object) != **stamp)
            .count();
        self.libraries = libraries.to_vec();
        tracing::info!(diagram = %self.path.display(), matched = report.matched, changed = report.changed, "updated diagram");
        report
    }

    /// Serialize the document.
    pub fn to_xml_string(&self, recompress: bool) -> Result<String, A2dlError> {
        if !recompress {
            return Ok(self.root.to_xml_string());
        }
        let mut root = self.root.clone();
        let mut failure = None;
        root.visit_mut(&mut |node| {
            if node.name != DIAGRAM_ELEMENT || failure.is_some() {
                return;
            }
            let Some(model) = node.child(MODEL_ELEMENT) else {
                return;
            };
            match codec::encode_payload(&model.to_xml_string()) {
                Ok(payload) => node.children = vec![XmlNode::Text(payload)],
                Err(err) => failure = Some(err),
            }
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(root.to_xml_string()),
        }
    }

    /// Write the document according to `opts` and return the written path.
    ///
    /// The serialized tree is parsed back first; output that would not load
    /// again is rejected before the original file is touched.
    pub fn write(&self, opts: &WriteOptions) -> Result<PathBuf, A2dlError> {
        let plain = self.root.to_xml_string();
        xml::parse_element(&plain, &self.path).map_err(|err| {
            tracing::error!(path = %self.path.display(), error = %err, "refusing to write unparseable diagram");
            err
        })?;
        let content = if opts.recompress {
            self.to_xml_string(true)?
        } else {
            plain
        };
        self.commit(opts, &content, |path, bytes| fs::write(path, bytes))
    }

    fn commit(
        &self,
        opts: &WriteOptions,
        content: &str,
        write: impl FnOnce(&Path, &[u8]) -> io::Result<()>,
    ) -> Result<PathBuf, A2dlError> {
        let (target, backup) = match opts.mode {
            WriteMode::NewFile => (new_file_path(&self.path), None),
            WriteMode::InPlace => {
                let backup = if self.path.exists() {
                    let backup = backup_path(&self.path);
                    fs::rename(&self.path, &backup).map_err(|source| {
                        tracing::error!(path = %self.path.display(), error = %source, "failed to back up diagram");
                        A2dlError::WriteFailed {
                            path: self.path.clone(),
                            restored: false,
                            source,
                        }
                    })?;
                    Some(backup)
                } else {
                    None
                };
                (self.path.clone(), backup)
            }
        };

        if let Err(source) = write(&target, content.as_bytes()) {
            let restored = match &backup {
                Some(backup) => fs::rename(backup, &self.path).is_ok(),
                None => false,
            };
            tracing::error!(path = %target.display(), restored, error = %source, "failed to write diagram");
            return Err(A2dlError::WriteFailed {
                path: target,
                restored,
                source,
            });
        }

        if opts.clean {
            if let Some(backup) = &backup {
                if let Err(err) = fs::remove_file(backup) {
                    tracing::warn!(path = %backup.display(), error = %err, "failed to remove backup");
                }
            }
        }

        tracing::info!(path = %target.display(), "wrote diagram");
        Ok(target)
    }
}

/// Load `path`, apply `libraries`, and write the result.
pub fn update_diagram_file(
    path: &Path,
    libraries: &[Library],
    update: &UpdateOptions,
    write: &WriteOptions,
) -> Result<UpdateReport, A2dlError> {
    let mut diagram = Diagram::open(path).inspect_err(|err| {
        tracing::error!(path = %path.display(), error = %err, "failed to load diagram");
    })?;
    let mut report = diagram.update(libraries, update);
    report.written = Some(diagram.write(write)?);
    Ok(report)
}

/// Wrap cells in an `mxGraphModel` with the two default root cells.
pub fn graph_model(cells: Vec<XmlElement>) -> XmlElement {
    let mut root = XmlElement::new("root");
    root.push(XmlElement::new(CELL_ELEMENT).with_attr("id", "0"));
    root.push(
        XmlElement::new(CELL_ELEMENT)
            .with_attr("id", "1")
            .with_attr("parent", "0"),
    );
    for cell in cells {
        root.push(cell);
    }
    XmlElement::new(MODEL_ELEMENT).with_child(root)
}

/// Wrap a model in a single-page `mxfile`.
pub fn mxfile(page_name: &str, model: XmlElement) -> XmlElement {
    XmlElement::new("mxfile").with_attr("host", "a2dl").with_child(
        XmlElement::new(DIAGRAM_ELEMENT)
            .with_attr("id", "page-1")
            .with_attr("name", page_name)
            .with_child(model),
    )
}

/// Sibling backup path: `.$<file name>.bkp`.
pub fn backup_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".${name}.bkp"))
}

/// Sibling output path for [`WriteMode::NewFile`]: `<stem>.new.<ext>`.
pub fn new_file_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => path.with_file_name(format!("{stem}.new.{}", ext.to_string_lossy())),
        None => path.with_file_name(format!("{stem}.new")),
    }
}

fn patch_object(
    node: &mut XmlElement,
    source: &XmlElement,
    opts: &UpdateOptions,
) -> Result<(), A2dlError> {
    let malformed = |message: &str| A2dlError::MalformedNode {
        node: node_label(node),
        message: message.to_string(),
    };
    let source_cell = source
        .child(CELL_ELEMENT)
        .ok_or_else(|| malformed("library icon has no <mxCell>"))?;
    if node.child(CELL_ELEMENT).is_none() {
        return Err(malformed("missing <mxCell>"));
    }

    let object_deny = &opts.object_deny;
    node.attributes.retain(|(key, _)| object_deny.contains(key));
    for (key, value) in &source.attributes {
        if !object_deny.contains(key) {
            node.set_attr(key, value);
        }
    }

    if let Some(cell) = node.child_mut(CELL_ELEMENT) {
        for (key, value) in &source_cell.attributes {
            if !opts.cell_deny.contains(key) {
                cell.set_attr(key, value);
            }
        }
    }
    Ok(())
}

fn node_label(node: &XmlElement) -> String {
    format!(
        "{} (id {})",
        node.attr("name").unwrap_or("<unnamed>"),
        node.attr("id").unwrap_or("?")
    )
}

fn collect_objects(root: &XmlElement) -> Vec<&XmlElement> {
    let mut found = Vec::new();
    root.find_all(OBJECT_ELEMENTS, &mut found);
    found
}

fn count_objects(root: &XmlElement) -> usize {
    collect_objects(root).len()
}

/// Decode every compressed page in place. Returns whether any page was.
fn inflate_pages(root: &mut XmlElement, path: &Path) -> Result<bool, A2dlError> {
    let mut inflated = false;
    let mut failure = None;
    root.visit_mut(&mut |node| {
        if node.name != DIAGRAM_ELEMENT || failure.is_some() {
            return;
        }
        let payload = node.text();
        if payload.trim().is_empty() || node.elements().next().is_some() {
            return;
        }
        let decoded = codec::decode_payload(&payload, path)
            .and_then(|model_xml| xml::parse_element(&model_xml, path));
        match decoded {
            Ok(model) => {
                node.children = vec![XmlNode::Element(model)];
                inflated = true;
            }
            Err(err) => failure = Some(err),
        }
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(inflated),
    }
}
