//! Library assembler.
//!
//! Scans a folder of icon documents into a named [`Library`] and persists it
//! in the draw.io scratchpad format: an `<mxlibrary>` element whose text is a
//! JSON array of `{"xml": ..., "w": ..., "h": ...}` records, each `xml` being
//! an `mxGraphModel` holding one icon object.

pub mod report;

pub use report::{ScanIssue, ScanIssueCode, ScanReport, ScanSeverity};

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Serialize, Serializer};
use walkdir::WalkDir;

use crate::config::{ScanOptions, DEFAULT_ICON_SIZE};
use crate::diagram::graph_model;
use crate::error::A2dlError;
use crate::icon::{Icon, Placement};
use crate::xml::{self, XmlElement};

const LIBRARY_ROOT: &str = "mxlibrary";

/// A named, ordered collection of icons.
///
/// `names[i]` is always `icons[i].name`. Duplicate names are stored as-is;
/// lookups resolve to the last one.
#[derive(Clone, Debug)]
pub struct Library {
    pub name: String,
    names: Vec<String>,
    icons: Vec<Icon>,
    icon_size: f64,
}

/// One record of the library container.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub xml: String,
    #[serde(serialize_with = "serialize_size")]
    pub w: f64,
    #[serde(serialize_with = "serialize_size")]
    pub h: f64,
}

/// Whole sizes are written as integers (`80`, not `80.0`), as draw.io does.
fn serialize_size<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

impl Library {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            names: Vec::new(),
            icons: Vec::new(),
            icon_size: DEFAULT_ICON_SIZE,
        }
    }

    /// Set the default icon width used for placements.
    pub fn with_icon_size(mut self, icon_size: f64) -> Self {
        self.icon_size = icon_size;
        self
    }

    pub fn push(&mut self, icon: Icon) {
        self.names.push(icon.name.clone());
        self.icons.push(icon);
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Look up an icon by name. A later duplicate shadows an earlier one.
    pub fn get(&self, name: &str) -> Option<&Icon> {
        self.names
            .iter()
            .rposition(|n| n == name)
            .map(|idx| &self.icons[idx])
    }

    /// Default placement of `icon` at the origin.
    pub fn placement(&self, icon: &Icon) -> Placement {
        icon.default_placement(self.icon_size)
    }

    /// Build a library from every document under `folder` matching the glob.
    ///
    /// Documents that are not icons are logged as warnings and skipped; any
    /// other per-document failure is logged as an error and skipped. Only a
    /// missing folder or a bad glob fails the whole call.
    pub fn from_folder(
        folder: &Path,
        opts: &ScanOptions,
    ) -> Result<(Library, ScanReport), A2dlError> {
        if !folder.is_dir() {
            return Err(A2dlError::NotFound {
                path: folder.to_path_buf(),
            });
        }

        let matcher = compile_glob(&opts.glob)?;
        let name = folder_name(folder);
        let mut library = Library::new(name.clone()).with_icon_size(opts.build.icon_size);
        let mut report = ScanReport::new(name);

        for entry in WalkDir::new(folder).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    let path = source
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| folder.to_path_buf());
                    tracing::error!(path = %path.display(), error = %source, "failed to traverse library folder");
                    report.add(ScanIssue::error(
                        ScanIssueCode::TraversalFailed,
                        path,
                        source.to_string(),
                    ));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry.path().strip_prefix(folder).unwrap_or(entry.path());
            if !matcher.is_match(rel) {
                continue;
            }

            report.scanned += 1;
            match Icon::from_adoc(entry.path(), &opts.build) {
                Ok(icon) => {
                    tracing::debug!(library = %library.name, icon = %icon.name, path = %entry.path().display(), "added icon");
                    library.push(icon);
                }
                Err(err) if err.is_not_an_icon() => {
                    tracing::warn!(library = %library.name, path = %entry.path().display(), "skipping document: not an icon");
                    report.add(ScanIssue::warning(
                        ScanIssueCode::NotAnIcon,
                        entry.path(),
                        err.to_string(),
                    ));
                }
                Err(err) => {
                    tracing::error!(library = %library.name, path = %entry.path().display(), error = %err, "failed to build icon");
                    report.add(ScanIssue::error(
                        ScanIssueCode::ReadFailed,
                        entry.path(),
                        err.to_string(),
                    ));
                }
            }
        }

        report.icons = library.len();
        tracing::info!(library = %library.name, icons = library.len(), skipped = report.issues.len(), "built library");
        Ok((library, report))
    }

    /// Container records, one per icon, in library order.
    pub fn entries(&self) -> Vec<LibraryEntry> {
        self.icons
            .iter()
            .map(|icon| {
                let placement = self.placement(icon);
                let model = graph_model(vec![icon.to_object(placement)]);
                LibraryEntry {
                    xml: model.to_xml_string(),
                    w: placement.width,
                    h: placement.height,
                }
            })
            .collect()
    }

    /// Serialize to the `<mxlibrary>` container.
    pub fn to_mxlibrary_string(&self) -> Result<String, A2dlError> {
        let json = serde_json::to_string(&self.entries()).map_err(|source| {
            A2dlError::LibraryParse {
                path: PathBuf::from("<memory>"),
                message: source.to_string(),
            }
        })?;
        Ok(format!(
            "<{LIBRARY_ROOT}>{}</{LIBRARY_ROOT}>",
            xml::escape_text(&json)
        ))
    }

    /// Write the library container to `path`, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<(), A2dlError> {
        let body = self.to_mxlibrary_string()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| A2dlError::LibraryWrite {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, body).map_err(|source| A2dlError::LibraryWrite {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(library = %self.name, path = %path.display(), icons = self.len(), "wrote library");
        Ok(())
    }
}

impl LibraryEntry {
    /// Parse the entry's model and return its first icon object.
    pub fn object(&self) -> Result<XmlElement, A2dlError> {
        let model = xml::parse_element(&self.xml, Path::new("<library entry>"))?;
        let mut found = Vec::new();
        model.find_all(crate::diagram::OBJECT_ELEMENTS, &mut found);
        found
            .first()
            .map(|object| (*object).clone())
            .ok_or_else(|| A2dlError::LibraryParse {
                path: PathBuf::from("<library entry>"),
                message: "entry holds no object node".to_string(),
            })
    }
}

/// Read a library container file.
pub fn read_mxlibrary(path: &Path) -> Result<Vec<LibraryEntry>, A2dlError> {
    let raw = fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            A2dlError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            A2dlError::Io(source)
        }
    })?;
    parse_mxlibrary_str(&raw, path)
}

/// Parse a library container from a string. `path` only provides context.
pub fn parse_mxlibrary_str(raw: &str, path: &Path) -> Result<Vec<LibraryEntry>, A2dlError> {
    let document = roxmltree::Document::parse(raw).map_err(|source| A2dlError::LibraryParse {
        path: path.to_path_buf(),
        message: source.to_string(),
    })?;
    let root = document.root_element();
    if root.tag_name().name() != LIBRARY_ROOT {
        return Err(A2dlError::LibraryParse {
            path: path.to_path_buf(),
            message: format!("missing <{LIBRARY_ROOT}> root element"),
        });
    }
    let body: String = root
        .children()
        .filter(|node| node.is_text())
        .filter_map(|node| node.text())
        .collect();
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(body.trim()).map_err(|source| A2dlError::LibraryParse {
        path: path.to_path_buf(),
        message: source.to_string(),
    })
}

/// Parse a library container from bytes (must be valid UTF-8).
pub fn parse_mxlibrary_slice(bytes: &[u8]) -> Result<Vec<LibraryEntry>, A2dlError> {
    let raw = std::str::from_utf8(bytes).map_err(|source| A2dlError::LibraryParse {
        path: PathBuf::from("<bytes>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    parse_mxlibrary_str(raw, Path::new("<bytes>"))
}

fn compile_glob(pattern: &str) -> Result<GlobMatcher, A2dlError> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|source| A2dlError::InvalidGlob {
            pattern: pattern.to_string(),
            message: source.to_string(),
        })
}

fn folder_name(folder: &Path) -> String {
    folder
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .or_else(|| {
            fs::canonicalize(folder)
                .ok()
                .and_then(|abs| abs.file_name().map(|name| name.to_string_lossy().to_string()))
        })
        .unwrap_or_else(|| "library".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildOptions;

    fn icon(text: &str) -> Icon {
        Icon::from_adoc_str(text, Path::new("."), &BuildOptions::default()).expect("icon")
    }

    #[test]
    fn push_keeps_names_parallel() {
        let mut library = Library::new("lib");
        library.push(icon(":icon_name: A\n== T\n:variable_name: v\nx\n"));
        library.push(icon(":icon_name: B\n== T\n:variable_name: v\ny\n"));
        assert_eq!(library.names(), &["A".to_string(), "B".to_string()]);
        assert_eq!(library.icons()[1].name, "B");
    }

    #[test]
    fn later_duplicate_shadows_on_lookup() {
        let mut library = Library::new("lib");
        library.push(icon(":icon_name: A\n== T\n:variable_name: v\nfirst\n"));
        library.push(icon(":icon_name: A\n== T\n:variable_name: v\nsecond\n"));
        assert_eq!(library.len(), 2);
        let found = library.get("A").expect("icon A");
        assert_eq!(found.variables[0].content, vec!["second".to_string()]);
        assert!(library.get("missing").is_none());
    }

    #[test]
    fn container_roundtrips_through_parser() {
        let mut library = Library::new("lib");
        library.push(icon(":icon_name: Tank <big>\n== Notes\n:variable_name: notes\na & b\n"));
        let raw = library.to_mxlibrary_string().expect("serialize");
        assert!(raw.starts_with("<mxlibrary>[{"));
        assert!(raw.ends_with("}]</mxlibrary>"));

        let entries = parse_mxlibrary_str(&raw, Path::new("lib.xml")).expect("parse");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].w, 80.0);
        let object = entries[0].object().expect("object");
        assert_eq!(object.attr("name"), Some("Tank <big>"));
        assert_eq!(object.attr("notes"), Some("a & b"));
    }

    #[test]
    fn whole_sizes_are_written_as_integers() {
        let mut library = Library::new("lib");
        library.push(icon(":icon_name: A\n== T\n:variable_name: v\nx\n"));
        let raw = library.to_mxlibrary_string().expect("serialize");
        assert!(raw.ends_with(r#""w":80,"h":80}]</mxlibrary>"#));

        let entry = LibraryEntry {
            xml: String::new(),
            w: 80.0,
            h: 42.5,
        };
        let json = serde_json::to_string(&entry).expect("json");
        assert_eq!(json, r#"{"xml":"","w":80,"h":42.5}"#);
    }

    #[test]
    fn entry_with_spaced_variable_name_parses() {
        let mut library = Library::new("lib");
        library.push(icon(":icon_name: A\n== Size\n:variable_name: nominal size\nDN50\n"));
        let raw = library.to_mxlibrary_string().expect("serialize");
        let entries = parse_mxlibrary_str(&raw, Path::new("lib.xml")).expect("parse");
        let object = entries[0].object().expect("object");
        assert_eq!(object.attr("nominal_size"), Some("DN50"));
    }

    #[test]
    fn empty_container_parses_to_no_entries() {
        let entries = parse_mxlibrary_str("<mxlibrary></mxlibrary>", Path::new("x")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn wrong_root_is_rejected() {
        let err = parse_mxlibrary_str("<mxfile/>", Path::new("x")).unwrap_err();
        assert!(matches!(err, A2dlError::LibraryParse { .. }));
    }

    #[test]
    fn missing_folder_is_not_found() {
        let err = Library::from_folder(Path::new("no/such/folder"), &ScanOptions::default())
            .unwrap_err();
        assert!(matches!(err, A2dlError::NotFound { .. }));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let temp = tempfile::tempdir().expect("temp dir");
        let opts = ScanOptions {
            glob: "[".to_string(),
            ..Default::default()
        };
        let err = Library::from_folder(temp.path(), &opts).unwrap_err();
        assert!(matches!(err, A2dlError::InvalidGlob { .. }));
    }
}
