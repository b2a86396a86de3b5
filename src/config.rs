//! Markup tokens and builder options.
//!
//! The line-prefix tokens that mark tooltip sections, images, titles and
//! links in a source document are configuration, not constants. They can be
//! loaded from a YAML file; keys missing from the file keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::A2dlError;

/// Default glob used when scanning a folder for icon documents.
pub const DEFAULT_GLOB: &str = "**/*.adoc";

/// Default edge length of an icon placed in a diagram, in diagram units.
pub const DEFAULT_ICON_SIZE: f64 = 80.0;

/// Line-prefix tokens recognised by the icon builder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupTokens {
    /// Prefixes of a tooltip section title line (e.g. `== Description`).
    pub variable_title: Vec<String>,
    /// Marker on the line right after a title that names the variable.
    pub variable_name: String,
    /// Marker of the line holding the icon image path.
    pub icon_image: String,
    /// Marker of the line overriding the icon name and id.
    pub icon_title: String,
    /// Marker of the line holding the "read more" link.
    pub more_info: String,
    /// Prefix that turns a body line into a warning.
    pub warning_prefix: String,
    /// Body lines starting with any of these are blanked.
    pub skip_prefixes: Vec<String>,
}

impl Default for MarkupTokens {
    fn default() -> Self {
        Self {
            variable_title: vec!["== ".to_string(), "=== ".to_string()],
            variable_name: ":variable_name:".to_string(),
            icon_image: ":icon_image_path:".to_string(),
            icon_title: ":icon_name:".to_string(),
            more_info: ":read_more:".to_string(),
            warning_prefix: "WARNING:".to_string(),
            skip_prefixes: vec![
                "image::".to_string(),
                "____".to_string(),
                "[quote".to_string(),
            ],
        }
    }
}

impl MarkupTokens {
    /// Load tokens from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, A2dlError> {
        let raw = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                A2dlError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                A2dlError::Io(source)
            }
        })?;
        Self::from_yaml_str(&raw, path)
    }

    /// Parse tokens from a YAML string. `path` is only used for error context.
    pub fn from_yaml_str(raw: &str, path: &Path) -> Result<Self, A2dlError> {
        serde_yaml::from_str(raw).map_err(|source| A2dlError::ConfigParse {
            path: path.to_path_buf(),
            message: source.to_string(),
        })
    }

    /// Serialize the tokens as YAML.
    pub fn to_yaml_string(&self) -> Result<String, A2dlError> {
        serde_yaml::to_string(self).map_err(|source| A2dlError::ConfigParse {
            path: PathBuf::from("<memory>"),
            message: source.to_string(),
        })
    }
}

/// Options applied to every icon built from a document.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    pub tokens: MarkupTokens,
    /// Base directory for icon image paths. When unset, image paths are
    /// resolved against the directory of the source document.
    pub image_base_path: Option<PathBuf>,
    /// Width of a placed icon; height follows the image aspect ratio.
    pub icon_size: f64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            tokens: MarkupTokens::default(),
            image_base_path: None,
            icon_size: DEFAULT_ICON_SIZE,
        }
    }
}

/// Options for scanning a folder into a library.
#[derive(Clone, Debug)]
pub struct ScanOptions {
    /// Glob matched against paths relative to the scanned folder.
    pub glob: String,
    pub build: BuildOptions,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            glob: DEFAULT_GLOB.to_string(),
            build: BuildOptions::default(),
        }
    }
}
