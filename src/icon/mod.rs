//! Icon builder.
//!
//! Turns one AsciiDoc-flavoured text document into an [`Icon`], and an icon
//! into a draw.io `object` node. The document uses line-prefix markers (see
//! [`MarkupTokens`]) to declare the icon name, its image, a "read more" link,
//! and any number of tooltip sections:
//!
//! ```text
//! :icon_name: Pump
//! :icon_image_path: images/pump.png
//!
//! == Description
//! :variable_name: description
//! Moves water uphill.
//! ```

pub mod markup;
pub mod png;

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use rand::Rng;

use crate::config::{BuildOptions, MarkupTokens};
use crate::error::A2dlError;
use crate::xml::XmlElement;

const GENERATED_ID_LEN: usize = 20;
const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

const IMAGE_STYLE_PREFIX: &str = "shape=image;verticalLabelPosition=bottom;labelBackgroundColor=default;verticalAlign=top;aspect=fixed;imageAspect=0;";
const BOX_STYLE: &str = "rounded=1;whiteSpace=wrap;html=1;";

/// Attributes an icon always writes itself; variables cannot shadow them.
const RESERVED_ATTRIBUTES: [&str; 6] = ["id", "label", "name", "placeholders", "tooltip", "link"];

/// One tooltip section of an icon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    /// Human readable section heading.
    pub title: String,
    /// Attribute name used as the `%name%` placeholder.
    pub name: String,
    /// Transformed body lines.
    pub content: Vec<String>,
}

/// An embedded raster asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IconImage {
    pub path: PathBuf,
    pub mime: &'static str,
    /// Base64 of the file contents.
    pub data: String,
    /// Pixel size when the file is a PNG.
    pub size: Option<(u32, u32)>,
}

/// An icon definition. Immutable once built; geometry lives in [`Placement`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Icon {
    pub id: String,
    pub name: String,
    pub image: Option<IconImage>,
    pub variables: Vec<Variable>,
    pub link: Option<String>,
    /// Document the icon was built from.
    pub source: Option<PathBuf>,
}

/// Geometry of one placed icon instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The same size at another position.
    pub fn at(self, x: f64, y: f64) -> Self {
        Self { x, y, ..self }
    }
}

impl Icon {
    /// Build an icon from the document at `path`.
    pub fn from_adoc(path: &Path, opts: &BuildOptions) -> Result<Icon, A2dlError> {
        let text = fs::read_to_string(path).map_err(|source| io_error(path, source))?;
        let source_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut icon = Self::from_adoc_str(&text, source_dir, opts).map_err(|err| match err {
            A2dlError::NotAnIcon { .. } => A2dlError::NotAnIcon {
                path: path.to_path_buf(),
            },
            other => other,
        })?;

        if icon.name.is_empty() {
            icon.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default();
        }
        icon.source = Some(path.to_path_buf());
        Ok(icon)
    }

    /// Build an icon from document text. Relative image paths resolve
    /// against the configured image base path, else against `source_dir`.
    ///
    /// An icon without an explicit title marker gets an empty name here;
    /// [`Icon::from_adoc`] fills it from the file stem.
    pub fn from_adoc_str(
        text: &str,
        source_dir: &Path,
        opts: &BuildOptions,
    ) -> Result<Icon, A2dlError> {
        let parsed = parse_document(text, &opts.tokens);

        if parsed.variables.is_empty() && parsed.image.is_none() {
            return Err(A2dlError::NotAnIcon {
                path: PathBuf::from("<memory>"),
            });
        }

        let image = match parsed.image {
            Some(rel) => {
                let base = opts.image_base_path.as_deref().unwrap_or(source_dir);
                Some(load_image(&base.join(rel))?)
            }
            None => None,
        };

        let (id, name) = match parsed.title {
            Some(title) => (title.clone(), title),
            None => (generate_id(), String::new()),
        };

        Ok(Icon {
            id,
            name,
            image,
            variables: parsed.variables,
            link: parsed.link,
            source: None,
        })
    }

    /// Build an icon from raw document bytes (must be valid UTF-8).
    pub fn from_adoc_slice(
        bytes: &[u8],
        source_dir: &Path,
        opts: &BuildOptions,
    ) -> Result<Icon, A2dlError> {
        let text = std::str::from_utf8(bytes).map_err(|source| {
            A2dlError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, source))
        })?;
        Self::from_adoc_str(text, source_dir, opts)
    }

    /// Default placement at the origin. Height follows the image aspect ratio.
    pub fn default_placement(&self, icon_size: f64) -> Placement {
        let height = match self.image.as_ref().and_then(|image| image.size) {
            Some((w, h)) if w > 0 => icon_size * f64::from(h) / f64::from(w),
            _ => icon_size,
        };
        Placement::new(0.0, 0.0, icon_size, height)
    }

    /// Cell style: an embedded image when present, else a rounded box.
    pub fn style(&self) -> String {
        match &self.image {
            Some(image) => format!("{IMAGE_STYLE_PREFIX}image=data:{},{};", image.mime, image.data),
            None => BOX_STYLE.to_string(),
        }
    }

    /// HTML tooltip referencing the variables through placeholders.
    pub fn tooltip(&self) -> String {
        let mut html = String::from("<h1>%name%</h1>");
        for variable in &self.variables {
            html.push_str(&format!("<h2>{}</h2><p>%{}%</p>", variable.title, variable.name));
        }
        if let Some(link) = &self.link {
            html.push_str(&format!(
                "<p><a href=\"{link}\" target=\"_blank\">Read more</a></p>"
            ));
        }
        html
    }

    /// Serialize as a draw.io `object` node with a nested cell and geometry.
    pub fn to_object(&self, placement: Placement) -> XmlElement {
        let mut object = XmlElement::new("object")
            .with_attr("id", &self.id)
            .with_attr("label", &self.name)
            .with_attr("name", &self.name)
            .with_attr("placeholders", "1");
        for variable in &self.variables {
            if RESERVED_ATTRIBUTES.contains(&variable.name.as_str()) {
                tracing::debug!(icon = %self.name, variable = %variable.name, "skipping reserved variable name");
                continue;
            }
            object.set_attr(&variable.name, variable.content.join("\n"));
        }
        object.set_attr("tooltip", self.tooltip());
        if let Some(link) = &self.link {
            object.set_attr("link", link);
        }

        let geometry = XmlElement::new("mxGeometry")
            .with_attr("x", format_number(placement.x))
            .with_attr("y", format_number(placement.y))
            .with_attr("width", format_number(placement.width))
            .with_attr("height", format_number(placement.height))
            .with_attr("as", "geometry");
        let cell = XmlElement::new("mxCell")
            .with_attr("style", self.style())
            .with_attr("vertex", "1")
            .with_attr("parent", "1")
            .with_child(geometry);
        object.with_child(cell)
    }

    /// `to_object` rendered as a string.
    pub fn to_xml_string(&self, placement: Placement) -> String {
        self.to_object(placement).to_xml_string()
    }
}

/// Format a coordinate the way draw.io writes them: integers without a
/// fractional part, everything else with at most two decimals.
pub fn format_number(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

#[derive(Debug, Default)]
struct ParsedDocument {
    title: Option<String>,
    image: Option<String>,
    link: Option<String>,
    variables: Vec<Variable>,
}

fn parse_document(text: &str, tokens: &MarkupTokens) -> ParsedDocument {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines: Vec<&str> = text.lines().map(|line| line.trim_end()).collect();
    let mut parsed = ParsedDocument::default();
    let mut current: Option<Variable> = None;

    let mut idx = 0;
    while idx < lines.len() {
        let line = lines[idx];

        if let Some(rest) = marker_value(line, &tokens.icon_title) {
            parsed.title = Some(rest);
        } else if let Some(rest) = marker_value(line, &tokens.icon_image) {
            parsed.image = Some(rest);
        } else if let Some(rest) = marker_value(line, &tokens.more_info) {
            parsed.link = Some(rest);
        } else if let Some((title, name)) = section_header(line, lines.get(idx + 1), tokens) {
            if let Some(done) = current.take() {
                parsed.variables.push(finish_section(done));
            }
            current = Some(Variable {
                title,
                name,
                content: Vec::new(),
            });
            idx += 2;
            continue;
        } else if let Some(section) = current.as_mut() {
            section.content.push(markup::transform_line(line, tokens));
        }

        idx += 1;
    }

    if let Some(done) = current.take() {
        parsed.variables.push(finish_section(done));
    }
    parsed
}

fn marker_value(line: &str, marker: &str) -> Option<String> {
    if marker.is_empty() {
        return None;
    }
    line.strip_prefix(marker).map(|rest| rest.trim().to_string())
}

fn section_header(
    line: &str,
    next: Option<&&str>,
    tokens: &MarkupTokens,
) -> Option<(String, String)> {
    let title = tokens
        .variable_title
        .iter()
        .filter(|prefix| !prefix.is_empty())
        .find_map(|prefix| line.strip_prefix(prefix.as_str()))?;
    let raw = marker_value(next?, &tokens.variable_name)?;
    if raw.is_empty() {
        return None;
    }
    let name = attribute_name(&raw);
    if name != raw {
        tracing::warn!(variable = %raw, attribute = %name, "variable name is not a valid XML name, rewriting");
    }
    Some((title.trim().to_string(), name))
}

/// Map a variable name onto `[A-Za-z_][A-Za-z0-9_.-]*` so it can be written
/// as an attribute. Other characters become `_`.
pub fn attribute_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}

fn finish_section(mut variable: Variable) -> Variable {
    while variable.content.last().is_some_and(|line| line.trim().is_empty()) {
        variable.content.pop();
    }
    let leading = variable
        .content
        .iter()
        .take_while(|line| line.trim().is_empty())
        .count();
    variable.content.drain(..leading);
    variable
}

fn load_image(path: &Path) -> Result<IconImage, A2dlError> {
    let bytes = fs::read(path).map_err(|source| io_error(path, source))?;
    let (width, height) = png::png_dimensions(&bytes);
    Ok(IconImage {
        path: path.to_path_buf(),
        mime: mime_for(path),
        data: base64::engine::general_purpose::STANDARD.encode(&bytes),
        size: width.zip(height),
    })
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "svg" => "image/svg+xml",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "image/png",
    }
}

fn generate_id() -> String {
    let mut rng = rand::rng();
    (0..GENERATED_ID_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect()
}

fn io_error(path: &Path, source: std::io::Error) -> A2dlError {
    if source.kind() == std::io::ErrorKind::NotFound {
        A2dlError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        A2dlError::Io(source)
    }
}
