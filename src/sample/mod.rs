//! Sample project scaffold for the `example` subcommand.
//!
//! Writes a small icon folder (two icons and one plain note), a relation
//! list, the default token file and a README into an empty directory.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::{Compression, Crc};

use crate::config::MarkupTokens;
use crate::error::A2dlError;

const PUMP_ADOC: &str = "\
= Pump
:icon_name: Pump
:icon_image_path: images/pump.png
:read_more: https://en.wikipedia.org/wiki/Pump

A machine that moves fluids.

== Function
:variable_name: function
Moves water from the intake basin to the header tank.
WARNING: Do not run dry.

== Datasheet
:variable_name: datasheet
https://example.com/pump.pdf[Manufacturer sheet]
";

const VALVE_ADOC: &str = "\
= Valve
:icon_name: Valve
:icon_image_path: images/valve.png

== Function
:variable_name: function
Isolates the pump during maintenance.

=== Nominal size
:variable_name: size
DN50
";

const NOTE_ADOC: &str = "\
= Notes

This file has no tooltip sections and no image, so the library builder
skips it with a warning.
";

const RELATIONS_CSV: &str = "\
source,target,undirected,labels
Pump,Valve,,flow;DN50
Valve,Tank,yes,fill
";

const README: &str = "\
a2dl sample project

  icons/          AsciiDoc icon sources (notes.adoc is not an icon)
  icons/images/   PNG images referenced by the icons
  relations.csv   relation list for the graph command
  tokens.yaml     markup tokens, pass with --config to customise

Try:

  a2dl library icons icons.xml
  a2dl graph relations.csv plant.drawio --library icons
  a2dl diagram icons plant.drawio --new-file
";

/// Scaffold a sample project into `out_dir` and return the files written.
///
/// `out_dir` must not exist or must be empty.
pub fn write_example(out_dir: &Path) -> Result<Vec<PathBuf>, A2dlError> {
    if out_dir.exists() {
        if !out_dir.is_dir() {
            return Err(A2dlError::Usage(format!(
                "{} exists and is not a directory",
                out_dir.display()
            )));
        }
        if fs::read_dir(out_dir)?.next().is_some() {
            return Err(A2dlError::Usage(format!(
                "{} is not empty, refusing to overwrite",
                out_dir.display()
            )));
        }
    }

    let images = out_dir.join("icons").join("images");
    fs::create_dir_all(&images)?;

    let tokens = MarkupTokens::default().to_yaml_string()?;
    let files: Vec<(PathBuf, Vec<u8>)> = vec![
        (out_dir.join("icons/pump.adoc"), PUMP_ADOC.into()),
        (out_dir.join("icons/valve.adoc"), VALVE_ADOC.into()),
        (out_dir.join("icons/notes.adoc"), NOTE_ADOC.into()),
        (images.join("pump.png"), solid_png(64, 48, [0x1f, 0x77, 0xb4])?),
        (images.join("valve.png"), solid_png(48, 48, [0xd6, 0x27, 0x28])?),
        (out_dir.join("relations.csv"), RELATIONS_CSV.into()),
        (out_dir.join("tokens.yaml"), tokens.into_bytes()),
        (out_dir.join("README.txt"), README.into()),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (path, contents) in files {
        fs::write(&path, contents)?;
        tracing::debug!(path = %path.display(), "wrote sample file");
        written.push(path);
    }
    tracing::info!(dir = %out_dir.display(), files = written.len(), "sample project written");
    Ok(written)
}

/// Encode a single-colour 8-bit RGB PNG.
fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Result<Vec<u8>, A2dlError> {
    let mut raw = Vec::with_capacity((height * (width * 3 + 1)) as usize);
    for _ in 0..height {
        raw.push(0);
        for _ in 0..width {
            raw.extend_from_slice(&rgb);
        }
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    let idat = encoder.finish()?;

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    // bit depth 8, colour type 2 (RGB), default compression/filter, no interlace
    ihdr.extend_from_slice(&[8, 2, 0, 0, 0]);

    let mut png = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    push_chunk(&mut png, b"IHDR", &ihdr);
    push_chunk(&mut png, b"IDAT", &idat);
    push_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn push_chunk(png: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(kind);
    png.extend_from_slice(data);
    let mut crc = Crc::new();
    crc.update(kind);
    crc.update(data);
    png.extend_from_slice(&crc.sum().to_be_bytes());
}
