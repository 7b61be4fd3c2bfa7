//! Font discovery for the report renderer.
//!
//! `genpdf` needs real TrueType files for glyph metrics.  Directories are
//! searched in this order:
//!
//! 1. `RECMAP_FONTS_DIR`, if set;
//! 2. `assets/fonts` next to the running executable;
//! 3. `assets/fonts` in the crate directory;
//! 4. the usual system font directories.
//!
//! In each directory the known families are tried in order and the first one
//! with all four faces present wins.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::Error;
use genpdf::fonts::{FontData, FontFamily};
use log::debug;

/// Environment variable that overrides the font directory.
pub const FONTS_DIR_ENV: &str = "RECMAP_FONTS_DIR";

/// File names of the four faces of a font family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontFiles {
    pub name: &'static str,
    pub regular: &'static str,
    pub bold: &'static str,
    pub italic: &'static str,
    pub bold_italic: &'static str,
}

impl FontFiles {
    fn all(&self) -> [&'static str; 4] {
        [self.regular, self.bold, self.italic, self.bold_italic]
    }

    fn missing_in(&self, directory: &Path) -> Vec<&'static str> {
        self.all()
            .into_iter()
            .filter(|file| !directory.join(file).is_file())
            .collect()
    }
}

/// Families the renderer knows how to load, in order of preference.
pub const KNOWN_FAMILIES: &[FontFiles] = &[
    FontFiles {
        name: "Roboto",
        regular: "Roboto-Regular.ttf",
        bold: "Roboto-Bold.ttf",
        italic: "Roboto-Italic.ttf",
        bold_italic: "Roboto-BoldItalic.ttf",
    },
    FontFiles {
        name: "LiberationSans",
        regular: "LiberationSans-Regular.ttf",
        bold: "LiberationSans-Bold.ttf",
        italic: "LiberationSans-Italic.ttf",
        bold_italic: "LiberationSans-BoldItalic.ttf",
    },
    FontFiles {
        name: "DejaVuSans",
        regular: "DejaVuSans.ttf",
        bold: "DejaVuSans-Bold.ttf",
        italic: "DejaVuSans-Oblique.ttf",
        bold_italic: "DejaVuSans-BoldOblique.ttf",
    },
    FontFiles {
        name: "Arial",
        regular: "arial.ttf",
        bold: "arialbd.ttf",
        italic: "ariali.ttf",
        bold_italic: "arialbi.ttf",
    },
];

const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/liberation2",
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/liberation-sans",
    "/usr/share/fonts/dejavu-sans-fonts",
    "/usr/share/fonts/TTF",
    "/System/Library/Fonts/Supplemental",
    "/Library/Fonts",
];

fn push_unique(candidates: &mut Vec<PathBuf>, candidate: PathBuf) {
    if !candidates.iter().any(|existing| existing == &candidate) {
        candidates.push(candidate);
    }
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env::var_os(FONTS_DIR_ENV) {
        if !path.is_empty() {
            candidates.push(PathBuf::from(path));
        }
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push_unique(&mut candidates, bin_dir.join("assets/fonts"));
        }
    }

    push_unique(
        &mut candidates,
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"),
    );

    for dir in SYSTEM_FONT_DIRS {
        push_unique(&mut candidates, PathBuf::from(dir));
    }

    for var in ["WINDIR", "SystemRoot"] {
        if let Some(root) = env::var_os(var) {
            push_unique(&mut candidates, PathBuf::from(root).join("Fonts"));
        }
    }

    candidates
}

/// A font family located on disk but not loaded yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedFonts {
    pub directory: PathBuf,
    pub files: FontFiles,
}

/// Finds the first directory holding a complete known family.
pub fn resolve_fonts() -> Result<ResolvedFonts, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates() {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }

        for files in KNOWN_FAMILIES {
            let missing = files.missing_in(&candidate);
            if missing.is_empty() {
                return Ok(ResolvedFonts {
                    directory: candidate,
                    files: *files,
                });
            }
            if missing.len() < 4 {
                attempts.push(format!(
                    "{} ({} missing [{}])",
                    candidate.display(),
                    files.name,
                    missing.join(", ")
                ));
            }
        }
    }

    let summary = if attempts.is_empty() {
        "no search paths were available".to_owned()
    } else {
        attempts.join(", ")
    };

    Err(Error::new(
        format!(
            "Unable to locate a usable font family. Checked: {}. Set {} or install Liberation/DejaVu fonts.",
            summary, FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "no font family found"),
    ))
}

fn load_face(directory: &Path, file: &str, face: &str) -> Result<FontData, Error> {
    let path = directory.join(file);
    FontData::load(&path, None).map_err(|err| {
        Error::new(
            format!("Failed to load {} font at {}: {}", face, path.display(), err),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

/// Loads the first available font family.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    let resolved = resolve_fonts()?;
    debug!(
        "Using font family '{}' from {}",
        resolved.files.name,
        resolved.directory.display()
    );

    let directory = &resolved.directory;
    let files = resolved.files;
    Ok(FontFamily {
        regular: load_face(directory, files.regular, "regular")?,
        bold: load_face(directory, files.bold, "bold")?,
        italic: load_face(directory, files.italic, "italic")?,
        bold_italic: load_face(directory, files.bold_italic, "bold italic")?,
    })
}

/// Indicates whether any known font family can be found on this machine.
pub fn fonts_available() -> bool {
    resolve_fonts().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_reports_every_face() {
        let files = KNOWN_FAMILIES[0];
        let missing = files.missing_in(Path::new("/__recmap_missing_fonts__"));
        assert_eq!(missing.len(), 4);
    }

    #[test]
    fn candidates_are_unique() {
        let candidates = font_directory_candidates();
        for (index, candidate) in candidates.iter().enumerate() {
            assert!(!candidates[index + 1..].contains(candidate));
        }
    }
}
