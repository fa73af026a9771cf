//! Loading the list of lines to display.

use crate::config::{PLACEHOLDER_TEXT, TEXT_FILE_NAME};
use std::path::{Path, PathBuf};

/// Produces one candidate location for the text file, if it has one.
type PathProvider = fn() -> Option<PathBuf>;

/// Where to look for the text file, in order of preference.
const PATH_PROVIDERS: &[(&str, PathProvider)] = &[
    ("executable directory", executable_dir),
    ("working directory", working_dir),
    ("home directory", home_dir),
    ("project root", project_root),
];

fn executable_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    exe.parent().map(Path::to_path_buf)
}

fn working_dir() -> Option<PathBuf> {
    std::env::current_dir().ok()
}

fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

/// `target/<profile>/` sits two levels below the project root.
fn project_root() -> Option<PathBuf> {
    executable_dir().map(|dir| dir.join("..").join(".."))
}

/// Candidate paths for the text file, most preferred first.
pub fn candidate_paths() -> Vec<PathBuf> {
    PATH_PROVIDERS
        .iter()
        .filter_map(|(name, provider)| match provider() {
            Some(dir) => Some(dir.join(TEXT_FILE_NAME)),
            None => {
                log::debug!("No {} available, skipping", name);
                None
            }
        })
        .collect()
}

const BYTE_ORDER_MARK: char = '\u{feff}';

/// LF, CR, VT, FF, NEL, LINE SEPARATOR and PARAGRAPH SEPARATOR.
const LINE_TERMINATORS: [char; 7] = [
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Ordered, non-empty list of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextList {
    lines: Vec<String>,
}

/// A text list and the file it came from, if any.
#[derive(Debug, Clone)]
pub struct LoadedTexts {
    pub texts: TextList,
    pub source: Option<PathBuf>,
}

impl TextList {
    /// Split `content` into lines and drop the empty ones.
    ///
    /// Every Unicode line terminator ends a line, so CRLF files leave no
    /// stray carriage returns. A leading byte order mark is ignored. Returns
    /// `None` if nothing is left.
    pub fn parse(content: &str) -> Option<Self> {
        let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content);
        let lines: Vec<String> = content
            .split(LINE_TERMINATORS)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(Self { lines })
        }
    }

    /// The single-line list shown when nothing could be loaded.
    pub fn placeholder() -> Self {
        Self {
            lines: vec![PLACEHOLDER_TEXT.to_string()],
        }
    }

    /// Load from the default candidate locations.
    pub fn load() -> LoadedTexts {
        Self::load_from(&candidate_paths())
    }

    /// Load from the first readable path in `candidates`.
    ///
    /// Never fails: a missing, unreadable or blank file falls back to the
    /// placeholder.
    pub fn load_from(candidates: &[PathBuf]) -> LoadedTexts {
        for path in candidates {
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    log::debug!("Read {}", path.display());
                    return match Self::parse(&content) {
                        Some(texts) => LoadedTexts {
                            texts,
                            source: Some(path.clone()),
                        },
                        None => {
                            log::info!(
                                "{} has no non-empty lines, showing placeholder",
                                path.display()
                            );
                            LoadedTexts {
                                texts: Self::placeholder(),
                                source: Some(path.clone()),
                            }
                        }
                    };
                }
                Err(e) => {
                    log::debug!("Skipping {}: {}", path.display(), e);
                }
            }
        }

        log::info!(
            "No {} found, showing placeholder. Looked in: {:?}",
            TEXT_FILE_NAME,
            candidates
        );
        LoadedTexts {
            texts: Self::placeholder(),
            source: None,
        }
    }

    /// Line at `index`. Panics if out of range.
    pub fn get(&self, index: usize) -> &str {
        &self.lines[index]
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Always false; the list holds at least one line.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}
