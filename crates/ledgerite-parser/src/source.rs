//! Line pipeline: file inclusion, comment stripping and blank-line removal
//!
//! Every stage is a lazy iterator adapter, so the whole pipeline can be
//! rebuilt from the entry file whenever the journal has to be read again.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{Location, ParseError};

/// Characters that start a comment running to the end of the line
pub const COMMENT_MARKERS: [char; 5] = [';', '#', '%', '|', '*'];

/// Source name used for journals that do not come from a file
pub const MEMORY_SOURCE: &str = "<memory>";

/// One raw line together with where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    pub source: String,
    /// 1-based line number inside `source`
    pub number: usize,
    pub text: String,
}

impl SourceLine {
    pub fn location(&self) -> Location {
        Location {
            source: self.source.clone(),
            line: self.number,
        }
    }
}

type LineIter = Box<dyn Iterator<Item = io::Result<String>>>;

struct Frame {
    /// Canonical path, `None` for in-memory content
    path: Option<PathBuf>,
    display: String,
    dir: PathBuf,
    lines: LineIter,
    number: usize,
    /// Files named by the last include line, opened one at a time
    pending: VecDeque<(PathBuf, Location)>,
}

/// Reads a journal line by line, splicing in `include`d files.
///
/// Included files are tracked on an explicit stack; opening a file that is
/// already open further down the stack fails with
/// [`ParseError::IncludeCycle`] instead of recursing forever.
pub struct IncludeReader {
    stack: Vec<Frame>,
}

impl IncludeReader {
    /// Start reading at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let mut reader = Self { stack: Vec::new() };
        reader.push_file(path.as_ref())?;
        Ok(reader)
    }

    /// Read in-memory content; includes resolve against `base_dir`
    pub fn from_content(content: &str, base_dir: impl Into<PathBuf>) -> Self {
        let lines: Vec<io::Result<String>> = content.lines().map(|l| Ok(l.to_string())).collect();
        Self {
            stack: vec![Frame {
                path: None,
                display: MEMORY_SOURCE.to_string(),
                dir: base_dir.into(),
                lines: Box::new(lines.into_iter()),
                number: 0,
                pending: VecDeque::new(),
            }],
        }
    }

    fn push_file(&mut self, path: &Path) -> Result<(), ParseError> {
        let io_error = |source| ParseError::IoError {
            path: path.to_path_buf(),
            source,
        };
        let canonical = path.canonicalize().map_err(io_error)?;

        if self.stack.iter().any(|f| f.path.as_ref() == Some(&canonical)) {
            return Err(ParseError::IncludeCycle {
                path: canonical,
                include_stack: self.stack.iter().filter_map(|f| f.path.clone()).collect(),
            });
        }

        let file = File::open(&canonical).map_err(io_error)?;
        log::debug!("Reading journal file {}", path.display());

        let dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();
        self.stack.push(Frame {
            path: Some(canonical),
            display: path.to_string_lossy().to_string(),
            dir,
            lines: Box::new(BufReader::new(file).lines()),
            number: 0,
            pending: VecDeque::new(),
        });
        Ok(())
    }

    fn fail(&mut self, error: ParseError) -> Option<Result<SourceLine, ParseError>> {
        self.stack.clear();
        Some(Err(error))
    }
}

impl Iterator for IncludeReader {
    type Item = Result<SourceLine, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;

            if let Some((path, location)) = frame.pending.pop_front() {
                if let Err(e) = self.push_file(&path) {
                    return self.fail(e.at(location));
                }
                continue;
            }

            let text = match frame.lines.next() {
                None => {
                    self.stack.pop();
                    continue;
                }
                Some(Err(source)) => {
                    let path = frame.path.clone().unwrap_or_else(|| PathBuf::from(&frame.display));
                    return self.fail(ParseError::IoError { path, source });
                }
                Some(Ok(text)) => text,
            };
            frame.number += 1;

            let line = SourceLine {
                source: frame.display.clone(),
                number: frame.number,
                text,
            };

            let targets: Option<Vec<String>> = include_targets(&line.text)
                .map(|t| t.into_iter().map(String::from).collect());
            match targets {
                None => return Some(Ok(line)),
                Some(targets) if targets.is_empty() => {
                    let error = ParseError::IncompleteDirective { directive: "include" };
                    return self.fail(error.at(line.location()));
                }
                Some(targets) => {
                    let dir = frame.dir.clone();
                    for target in targets {
                        let resolved = dir.join(target);
                        match expand(&resolved) {
                            Ok(paths) => frame
                                .pending
                                .extend(paths.into_iter().map(|p| (p, line.location()))),
                            Err(e) => return self.fail(e.at(line.location())),
                        }
                    }
                }
            }
        }
    }
}

/// Paths named by an `include`/`!include` line, or `None` for any other line
fn include_targets(line: &str) -> Option<Vec<&str>> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some("include") | Some("!include") => Some(
            tokens
                .take_while(|t| !t.starts_with(';') && !t.starts_with('#'))
                .map(|t| t.trim_matches('"'))
                .filter(|t| !t.is_empty())
                .collect(),
        ),
        _ => None,
    }
}

/// Expand glob patterns; plain paths are returned unchanged
fn expand(path: &Path) -> Result<Vec<PathBuf>, ParseError> {
    let pattern = path.to_string_lossy();
    if !pattern.contains('*') && !pattern.contains('?') {
        return Ok(vec![path.to_path_buf()]);
    }

    let entries = glob::glob(&pattern).map_err(|e| ParseError::IoError {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, e.msg),
    })?;
    let mut paths: Vec<PathBuf> = entries.flatten().filter(|p| p.is_file()).collect();
    paths.sort();
    log::debug!("Include pattern {} matched {} files", pattern, paths.len());
    Ok(paths)
}

/// Truncate a line at its first unescaped comment marker and right-trim it.
///
/// A marker preceded by a backslash is kept as a literal character.
pub fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if COMMENT_MARKERS.contains(&next) {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        } else if COMMENT_MARKERS.contains(&c) {
            break;
        }
        out.push(c);
    }
    out.truncate(out.trim_end().len());
    out
}

pub fn strip_comments<I>(lines: I) -> impl Iterator<Item = Result<SourceLine, ParseError>>
where
    I: Iterator<Item = Result<SourceLine, ParseError>>,
{
    lines.map(|line| {
        line.map(|mut l| {
            l.text = strip_comment(&l.text);
            l
        })
    })
}

pub fn remove_empty_lines<I>(lines: I) -> impl Iterator<Item = Result<SourceLine, ParseError>>
where
    I: Iterator<Item = Result<SourceLine, ParseError>>,
{
    lines.filter(|line| line.as_ref().map(|l| !l.text.is_empty()).unwrap_or(true))
}

/// The full pipeline for a journal file
pub fn journal_lines(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<SourceLine, ParseError>>, ParseError> {
    Ok(remove_empty_lines(strip_comments(IncludeReader::open(path)?)))
}

/// The full pipeline for in-memory content
pub fn content_lines(
    content: &str,
    base_dir: impl Into<PathBuf>,
) -> impl Iterator<Item = Result<SourceLine, ParseError>> {
    remove_empty_lines(strip_comments(IncludeReader::from_content(content, base_dir)))
}
