//! Error types for ledgerite-parser

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Position of a line inside the journal (file and 1-based line number)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub source: String,
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.line)
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Malformed amount '{fragment}': {reason}")]
    MalformedAmount {
        fragment: String,
        reason: &'static str,
    },

    #[error("Unrecognized directive '{directive}'")]
    UnrecognizedDirective { directive: char },

    #[error("Posting found outside of a transaction")]
    UnexpectedPosting,

    #[error("Invalid date: {value}")]
    InvalidDate { value: String },

    #[error("Incomplete {directive} directive")]
    IncompleteDirective { directive: &'static str },

    #[error(
        "Include cycle detected: {}",
        include_stack.iter().chain(std::iter::once(path)).map(|p| p.display().to_string()).collect::<Vec<_>>().join(" -> ")
    )]
    IncludeCycle {
        path: PathBuf,
        include_stack: Vec<PathBuf>,
    },

    #[error("IO error reading {}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{location}: {error}")]
    Located {
        location: Location,
        error: Box<ParseError>,
    },
}

impl ParseError {
    /// Attach the offending line to an error, keeping any location already present
    pub fn at(self, location: Location) -> Self {
        match self {
            located @ ParseError::Located { .. } => located,
            error => ParseError::Located {
                location,
                error: Box::new(error),
            },
        }
    }

    /// The location of the offending line, if known
    pub fn location(&self) -> Option<&Location> {
        match self {
            ParseError::Located { location, .. } => Some(location),
            _ => None,
        }
    }

    /// The error without its location wrapper
    pub fn kind(&self) -> &ParseError {
        match self {
            ParseError::Located { error, .. } => error.kind(),
            other => other,
        }
    }
}
