//! Classification and parsing of service replies.
//!
//! # Design
//! The same endpoint answers with one of several shapes depending on the
//! request. `classify` picks the shape in a fixed order:
//!
//! 1. `#` lines are the header, everything else is the body.
//! 2. A body that is a rectangular table of floats is a spectrum.
//! 3. Otherwise a `cfg` request yields the raw text as a configuration echo,
//! 4. a `ret` request yields the text split into named sections,
//! 5. and anything else yields the raw text unchanged.
//!
//! Only a failed table parse moves classification on to the next step.
//! `parse_table` reports that failure as a value, so nothing else can be
//! mistaken for it.

use std::ops::Range;
use std::time::Duration;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::trace;

use crate::request::OutputType;

const SECTION_PREFIX: &str = "results_";
const SECTION_SUFFIX: &str = ".txt";

/// A rectangular table of floats, stored row-major.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: usize,
    values: Vec<f64>,
}

impl Table {
    /// Build a table from rows, or `None` if the rows are ragged.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let columns = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != columns) {
            return None;
        }
        Some(Self {
            columns,
            values: rows.into_iter().flatten().collect(),
        })
    }

    pub fn rows(&self) -> usize {
        if self.columns == 0 {
            0
        } else {
            self.values.len() / self.columns
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.rows() {
            return None;
        }
        let start = index * self.columns;
        Some(&self.values[start..start + self.columns])
    }

    /// Values of one column, top to bottom. Empty when out of range.
    pub fn column(&self, index: usize) -> impl Iterator<Item = f64> + '_ {
        let step = self.columns.max(1);
        let values = if index < self.columns {
            &self.values[index..]
        } else {
            &[][..]
        };
        values.iter().step_by(step).copied()
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.columns.max(1))
    }
}

/// Why a body is not a numeric table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("line {line}: {token:?} is not a number")]
    InvalidNumber { line: usize, token: String },

    #[error("line {line}: expected {expected} columns, found {found}")]
    Ragged {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// A parsed reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Numeric output with its `#` header lines.
    Spectrum {
        header: String,
        table: Table,
        duration: Duration,
    },
    /// Configuration echo for a `cfg` request.
    Config(String),
    /// Named sections of a `ret` reply, in the order found.
    Sections(IndexMap<String, String>),
    /// Anything else, verbatim.
    Raw(String),
}

impl Reply {
    pub fn spectrum(&self) -> Option<&Table> {
        match self {
            Reply::Spectrum { table, .. } => Some(table),
            _ => None,
        }
    }

    pub fn header(&self) -> Option<&str> {
        match self {
            Reply::Spectrum { header, .. } => Some(header),
            _ => None,
        }
    }

    pub fn config_text(&self) -> Option<&str> {
        match self {
            Reply::Config(text) => Some(text),
            _ => None,
        }
    }

    pub fn sections(&self) -> Option<&IndexMap<String, String>> {
        match self {
            Reply::Sections(sections) => Some(sections),
            _ => None,
        }
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            Reply::Raw(text) => Some(text),
            _ => None,
        }
    }
}

/// Classify a raw reply. `output` is the `type` the request was sent with.
pub fn classify(raw: &str, output: Option<OutputType>, duration: Duration) -> Reply {
    let (header, body) = split_header(raw);
    let err = match parse_table(&body) {
        Ok(table) => {
            trace!(rows = table.rows(), columns = table.columns(), "reply is a spectrum");
            return Reply::Spectrum {
                header,
                table,
                duration,
            };
        }
        Err(err) => err,
    };
    trace!(%err, ?output, "reply is not numeric");
    match output {
        Some(OutputType::Cfg) => Reply::Config(raw.to_string()),
        Some(OutputType::Ret) => Reply::Sections(split_sections(raw)),
        _ => Reply::Raw(raw.to_string()),
    }
}

/// Separate `#` comment lines from the rest, each joined with `\n`.
pub fn split_header(raw: &str) -> (String, String) {
    let (header, body): (Vec<&str>, Vec<&str>) =
        raw.lines().partition(|line| line.starts_with('#'));
    (header.join("\n"), body.join("\n"))
}

/// Parse whitespace-separated float rows. Text from `#` to the end of a
/// line is a comment. Blank lines are skipped; every other line must have
/// as many columns as the first.
pub fn parse_table(body: &str) -> Result<Table, TableError> {
    let mut columns = None;
    let mut values = Vec::new();
    for (index, line) in body.lines().enumerate() {
        let line = line.split_once('#').map_or(line, |(data, _)| data);
        let start = values.len();
        for token in line.split_whitespace() {
            let value = token
                .parse::<f64>()
                .map_err(|_| TableError::InvalidNumber {
                    line: index + 1,
                    token: token.to_string(),
                })?;
            values.push(value);
        }
        let found = values.len() - start;
        if found == 0 {
            continue;
        }
        match columns {
            None => columns = Some(found),
            Some(expected) if expected != found => {
                return Err(TableError::Ragged {
                    line: index + 1,
                    expected,
                    found,
                })
            }
            Some(_) => {}
        }
    }
    Ok(Table {
        columns: columns.unwrap_or(0),
        values,
    })
}

/// Split a multi-section reply on its `results_<name>.txt` markers.
///
/// `<br/>` becomes a newline and `&nbsp;` is dropped first. Each section
/// runs from the end of its marker to the start of the next one (or the end
/// of the text) and is trimmed. A later section with a repeated name
/// replaces the earlier text but keeps its position.
pub fn split_sections(raw: &str) -> IndexMap<String, String> {
    let text = raw.replace("<br/>", "\n").replace("&nbsp;", "");
    let markers = find_markers(&text);
    let mut sections = IndexMap::new();
    for (index, marker) in markers.iter().enumerate() {
        let stop = markers
            .get(index + 1)
            .map_or(text.len(), |next| next.span.start);
        sections.insert(
            text[marker.name.clone()].to_string(),
            text[marker.span.end..stop].trim().to_string(),
        );
    }
    sections
}

struct Marker {
    span: Range<usize>,
    name: Range<usize>,
}

/// Non-overlapping markers, left to right. A name is at least one character
/// and stays on the marker's line; it extends to the last `.txt` there.
fn find_markers(text: &str) -> Vec<Marker> {
    let mut markers = Vec::new();
    let mut cursor = 0;
    while let Some(offset) = text[cursor..].find(SECTION_PREFIX) {
        let start = cursor + offset;
        let name_start = start + SECTION_PREFIX.len();
        let line_end = text[name_start..]
            .find('\n')
            .map_or(text.len(), |i| name_start + i);
        match text[name_start..line_end].rfind(SECTION_SUFFIX) {
            Some(name_len) if name_len > 0 => {
                let end = name_start + name_len + SECTION_SUFFIX.len();
                markers.push(Marker {
                    span: start..end,
                    name: name_start..name_start + name_len,
                });
                cursor = end;
            }
            _ => cursor = start + 1,
        }
    }
    markers
}
