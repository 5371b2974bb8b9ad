//! Markdown authoring syntax for edit batches.
//!
//! ```text
//! ## Metadata
//! - **Version**: 1
//! - **Source**: reviewer-a
//!
//! ## Edits
//! | Block | Op | Diff | Note |
//! |---|---|---|---|
//! | b00003 | replace | true | tighten wording |
//!
//! ## Text
//! ### b00003 newText
//! The replacement paragraph.
//! ```
//!
//! Only the three `##` section headings and `### <id> <kind>` lines inside
//! `## Text` are boundaries. Everything between two boundaries is payload,
//! whatever it looks like.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::fmt::Write as _;

use crate::schema::{BATCH_VERSION, EditBatch, EditRecord, Operation, normalize_ref};

/// A record (or line) the parser could not turn into an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based source line.
    pub line: usize,
    pub block_id: Option<String>,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.block_id {
            Some(id) => write!(f, "line {}: {}: {}", self.line, id, self.message),
            None => write!(f, "line {}: {}", self.line, self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse result. `batch` holds every record that parsed; `errors` every one
/// that did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub batch: EditBatch,
    pub errors: Vec<ParseError>,
    pub warnings: Vec<String>,
}

impl Parsed {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TextKind {
    NewText,
    InsertText,
    CommentText,
}

impl TextKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "newtext" => Some(TextKind::NewText),
            "inserttext" => Some(TextKind::InsertText),
            "commenttext" => Some(TextKind::CommentText),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            TextKind::NewText => "newText",
            TextKind::InsertText => "insertText",
            TextKind::CommentText => "commentText",
        }
    }

    fn for_op(op: Operation) -> Option<Self> {
        match op {
            Operation::Replace => Some(TextKind::NewText),
            Operation::Insert => Some(TextKind::InsertText),
            Operation::Comment => Some(TextKind::CommentText),
            Operation::Delete => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Metadata,
    Edits,
    Text,
}

fn section_heading(line: &str) -> Option<Section> {
    let rest = line.trim().strip_prefix("##")?;
    if rest.starts_with('#') {
        return None;
    }
    match rest.trim().to_ascii_lowercase().as_str() {
        "metadata" => Some(Section::Metadata),
        "edits" => Some(Section::Edits),
        "text" => Some(Section::Text),
        _ => None,
    }
}

fn text_heading(line: &str) -> Option<(String, TextKind)> {
    let rest = line.trim().strip_prefix("###")?;
    if rest.starts_with('#') {
        return None;
    }
    let mut parts = rest.split_whitespace();
    let id = parts.next()?;
    let kind = TextKind::parse(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((normalize_ref(id), kind))
}

struct Row {
    line: usize,
    block_id: String,
    op: Operation,
    diff: Option<bool>,
    note: Option<String>,
}

struct TextSection {
    line: usize,
    body: String,
}

type SectionKey = (String, TextKind);

pub fn parse_markdown(src: &str) -> Parsed {
    let mut batch = EditBatch::new("");
    let mut version = None;
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let mut rows: Vec<Row> = Vec::new();
    let mut sections: BTreeMap<SectionKey, VecDeque<TextSection>> = BTreeMap::new();
    let mut open: Option<(SectionKey, usize, Vec<&str>)> = None;
    let mut current = Section::Preamble;

    let mut close = |open: &mut Option<(SectionKey, usize, Vec<&str>)>| {
        if let Some((key, line, lines)) = open.take() {
            sections.entry(key).or_default().push_back(TextSection {
                line,
                body: trim_blank_lines(&lines),
            });
        }
    };

    for (n, line) in src.lines().enumerate() {
        let line_no = n + 1;

        if let Some(section) = section_heading(line) {
            close(&mut open);
            current = section;
            continue;
        }

        match current {
            Section::Preamble => {}
            Section::Metadata => {
                if let Err(message) = metadata_line(line, &mut batch, &mut version) {
                    errors.push(ParseError {
                        line: line_no,
                        block_id: None,
                        message,
                    });
                }
            }
            Section::Edits => match table_row(line) {
                TableLine::NotARow | TableLine::Header => {}
                TableLine::Row(cells) => match row_from_cells(line_no, &cells) {
                    Ok(row) => rows.push(row),
                    Err(err) => errors.push(err),
                },
            },
            Section::Text => {
                if let Some(key) = text_heading(line) {
                    close(&mut open);
                    open = Some((key, line_no, Vec::new()));
                } else if let Some((_, _, lines)) = open.as_mut() {
                    lines.push(line);
                }
            }
        }
    }
    close(&mut open);

    batch.v = version.unwrap_or(BATCH_VERSION);

    for row in rows {
        let key = normalize_ref(&row.block_id);
        let text = match TextKind::for_op(row.op) {
            None => None,
            Some(kind) => sections
                .get_mut(&(key.clone(), kind))
                .and_then(VecDeque::pop_front)
                .map(|s| s.body),
        };

        let mut note = row.note;
        let text = match (row.op, text) {
            (Operation::Delete, _) => None,
            (_, Some(text)) => Some(text),
            (Operation::Comment, None) if note.is_some() => note.take(),
            (op, None) => {
                let kind = TextKind::for_op(op).map(TextKind::as_str).unwrap_or_default();
                errors.push(ParseError {
                    line: row.line,
                    block_id: Some(row.block_id.clone()),
                    message: format!("{op} row has no `### {key} {kind}` section"),
                });
                continue;
            }
        };

        batch.edits.push(EditRecord {
            op: row.op,
            block_id: row.block_id,
            text,
            diff: row.diff,
            note,
        });
    }

    for ((id, kind), rest) in sections {
        for section in rest {
            warnings.push(format!(
                "line {}: `### {id} {}` section is not used by any edit row",
                section.line,
                kind.as_str()
            ));
        }
    }

    errors.sort_by_key(|e| e.line);
    tracing::debug!(
        records = batch.edits.len(),
        errors = errors.len(),
        warnings = warnings.len(),
        "parsed markdown edit batch"
    );
    Parsed {
        batch,
        errors,
        warnings,
    }
}

fn trim_blank_lines(lines: &[&str]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(s), Some(e)) => lines[s..=e].join("\n"),
        _ => String::new(),
    }
}

fn metadata_line(line: &str, batch: &mut EditBatch, version: &mut Option<u32>) -> Result<(), String> {
    let item = line.trim();
    let Some(item) = item.strip_prefix('-').or_else(|| item.strip_prefix('*')) else {
        return Ok(());
    };
    let Some((key, value)) = item.split_once(':') else {
        return Ok(());
    };
    let key = key.replace("**", "");
    let value = value.trim().trim_matches('`').trim();

    match key.trim().to_ascii_lowercase().as_str() {
        "version" => {
            let v = value
                .parse::<u32>()
                .map_err(|_| format!("invalid version '{value}'"))?;
            *version = Some(v);
        }
        "source" => batch.source = value.to_string(),
        "fingerprint" if !value.is_empty() => batch.fingerprint = Some(value.to_string()),
        _ => {}
    }
    Ok(())
}

enum TableLine {
    NotARow,
    Header,
    Row(Vec<String>),
}

fn table_row(line: &str) -> TableLine {
    let trimmed = line.trim();
    if !trimmed.starts_with('|') {
        return TableLine::NotARow;
    }
    let cells = split_cells(trimmed);
    let is_rule = cells
        .iter()
        .all(|c| !c.is_empty() && c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')));
    let is_header = cells
        .first()
        .is_some_and(|c| c.eq_ignore_ascii_case("block"));
    if is_rule || is_header {
        TableLine::Header
    } else {
        TableLine::Row(cells)
    }
}

/// Split `| a | b \| c |` into trimmed, unescaped cells.
fn split_cells(line: &str) -> Vec<String> {
    let inner = line.strip_prefix('|').unwrap_or(line);
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                cell.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut cell).trim().to_string()),
            _ => cell.push(c),
        }
    }
    if !cell.trim().is_empty() {
        cells.push(cell.trim().to_string());
    }
    cells
}

fn row_from_cells(line: usize, cells: &[String]) -> Result<Row, ParseError> {
    let err = |block_id: Option<&str>, message: String| ParseError {
        line,
        block_id: block_id.map(str::to_string),
        message,
    };

    let block_id = cells
        .first()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| err(None, "edit row has no block id".to_string()))?;
    let op_cell = cells
        .get(1)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| err(Some(block_id), "edit row has no operation".to_string()))?;
    let op = op_cell
        .parse::<Operation>()
        .map_err(|message| err(Some(block_id), message))?;

    let diff = match cells.get(2).map(|c| c.to_ascii_lowercase()) {
        None => None,
        Some(c) if c.is_empty() => None,
        Some(c) => match c.as_str() {
            "true" | "yes" | "y" => Some(true),
            "false" | "no" | "n" => Some(false),
            other => return Err(err(Some(block_id), format!("invalid diff value '{other}'"))),
        },
    };

    let note = cells
        .get(3)
        .filter(|c| !c.is_empty())
        .cloned();

    Ok(Row {
        line,
        block_id: block_id.clone(),
        op,
        diff,
        note,
    })
}

fn escape_cell(text: &str) -> String {
    text.split(['\r', '\n'])
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

/// Render a batch in the authoring syntax.
pub fn to_markdown(batch: &EditBatch) -> String {
    let mut out = String::new();

    out.push_str("## Metadata\n");
    let _ = writeln!(out, "- **Version**: {}", batch.v);
    let _ = writeln!(out, "- **Source**: {}", batch.source);
    if let Some(fp) = &batch.fingerprint {
        let _ = writeln!(out, "- **Fingerprint**: {fp}");
    }

    out.push_str("\n## Edits\n");
    out.push_str("| Block | Op | Diff | Note |\n");
    out.push_str("|---|---|---|---|\n");
    for rec in &batch.edits {
        let diff = rec.diff.map(|d| d.to_string()).unwrap_or_default();
        let note = rec.note.as_deref().map(escape_cell).unwrap_or_default();
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            escape_cell(&rec.block_id),
            rec.op,
            diff,
            note
        );
    }

    out.push_str("\n## Text\n");
    for rec in &batch.edits {
        let (Some(kind), Some(text)) = (TextKind::for_op(rec.op), rec.text.as_deref()) else {
            continue;
        };
        let _ = writeln!(out, "### {} {}", rec.block_id.trim(), kind.as_str());
        out.push_str(text);
        out.push_str("\n\n");
    }

    out
}
