//! Member text embedded in a source file's metadata comment block:
//!
//! ```text
//!      * %METADATA                                                      *
//!      * %TEXT Work with article                                        *
//!      * %EMETADATA                                                     *
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::diagnostic::PlanError;
use crate::naming;

/// Number of leading lines searched for the metadata block.
pub const MEMBER_TEXT_LINES: usize = 15;

/// Lines read from a source: a header on the last searched line still gets
/// its full window for `%TEXT`.
const HEAD_LINES: usize = 2 * MEMBER_TEXT_LINES - 1;

const METADATA_HEADER: &str = "%METADATA";
const METADATA_FOOTER: &str = "%EMETADATA";
const TEXT_HEADER: &str = "%TEXT";

/// Comment convention of a source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `/* ... */`
    C,
    /// `-- ...`
    Sql,
    /// Column-7 `*` comments of fixed-form RPG, COBOL and DDS.
    FixedForm,
    /// `// ...` in `**FREE` RPG.
    FreeForm,
    /// `.* ...` in panel and menu source.
    Panel,
}

impl CommentStyle {
    /// The style for a source extension. Fixed-form languages switch to
    /// free-form when the first line carries the `FREE` directive.
    pub fn for_source(extension: &str, first_line: &str) -> Option<Self> {
        let style = match extension.to_ascii_uppercase().as_str() {
            "CMD" | "CMDSRC" | "C" | "CPP" | "CLLE" | "CLP" | "SQLC" | "SQLCPP" | "PGM.C"
            | "PGM.CLLE" | "BND" | "ILESRVPGM" | "BNDDIR" | "DTAARA" | "SYSTRG" | "MSGF" => {
                CommentStyle::C
            }
            "TABLE" | "PFSQL" | "VIEW" | "SQLUDT" | "SQLALIAS" | "SQLSEQ" | "SQLPRC" | "SQLTRG"
            | "SQLUDF" | "SQL" | "INDEX" => CommentStyle::Sql,
            "DSPF" | "LF" | "PF" | "PRTF" | "RPGLE" | "SQLRPGLE" | "CBLLE" | "SQLCBLLE"
            | "PGM.RPGLE" | "PGM.SQLRPGLE" | "CBL" | "PGM.CBLLE" | "PGM.SQLCBLLE" | "RPG" => {
                if first_line.to_ascii_uppercase().contains("FREE") {
                    CommentStyle::FreeForm
                } else {
                    CommentStyle::FixedForm
                }
            }
            "PNLGRPSRC" | "MENUSRC" => CommentStyle::Panel,
            _ => return None,
        };
        Some(style)
    }

    /// Marker a comment line of this style may end with.
    pub fn end_marker(self) -> &'static str {
        match self {
            CommentStyle::C => "*/",
            CommentStyle::Sql
            | CommentStyle::FixedForm
            | CommentStyle::FreeForm
            | CommentStyle::Panel => "*",
        }
    }
}

/// Reads the member text of `path`, if its first lines carry a metadata
/// block with a `%TEXT` entry.
pub fn find_member_text(path: &Path) -> Result<Option<String>, PlanError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = match naming::decompose(&file_name) {
        Ok(descriptor) => descriptor.extension,
        Err(_) => return Ok(None),
    };

    let content = read_head(path).map_err(|e| PlanError::io(path, e.to_string()))?;
    Ok(extract(&content, &extension))
}

/// The first [`HEAD_LINES`] lines of a file, decoded lossily.
fn read_head(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut content = String::new();
    let mut line = Vec::new();
    for _ in 0..HEAD_LINES {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        content.push_str(&String::from_utf8_lossy(&line));
    }
    Ok(content)
}

/// Extracts the member text from source content.
pub fn extract(content: &str, extension: &str) -> Option<String> {
    let lines: Vec<&str> = content.lines().collect();
    let style = CommentStyle::for_source(extension, lines.first().copied().unwrap_or(""))?;

    let metadata = lines
        .iter()
        .take(MEMBER_TEXT_LINES)
        .position(|line| contains_keyword(line, METADATA_HEADER))?;

    for line in lines.iter().skip(metadata + 1).take(MEMBER_TEXT_LINES - 1) {
        if contains_keyword(line, METADATA_FOOTER) {
            return None;
        }
        if let Some(pos) = line.to_ascii_uppercase().find(TEXT_HEADER) {
            let text = line[pos + TEXT_HEADER.len()..]
                .trim()
                .trim_end_matches(style.end_marker())
                .trim_end();
            return (!text.is_empty()).then(|| text.to_string());
        }
    }
    None
}

fn contains_keyword(line: &str, keyword: &str) -> bool {
    line.to_ascii_uppercase().contains(keyword)
}
