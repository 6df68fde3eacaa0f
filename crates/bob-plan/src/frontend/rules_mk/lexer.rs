//! Line classification for `Rules.mk` descriptors.
//!
//! The lexer is stateless: every logical line maps to exactly one
//! [`LineEvent`]. Whether an indented line is a recipe command or something
//! else is the parser's decision.

/// A classified descriptor line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    Blank,
    Comment,
    /// `SUBDIRS := a b`
    SubdirsDecl(Vec<String>),
    /// `KEY := VALUE`, usable as `$(KEY)` further down the file.
    LocalVarDecl { key: String, value: String },
    /// `TARGET: KEY (op) VALUE`
    PerTargetVarDecl { target: String, assignment: String },
    /// `%.SUFFIX: KEY (op) VALUE`
    WildcardVarDecl { suffix: String, assignment: String },
    /// `%.TGTEXT: %.SRCEXT extra deps`
    WildcardRuleDecl {
        target_ext: String,
        source_ext: String,
        extra: Vec<String>,
    },
    /// `TARGET: deps...`
    RecipeHeader { target: String, dependencies: Vec<String> },
    /// An indented line, trimmed. Empty for whitespace-only lines.
    RecipeBody(String),
    Unrecognized(String),
}

/// Characters that can precede `=` in a make assignment operator
/// (`:=`, `::=`, `:::=`, `?=`, `+=`, `!=`).
const OPERATOR_PREFIX: &[char] = &[':', '?', '+', '!'];

const WILDCARD: &str = "%.";

/// A line after continuation joining, with the number of its first
/// physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub number: usize,
    pub text: String,
}

/// Joins lines ending in a single backslash with the line that follows.
pub fn logical_lines(source: &str) -> Vec<LogicalLine> {
    let mut lines = Vec::new();
    let mut pending: Option<LogicalLine> = None;

    for (idx, raw) in source.lines().enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let continued = raw.ends_with('\\') && !raw.ends_with("\\\\");
        let piece = if continued { &raw[..raw.len() - 1] } else { raw };

        let line = match pending.take() {
            Some(mut line) => {
                line.text.push_str(piece);
                line
            }
            None => LogicalLine {
                number: idx + 1,
                text: piece.to_string(),
            },
        };

        if continued {
            pending = Some(line);
        } else {
            lines.push(line);
        }
    }

    lines.extend(pending);
    lines
}

/// Classifies one logical line.
pub fn classify(line: &str) -> LineEvent {
    if line.is_empty() {
        return LineEvent::Blank;
    }
    if line.starts_with(char::is_whitespace) {
        return LineEvent::RecipeBody(line.trim().to_string());
    }
    if line.starts_with('#') {
        return LineEvent::Comment;
    }
    if let Some(subdirs) = subdirs_decl(line) {
        return LineEvent::SubdirsDecl(subdirs);
    }

    let colon = line.find(':');
    if let Some(op_start) = operator_start(line) {
        let key = &line[..op_start];
        if !key.contains(':') {
            return local_var(line, op_start);
        }
    }

    match colon {
        Some(colon) => {
            let head = line[..colon].trim();
            let rest = line[colon + 1..].trim();
            if !is_single_token(head) {
                return LineEvent::Unrecognized(line.to_string());
            }
            if rest.contains('=') {
                target_var(head, rest)
            } else {
                rule_decl(head, rest)
            }
        }
        None => LineEvent::Unrecognized(line.to_string()),
    }
}

fn subdirs_decl(line: &str) -> Option<Vec<String>> {
    let rest = line.strip_prefix("SUBDIRS")?;
    let rest = rest.trim_start();
    let eq = rest.find('=')?;
    if !rest[..eq].chars().all(|c| OPERATOR_PREFIX.contains(&c)) {
        return None;
    }
    Some(rest[eq + 1..].split_whitespace().map(str::to_string).collect())
}

/// Byte offset where the first assignment operator of `line` starts.
fn operator_start(line: &str) -> Option<usize> {
    let eq = line.find('=')?;
    let prefix = line[..eq]
        .chars()
        .rev()
        .take_while(|c| OPERATOR_PREFIX.contains(c))
        .count();
    Some(eq - prefix)
}

fn local_var(line: &str, op_start: usize) -> LineEvent {
    let key = line[..op_start].trim();
    if !is_single_token(key) {
        return LineEvent::Unrecognized(line.to_string());
    }
    let value = line[op_start..]
        .trim_start_matches(OPERATOR_PREFIX)
        .trim_start_matches('=')
        .trim();
    LineEvent::LocalVarDecl {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn target_var(head: &str, assignment: &str) -> LineEvent {
    match head.strip_prefix(WILDCARD) {
        Some(suffix) if !suffix.is_empty() => LineEvent::WildcardVarDecl {
            suffix: suffix.to_ascii_uppercase(),
            assignment: assignment.to_string(),
        },
        _ => LineEvent::PerTargetVarDecl {
            target: head.to_string(),
            assignment: assignment.to_string(),
        },
    }
}

fn rule_decl(head: &str, rest: &str) -> LineEvent {
    let mut tokens: Vec<String> = rest.split_whitespace().map(str::to_string).collect();

    if let Some(target_ext) = head.strip_prefix(WILDCARD) {
        let source_ext = tokens
            .first()
            .and_then(|first| first.strip_prefix(WILDCARD))
            .map(str::to_ascii_uppercase);
        return match source_ext {
            Some(source_ext) if !target_ext.is_empty() && !source_ext.is_empty() => {
                tokens.remove(0);
                LineEvent::WildcardRuleDecl {
                    target_ext: target_ext.to_ascii_uppercase(),
                    source_ext,
                    extra: tokens,
                }
            }
            _ => LineEvent::Unrecognized(format!("{}: {}", head, rest)),
        };
    }

    LineEvent::RecipeHeader {
        target: head.to_string(),
        dependencies: tokens,
    }
}

fn is_single_token(text: &str) -> bool {
    !text.is_empty() && !text.contains(char::is_whitespace)
}
