//! Turns YAML and schema failures into located diagnostics.
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_saphyr::{Error as YamlError, Location};
use thiserror::Error;

const YAML_HINTS: [(&str, &str); 4] = [
    (
        "did not find expected '-'",
        "Start list items with '-' and ensure proper indentation.",
    ),
    (
        "mapping values are not allowed",
        "Check for a stray ':' or quote values containing one, such as `$dst/a:b`.",
    ),
    (
        "found character that cannot start any token",
        "Remove stray characters and ensure indentation uses spaces (no tabs).",
    ),
    (
        "unknown variant",
        "Each `build` step is a single-key map naming a builder operation, e.g. `- compile: {...}`.",
    ),
];

fn saturating_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

fn location_to_index(src: &str, loc: Location) -> usize {
    let target_line = saturating_usize(loc.line().saturating_sub(1));
    let target_column = saturating_usize(loc.column().saturating_sub(1));
    let mut offset = 0usize;
    for (idx, segment) in src.split_inclusive('\n').enumerate() {
        if idx == target_line {
            let line = segment.strip_suffix('\n').unwrap_or(segment);
            let byte_index = line
                .char_indices()
                .nth(target_column)
                .map_or(line.len(), |(byte_idx, _)| byte_idx);
            return offset + byte_index;
        }
        offset += segment.len();
    }
    src.len()
}

fn to_span(src: &str, loc: Location) -> SourceSpan {
    let at = location_to_index(src, loc);
    let len = usize::from(src.as_bytes().get(at).is_some_and(|b| *b != b'\n'));
    SourceSpan::new(at.into(), len)
}

fn has_tab_indent(src: &str, loc: Option<Location>) -> bool {
    let Some(loc) = loc else { return false };
    let line_idx = saturating_usize(loc.line().saturating_sub(1));
    src.lines().nth(line_idx).is_some_and(|line| {
        line.chars()
            .take_while(|c| c.is_whitespace())
            .any(|c| c == '\t')
    })
}

fn hint_for(message: &str) -> Option<String> {
    let lower = message.to_lowercase();
    YAML_HINTS
        .iter()
        .find(|(needle, _)| lower.contains(*needle))
        .map(|(_, hint)| (*hint).to_owned())
}

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(kumiki::yaml::parse))]
struct YamlDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("parse error here")]
    span: Option<SourceSpan>,
    #[help]
    help: Option<String>,
    #[source]
    source: YamlError,
    message: String,
}

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(kumiki::yaml::schema))]
struct SchemaDiagnostic {
    #[help]
    help: Option<String>,
    #[source]
    source: serde_json::Error,
    message: String,
}

/// Wrap a YAML syntax error with the unit's source and the failing location.
pub(super) fn yaml_error(
    err: YamlError,
    src: &str,
    name: &str,
) -> Box<dyn Diagnostic + Send + Sync + 'static> {
    let loc = err.location();
    let (line, col, span) = loc.map_or((1, 1, None), |l| {
        (l.line(), l.column(), Some(to_span(src, l)))
    });
    let text = err.to_string();
    let help = if has_tab_indent(src, loc) {
        Some("Use spaces for indentation; tabs are invalid in YAML.".to_owned())
    } else {
        hint_for(&text)
    };
    Box::new(YamlDiagnostic {
        src: NamedSource::new(name, src.to_owned()),
        span,
        help,
        source: err,
        message: format!("YAML parse error at line {line}, column {col}: {text}"),
    })
}

/// Wrap a schema mismatch found after the YAML itself parsed.
pub(super) fn schema_error(
    err: serde_json::Error,
    name: &str,
) -> Box<dyn Diagnostic + Send + Sync + 'static> {
    let text = err.to_string();
    Box::new(SchemaDiagnostic {
        help: hint_for(&text),
        message: format!("unit structure error in {name}: {text}"),
        source: err,
    })
}
