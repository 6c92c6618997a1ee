use crate::entry::MapEntry;
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("map content is not valid UTF-8")]
    NotUtf8,

    #[error("line {line}: missing '=' separator")]
    MissingSeparator { line: usize },

    #[error("line {line}: empty project identifier")]
    EmptyProject { line: usize },

    #[error("line {line}: empty tag")]
    EmptyTag { line: usize },
}

/// A classified line of map content.
#[derive(Debug)]
pub(crate) enum Line<'a> {
    Ignored,
    Entry {
        project_id: &'a str,
        tag: &'a str,
        /// Byte span of the tag within the line.
        tag_span: Range<usize>,
    },
}

/// Classify a single line. `line` excludes any trailing newline bytes.
///
/// Entry lines have the shape `project=tag[,opaque-rest]`. Blank lines and
/// lines starting with `#` or `!` carry no entry.
pub(crate) fn classify_line(line: &str, line_no: usize) -> Result<Line<'_>, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
        return Ok(Line::Ignored);
    }

    let Some(eq) = line.find('=') else {
        return Err(ParseError::MissingSeparator { line: line_no });
    };

    let project_id = line[..eq].trim();
    if project_id.is_empty() {
        return Err(ParseError::EmptyProject { line: line_no });
    }

    let rest_start = eq + 1;
    let rest = &line[rest_start..];
    let tag_len = rest.find(',').unwrap_or(rest.len());
    let raw_span = rest_start..rest_start + tag_len;
    let tag_span = trim_span(line, raw_span);
    let tag = &line[tag_span.clone()];
    if tag.is_empty() {
        return Err(ParseError::EmptyTag { line: line_no });
    }

    Ok(Line::Entry {
        project_id,
        tag,
        tag_span,
    })
}

/// Shrink a byte span to exclude surrounding ASCII whitespace.
fn trim_span(text: &str, span: Range<usize>) -> Range<usize> {
    let slice = &text[span.clone()];
    let start = span.start + (slice.len() - slice.trim_start().len());
    let end = span.end - (slice.len() - slice.trim_end().len());
    if start > end {
        span.start..span.start
    } else {
        start..end
    }
}

/// Parse full map content into its ordered entry sequence.
pub fn parse_entries(content: &[u8]) -> Result<Vec<MapEntry>, ParseError> {
    let text = std::str::from_utf8(content).map_err(|_| ParseError::NotUtf8)?;
    let mut entries = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        match classify_line(line, idx + 1)? {
            Line::Ignored => {}
            Line::Entry {
                project_id, tag, ..
            } => entries.push(MapEntry::new(project_id, tag)),
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::{parse_entries, ParseError};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_entries_and_skips_comments() {
        let content = b"# release map\n\norg.example.core=v1,extra,fields\n!disabled\norg.example.ui = v2 \n";
        let entries = parse_entries(content).expect("parse");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].project_id(), "org.example.core");
        assert_eq!(entries[0].tag(), "v1");
        assert_eq!(entries[1].project_id(), "org.example.ui");
        assert_eq!(entries[1].tag(), "v2");
    }

    #[test]
    fn rejects_missing_separator() {
        let err = parse_entries(b"org.example.core v1\n").unwrap_err();
        assert_eq!(err, ParseError::MissingSeparator { line: 1 });
    }

    #[test]
    fn rejects_empty_fields() {
        assert_eq!(
            parse_entries(b"=v1\n").unwrap_err(),
            ParseError::EmptyProject { line: 1 }
        );
        assert_eq!(
            parse_entries(b"org.example.core=,rest\n").unwrap_err(),
            ParseError::EmptyTag { line: 1 }
        );
    }

    #[test]
    fn rejects_non_utf8() {
        assert_eq!(
            parse_entries(&[0x61, 0xff, 0x3d, 0x62]).unwrap_err(),
            ParseError::NotUtf8
        );
    }
}
