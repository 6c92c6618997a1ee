use crate::parse::{classify_line, Line, ParseError};

/// Staged byte-level edit of one map file's raw content.
///
/// The edit changes exactly one project's tag field and leaves every other
/// byte (comments, whitespace, entry order, opaque trailing fields)
/// untouched. Documents are transient: build one per update request, write
/// out [`contents`](Self::contents) if [`is_changed`](Self::is_changed),
/// then discard it.
#[derive(Debug)]
pub struct MapContentDocument {
    original: Vec<u8>,
    updated: Option<Vec<u8>>,
}

impl MapContentDocument {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            original: content.into(),
            updated: None,
        }
    }

    /// Stage a replacement of `project_id`'s tag with `new_tag`.
    ///
    /// No change is staged when the project is not listed or its tag
    /// already equals `new_tag`. Idempotent: repeating a call with the same
    /// arguments yields the same staged result as a single call.
    pub fn update_tag(&mut self, project_id: &str, new_tag: &str) -> Result<(), ParseError> {
        let current = self.current();
        let text = std::str::from_utf8(current).map_err(|_| ParseError::NotUtf8)?;

        let mut offset = 0usize;
        for (idx, raw) in text.split_inclusive('\n').enumerate() {
            let line = raw.trim_end_matches(['\n', '\r']);
            if let Line::Entry {
                project_id: found,
                tag,
                tag_span,
            } = classify_line(line, idx + 1)?
            {
                if found == project_id {
                    if tag == new_tag {
                        return Ok(());
                    }
                    let mut next =
                        Vec::with_capacity(current.len() - tag.len() + new_tag.len());
                    next.extend_from_slice(&current[..offset + tag_span.start]);
                    next.extend_from_slice(new_tag.as_bytes());
                    next.extend_from_slice(&current[offset + tag_span.end..]);
                    self.updated = Some(next);
                    return Ok(());
                }
            }
            offset += raw.len();
        }
        Ok(())
    }

    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.updated.is_some()
    }

    /// The updated content if changed, else the original content unchanged.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        self.current()
    }

    #[must_use]
    pub fn into_contents(self) -> Vec<u8> {
        self.updated.unwrap_or(self.original)
    }

    fn current(&self) -> &[u8] {
        self.updated.as_deref().unwrap_or(&self.original)
    }
}
