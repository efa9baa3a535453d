//! Line tokenizer for the collected commit dump.
//!
//! Sentinels are only recognised when they occupy a whole (trimmed) line, so
//! marker text quoted inside a commit body never changes the scanner state.

pub const REPO_MARKER_OPEN: &str = "=== REPO:";
pub const MARKER_CLOSE: &str = "===";
pub const COMMIT_START: &str = "COMMIT_START";
pub const COMMIT_END: &str = "COMMIT_END";
pub const NO_ACTIVITY: &str = "=== NO ACTIVITY THIS WEEK ===";
pub const NOT_FOUND: &str = "(NOT FOUND)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    RepoMarker(&'a str),
    CommitStart,
    CommitEnd,
    NoActivity,
    Text,
}

impl<'a> Token<'a> {
    pub fn classify(line: &'a str) -> Token<'a> {
        let trimmed = line.trim();
        match trimmed {
            COMMIT_START => Token::CommitStart,
            COMMIT_END => Token::CommitEnd,
            NO_ACTIVITY => Token::NoActivity,
            _ => match repo_name(trimmed) {
                Some(name) => Token::RepoMarker(name),
                None => Token::Text,
            },
        }
    }
}

/// Extracts `<name>` from `=== REPO: <name> ===`. Empty names are malformed.
fn repo_name(trimmed: &str) -> Option<&str> {
    let inner = trimmed
        .strip_prefix(REPO_MARKER_OPEN)?
        .strip_suffix(MARKER_CLOSE)?;
    let name = inner.trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// One input line with its byte span in the source text.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    pub text: &'a str,
    /// Offset of the first byte of the line.
    pub start: usize,
    /// Offset just past the line terminator.
    pub next: usize,
}

impl<'a> Line<'a> {
    pub fn token(&self) -> Token<'a> {
        Token::classify(self.text)
    }
}

pub struct Lines<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lines<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.src.len() {
            return None;
        }
        let start = self.pos;
        let rest = &self.src[start..];
        let (text, next) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], start + idx + 1),
            None => (rest, self.src.len()),
        };
        self.pos = next;
        Some(Line {
            text: text.strip_suffix('\r').unwrap_or(text),
            start,
            next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_sentinels() {
        assert_eq!(Token::classify("=== REPO: web-app ==="), Token::RepoMarker("web-app"));
        assert_eq!(
            Token::classify("  === REPO: MCPs/mcp-base (NOT FOUND) ===  "),
            Token::RepoMarker("MCPs/mcp-base (NOT FOUND)")
        );
        assert_eq!(Token::classify("COMMIT_START"), Token::CommitStart);
        assert_eq!(Token::classify("COMMIT_END\r"), Token::CommitEnd);
        assert_eq!(Token::classify(NO_ACTIVITY), Token::NoActivity);
    }

    #[test]
    fn malformed_or_inline_markers_are_text() {
        assert_eq!(Token::classify("=== REPO:  ==="), Token::Text);
        assert_eq!(Token::classify("=== REPO: web-app"), Token::Text);
        assert_eq!(Token::classify("see COMMIT_END for details"), Token::Text);
        assert_eq!(Token::classify("mentions === REPO: x === inline"), Token::Text);
    }

    #[test]
    fn lines_track_offsets() {
        let src = "a\r\nbc\n\nd";
        let lines: Vec<_> = Lines::new(src).collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].text, "a");
        assert_eq!((lines[1].start, lines[1].next), (3, 6));
        assert_eq!(lines[2].text, "");
        assert_eq!(lines[3].text, "d");
        assert_eq!(lines[3].next, src.len());
    }
}
