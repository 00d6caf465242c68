//! Source Comments
//!
//! Comments are not part of the token stream the visitor walks; they
//! are handed to the builder in batches between tokens, along with
//! enough source-position metadata to reproduce their placement.

/// A comment lifted from the original source text.
#[derive(Clone, Debug)]
pub struct SourceComment {
    /// The comment text, including its `//` or `/* */` delimiters.
    pub text: String,

    /// Number of newlines between the preceding token (or comment)
    /// and this comment.
    pub lines_before: usize,

    /// Whether this is a `//` comment (runs to end of line).
    pub is_line_comment: bool,

    /// Whether the comment started at column 0 in the source.
    ///
    /// Flush-left comments stay at column 0 in the output (commented-out
    /// code blocks, license headers mid-file).
    pub flush_left: bool,

    /// Selection-start offset within `text`, if the editor selection
    /// begins inside this comment.
    pub selection_start: Option<usize>,

    /// Selection-end offset within `text`.
    pub selection_end: Option<usize>,
}

impl SourceComment {
    /// A line comment with no special placement.
    pub fn line(text: impl Into<String>, lines_before: usize) -> Self {
        Self {
            text: text.into(),
            lines_before,
            is_line_comment: true,
            flush_left: false,
            selection_start: None,
            selection_end: None,
        }
    }

    /// A block comment with no special placement.
    pub fn block(text: impl Into<String>, lines_before: usize) -> Self {
        Self {
            text: text.into(),
            lines_before,
            is_line_comment: false,
            flush_left: false,
            selection_start: None,
            selection_end: None,
        }
    }

    /// Whether this comment can sit in the middle of a line: a block
    /// comment with no newlines before it or inside it.
    pub fn is_inline(&self) -> bool {
        !self.is_line_comment && self.lines_before == 0 && !self.is_multiline()
    }

    /// Whether the comment text spans multiple lines.
    pub fn is_multiline(&self) -> bool {
        self.text.contains('\n')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_is_a_same_line_single_line_block_comment() {
        assert!(SourceComment::block("/* ok */", 0).is_inline());
        assert!(!SourceComment::block("/* ok */", 1).is_inline());
        assert!(!SourceComment::block("/* a\nb */", 0).is_inline());
        assert!(!SourceComment::line("// ok", 0).is_inline());
    }

    #[test]
    fn multiline_detection() {
        assert!(SourceComment::block("/*\n*/", 2).is_multiline());
        assert!(!SourceComment::line("// one line", 0).is_multiline());
    }
}
