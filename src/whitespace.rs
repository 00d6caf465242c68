//! Pending Whitespace
//!
//! Whitespace between tokens is not written eagerly. The builder
//! records what *kind* of gap the visitor asked for and realizes it
//! right before the next token, which lets later events (comments,
//! splits, blank-line absorption) adjust the gap first.
//!
//! Two states are ambiguous: the visitor does not yet know whether the
//! source had a newline there. They must be resolved with
//! [`Whitespace::resolve`] (driven by `preserve_newlines`) before the
//! gap can be emitted.

/// A deferred whitespace gap between two tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Whitespace {
    /// No whitespace.
    None,

    /// A single space.
    Space,

    /// A newline at statement (block) nesting.
    Newline,

    /// A newline that keeps the current expression nesting.
    NestedNewline,

    /// A newline whose next line starts at column 0.
    NewlineFlushLeft,

    /// A newline plus a preserved blank line.
    TwoNewlines,

    /// Either a space or a newline, depending on the source.
    ///
    /// Ambiguous: must be resolved before emission.
    SpaceOrNewline,

    /// Either one newline or a blank line, depending on the source.
    ///
    /// Ambiguous: must be resolved before emission.
    OneOrTwoNewlines,
}

impl Whitespace {
    /// Minimum number of newlines this gap will produce.
    pub fn minimum_lines(self) -> usize {
        match self {
            Whitespace::Newline
            | Whitespace::NestedNewline
            | Whitespace::NewlineFlushLeft
            | Whitespace::OneOrTwoNewlines => 1,
            Whitespace::TwoNewlines => 2,
            Whitespace::None | Whitespace::Space | Whitespace::SpaceOrNewline => 0,
        }
    }

    /// Whether this gap still depends on the source line count.
    pub fn is_ambiguous(self) -> bool {
        matches!(
            self,
            Whitespace::SpaceOrNewline | Whitespace::OneOrTwoNewlines
        )
    }

    /// Resolve an ambiguous gap given the number of newlines the
    /// source had at this position. Unambiguous gaps are unchanged.
    #[must_use]
    pub fn resolve(self, source_newlines: usize) -> Whitespace {
        match self {
            Whitespace::SpaceOrNewline => {
                if source_newlines > 0 {
                    // The split stays inside the surrounding expression,
                    // so the newline keeps its nesting.
                    Whitespace::NestedNewline
                } else {
                    Whitespace::Space
                }
            }
            Whitespace::OneOrTwoNewlines => {
                if source_newlines > 1 {
                    Whitespace::TwoNewlines
                } else {
                    Whitespace::Newline
                }
            }
            other => other,
        }
    }
}
