//! Formatting Configuration
//!
//! Knobs the enclosing formatter hands to the layout engine. The engine
//! itself never reads files or flags; it only consumes this struct.

/// Default maximum line width before breaking.
pub const DEFAULT_PAGE_WIDTH: usize = 80;

/// Spaces per indentation level.
pub const INDENT_SIZE: usize = 2;

/// Cost weights used by the line splitter.
pub mod cost {
    /// Cost of a normal rule or span split.
    pub const NORMAL: usize = 1;

    /// Cost per character that overflows the page width.
    ///
    /// High enough that any layout which fits always beats any layout
    /// which does not, while overflowing layouts still rank against
    /// each other by how far they overflow.
    pub const OVERFLOW_CHAR: usize = 10_000;
}

/// Configuration for a single formatting operation.
#[derive(Clone, Debug)]
pub struct FormatConfig {
    /// Target column limit.
    pub page_width: usize,

    /// Leading indentation of the output, in spaces.
    pub indent: usize,

    /// Spaces added per statement indentation level.
    pub indent_size: usize,

    /// Whether the input is a whole compilation unit.
    ///
    /// Compilation units end with exactly one trailing newline;
    /// fragments (single statements) end without one.
    pub is_compilation_unit: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            page_width: DEFAULT_PAGE_WIDTH,
            indent: 0,
            indent_size: INDENT_SIZE,
            is_compilation_unit: true,
        }
    }
}

impl FormatConfig {
    /// Config for formatting a lone statement at the given indent.
    pub fn statement(indent: usize) -> Self {
        Self {
            indent,
            is_compilation_unit: false,
            ..Self::default()
        }
    }
}
