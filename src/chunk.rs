//! Chunks and Spans
//!
//! A [`Chunk`] is the atomic unit of output: a run of token text
//! followed by a potential split point. The builder produces a flat
//! vector of chunks (with nested vectors for child blocks) and the
//! line writer decides which splits actually fire.
//!
//! A [`Span`] is a cost bearer covering a contiguous run of chunks;
//! its cost is charged once if any covered split fires. Spans are
//! stored in an arena and chunks carry the ids of the spans covering
//! them, so the charge check is a walk over fired chunks rather than
//! a range query.

use smallvec::SmallVec;

use crate::nesting::NestingId;
use crate::rule::RuleId;

/// Handle to a [`Span`] in the engine's span arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpanId(pub(crate) u32);

/// A cost applied if any split covered by the span fires.
#[derive(Clone, Copy, Debug)]
pub struct Span {
    pub cost: usize,
}

/// Everything a chunk knows about its split point.
#[derive(Clone, Debug)]
pub struct SplitInfo {
    /// The rule that decides whether this split fires.
    pub rule: RuleId,

    /// Statement-level indentation of the next line, in spaces.
    pub indent: usize,

    /// Expression-nesting context of the split. The root id means the
    /// split is at block level.
    pub nesting: NestingId,

    /// When true, the next line starts at column 0 regardless of
    /// indent and nesting.
    pub flush_left: bool,

    /// Tri-state blank-line request: `None` = not yet known,
    /// `Some(false)` = single newline, `Some(true)` = blank line.
    pub is_double: Option<bool>,

    /// When the rule chooses not to split here, emit a space instead
    /// of nothing.
    pub space_when_unsplit: bool,
}

/// An atomic unit of output text terminated by a potential split.
#[derive(Clone, Debug, Default)]
pub struct Chunk {
    text: String,
    split: Option<SplitInfo>,

    /// Closed once a split is applied or a block is attached. Trailing
    /// comments may re-open it to adhere to the text before the split.
    can_add_text: bool,

    /// Spans covering this chunk.
    pub spans: SmallVec<[SpanId; 2]>,

    /// Child block chunks; non-empty makes this chunk a block parent.
    block: Vec<Chunk>,

    /// Leading indentation of the block's first line, in spaces.
    block_indent: usize,

    /// Total text length of `block` when nothing inside it splits.
    unsplit_block_length: usize,

    /// The solver may cut the problem after this chunk.
    pub can_divide: bool,

    /// Selection offsets into `text`.
    pub selection_start: Option<usize>,
    pub selection_end: Option<usize>,
}

impl Chunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            can_add_text: true,
            ..Self::default()
        }
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn split(&self) -> Option<&SplitInfo> {
        self.split.as_ref()
    }

    #[inline]
    pub fn can_add_text(&self) -> bool {
        self.can_add_text
    }

    /// Length of `text` before appending, for selection bookkeeping.
    pub fn append_text(&mut self, text: &str) -> usize {
        assert!(
            self.can_add_text,
            "appended text to a chunk that already ended"
        );
        let offset = self.text.len();
        self.text.push_str(text);
        offset
    }

    /// Re-open the chunk so a trailing comment can adhere to it.
    pub fn allow_text(&mut self) {
        self.can_add_text = true;
    }

    /// Install the split, closing the chunk to further text.
    ///
    /// Callers are responsible for the hard-split-wins policy: a chunk
    /// whose existing split is hard takes [`Chunk::merge_hard_split`]
    /// instead of calling this.
    pub fn set_split(&mut self, split: SplitInfo) {
        self.can_add_text = false;
        self.split = Some(split);
    }

    /// Fold a later split request into an existing hard split, which
    /// always wins: the blank-line and flush-left requests can only be
    /// promoted, and the chunk closes to text again.
    pub fn merge_hard_split(&mut self, is_double: Option<bool>, flush_left: bool) {
        self.can_add_text = false;
        if let Some(split) = self.split.as_mut() {
            if is_double == Some(true) {
                split.is_double = Some(true);
            } else if split.is_double.is_none() {
                split.is_double = is_double;
            }
            split.flush_left |= flush_left;
        }
    }

    /// Ask the split to render as a space when it does not fire. Used
    /// when a pending space lands on an already-ended chunk.
    pub fn set_space_when_unsplit(&mut self, space: bool) {
        if let Some(split) = self.split.as_mut() {
            split.space_when_unsplit = space;
        }
    }

    #[inline]
    pub fn is_block_parent(&self) -> bool {
        !self.block.is_empty()
    }

    #[inline]
    pub fn block(&self) -> &[Chunk] {
        &self.block
    }

    #[inline]
    pub(crate) fn block_mut(&mut self) -> &mut [Chunk] {
        &mut self.block
    }

    #[inline]
    pub fn block_indent(&self) -> usize {
        self.block_indent
    }

    #[inline]
    pub fn unsplit_block_length(&self) -> usize {
        self.unsplit_block_length
    }

    /// Attach a finished child block. Closes the chunk to text: output
    /// order is text, then block, then split.
    pub fn set_block(&mut self, chunks: Vec<Chunk>, block_indent: usize) {
        assert!(self.block.is_empty(), "chunk already has a block");
        self.unsplit_block_length = unsplit_length(&chunks);
        self.block = chunks;
        self.block_indent = block_indent;
        self.can_add_text = false;
    }

    pub fn mark_selection_start(&mut self, offset: usize) {
        self.selection_start = Some(offset);
    }

    pub fn mark_selection_end(&mut self, offset: usize) {
        self.selection_end = Some(offset);
    }
}

/// Total output length of `chunks` when no split inside them fires:
/// text, nested unsplit blocks, and a space for each split that asked
/// for one.
pub fn unsplit_length(chunks: &[Chunk]) -> usize {
    let mut length = 0;
    for chunk in chunks {
        length += chunk.text.len() + chunk.unsplit_block_length;
        if let Some(split) = &chunk.split {
            if split.space_when_unsplit {
                length += 1;
            }
        }
    }
    length
}
