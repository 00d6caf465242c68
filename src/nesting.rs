//! Expression Nesting
//!
//! Statement indentation and expression indentation are tracked
//! separately. A statement indents by fixed steps; an expression
//! indents by a *nesting level*, a node in a tree rooted at block
//! level. Nesting frames are immutable arena nodes; how much a level
//! actually indents on a given line depends on which levels are in use
//! on that line, which the splitter computes per candidate layout.
//!
//! The per-line computation keeps indentation monotonic: a nesting
//! level's indent is the sum of the indents of its ancestors (and
//! itself) that are in use, so an ancestor active on the same line can
//! never indent further than its descendant.

use rustc_hash::FxHashSet;

/// Handle to a nesting level in the [`Nestings`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NestingId(pub(crate) u32);

impl NestingId {
    /// The block-level root. Splits at this level carry no expression
    /// indentation.
    pub const ROOT: NestingId = NestingId(0);

    #[inline]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

#[derive(Clone, Debug)]
struct NestingLevel {
    parent: Option<NestingId>,
    indent: usize,
    depth: usize,
}

/// Arena of nesting levels. Index 0 is always the block-level root.
#[derive(Debug)]
pub struct Nestings {
    levels: Vec<NestingLevel>,
}

impl Default for Nestings {
    fn default() -> Self {
        Self {
            levels: vec![NestingLevel {
                parent: None,
                indent: 0,
                depth: 0,
            }],
        }
    }
}

impl Nestings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a child level of `parent` adding `indent` spaces.
    pub fn nest(&mut self, parent: NestingId, indent: usize) -> NestingId {
        let depth = self.level(parent).depth + 1;
        let id = NestingId(self.levels.len() as u32);
        self.levels.push(NestingLevel {
            parent: Some(parent),
            indent,
            depth,
        });
        id
    }

    pub fn parent(&self, id: NestingId) -> Option<NestingId> {
        self.level(id).parent
    }

    pub fn depth(&self, id: NestingId) -> usize {
        self.level(id).depth
    }

    /// Total expression indentation of `id` given the set of levels in
    /// use on the current line: the sum of `indent` over the ancestors
    /// of `id` (including itself) that appear in `used`.
    pub fn total_indent(&self, id: NestingId, used: &FxHashSet<NestingId>) -> usize {
        let mut total = 0;
        let mut current = Some(id);
        while let Some(level) = current {
            if used.contains(&level) {
                total += self.level(level).indent;
            }
            current = self.level(level).parent;
        }
        total
    }

    fn level(&self, id: NestingId) -> &NestingLevel {
        &self.levels[id.0 as usize]
    }
}
