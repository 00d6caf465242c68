//! Pending expression-nesting stack.
//!
//! Nesting a split one level deeper is requested when an expression
//! opens, but committing it eagerly would indent operands that never
//! split. A requested level therefore stays *pending* until the next
//! token is written (or the caller asks for an immediate commit); only
//! committed levels influence splits.

use crate::nesting::{NestingId, Nestings};

#[derive(Debug, Default)]
pub(crate) struct NestingStack {
    /// Committed levels, innermost last. Empty means block level.
    committed: Vec<NestingId>,

    /// Indents requested but not yet committed.
    pending: Vec<usize>,
}

impl NestingStack {
    /// The innermost committed level.
    pub fn current(&self) -> NestingId {
        self.committed.last().copied().unwrap_or(NestingId::ROOT)
    }

    /// Request one more level of `indent` spaces.
    pub fn nest(&mut self, indent: usize) {
        self.pending.push(indent);
    }

    /// Turn every pending request into a real nesting level.
    pub fn commit(&mut self, nestings: &mut Nestings) {
        for indent in self.pending.drain(..) {
            let parent = self.committed.last().copied().unwrap_or(NestingId::ROOT);
            self.committed.push(nestings.nest(parent, indent));
        }
    }

    /// Discard the innermost level, pending before committed.
    pub fn unnest(&mut self) {
        if self.pending.pop().is_none() {
            assert!(
                self.committed.pop().is_some(),
                "unnest without a matching nest_expression"
            );
        }
    }

    /// Whether every level has been popped back to block level.
    pub fn is_at_root(&self) -> bool {
        self.committed.is_empty() && self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting_stays_pending_until_committed() {
        let mut nestings = Nestings::new();
        let mut stack = NestingStack::default();

        stack.nest(4);
        assert_eq!(stack.current(), NestingId::ROOT);

        stack.commit(&mut nestings);
        let level = stack.current();
        assert_ne!(level, NestingId::ROOT);
        assert_eq!(nestings.depth(level), 1);
    }

    #[test]
    fn unnest_discards_pending_first() {
        let mut nestings = Nestings::new();
        let mut stack = NestingStack::default();

        stack.nest(4);
        stack.commit(&mut nestings);
        let committed = stack.current();

        stack.nest(2);
        stack.unnest();
        assert_eq!(stack.current(), committed);

        stack.unnest();
        assert!(stack.is_at_root());
    }

    #[test]
    #[should_panic(expected = "unnest without a matching nest_expression")]
    fn unbalanced_unnest_panics() {
        NestingStack::default().unnest();
    }
}
