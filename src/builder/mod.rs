//! Chunk Builder
//!
//! Turns the visitor's ordered event stream into the chunk vector the
//! line writer solves over. The builder is where the intricate parts
//! of layout preparation live:
//!
//! - pending whitespace, realized just before the next token so later
//!   events (comments, blank-line absorption) can still adjust it;
//! - lazy rules, whose scope begins only at the next written token;
//! - comment interleaving, including trailing-comment adhesion;
//! - hard-split collection and transitive rule hardening;
//! - the divide pass that marks where the solver may cut the problem.
//!
//! Child blocks (collection literals, function bodies passed as
//! arguments) are built by child builders. `start_block` consumes the
//! builder, shelves the current frame, and returns the same engine
//! wearing a fresh frame; `end_block` reverses the swap and attaches
//! the finished chunks to the parent's last chunk. The LIFO discipline
//! of the visitor contract is therefore encoded in ownership rather
//! than checked at a distance.

mod nesting_stack;

#[cfg(test)]
mod tests;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::chunk::{Chunk, Span, SpanId, SplitInfo};
use crate::comment::SourceComment;
use crate::config::{cost, FormatConfig};
use crate::nesting::{NestingId, Nestings};
use crate::rule::{RuleId, Rules};
use crate::source::FormatResult;
use crate::whitespace::Whitespace;
use crate::writer::LineWriter;

use nesting_stack::NestingStack;

/// State shared by every builder in a parent/child chain.
///
/// Living here rather than in a frame is what makes forced-rule state
/// survive `end_block`: a rule forced inside one block argument is
/// still forced when the next argument is built.
#[derive(Debug)]
pub(crate) struct Engine {
    pub rules: Rules,
    pub nestings: Nestings,
    pub spans: Vec<Span>,
    pub config: FormatConfig,

    /// Rules that must fully split because a hard split occurred in
    /// their scope. Hardened (with their constraint closure) at `end`.
    pub hard_split_rules: FxHashSet<RuleId>,
}

/// Span opened but not yet closed.
#[derive(Debug)]
struct OpenSpan {
    id: SpanId,
    start: usize,
}

/// Per-builder-level state: one frame per open block.
#[derive(Debug)]
struct Frame {
    chunks: Vec<Chunk>,
    pending: Whitespace,
    base_indent: usize,
    indent_stack: Vec<usize>,
    rule_stack: Vec<RuleId>,
    lazy_rules: Vec<RuleId>,
    open_spans: Vec<OpenSpan>,
    nesting: NestingStack,
    block_argument_indents: Vec<usize>,
}

impl Frame {
    fn new(base_indent: usize) -> Self {
        Self {
            chunks: Vec::new(),
            pending: Whitespace::None,
            base_indent,
            indent_stack: Vec::new(),
            rule_stack: Vec::new(),
            lazy_rules: Vec::new(),
            open_spans: Vec::new(),
            nesting: NestingStack::default(),
            block_argument_indents: Vec::new(),
        }
    }

    fn indent(&self) -> usize {
        self.indent_stack.last().copied().unwrap_or(self.base_indent)
    }

    fn assert_scopes_closed(&self, operation: &str) {
        assert!(
            self.rule_stack.is_empty() && self.lazy_rules.is_empty(),
            "{operation} with an unclosed rule scope"
        );
        assert!(
            self.open_spans.is_empty(),
            "{operation} with an unclosed span"
        );
        assert!(
            self.nesting.is_at_root(),
            "{operation} with unclosed expression nesting"
        );
        assert!(
            self.block_argument_indents.is_empty(),
            "{operation} with an unclosed block-argument nesting"
        );
    }
}

/// Builds the chunk vector from the visitor's event stream.
///
/// Obtain one with [`ChunkBuilder::new`], drive it through the event
/// surface, and finish with [`ChunkBuilder::end`], which runs the line
/// writer and returns the formatted text.
#[derive(Debug)]
pub struct ChunkBuilder {
    engine: Engine,
    frame: Frame,
    parents: Vec<Frame>,
}

impl ChunkBuilder {
    pub fn new(config: FormatConfig) -> Self {
        let base_indent = config.indent;
        Self {
            engine: Engine {
                rules: Rules::new(),
                nestings: Nestings::new(),
                spans: Vec::new(),
                config,
                hard_split_rules: FxHashSet::default(),
            },
            frame: Frame::new(base_indent),
            parents: Vec::new(),
        }
    }

    // -- Rule creation --------------------------------------------------
    //
    // The visitor owns no arena; it mints rules here and passes the
    // handles back into `start_rule`.

    pub fn new_simple_rule(&mut self, cost: usize) -> RuleId {
        self.engine.rules.new_simple(cost)
    }

    pub fn new_positional_rule(&mut self, cost: usize) -> RuleId {
        self.engine.rules.new_positional(cost)
    }

    pub fn new_named_rule(&mut self, cost: usize) -> RuleId {
        self.engine.rules.new_named(cost)
    }

    pub fn new_combinator_rule(&mut self, cost: usize) -> RuleId {
        self.engine.rules.new_combinator(cost)
    }

    /// The next split owned by `rule` sits before a combinator keyword.
    pub fn mark_combinator_keyword(&mut self, rule: RuleId) {
        self.engine.rules.mark_combinator_keyword(rule);
    }

    // -- Tokens and whitespace ------------------------------------------

    /// Write token text: realize pending whitespace, append the text,
    /// activate lazy rules, and commit pending expression nesting.
    pub fn write(&mut self, text: &str) {
        self.flush_whitespace();
        self.append_text(text);
        self.activate_lazy_rules();
        self.frame.nesting.commit(&mut self.engine.nestings);
    }

    /// Record the whitespace to realize before the next token.
    pub fn write_whitespace(&mut self, whitespace: Whitespace) {
        self.frame.pending = whitespace;
    }

    /// Resolve an ambiguous pending whitespace given how many newlines
    /// the source had here.
    pub fn preserve_newlines(&mut self, source_newlines: usize) {
        self.frame.pending = self.frame.pending.resolve(source_newlines);
    }

    // -- Splits ---------------------------------------------------------

    /// Apply a split owned by the innermost active rule, at the current
    /// expression nesting.
    pub fn split(&mut self, space: bool, is_double: Option<bool>, flush_left: bool) {
        let rule = self.innermost_rule("split");
        let nesting = self.frame.nesting.current();
        self.apply_split(rule, nesting, flush_left, is_double, space);
    }

    /// Apply a split owned by the innermost active rule, at block
    /// (statement-level) nesting.
    pub fn block_split(&mut self, space: bool, is_double: Option<bool>) {
        let rule = self.innermost_rule("block_split");
        self.apply_split(rule, NestingId::ROOT, false, is_double, space);
    }

    fn innermost_rule(&self, operation: &str) -> RuleId {
        *self
            .frame
            .rule_stack
            .last()
            .unwrap_or_else(|| panic!("{operation} outside any rule scope"))
    }

    // -- Indentation and nesting ----------------------------------------

    /// Push one statement indentation level.
    pub fn indent(&mut self) {
        let size = self.engine.config.indent_size;
        self.indent_by(size);
    }

    /// Push a statement indentation level of `spaces`.
    pub fn indent_by(&mut self, spaces: usize) {
        let current = self.frame.indent();
        self.frame.indent_stack.push(current + spaces);
    }

    /// Pop the innermost statement indentation level.
    pub fn unindent(&mut self) {
        assert!(
            self.frame.indent_stack.pop().is_some(),
            "unindent without a matching indent"
        );
    }

    /// Push an expression-nesting frame. The frame stays pending until
    /// the next written token unless `now` is set. `indent` defaults
    /// to the continuation indent (twice the statement indent size).
    pub fn nest_expression(&mut self, indent: Option<usize>, now: bool) {
        let indent = indent.unwrap_or(2 * self.engine.config.indent_size);
        self.frame.nesting.nest(indent);
        if now {
            self.frame.nesting.commit(&mut self.engine.nestings);
        }
    }

    /// Pop the innermost expression-nesting frame.
    pub fn unnest(&mut self) {
        self.frame.nesting.unnest();
    }

    // -- Rule scopes ----------------------------------------------------

    /// Push a rule scope. A fresh two-valued rule is minted when none
    /// is given. The rule is contained by every currently active rule.
    pub fn start_rule(&mut self, rule: Option<RuleId>) {
        let rule = rule.unwrap_or_else(|| self.engine.rules.new_simple(cost::NORMAL));
        self.activate_rule(rule);
    }

    /// Queue a rule whose scope begins at the next written token.
    pub fn start_lazy_rule(&mut self, rule: Option<RuleId>) {
        let rule = rule.unwrap_or_else(|| self.engine.rules.new_simple(cost::NORMAL));
        self.frame.lazy_rules.push(rule);
    }

    /// Pop the innermost rule scope. An unactivated lazy rule is
    /// cancelled before any active rule is popped.
    pub fn end_rule(&mut self) {
        if self.frame.lazy_rules.pop().is_none() {
            assert!(
                self.frame.rule_stack.pop().is_some(),
                "end_rule without a matching start_rule"
            );
        }
    }

    fn activate_rule(&mut self, rule: RuleId) {
        for &outer in &self.frame.rule_stack {
            self.engine.rules.contain(outer, rule);
        }
        self.frame.rule_stack.push(rule);
    }

    fn activate_lazy_rules(&mut self) {
        let lazy = std::mem::take(&mut self.frame.lazy_rules);
        for rule in lazy {
            self.activate_rule(rule);
        }
    }

    /// Harden every currently active rule (and, at `end`, everything
    /// their constraints imply).
    pub fn force_rules(&mut self) {
        self.handle_hard_split();
    }

    // -- Spans ----------------------------------------------------------

    /// Open a span charging `cost` if any split inside it fires.
    pub fn start_span(&mut self, cost: usize) {
        let id = SpanId(self.engine.spans.len() as u32);
        self.engine.spans.push(Span { cost });
        let start = self.current_chunk_index();
        self.frame.open_spans.push(OpenSpan { id, start });
    }

    /// Close the innermost span.
    pub fn end_span(&mut self) {
        let span = self
            .frame
            .open_spans
            .pop()
            .expect("end_span without a matching start_span");
        let end = self.current_chunk_index();
        for chunk in &mut self.frame.chunks[span.start..end] {
            chunk.spans.push(span.id);
        }
    }

    /// Index of the chunk the next split would land on: the open chunk
    /// if there is one, otherwise the chunk the next token will start.
    fn current_chunk_index(&self) -> usize {
        match self.frame.chunks.last() {
            Some(chunk) if chunk.can_add_text() => self.frame.chunks.len() - 1,
            _ => self.frame.chunks.len(),
        }
    }

    // -- Blocks ---------------------------------------------------------

    /// Snapshot the current indentation as the base for child blocks.
    pub fn start_block_argument_nesting(&mut self) {
        let indent = self.frame.indent();
        self.frame.block_argument_indents.push(indent);
    }

    /// Release the innermost block-argument snapshot.
    pub fn end_block_argument_nesting(&mut self) {
        assert!(
            self.frame.block_argument_indents.pop().is_some(),
            "end_block_argument_nesting without a matching start"
        );
    }

    /// Open a child block attached to the current chunk. Returns the
    /// builder for the block's contents; every event until the
    /// matching [`ChunkBuilder::end_block`] writes into the block.
    #[must_use]
    pub fn start_block(mut self) -> Self {
        assert!(
            !self.frame.chunks.is_empty(),
            "start_block with no chunk to attach the block to"
        );
        let base = self
            .frame
            .block_argument_indents
            .last()
            .copied()
            .unwrap_or_else(|| self.frame.indent());
        let child = Frame::new(base + self.engine.config.indent_size);
        self.parents.push(std::mem::replace(&mut self.frame, child));
        self
    }

    /// Close the current block and return to the parent builder.
    ///
    /// The surrounding rules are forced to split when `force_split` is
    /// set or when the block contains a hard split. When
    /// `ignore_trailing_split` is set, a hard split that is the
    /// block's last does not count: that is the newline before the
    /// closing bracket, which the caller accounts for itself.
    #[must_use]
    pub fn end_block(mut self, ignore_trailing_split: bool, force_split: bool) -> Self {
        self.flush_whitespace();

        let parent = self.parents.pop().expect("end_block without start_block");
        let child = std::mem::replace(&mut self.frame, parent);
        child.assert_scopes_closed("end_block");

        let force = force_split || self.block_forces_split(&child.chunks, ignore_trailing_split);

        let block_indent = child.base_indent;
        let parent_chunk = self
            .frame
            .chunks
            .last_mut()
            .expect("block parent chunk disappeared");
        parent_chunk.set_block(child.chunks, block_indent);

        if force {
            self.handle_hard_split();
        }
        self
    }

    fn block_forces_split(&self, chunks: &[Chunk], ignore_trailing_split: bool) -> bool {
        let last_split = chunks.iter().rposition(|c| c.split().is_some());
        chunks.iter().enumerate().any(|(index, chunk)| {
            let Some(split) = chunk.split() else {
                return false;
            };
            if ignore_trailing_split && Some(index) == last_split {
                return false;
            }
            self.engine.rules.is_hard(split.rule)
                || self.engine.hard_split_rules.contains(&split.rule)
        })
    }

    // -- Selection markers ----------------------------------------------

    /// Mark the selection start `from_end` characters back from the end
    /// of the written text.
    pub fn start_selection_from_end(&mut self, from_end: usize) {
        let chunk = self
            .frame
            .chunks
            .last_mut()
            .expect("selection marker with no chunk to attach to");
        let length = chunk.text().len();
        assert!(from_end <= length, "selection marker before chunk text");
        chunk.mark_selection_start(length - from_end);
    }

    /// Mark the selection end `from_end` characters back from the end
    /// of the written text.
    pub fn end_selection_from_end(&mut self, from_end: usize) {
        let chunk = self
            .frame
            .chunks
            .last_mut()
            .expect("selection marker with no chunk to attach to");
        let length = chunk.text().len();
        assert!(from_end <= length, "selection marker before chunk text");
        chunk.mark_selection_end(length - from_end);
    }

    // -- Comments -------------------------------------------------------

    /// Write the comments that appeared between the previous token and
    /// the next one, `lines_before_token` newlines before it.
    ///
    /// `token` is the text of the next token (empty at end of input);
    /// it decides whether a space is left pending after the last
    /// comment.
    pub fn write_comments(
        &mut self,
        mut comments: Vec<SourceComment>,
        mut lines_before_token: usize,
        token: &str,
    ) {
        if comments.is_empty() {
            self.preserve_newlines(lines_before_token);
            return;
        }

        // A pending blank line is spent if the comments or the token
        // supply one of their own.
        if self.frame.pending == Whitespace::TwoNewlines && comments[0].lines_before < 2 {
            if lines_before_token > 1 || comments[1..].iter().any(|c| c.lines_before > 1) {
                self.frame.pending = Whitespace::Newline;
            }
        }

        // A run of inline block comments directly before the token
        // keeps the token's newline, moved in front of the run.
        if lines_before_token == 0
            && self.frame.pending.minimum_lines() > 0
            && comments.iter().all(|c| c.is_inline())
        {
            comments[0].lines_before = self.frame.pending.minimum_lines();
            lines_before_token = 1;
        }

        for i in 0..comments.len() {
            self.preserve_newlines(comments[i].lines_before);

            // The adhesion logic below decides spacing itself.
            if self.frame.pending == Whitespace::Space {
                self.frame.pending = Whitespace::None;
            }
            self.flush_whitespace();

            if comments[i].lines_before == 0 {
                // Trailing comment: keep it on the line it trailed.
                if self.should_move_comment_before_split(&comments[i].text) {
                    if let Some(chunk) = self.frame.chunks.last_mut() {
                        chunk.allow_text();
                    }
                }
                if self.needs_space_before_comment(&comments[i]) {
                    self.append_text(" ");
                }
            } else {
                self.write_hard_split(
                    false,
                    comments[i].flush_left,
                    comments[i].lines_before > 1,
                );
            }

            self.append_comment_text(&comments[i]);

            let lines_after = if i + 1 < comments.len() {
                comments[i + 1].lines_before
            } else if comments[i].is_multiline() {
                // A multi-line block comment never shares its last
                // line with the following token.
                lines_before_token.max(1)
            } else {
                lines_before_token
            };
            if lines_after > 0 {
                self.write_hard_split(true, false, lines_after > 1);
            }
        }

        if self.needs_space_after_comments(token) {
            self.frame.pending = Whitespace::Space;
        }

        self.preserve_newlines(lines_before_token);
    }

    /// A trailing comment adheres to the text before the last split
    /// unless that text opens a grouping or the comment spans lines.
    fn should_move_comment_before_split(&self, comment_text: &str) -> bool {
        let Some(chunk) = self.frame.chunks.last() else {
            return false;
        };
        if chunk.split().is_none() || chunk.is_block_parent() {
            return false;
        }
        let text = chunk.text();
        if text.ends_with('(') || text.ends_with('[') || text.ends_with('{') {
            return false;
        }
        !comment_text.contains('\n')
    }

    fn needs_space_before_comment(&self, comment: &SourceComment) -> bool {
        let Some(chunk) = self.frame.chunks.last() else {
            return false;
        };
        if !chunk.can_add_text() || chunk.text().is_empty() {
            return false;
        }
        if comment.is_line_comment {
            return true;
        }
        let text = chunk.text();
        !(text.ends_with('(') || text.ends_with('[') || text.ends_with('{'))
    }

    fn needs_space_after_comments(&self, token: &str) -> bool {
        if !matches!(self.frame.chunks.last(), Some(chunk) if chunk.can_add_text()) {
            return false;
        }
        !matches!(token, "" | ")" | "]" | "}" | "," | ";")
    }

    fn append_comment_text(&mut self, comment: &SourceComment) {
        let (index, offset) = self.append_text_tracking(&comment.text);
        let chunk = &mut self.frame.chunks[index];
        if let Some(start) = comment.selection_start {
            chunk.mark_selection_start(offset + start);
        }
        if let Some(end) = comment.selection_end {
            chunk.mark_selection_end(offset + end);
        }
    }

    // -- Finish ---------------------------------------------------------

    /// Finalize: realize the trailing whitespace, harden forced rules,
    /// mark divide points, and run the line writer.
    pub fn end(mut self) -> FormatResult {
        assert!(self.parents.is_empty(), "end inside an unclosed block");

        self.flush_whitespace();
        self.frame.assert_scopes_closed("end");

        // The output always ends at a line boundary.
        self.write_hard_split(false, false, false);

        let forced: Vec<RuleId> = self.engine.hard_split_rules.drain().collect();
        self.engine.rules.harden_transitively(forced);

        let mut chunks = std::mem::take(&mut self.frame.chunks);
        mark_divides(&self.engine.rules, &mut chunks);

        debug!(
            chunks = chunks.len(),
            rules = self.engine.rules.len(),
            "chunk stream built"
        );

        LineWriter::new(&self.engine).write(&chunks)
    }

    // -- Internals ------------------------------------------------------

    fn flush_whitespace(&mut self) {
        match self.frame.pending {
            Whitespace::None => {}
            Whitespace::Space => self.flush_space(),
            Whitespace::Newline => self.write_hard_split(false, false, false),
            Whitespace::NestedNewline => self.write_hard_split(true, false, false),
            Whitespace::NewlineFlushLeft => self.write_hard_split(false, true, false),
            Whitespace::TwoNewlines => self.write_hard_split(false, false, true),
            ambiguous @ (Whitespace::SpaceOrNewline | Whitespace::OneOrTwoNewlines) => {
                panic!("{ambiguous:?} emitted without a preserve_newlines resolution")
            }
        }
        self.frame.pending = Whitespace::None;
    }

    fn flush_space(&mut self) {
        let Some(chunk) = self.frame.chunks.last_mut() else {
            // A leading space has nothing to separate.
            return;
        };
        if chunk.can_add_text() {
            chunk.append_text(" ");
        } else if chunk.split().is_some() {
            // The chunk already ended in a split; the space belongs to
            // the split's unsplit rendering.
            chunk.set_space_when_unsplit(true);
        }
    }

    fn write_hard_split(&mut self, nest: bool, flush_left: bool, double: bool) {
        let rule = self.engine.rules.new_hard();
        let nesting = if nest {
            self.frame.nesting.current()
        } else {
            NestingId::ROOT
        };
        self.apply_split(rule, nesting, flush_left, Some(double), false);
    }

    fn apply_split(
        &mut self,
        rule: RuleId,
        nesting: NestingId,
        flush_left: bool,
        is_double: Option<bool>,
        space: bool,
    ) {
        if self.frame.chunks.is_empty() {
            // There is no split before the first token.
            return;
        }
        let index = self.frame.chunks.len() - 1;
        let indent = self.frame.indent();

        let rules = &mut self.engine.rules;
        let chunk = &mut self.frame.chunks[index];

        let mut is_double = is_double;
        if let Some(existing) = chunk.split() {
            if rules.is_hard(existing.rule) {
                // A hard split wins; a later request can only add the
                // blank line or force the line flush left.
                chunk.merge_hard_split(is_double, flush_left);
                return;
            }
            if is_double.is_none() {
                is_double = existing.is_double;
            }
            rules.remove_owned_chunk(existing.rule, index);
        }

        chunk.set_split(SplitInfo {
            rule,
            indent,
            nesting,
            flush_left,
            is_double,
            space_when_unsplit: space,
        });
        rules.add_owned_chunk(rule, index);

        if self.engine.rules.is_hard(rule) {
            self.handle_hard_split();
        }
    }

    /// A hard split occurred: every active rule that splits on inner
    /// rules must fully split too.
    fn handle_hard_split(&mut self) {
        for &rule in &self.frame.rule_stack {
            if self.engine.rules.splits_on_inner_rules(rule) {
                self.engine.hard_split_rules.insert(rule);
            }
        }
    }

    fn append_text(&mut self, text: &str) {
        self.append_text_tracking(text);
    }

    fn append_text_tracking(&mut self, text: &str) -> (usize, usize) {
        match self.frame.chunks.last_mut() {
            Some(chunk) if chunk.can_add_text() => {
                let offset = chunk.append_text(text);
                (self.frame.chunks.len() - 1, offset)
            }
            _ => {
                self.frame.chunks.push(Chunk::new(text));
                (self.frame.chunks.len() - 1, 0)
            }
        }
    }
}

/// Mark every chunk after which the solver may cut the problem: a hard
/// split at block nesting, with no child block, whose rule owns
/// nothing further right.
fn mark_divides(rules: &Rules, chunks: &mut [Chunk]) {
    for index in 0..chunks.len() {
        mark_divides(rules, chunks[index].block_mut());

        let can_divide = match chunks[index].split() {
            Some(split) => {
                rules.is_hard(split.rule)
                    && split.nesting.is_root()
                    && !chunks[index].is_block_parent()
                    && !rules.owns_chunk_after(split.rule, index)
            }
            None => false,
        };
        chunks[index].can_divide = can_divide;
    }
}
