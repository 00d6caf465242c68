//! Line Writer
//!
//! Turns the solved chunk vector into physical lines. The writer
//! partitions each chunk list at divide markers, hands every partition
//! to the splitter, and renders the winning layout: text, newlines
//! (blank where a split is double), indentation, inline or broken
//! child blocks, and the final selection offsets.
//!
//! Block parents render recursively. A block's layout never depends on
//! the enclosing rule values, so each block is formatted once up
//! front; the splitter prices the result and the writer splices the
//! text when the parent split fires, or the block's unsplit form when
//! it does not.

pub(crate) mod splitter;

#[cfg(test)]
mod tests;

use rustc_hash::FxHashMap;

use crate::builder::Engine;
use crate::chunk::Chunk;
use crate::source::FormatResult;

use splitter::Solution;

/// Accumulated output of one chunk list.
#[derive(Default)]
struct Output {
    text: String,
    cost: usize,
    selection_start: Option<usize>,
    selection_end: Option<usize>,
}

impl Output {
    fn mark_selections(&mut self, chunk: &Chunk) {
        if let Some(offset) = chunk.selection_start {
            self.selection_start.get_or_insert(self.text.len() + offset);
        }
        if let Some(offset) = chunk.selection_end {
            self.selection_end.get_or_insert(self.text.len() + offset);
        }
    }

    fn push_spaces(&mut self, count: usize) {
        for _ in 0..count {
            self.text.push(' ');
        }
    }
}

pub(crate) struct LineWriter<'a> {
    engine: &'a Engine,
}

impl<'a> LineWriter<'a> {
    pub fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    /// Lay out the top-level chunk list and finalize the text.
    pub fn write(self, chunks: &[Chunk]) -> FormatResult {
        if chunks.is_empty() {
            return FormatResult::new(String::new());
        }

        let mut out = self.format_chunks(chunks, self.engine.config.indent);

        while out.text.ends_with(' ') || out.text.ends_with('\n') {
            out.text.pop();
        }
        if self.engine.config.is_compilation_unit && !out.text.is_empty() {
            out.text.push('\n');
        }

        let length = out.text.len();
        let selection_start = out.selection_start.map(|start| start.min(length));
        let selection_length = match (selection_start, out.selection_end) {
            (Some(start), Some(end)) => Some(end.min(length).saturating_sub(start)),
            _ => None,
        };
        FormatResult {
            text: out.text,
            selection_start,
            selection_length,
        }
    }

    /// Lay out one chunk list starting at `start_indent`, partitioning
    /// it at divide markers and solving each partition independently.
    fn format_chunks(&self, chunks: &[Chunk], start_indent: usize) -> Output {
        let mut out = Output::default();
        out.push_spaces(start_indent);
        let mut column = start_indent;

        let mut start = 0;
        while start < chunks.len() {
            let end = chunks[start..]
                .iter()
                .position(|chunk| chunk.can_divide)
                .map_or(chunks.len() - 1, |offset| start + offset);
            let partition = &chunks[start..=end];

            // Blocks price and render independently of the enclosing
            // rule values, so format them before solving.
            let mut blocks: FxHashMap<usize, Output> = FxHashMap::default();
            for (i, chunk) in partition.iter().enumerate() {
                if chunk.is_block_parent() {
                    blocks.insert(
                        start + i,
                        self.format_chunks(chunk.block(), chunk.block_indent()),
                    );
                }
            }
            let block_costs: FxHashMap<usize, usize> = blocks
                .iter()
                .map(|(&index, block)| (index, block.cost))
                .collect();

            let solution = splitter::solve(self.engine, partition, start, column, &block_costs);
            out.cost += solution.cost;
            column = self.render(partition, start, column, &solution, &blocks, &mut out);

            start = end + 1;
        }
        out
    }

    /// Render one solved partition; returns the column the next
    /// partition starts at.
    fn render(
        &self,
        partition: &[Chunk],
        base: usize,
        start_column: usize,
        solution: &Solution,
        blocks: &FxHashMap<usize, Output>,
        out: &mut Output,
    ) -> usize {
        let mut column = start_column;
        for (i, chunk) in partition.iter().enumerate() {
            out.mark_selections(chunk);
            out.text.push_str(chunk.text());
            match chunk.text().rfind('\n') {
                Some(newline) => column = chunk.text().len() - newline - 1,
                None => column += chunk.text().len(),
            }

            let reset = solution.reset_columns[i];
            if chunk.is_block_parent() {
                let block = &blocks[&(base + i)];
                if reset.is_some() {
                    out.text.push('\n');
                    let spliced_at = out.text.len();
                    if let Some(offset) = block.selection_start {
                        out.selection_start.get_or_insert(spliced_at + offset);
                    }
                    if let Some(offset) = block.selection_end {
                        out.selection_end.get_or_insert(spliced_at + offset);
                    }
                    out.text.push_str(block.text.trim_end());
                } else {
                    let before = out.text.len();
                    self.render_unsplit(chunk.block(), out);
                    column += out.text.len() - before;
                }
            }

            let Some(split) = chunk.split() else { continue };
            match reset {
                Some(target) => {
                    out.text.push('\n');
                    if split.is_double == Some(true) {
                        out.text.push('\n');
                    }
                    out.push_spaces(target);
                    column = target;
                }
                None => {
                    if split.space_when_unsplit {
                        out.text.push(' ');
                        column += 1;
                    }
                }
            }
        }
        column
    }

    /// Render a block inline: every split stays unsplit and renders as
    /// its space, nested blocks recurse.
    fn render_unsplit(&self, chunks: &[Chunk], out: &mut Output) {
        for chunk in chunks {
            out.mark_selections(chunk);
            out.text.push_str(chunk.text());
            if chunk.is_block_parent() {
                self.render_unsplit(chunk.block(), out);
            }
            if let Some(split) = chunk.split() {
                if split.space_when_unsplit {
                    out.text.push(' ');
                }
            }
        }
    }
}
