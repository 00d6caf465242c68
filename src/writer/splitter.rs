//! Line Splitter
//!
//! Chooses a value for every soft rule in one partition so that the
//! total of overflow, rule, and span costs is minimal.
//!
//! The search is a depth-first enumeration over the partition's rules
//! in first-chunk order. Constraint propagation rejects candidate
//! values that contradict an already-bound rule, partial layouts are
//! priced as soon as every rule owning their chunks is bound, and a
//! memo over `(rule index, live state)` cuts re-exploration of
//! equivalent partial assignments. Divide markers keep partitions
//! small, so this stays tractable even on pathological inputs.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::builder::Engine;
use crate::chunk::{Chunk, SpanId};
use crate::config::cost;
use crate::nesting::NestingId;
use crate::rule::RuleId;

/// The chosen layout for one partition.
pub(crate) struct Solution {
    pub cost: usize,

    /// For each chunk in the partition: `Some(column)` when its split
    /// fires, carrying the column the next line starts at.
    pub reset_columns: Vec<Option<usize>>,
}

/// Priced walk of a partition prefix.
struct Eval {
    cost: usize,
    column: usize,
    reset_columns: Vec<Option<usize>>,

    /// Nesting levels of splits fired so far, sorted.
    used: Vec<NestingId>,

    /// Spans charged so far, sorted.
    charged_spans: Vec<SpanId>,
}

type MemoKey = (
    usize,
    Vec<(RuleId, usize)>,
    usize,
    Vec<NestingId>,
    Vec<SpanId>,
);

pub(crate) fn solve(
    engine: &Engine,
    chunks: &[Chunk],
    base: usize,
    first_column: usize,
    block_costs: &FxHashMap<usize, usize>,
) -> Solution {
    // Soft rules in first-chunk order; hard rules have no choice to
    // make.
    let mut rule_order = Vec::new();
    let mut seen = FxHashSet::default();
    for chunk in chunks {
        if let Some(split) = chunk.split() {
            if !engine.rules.is_hard(split.rule) && seen.insert(split.rule) {
                rule_order.push(split.rule);
            }
        }
    }
    debug!(
        chunks = chunks.len(),
        rules = rule_order.len(),
        "solving partition"
    );

    let mut search = Search {
        engine,
        chunks,
        base,
        first_column,
        block_costs,
        rule_order,
        best_cost: usize::MAX,
        best: FxHashMap::default(),
        memo: FxHashMap::default(),
    };
    let mut bindings = FxHashMap::default();
    search.dfs(0, &mut bindings);

    let eval = search.evaluate(&search.best, chunks.len());
    debug!(cost = eval.cost, "partition solved");
    Solution {
        cost: eval.cost,
        reset_columns: eval.reset_columns,
    }
}

struct Search<'a> {
    engine: &'a Engine,
    chunks: &'a [Chunk],

    /// Index of the partition's first chunk within its chunk vector;
    /// rules record owned chunks in that index space.
    base: usize,

    /// Column the partition's first chunk starts at.
    first_column: usize,

    /// Pre-computed layout cost of each block parent, by absolute
    /// chunk index. Block layout does not depend on the enclosing
    /// rule values, so it prices once.
    block_costs: &'a FxHashMap<usize, usize>,

    rule_order: Vec<RuleId>,
    best_cost: usize,
    best: FxHashMap<RuleId, usize>,
    memo: FxHashMap<MemoKey, usize>,
}

impl Search<'_> {
    fn dfs(&mut self, index: usize, bindings: &mut FxHashMap<RuleId, usize>) {
        if index == self.rule_order.len() {
            let eval = self.evaluate(bindings, self.chunks.len());
            if eval.cost < self.best_cost {
                trace!(cost = eval.cost, "new best layout");
                self.best_cost = eval.cost;
                self.best = bindings.clone();
            }
            return;
        }

        // Price the prefix whose rules are all bound; it can only get
        // more expensive from here.
        let frontier = self.frontier(index);
        let eval = self.evaluate(bindings, frontier);
        if eval.cost >= self.best_cost {
            return;
        }

        if self.seen_cheaper(index, bindings, frontier, &eval) {
            return;
        }

        let rule = self.rule_order[index];
        'candidates: for value in 0..self.engine.rules.value_count(rule) {
            for (&other, &other_value) in bindings.iter() {
                if self
                    .engine
                    .rules
                    .constrain(other, other_value, rule)
                    .is_some_and(|forced| forced != value)
                {
                    continue 'candidates;
                }
                if self
                    .engine
                    .rules
                    .constrain(rule, value, other)
                    .is_some_and(|forced| forced != other_value)
                {
                    continue 'candidates;
                }
            }
            bindings.insert(rule, value);
            self.dfs(index + 1, bindings);
            bindings.remove(&rule);
        }
    }

    /// First chunk (partition-relative) owned by any still-unbound
    /// rule; everything before it is fully priced.
    fn frontier(&self, index: usize) -> usize {
        self.rule_order[index..]
            .iter()
            .filter_map(|&rule| self.engine.rules.first_owned_chunk(rule))
            .map(|first| first.saturating_sub(self.base))
            .min()
            .unwrap_or(self.chunks.len())
            .min(self.chunks.len())
    }

    /// Check the memo for an equivalent partial state that was already
    /// reached at least as cheaply; record this one otherwise.
    ///
    /// Two partial assignments are equivalent for the remaining search
    /// when they agree on the rules still owning chunks past the
    /// frontier, the column the frontier line is at, the nesting
    /// levels already in use, and the spans already charged that still
    /// cover suffix chunks.
    fn seen_cheaper(
        &mut self,
        index: usize,
        bindings: &FxHashMap<RuleId, usize>,
        frontier: usize,
        eval: &Eval,
    ) -> bool {
        let mut live: Vec<(RuleId, usize)> = bindings
            .iter()
            .filter(|(&rule, _)| {
                self.engine
                    .rules
                    .last_owned_chunk(rule)
                    .is_some_and(|last| last.saturating_sub(self.base) >= frontier)
            })
            .map(|(&rule, &value)| (rule, value))
            .collect();
        live.sort_unstable();

        let suffix_spans: FxHashSet<SpanId> = self.chunks[frontier..]
            .iter()
            .flat_map(|chunk| chunk.spans.iter().copied())
            .collect();
        let open_spans: Vec<SpanId> = eval
            .charged_spans
            .iter()
            .copied()
            .filter(|span| suffix_spans.contains(span))
            .collect();

        let key = (index, live, eval.column, eval.used.clone(), open_spans);
        match self.memo.get(&key) {
            Some(&seen) if seen <= eval.cost => true,
            _ => {
                self.memo.insert(key, eval.cost);
                false
            }
        }
    }

    /// Walk the first `upto` chunks pricing overflow, rule, and span
    /// costs. The nesting levels in use accumulate as splits fire, so
    /// a line's indent depends only on the splits at or before it.
    fn evaluate(&self, bindings: &FxHashMap<RuleId, usize>, upto: usize) -> Eval {
        let rules = &self.engine.rules;
        let page_width = self.engine.config.page_width;

        let mut total = 0usize;
        let mut column = self.first_column;
        let mut reset_columns = vec![None; self.chunks.len()];
        let mut used = FxHashSet::default();
        let mut charged_spans = FxHashSet::default();
        let mut charged_rules = FxHashSet::default();
        let mut ended_on_split = false;

        for (i, chunk) in self.chunks[..upto].iter().enumerate() {
            let absolute = self.base + i;
            // Multi-line text (block comments) restarts the column; the
            // lines inside it are verbatim and never priced.
            match chunk.text().rfind('\n') {
                Some(newline) => column = chunk.text().len() - newline - 1,
                None => column += chunk.text().len(),
            }

            let fired = chunk.split().is_some_and(|split| {
                rules.is_hard(split.rule)
                    || bindings
                        .get(&split.rule)
                        .is_some_and(|&value| rules.is_split_at_value(split.rule, absolute, value))
            });

            if chunk.is_block_parent() {
                if fired {
                    total += self.block_costs.get(&absolute).copied().unwrap_or(0);
                } else {
                    column += chunk.unsplit_block_length();
                }
            }

            let Some(split) = chunk.split() else {
                ended_on_split = false;
                continue;
            };
            if fired {
                if column > page_width {
                    total += (column - page_width) * cost::OVERFLOW_CHAR;
                }
                if !rules.is_hard(split.rule) && charged_rules.insert(split.rule) {
                    total += rules.cost(split.rule);
                }
                for &span in &chunk.spans {
                    if charged_spans.insert(span) {
                        total += self.engine.spans[span.0 as usize].cost;
                    }
                }
                used.insert(split.nesting);
                let target = if split.flush_left {
                    0
                } else {
                    split.indent + self.engine.nestings.total_indent(split.nesting, &used)
                };
                reset_columns[i] = Some(target);
                column = target;
            } else if split.space_when_unsplit {
                column += 1;
            }
            ended_on_split = fired;
        }

        // A partition that ends mid-line (a block without a trailing
        // newline) still pays for its last line.
        if upto == self.chunks.len() && !ended_on_split && column > page_width {
            total += (column - page_width) * cost::OVERFLOW_CHAR;
        }

        let mut used: Vec<NestingId> = used.into_iter().collect();
        used.sort_unstable_by_key(|id| id.0);
        let mut charged_spans: Vec<SpanId> = charged_spans.into_iter().collect();
        charged_spans.sort_unstable_by_key(|id| id.0);

        Eval {
            cost: total,
            column,
            reset_columns,
            used,
            charged_spans,
        }
    }
}
