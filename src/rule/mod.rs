//! Split Rules
//!
//! A rule owns a set of splits and takes one of a small number of
//! discrete *values*; the value decides which of its splits fire.
//! Value `0` is always "do not split"; the highest value always means
//! "split everywhere this rule owns a split".
//!
//! Rules are a DSL, not a grammar: each syntactic construct installs
//! one or a few rules whose constraint logic encodes the formatting
//! policy (if positional arguments split, named arguments must split
//! too). The line splitter stays oblivious to source-language
//! specifics and only sees the capability surface here.
//!
//! All rules live in a [`Rules`] arena and are addressed by [`RuleId`]
//! handles. Rules reference each other by handle only, so the mutual
//! containment and constraint graph involves no ownership cycles, and
//! transitive hardening is a plain worklist traversal.

use rustc_hash::FxHashSet;
use tracing::debug;

/// Handle to a rule in the [`Rules`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub(crate) u32);

/// The value every rule uses for "do not split".
pub const UNSPLIT: usize = 0;

/// The split strategy a rule implements.
#[derive(Clone, Debug)]
enum RuleKind {
    /// Always splits. The builder creates one per mandatory newline.
    Hard,

    /// Two values: unsplit or split everywhere.
    Simple,

    /// Positional argument list. With `k` owned splits the values are:
    /// `0` unsplit, `1..=k` split before only the i-th argument,
    /// `k + 1` split before every argument. A paired named-argument
    /// rule is forced to fully split whenever this rule splits at all.
    Positional { named: Option<RuleId> },

    /// Named argument section: `0` unsplit, `1` split before the first
    /// argument only, `2` split before every argument.
    Named,

    /// Import/export combinator clause. Keyword splits (before `show`
    /// and `hide`) and name splits (between shown names) are owned
    /// separately: `0` everything inline, `1` split before keywords,
    /// `2` split before keywords and between names.
    Combinator {
        keyword_chunks: Vec<usize>,
        /// One-shot flag: the next owned split is a keyword split.
        next_is_keyword: bool,
    },
}

#[derive(Debug)]
struct Rule {
    kind: RuleKind,
    cost: usize,
    hardened: bool,

    /// Chunk indexes this rule owns, in application order. Indexes are
    /// relative to the chunk vector of the builder level the rule was
    /// used in.
    chunks: Vec<usize>,

    /// Inner rules this rule had the opportunity to constrain.
    constrained: Vec<RuleId>,

    /// Outer rules containing this one.
    outer: Vec<RuleId>,
}

impl Rule {
    fn new(kind: RuleKind, cost: usize) -> Self {
        Self {
            kind,
            cost,
            hardened: false,
            chunks: Vec::new(),
            constrained: Vec::new(),
            outer: Vec::new(),
        }
    }
}

/// Arena owning every rule of one formatting operation.
#[derive(Debug, Default)]
pub struct Rules {
    rules: Vec<Rule>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, rule: Rule) -> RuleId {
        let id = RuleId(self.rules.len() as u32);
        self.rules.push(rule);
        id
    }

    /// A rule for a mandatory newline.
    pub fn new_hard(&mut self) -> RuleId {
        self.push(Rule::new(RuleKind::Hard, 0))
    }

    /// A plain split-or-not rule.
    pub fn new_simple(&mut self, cost: usize) -> RuleId {
        self.push(Rule::new(RuleKind::Simple, cost))
    }

    /// A positional-argument rule.
    pub fn new_positional(&mut self, cost: usize) -> RuleId {
        self.push(Rule::new(RuleKind::Positional { named: None }, cost))
    }

    /// A named-argument rule.
    pub fn new_named(&mut self, cost: usize) -> RuleId {
        self.push(Rule::new(RuleKind::Named, cost))
    }

    /// A combinator-clause rule.
    pub fn new_combinator(&mut self, cost: usize) -> RuleId {
        self.push(Rule::new(
            RuleKind::Combinator {
                keyword_chunks: Vec::new(),
                next_is_keyword: false,
            },
            cost,
        ))
    }

    /// Mark the next split owned by `rule` as a combinator-keyword
    /// split rather than a name split.
    pub fn mark_combinator_keyword(&mut self, rule: RuleId) {
        match &mut self.rules[rule.0 as usize].kind {
            RuleKind::Combinator {
                next_is_keyword, ..
            } => *next_is_keyword = true,
            kind => panic!("marked a combinator keyword on {kind:?}"),
        }
    }

    /// Record that `rule` owns the split at `chunk_index`.
    pub fn add_owned_chunk(&mut self, rule: RuleId, chunk_index: usize) {
        let entry = &mut self.rules[rule.0 as usize];
        if let RuleKind::Combinator {
            keyword_chunks,
            next_is_keyword,
        } = &mut entry.kind
        {
            if *next_is_keyword {
                keyword_chunks.push(chunk_index);
                *next_is_keyword = false;
            }
        }
        entry.chunks.push(chunk_index);
    }

    /// Forget that `rule` owns `chunk_index` (its split was replaced).
    pub fn remove_owned_chunk(&mut self, rule: RuleId, chunk_index: usize) {
        let entry = &mut self.rules[rule.0 as usize];
        entry.chunks.retain(|&c| c != chunk_index);
        if let RuleKind::Combinator { keyword_chunks, .. } = &mut entry.kind {
            keyword_chunks.retain(|&c| c != chunk_index);
        }
    }

    /// Whether `rule` owns any chunk with an index greater than
    /// `chunk_index`. Used by the divide pass.
    pub fn owns_chunk_after(&self, rule: RuleId, chunk_index: usize) -> bool {
        self.rules[rule.0 as usize]
            .chunks
            .iter()
            .any(|&c| c > chunk_index)
    }

    /// Index of the first chunk `rule` owns, for solver ordering.
    pub fn first_owned_chunk(&self, rule: RuleId) -> Option<usize> {
        self.rules[rule.0 as usize].chunks.iter().copied().min()
    }

    /// Index of the last chunk `rule` owns.
    pub fn last_owned_chunk(&self, rule: RuleId) -> Option<usize> {
        self.rules[rule.0 as usize].chunks.iter().copied().max()
    }

    /// Record that `outer` wraps `inner`, giving `outer` the chance to
    /// constrain it. Pairs a named-argument rule with its positional
    /// rule when containment introduces them.
    pub fn contain(&mut self, outer: RuleId, inner: RuleId) {
        if outer == inner || !self.splits_on_inner_rules(outer) {
            return;
        }
        {
            let entry = &mut self.rules[outer.0 as usize];
            if entry.constrained.contains(&inner) {
                return;
            }
            entry.constrained.push(inner);
        }
        self.rules[inner.0 as usize].outer.push(outer);

        if matches!(self.rules[inner.0 as usize].kind, RuleKind::Named) {
            if let RuleKind::Positional { named } = &mut self.rules[outer.0 as usize].kind {
                if named.is_none() {
                    *named = Some(inner);
                }
            }
        }
    }

    /// Number of values the rule can take.
    pub fn value_count(&self, rule: RuleId) -> usize {
        let entry = &self.rules[rule.0 as usize];
        if entry.hardened {
            return 1;
        }
        match &entry.kind {
            RuleKind::Hard => 1,
            RuleKind::Simple => 2,
            RuleKind::Positional { .. } => {
                let args = entry.chunks.len();
                if args <= 1 {
                    2
                } else {
                    args + 2
                }
            }
            RuleKind::Named => {
                if entry.chunks.len() <= 1 {
                    2
                } else {
                    3
                }
            }
            RuleKind::Combinator { keyword_chunks, .. } => {
                if keyword_chunks.len() == entry.chunks.len() {
                    // No name splits: inline or keywords is all there is.
                    2
                } else {
                    3
                }
            }
        }
    }

    /// The value meaning "split everywhere this rule owns a split".
    pub fn fully_split_value(&self, rule: RuleId) -> usize {
        self.value_count(rule) - 1
    }

    /// Base cost charged once when the rule takes a non-unsplit value.
    pub fn cost(&self, rule: RuleId) -> usize {
        let entry = &self.rules[rule.0 as usize];
        if entry.hardened || matches!(entry.kind, RuleKind::Hard) {
            0
        } else {
            entry.cost
        }
    }

    /// Whether the rule always splits: a hard rule or a hardened one.
    pub fn is_hard(&self, rule: RuleId) -> bool {
        let entry = &self.rules[rule.0 as usize];
        entry.hardened || matches!(entry.kind, RuleKind::Hard)
    }

    /// Whether a hard split inside this rule's scope forces it to
    /// split as well.
    pub fn splits_on_inner_rules(&self, rule: RuleId) -> bool {
        !matches!(self.rules[rule.0 as usize].kind, RuleKind::Hard)
    }

    /// Whether the split at `chunk_index` fires when the rule takes
    /// `value`.
    pub fn is_split_at_value(&self, rule: RuleId, chunk_index: usize, value: usize) -> bool {
        let entry = &self.rules[rule.0 as usize];
        if entry.hardened || matches!(entry.kind, RuleKind::Hard) {
            return true;
        }
        if value == UNSPLIT {
            return false;
        }
        if value == self.fully_split_value(rule) {
            return true;
        }
        match &entry.kind {
            RuleKind::Positional { .. } => {
                // Intermediate value v splits only before argument v - 1.
                entry.chunks.get(value - 1) == Some(&chunk_index)
            }
            RuleKind::Named => {
                // Value 1 splits only before the first named argument.
                entry.chunks.first() == Some(&chunk_index)
            }
            RuleKind::Combinator { keyword_chunks, .. } => {
                // Value 1 splits before keywords, not between names.
                keyword_chunks.contains(&chunk_index)
            }
            // Simple and Hard have no intermediate values.
            _ => unreachable!("intermediate value {value} on a two-valued rule"),
        }
    }

    /// When this rule takes `value`, the value `other` is forced to,
    /// or `None` if `other` stays free.
    pub fn constrain(&self, rule: RuleId, value: usize, other: RuleId) -> Option<usize> {
        let entry = &self.rules[rule.0 as usize];

        // A hardened rule's single value stands in for its original
        // fully-split value, so it keeps constraining as if fully split.
        let effective = if entry.hardened {
            self.unhardened_fully_split(rule)
        } else {
            value
        };

        match &entry.kind {
            RuleKind::Positional { named: Some(named) } if *named == other => {
                // Any positional split forces the named section apart.
                (effective != UNSPLIT).then(|| self.fully_split_value(other))
            }
            _ => None,
        }
    }

    /// Collapse the rule's value set to its fully-split value.
    pub fn harden(&mut self, rule: RuleId) {
        self.rules[rule.0 as usize].hardened = true;
    }

    /// Harden `seeds` and every rule transitively forced to fully
    /// split by a hardened rule. Each rule hardens at most once, so
    /// the worklist terminates.
    pub fn harden_transitively(&mut self, seeds: impl IntoIterator<Item = RuleId>) {
        let mut worklist: Vec<RuleId> = seeds.into_iter().collect();
        let mut seen = FxHashSet::default();

        while let Some(rule) = worklist.pop() {
            if !seen.insert(rule) {
                continue;
            }
            self.harden(rule);
            debug!(rule = rule.0, "hardened rule");

            let fully_split = self.unhardened_fully_split(rule);
            let constrained = self.rules[rule.0 as usize].constrained.clone();
            for other in constrained {
                if self.is_hard(other) {
                    continue;
                }
                if self.constrain(rule, fully_split, other) == Some(self.fully_split_value(other)) {
                    worklist.push(other);
                }
            }
        }
    }

    /// Fully-split value the rule had before hardening collapsed its
    /// value set.
    fn unhardened_fully_split(&self, rule: RuleId) -> usize {
        let entry = &self.rules[rule.0 as usize];
        match &entry.kind {
            RuleKind::Hard => 0,
            RuleKind::Simple => 1,
            RuleKind::Positional { .. } => {
                let args = entry.chunks.len();
                if args <= 1 {
                    1
                } else {
                    args + 1
                }
            }
            RuleKind::Named => {
                if entry.chunks.len() <= 1 {
                    1
                } else {
                    2
                }
            }
            RuleKind::Combinator { keyword_chunks, .. } => {
                if keyword_chunks.len() == entry.chunks.len() {
                    1
                } else {
                    2
                }
            }
        }
    }

    /// Rules this rule constrains, for solver candidate checks.
    pub fn constrained(&self, rule: RuleId) -> &[RuleId] {
        &self.rules[rule.0 as usize].constrained
    }

    /// Rules containing this one.
    pub fn outer(&self, rule: RuleId) -> &[RuleId] {
        &self.rules[rule.0 as usize].outer
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
