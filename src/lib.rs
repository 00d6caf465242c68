//! Lyra Formatter Engine
//!
//! Chunk-and-rule layout engine for the Lyra code formatter. The
//! syntax visitor (a separate crate) walks the parsed tree and drives
//! a [`ChunkBuilder`] through a stream of events: token text,
//! whitespace requests, comment batches, rule and span scopes,
//! indentation and expression nesting. The engine turns that stream
//! into formatted text wrapped to the configured page width.
//!
//! # Quick Start
//!
//! ```
//! use lyra_fmt::{ChunkBuilder, FormatConfig, Whitespace};
//!
//! let mut builder = ChunkBuilder::new(FormatConfig::default());
//! builder.write("let answer =");
//! builder.write_whitespace(Whitespace::Space);
//! builder.write("42;");
//! let result = builder.end();
//! assert_eq!(result.text, "let answer = 42;\n");
//! ```
//!
//! # Architecture
//!
//! Three components cooperate, leaves first:
//!
//! 1. **Rule graph** ([`rule`]): every potential line break is owned by
//!    a *rule* holding one of a few discrete values; the value decides
//!    which of its breaks fire. Rules constrain each other (positional
//!    arguments splitting force named arguments apart) and harden
//!    transitively when a mandatory break lands in their scope.
//! 2. **Chunk builder** ([`builder`]): folds the event stream into a
//!    vector of *chunks* (text runs ending in potential splits),
//!    interleaving pending whitespace, comments, and child blocks.
//! 3. **Line writer** (the `writer` module): cuts the chunk vector at
//!    divide markers and, per partition, searches the rule values for
//!    the layout minimizing overflow plus split and span costs.
//!
//! Overflowing the page width is a cost, not an error: when nothing
//! fits, the least-overflowing layout is still produced.

pub mod builder;
pub mod chunk;
pub mod comment;
pub mod config;
pub mod nesting;
pub mod rule;
pub mod source;
pub mod whitespace;

pub(crate) mod writer;

pub use builder::ChunkBuilder;
pub use chunk::{Span, SpanId, SplitInfo};
pub use comment::SourceComment;
pub use config::{cost, FormatConfig, DEFAULT_PAGE_WIDTH, INDENT_SIZE};
pub use nesting::NestingId;
pub use rule::RuleId;
pub use source::FormatResult;
pub use whitespace::Whitespace;
