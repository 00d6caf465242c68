use super::*;

fn config(page_width: usize) -> FormatConfig {
    FormatConfig {
        page_width,
        ..FormatConfig::default()
    }
}

fn builder() -> ChunkBuilder {
    ChunkBuilder::new(FormatConfig::default())
}

#[test]
fn pending_space_realized_before_next_token() {
    let mut b = builder();
    b.write("let x =");
    b.write_whitespace(Whitespace::Space);
    b.write("1;");
    assert_eq!(b.end().text, "let x = 1;\n");
}

#[test]
fn pending_newline_becomes_hard_split() {
    let mut b = builder();
    b.write("a;");
    b.write_whitespace(Whitespace::Newline);
    b.write("b;");
    assert_eq!(b.end().text, "a;\nb;\n");
}

#[test]
fn two_newlines_keep_one_blank_line() {
    let mut b = builder();
    b.write("a;");
    b.write_whitespace(Whitespace::TwoNewlines);
    b.write("b;");
    assert_eq!(b.end().text, "a;\n\nb;\n");
}

#[test]
fn leading_space_is_dropped() {
    let mut b = builder();
    b.write_whitespace(Whitespace::Space);
    b.write("a;");
    assert_eq!(b.end().text, "a;\n");
}

#[test]
#[should_panic(expected = "preserve_newlines")]
fn ambiguous_whitespace_requires_resolution() {
    let mut b = builder();
    b.write("a");
    b.write_whitespace(Whitespace::SpaceOrNewline);
    b.write("b");
}

#[test]
fn preserve_newlines_resolves_to_space() {
    let mut b = builder();
    b.write("a");
    b.write_whitespace(Whitespace::SpaceOrNewline);
    b.preserve_newlines(0);
    b.write("b");
    assert_eq!(b.end().text, "a b\n");
}

#[test]
fn preserve_newlines_resolves_to_newline() {
    let mut b = builder();
    b.write("a");
    b.write_whitespace(Whitespace::OneOrTwoNewlines);
    b.preserve_newlines(1);
    b.write("b");
    assert_eq!(b.end().text, "a\nb\n");

    let mut b = builder();
    b.write("a");
    b.write_whitespace(Whitespace::OneOrTwoNewlines);
    b.preserve_newlines(4);
    b.write("b");
    assert_eq!(b.end().text, "a\n\nb\n");
}

#[test]
fn soft_split_stays_inline_when_it_fits() {
    let mut b = builder();
    b.start_rule(None);
    b.write("aaaa");
    b.split(true, None, false);
    b.write("bbbb");
    b.end_rule();
    assert_eq!(b.end().text, "aaaa bbbb\n");
}

#[test]
fn soft_split_fires_when_line_overflows() {
    let mut b = ChunkBuilder::new(config(10));
    b.start_rule(None);
    b.write("aaaaaa");
    b.split(false, None, false);
    b.write("bbbbbb");
    b.end_rule();
    assert_eq!(b.end().text, "aaaaaa\nbbbbbb\n");
}

#[test]
fn statement_indent_applies_to_split_lines() {
    let mut b = builder();
    b.write("{");
    b.indent();
    b.write_whitespace(Whitespace::Newline);
    b.write("body;");
    b.unindent();
    b.write_whitespace(Whitespace::Newline);
    b.write("}");
    assert_eq!(b.end().text, "{\n  body;\n}\n");
}

#[test]
fn expression_nesting_indents_continuation() {
    let mut b = ChunkBuilder::new(config(8));
    b.write("x =");
    b.nest_expression(Some(2), true);
    b.start_rule(None);
    b.split(true, None, false);
    b.write("aaaaaa");
    b.end_rule();
    b.unnest();
    assert_eq!(b.end().text, "x =\n  aaaaaa\n");
}

#[test]
fn pending_nesting_commits_at_next_token() {
    let mut b = ChunkBuilder::new(config(4));
    b.start_rule(None);
    b.write("a =");
    b.nest_expression(Some(2), false);
    // The nesting is still pending: this split stays at block level.
    b.split(true, None, false);
    b.write("bbbb");
    b.unnest();
    b.end_rule();
    // The continuation line starts at column 0, not 2.
    assert_eq!(b.end().text, "a =\nbbbb\n");
}

#[test]
fn hard_split_hardens_enclosing_rules() {
    let mut b = builder();
    b.start_rule(None);
    b.write("first");
    b.split(true, None, false);
    b.write("second");
    b.write_whitespace(Whitespace::Newline);
    b.write("third");
    b.end_rule();
    // Everything fits on one line, but the mandatory newline inside
    // the rule's scope forces its other split too.
    assert_eq!(b.end().text, "first\nsecond\nthird\n");
}

#[test]
fn force_rules_hardens_active_rules() {
    let mut b = builder();
    b.start_rule(None);
    b.write("a");
    b.split(true, None, false);
    b.write("b");
    b.force_rules();
    b.end_rule();
    assert_eq!(b.end().text, "a\nb\n");
}

#[test]
fn lazy_rule_scope_begins_after_next_token() {
    let mut b = builder();
    b.write("import 'a'");
    b.start_lazy_rule(None);
    b.write_whitespace(Whitespace::Newline);
    // The mandatory newline lands before the lazy rule activates, so
    // the rule is not hardened by it.
    b.write("show");
    b.split(true, None, false);
    b.write("x;");
    b.end_rule();
    assert_eq!(b.end().text, "import 'a'\nshow x;\n");
}

#[test]
fn end_rule_cancels_unactivated_lazy_rule() {
    let mut b = builder();
    b.write("a");
    b.start_lazy_rule(None);
    b.end_rule();
    b.write("b");
    assert_eq!(b.end().text, "ab\n");
}

#[test]
#[should_panic(expected = "outside any rule scope")]
fn split_without_rule_scope_panics() {
    let mut b = builder();
    b.write("a");
    b.split(false, None, false);
}

#[test]
#[should_panic(expected = "unclosed rule scope")]
fn unclosed_rule_scope_fails_end() {
    let mut b = builder();
    b.start_rule(None);
    b.write("a");
    let _ = b.end();
}

#[test]
fn pending_space_on_ended_chunk_becomes_split_space() {
    let mut b = builder();
    b.start_rule(None);
    b.write("a");
    b.write_whitespace(Whitespace::Space);
    b.split(false, None, false);
    b.write("b");
    b.end_rule();
    // The space survives as the split's unsplit rendering.
    assert_eq!(b.end().text, "a b\n");
}

// -- Comments -----------------------------------------------------------

#[test]
fn trailing_line_comment_adheres_to_previous_text() {
    let mut b = builder();
    b.write("a;");
    b.write_whitespace(Whitespace::Newline);
    b.write_comments(vec![SourceComment::line("// c", 0)], 1, "b;");
    b.write("b;");
    assert_eq!(b.end().text, "a; // c\nb;\n");
}

#[test]
fn own_line_comment_splits_before_and_after() {
    let mut b = builder();
    b.write("a;");
    b.write_whitespace(Whitespace::Newline);
    b.write_comments(vec![SourceComment::line("// note", 1)], 1, "b;");
    b.write("b;");
    assert_eq!(b.end().text, "a;\n// note\nb;\n");
}

#[test]
fn comment_keeps_blank_line_from_source() {
    let mut b = builder();
    b.write("a;");
    b.write_whitespace(Whitespace::Newline);
    b.write_comments(vec![SourceComment::line("// far", 2)], 1, "b;");
    b.write("b;");
    assert_eq!(b.end().text, "a;\n\n// far\nb;\n");
}

#[test]
fn pending_blank_line_is_spent_on_the_token_gap() {
    let mut b = builder();
    b.write("a;");
    b.write_whitespace(Whitespace::TwoNewlines);
    // The comment sits right before the token; the token itself is two
    // lines further down, so the blank line moves after the comment.
    b.write_comments(vec![SourceComment::line("// c", 1)], 2, "b;");
    b.write("b;");
    assert_eq!(b.end().text, "a;\n// c\n\nb;\n");
}

#[test]
fn inline_comment_run_moves_newline_before_it() {
    // The comment shares the token's source line, so it must not stay
    // glued to `a;` when the formatter puts the token on a new line.
    let mut b = builder();
    b.write("a;");
    b.write_whitespace(Whitespace::Newline);
    b.write_comments(vec![SourceComment::block("/* c */", 0)], 0, "b;");
    b.write("b;");
    assert_eq!(b.end().text, "a;\n/* c */\nb;\n");
}

#[test]
fn inline_comment_mid_line_gets_no_space_after_open_paren() {
    let mut b = builder();
    b.write("f(");
    b.write_comments(vec![SourceComment::block("/* c */", 0)], 0, "x");
    b.write("x);");
    assert_eq!(b.end().text, "f(/* c */ x);\n");
}

#[test]
fn no_trailing_space_before_closing_punctuation() {
    let mut b = builder();
    b.write("f(x");
    b.write_comments(vec![SourceComment::block("/* c */", 0)], 0, ")");
    b.write(");");
    assert_eq!(b.end().text, "f(x /* c */);\n");
}

#[test]
fn multiline_block_comment_forces_newline_after() {
    let mut b = builder();
    b.write("a;");
    b.write_whitespace(Whitespace::Newline);
    b.write_comments(vec![SourceComment::block("/* one\n   two */", 1)], 0, "b;");
    b.write("b;");
    assert_eq!(b.end().text, "a;\n/* one\n   two */\nb;\n");
}

#[test]
fn flush_left_comment_starts_at_column_zero() {
    let mut b = builder();
    b.write("{");
    b.indent();
    b.write_whitespace(Whitespace::Newline);
    b.write("a;");
    b.write_whitespace(Whitespace::Newline);
    let comment = SourceComment {
        text: "// left".to_string(),
        lines_before: 1,
        is_line_comment: true,
        flush_left: true,
        selection_start: None,
        selection_end: None,
    };
    b.write_comments(vec![comment], 1, "b;");
    b.write("b;");
    b.unindent();
    b.write_whitespace(Whitespace::Newline);
    b.write("}");
    assert_eq!(b.end().text, "{\n  a;\n// left\n  b;\n}\n");
}

#[test]
fn comments_only_between_tokens_preserve_gap_resolution() {
    let mut b = builder();
    b.write("a;");
    b.write_whitespace(Whitespace::OneOrTwoNewlines);
    b.write_comments(Vec::new(), 1, "b;");
    b.write("b;");
    assert_eq!(b.end().text, "a;\nb;\n");
}

// -- Blocks -------------------------------------------------------------

#[test]
fn block_with_hard_split_forces_surrounding_rule() {
    let mut b = builder();
    b.start_rule(None);
    b.write("f(");
    b.split(false, None, false);
    b.write("() {");
    b = b.start_block();
    b.write("body;");
    b.write_whitespace(Whitespace::Newline);
    b = b.end_block(false, false);
    b.split(false, None, false);
    b.write("});");
    b.end_rule();
    assert_eq!(b.end().text, "f(\n() {\n  body;\n});\n");
}

#[test]
fn block_trailing_split_can_be_ignored() {
    let mut b = builder();
    b.start_rule(None);
    b.write("f(");
    b.split(false, None, false);
    b.write("() {");
    b = b.start_block();
    b.write("body;");
    b.write_whitespace(Whitespace::Newline);
    b = b.end_block(true, false);
    b.split(false, None, false);
    b.write("});");
    b.end_rule();
    // Only the trailing newline was in the block, so everything fits
    // on one line and the block renders inline.
    assert_eq!(b.end().text, "f(() {body;});\n");
}

#[test]
fn end_block_force_split_overrides_ignore() {
    let mut b = builder();
    b.start_rule(None);
    b.write("f(");
    b.split(false, None, false);
    b.write("() {");
    b = b.start_block();
    b.write("body;");
    b.write_whitespace(Whitespace::Newline);
    b = b.end_block(true, true);
    b.split(false, None, false);
    b.write("});");
    b.end_rule();
    assert_eq!(b.end().text, "f(\n() {\n  body;\n});\n");
}

#[test]
fn forced_rule_state_survives_end_block() {
    // Two block arguments in one call: a force inside the first block
    // must still be in effect after the second one closes.
    let mut b = builder();
    b.start_rule(None);
    b.write("f(");
    b.split(false, None, false);
    b.write("() {");
    b = b.start_block();
    b.write("long;");
    b.write_whitespace(Whitespace::Newline);
    b = b.end_block(false, false); // forces the argument rule
    b.split(false, None, false);
    b.write("},");
    b.write_whitespace(Whitespace::Space);
    b.write("() {");
    b = b.start_block();
    b.write("ok;");
    b.write_whitespace(Whitespace::Newline);
    b = b.end_block(true, false); // would not force on its own
    b.split(false, None, false);
    b.write("});");
    b.end_rule();
    // The second block breaks too: its argument rule stayed forced.
    assert_eq!(b.end().text, "f(\n() {\n  long;\n}, () {\n  ok;\n});\n");
}

#[test]
fn block_argument_nesting_sets_block_indent() {
    let mut b = builder();
    b.start_rule(None);
    b.write("g(");
    b.indent();
    b.start_block_argument_nesting(); // snapshot indent 2
    b.unindent();
    b.split(false, None, false);
    b.write("() {");
    b = b.start_block();
    b.write("x;");
    b.write_whitespace(Whitespace::Newline);
    b = b.end_block(false, false);
    b.split(false, None, false);
    b.write("});");
    b.end_block_argument_nesting();
    b.end_rule();
    // The block indents one level past the snapshot (2 + 2), not past
    // the indentation current when it opened (0 + 2).
    assert_eq!(b.end().text, "g(\n() {\n    x;\n});\n");
}

#[test]
#[should_panic(expected = "end_block without start_block")]
fn unbalanced_end_block_panics() {
    let b = builder();
    let _ = b.end_block(false, false);
}

// -- Selections ---------------------------------------------------------

#[test]
fn selection_offsets_survive_formatting() {
    let mut b = builder();
    b.write("before");
    b.write_whitespace(Whitespace::Newline);
    b.write("selected");
    b.start_selection_from_end(8);
    b.end_selection_from_end(0);
    b.write_whitespace(Whitespace::Newline);
    b.write("after");

    let result = b.end();
    assert_eq!(result.text, "before\nselected\nafter\n");
    assert_eq!(result.selection_start, Some(7));
    assert_eq!(result.selection_length, Some(8));
}

#[test]
fn selection_inside_comment_is_tracked() {
    let mut b = builder();
    b.write("a;");
    b.write_whitespace(Whitespace::Newline);
    let comment = SourceComment {
        selection_start: Some(3),
        selection_end: Some(7),
        ..SourceComment::line("// pick me", 1)
    };
    b.write_comments(vec![comment], 1, "b;");
    b.write("b;");

    let result = b.end();
    assert_eq!(result.text, "a;\n// pick me\nb;\n");
    assert_eq!(result.selection_start, Some(6));
    assert_eq!(result.selection_length, Some(4));
}

#[test]
fn empty_input_formats_to_empty_output() {
    let b = builder();
    let result = b.end();
    assert_eq!(result.text, "");
}

#[test]
fn statement_config_omits_trailing_newline() {
    let mut b = ChunkBuilder::new(FormatConfig::statement(0));
    b.write("a;");
    assert_eq!(b.end().text, "a;");
}
