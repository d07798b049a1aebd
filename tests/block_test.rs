mod common;

use crate::common::assert_eq_event;

const SEQ_BLOCK_INPUT: &str = "- x\n- y\n";
const SEQ_BLOCK_EVENTS: &str = r"
+DOC
+SEQ
=VAL :x
=VAL :y
-SEQ
-DOC";

const SEQ_NESTED_INPUT: &str = "- - a\n  - b\n";
const SEQ_NESTED_EVENTS: &str = r"
+DOC
+SEQ
+SEQ
=VAL :a
=VAL :b
-SEQ
-SEQ
-DOC";

#[test]
fn block_seq() {
    assert_eq_event(SEQ_BLOCK_INPUT, SEQ_BLOCK_EVENTS);
    assert_eq_event(SEQ_NESTED_INPUT, SEQ_NESTED_EVENTS);
}

const MAP_SIMPLE_INPUT: &str = "a: 1\nb: 2\n";
const MAP_SIMPLE_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL :1
=VAL :b
=VAL :2
-MAP
-DOC";

const MAP_NESTED_INPUT: &str = "key:\n  nested: value\n";
const MAP_NESTED_EVENTS: &str = r"
+DOC
+MAP
=VAL :key
+MAP
=VAL :nested
=VAL :value
-MAP
-MAP
-DOC";

const MAP_SEQ_VALUE_INPUT: &str = "key:\n  - a\n  - b\n";
const MAP_SEQ_VALUE_EVENTS: &str = r"
+DOC
+MAP
=VAL :key
+SEQ
=VAL :a
=VAL :b
-SEQ
-MAP
-DOC";

#[test]
fn block_map() {
    assert_eq_event(MAP_SIMPLE_INPUT, MAP_SIMPLE_EVENTS);
    assert_eq_event(MAP_NESTED_INPUT, MAP_NESTED_EVENTS);
    assert_eq_event(MAP_SEQ_VALUE_INPUT, MAP_SEQ_VALUE_EVENTS);
}

// The `- ` markers sit at the indent of the enclosing key, so the
// sequence is indentless and has no closing token of its own.
const INDENTLESS_INPUT: &str = "key:\n- a\n- b\n";
const INDENTLESS_EVENTS: &str = r"
+DOC
+MAP
=VAL :key
+SEQ
=VAL :a
=VAL :b
-SEQ
-MAP
-DOC";

#[test]
fn block_indentless_seq() {
    assert_eq_event(INDENTLESS_INPUT, INDENTLESS_EVENTS);
}

const EXPLICIT_KEY_INPUT: &str = "? a\n: b\n";
const EXPLICIT_KEY_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL :b
-MAP
-DOC";

#[test]
fn block_explicit_key() {
    assert_eq_event(EXPLICIT_KEY_INPUT, EXPLICIT_KEY_EVENTS);
}

const MULTILINE_PLAIN_INPUT: &str = "a: b\n   c\n";
const MULTILINE_PLAIN_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL :b\n   c
-MAP
-DOC";

#[test]
fn block_multiline_plain() {
    assert_eq_event(MULTILINE_PLAIN_INPUT, MULTILINE_PLAIN_EVENTS);
}

const LITERAL_INPUT: &str = "a: |\n  text\n";
const LITERAL_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL ||\n  text\n
-MAP
-DOC";

const FOLDED_INPUT: &str = "a: >\n  text\n";
const FOLDED_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL >>\n  text\n
-MAP
-DOC";

// Block scalars are surfaced as raw ranges; folding is not interpreted.
#[test]
fn block_scalars_raw() {
    assert_eq_event(LITERAL_INPUT, LITERAL_EVENTS);
    assert_eq_event(FOLDED_INPUT, FOLDED_EVENTS);
}

const ANCHORED_MAP_INPUT: &str = "&m\nkey: value\n";
const ANCHORED_MAP_EVENTS: &str = r"
+DOC
+MAP &m
=VAL :key
=VAL :value
-MAP
-DOC";

const TAGGED_SCALAR_INPUT: &str = "!!int 5\n";
const TAGGED_SCALAR_EVENTS: &str = r"
+DOC
=VAL <!!int> :5
-DOC";

const VERBATIM_TAG_INPUT: &str = "!<tag:x> v\n";
const VERBATIM_TAG_EVENTS: &str = r"
+DOC
=VAL <!<tag:x>> :v
-DOC";

#[test]
fn block_node_properties() {
    assert_eq_event(ANCHORED_MAP_INPUT, ANCHORED_MAP_EVENTS);
    assert_eq_event(TAGGED_SCALAR_INPUT, TAGGED_SCALAR_EVENTS);
    assert_eq_event(VERBATIM_TAG_INPUT, VERBATIM_TAG_EVENTS);
}

const DUP_ANCHOR_INPUT: &str = "&a &b c\n";
const DUP_ANCHOR_EVENTS: &str = r"
+DOC
=VAL :
-DOC
ERR";

const TAB_INDENT_INPUT: &str = "a:\n  b\n\tc\n";
const TAB_INDENT_EVENTS: &str = r"
+DOC
+MAP
=VAL :a
=VAL :
-MAP
-DOC
ERR";

#[test]
fn block_errors() {
    assert_eq_event(DUP_ANCHOR_INPUT, DUP_ANCHOR_EVENTS);
    assert_eq_event(TAB_INDENT_INPUT, TAB_INDENT_EVENTS);
}
