mod common;

use flint_yaml::encoding::Encoding;
use flint_yaml::error::NullSink;
use flint_yaml::Stream;

use crate::common::assert_eq_event;

const EXPLICIT_DOC_INPUT: &str = "---\nhello\n...\n";
const EXPLICIT_DOC_EVENTS: &str = r"
+DOC
=VAL :hello
-DOC";

const BARE_DOC_INPUT: &str = "hello\n";
const BARE_DOC_EVENTS: &str = r"
+DOC
=VAL :hello
-DOC";

const DOC_END_INPUT: &str = "a\n...\n";
const DOC_END_EVENTS: &str = r"
+DOC
=VAL :a
-DOC";

#[test]
fn docs_single() {
    assert_eq_event(EXPLICIT_DOC_INPUT, EXPLICIT_DOC_EVENTS);
    assert_eq_event(BARE_DOC_INPUT, BARE_DOC_EVENTS);
    assert_eq_event(DOC_END_INPUT, DOC_END_EVENTS);
}

const MULTI_DOC_INPUT: &str = "---\na\n---\nb\n";
const MULTI_DOC_EVENTS: &str = r"
+DOC
=VAL :a
-DOC
+DOC
=VAL :b
-DOC";

const END_THEN_NEW_INPUT: &str = "a\n...\n---\nb\n";
const END_THEN_NEW_EVENTS: &str = r"
+DOC
=VAL :a
-DOC
+DOC
=VAL :b
-DOC";

#[test]
fn docs_multiple() {
    assert_eq_event(MULTI_DOC_INPUT, MULTI_DOC_EVENTS);
    assert_eq_event(END_THEN_NEW_INPUT, END_THEN_NEW_EVENTS);
}

const VERSION_DIRECTIVE_INPUT: &str = "%YAML 1.2\n---\na\n";
const TAG_DIRECTIVE_INPUT: &str = "%TAG !e! tag:example.com,2000:\n---\na\n";
const RESERVED_DIRECTIVE_INPUT: &str = "%FOO bar\n---\na\n";
const DIRECTIVE_EVENTS: &str = r"
+DOC
=VAL :a
-DOC";

// The version value is captured but not interpreted; %TAG and reserved
// directives are consumed without further effect.
#[test]
fn docs_directives() {
    assert_eq_event(VERSION_DIRECTIVE_INPUT, DIRECTIVE_EVENTS);
    assert_eq_event(TAG_DIRECTIVE_INPUT, DIRECTIVE_EVENTS);
    assert_eq_event(RESERVED_DIRECTIVE_INPUT, DIRECTIVE_EVENTS);
}

const EMPTY_INPUT: &str = "";
const EMPTY_EVENTS: &str = r"
+DOC
=VAL :
-DOC";

const COMMENT_ONLY_INPUT: &str = "# just a comment\n";
const COMMENT_ONLY_EVENTS: &str = r"
+DOC
=VAL :
-DOC";

#[test]
fn docs_empty() {
    assert_eq_event(EMPTY_INPUT, EMPTY_EVENTS);
    assert_eq_event(COMMENT_ONLY_INPUT, COMMENT_ONLY_EVENTS);
}

const BOM_INPUT: &str = "\u{FEFF}a\n";
const BOM_EVENTS: &str = r"
+DOC
=VAL :a
-DOC";

#[test]
fn docs_bom() {
    assert_eq_event(BOM_INPUT, BOM_EVENTS);

    let stream = Stream::new(BOM_INPUT.as_bytes(), Box::new(NullSink));
    assert_eq!(stream.encoding(), Encoding::Utf8);
}

#[test]
#[should_panic(expected = "a stream may only be iterated once")]
fn docs_single_pass_only() {
    let stream = Stream::new(b"a\n", Box::new(NullSink));
    let _first = stream.documents();
    let _second = stream.documents();
}
