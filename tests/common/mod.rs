use std::fmt::Write;

use flint_yaml::error::NullSink;
use flint_yaml::treebuild::{MappingStyle, Node, NodeKind, SeqStyle};
use flint_yaml::Stream;

extern crate flint_yaml;

/// Walk every document of `input_yaml` and render the tree as one event
/// line per node, then compare against `expect`.
pub fn assert_eq_event(input_yaml: &str, expect: &str) {
    let stream = Stream::new(input_yaml.as_bytes(), Box::new(NullSink));
    let mut line = String::new();
    for document in stream.documents() {
        line.push_str("\n+DOC");
        render(document.root(), &mut line);
        line.push_str("\n-DOC");
    }
    if stream.failed() {
        line.push_str("\nERR");
    }

    assert_eq!(expect, line, "Error in {input_yaml}");
}

fn render(node: Node, out: &mut String) {
    match node.kind() {
        NodeKind::Null => {
            out.push_str("\n=VAL");
            render_props(node.anchor(), node.tag(), out);
            out.push_str(" :");
        }
        NodeKind::Scalar => {
            let scalar = node.as_scalar().expect("scalar node");
            out.push_str("\n=VAL");
            render_props(node.anchor(), node.tag(), out);
            let style = match scalar.raw_value().first() {
                Some(b'\'') => '\'',
                Some(b'"') => '"',
                Some(b'|') => '|',
                Some(b'>') => '>',
                _ => ':',
            };
            let value = scalar.value();
            out.push(' ');
            out.push(style);
            out.push_str(&display(&value));
        }
        NodeKind::Alias => {
            let alias = node.as_alias().expect("alias node");
            out.push_str("\n=ALI *");
            out.push_str(&String::from_utf8_lossy(alias.name()));
        }
        NodeKind::Mapping => {
            let mapping = node.as_mapping().expect("mapping node");
            out.push_str("\n+MAP");
            if mapping.mapping_style() != MappingStyle::Block {
                out.push_str(" {}");
            }
            render_props(node.anchor(), node.tag(), out);
            for entry in mapping.entries() {
                render(entry.key(), out);
                render(entry.value(), out);
            }
            out.push_str("\n-MAP");
        }
        NodeKind::Sequence => {
            let sequence = node.as_sequence().expect("sequence node");
            out.push_str("\n+SEQ");
            if sequence.seq_style() == SeqStyle::Flow {
                out.push_str(" []");
            }
            render_props(node.anchor(), node.tag(), out);
            for element in sequence.entries() {
                render(element, out);
            }
            out.push_str("\n-SEQ");
        }
        NodeKind::KeyValue => unreachable!("pairs are rendered from their mapping"),
    }
}

fn render_props(anchor: Option<&[u8]>, tag: Option<&[u8]>, out: &mut String) {
    if let Some(anchor) = anchor {
        write!(out, " &{}", String::from_utf8_lossy(anchor)).expect("write anchor");
    }
    if let Some(tag) = tag {
        write!(out, " <{}>", String::from_utf8_lossy(tag)).expect("write tag");
    }
}

fn display(value: &[u8]) -> String {
    let mut out = String::new();
    for c in String::from_utf8_lossy(value).chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}
