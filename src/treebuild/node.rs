//! Node model and the pull-based collection iterators.
//!
//! Nodes live in a per-document arena and are handed out as lightweight
//! handles carrying a back-reference to the owning stream. Collection
//! iterators are single-pass: each step skips the previous entry, which
//! drives the scanner exactly as far as needed and no further.

use std::borrow::Cow;

use crate::error::ScanError;
use crate::escaper::decode_scalar;
use crate::tokenizer::{Span, TokenKind};
use crate::treebuild::StreamCore;

pub(crate) type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Null,
    Scalar,
    KeyValue,
    Mapping,
    Sequence,
    Alias,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingStyle {
    Block,
    Flow,
    /// A single implicit pair inside a flow sequence, `[key: value]`.
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqStyle {
    Block,
    Flow,
    /// `- ` entries at or below the indent of the enclosing mapping key.
    Indentless,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum NodeData {
    Null,
    Scalar {
        value: Span,
    },
    Alias {
        name: Span,
    },
    KeyValue {
        key: Option<NodeId>,
        value: Option<NodeId>,
    },
    Mapping {
        style: MappingStyle,
        at_begin: bool,
        at_end: bool,
        current: Option<NodeId>,
    },
    Sequence {
        style: SeqStyle,
        at_begin: bool,
        at_end: bool,
        current: Option<NodeId>,
        prev_was_entry: bool,
    },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct NodeEntry {
    pub(crate) anchor: Option<Span>,
    pub(crate) tag: Option<Span>,
    pub(crate) data: NodeData,
}

impl NodeEntry {
    pub(crate) fn null() -> NodeEntry {
        NodeEntry {
            anchor: None,
            tag: None,
            data: NodeData::Null,
        }
    }

    fn mapping(style: MappingStyle) -> NodeData {
        NodeData::Mapping {
            style,
            at_begin: true,
            at_end: false,
            current: None,
        }
    }

    fn sequence(style: SeqStyle) -> NodeData {
        NodeData::Sequence {
            style,
            at_begin: true,
            at_end: false,
            current: None,
            prev_was_entry: true,
        }
    }
}

/// A handle onto one node of the live document.
#[derive(Clone, Copy)]
pub struct Node<'a, 'i> {
    core: &'a StreamCore<'i>,
    id: NodeId,
    generation: u32,
}

impl<'a, 'i> Node<'a, 'i> {
    pub(crate) fn new(core: &'a StreamCore<'i>, id: NodeId, generation: u32) -> Node<'a, 'i> {
        Node {
            core,
            id,
            generation,
        }
    }

    fn entry<R>(&self, read: impl FnOnce(&NodeEntry) -> R) -> R {
        let doc = self.core.doc.borrow();
        debug_assert_eq!(
            self.generation, doc.generation,
            "node of a superseded document"
        );
        read(&doc.nodes[self.id])
    }

    pub fn kind(&self) -> NodeKind {
        self.entry(|entry| match entry.data {
            NodeData::Null => NodeKind::Null,
            NodeData::Scalar { .. } => NodeKind::Scalar,
            NodeData::Alias { .. } => NodeKind::Alias,
            NodeData::KeyValue { .. } => NodeKind::KeyValue,
            NodeData::Mapping { .. } => NodeKind::Mapping,
            NodeData::Sequence { .. } => NodeKind::Sequence,
        })
    }

    /// The anchor name, without the leading `&`.
    pub fn anchor(&self) -> Option<&'i [u8]> {
        let input = self.core.input;
        self.entry(|entry| entry.anchor).map(|span| span.slice(input))
    }

    /// The raw tag span attached to this node, if any. Tags are not
    /// resolved; the bytes include the leading `!`.
    pub fn tag(&self) -> Option<&'i [u8]> {
        let input = self.core.input;
        self.entry(|entry| entry.tag).map(|span| span.slice(input))
    }

    pub fn as_scalar(self) -> Option<ScalarNode<'a, 'i>> {
        (self.kind() == NodeKind::Scalar).then(|| ScalarNode(self))
    }

    pub fn as_mapping(self) -> Option<MappingNode<'a, 'i>> {
        (self.kind() == NodeKind::Mapping).then(|| MappingNode(self))
    }

    pub fn as_sequence(self) -> Option<SequenceNode<'a, 'i>> {
        (self.kind() == NodeKind::Sequence).then(|| SequenceNode(self))
    }

    pub fn as_alias(self) -> Option<AliasNode<'a, 'i>> {
        (self.kind() == NodeKind::Alias).then(|| AliasNode(self))
    }

    pub fn as_key_value(self) -> Option<KeyValueNode<'a, 'i>> {
        (self.kind() == NodeKind::KeyValue).then(|| KeyValueNode(self))
    }

    /// Consume this node's remaining tokens without materializing more of
    /// the tree than the scanner requires.
    pub fn skip(&self) {
        skip_node(self.core, self.id);
    }
}

/// A scalar leaf. The raw range still carries surrounding quotes for the
/// quoted forms.
#[derive(Clone, Copy)]
pub struct ScalarNode<'a, 'i>(Node<'a, 'i>);

impl<'a, 'i> ScalarNode<'a, 'i> {
    pub fn node(&self) -> Node<'a, 'i> {
        self.0
    }

    pub fn anchor(&self) -> Option<&'i [u8]> {
        self.0.anchor()
    }

    /// The exact bytes from the input, escapes and quotes included.
    pub fn raw_value(&self) -> &'i [u8] {
        let input = self.0.core.input;
        self.0
            .entry(|entry| match entry.data {
                NodeData::Scalar { value } => value,
                _ => unreachable!("scalar handle over a non-scalar node"),
            })
            .slice(input)
    }

    /// The decoded value: zero-copy for plain and block scalars, an owned
    /// buffer when quoting or escapes had to be rewritten. An unknown
    /// escape reports `UnknownEscape` and yields an empty value.
    pub fn value(&self) -> Cow<'i, [u8]> {
        let raw = self.raw_value();
        match decode_scalar(raw) {
            Ok(value) => value,
            Err(err) => {
                let start = self.0.entry(|entry| match entry.data {
                    NodeData::Scalar { value } => value.start,
                    _ => 0,
                });
                self.0.core.scanner.borrow_mut().report_error(
                    ScanError::UnknownEscape,
                    ScanError::UnknownEscape.message(),
                    Span::new(start + err.offset, 1),
                );
                Cow::Borrowed(&[])
            }
        }
    }
}

#[derive(Clone, Copy)]
pub struct AliasNode<'a, 'i>(Node<'a, 'i>);

impl<'a, 'i> AliasNode<'a, 'i> {
    pub fn node(&self) -> Node<'a, 'i> {
        self.0
    }

    /// The alias name, without the leading `*`.
    pub fn name(&self) -> &'i [u8] {
        let input = self.0.core.input;
        self.0
            .entry(|entry| match entry.data {
                NodeData::Alias { name } => name,
                _ => unreachable!("alias handle over a non-alias node"),
            })
            .slice(input)
    }
}

/// One `key: value` entry. Both sides resolve lazily and at most once.
#[derive(Clone, Copy)]
pub struct KeyValueNode<'a, 'i>(Node<'a, 'i>);

impl<'a, 'i> KeyValueNode<'a, 'i> {
    pub fn node(&self) -> Node<'a, 'i> {
        self.0
    }

    /// Parse and return the key; missing keys resolve to a null node.
    pub fn key(&self) -> Node<'a, 'i> {
        let id = kv_key(self.0.core, self.0.id);
        Node::new(self.0.core, id, self.0.generation)
    }

    /// Parse and return the value, forcing the key to be consumed first.
    pub fn value(&self) -> Node<'a, 'i> {
        let id = kv_value(self.0.core, self.0.id);
        Node::new(self.0.core, id, self.0.generation)
    }
}

#[derive(Clone, Copy)]
pub struct MappingNode<'a, 'i>(Node<'a, 'i>);

impl<'a, 'i> MappingNode<'a, 'i> {
    pub fn node(&self) -> Node<'a, 'i> {
        self.0
    }

    pub fn anchor(&self) -> Option<&'i [u8]> {
        self.0.anchor()
    }

    pub fn mapping_style(&self) -> MappingStyle {
        self.0.entry(|entry| match entry.data {
            NodeData::Mapping { style, .. } => style,
            _ => unreachable!("mapping handle over a non-mapping node"),
        })
    }

    /// Begin iterating the entries. A mapping may only be iterated once.
    pub fn entries(&self) -> MappingEntries<'a, 'i> {
        let fresh = begin_collection(self.0.core, self.0.id);
        assert!(fresh, "a mapping may only be iterated once");
        MappingEntries { node: self.0 }
    }
}

pub struct MappingEntries<'a, 'i> {
    node: Node<'a, 'i>,
}

impl<'a, 'i> Iterator for MappingEntries<'a, 'i> {
    type Item = KeyValueNode<'a, 'i>;

    fn next(&mut self) -> Option<KeyValueNode<'a, 'i>> {
        mapping_increment(self.node.core, self.node.id);
        collection_current(self.node.core, self.node.id)
            .map(|id| KeyValueNode(Node::new(self.node.core, id, self.node.generation)))
    }
}

#[derive(Clone, Copy)]
pub struct SequenceNode<'a, 'i>(Node<'a, 'i>);

impl<'a, 'i> SequenceNode<'a, 'i> {
    pub fn node(&self) -> Node<'a, 'i> {
        self.0
    }

    pub fn anchor(&self) -> Option<&'i [u8]> {
        self.0.anchor()
    }

    pub fn seq_style(&self) -> SeqStyle {
        self.0.entry(|entry| match entry.data {
            NodeData::Sequence { style, .. } => style,
            _ => unreachable!("sequence handle over a non-sequence node"),
        })
    }

    /// Begin iterating the elements. A sequence may only be iterated once.
    pub fn entries(&self) -> SequenceEntries<'a, 'i> {
        let fresh = begin_collection(self.0.core, self.0.id);
        assert!(fresh, "a sequence may only be iterated once");
        SequenceEntries { node: self.0 }
    }
}

pub struct SequenceEntries<'a, 'i> {
    node: Node<'a, 'i>,
}

impl<'a, 'i> Iterator for SequenceEntries<'a, 'i> {
    type Item = Node<'a, 'i>;

    fn next(&mut self) -> Option<Node<'a, 'i>> {
        sequence_increment(self.node.core, self.node.id);
        collection_current(self.node.core, self.node.id)
            .map(|id| Node::new(self.node.core, id, self.node.generation))
    }
}

impl<'i> StreamCore<'i> {
    /// Parse a node at the current token. Drains a chain of properties
    /// first: any number of tags (the last span wins) and at most one
    /// anchor. Returns `None` only on an `Error` token.
    pub(crate) fn parse_block_node(&self) -> Option<NodeId> {
        let mut anchor: Option<Span> = None;
        let mut tag: Option<Span> = None;
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Anchor => {
                    if anchor.is_some() {
                        self.error(ScanError::DuplicateAnchor, &token);
                        return None;
                    }
                    anchor = Some(Span::new(token.span.start + 1, token.span.len - 1));
                    self.pop();
                }
                TokenKind::Tag => {
                    tag = Some(token.span);
                    self.pop();
                }
                _ => break,
            }
        }

        let token = self.peek();
        let data = match token.kind {
            TokenKind::Alias => {
                self.pop();
                NodeData::Alias {
                    name: Span::new(token.span.start + 1, token.span.len - 1),
                }
            }
            TokenKind::BlockSequenceStart => {
                self.pop();
                NodeEntry::sequence(SeqStyle::Block)
            }
            TokenKind::BlockMappingStart => {
                self.pop();
                NodeEntry::mapping(MappingStyle::Block)
            }
            TokenKind::FlowSequenceStart => {
                self.pop();
                NodeEntry::sequence(SeqStyle::Flow)
            }
            TokenKind::FlowMappingStart => {
                self.pop();
                NodeEntry::mapping(MappingStyle::Flow)
            }
            // An unindented entry sequence; the token stays for the
            // sequence iterator.
            TokenKind::BlockEntry => NodeEntry::sequence(SeqStyle::Indentless),
            TokenKind::Scalar => {
                self.pop();
                NodeData::Scalar { value: token.span }
            }
            // The token stays for the key-value node.
            TokenKind::Key => NodeEntry::mapping(MappingStyle::Inline),
            TokenKind::Error => return None,
            // DocumentStart, DocumentEnd, StreamEnd and anything else.
            _ => NodeData::Null,
        };
        Some(self.alloc(NodeEntry { anchor, tag, data }))
    }
}

fn kind_of(core: &StreamCore<'_>, id: NodeId) -> NodeKind {
    match core.doc.borrow().nodes[id].data {
        NodeData::Null => NodeKind::Null,
        NodeData::Scalar { .. } => NodeKind::Scalar,
        NodeData::Alias { .. } => NodeKind::Alias,
        NodeData::KeyValue { .. } => NodeKind::KeyValue,
        NodeData::Mapping { .. } => NodeKind::Mapping,
        NodeData::Sequence { .. } => NodeKind::Sequence,
    }
}

/// Clear `at_begin`, returning whether it was still set.
fn begin_collection(core: &StreamCore<'_>, id: NodeId) -> bool {
    let mut doc = core.doc.borrow_mut();
    match &mut doc.nodes[id].data {
        NodeData::Mapping { at_begin, .. } | NodeData::Sequence { at_begin, .. } => {
            std::mem::replace(at_begin, false)
        }
        _ => false,
    }
}

fn collection_current(core: &StreamCore<'_>, id: NodeId) -> Option<NodeId> {
    match core.doc.borrow().nodes[id].data {
        NodeData::Mapping { current, .. } | NodeData::Sequence { current, .. } => current,
        _ => None,
    }
}

fn collection_flags(core: &StreamCore<'_>, id: NodeId) -> (bool, bool) {
    match core.doc.borrow().nodes[id].data {
        NodeData::Mapping {
            at_begin, at_end, ..
        }
        | NodeData::Sequence {
            at_begin, at_end, ..
        } => (at_begin, at_end),
        _ => (false, true),
    }
}

fn set_current(core: &StreamCore<'_>, id: NodeId, entry: Option<NodeId>) {
    let mut doc = core.doc.borrow_mut();
    match &mut doc.nodes[id].data {
        NodeData::Mapping { current, .. } | NodeData::Sequence { current, .. } => *current = entry,
        _ => {}
    }
}

fn set_at_end(core: &StreamCore<'_>, id: NodeId) {
    let mut doc = core.doc.borrow_mut();
    match &mut doc.nodes[id].data {
        NodeData::Mapping {
            at_end, current, ..
        }
        | NodeData::Sequence {
            at_end, current, ..
        } => {
            *at_end = true;
            *current = None;
        }
        _ => {}
    }
}

fn set_prev_was_entry(core: &StreamCore<'_>, id: NodeId, value: bool) {
    let mut doc = core.doc.borrow_mut();
    if let NodeData::Sequence { prev_was_entry, .. } = &mut doc.nodes[id].data {
        *prev_was_entry = value;
    }
}

fn mapping_style_of(core: &StreamCore<'_>, id: NodeId) -> MappingStyle {
    match core.doc.borrow().nodes[id].data {
        NodeData::Mapping { style, .. } => style,
        _ => MappingStyle::Block,
    }
}

fn seq_style_of(core: &StreamCore<'_>, id: NodeId) -> SeqStyle {
    match core.doc.borrow().nodes[id].data {
        NodeData::Sequence { style, .. } => style,
        _ => SeqStyle::Block,
    }
}

/// Advance a mapping to its next entry.
pub(crate) fn mapping_increment(core: &StreamCore<'_>, id: NodeId) {
    if core.failed() {
        set_at_end(core, id);
        return;
    }
    if let Some(entry) = collection_current(core, id) {
        skip_node(core, entry);
        if mapping_style_of(core, id) == MappingStyle::Inline {
            // An inline mapping holds exactly one pair.
            set_at_end(core, id);
            return;
        }
    }

    let token = core.peek();
    match token.kind {
        // The key-value node consumes the Key itself so it can detect
        // null keys.
        TokenKind::Key | TokenKind::Scalar => {
            let entry = core.alloc(NodeEntry {
                anchor: None,
                tag: None,
                data: NodeData::KeyValue {
                    key: None,
                    value: None,
                },
            });
            set_current(core, id, Some(entry));
        }
        _ if mapping_style_of(core, id) == MappingStyle::Block => {
            match token.kind {
                TokenKind::BlockEnd => {
                    core.pop();
                }
                TokenKind::Error => {}
                _ => core.error(ScanError::UnexpectedToken, &token),
            }
            set_at_end(core, id);
        }
        _ => match token.kind {
            TokenKind::FlowEntry => {
                core.pop();
                mapping_increment(core, id);
            }
            TokenKind::FlowMappingEnd => {
                core.pop();
                set_at_end(core, id);
            }
            TokenKind::Error => set_at_end(core, id),
            _ => {
                core.error(ScanError::UnexpectedToken, &token);
                set_at_end(core, id);
            }
        },
    }
}

/// Advance a sequence to its next element.
pub(crate) fn sequence_increment(core: &StreamCore<'_>, id: NodeId) {
    if core.failed() {
        set_at_end(core, id);
        return;
    }
    if let Some(entry) = collection_current(core, id) {
        skip_node(core, entry);
    }

    let token = core.peek();
    match seq_style_of(core, id) {
        SeqStyle::Block => match token.kind {
            TokenKind::BlockEntry => {
                core.pop();
                match core.parse_block_node() {
                    Some(node) => set_current(core, id, Some(node)),
                    None => set_at_end(core, id),
                }
            }
            TokenKind::BlockEnd => {
                core.pop();
                set_at_end(core, id);
            }
            TokenKind::Error => set_at_end(core, id),
            _ => {
                core.error(ScanError::UnexpectedToken, &token);
                set_at_end(core, id);
            }
        },
        SeqStyle::Indentless => match token.kind {
            TokenKind::BlockEntry => {
                core.pop();
                match core.parse_block_node() {
                    Some(node) => set_current(core, id, Some(node)),
                    None => set_at_end(core, id),
                }
            }
            // An indentless sequence has no closing token.
            _ => set_at_end(core, id),
        },
        SeqStyle::Flow => match token.kind {
            TokenKind::FlowEntry => {
                core.pop();
                set_prev_was_entry(core, id, true);
                sequence_increment(core, id);
            }
            TokenKind::FlowSequenceEnd => {
                core.pop();
                set_at_end(core, id);
            }
            TokenKind::Error => set_at_end(core, id),
            TokenKind::StreamEnd | TokenKind::DocumentEnd | TokenKind::DocumentStart => {
                core.error(ScanError::UnterminatedFlow, &token);
                set_at_end(core, id);
            }
            _ => {
                let was_entry = match core.doc.borrow().nodes[id].data {
                    NodeData::Sequence { prev_was_entry, .. } => prev_was_entry,
                    _ => false,
                };
                if !was_entry {
                    core.error(ScanError::MissingFlowSeparator, &token);
                    set_at_end(core, id);
                } else {
                    match core.parse_block_node() {
                        Some(node) => {
                            set_current(core, id, Some(node));
                            set_prev_was_entry(core, id, false);
                        }
                        None => set_at_end(core, id),
                    }
                }
            }
        },
    }
}

/// Resolve the key of a key-value pair, handling implicit and explicit
/// null keys.
pub(crate) fn kv_key(core: &StreamCore<'_>, id: NodeId) -> NodeId {
    if let NodeData::KeyValue { key: Some(key), .. } = core.doc.borrow().nodes[id].data {
        return key;
    }

    let token = core.peek();
    let key = match token.kind {
        TokenKind::BlockEnd | TokenKind::Value | TokenKind::Error => core.alloc(NodeEntry::null()),
        _ => {
            if token.kind == TokenKind::Key {
                core.pop();
            }
            let token = core.peek();
            match token.kind {
                // An explicit key with nothing behind it.
                TokenKind::BlockEnd | TokenKind::Value => core.alloc(NodeEntry::null()),
                _ => core
                    .parse_block_node()
                    .unwrap_or_else(|| core.alloc(NodeEntry::null())),
            }
        }
    };

    if let NodeData::KeyValue { key: slot, .. } = &mut core.doc.borrow_mut().nodes[id].data {
        *slot = Some(key);
    }
    key
}

/// Resolve the value of a key-value pair. Forces the key to be fully
/// consumed first.
pub(crate) fn kv_value(core: &StreamCore<'_>, id: NodeId) -> NodeId {
    if let NodeData::KeyValue {
        value: Some(value), ..
    } = core.doc.borrow().nodes[id].data
    {
        return value;
    }

    let key = kv_key(core, id);
    skip_node(core, key);

    let value = if core.failed() {
        core.alloc(NodeEntry::null())
    } else {
        let token = core.peek();
        match token.kind {
            TokenKind::BlockEnd
            | TokenKind::FlowMappingEnd
            | TokenKind::Key
            | TokenKind::FlowEntry
            | TokenKind::Error => core.alloc(NodeEntry::null()),
            TokenKind::Value => {
                core.pop();
                let token = core.peek();
                match token.kind {
                    // An explicit value with nothing behind it.
                    TokenKind::BlockEnd | TokenKind::Key => core.alloc(NodeEntry::null()),
                    _ => core
                        .parse_block_node()
                        .unwrap_or_else(|| core.alloc(NodeEntry::null())),
                }
            }
            _ => {
                core.error(ScanError::UnexpectedToken, &token);
                core.alloc(NodeEntry::null())
            }
        }
    };

    if let NodeData::KeyValue { value: slot, .. } = &mut core.doc.borrow_mut().nodes[id].data {
        *slot = Some(value);
    }
    value
}

/// Drain the tokens of an entire subtree. Skipping an already-iterated
/// collection is a no-op; skipping one mid-iteration is a caller bug.
pub(crate) fn skip_node(core: &StreamCore<'_>, id: NodeId) {
    match kind_of(core, id) {
        NodeKind::Null | NodeKind::Scalar | NodeKind::Alias => {}
        NodeKind::KeyValue => {
            let key = kv_key(core, id);
            skip_node(core, key);
            let value = kv_value(core, id);
            skip_node(core, value);
        }
        NodeKind::Mapping => {
            let (at_begin, at_end) = collection_flags(core, id);
            debug_assert!(at_begin || at_end, "cannot skip a half-iterated mapping");
            if at_begin {
                begin_collection(core, id);
                loop {
                    mapping_increment(core, id);
                    if collection_current(core, id).is_none() {
                        break;
                    }
                }
            }
        }
        NodeKind::Sequence => {
            let (at_begin, at_end) = collection_flags(core, id);
            debug_assert!(at_begin || at_end, "cannot skip a half-iterated sequence");
            if at_begin {
                begin_collection(core, id);
                loop {
                    sequence_increment(core, id);
                    if collection_current(core, id).is_none() {
                        break;
                    }
                }
            }
        }
    }
}
