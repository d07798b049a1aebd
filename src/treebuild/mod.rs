//! The document layer: a stream of lazily parsed documents over the
//! scanner's token pull.

mod node;

pub use node::{
    AliasNode, KeyValueNode, MappingEntries, MappingNode, MappingStyle, Node, NodeKind,
    ScalarNode, SeqStyle, SequenceEntries, SequenceNode,
};

use std::cell::{Cell, RefCell};

use crate::encoding::Encoding;
use crate::error::{DiagnosticSink, ScanError};
use crate::tokenizer::{Scanner, Token, TokenKind};
use node::{skip_node, NodeEntry, NodeId};

/// Per-document parse state: the node arena, the root slot, and a
/// generation counter that invalidates handles of superseded documents.
pub(crate) struct DocState {
    pub(crate) nodes: Vec<NodeEntry>,
    pub(crate) root: Option<NodeId>,
    pub(crate) generation: u32,
}

pub(crate) struct StreamCore<'i> {
    pub(crate) input: &'i [u8],
    pub(crate) scanner: RefCell<Scanner<'i>>,
    pub(crate) doc: RefCell<DocState>,
}

impl<'i> StreamCore<'i> {
    pub(crate) fn peek(&self) -> Token {
        self.scanner.borrow_mut().peek()
    }

    pub(crate) fn pop(&self) -> Token {
        self.scanner.borrow_mut().pop()
    }

    pub(crate) fn failed(&self) -> bool {
        self.scanner.borrow().failed()
    }

    pub(crate) fn error(&self, kind: ScanError, token: &Token) {
        self.scanner
            .borrow_mut()
            .report_error(kind, kind.message(), token.span);
    }

    pub(crate) fn alloc(&self, entry: NodeEntry) -> NodeId {
        let mut doc = self.doc.borrow_mut();
        doc.nodes.push(entry);
        doc.nodes.len() - 1
    }

    fn generation(&self) -> u32 {
        self.doc.borrow().generation
    }

    /// Reset the document in place: fresh arena, new generation, then
    /// consume any directives and an optional `DocumentStart`.
    fn begin_document(&self) {
        {
            let mut doc = self.doc.borrow_mut();
            doc.nodes.clear();
            doc.root = None;
            doc.generation += 1;
        }
        if self.parse_directives() {
            let token = self.pop();
            if token.kind != TokenKind::DocumentStart {
                self.error(ScanError::UnexpectedToken, &token);
            }
        }
        if self.peek().kind == TokenKind::DocumentStart {
            self.pop();
        }
    }

    /// Consume `%YAML` and `%TAG` directive tokens. The version value is
    /// captured by the scanner but intentionally not interpreted; tag
    /// directives are discarded.
    fn parse_directives(&self) -> bool {
        let mut saw_directive = false;
        loop {
            match self.peek().kind {
                TokenKind::VersionDirective | TokenKind::TagDirective => {
                    self.pop();
                    saw_directive = true;
                }
                _ => break,
            }
        }
        saw_directive
    }

    /// Parse the root node if it has not been parsed yet.
    fn ensure_root(&self) -> NodeId {
        if let Some(root) = self.doc.borrow().root {
            return root;
        }
        let root = self
            .parse_block_node()
            .unwrap_or_else(|| self.alloc(NodeEntry::null()));
        self.doc.borrow_mut().root = Some(root);
        root
    }

    /// Drain the rest of the current document. Returns true when another
    /// document follows.
    fn finish_document(&self) -> bool {
        if self.failed() {
            return false;
        }
        let root = self.ensure_root();
        skip_node(self, root);
        loop {
            if self.failed() {
                return false;
            }
            let token = self.peek();
            match token.kind {
                TokenKind::StreamEnd | TokenKind::Error => return false,
                TokenKind::DocumentEnd => {
                    self.pop();
                }
                // A closer or separator can never begin a document.
                TokenKind::FlowSequenceEnd
                | TokenKind::FlowMappingEnd
                | TokenKind::FlowEntry
                | TokenKind::Value
                | TokenKind::BlockEnd => {
                    self.error(ScanError::UnexpectedToken, &token);
                    return false;
                }
                _ => return true,
            }
        }
    }
}

/// A YAML stream over a byte buffer. Owns the scanner and, at any moment,
/// at most one live document.
pub struct Stream<'i> {
    core: StreamCore<'i>,
    started: Cell<bool>,
}

impl<'i> Stream<'i> {
    pub fn new(input: &'i [u8], sink: Box<dyn DiagnosticSink + 'i>) -> Stream<'i> {
        Stream {
            core: StreamCore {
                input,
                scanner: RefCell::new(Scanner::new(input, sink)),
                doc: RefCell::new(DocState {
                    nodes: Vec::new(),
                    root: None,
                    generation: 0,
                }),
            },
            started: Cell::new(false),
        }
    }

    /// Iterate the documents of the stream. May only be called once.
    pub fn documents(&self) -> Documents<'_, 'i> {
        assert!(!self.started.get(), "a stream may only be iterated once");
        self.started.set(true);
        Documents {
            core: &self.core,
            state: IterState::NotStarted,
        }
    }

    pub fn failed(&self) -> bool {
        self.core.failed()
    }

    pub fn encoding(&self) -> Encoding {
        self.core.scanner.borrow().encoding()
    }
}

enum IterState {
    NotStarted,
    Active,
    Done,
}

/// Single-pass iterator over the documents of a stream. Advancing it
/// drains whatever the caller left unread in the current document and
/// rebuilds the document state in place.
pub struct Documents<'a, 'i> {
    core: &'a StreamCore<'i>,
    state: IterState,
}

impl<'a, 'i> Iterator for Documents<'a, 'i> {
    type Item = Document<'a, 'i>;

    fn next(&mut self) -> Option<Document<'a, 'i>> {
        match self.state {
            IterState::NotStarted => {
                self.state = IterState::Active;
                self.core.pop(); // StreamStart
                self.core.begin_document();
                Some(Document {
                    core: self.core,
                    generation: self.core.generation(),
                })
            }
            IterState::Active => {
                if !self.core.finish_document() {
                    self.state = IterState::Done;
                    return None;
                }
                self.core.begin_document();
                Some(Document {
                    core: self.core,
                    generation: self.core.generation(),
                })
            }
            IterState::Done => None,
        }
    }
}

/// One document of the stream. The tree is materialized on demand as the
/// caller walks it; the document's nodes die when the iterator advances.
pub struct Document<'a, 'i> {
    core: &'a StreamCore<'i>,
    generation: u32,
}

impl<'a, 'i> Document<'a, 'i> {
    /// Parse and return the root node. May only be called once per
    /// document.
    pub fn root(&self) -> Node<'a, 'i> {
        debug_assert_eq!(
            self.generation,
            self.core.generation(),
            "document has been superseded"
        );
        assert!(
            self.core.doc.borrow().root.is_none(),
            "root may only be taken once per document"
        );
        let id = self.core.ensure_root();
        Node::new(self.core, id, self.generation)
    }
}
