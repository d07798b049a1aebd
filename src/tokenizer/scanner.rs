//! The pull tokenizer.
//!
//! Tokens are produced on demand into a queue backed by an arena, so that
//! a token can be referenced stably by a pending simple-key candidate and
//! a `Key`/`BlockMappingStart` pair can later be inserted in front of it.
//! The arena is only reset once the queue fully drains.

use std::collections::VecDeque;

use crate::encoding::{detect_encoding, Encoding};
use crate::error::{Diagnostic, DiagnosticSink, Location, ScanError, Severity};
use crate::tokenizer::chars::{
    is_blank, is_blank_or_break, is_ns_hex_digit, is_ns_word_char, is_uri_reserved, skip_b_break,
    skip_nb_char, skip_ns_char, skip_s_white,
};
use crate::tokenizer::{Span, Token, TokenKind};

/// Characters that cannot begin a plain scalar.
const NO_PLAIN_START: &[u8] = b"-?:,[]{}#&*!|>'\"%@`";

/// Token queue with a stable arena behind it. `VecDeque` holds arena
/// indices, so mid-queue insertion never moves an already-issued token.
#[derive(Default)]
struct TokenList {
    arena: Vec<Token>,
    queue: VecDeque<usize>,
}

impl TokenList {
    fn push_back(&mut self, token: Token) -> usize {
        let id = self.arena.len();
        self.arena.push(token);
        self.queue.push_back(id);
        id
    }

    /// Insert `token` at queue position `at`, keeping everything behind it
    /// in place.
    fn insert(&mut self, at: usize, token: Token) -> usize {
        let id = self.arena.len();
        self.arena.push(token);
        self.queue.insert(at, id);
        id
    }

    fn position_of(&self, id: usize) -> Option<usize> {
        self.queue.iter().position(|&queued| queued == id)
    }

    fn get(&self, id: usize) -> Option<Token> {
        self.arena.get(id).copied()
    }

    fn front_id(&self) -> Option<usize> {
        self.queue.front().copied()
    }

    fn front(&self) -> Option<Token> {
        self.front_id().and_then(|id| self.get(id))
    }

    fn pop_front(&mut self) -> Option<Token> {
        let token = self.queue.pop_front().and_then(|id| self.get(id));
        if self.queue.is_empty() {
            // No token can be referenced once the queue drains.
            self.arena.clear();
        }
        token
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn clear(&mut self) {
        self.queue.clear();
        self.arena.clear();
    }
}

/// A token that could turn out to be an implicit mapping key. Tracked per
/// flow level until a `:` promotes it or it goes stale.
struct SimpleKey {
    token: usize,
    line: u32,
    column: u32,
    flow_level: u32,
    required: bool,
}

/// Scans YAML tokens from a byte buffer.
pub struct Scanner<'i> {
    input: &'i [u8],
    pos: usize,
    /// Current block indentation column, -1 before any block collection.
    indent: i32,
    /// One entry per unclosed block collection.
    indents: Vec<i32>,
    /// Column in code points since the last line break.
    column: u32,
    line: u32,
    /// Depth of flow collections; indentation is ignored while > 0.
    flow_level: u32,
    at_stream_start: bool,
    simple_key_allowed: bool,
    /// Reserved; no construct sets it today.
    #[allow(dead_code)]
    simple_key_required: bool,
    failed: bool,
    encoding: Encoding,
    bom_len: usize,
    tokens: TokenList,
    simple_keys: Vec<SimpleKey>,
    sink: Box<dyn DiagnosticSink + 'i>,
}

impl<'i> Scanner<'i> {
    pub fn new(input: &'i [u8], sink: Box<dyn DiagnosticSink + 'i>) -> Scanner<'i> {
        let (encoding, bom_len) = detect_encoding(input);
        Scanner {
            input,
            pos: 0,
            indent: -1,
            indents: Vec::new(),
            column: 0,
            line: 0,
            flow_level: 0,
            at_stream_start: true,
            simple_key_allowed: true,
            simple_key_required: false,
            failed: false,
            encoding,
            bom_len,
            tokens: TokenList::default(),
            simple_keys: Vec::new(),
            sink,
        }
    }

    /// Produce the next token without removing it. Repeated calls return
    /// the same token.
    pub fn peek(&mut self) -> Token {
        let mut need_more = false;
        loop {
            if self.tokens.is_empty() || need_more {
                if !self.fetch_more_tokens() {
                    self.tokens.clear();
                    self.tokens.push_back(Token::error());
                    break;
                }
            }
            let front = match self.tokens.front_id() {
                Some(id) => id,
                // A silently consumed directive produced nothing; go again.
                None => continue,
            };
            self.remove_stale_simple_keys();
            // While the front token is still a simple-key candidate we do
            // not know whether a Key must be inserted before it.
            if self.simple_keys.iter().any(|key| key.token == front) {
                need_more = true;
            } else {
                break;
            }
        }
        self.tokens.front().unwrap_or_else(Token::error)
    }

    /// Produce the next token and remove it from the queue.
    pub fn pop(&mut self) -> Token {
        let token = self.peek();
        self.tokens.pop_front();
        token
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Report an error at a token produced earlier; used by the document
    /// parser layered on top.
    pub(crate) fn report_error(&mut self, kind: ScanError, message: &'static str, span: Span) {
        self.emit_error(kind, message, span.start, vec![span]);
    }

    fn set_error(&mut self, kind: ScanError, at: usize) {
        self.emit_error(kind, kind.message(), at, Vec::new());
    }

    fn set_error_msg(&mut self, kind: ScanError, message: &'static str, at: usize) {
        self.emit_error(kind, message, at, Vec::new());
    }

    fn emit_error(&mut self, kind: ScanError, message: &'static str, at: usize, ranges: Vec<Span>) {
        // Only the first error is reported; the rest are fallout.
        if !self.failed {
            let diagnostic = Diagnostic {
                kind,
                severity: Severity::Error,
                message,
                location: Location::of(self.input, at),
                ranges,
            };
            self.sink.report(&diagnostic);
        }
        self.failed = true;
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn byte(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn byte_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn is_blank_or_break_at(&self, offset: usize) -> bool {
        self.byte_at(offset).map_or(false, is_blank_or_break)
    }

    /// Advance over `n` single-column bytes.
    fn skip_n(&mut self, n: usize) {
        self.pos += n;
        self.column += n as u32;
    }

    fn consume(&mut self, expected: u8) -> bool {
        if self.byte() == Some(expected) {
            self.skip_n(1);
            true
        } else {
            false
        }
    }

    /// Move the cursor to `target`, updating line and column. Column
    /// advances per code point; any line break resets it.
    fn advance_through(&mut self, target: usize) {
        while self.pos < target {
            let next = skip_b_break(self.input, self.pos);
            if next != self.pos {
                self.pos = next;
                self.line += 1;
                self.column = 0;
            } else {
                self.pos += 1;
                while self.pos < target && self.input[self.pos] & 0xC0 == 0x80 {
                    self.pos += 1;
                }
                self.column += 1;
            }
        }
    }

    fn doc_indicator_at(&self, at: usize) -> bool {
        let marker = match self.input.get(at..at + 3) {
            Some(m) => m,
            None => return false,
        };
        (marker == b"---" || marker == b"...")
            && self
                .input
                .get(at + 3)
                .map_or(true, |&c| is_blank_or_break(c))
    }

    /// Dispatch to the right scanning routine for the byte at the cursor.
    /// Returns false once the scanner has failed.
    fn fetch_more_tokens(&mut self) -> bool {
        if self.failed {
            return false;
        }
        if self.at_stream_start {
            return self.scan_stream_start();
        }

        self.scan_to_next_token();

        if self.at_end() {
            return self.scan_stream_end();
        }

        self.remove_stale_simple_keys();
        self.unroll_indent(self.column as i32);

        if self.column == 0 {
            if self.byte() == Some(b'%') {
                return self.scan_directive();
            }
            if self.doc_indicator_at(self.pos) {
                let kind = if self.byte() == Some(b'-') {
                    TokenKind::DocumentStart
                } else {
                    TokenKind::DocumentEnd
                };
                return self.scan_document_indicator(kind);
            }
        }

        match self.byte() {
            Some(b'[') => return self.scan_flow_collection_start(true),
            Some(b'{') => return self.scan_flow_collection_start(false),
            Some(b']') => return self.scan_flow_collection_end(true),
            Some(b'}') => return self.scan_flow_collection_end(false),
            Some(b',') => return self.scan_flow_entry(),
            Some(b'-') if self.is_blank_or_break_at(1) => return self.scan_block_entry(),
            Some(b'?') if self.flow_level > 0 || self.is_blank_or_break_at(1) => {
                return self.scan_key()
            }
            Some(b':') if self.flow_level > 0 || self.is_blank_or_break_at(1) => {
                return self.scan_value()
            }
            Some(b'*') => return self.scan_alias_or_anchor(true),
            Some(b'&') => return self.scan_alias_or_anchor(false),
            Some(b'!') => return self.scan_tag(),
            Some(b'|') if self.flow_level == 0 => return self.scan_block_scalar(),
            Some(b'>') if self.flow_level == 0 => return self.scan_block_scalar(),
            Some(b'\'') => return self.scan_flow_scalar(false),
            Some(b'"') => return self.scan_flow_scalar(true),
            _ => {}
        }

        if self.can_start_plain_scalar() {
            return self.scan_plain_scalar();
        }

        self.set_error(ScanError::UnexpectedCharacter, self.pos);
        false
    }

    fn can_start_plain_scalar(&self) -> bool {
        let c = match self.byte() {
            Some(c) => c,
            None => return false,
        };
        if !is_blank_or_break(c) && !NO_PLAIN_START.contains(&c) {
            return true;
        }
        if c == b'-' && !self.is_blank_or_break_at(1) {
            return true;
        }
        // `::x` in block context starts a plain scalar.
        self.flow_level == 0
            && c == b':'
            && self.byte_at(1) == Some(b':')
            && self.byte_at(2).map_or(false, |b| !is_blank_or_break(b))
    }

    /// Skip whitespace, comments and line breaks until the next token
    /// start. Newlines outside flow context re-enable simple keys.
    fn scan_to_next_token(&mut self) {
        loop {
            while self.byte().map_or(false, is_blank) {
                self.skip_n(1);
            }

            if self.byte() == Some(b'#') {
                loop {
                    let next = skip_nb_char(self.input, self.pos);
                    if next == self.pos {
                        break;
                    }
                    self.pos = next;
                    self.column += 1;
                }
            }

            let next = skip_b_break(self.input, self.pos);
            if next == self.pos {
                break;
            }
            self.pos = next;
            self.line += 1;
            self.column = 0;
            if self.flow_level == 0 {
                self.simple_key_allowed = true;
            }
        }
    }

    fn scan_stream_start(&mut self) -> bool {
        self.at_stream_start = false;
        self.tokens.push_back(Token::new(
            TokenKind::StreamStart,
            Span::new(self.pos, self.bom_len),
        ));
        self.pos += self.bom_len;
        true
    }

    fn scan_stream_end(&mut self) -> bool {
        // Force a trailing newline if one was not present.
        if self.column != 0 {
            self.column = 0;
            self.line += 1;
        }
        self.unroll_indent(-1);
        self.simple_keys.clear();
        self.simple_key_allowed = false;
        self.tokens
            .push_back(Token::new(TokenKind::StreamEnd, Span::empty(self.pos)));
        true
    }

    /// Drop candidates that can no longer be simple keys: on an earlier
    /// line, or more than 1024 columns back.
    fn remove_stale_simple_keys(&mut self) {
        let (line, column) = (self.line, self.column);
        let mut required_at = None;
        self.simple_keys.retain(|key| {
            let stale = key.line != line || key.column + 1024 < column;
            if stale && key.required && required_at.is_none() {
                required_at = Some(key.token);
            }
            !stale
        });
        if let Some(id) = required_at {
            let at = self.tokens.get(id).map_or(self.pos, |t| t.span.start);
            self.set_error(ScanError::MissingSimpleKeyColon, at);
        }
    }

    /// Drop the newest candidate if it sits on flow level `level`.
    fn remove_simple_key_on_flow_level(&mut self, level: u32) {
        if self
            .simple_keys
            .last()
            .map_or(false, |key| key.flow_level == level)
        {
            self.simple_keys.pop();
        }
    }

    fn save_simple_key_candidate(&mut self, token: usize, at_column: u32, required: bool) {
        if self.simple_key_allowed {
            self.simple_keys.push(SimpleKey {
                token,
                line: self.line,
                column: at_column,
                flow_level: self.flow_level,
                required,
            });
        }
    }

    /// Pop block-indent entries above `to_column`, emitting a `BlockEnd`
    /// for each. No-op in flow context.
    fn unroll_indent(&mut self, to_column: i32) {
        if self.flow_level != 0 {
            return;
        }
        while self.indent > to_column {
            self.tokens
                .push_back(Token::new(TokenKind::BlockEnd, Span::empty(self.pos)));
            self.indent = self.indents.pop().unwrap_or(-1);
        }
    }

    /// Push the current indent and insert a collection-start marker of
    /// `kind` at queue position `at` if `to_column` increases the indent.
    fn roll_indent(&mut self, to_column: i32, kind: TokenKind, at: usize) {
        if self.flow_level != 0 {
            return;
        }
        if self.indent < to_column {
            self.indents.push(self.indent);
            self.indent = to_column;
            self.tokens.insert(at, Token::new(kind, Span::empty(self.pos)));
        }
    }

    fn skip_while_ns_char(&mut self) {
        loop {
            let next = skip_ns_char(self.input, self.pos);
            if next == self.pos {
                break;
            }
            self.pos = next;
            self.column += 1;
        }
    }

    fn skip_while_s_white(&mut self) {
        loop {
            let next = skip_s_white(self.input, self.pos);
            if next == self.pos {
                break;
            }
            self.pos = next;
            self.column += 1;
        }
    }

    /// Scan a `%...` directive at column 0. `%YAML` and `%TAG` produce
    /// directive tokens; reserved directives are consumed without one.
    fn scan_directive(&mut self) -> bool {
        self.unroll_indent(-1);
        self.simple_keys.clear();
        self.simple_key_allowed = false;

        let input = self.input;
        let start = self.pos;
        self.skip_n(1);
        let name_start = self.pos;
        self.skip_while_ns_char();
        let name = &input[name_start..self.pos];

        match name {
            b"YAML" => {
                self.skip_while_s_white();
                self.skip_while_ns_char(); // version value, kept in the range
                self.tokens.push_back(Token::new(
                    TokenKind::VersionDirective,
                    Span::new(start, self.pos - start),
                ));
            }
            b"TAG" => {
                self.skip_while_s_white();
                self.skip_while_ns_char(); // handle
                self.skip_while_s_white();
                self.skip_while_ns_char(); // prefix
                self.tokens.push_back(Token::new(
                    TokenKind::TagDirective,
                    Span::new(start, self.pos - start),
                ));
            }
            _ => {
                // Reserved directive: skip the rest of the line quietly.
                loop {
                    let next = skip_nb_char(input, self.pos);
                    if next == self.pos {
                        break;
                    }
                    self.pos = next;
                    self.column += 1;
                }
            }
        }
        true
    }

    fn scan_document_indicator(&mut self, kind: TokenKind) -> bool {
        self.unroll_indent(-1);
        self.simple_keys.clear();
        self.simple_key_allowed = false;

        let span = Span::new(self.pos, 3);
        self.skip_n(3);
        self.tokens.push_back(Token::new(kind, span));
        true
    }

    fn scan_flow_collection_start(&mut self, is_sequence: bool) -> bool {
        let kind = if is_sequence {
            TokenKind::FlowSequenceStart
        } else {
            TokenKind::FlowMappingStart
        };
        let span = Span::new(self.pos, 1);
        self.skip_n(1);
        let id = self.tokens.push_back(Token::new(kind, span));

        // [ and { may begin a simple key, and may be followed by one.
        self.save_simple_key_candidate(id, self.column - 1, false);
        self.simple_key_allowed = true;
        self.flow_level += 1;
        true
    }

    fn scan_flow_collection_end(&mut self, is_sequence: bool) -> bool {
        self.remove_simple_key_on_flow_level(self.flow_level);
        self.simple_key_allowed = false;
        let kind = if is_sequence {
            TokenKind::FlowSequenceEnd
        } else {
            TokenKind::FlowMappingEnd
        };
        let span = Span::new(self.pos, 1);
        self.skip_n(1);
        self.tokens.push_back(Token::new(kind, span));
        self.flow_level = self.flow_level.saturating_sub(1);
        true
    }

    fn scan_flow_entry(&mut self) -> bool {
        self.remove_simple_key_on_flow_level(self.flow_level);
        self.simple_key_allowed = true;
        let span = Span::new(self.pos, 1);
        self.skip_n(1);
        self.tokens.push_back(Token::new(TokenKind::FlowEntry, span));
        true
    }

    fn scan_block_entry(&mut self) -> bool {
        self.roll_indent(
            self.column as i32,
            TokenKind::BlockSequenceStart,
            self.tokens.len(),
        );
        self.remove_simple_key_on_flow_level(self.flow_level);
        self.simple_key_allowed = true;
        let span = Span::new(self.pos, 1);
        self.skip_n(1);
        self.tokens.push_back(Token::new(TokenKind::BlockEntry, span));
        true
    }

    /// Scan an explicit `?` key indicator.
    fn scan_key(&mut self) -> bool {
        if self.flow_level == 0 {
            self.roll_indent(
                self.column as i32,
                TokenKind::BlockMappingStart,
                self.tokens.len(),
            );
        }
        self.remove_simple_key_on_flow_level(self.flow_level);
        self.simple_key_allowed = self.flow_level == 0;

        let span = Span::new(self.pos, 1);
        self.skip_n(1);
        self.tokens.push_back(Token::new(TokenKind::Key, span));
        true
    }

    /// Scan a `:`. If a simple-key candidate is pending, retroactively
    /// insert a `Key` token (and, in block context, a `BlockMappingStart`)
    /// in front of the candidate's token.
    fn scan_value(&mut self) -> bool {
        if let Some(key) = self.simple_keys.pop() {
            if let (Some(token), Some(at)) =
                (self.tokens.get(key.token), self.tokens.position_of(key.token))
            {
                self.tokens.insert(at, Token::new(TokenKind::Key, token.span));
                self.roll_indent(key.column as i32, TokenKind::BlockMappingStart, at);
            }
            self.simple_key_allowed = false;
        } else {
            if self.flow_level == 0 {
                self.roll_indent(
                    self.column as i32,
                    TokenKind::BlockMappingStart,
                    self.tokens.len(),
                );
            }
            self.simple_key_allowed = self.flow_level == 0;
        }

        let span = Span::new(self.pos, 1);
        self.skip_n(1);
        self.tokens.push_back(Token::new(TokenKind::Value, span));
        true
    }

    /// Scan a quoted scalar. The emitted range includes both quotes.
    fn scan_flow_scalar(&mut self, double_quoted: bool) -> bool {
        let input = self.input;
        let start = self.pos;
        let col_start = self.column;

        if double_quoted {
            let mut at = self.pos + 1;
            let close = loop {
                match memchr::memchr(b'"', &input[at..]) {
                    Some(offset) => {
                        let quote = at + offset;
                        if input[quote - 1] == b'\\' && was_escaped(start + 1, quote, input) {
                            at = quote + 1;
                        } else {
                            break quote;
                        }
                    }
                    None => {
                        self.set_error_msg(
                            ScanError::UnterminatedFlow,
                            "Expected quote at end of scalar",
                            input.len(),
                        );
                        return false;
                    }
                }
            };
            self.advance_through(close + 1);
        } else {
            self.skip_n(1);
            loop {
                if self.byte() == Some(b'\'') {
                    if self.byte_at(1) == Some(b'\'') {
                        // An escaped single quote.
                        self.skip_n(2);
                        continue;
                    }
                    break;
                }
                let next = skip_nb_char(input, self.pos);
                if next != self.pos {
                    self.pos = next;
                    self.column += 1;
                    continue;
                }
                let next = skip_b_break(input, self.pos);
                if next != self.pos {
                    self.pos = next;
                    self.line += 1;
                    self.column = 0;
                    continue;
                }
                self.set_error_msg(
                    ScanError::UnterminatedFlow,
                    "Expected quote at end of scalar",
                    self.pos,
                );
                return false;
            }
            self.skip_n(1); // closing quote
        }

        let id = self.tokens.push_back(Token::new(
            TokenKind::Scalar,
            Span::new(start, self.pos - start),
        ));
        self.save_simple_key_candidate(id, col_start, false);
        self.simple_key_allowed = false;
        true
    }

    fn scan_plain_scalar(&mut self) -> bool {
        let input = self.input;
        let start = self.pos;
        let col_start = self.column;
        let mut leading_blanks = false;
        let indent = (self.indent + 1) as u32;

        'outer: while !self.at_end() {
            if self.column == 0 && self.doc_indicator_at(self.pos) {
                break;
            }
            if input[self.pos] == b'#' {
                break;
            }

            while !self.at_end() && !is_blank_or_break(input[self.pos]) {
                let c = input[self.pos];
                if self.flow_level > 0
                    && c == b':'
                    && !(self.is_blank_or_break_at(1) || self.byte_at(1) == Some(b','))
                {
                    self.set_error_msg(
                        ScanError::UnexpectedCharacter,
                        "Found unexpected ':' while scanning a plain scalar",
                        self.pos,
                    );
                    return false;
                }
                // End of a plain-implicit key, or a flow indicator.
                if c == b':' && self.is_blank_or_break_at(1) {
                    break;
                }
                if self.flow_level > 0
                    && matches!(c, b',' | b':' | b'?' | b'[' | b']' | b'{' | b'}')
                {
                    break;
                }
                let next = skip_nb_char(input, self.pos);
                if next == self.pos {
                    break;
                }
                self.pos = next;
                self.column += 1;
            }

            if self.at_end() || !is_blank_or_break(input[self.pos]) {
                break;
            }
            if self.flow_level > 0 {
                // Flow plain scalars end at the first blank.
                break;
            }

            // Tentatively eat blanks and breaks; only commit if the scalar
            // really continues on the next line.
            let mut tmp = self.pos;
            let mut column = self.column;
            let mut line = self.line;
            while tmp < input.len() && is_blank_or_break(input[tmp]) {
                if is_blank(input[tmp]) {
                    if leading_blanks && column < indent && input[tmp] == b'\t' {
                        self.set_error(ScanError::InvalidTabIndent, tmp);
                        return false;
                    }
                    tmp += 1;
                    column += 1;
                } else {
                    tmp = skip_b_break(input, tmp);
                    leading_blanks = true;
                    column = 0;
                    line += 1;
                }
            }

            if tmp >= input.len() {
                break 'outer;
            }
            if column < indent {
                break 'outer;
            }
            if column == 0 && self.doc_indicator_at(tmp) {
                break 'outer;
            }
            self.pos = tmp;
            self.column = column;
            self.line = line;
        }

        if self.pos == start {
            let kind = if input.get(start).map_or(false, |&b| b & 0x80 != 0) {
                ScanError::InvalidUtf8
            } else {
                ScanError::EmptyPlainScalar
            };
            self.set_error(kind, start);
            return false;
        }

        let id = self.tokens.push_back(Token::new(
            TokenKind::Scalar,
            Span::new(start, self.pos - start),
        ));
        self.save_simple_key_candidate(id, col_start, false);
        self.simple_key_allowed = false;
        true
    }

    fn scan_alias_or_anchor(&mut self, is_alias: bool) -> bool {
        let input = self.input;
        let start = self.pos;
        let col_start = self.column;
        self.skip_n(1);

        while let Some(c) = self.byte() {
            if matches!(c, b'[' | b']' | b'{' | b'}' | b',' | b':') {
                break;
            }
            let next = skip_ns_char(input, self.pos);
            if next == self.pos {
                break;
            }
            self.pos = next;
            self.column += 1;
        }

        if self.pos == start + 1 {
            self.set_error(ScanError::EmptyAnchorOrAlias, start);
            return false;
        }

        let kind = if is_alias {
            TokenKind::Alias
        } else {
            TokenKind::Anchor
        };
        let id = self.tokens.push_back(Token::new(
            kind,
            Span::new(start, self.pos - start),
        ));
        self.save_simple_key_candidate(id, col_start, false);
        self.simple_key_allowed = false;
        true
    }

    /// Scan `|` or `>`: the raw range to the end of the block, without any
    /// folding-indicator handling. The block ends at an empty line, a
    /// document indicator at column 0, or the end of input.
    fn scan_block_scalar(&mut self) -> bool {
        let input = self.input;
        let start = self.pos;
        self.skip_n(1);

        loop {
            if self.column == 0 && self.doc_indicator_at(self.pos) {
                break;
            }
            let next = skip_nb_char(input, self.pos);
            if next != self.pos {
                self.pos = next;
                self.column += 1;
                continue;
            }
            if self.at_end() || self.column == 0 {
                break;
            }
            let next = skip_b_break(input, self.pos);
            if next == self.pos {
                self.set_error(ScanError::InvalidUtf8, self.pos);
                return false;
            }
            self.pos = next;
            self.column = 0;
            self.line += 1;
        }

        if self.pos == start + 1 {
            self.set_error(ScanError::EmptyBlockScalar, start);
            return false;
        }

        self.tokens.push_back(Token::new(
            TokenKind::Scalar,
            Span::new(start, self.pos - start),
        ));
        true
    }

    fn scan_tag(&mut self) -> bool {
        let start = self.pos;
        let col_start = self.column;
        self.skip_n(1); // !

        if self.at_end() || self.is_blank_or_break_at(0) {
            // A bare ! is a valid empty tag.
        } else if self.byte() == Some(b'<') {
            self.skip_n(1);
            self.scan_ns_uri_char();
            if !self.consume(b'>') {
                self.set_error(ScanError::UnexpectedCharacter, self.pos);
                return false;
            }
        } else {
            self.skip_while_ns_char();
        }

        let id = self.tokens.push_back(Token::new(
            TokenKind::Tag,
            Span::new(start, self.pos - start),
        ));
        self.save_simple_key_candidate(id, col_start, false);
        self.simple_key_allowed = false;
        true
    }

    /// Advance over the longest run of `ns-uri-char`: word characters,
    /// `%XX` escapes and URI-reserved punctuation.
    fn scan_ns_uri_char(&mut self) {
        let input = self.input;
        loop {
            let c = match self.byte() {
                Some(c) => c,
                None => break,
            };
            let hex_escape = c == b'%'
                && self.pos + 2 < input.len()
                && is_ns_hex_digit(input[self.pos + 1])
                && is_ns_hex_digit(input[self.pos + 2]);
            if hex_escape || is_ns_word_char(c) || is_uri_reserved(c) {
                self.skip_n(1);
            } else {
                break;
            }
        }
    }
}

/// Whether the character at `position` is escaped by a leading backslash:
/// counts the run of consecutive backslashes before it; odd means escaped.
fn was_escaped(first: usize, position: usize, input: &[u8]) -> bool {
    let mut i = position;
    while i > first && input[i - 1] == b'\\' {
        i -= 1;
    }
    (position - i) % 2 == 1
}
