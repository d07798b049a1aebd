use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::tokenizer::Span;

/// How severe a reported diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// Every way a scan can fail. The scanner stops at the first of these and
/// stays failed; see [`Scanner::failed`](crate::Scanner::failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanError {
    InvalidUtf8,
    UnexpectedCharacter,
    MissingSimpleKeyColon,
    InvalidTabIndent,
    UnexpectedToken,
    DuplicateAnchor,
    MissingFlowSeparator,
    UnterminatedFlow,
    UnknownEscape,
    EmptyPlainScalar,
    EmptyAnchorOrAlias,
    EmptyBlockScalar,
}

impl ScanError {
    pub fn message(&self) -> &'static str {
        match self {
            ScanError::InvalidUtf8 => "Invalid UTF-8 sequence",
            ScanError::UnexpectedCharacter => "Unrecognized character while tokenizing",
            ScanError::MissingSimpleKeyColon => "Could not find expected : for simple key",
            ScanError::InvalidTabIndent => "Found invalid tab character in indentation",
            ScanError::UnexpectedToken => "Unexpected token",
            ScanError::DuplicateAnchor => "Already encountered an anchor for this node",
            ScanError::MissingFlowSeparator => "Expected , between entries",
            ScanError::UnterminatedFlow => "Could not find closing ]",
            ScanError::UnknownEscape => "Unrecognized escape code",
            ScanError::EmptyPlainScalar => "Got empty plain scalar",
            ScanError::EmptyAnchorOrAlias => "Got empty alias or anchor",
            ScanError::EmptyBlockScalar => "Got empty block scalar",
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A position in the input. `line` and `column` are zero-based; `column`
/// counts code points, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Location {
    /// Compute the line/column of a byte offset by walking the input.
    /// Only used on the error path, so the linear scan is fine.
    pub(crate) fn of(input: &[u8], offset: usize) -> Location {
        let offset = offset.min(input.len());
        let mut line = 0;
        let mut column = 0;
        let mut pos = 0;
        while pos < offset {
            match input[pos] {
                b'\n' => {
                    line += 1;
                    column = 0;
                    pos += 1;
                }
                b'\r' => {
                    line += 1;
                    column = 0;
                    pos += 1;
                    if pos < offset && input[pos] == b'\n' {
                        pos += 1;
                    }
                }
                c => {
                    // UTF-8 continuation bytes do not advance the column.
                    if c & 0xC0 != 0x80 {
                        column += 1;
                    }
                    pos += 1;
                }
            }
        }
        Location { offset, line, column }
    }
}

/// A single reported problem, pointing at the offending byte.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: ScanError,
    pub severity: Severity,
    pub message: &'static str,
    pub location: Location,
    pub ranges: Vec<Span>,
}

/// Where diagnostics go. Injected into [`Stream::new`](crate::Stream::new)
/// and [`Scanner::new`](crate::Scanner::new); after the first error the
/// sink is not called again for the same scan.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// Sink that drops every diagnostic.
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: &Diagnostic) {}
}

/// Sink that collects diagnostics behind a shared handle. Clone it before
/// handing it to the stream and keep the clone to inspect what was reported.
#[derive(Debug, Clone, Default)]
pub struct CollectSink {
    diagnostics: Rc<RefCell<Vec<Diagnostic>>>,
}

impl CollectSink {
    pub fn new() -> CollectSink {
        CollectSink::default()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.borrow().is_empty()
    }

    pub fn first(&self) -> Option<Diagnostic> {
        self.diagnostics.borrow().first().cloned()
    }

    pub fn kinds(&self) -> Vec<ScanError> {
        self.diagnostics.borrow().iter().map(|d| d.kind).collect()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }
}

impl DiagnosticSink for CollectSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::Location;

    #[test]
    fn location_counts_code_points() {
        let input = "ab\ncd\u{e9}f".as_bytes();
        let loc = Location::of(input, input.len());
        assert_eq!(loc.line, 1);
        assert_eq!(loc.column, 4);
    }

    #[test]
    fn location_handles_crlf() {
        let input = b"ab\r\ncd";
        let loc = Location::of(input, 5);
        assert_eq!(loc.line, 1);
        assert_eq!(loc.column, 1);
    }
}
