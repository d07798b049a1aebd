pub use error::{CollectSink, Diagnostic, DiagnosticSink, Location, NullSink, ScanError, Severity};
pub use tokenizer::Scanner;
pub use treebuild::Stream;

pub mod encoding;
pub mod error;
pub mod escaper;
pub mod tokenizer;
pub mod treebuild;
