use std::{cell::RefCell, fmt, ops::Range};

/// A unit of source text handed to the parser, together with the syntax
/// errors collected while parsing it.
pub struct Source<'a> {
    pub content: &'a str,
    pub errors: ErrorReporter,
}

impl<'a> Source<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            errors: ErrorReporter::default(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(content: &'a str) -> Self {
        Source::new(content)
    }
}

/// A single parse diagnostic: what went wrong and the byte span of the
/// offending token. Parsing never aborts on one of these; the parser keeps
/// going so several can be reported at once.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    message: String,
    span: Range<usize>,
}

impl SyntaxError {
    pub fn new(message: impl ToString, span: Range<usize>) -> Self {
        Self {
            message: message.to_string(),
            span,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at position {})", self.message, self.span.start)
    }
}

/// Collects the diagnostics of one parse. The parser reports through a
/// shared reference, so collecting does not compete with the borrow of the
/// text being parsed.
#[derive(Default)]
pub struct ErrorReporter {
    errors: RefCell<Vec<SyntaxError>>,
}

impl ErrorReporter {
    pub fn report(&self, error: SyntaxError) {
        self.errors.borrow_mut().push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.borrow().len()
    }

    /// The collected diagnostics, one rendered line per error. The driver
    /// shows these under its `parser errors:` banner.
    pub fn to_vec(&self) -> Vec<String> {
        self.errors
            .borrow()
            .iter()
            .map(SyntaxError::to_string)
            .collect()
    }
}
