use std::convert::Into;
use std::error::Error as StdError;
use std::fmt;

/// Which delimiter was left open when the lexer hit the end of the input
#[derive(Clone, Debug, PartialEq)]
pub struct LexError {
    /// The opening delimiter, `{{` or `{%`
    pub delimiter: &'static str,
    /// Byte offset of the opening delimiter in the source
    pub position: usize,
}

/// The different ways a template can fail to parse
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParseErrorKind {
    /// A tag keyword that is unknown or not allowed at that point
    UnexpectedToken,
    /// A closing tag without its opening tag, of the wrong family, or a block never closed
    UnmatchedTag,
    /// The content of a tag or output could not be parsed
    MalformedExpression,
    /// A filter that isn't registered in the configuration
    UnknownFilter,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnmatchedTag => "unmatched tag",
            ParseErrorKind::MalformedExpression => "malformed expression",
            ParseErrorKind::UnknownFilter => "unknown filter",
        };
        write!(f, "{}", name)
    }
}

/// A failed compilation
#[derive(Clone, Debug, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Byte offset in the template source
    pub position: usize,
    pub message: String,
}

/// The kind of an error (non-exhaustive)
#[non_exhaustive]
#[derive(Debug)]
pub enum ErrorKind {
    /// A `{{` or `{%` was never closed
    Lex(LexError),
    /// The template is syntactically invalid
    Parse(ParseError),
    /// Generic error
    Msg(String),
    /// An error happened while serializing data into a `Value`
    Json,
    /// An IO error occurred while writing the rendered output
    Io(std::io::ErrorKind),
}

/// The Error type
#[derive(Debug)]
pub struct Error {
    /// Kind of error
    pub kind: ErrorKind,
    source: Option<Box<dyn StdError + Sync + Send>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ErrorKind::Lex(ref e) => write!(
                f,
                "Unterminated `{}` opened at byte {}: expected `{}` before the end of the template",
                e.delimiter,
                e.position,
                closing_delimiter(e.delimiter)
            ),
            ErrorKind::Parse(ref e) => {
                write!(f, "Failed to parse template ({} at byte {}): {}", e.kind, e.position, e.message)
            }
            ErrorKind::Msg(ref message) => write!(f, "{}", message),
            ErrorKind::Json => write!(f, "Failed to convert data into a template value"),
            ErrorKind::Io(ref io_error) => {
                write!(f, "Io error while writing rendered value to output: {:?}", io_error)
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|c| &**c as &(dyn StdError + 'static))
    }
}

fn closing_delimiter(opening: &str) -> &'static str {
    if opening == "{%" {
        "%}"
    } else {
        "}}"
    }
}

impl Error {
    /// Creates generic error
    pub fn msg(value: impl ToString) -> Self {
        Self { kind: ErrorKind::Msg(value.to_string()), source: None }
    }

    /// Creates an error for a delimiter opened at `position` and never closed
    pub fn unterminated(delimiter: &'static str, position: usize) -> Self {
        Self { kind: ErrorKind::Lex(LexError { delimiter, position }), source: None }
    }

    /// Creates a parse error
    pub fn parse(kind: ParseErrorKind, position: usize, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Parse(ParseError { kind, position, message: message.into() }),
            source: None,
        }
    }

    /// Creates JSON error
    pub fn json(value: serde_json::Error) -> Self {
        Self { kind: ErrorKind::Json, source: Some(Box::new(value)) }
    }

    /// Creates an IO error
    pub fn io_error(error: std::io::Error) -> Self {
        Self { kind: ErrorKind::Io(error.kind()), source: Some(Box::new(error)) }
    }

    /// The parse error details, if this is a parse error
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self.kind {
            ErrorKind::Parse(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::io_error(error)
    }
}
impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Self::msg(e)
    }
}
impl From<String> for Error {
    fn from(e: String) -> Self {
        Self::msg(e)
    }
}
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::json(e)
    }
}
/// Convenient wrapper around std::Result.
pub type Result<T> = ::std::result::Result<T, Error>;
