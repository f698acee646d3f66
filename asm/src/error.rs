use arch::image::ImageError;
use color_print::cprintln;
use thiserror::Error;

use crate::{expr::EvalError, source::SourceLine};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing token: {0}")]
    MissingToken(String),

    #[error("Re-defined symbol: `{0}`")]
    SymbolRedefinition(String),

    #[error("Cannot resolve `{0}`: {1}")]
    UnresolvedSymbol(String, EvalError),

    #[error("Invalid operand `{0}`: {1}")]
    InvalidOperand(String, String),

    #[error("Invalid binary image: {0}")]
    Image(#[from] ImageError),

    #[error("No source file given, expected one ending in .s, .as or .asm")]
    NoSourceFile,

    #[error("Source file must end in .s, .as or .asm: {0}")]
    InvalidExtension(String),

    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to create file: {0}")]
    FileCreate(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileWrite(String, #[source] std::io::Error),

    #[error("{error}")]
    At { line: usize, error: Box<Error> },
}

impl Error {
    /// Attach a 1-based source line. The innermost location wins.
    pub fn at(self, line: usize) -> Self {
        match self {
            Error::At { .. } => self,
            error => Error::At {
                line,
                error: Box::new(error),
            },
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            Error::At { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// The error without its location.
    pub fn kind(&self) -> &Error {
        match self {
            Error::At { error, .. } => error,
            error => error,
        }
    }

    /// Print error with diagnostic information showing file location and line content
    pub fn print_diag(&self, file: &str, lines: &[SourceLine]) {
        cprintln!("<red,bold>error</>: {}", self);

        let Some(line_num) = self.line() else {
            return;
        };
        cprintln!("     <blue>--></> <underline>{}:{}</>", file, line_num);
        cprintln!("      <blue>|</>");

        let line_content = lines
            .iter()
            .find(|l| l.line == line_num)
            .map(|l| l.text.as_str())
            .unwrap_or("");

        cprintln!(" <blue>{:>4} |</> {}", line_num, line_content);
        cprintln!("      <blue>|</>");
    }
}

/// Non-fatal conditions reported once the walk over the records is done.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    #[error("Program reached the {limit} byte memory ceiling, stopped assembling at limit")]
    HardLimitExceeded { limit: usize },

    #[error("Program exceeds the default limit of {limit} bytes, increase it before running")]
    SoftLimitExceeded { limit: usize },
}

impl Warning {
    pub fn print(&self) {
        cprintln!("<yellow,bold>warn</>: {}", self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_is_attached_once() {
        let err = Error::InvalidToken("`mvx`".into()).at(3).at(9);
        assert_eq!(err.line(), Some(3));
        assert!(matches!(err.kind(), Error::InvalidToken(_)));
        assert_eq!(err.to_string(), "Invalid token: `mvx`");
    }

    #[test]
    fn warning_messages() {
        let soft = Warning::SoftLimitExceeded { limit: 30720 };
        assert!(soft.to_string().contains("increase it before running"));
        let hard = Warning::HardLimitExceeded { limit: 65536 };
        assert!(hard.to_string().contains("stopped assembling at limit"));
    }
}
