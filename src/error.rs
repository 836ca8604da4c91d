use std::fmt;

use crate::executor::ExecError;
use crate::lexer::LexError;
use crate::parser::ParseError;

// One line of input can fail in three layers; the REPL and the -c path
// only ever deal with this umbrella.
#[derive(Debug)]
pub enum ShellError {
    Lex(LexError),
    Parse(ParseError),
    Exec(ExecError),
}

impl ShellError {
    // Exit status the shell reports for this failure: 2 for anything the
    // user typed wrong, 1 for execution-level failures.
    pub fn status(&self) -> i32 {
        match self {
            ShellError::Lex(_) | ShellError::Parse(_) => 2,
            ShellError::Exec(_) => 1,
        }
    }
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::Lex(e) => write!(f, "syntax error: {}", e),
            ShellError::Parse(e) => write!(f, "syntax error: {}", e),
            ShellError::Exec(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ShellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShellError::Lex(e) => Some(e),
            ShellError::Parse(e) => Some(e),
            ShellError::Exec(e) => Some(e),
        }
    }
}

impl From<LexError> for ShellError {
    fn from(e: LexError) -> Self {
        ShellError::Lex(e)
    }
}

impl From<ParseError> for ShellError {
    fn from(e: ParseError) -> Self {
        ShellError::Parse(e)
    }
}

impl From<ExecError> for ShellError {
    fn from(e: ExecError) -> Self {
        ShellError::Exec(e)
    }
}
