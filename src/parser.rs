use std::fmt;

use log::debug;

use crate::ast::{AstNode, BinOp};
use crate::lexer::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    EmptyInput,
    ExpectedCommand { found: String },
    UnexpectedEnd,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyInput => write!(f, "Input is empty"),
            ParseError::ExpectedCommand { found } => {
                write!(f, "The first word should be a command (found '{}')", found)
            }
            ParseError::UnexpectedEnd => write!(f, "Unexpected end of input"),
        }
    }
}

impl std::error::Error for ParseError {}

// Top-down recursive descent parser, one method per precedence level:
// sequence (';') binds weakest, then '&&'/'||', then '|', with plain
// commands as the leaves.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(&mut self) -> Result<AstNode, ParseError> {
        if self.at_end() {
            return Err(ParseError::EmptyInput);
        }
        let node = self.parse_sequence()?;
        // Anything left over after a complete parse is dropped, not an error.
        if !self.at_end() {
            debug!("ignoring trailing tokens from position {}", self.pos);
        }
        Ok(node)
    }

    fn parse_sequence(&mut self) -> Result<AstNode, ParseError> {
        let mut node = self.parse_and_or()?;
        while self.consume(TokenKind::Semicolon) {
            let rhs = self.parse_and_or()?;
            node = AstNode::BinaryOp {
                op: BinOp::Seq,
                left: Box::new(node),
                right: Box::new(rhs),
            };
        }
        Ok(node)
    }

    fn parse_and_or(&mut self) -> Result<AstNode, ParseError> {
        let mut node = self.parse_pipeline()?;
        loop {
            if self.consume(TokenKind::And) {
                let rhs = self.parse_pipeline()?;
                node = AstNode::BinaryOp {
                    op: BinOp::And,
                    left: Box::new(node),
                    right: Box::new(rhs),
                };
            } else if self.consume(TokenKind::Or) {
                let rhs = self.parse_pipeline()?;
                node = AstNode::BinaryOp {
                    op: BinOp::Or,
                    left: Box::new(node),
                    right: Box::new(rhs),
                };
            } else {
                break;
            }
        }
        Ok(node)
    }

    fn parse_pipeline(&mut self) -> Result<AstNode, ParseError> {
        let first = self.parse_command()?;
        // A single command gets no Pipeline wrapper
        if !self.consume(TokenKind::Pipe) {
            return Ok(first);
        }
        let mut stages = vec![first, self.parse_command()?];
        while self.consume(TokenKind::Pipe) {
            stages.push(self.parse_command()?);
        }
        Ok(AstNode::Pipeline { stages })
    }

    fn parse_command(&mut self) -> Result<AstNode, ParseError> {
        let first = match self.next() {
            Some(tok) if tok.kind == TokenKind::Eof => return Err(ParseError::UnexpectedEnd),
            Some(tok) => tok,
            None => return Err(ParseError::UnexpectedEnd),
        };
        if !matches!(first.kind, TokenKind::Word | TokenKind::Str) {
            return Err(ParseError::ExpectedCommand {
                found: first.lexeme.clone(),
            });
        }
        let name = first.lexeme.clone();

        let mut args = Vec::new();
        while let Some(tok) = self.peek() {
            if matches!(tok.kind, TokenKind::Word | TokenKind::Str) {
                args.push(tok.lexeme.clone());
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(AstNode::Command { name, args })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.peek().map(|t| t.kind) == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        match self.peek() {
            Some(tok) => tok.kind == TokenKind::Eof,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn lex_and_parse(src: &str) -> AstNode {
        let tokens = Lexer::new(src).tokenize().unwrap();
        Parser::new(&tokens).parse().unwrap()
    }

    fn parse_err(src: &str) -> ParseError {
        let tokens = Lexer::new(src).tokenize().unwrap();
        Parser::new(&tokens).parse().unwrap_err()
    }

    fn cmd(name: &str, args: &[&str]) -> AstNode {
        AstNode::Command {
            name: name.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn binop(op: BinOp, left: AstNode, right: AstNode) -> AstNode {
        AstNode::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn test_simple_command() {
        assert_eq!(lex_and_parse("echo hello"), cmd("echo", &["hello"]));
    }

    #[test]
    fn test_command_with_args() {
        assert_eq!(lex_and_parse("grep foo bar"), cmd("grep", &["foo", "bar"]));
    }

    #[test]
    fn test_quoted_string_as_argument() {
        assert_eq!(
            lex_and_parse("grep 'foo bar' baz"),
            cmd("grep", &["foo bar", "baz"])
        );
    }

    #[test]
    fn test_quoted_string_as_command_name() {
        assert_eq!(lex_and_parse("'my cmd' x"), cmd("my cmd", &["x"]));
    }

    #[test]
    fn test_single_command_is_not_wrapped_in_pipeline() {
        let ast = lex_and_parse("ls -l");
        assert!(matches!(ast, AstNode::Command { .. }));
    }

    #[test]
    fn test_pipeline_two_stages() {
        assert_eq!(
            lex_and_parse("ls | wc"),
            AstNode::Pipeline {
                stages: vec![cmd("ls", &[]), cmd("wc", &[])],
            }
        );
    }

    #[test]
    fn test_pipeline_is_flat_not_nested() {
        assert_eq!(
            lex_and_parse("ls | grep foo | wc"),
            AstNode::Pipeline {
                stages: vec![cmd("ls", &[]), cmd("grep", &["foo"]), cmd("wc", &[])],
            }
        );
    }

    #[test]
    fn test_and_or_left_associative() {
        assert_eq!(
            lex_and_parse("a && b || c"),
            binop(
                BinOp::Or,
                binop(BinOp::And, cmd("a", &[]), cmd("b", &[])),
                cmd("c", &[]),
            )
        );
    }

    #[test]
    fn test_sequence_left_associative() {
        assert_eq!(
            lex_and_parse("a ; b ; c"),
            binop(
                BinOp::Seq,
                binop(BinOp::Seq, cmd("a", &[]), cmd("b", &[])),
                cmd("c", &[]),
            )
        );
    }

    #[test]
    fn test_precedence_pipe_before_and_before_semi() {
        assert_eq!(
            lex_and_parse("a | b && c ; d"),
            binop(
                BinOp::Seq,
                binop(
                    BinOp::And,
                    AstNode::Pipeline {
                        stages: vec![cmd("a", &[]), cmd("b", &[])],
                    },
                    cmd("c", &[]),
                ),
                cmd("d", &[]),
            )
        );
    }

    #[test]
    fn test_and_or_sequence_mixed() {
        assert_eq!(
            lex_and_parse("echo ok && ls || echo err; echo end"),
            binop(
                BinOp::Seq,
                binop(
                    BinOp::Or,
                    binop(BinOp::And, cmd("echo", &["ok"]), cmd("ls", &[])),
                    cmd("echo", &["err"]),
                ),
                cmd("echo", &["end"]),
            )
        );
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert_eq!(parse_err(""), ParseError::EmptyInput);
        assert_eq!(parse_err("   "), ParseError::EmptyInput);
    }

    #[test]
    fn test_lone_pipe_is_an_error() {
        assert_eq!(
            parse_err("|"),
            ParseError::ExpectedCommand {
                found: "|".to_string(),
            }
        );
    }

    #[test]
    fn test_leading_operator_is_an_error() {
        assert_eq!(
            parse_err("&& ls"),
            ParseError::ExpectedCommand {
                found: "&&".to_string(),
            }
        );
    }

    #[test]
    fn test_trailing_pipe_is_an_error() {
        assert_eq!(parse_err("ls |"), ParseError::UnexpectedEnd);
    }

    #[test]
    fn test_trailing_semicolon_is_an_error() {
        // ';' demands a right-hand side in this grammar
        assert_eq!(parse_err("ls ;"), ParseError::UnexpectedEnd);
    }

    #[test]
    fn test_error_display_names_the_command_position() {
        let msg = format!(
            "{}",
            ParseError::ExpectedCommand {
                found: "|".to_string(),
            }
        );
        assert!(msg.starts_with("The first word should be a command"));
    }
}
