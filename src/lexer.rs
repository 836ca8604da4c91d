use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,      // Bare word (command name or argument)
    Str,       // Quoted string, quotes stripped
    Pipe,      // |
    And,       // &&
    Or,        // ||
    Semicolon, // ;
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: (usize, usize), // Position info [start, end)
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum LexError {
    UnexpectedChar(char, usize),
    UnterminatedQuote(char, usize),
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnexpectedChar(c, pos) => {
                write!(f, "Unexpected character '{}' at position {}", c, pos)
            }
            LexError::UnterminatedQuote(c, pos) => {
                write!(f, "Unterminated quote '{}' starting at position {}", c, pos)
            }
        }
    }
}

impl std::error::Error for LexError {}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut buf = String::new();
        let mut word_start = 0;

        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            match ch {
                ' ' | '\t' | '\n' => {
                    push_word(&mut tokens, &mut buf, word_start, self.pos);
                    self.pos += 1;
                }
                '|' => {
                    push_word(&mut tokens, &mut buf, word_start, self.pos);
                    if self.peek_next() == Some('|') {
                        tokens.push(operator(TokenKind::Or, "||", self.pos, 2));
                        self.pos += 2;
                    } else {
                        tokens.push(operator(TokenKind::Pipe, "|", self.pos, 1));
                        self.pos += 1;
                    }
                }
                '&' => {
                    push_word(&mut tokens, &mut buf, word_start, self.pos);
                    if self.peek_next() == Some('&') {
                        tokens.push(operator(TokenKind::And, "&&", self.pos, 2));
                        self.pos += 2;
                    } else {
                        // No job control; a lone '&' has no meaning here.
                        return Err(LexError::UnexpectedChar('&', self.pos));
                    }
                }
                ';' => {
                    push_word(&mut tokens, &mut buf, word_start, self.pos);
                    tokens.push(operator(TokenKind::Semicolon, ";", self.pos, 1));
                    self.pos += 1;
                }
                '\'' | '"' => {
                    push_word(&mut tokens, &mut buf, word_start, self.pos);
                    let quote_pos = self.pos;
                    self.pos += 1; // Skip the starting quote
                    let start = self.pos;
                    while self.pos < self.chars.len() && self.chars[self.pos] != ch {
                        self.pos += 1;
                    }
                    if self.pos >= self.chars.len() {
                        return Err(LexError::UnterminatedQuote(ch, quote_pos));
                    }
                    let quoted: String = self.chars[start..self.pos].iter().collect();
                    tokens.push(Token {
                        kind: TokenKind::Str,
                        lexeme: quoted,
                        span: (start, self.pos), // only contents
                    });
                    self.pos += 1; // Consume the closing quote
                }
                _ => {
                    if buf.is_empty() {
                        word_start = self.pos;
                    }
                    buf.push(ch);
                    self.pos += 1;
                }
            }
        }

        // Flush the trailing word, if any
        push_word(&mut tokens, &mut buf, word_start, self.pos);

        tokens.push(Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            span: (self.pos, self.pos),
        });
        Ok(tokens)
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }
}

fn push_word(tokens: &mut Vec<Token>, buf: &mut String, start: usize, end: usize) {
    if !buf.is_empty() {
        tokens.push(Token {
            kind: TokenKind::Word,
            lexeme: std::mem::take(buf),
            span: (start, end),
        });
    }
}

fn operator(kind: TokenKind, lexeme: &str, pos: usize, len: usize) -> Token {
    Token {
        kind,
        lexeme: lexeme.to_string(),
        span: (pos, pos + len),
    }
}
