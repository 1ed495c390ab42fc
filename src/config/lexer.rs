use std::fmt::{self, Display, Formatter};
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, PartialEq, Clone)]
pub enum TokenKind {
    Word(String),
    Number(u64),
    LBrace,
    RBrace,
    Semicolon,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Word(s) => write!(f, "{s}"),
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::Semicolon => write!(f, ";"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: Loc,
}

#[derive(Debug, Clone, Copy)]
pub struct Loc {
    pub line: usize,
    pub col: usize,
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input: input.chars().peekable(), line: 1, col: 1 }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.input.next();
        if let Some(c) = c {
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        c
    }

    fn peek(&mut self) -> Option<&char> {
        self.input.peek()
    }

    fn current_loc(&self) -> Loc {
        Loc { line: self.line, col: self.col }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();

        while let Some(&c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
                continue;
            }
            if c == '#' {
                while let Some(&c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            let loc = self.current_loc();

            match c {
                '{' => {
                    self.advance();
                    tokens.push(Token { kind: TokenKind::LBrace, loc });
                }
                '}' => {
                    self.advance();
                    tokens.push(Token { kind: TokenKind::RBrace, loc });
                }
                ';' => {
                    self.advance();
                    tokens.push(Token { kind: TokenKind::Semicolon, loc });
                }
                _ => {
                    let word = self.read_word();
                    let kind = match word.parse::<u64>() {
                        Ok(n) => TokenKind::Number(n),
                        Err(_) => TokenKind::Word(word),
                    };
                    tokens.push(Token { kind, loc });
                }
            }
        }

        Ok(tokens)
    }

    fn read_word(&mut self) -> String {
        let mut s = String::new();
        while let Some(&c) = self.peek() {
            if c.is_whitespace() || matches!(c, '{' | '}' | ';' | '#') {
                break;
            }
            s.push(c);
            self.advance();
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_directive() {
        let mut lexer = Lexer::new("listen 8080;");
        let tokens = lexer.tokenize().unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].kind, TokenKind::Word("listen".into()));
        assert_eq!(tokens[1].kind, TokenKind::Number(8080));
        assert_eq!(tokens[2].kind, TokenKind::Semicolon);
    }

    #[test]
    fn skips_comments_and_tracks_location() {
        let mut lexer = Lexer::new("# comment\nserver {\n}\n");
        let tokens = lexer.tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Word("server".into()));
        assert_eq!(tokens[0].loc.line, 2);
        assert_eq!(tokens[1].kind, TokenKind::LBrace);
        assert_eq!(tokens[2].kind, TokenKind::RBrace);
    }

    #[test]
    fn words_may_contain_punctuation() {
        let mut lexer = Lexer::new("root ./www/html;");
        let tokens = lexer.tokenize().unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Word("./www/html".into()));
    }
}
