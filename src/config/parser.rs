use std::fmt;

use crate::config::lexer::{Lexer, Loc, Token, TokenKind};
use crate::config::types::{RouteConfig, ServerConfig};

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub loc: Option<Loc>,
    pub context: Vec<String>,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\x1b[1;31mConfiguration Error\x1b[0m: {}", self.message)?;
        if let Some(loc) = self.loc {
            write!(f, " \x1b[38;5;244m(at line {}, col {})\x1b[0m", loc.line, loc.col)?;
        }
        if !self.context.is_empty() {
            writeln!(f, "\n   \x1b[1;34mContext trace:\x1b[0m")?;
            for (i, ctx) in self.context.iter().rev().enumerate() {
                let indent = " ".repeat(2 + i * 2);
                writeln!(f, "{}↳ {}", indent, ctx)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {}

pub type ParseResult<T> = Result<T, ConfigError>;

pub struct ConfigParser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl ConfigParser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, cursor: 0 }
    }

    pub fn parse_file(input: &str) -> ParseResult<Vec<ServerConfig>> {
        let tokens = Lexer::new(input).tokenize().map_err(|e| ConfigError {
            message: e,
            loc: None,
            context: vec!["lexing phase".to_string()],
        })?;

        let mut parser = ConfigParser::new(tokens);
        let mut servers = Vec::new();

        while parser.peek_kind().is_some() {
            parser.expect_word("server")?;
            servers.push(parser.parse_server_block()?);
        }

        if servers.is_empty() {
            return Err(ConfigError {
                message: "configuration defines no server blocks".to_string(),
                loc: None,
                context: vec![],
            });
        }

        Ok(servers)
    }

    // ---- token access ----

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.cursor).map(|t| &t.kind)
    }

    fn peek_loc(&self) -> Option<Loc> {
        self.tokens.get(self.cursor).map(|t| t.loc)
    }

    fn next_token(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.cursor).cloned();
        if t.is_some() {
            self.cursor += 1;
        }
        t
    }

    fn eof_err(&self, what: &str) -> ConfigError {
        ConfigError { message: format!("expected {what}, found end of file"), loc: self.peek_loc(), context: vec![] }
    }

    fn expect_word(&mut self, word: &str) -> ParseResult<()> {
        let loc = self.peek_loc();
        match self.next_token() {
            Some(Token { kind: TokenKind::Word(s), .. }) if s == word => Ok(()),
            Some(t) => Err(ConfigError {
                message: format!("expected '{word}', found '{}'", t.kind),
                loc: Some(t.loc),
                context: vec![],
            }),
            None => Err(ConfigError { message: format!("expected '{word}'"), loc, context: vec![] }),
        }
    }

    fn expect_lbrace(&mut self) -> ParseResult<()> {
        match self.next_token() {
            Some(Token { kind: TokenKind::LBrace, .. }) => Ok(()),
            Some(t) => Err(ConfigError { message: format!("expected '{{', found '{}'", t.kind), loc: Some(t.loc), context: vec![] }),
            None => Err(self.eof_err("'{'")),
        }
    }

    fn expect_semicolon(&mut self) -> ParseResult<()> {
        match self.next_token() {
            Some(Token { kind: TokenKind::Semicolon, .. }) => Ok(()),
            Some(t) => Err(ConfigError { message: format!("expected ';', found '{}'", t.kind), loc: Some(t.loc), context: vec![] }),
            None => Err(self.eof_err("';'")),
        }
    }

    fn at_rbrace(&self) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::RBrace))
    }

    fn expect_rbrace(&mut self) -> ParseResult<()> {
        match self.next_token() {
            Some(Token { kind: TokenKind::RBrace, .. }) => Ok(()),
            Some(t) => Err(ConfigError { message: format!("expected '}}', found '{}'", t.kind), loc: Some(t.loc), context: vec![] }),
            None => Err(self.eof_err("'}'")),
        }
    }

    fn next_word(&mut self, what: &str) -> ParseResult<String> {
        let loc = self.peek_loc();
        match self.next_token() {
            Some(Token { kind: TokenKind::Word(s), .. }) => Ok(s),
            Some(Token { kind: TokenKind::Number(n), .. }) => Ok(n.to_string()),
            Some(t) => Err(ConfigError { message: format!("expected {what}, found '{}'", t.kind), loc: Some(t.loc), context: vec![] }),
            None => Err(self.eof_err(what)),
        }
    }

    fn next_number(&mut self, what: &str) -> ParseResult<u64> {
        let loc = self.peek_loc();
        match self.next_token() {
            Some(Token { kind: TokenKind::Number(n), .. }) => Ok(n),
            Some(t) => Err(ConfigError { message: format!("expected {what}, found '{}'", t.kind), loc: Some(t.loc), context: vec![] }),
            None => Err(self.eof_err(what)),
        }
    }

    /// True while the directive list inside a `{ }` block is not yet closed.
    fn more_directives(&self) -> bool {
        !self.at_rbrace() && self.peek_kind().is_some()
    }

    // ---- grammar ----

    fn parse_server_block(&mut self) -> ParseResult<ServerConfig> {
        self.expect_lbrace()?;
        let mut cfg = ServerConfig::default();
        cfg.ports.clear();

        while self.more_directives() {
            let loc = self.peek_loc();
            let key = self.next_word("a directive name")?;
            match key.as_str() {
                "listen" => {
                    let port = self.next_number("a port number")?;
                    cfg.ports.push(port as u16);
                    self.expect_semicolon()?;
                }
                "host" => {
                    cfg.host = self.next_word("a host address")?;
                    self.expect_semicolon()?;
                }
                "server_name" => {
                    cfg.server_name = self.next_word("a server name")?;
                    self.expect_semicolon()?;
                }
                "client_max_body_size" => {
                    let n = self.next_number("a byte size")?;
                    cfg.client_max_body_size = n as usize;
                    self.expect_semicolon()?;
                }
                "error_page" => {
                    let code = self.next_number("a status code")?;
                    let path = self.next_word("an error page path")?;
                    cfg.error_pages.insert(code as u16, path);
                    self.expect_semicolon()?;
                }
                "location" => {
                    let prefix = self.next_word("a location prefix")?;
                    cfg.routes.push(self.parse_location_block(prefix)?);
                }
                other => {
                    return Err(ConfigError {
                        message: format!("unknown server directive '{other}'"),
                        loc,
                        context: vec!["parsing server block".to_string()],
                    });
                }
            }
        }

        self.expect_rbrace()?;

        if cfg.ports.is_empty() {
            cfg.ports.push(crate::config::types::DEFAULT_PORT);
        }

        Ok(cfg)
    }

    fn parse_location_block(&mut self, prefix: String) -> ParseResult<RouteConfig> {
        self.expect_lbrace()?;
        let mut route = RouteConfig { path: prefix, methods: Vec::new(), ..RouteConfig::default() };

        while self.more_directives() {
            let loc = self.peek_loc();
            let key = self.next_word("a directive name")?;
            match key.as_str() {
                "root" => {
                    route.root = self.next_word("a root path")?;
                    self.expect_semicolon()?;
                }
                "index" => {
                    route.default_file = self.next_word("an index file name")?;
                    self.expect_semicolon()?;
                }
                "autoindex" => {
                    let v = self.next_word("'on' or 'off'")?;
                    route.autoindex = v == "on";
                    self.expect_semicolon()?;
                }
                "allowed_methods" => {
                    while !matches!(self.peek_kind(), Some(TokenKind::Semicolon)) {
                        route.methods.push(self.next_word("an HTTP method")?);
                    }
                    self.expect_semicolon()?;
                }
                "upload_path" => {
                    route.upload_dir = Some(self.next_word("an upload directory")?);
                    self.expect_semicolon()?;
                }
                "cgi" => {
                    let ext = self.next_word("a file extension")?;
                    let interpreter = self.next_word("an interpreter path")?;
                    route.cgi.insert(ext, interpreter);
                    self.expect_semicolon()?;
                }
                "return" => {
                    let code = self.next_number("a redirect status code")?;
                    let target = self.next_word("a redirect target")?;
                    if code != 301 && code != 302 {
                        return Err(ConfigError {
                            message: format!("redirect code {code} must be 301 or 302"),
                            loc,
                            context: vec!["parsing location block".to_string()],
                        });
                    }
                    route.redirect = Some((code as u16, target));
                    self.expect_semicolon()?;
                }
                other => {
                    return Err(ConfigError {
                        message: format!("unknown location directive '{other}'"),
                        loc,
                        context: vec!["parsing location block".to_string()],
                    });
                }
            }
        }

        self.expect_rbrace()?;

        if route.methods.is_empty() {
            route.methods = vec!["GET".to_string(), "HEAD".to_string()];
        }

        Ok(route)
    }
}
