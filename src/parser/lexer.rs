//! Tokenizer for TypeScript source.
//!
//! Only enough of the lexical grammar is understood to let the declaration
//! parser walk a file: literals are recognized so that their contents never
//! unbalance brackets, and `/** */` comments are kept as documentation for the
//! token that follows them.

/// A lexical token with its byte span and starting line.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub line: usize,
    /// The JSDoc comment immediately preceding this token, without delimiters
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifiers and keywords alike
    Ident(String),
    /// String literal, already unescaped
    Str(String),
    /// Template literal, raw text between the backticks
    Template(String),
    Number(String),
    Regex(String),
    Punct(&'static str),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub line: usize,
    pub message: String,
}

const MULTI_PUNCT: [&str; 10] = ["...", "===", "!==", "=>", "==", "!=", "&&", "||", "??", "**"];
const SINGLE_PUNCT: &str = "{}()[]<>,;:?.=|&@!+-*/%^~#";

const REGEX_PRECEDING_KEYWORDS: [&str; 14] = [
    "return", "typeof", "case", "do", "else", "in", "of", "new", "delete", "void", "throw",
    "instanceof", "yield", "await",
];

struct Lexer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: usize,
    pending_doc: Option<String>,
    tokens: Vec<Token>,
}

/// Splits TypeScript source into tokens, ending with a single `Eof` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer {
        source,
        chars: source.char_indices().collect(),
        pos: 0,
        line: 1,
        pending_doc: None,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(i, _)| *i)
            .unwrap_or(self.source.len())
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            line: self.line,
            message: message.into(),
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, line: usize) {
        let end = self.offset();
        let doc = self.pending_doc.take();
        self.tokens.push(Token {
            kind,
            start,
            end,
            line,
            doc,
        });
    }

    fn run(&mut self) -> Result<(), LexError> {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
                continue;
            }

            let start = self.offset();
            let line = self.line;

            if c == '/' && self.peek_at(1) == Some('/') {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else if c == '/' && self.peek_at(1) == Some('*') {
                self.block_comment()?;
            } else if c == '"' || c == '\'' {
                let value = self.string(c)?;
                self.push(TokenKind::Str(value), start, line);
            } else if c == '`' {
                let raw = self.template()?;
                self.push(TokenKind::Template(raw), start, line);
            } else if c.is_ascii_digit()
                || (c == '.' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit()))
            {
                let number = self.number();
                self.push(TokenKind::Number(number), start, line);
            } else if is_ident_start(c) {
                let ident = self.ident();
                self.push(TokenKind::Ident(ident), start, line);
            } else if c == '/' && self.regex_allowed() {
                let regex = self.regex()?;
                self.push(TokenKind::Regex(regex), start, line);
            } else {
                let punct = self.punct()?;
                self.push(TokenKind::Punct(punct), start, line);
            }
        }

        let end = self.source.len();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            start: end,
            end,
            line: self.line,
            doc: self.pending_doc.take(),
        });
        Ok(())
    }

    fn block_comment(&mut self) -> Result<(), LexError> {
        let start_line = self.line;
        self.bump();
        self.bump();
        let is_doc = self.peek() == Some('*') && self.peek_at(1) != Some('/');
        let content_start = self.offset();

        loop {
            match self.peek() {
                None => {
                    return Err(LexError {
                        line: start_line,
                        message: "unterminated block comment".to_string(),
                    })
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    let content_end = self.offset();
                    self.bump();
                    self.bump();
                    if is_doc {
                        // skip the second '*' of the opening delimiter
                        let text = &self.source[content_start + 1..content_end];
                        self.pending_doc = Some(text.to_string());
                    }
                    return Ok(());
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<String, LexError> {
        let start_line = self.line;
        self.bump();
        let mut value = String::new();

        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(LexError {
                        line: start_line,
                        message: "unterminated string literal".to_string(),
                    })
                }
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some('u') => value.push(self.unicode_escape()),
                    Some('\n') => {}
                    Some(other) => value.push(other),
                    None => return Err(self.error("unterminated string literal")),
                },
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
            }
        }
    }

    fn unicode_escape(&mut self) -> char {
        let mut digits = String::new();
        if self.peek() == Some('{') {
            self.bump();
            while let Some(c) = self.peek() {
                self.bump();
                if c == '}' {
                    break;
                }
                digits.push(c);
            }
        } else {
            for _ in 0..4 {
                if let Some(c) = self.peek().filter(|c| c.is_ascii_hexdigit()) {
                    digits.push(c);
                    self.bump();
                }
            }
        }
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    fn template(&mut self) -> Result<String, LexError> {
        let start_line = self.line;
        self.bump();
        let content_start = self.offset();

        loop {
            match self.peek() {
                None => {
                    return Err(LexError {
                        line: start_line,
                        message: "unterminated template literal".to_string(),
                    })
                }
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some('`') => {
                    let raw = self.source[content_start..self.offset()].to_string();
                    self.bump();
                    return Ok(raw);
                }
                Some('$') if self.peek_at(1) == Some('{') => {
                    self.bump();
                    self.bump();
                    self.template_substitution()?;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Skips a `${ ... }` substitution, which may itself contain strings and templates.
    fn template_substitution(&mut self) -> Result<(), LexError> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                None => return Err(self.error("unterminated template substitution")),
                Some('{') => {
                    depth += 1;
                    self.bump();
                }
                Some('}') => {
                    depth -= 1;
                    self.bump();
                }
                Some(q @ ('"' | '\'')) => {
                    self.string(q)?;
                }
                Some('`') => {
                    self.template()?;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        Ok(())
    }

    fn number(&mut self) -> String {
        let start = self.offset();
        let hex = self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X'));
        while let Some(c) = self.peek() {
            let exponent_sign = !hex
                && (c == '+' || c == '-')
                && self
                    .chars
                    .get(self.pos.wrapping_sub(1))
                    .is_some_and(|(_, p)| *p == 'e' || *p == 'E');
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                self.bump();
            } else {
                break;
            }
        }
        self.source[start..self.offset()].replace('_', "")
    }

    fn ident(&mut self) -> String {
        let start = self.offset();
        self.bump();
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.bump();
            } else {
                break;
            }
        }
        self.source[start..self.offset()].to_string()
    }

    fn regex_allowed(&self) -> bool {
        match self.tokens.last().map(|t| &t.kind) {
            None => true,
            Some(TokenKind::Punct(p)) => !matches!(*p, ")" | "]" | "}"),
            Some(TokenKind::Ident(word)) => REGEX_PRECEDING_KEYWORDS.contains(&word.as_str()),
            Some(_) => false,
        }
    }

    fn regex(&mut self) -> Result<String, LexError> {
        let start = self.offset();
        self.bump();
        let mut in_class = false;
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error("unterminated regular expression")),
                Some('\\') => {
                    self.bump();
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some(_) => {}
            }
        }
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.bump();
        }
        Ok(self.source[start..self.offset()].to_string())
    }

    fn punct(&mut self) -> Result<&'static str, LexError> {
        let rest = &self.source[self.offset()..];
        for candidate in MULTI_PUNCT {
            if rest.starts_with(candidate) {
                for _ in 0..candidate.chars().count() {
                    self.bump();
                }
                return Ok(candidate);
            }
        }

        let c = self.peek().unwrap_or_default();
        match SINGLE_PUNCT.find(c) {
            Some(index) => {
                self.bump();
                Ok(&SINGLE_PUNCT[index..index + 1])
            }
            None => Err(self.error(format!("unexpected character '{}'", c))),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_decorated_method() {
        let tokens = kinds("@Get('users/{id}') public find(): Promise<User[]> {}");
        assert_eq!(tokens[0], TokenKind::Punct("@"));
        assert_eq!(tokens[1], TokenKind::Ident("Get".to_string()));
        assert_eq!(tokens[3], TokenKind::Str("users/{id}".to_string()));
        assert!(tokens.contains(&TokenKind::Ident("Promise".to_string())));
        assert_eq!(tokens.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn test_nested_generics_close_separately() {
        let tokens = kinds("Box<Array<string>>");
        let closers = tokens
            .iter()
            .filter(|t| **t == TokenKind::Punct(">"))
            .count();
        assert_eq!(closers, 2);
    }

    #[test]
    fn test_doc_comment_attaches_to_next_token() {
        let tokens = tokenize("/** The user id\n * @isInt */ id: number; // trailing").unwrap();
        let doc = tokens[0].doc.as_deref().unwrap();
        assert!(doc.contains("The user id"));
        assert!(doc.contains("@isInt"));
        assert!(tokens[1].doc.is_none());
    }

    #[test]
    fn test_plain_block_comment_is_not_doc() {
        let tokens = tokenize("/* not docs */ x").unwrap();
        assert!(tokens[0].doc.is_none());
    }

    #[test]
    fn test_regex_and_template_do_not_leak_brackets() {
        let tokens = kinds("const r = /[{(]/g; const t = `a ${ { b: '}' } } c`; }");
        assert!(matches!(tokens[3], TokenKind::Regex(_)));
        assert!(tokens.iter().any(|t| matches!(t, TokenKind::Template(_))));
        let closing = tokens
            .iter()
            .filter(|t| **t == TokenKind::Punct("}"))
            .count();
        assert_eq!(closing, 1);
    }

    #[test]
    fn test_division_is_not_regex() {
        let tokens = kinds("a = (b) / 2 / c");
        assert!(!tokens.iter().any(|t| matches!(t, TokenKind::Regex(_))));
    }

    #[test]
    fn test_string_escapes_and_lines() {
        let tokens = tokenize("'it\\'s'\n\"x\\u0041\"").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str("it's".to_string()));
        assert_eq!(tokens[1].kind, TokenKind::Str("xA".to_string()));
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_unterminated_string_fails() {
        let err = tokenize("const x = 'abc").unwrap_err();
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("1_000")[0], TokenKind::Number("1000".to_string()));
        assert_eq!(kinds("2.5e-3")[0], TokenKind::Number("2.5e-3".to_string()));
        assert_eq!(kinds("0xFF")[0], TokenKind::Number("0xFF".to_string()));
    }
}
