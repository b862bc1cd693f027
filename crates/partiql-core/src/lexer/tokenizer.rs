//! PartiQL tokenizer implementation.

use crate::parser::ParseError;

use super::{LiteralValue, Span, Token, TokenKind};

/// Keywords recognized by the lexer, sorted for binary search.
///
/// Word operators, trim specifications, and date parts are classified
/// separately and do not appear here.
const KEYWORDS: &[&str] = &[
    "all",
    "any",
    "avg",
    "bag",
    "blob",
    "boolean",
    "case",
    "cast",
    "char",
    "char_length",
    "character",
    "character_length",
    "clob",
    "coalesce",
    "conflict",
    "count",
    "create",
    "cross",
    "date",
    "date_add",
    "date_diff",
    "decimal",
    "delete",
    "distinct",
    "do",
    "drop",
    "else",
    "end",
    "escape",
    "every",
    "exec",
    "exists",
    "extract",
    "float",
    "from",
    "group",
    "having",
    "index",
    "inner",
    "insert",
    "int",
    "integer",
    "into",
    "join",
    "left",
    "let",
    "limit",
    "list",
    "lower",
    "materialized",
    "max",
    "min",
    "modified",
    "new",
    "nothing",
    "nullif",
    "numeric",
    "octet_length",
    "old",
    "on",
    "order",
    "outer",
    "partial",
    "pivot",
    "real",
    "recursive",
    "remove",
    "returning",
    "right",
    "select",
    "set",
    "sexp",
    "size",
    "smallint",
    "some",
    "string",
    "struct",
    "substring",
    "sum",
    "symbol",
    "table",
    "then",
    "time",
    "timestamp",
    "trim",
    "tuple",
    "unpivot",
    "update",
    "upper",
    "value",
    "values",
    "varchar",
    "when",
    "where",
    "with",
    "zone",
];

/// Word operators (symbolic operators are scanned directly).
const WORD_OPERATORS: &[&str] = &[
    "and",
    "between",
    "except",
    "in",
    "intersect",
    "is",
    "like",
    "not",
    "or",
    "union",
];

/// Date parts accepted by EXTRACT / DATE_ADD / DATE_DIFF.
const DATE_PARTS: &[&str] = &[
    "day",
    "hour",
    "minute",
    "month",
    "second",
    "timezone_hour",
    "timezone_minute",
    "year",
];

/// Adjacent keyword/operator triples fused into a single token.
const FUSED_TRIPLES: &[(&str, &str, &str, TokenKind, &str)] = &[
    ("left", "outer", "join", TokenKind::Keyword, "left_join"),
    ("right", "outer", "join", TokenKind::Keyword, "right_join"),
    ("left", "cross", "join", TokenKind::Keyword, "left_cross_join"),
    ("right", "cross", "join", TokenKind::Keyword, "right_cross_join"),
    ("outer", "cross", "join", TokenKind::Keyword, "outer_cross_join"),
];

/// Adjacent keyword/operator pairs fused into a single token.
const FUSED_PAIRS: &[(&str, &str, TokenKind, &str)] = &[
    ("is", "not", TokenKind::Operator, "is_not"),
    ("not", "in", TokenKind::Operator, "not_in"),
    ("not", "between", TokenKind::Operator, "not_between"),
    ("not", "like", TokenKind::Operator, "not_like"),
    ("union", "all", TokenKind::Operator, "union_all"),
    ("intersect", "all", TokenKind::Operator, "intersect_all"),
    ("except", "all", TokenKind::Operator, "except_all"),
    ("inner", "join", TokenKind::Keyword, "inner_join"),
    ("cross", "join", TokenKind::Keyword, "cross_join"),
    ("left", "join", TokenKind::Keyword, "left_join"),
    ("right", "join", TokenKind::Keyword, "right_join"),
    ("outer", "join", TokenKind::Keyword, "outer_join"),
    ("insert", "into", TokenKind::Keyword, "insert_into"),
    ("on", "conflict", TokenKind::Keyword, "on_conflict"),
    ("do", "nothing", TokenKind::Keyword, "do_nothing"),
    ("modified", "old", TokenKind::Keyword, "modified_old"),
    ("modified", "new", TokenKind::Keyword, "modified_new"),
    ("all", "old", TokenKind::Keyword, "all_old"),
    ("all", "new", TokenKind::Keyword, "all_new"),
    ("not", "materialized", TokenKind::Keyword, "not_materialized"),
];

/// A lexer that tokenizes PartiQL input.
pub struct Lexer<'a> {
    /// The input source code.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// 1-based line of the next character.
    line: usize,
    /// 1-based column of the next character.
    column: usize,
    /// Byte position of the start of the current token.
    start_pos: usize,
    /// Line of the start of the current token.
    start_line: usize,
    /// Column of the start of the current token.
    start_column: usize,
    /// Characters consumed since the start of the current token.
    token_chars: usize,
    /// Counter for `?` parameter ordinals.
    param_counter: i64,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            start_pos: 0,
            start_line: 1,
            start_column: 1,
            token_chars: 0,
            param_counter: 0,
        }
    }

    /// Tokenizes the whole input into an EOF-terminated token sequence.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` on unterminated literals and characters
    /// that cannot start a token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.is_eof();
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(fuse_multi_word(tokens))
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the next character without advancing.
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        self.token_chars += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Skips whitespace and comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            }

            // Single-line comments (-- ...)
            if self.peek() == Some('-') && self.peek_next() == Some('-') {
                self.advance();
                self.advance();
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                continue;
            }

            // Multi-line comments (/* ... */)
            if self.peek() == Some('/') && self.peek_next() == Some('*') {
                self.advance();
                self.advance();
                loop {
                    match self.advance() {
                        Some('*') if self.peek() == Some('/') => {
                            self.advance();
                            break;
                        }
                        None => break,
                        _ => {}
                    }
                }
                continue;
            }

            break;
        }
    }

    /// Marks the start of a token.
    fn mark_start(&mut self) {
        self.start_pos = self.pos;
        self.start_line = self.line;
        self.start_column = self.column;
        self.token_chars = 0;
    }

    /// Creates a span from the marked start to the current position.
    fn make_span(&self) -> Span {
        Span::new(self.start_line, self.start_column, self.token_chars)
    }

    /// Creates a token with the current span.
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    /// Creates a text-carrying token with the current span.
    fn make_text_token(&self, kind: TokenKind, text: impl Into<String>) -> Token {
        Token::with_text(kind, text, self.make_span())
    }

    /// Creates a value-carrying token with the current span.
    fn make_value_token(&self, kind: TokenKind, value: LiteralValue) -> Token {
        Token::with_value(kind, value, self.make_span())
    }

    /// Scans the next token.
    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace_and_comments();
        self.mark_start();

        let Some(c) = self.peek() else {
            return Ok(self.make_token(TokenKind::Eof));
        };

        if c.is_alphabetic() || c == '_' {
            return Ok(self.scan_word());
        }
        if c.is_ascii_digit() {
            return Ok(self.scan_number());
        }

        match c {
            '\'' => self.scan_string(),
            '"' => self.scan_quoted_identifier(),
            '`' => self.scan_ion_literal(),
            '(' => Ok(self.single(TokenKind::LeftParen)),
            ')' => Ok(self.single(TokenKind::RightParen)),
            '[' => Ok(self.single(TokenKind::LeftBracket)),
            ']' => Ok(self.single(TokenKind::RightBracket)),
            '{' => Ok(self.single(TokenKind::LeftCurly)),
            '}' => Ok(self.single(TokenKind::RightCurly)),
            ',' => Ok(self.single(TokenKind::Comma)),
            '.' => Ok(self.single(TokenKind::Dot)),
            ':' => Ok(self.single(TokenKind::Colon)),
            ';' => Ok(self.single(TokenKind::Semicolon)),
            '*' => Ok(self.single(TokenKind::Star)),
            '+' | '-' | '/' | '%' | '=' | '@' => {
                self.advance();
                Ok(self.make_text_token(TokenKind::Operator, c))
            }
            '?' => {
                self.advance();
                self.param_counter += 1;
                Ok(self.make_value_token(
                    TokenKind::QuestionMark,
                    LiteralValue::Integer(self.param_counter),
                ))
            }
            '<' => {
                self.advance();
                match self.peek() {
                    Some('<') => {
                        self.advance();
                        Ok(self.make_token(TokenKind::LeftDoubleAngle))
                    }
                    Some('=') => {
                        self.advance();
                        Ok(self.make_text_token(TokenKind::Operator, "<="))
                    }
                    Some('>') => {
                        self.advance();
                        Ok(self.make_text_token(TokenKind::Operator, "<>"))
                    }
                    _ => Ok(self.make_text_token(TokenKind::Operator, "<")),
                }
            }
            '>' => {
                self.advance();
                match self.peek() {
                    Some('>') => {
                        self.advance();
                        Ok(self.make_token(TokenKind::RightDoubleAngle))
                    }
                    Some('=') => {
                        self.advance();
                        Ok(self.make_text_token(TokenKind::Operator, ">="))
                    }
                    _ => Ok(self.make_text_token(TokenKind::Operator, ">")),
                }
            }
            '!' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(self.make_text_token(TokenKind::Operator, "<>"))
                } else {
                    Err(ParseError::UnexpectedCharacter {
                        character: '!',
                        span: self.make_span(),
                    })
                }
            }
            '|' => {
                self.advance();
                if self.peek() == Some('|') {
                    self.advance();
                    Ok(self.make_text_token(TokenKind::Operator, "||"))
                } else {
                    Err(ParseError::UnexpectedCharacter {
                        character: '|',
                        span: self.make_span(),
                    })
                }
            }
            _ => {
                self.advance();
                Err(ParseError::UnexpectedCharacter {
                    character: c,
                    span: self.make_span(),
                })
            }
        }
    }

    /// Consumes one character and returns a bare token.
    fn single(&mut self, kind: TokenKind) -> Token {
        self.advance();
        self.make_token(kind)
    }

    /// Scans an identifier, keyword, operator, or word literal.
    fn scan_word(&mut self) -> Token {
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        {
            self.advance();
        }

        let word = &self.input[self.start_pos..self.pos];
        let lower = word.to_ascii_lowercase();

        match lower.as_str() {
            "true" => self.make_value_token(TokenKind::Literal, LiteralValue::Boolean(true)),
            "false" => self.make_value_token(TokenKind::Literal, LiteralValue::Boolean(false)),
            "null" => self.make_value_token(TokenKind::Null, LiteralValue::Null),
            "missing" => self.make_token(TokenKind::Missing),
            "as" => self.make_text_token(TokenKind::As, lower),
            "at" => self.make_text_token(TokenKind::At, lower),
            "by" => self.make_text_token(TokenKind::By, lower),
            "asc" => self.make_text_token(TokenKind::Asc, lower),
            "desc" => self.make_text_token(TokenKind::Desc, lower),
            "for" => self.make_text_token(TokenKind::For, lower),
            "both" | "leading" | "trailing" => {
                self.make_text_token(TokenKind::TrimSpecification, lower)
            }
            _ if WORD_OPERATORS.binary_search(&lower.as_str()).is_ok() => {
                self.make_text_token(TokenKind::Operator, lower)
            }
            _ if DATE_PARTS.binary_search(&lower.as_str()).is_ok() => {
                self.make_text_token(TokenKind::DatePart, lower)
            }
            _ if KEYWORDS.binary_search(&lower.as_str()).is_ok() => {
                self.make_text_token(TokenKind::Keyword, lower)
            }
            _ => self.make_text_token(TokenKind::Identifier, word),
        }
    }

    /// Scans a number (integer or real).
    fn scan_number(&mut self) -> Token {
        let start = self.start_pos;
        let mut is_real = false;

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_real = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let mut lookahead = self.input[self.pos..].chars().skip(1);
            let next = lookahead.next();
            let after_sign = lookahead.next();
            let exponent_follows = match next {
                Some(d) if d.is_ascii_digit() => true,
                Some('+' | '-') => after_sign.is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if exponent_follows {
                is_real = true;
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let text = &self.input[start..self.pos];
        let value = if is_real {
            LiteralValue::Real(text.parse().unwrap_or(f64::NAN))
        } else {
            match text.parse::<i64>() {
                Ok(n) => LiteralValue::Integer(n),
                Err(_) => LiteralValue::Real(text.parse().unwrap_or(f64::NAN)),
            }
        };
        self.make_value_token(TokenKind::Literal, value)
    }

    /// Scans a single-quoted string literal ('' escapes a quote).
    fn scan_string(&mut self) -> Result<Token, ParseError> {
        self.advance(); // opening quote
        let mut content = String::new();

        loop {
            match self.peek() {
                Some('\'') => {
                    if self.peek_next() == Some('\'') {
                        self.advance();
                        self.advance();
                        content.push('\'');
                    } else {
                        self.advance();
                        break;
                    }
                }
                Some(c) => {
                    self.advance();
                    content.push(c);
                }
                None => {
                    return Err(ParseError::UnterminatedLiteral {
                        span: self.make_span(),
                    });
                }
            }
        }

        Ok(self.make_value_token(TokenKind::Literal, LiteralValue::Text(content)))
    }

    /// Scans a double-quoted identifier ("" escapes a quote).
    fn scan_quoted_identifier(&mut self) -> Result<Token, ParseError> {
        self.advance(); // opening quote
        let mut content = String::new();

        loop {
            match self.peek() {
                Some('"') => {
                    if self.peek_next() == Some('"') {
                        self.advance();
                        self.advance();
                        content.push('"');
                    } else {
                        self.advance();
                        break;
                    }
                }
                Some(c) => {
                    self.advance();
                    content.push(c);
                }
                None => {
                    return Err(ParseError::UnterminatedLiteral {
                        span: self.make_span(),
                    });
                }
            }
        }

        Ok(self.make_text_token(TokenKind::QuotedIdentifier, content))
    }

    /// Scans a backtick-quoted Ion literal.
    fn scan_ion_literal(&mut self) -> Result<Token, ParseError> {
        self.advance(); // opening backtick
        let mut content = String::new();

        loop {
            match self.peek() {
                Some('`') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    self.advance();
                    content.push(c);
                }
                None => {
                    return Err(ParseError::UnterminatedLiteral {
                        span: self.make_span(),
                    });
                }
            }
        }

        Ok(self.make_value_token(TokenKind::IonLiteral, LiteralValue::Ion(content)))
    }
}

/// Fuses adjacent multi-word keywords and operators into single tokens.
///
/// Normalized texts join the words with `_` (e.g., `NOT BETWEEN` becomes
/// the single operator `not_between`, `LEFT CROSS JOIN` the single
/// keyword `left_cross_join`).
fn fuse_multi_word(tokens: Vec<Token>) -> Vec<Token> {
    fn fusable_text(token: &Token) -> Option<&str> {
        match token.kind {
            TokenKind::Keyword | TokenKind::Operator => token.text(),
            _ => None,
        }
    }

    let mut fused = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let first = fusable_text(&tokens[i]);
        let second = tokens.get(i + 1).and_then(fusable_text);
        let third = tokens.get(i + 2).and_then(fusable_text);

        if let (Some(a), Some(b), Some(c)) = (first, second, third) {
            if let Some(&(_, _, _, kind, text)) = FUSED_TRIPLES
                .iter()
                .find(|&&(x, y, z, _, _)| x == a && y == b && z == c)
            {
                fused.push(Token::with_text(kind, text, tokens[i].span));
                i += 3;
                continue;
            }
        }
        if let (Some(a), Some(b)) = (first, second) {
            if let Some(&(_, _, kind, text)) =
                FUSED_PAIRS.iter().find(|&&(x, y, _, _)| x == a && y == b)
            {
                fused.push(Token::with_text(kind, text, tokens[i].span));
                i += 2;
                continue;
            }
        }
        fused.push(tokens[i].clone());
        i += 1;
    }
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        Lexer::new(input).tokenize().expect("tokenize failed")
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex(input).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_select() {
        let tokens = lex("SELECT a FROM t");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[0].text(), Some("select"));
        assert_eq!(tokens[1].text(), Some("a"));
    }

    #[test]
    fn test_keywords_are_normalized_lowercase() {
        let tokens = lex("SeLeCt");
        assert_eq!(tokens[0].text(), Some("select"));
    }

    #[test]
    fn test_multi_word_fusion() {
        let tokens = lex("a NOT BETWEEN 1 AND 2");
        assert!(tokens[1].is_operator("not_between"));

        let tokens = lex("x IS NOT NULL");
        assert!(tokens[1].is_operator("is_not"));

        let tokens = lex("a LEFT OUTER JOIN b");
        assert!(tokens[1].is_keyword("left_join"));

        let tokens = lex("a LEFT CROSS JOIN b");
        assert!(tokens[1].is_keyword("left_cross_join"));

        let tokens = lex("SELECT 1 UNION ALL SELECT 2");
        assert!(tokens[2].is_operator("union_all"));

        let tokens = lex("INSERT INTO foo");
        assert!(tokens[0].is_keyword("insert_into"));
    }

    #[test]
    fn test_bag_delimiters() {
        assert_eq!(
            kinds("<<1, 2>>"),
            vec![
                TokenKind::LeftDoubleAngle,
                TokenKind::Literal,
                TokenKind::Comma,
                TokenKind::Literal,
                TokenKind::RightDoubleAngle,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_operators() {
        let tokens = lex("a <= b <> c != d || e");
        assert!(tokens[1].is_operator("<="));
        assert!(tokens[3].is_operator("<>"));
        assert!(tokens[5].is_operator("<>"));
        assert!(tokens[7].is_operator("||"));
    }

    #[test]
    fn test_string_literal_with_escape() {
        let tokens = lex("'it''s'");
        assert_eq!(
            tokens[0].value,
            Some(LiteralValue::Text(String::from("it's")))
        );
    }

    #[test]
    fn test_quoted_identifier() {
        let tokens = lex("\"Column Name\"");
        assert_eq!(tokens[0].kind, TokenKind::QuotedIdentifier);
        assert_eq!(tokens[0].text(), Some("Column Name"));
    }

    #[test]
    fn test_ion_literal() {
        let tokens = lex("`{a: 1}`");
        assert_eq!(tokens[0].kind, TokenKind::IonLiteral);
        assert_eq!(
            tokens[0].value,
            Some(LiteralValue::Ion(String::from("{a: 1}")))
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("42 3.25 1e3");
        assert_eq!(tokens[0].value, Some(LiteralValue::Integer(42)));
        assert_eq!(tokens[1].value, Some(LiteralValue::Real(3.25)));
        assert_eq!(tokens[2].value, Some(LiteralValue::Real(1000.0)));
    }

    #[test]
    fn test_parameter_ordinals() {
        let tokens = lex("? + ?");
        assert_eq!(tokens[0].value, Some(LiteralValue::Integer(1)));
        assert_eq!(tokens[2].value, Some(LiteralValue::Integer(2)));
    }

    #[test]
    fn test_line_and_column_tracking() {
        let tokens = lex("SELECT a\nFROM t");
        assert_eq!(tokens[0].span, Span::new(1, 1, 6));
        assert_eq!(tokens[1].span, Span::new(1, 8, 1));
        assert_eq!(tokens[2].span, Span::new(2, 1, 4));
        assert_eq!(tokens[3].span, Span::new(2, 6, 1));
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = lex("SELECT a -- trailing\nFROM /* inline */ t");
        assert_eq!(tokens.len(), 5);
        assert!(tokens[2].is_keyword("from"));
    }

    #[test]
    fn test_trim_specification_and_date_part() {
        let tokens = lex("leading year");
        assert_eq!(tokens[0].kind, TokenKind::TrimSpecification);
        assert_eq!(tokens[1].kind, TokenKind::DatePart);
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("'abc").tokenize().unwrap_err();
        assert_eq!(err.code(), "unterminated_literal");
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("a ^ b").tokenize().unwrap_err();
        assert_eq!(err.code(), "unexpected_character");
    }
}
