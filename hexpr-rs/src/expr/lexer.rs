//! Tokenizer.
//!
//! Tokens are produced on demand so that a lexical error past the point
//! where evaluation already failed is never reported.  The evaluator keeps
//! a single token of lookahead.

use std::fmt;

use super::builtins::is_keyword;
use super::error::ExprError;

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Int(i64),
    Real(f64),
    Str(String),
    /// Identifier or keyword; keywords are recognised case-insensitively by
    /// the evaluator.
    Ident(String),
    /// `@name`: always a symbol name, never a keyword.
    Quoted(String),

    // Arithmetic and bitwise
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    Bang,
    ShiftLeft,
    ShiftRight,
    Inc,
    Dec,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,

    // Assignment
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    ShlAssign,
    ShrAssign,

    // Punctuation
    Question,
    Colon,
    Comma,
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,

    Eof,
}

impl Token {
    /// The operator text for assignment tokens.
    pub fn assign_symbol(&self) -> Option<&'static str> {
        Some(match self {
            Token::Assign => "=",
            Token::PlusAssign => "+=",
            Token::MinusAssign => "-=",
            Token::StarAssign => "*=",
            Token::SlashAssign => "/=",
            Token::PercentAssign => "%=",
            Token::AmpAssign => "&=",
            Token::PipeAssign => "|=",
            Token::CaretAssign => "^=",
            Token::ShlAssign => "<<=",
            Token::ShrAssign => ">>=",
            _ => return None,
        })
    }

    pub fn is_assign(&self) -> bool {
        self.assign_symbol().is_some()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(op) = self.assign_symbol() {
            return f.write_str(op);
        }
        let s = match self {
            Token::Int(n) => return write!(f, "{n}"),
            Token::Real(x) => return write!(f, "{x}"),
            Token::Str(s) => return write!(f, "\"{s}\""),
            Token::Ident(s) => return f.write_str(s),
            Token::Quoted(s) => return write!(f, "@{s}"),
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Ampersand => "&",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::Tilde => "~",
            Token::Bang => "!",
            Token::ShiftLeft => "<<",
            Token::ShiftRight => ">>",
            Token::Inc => "++",
            Token::Dec => "--",
            Token::Eq => "==",
            Token::Ne => "!=",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::And => "&&",
            Token::Or => "||",
            Token::Question => "?",
            Token::Colon => ":",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Eof => "end of expression",
            _ => "",
        };
        f.write_str(s)
    }
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

pub struct Lexer {
    src: Vec<char>,
    pos: usize,
    radix: u32,
    /// Digit separator for decimal literals, when separators are enabled.
    /// Non-decimal literals use a space.
    separator: Option<char>,
    /// The last token ended an operand, so a `.` is member access even
    /// when a digit follows.
    after_operand: bool,
}

impl Lexer {
    pub fn new(src: &str) -> Self {
        Lexer {
            src: src.chars().collect(),
            pos: 0,
            radix: 10,
            separator: None,
            after_operand: false,
        }
    }

    /// Radix of integer literals without a prefix (2 to 36).
    pub fn with_radix(mut self, radix: u32) -> Self {
        self.radix = radix.clamp(2, 36);
        self
    }

    pub fn with_separator(mut self, separator: Option<char>) -> Self {
        self.separator = separator;
        self
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, off: usize) -> Option<char> {
        self.src.get(self.pos + off).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// Lex every remaining token.  Mostly useful for tests.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ExprError> {
        let mut out = Vec::new();
        loop {
            let tok = self.next_token()?;
            if tok == Token::Eof {
                return Ok(out);
            }
            out.push(tok);
        }
    }

    pub fn next_token(&mut self) -> Result<Token, ExprError> {
        let tok = self.lex_token()?;
        self.after_operand = matches!(
            tok,
            Token::Ident(_) | Token::Quoted(_) | Token::RParen | Token::RBracket
        );
        Ok(tok)
    }

    fn lex_token(&mut self) -> Result<Token, ExprError> {
        self.skip_ws();
        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        let leading_dot = c == '.'
            && !self.after_operand
            && matches!(self.peek_at(1), Some(d) if d.is_ascii_digit());
        if c.is_ascii_digit() || leading_dot {
            return self.read_number();
        }
        if is_ident_start(c) {
            if self.radix > 10 && self.word_is_number() {
                return self.read_number();
            }
            return Ok(Token::Ident(self.read_ident()));
        }

        self.pos += 1;
        let tok = match c {
            '"' => self.read_string()?,
            '\'' => self.read_char()?,
            '@' => {
                if matches!(self.peek(), Some(c) if is_ident_char(c)) {
                    Token::Quoted(self.read_ident())
                } else {
                    return Err(unexpected_char('@'));
                }
            }
            '+' => {
                if self.eat('+') {
                    Token::Inc
                } else if self.eat('=') {
                    Token::PlusAssign
                } else {
                    Token::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    Token::Dec
                } else if self.eat('=') {
                    Token::MinusAssign
                } else {
                    Token::Minus
                }
            }
            '*' => self.with_assign(Token::Star, Token::StarAssign),
            '/' => self.with_assign(Token::Slash, Token::SlashAssign),
            '%' => self.with_assign(Token::Percent, Token::PercentAssign),
            '&' => {
                if self.eat('&') {
                    Token::And
                } else if self.eat('=') {
                    Token::AmpAssign
                } else {
                    self.reject_pair('&', "|^")?;
                    Token::Ampersand
                }
            }
            '|' => {
                if self.eat('|') {
                    Token::Or
                } else if self.eat('=') {
                    Token::PipeAssign
                } else {
                    self.reject_pair('|', "&^")?;
                    Token::Pipe
                }
            }
            '^' => {
                if self.eat('=') {
                    Token::CaretAssign
                } else {
                    self.reject_pair('^', "&|^")?;
                    Token::Caret
                }
            }
            '<' => {
                if self.eat('<') {
                    self.with_assign(Token::ShiftLeft, Token::ShlAssign)
                } else {
                    self.with_assign(Token::Lt, Token::Le)
                }
            }
            '>' => {
                if self.eat('>') {
                    self.with_assign(Token::ShiftRight, Token::ShrAssign)
                } else {
                    self.with_assign(Token::Gt, Token::Ge)
                }
            }
            '=' => self.with_assign(Token::Assign, Token::Eq),
            '!' => self.with_assign(Token::Bang, Token::Ne),
            '~' => Token::Tilde,
            '?' => Token::Question,
            ':' => Token::Colon,
            ',' => Token::Comma,
            '.' => Token::Dot,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            other => return Err(unexpected_char(other)),
        };
        Ok(tok)
    }

    fn with_assign(&mut self, plain: Token, with_eq: Token) -> Token {
        if self.eat('=') {
            with_eq
        } else {
            plain
        }
    }

    fn reject_pair(&self, first: char, bad: &str) -> Result<(), ExprError> {
        match self.peek() {
            Some(c) if bad.contains(c) => Err(ExprError::lexical(format!(
                "Unexpected characters \"{first}{c}\""
            ))),
            _ => Ok(()),
        }
    }

    // ── Identifiers ──────────────────────────────────────────────────────────

    fn read_ident(&mut self) -> String {
        let mut s = String::new();
        loop {
            match self.peek() {
                Some(c) if is_ident_char(c) => {
                    s.push(c);
                    self.pos += 1;
                }
                // `::` joins scoped names such as `Color::Red`.
                Some(':')
                    if self.peek_at(1) == Some(':')
                        && matches!(self.peek_at(2), Some(c) if is_ident_start(c)) =>
                {
                    s.push_str("::");
                    self.pos += 2;
                }
                _ => return s,
            }
        }
    }

    /// With a radix above ten a word such as `ff` may be a number.  It is
    /// one when every character is a digit of the radix and it is not a
    /// keyword.
    fn word_is_number(&self) -> bool {
        let word: String = self.src[self.pos..]
            .iter()
            .take_while(|c| is_ident_char(**c))
            .collect();
        if word.starts_with('_') || !word.chars().all(|c| c.is_digit(self.radix)) {
            return false;
        }
        if self.peek_at(word.chars().count()) == Some(':')
            && self.peek_at(word.chars().count() + 1) == Some(':')
        {
            return false;
        }
        !is_keyword(&word.to_ascii_lowercase())
    }

    // ── Numbers ──────────────────────────────────────────────────────────────

    fn read_number(&mut self) -> Result<Token, ExprError> {
        let start = self.pos;
        if self.peek() == Some('0') {
            let prefixed = match self.peek_at(1) {
                Some('x' | 'X') => Some(16),
                Some('b' | 'B') if self.radix <= 11 => Some(2),
                Some('o' | 'O') if self.radix <= 24 => Some(8),
                _ => None,
            };
            if let Some(radix) = prefixed {
                if matches!(self.peek_at(2), Some(c) if c.is_digit(radix)) {
                    self.pos += 2;
                    return self.read_prefixed(start, radix);
                }
                if radix == 16 {
                    self.pos += 2;
                    return Err(self.invalid_number(start));
                }
            }
        }

        if self.radix == 10 {
            self.read_decimal(start)
        } else {
            self.read_radix(start)
        }
    }

    fn read_prefixed(&mut self, start: usize, radix: u32) -> Result<Token, ExprError> {
        let digits = self.read_digits(radix, None);
        if matches!(self.peek(), Some(c) if is_ident_char(c)) {
            return Err(self.invalid_number(start));
        }
        match parse_u64(&digits, radix) {
            Some(n) => Ok(Token::Int(n as i64)),
            None if radix == 16 => Err(ExprError::lexical(format!(
                "Overflow: Hex integer \"{digits}\" too big"
            ))),
            None => Err(overflow(&digits)),
        }
    }

    fn read_decimal(&mut self, start: usize) -> Result<Token, ExprError> {
        let mut digits = self.read_digits(10, self.separator);
        let mut is_real = false;

        let fraction = self.peek() == Some('.')
            && !matches!(self.peek_at(1), Some(c) if is_ident_start(c) && c != 'e' && c != 'E');
        if fraction {
            is_real = true;
            self.pos += 1;
            digits.push('.');
            digits.push_str(&self.read_digits(10, None));
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_real = true;
            digits.push('e');
            self.pos += 1;
            if let Some(sign @ ('+' | '-')) = self.peek() {
                digits.push(sign);
                self.pos += 1;
            }
            let exp = self.read_digits(10, None);
            if exp.is_empty() {
                return Err(self.invalid_number(start));
            }
            digits.push_str(&exp);
        }
        if matches!(self.peek(), Some(c) if is_ident_char(c)) {
            return Err(self.invalid_number(start));
        }

        if is_real {
            digits
                .parse::<f64>()
                .map(Token::Real)
                .map_err(|_| self.invalid_number(start))
        } else {
            parse_u64(&digits, 10)
                .map(|n| Token::Int(n as i64))
                .ok_or_else(|| overflow(&digits))
        }
    }

    fn read_radix(&mut self, start: usize) -> Result<Token, ExprError> {
        let sep = self.separator.map(|_| ' ');
        let digits = self.read_digits(self.radix, sep);
        let decimal_tail = matches!(self.peek(), Some(c) if c.is_ascii_digit())
            || (self.peek() == Some('.') && digits.chars().all(|c| c.is_ascii_digit()));
        if decimal_tail {
            // Either a fraction or a digit the radix doesn't have.
            self.pos = start;
            return match self.read_decimal(start)? {
                Token::Real(x) => Ok(Token::Real(x)),
                _ => Err(self.invalid_number(start)),
            };
        }
        if matches!(self.peek(), Some(c) if is_ident_char(c)) {
            return Err(self.invalid_number(start));
        }
        parse_u64(&digits, self.radix)
            .map(|n| Token::Int(n as i64))
            .ok_or_else(|| overflow(&digits))
    }

    /// Collect digits of `radix`, skipping a separator only when a digit
    /// follows it.
    fn read_digits(&mut self, radix: u32, sep: Option<char>) -> String {
        let mut s = String::new();
        loop {
            match self.peek() {
                Some(c) if c.is_digit(radix) => {
                    s.push(c);
                    self.pos += 1;
                }
                Some(c)
                    if Some(c) == sep
                        && !s.is_empty()
                        && matches!(self.peek_at(1), Some(d) if d.is_digit(radix)) =>
                {
                    self.pos += 1;
                }
                _ => return s,
            }
        }
    }

    /// Consume the rest of a malformed number and report it.
    fn invalid_number(&mut self, start: usize) -> ExprError {
        while matches!(self.peek(), Some(c) if is_ident_char(c) || c == '.') {
            self.pos += 1;
        }
        let text: String = self.src[start..self.pos].iter().collect();
        ExprError::lexical(format!("Invalid number: {text}"))
    }

    // ── Character and string constants ───────────────────────────────────────

    fn read_char(&mut self) -> Result<Token, ExprError> {
        let code = match self.advance() {
            None => return Err(ExprError::lexical("Expected ' after character constant")),
            Some('\\') => match self.read_escape() {
                Escape::Char(c) => c as i64,
                Escape::Byte(b) => b as i64,
                Escape::Empty(c) | Escape::Unknown(c) => {
                    return Err(ExprError::lexical(format!(
                        "Unexpected character constant escape sequence \\{c}"
                    )))
                }
                Escape::Eof => return Err(ExprError::lexical("Expected ' after character constant")),
            },
            Some(c) => c as i64,
        };
        if !self.eat('\'') {
            return Err(ExprError::lexical("Expected ' after character constant"));
        }
        Ok(Token::Int(code))
    }

    fn read_string(&mut self) -> Result<Token, ExprError> {
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(ExprError::lexical("Unterminated string constant")),
                Some('"') => break,
                Some('\\') => match self.read_escape() {
                    Escape::Char(c) => s.push(c),
                    Escape::Byte(b) => s.push(char::from(b)),
                    Escape::Empty(_) => {}
                    Escape::Unknown(c) => s.push(c),
                    Escape::Eof => return Err(ExprError::lexical("Unterminated string constant")),
                },
                Some(c) => s.push(c),
            }
        }
        // The value stops at an embedded NUL.
        if let Some(nul) = s.find('\0') {
            s.truncate(nul);
        }
        Ok(Token::Str(s))
    }

    fn read_escape(&mut self) -> Escape {
        let Some(c) = self.advance() else {
            return Escape::Eof;
        };
        let ch = match c {
            'a' => '\x07',
            'b' => '\x08',
            't' => '\t',
            'n' => '\n',
            'v' => '\x0B',
            'f' => '\x0C',
            'r' => '\r',
            '0' => '\0',
            '\\' | '\'' | '"' | '?' => c,
            'x' => {
                let mut value: u32 = 0;
                let mut count = 0;
                while count < 2 {
                    match self.peek().and_then(|d| d.to_digit(16)) {
                        Some(d) => {
                            value = value * 16 + d;
                            self.pos += 1;
                            count += 1;
                        }
                        None => break,
                    }
                }
                return if count == 0 {
                    Escape::Empty('x')
                } else {
                    Escape::Byte(value as u8)
                };
            }
            other => return Escape::Unknown(other),
        };
        Escape::Char(ch)
    }
}

enum Escape {
    Char(char),
    Byte(u8),
    /// `\x` without digits.
    Empty(char),
    Unknown(char),
    Eof,
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn parse_u64(digits: &str, radix: u32) -> Option<u64> {
    u64::from_str_radix(digits, radix).ok()
}

fn overflow(digits: &str) -> ExprError {
    ExprError::lexical(format!("Overflow: \"{digits}\" too big"))
}

fn unexpected_char(c: char) -> ExprError {
    ExprError::lexical(format!("Unexpected character \"{c}\""))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(s: &str) -> Vec<Token> {
        Lexer::new(s).tokenize().unwrap()
    }

    fn lex_err(s: &str) -> String {
        Lexer::new(s).tokenize().unwrap_err().to_string()
    }

    #[test]
    fn operators() {
        assert_eq!(
            lex("a <<= 1 >= b && !c"),
            vec![
                Token::Ident("a".into()),
                Token::ShlAssign,
                Token::Int(1),
                Token::Ge,
                Token::Ident("b".into()),
                Token::And,
                Token::Bang,
                Token::Ident("c".into()),
            ]
        );
        assert_eq!(lex("x++ - --y"), vec![
            Token::Ident("x".into()),
            Token::Inc,
            Token::Minus,
            Token::Dec,
            Token::Ident("y".into()),
        ]);
    }

    #[test]
    fn numbers() {
        assert_eq!(lex("42"), vec![Token::Int(42)]);
        assert_eq!(lex("0x1F"), vec![Token::Int(31)]);
        assert_eq!(lex("0b101 0o17"), vec![Token::Int(5), Token::Int(15)]);
        assert_eq!(lex("1.5 .25 2e3"), vec![Token::Real(1.5), Token::Real(0.25), Token::Real(2000.0)]);
        assert_eq!(lex("0xFFFFFFFFFFFFFFFF"), vec![Token::Int(-1)]);
    }

    #[test]
    fn bad_numbers() {
        assert_eq!(lex_err("1e+"), "Invalid number: 1e+");
        assert_eq!(
            lex_err("0x10000000000000000"),
            "Overflow: Hex integer \"10000000000000000\" too big"
        );
        assert_eq!(
            lex_err("99999999999999999999"),
            "Overflow: \"99999999999999999999\" too big"
        );
    }

    #[test]
    fn radix_sixteen_words() {
        let toks = Lexer::new("A1 + fact").with_radix(16).tokenize().unwrap();
        assert_eq!(toks, vec![Token::Int(0xA1), Token::Plus, Token::Ident("fact".into())]);
        let toks = Lexer::new("add").with_radix(16).tokenize().unwrap();
        assert_eq!(toks, vec![Token::Int(0xADD)]);
    }

    #[test]
    fn separators() {
        let toks = Lexer::new("123,456")
            .with_separator(Some(','))
            .tokenize()
            .unwrap();
        assert_eq!(toks, vec![Token::Int(123_456)]);

        let toks = Lexer::new("A1 b2")
            .with_radix(16)
            .with_separator(Some(','))
            .tokenize()
            .unwrap();
        assert_eq!(toks, vec![Token::Int(0xA1B2)]);

        // Without a following digit the separator is a comma token.
        let toks = Lexer::new("1, 2").with_separator(Some(',')).tokenize().unwrap();
        assert_eq!(toks, vec![Token::Int(1), Token::Comma, Token::Int(2)]);
    }

    #[test]
    fn char_constants() {
        assert_eq!(lex("'A'"), vec![Token::Int(65)]);
        assert_eq!(lex(r"'\n' '\x41' '\''"), vec![Token::Int(10), Token::Int(65), Token::Int(39)]);
        assert_eq!(lex_err("'AB'"), "Expected ' after character constant");
        assert_eq!(lex_err(r"'\x'"), "Unexpected character constant escape sequence \\x");
        assert_eq!(lex_err(r"'\q'"), "Unexpected character constant escape sequence \\q");
    }

    #[test]
    fn strings() {
        assert_eq!(lex(r#""a\tb""#), vec![Token::Str("a\tb".into())]);
        assert_eq!(lex(r#""\x41\x""#), vec![Token::Str("A".into())]);
        assert_eq!(lex(r#""ab\0cd""#), vec![Token::Str("ab".into())]);
        assert_eq!(lex_err("\"abc"), "Unterminated string constant");
    }

    #[test]
    fn bad_characters() {
        assert_eq!(lex_err("1 # 2"), "Unexpected character \"#\"");
        assert_eq!(lex_err("1 &| 2"), "Unexpected characters \"&|\"");
        assert_eq!(lex_err("1 ^^ 2"), "Unexpected characters \"^^\"");
    }

    #[test]
    fn quoted_and_scoped_names() {
        assert_eq!(lex("@int"), vec![Token::Quoted("int".into())]);
        assert_eq!(lex("Color::Red"), vec![Token::Ident("Color::Red".into())]);
    }

    #[test]
    fn dot_after_operand_is_member_access() {
        assert_eq!(lex("s.1"), vec![Token::Ident("s".into()), Token::Dot, Token::Int(1)]);
        assert_eq!(lex("a[0].5"), vec![
            Token::Ident("a".into()),
            Token::LBracket,
            Token::Int(0),
            Token::RBracket,
            Token::Dot,
            Token::Int(5),
        ]);
        assert_eq!(lex("1 + .5"), vec![Token::Int(1), Token::Plus, Token::Real(0.5)]);
        assert_eq!(lex_err("s.1e+"), "Invalid number: 1e+");
    }
}
