//! Lexer (tokenizer) for query expressions.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

/// Maximum query length in code points.
///
/// Queries come from an interactive search box; anything longer than this is
/// rejected before tokenization.
pub const MAX_QUERY_LEN: usize = 4096;

/// Errors encountered during lexical analysis.
///
/// Every variant carries the byte offset where the problem starts so the UI
/// can render a caret under the offending character.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LexError {
    /// A string literal was opened but never closed.
    #[error("unterminated string literal starting at offset {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        position: usize,
    },

    /// A numeric literal carried a suffix that is not a known size unit.
    #[error("unknown unit suffix '{unit}' at offset {position}")]
    UnknownUnit {
        /// The unrecognized suffix text.
        unit: String,
        /// Byte offset of the numeric literal.
        position: usize,
    },

    /// A character that cannot start any token.
    #[error("unexpected character '{character}' at offset {position}")]
    IllegalCharacter {
        /// The character that could not be tokenized.
        character: char,
        /// Byte offset of the character.
        position: usize,
    },

    /// The input exceeds [`MAX_QUERY_LEN`] code points.
    #[error("query is {length} characters, the limit is {limit}")]
    InputTooLong {
        /// The configured limit.
        limit: usize,
        /// The actual input length in code points.
        length: usize,
    },
}

impl LexError {
    /// Returns the byte offset the error points at, if it has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            LexError::UnterminatedString { position }
            | LexError::UnknownUnit { position, .. }
            | LexError::IllegalCharacter { position, .. } => Some(*position),
            LexError::InputTooLong { .. } => None,
        }
    }
}

/// A token in a query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryToken {
    /// A bare word: a field name, an unquoted tag or date token, or a
    /// relative date shorthand such as `-7d`.
    Ident(String),

    /// A double-quoted string literal, unescaped.
    Str(String),

    /// A numeric literal. Size unit suffixes are already normalized to bytes.
    Number(f64),

    // ==================== Comparators ====================
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `~` (pattern match)
    Like,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Gte,
    /// `<=`
    Lte,

    // ==================== Keywords ====================
    /// The `AND` keyword.
    And,
    /// The `OR` keyword.
    Or,
    /// The `NOT` keyword.
    Not,
    /// The `IN` keyword.
    In,

    // ==================== Punctuation ====================
    /// Opening parenthesis `(`.
    OpenParen,
    /// Closing parenthesis `)`.
    CloseParen,
    /// Comma separating `IN` list elements.
    Comma,
}

impl fmt::Display for QueryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryToken::Ident(s) => write!(f, "'{}'", s),
            QueryToken::Str(s) => write!(f, "\"{}\"", s),
            QueryToken::Number(n) => write!(f, "{}", n),
            QueryToken::Eq => write!(f, "'='"),
            QueryToken::NotEq => write!(f, "'!='"),
            QueryToken::Like => write!(f, "'~'"),
            QueryToken::Gt => write!(f, "'>'"),
            QueryToken::Lt => write!(f, "'<'"),
            QueryToken::Gte => write!(f, "'>='"),
            QueryToken::Lte => write!(f, "'<='"),
            QueryToken::And => write!(f, "'AND'"),
            QueryToken::Or => write!(f, "'OR'"),
            QueryToken::Not => write!(f, "'NOT'"),
            QueryToken::In => write!(f, "'IN'"),
            QueryToken::OpenParen => write!(f, "'('"),
            QueryToken::CloseParen => write!(f, "')'"),
            QueryToken::Comma => write!(f, "','"),
        }
    }
}

/// A token with its position in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken {
    /// The token.
    pub token: QueryToken,
    /// The byte offset where the token starts (0-indexed).
    pub position: usize,
}

/// Lexer for tokenizing query expressions.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<Chars<'a>>,
    /// Current byte position in the input string.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    /// Tokenizes the whole input, failing on the first lexical error.
    pub fn tokenize(mut self) -> Result<Vec<PositionedToken>, LexError> {
        let length = self.input.chars().count();
        if length > MAX_QUERY_LEN {
            return Err(LexError::InputTooLong {
                limit: MAX_QUERY_LEN,
                length,
            });
        }

        let mut tokens = Vec::new();
        while let Some(positioned) = self.next_token()? {
            tokens.push(positioned);
        }
        Ok(tokens)
    }

    /// Peeks at the next character without consuming it.
    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    /// Consumes and returns the next character, updating position.
    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(ch) = c {
            self.position += ch.len_utf8();
        }
        c
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.peek() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Returns the next token with its position, or `None` at end of input.
    fn next_token(&mut self) -> Result<Option<PositionedToken>, LexError> {
        self.skip_whitespace();

        let Some(&c) = self.peek() else {
            return Ok(None);
        };
        let start = self.position;

        let token = match c {
            '(' => {
                self.next_char();
                QueryToken::OpenParen
            }
            ')' => {
                self.next_char();
                QueryToken::CloseParen
            }
            ',' => {
                self.next_char();
                QueryToken::Comma
            }
            '=' => {
                self.next_char();
                QueryToken::Eq
            }
            '~' => {
                self.next_char();
                QueryToken::Like
            }
            '!' => {
                self.next_char();
                if self.peek() == Some(&'=') {
                    self.next_char();
                    QueryToken::NotEq
                } else {
                    return Err(LexError::IllegalCharacter {
                        character: '!',
                        position: start,
                    });
                }
            }
            '>' => {
                self.next_char();
                if self.peek() == Some(&'=') {
                    self.next_char();
                    QueryToken::Gte
                } else {
                    QueryToken::Gt
                }
            }
            '<' => {
                self.next_char();
                if self.peek() == Some(&'=') {
                    self.next_char();
                    QueryToken::Lte
                } else {
                    QueryToken::Lt
                }
            }
            '"' => self.read_string(start)?,
            '-' => self.read_number_word(start)?,
            _ if c.is_ascii_digit() => self.read_number_word(start)?,
            _ if c.is_alphabetic() || c == '_' => self.read_identifier(),
            _ => {
                return Err(LexError::IllegalCharacter {
                    character: c,
                    position: start,
                })
            }
        };

        Ok(Some(PositionedToken {
            token,
            position: start,
        }))
    }

    /// Reads a double-quoted string literal with `\"` and `\\` escapes.
    fn read_string(&mut self, start: usize) -> Result<QueryToken, LexError> {
        // Consume the opening quote
        self.next_char();

        let mut result = String::new();
        loop {
            match self.next_char() {
                Some('"') => return Ok(QueryToken::Str(result)),
                Some('\\') => match self.next_char() {
                    Some(escaped) => result.push(escaped),
                    None => return Err(LexError::UnterminatedString { position: start }),
                },
                Some(c) => result.push(c),
                None => return Err(LexError::UnterminatedString { position: start }),
            }
        }
    }

    /// Reads a word starting with a digit or `-` and classifies it.
    ///
    /// Pure numbers and numbers with a size unit become [`QueryToken::Number`]
    /// (normalized to bytes). Date-shaped words (`2024-01-15`) and relative
    /// shorthands (`-7d`) stay identifiers for the validator to interpret.
    /// Anything else with a trailing suffix is an unknown unit.
    fn read_number_word(&mut self, start: usize) -> Result<QueryToken, LexError> {
        let mut word = String::new();
        word.push(self.next_char().unwrap());
        while let Some(&c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == ':' {
                word.push(self.next_char().unwrap());
            } else {
                break;
            }
        }

        // A bare `-` is not a token on its own.
        if word == "-" {
            return Err(LexError::IllegalCharacter {
                character: '-',
                position: start,
            });
        }

        if let Ok(n) = word.parse::<f64>() {
            return Ok(QueryToken::Number(n));
        }

        // Split the numeric prefix from the first alphabetic character.
        let Some(split) = word.find(|c: char| c.is_ascii_alphabetic()) else {
            // Digits and punctuation only, not a number: a date such as
            // `2024-01-15`. The validator decides whether it is well-formed.
            return Ok(QueryToken::Ident(word));
        };

        let (prefix, suffix) = word.split_at(split);
        if let Ok(n) = prefix.parse::<f64>() {
            match suffix.to_ascii_lowercase().as_str() {
                "b" => Ok(QueryToken::Number(n)),
                "kb" => Ok(QueryToken::Number(n * 1024.0)),
                "mb" => Ok(QueryToken::Number(n * 1024.0 * 1024.0)),
                "gb" => Ok(QueryToken::Number(n * 1024.0 * 1024.0 * 1024.0)),
                // Relative date shorthands pass through for the validator.
                "d" | "w" => Ok(QueryToken::Ident(word)),
                _ => Err(LexError::UnknownUnit {
                    unit: suffix.to_string(),
                    position: start,
                }),
            }
        } else {
            // Mixed date-like word, e.g. `2024-01-15T10:00:00Z`.
            Ok(QueryToken::Ident(word))
        }
    }

    /// Reads an identifier or keyword.
    ///
    /// Keywords are case-sensitive (`AND`, not `and`); everything else is an
    /// identifier. `:` is allowed inside identifiers so `events:2024` works
    /// unquoted.
    fn read_identifier(&mut self) -> QueryToken {
        let mut ident = String::new();
        while let Some(&c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' || c == ':' {
                ident.push(self.next_char().unwrap());
            } else {
                break;
            }
        }

        match ident.as_str() {
            "AND" => QueryToken::And,
            "OR" => QueryToken::Or,
            "NOT" => QueryToken::Not,
            "IN" => QueryToken::In,
            _ => QueryToken::Ident(ident),
        }
    }
}
