//! Recursive descent parser for query expressions.

use super::ast::{Comparator, Expr, Value};
use super::error::{ParseError, ParseResult};
use super::lexer::{Lexer, PositionedToken, QueryToken};

/// Parser for tagview query expressions.
///
/// # Grammar
///
/// ```text
/// expression  ::= or_expr
/// or_expr     ::= and_expr ("OR" and_expr)*
/// and_expr    ::= not_expr ("AND" not_expr)*
/// not_expr    ::= "NOT" not_expr | primary
/// primary     ::= "(" expression ")" | comparison | function_call
/// comparison  ::= field comparator value
///               | field "IN" "(" value ("," value)* ")"
/// function_call ::= name "(" field "," value ")"
/// ```
///
/// # Operator Precedence (highest to lowest)
///
/// 1. `NOT` - unary
/// 2. `AND` - binary, left-associative
/// 3. `OR` - binary, left-associative
///
/// There is no implicit AND: two adjacent comparisons without an operator
/// between them are a parse error.
///
/// # Example
///
/// ```
/// use tagview_query_rs::query::{Expr, QueryParser};
///
/// let expr = QueryParser::parse("tag = \"vacation\"").unwrap();
/// assert!(matches!(expr, Expr::Comparison { .. }));
///
/// let expr = QueryParser::parse("size > 10MB AND NOT tag = \"archived\"").unwrap();
/// assert!(matches!(expr, Expr::And(_, _)));
/// ```
pub struct QueryParser {
    tokens: Vec<PositionedToken>,
    position: usize,
    /// Byte length of the input, used as the offset for end-of-input errors.
    input_len: usize,
}

impl QueryParser {
    /// Parses a query string into an [`Expr`] AST.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::EmptyExpression`] for empty or whitespace-only
    /// input, [`ParseError::Lex`] when tokenization fails, and positioned
    /// [`ParseError`] variants for grammar violations. The first error aborts
    /// the parse.
    pub fn parse(input: &str) -> ParseResult<Expr> {
        let tokens = Lexer::new(input).tokenize()?;
        if tokens.is_empty() {
            return Err(ParseError::EmptyExpression);
        }

        let mut parser = Self {
            tokens,
            position: 0,
            input_len: input.len(),
        };
        let expr = parser.parse_expression()?;

        // Every token must have been consumed.
        if let Some(remaining) = parser.peek() {
            return Err(match remaining.token {
                QueryToken::CloseParen => ParseError::UnmatchedParen {
                    offset: remaining.position,
                },
                _ => ParseError::UnexpectedToken {
                    expected: "'AND', 'OR', or end of query".to_string(),
                    found: remaining.token.to_string(),
                    offset: remaining.position,
                },
            });
        }

        Ok(expr)
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&PositionedToken> {
        self.tokens.get(self.position)
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> Option<PositionedToken> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Checks if the current token matches the expected token.
    fn check(&self, expected: &QueryToken) -> bool {
        self.peek().map(|pt| &pt.token) == Some(expected)
    }

    /// Consumes the current token if it matches, erroring otherwise.
    fn expect(&mut self, expected: &QueryToken, description: &str) -> ParseResult<()> {
        match self.peek() {
            Some(pt) if &pt.token == expected => {
                self.advance();
                Ok(())
            }
            Some(pt) => Err(ParseError::UnexpectedToken {
                expected: description.to_string(),
                found: pt.token.to_string(),
                offset: pt.position,
            }),
            None => Err(ParseError::UnexpectedEnd {
                offset: self.input_len,
            }),
        }
    }

    /// Parses the top-level expression (OR expression).
    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_or_expr()
    }

    /// Parses OR expressions: `and_expr ("OR" and_expr)*`
    fn parse_or_expr(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and_expr()?;

        while self.check(&QueryToken::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::or(left, right);
        }

        Ok(left)
    }

    /// Parses AND expressions: `not_expr ("AND" not_expr)*`
    fn parse_and_expr(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_not_expr()?;

        while self.check(&QueryToken::And) {
            self.advance();
            let right = self.parse_not_expr()?;
            left = Expr::and(left, right);
        }

        Ok(left)
    }

    /// Parses NOT expressions: `"NOT" not_expr | primary`
    fn parse_not_expr(&mut self) -> ParseResult<Expr> {
        if self.check(&QueryToken::Not) {
            self.advance();
            let inner = self.parse_not_expr()?;
            return Ok(Expr::negate(inner));
        }

        self.parse_primary()
    }

    /// Parses primary expressions: parenthesized group, comparison, or
    /// function call.
    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let Some(pt) = self.advance() else {
            return Err(ParseError::UnexpectedEnd {
                offset: self.input_len,
            });
        };

        match pt.token {
            QueryToken::OpenParen => {
                let inner = self.parse_expression()?;
                self.expect(&QueryToken::CloseParen, "')'")?;
                Ok(inner)
            }

            QueryToken::Ident(name) => {
                if self.check(&QueryToken::OpenParen) {
                    self.parse_function_call(name)
                } else {
                    self.parse_comparison(name)
                }
            }

            other => Err(ParseError::UnexpectedToken {
                expected: "a field name, a function call, 'NOT', or '('".to_string(),
                found: other.to_string(),
                offset: pt.position,
            }),
        }
    }

    /// Parses the remainder of a comparison after its field name.
    fn parse_comparison(&mut self, field: String) -> ParseResult<Expr> {
        let Some(pt) = self.advance() else {
            return Err(ParseError::UnexpectedEnd {
                offset: self.input_len,
            });
        };

        let op = match pt.token {
            QueryToken::Eq => Comparator::Eq,
            QueryToken::NotEq => Comparator::NotEq,
            QueryToken::Like => Comparator::Like,
            QueryToken::Gt => Comparator::Gt,
            QueryToken::Lt => Comparator::Lt,
            QueryToken::Gte => Comparator::Gte,
            QueryToken::Lte => Comparator::Lte,
            QueryToken::In => return self.parse_in_list(field),
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "a comparator ('=', '!=', '~', '>', '<', '>=', '<=', 'IN')"
                        .to_string(),
                    found: other.to_string(),
                    offset: pt.position,
                })
            }
        };

        let value = self.parse_value()?;
        Ok(Expr::Comparison { field, op, value })
    }

    /// Parses `"(" value ("," value)* ")"` after an `IN` keyword.
    fn parse_in_list(&mut self, field: String) -> ParseResult<Expr> {
        self.expect(&QueryToken::OpenParen, "'(' after 'IN'")?;

        let mut values = vec![self.parse_value()?];
        while self.check(&QueryToken::Comma) {
            self.advance();
            values.push(self.parse_value()?);
        }

        self.expect(&QueryToken::CloseParen, "',' or ')'")?;

        Ok(Expr::Comparison {
            field,
            op: Comparator::In,
            value: Value::List(values),
        })
    }

    /// Parses `"(" field "," value ")"` after a function name.
    fn parse_function_call(&mut self, name: String) -> ParseResult<Expr> {
        self.expect(&QueryToken::OpenParen, "'('")?;

        let field = match self.advance() {
            Some(PositionedToken {
                token: QueryToken::Ident(field),
                ..
            }) => field,
            Some(pt) => {
                return Err(ParseError::UnexpectedToken {
                    expected: "a field name".to_string(),
                    found: pt.token.to_string(),
                    offset: pt.position,
                })
            }
            None => {
                return Err(ParseError::UnexpectedEnd {
                    offset: self.input_len,
                })
            }
        };

        self.expect(&QueryToken::Comma, "','")?;
        let value = self.parse_value()?;
        self.expect(&QueryToken::CloseParen, "')'")?;

        Ok(Expr::Call { name, field, value })
    }

    /// Parses a single value: a string, a number, or a bare word (which is
    /// treated as a string; the validator interprets it per field).
    fn parse_value(&mut self) -> ParseResult<Value> {
        let Some(pt) = self.advance() else {
            return Err(ParseError::UnexpectedEnd {
                offset: self.input_len,
            });
        };

        match pt.token {
            QueryToken::Str(s) => Ok(Value::Str(s)),
            QueryToken::Number(n) => Ok(Value::Number(n)),
            QueryToken::Ident(w) => Ok(Value::Str(w)),
            other => Err(ParseError::UnexpectedToken {
                expected: "a value".to_string(),
                found: other.to_string(),
                offset: pt.position,
            }),
        }
    }
}
