//! Text syntax for expressions
//!
//! The grammar follows R/dplyr conventions where they are unambiguous:
//!
//! ```text
//! or          := and (("|" | "||" | "or") and)*
//! and         := equality (("&" | "&&" | "and") equality)*
//! equality    := comparison (("==" | "!=") comparison)*
//! comparison  := additive (("<" | "<=" | ">" | ">=") additive
//!                         | ("%in%" | "in") set)*
//! additive    := multiplicative (("+" | "-") multiplicative)*
//! multiplicative := power (("*" | "/" | "%" | "%%") power)*
//! power       := unary (("^" | "**") power)?
//! unary       := ("!" | "not" | "-") unary | primary
//! primary     := number | string | TRUE | FALSE | NA | "(" or ")"
//!              | name "(" args ")" | name | `quoted name`
//! ```
//!
//! Aggregate calls accept the named arguments `na_rm = TRUE|FALSE` and
//! `default = <literal>`.

use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use crate::column::ColumnType;
use crate::core::DataValue;
use crate::error::{Error, Result};
use crate::expr::{AggExpr, AggFunc, BinaryOp, Expr, ScalarFunc, UnaryOp, WindowFunc};
use crate::na::MissingPolicy;

/// Lexical tokens
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Integer(i64),
    Float(f64),
    String(String),
    Identifier(String),
    /// Backtick-quoted name; always a column reference
    QuotedIdentifier(String),
    Boolean(bool),
    Na,

    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Power,

    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    And,
    Or,
    Not,
    In,

    Assign,
    LeftParen,
    RightParen,
    Comma,

    Eof,
}

/// Tokenizer over an expression string
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Tokenizes the whole input; each token carries its byte offset
    pub fn tokenize(mut self) -> Result<Vec<(Token, usize)>> {
        let mut tokens = Vec::new();
        loop {
            let (token, position) = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push((token, position));
            if done {
                return Ok(tokens);
            }
        }
    }

    fn position(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(i, _)| i)
    }

    fn next_is(&mut self, expected: char) -> bool {
        if self.chars.peek().is_some_and(|&(_, c)| c == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    pub fn next_token(&mut self) -> Result<(Token, usize)> {
        self.skip_whitespace();
        let start = self.position();

        let Some(&(_, ch)) = self.chars.peek() else {
            return Ok((Token::Eof, start));
        };

        let token = match ch {
            '+' => {
                self.chars.next();
                Token::Plus
            }
            '-' => {
                self.chars.next();
                Token::Minus
            }
            '*' => {
                self.chars.next();
                if self.next_is('*') {
                    Token::Power
                } else {
                    Token::Multiply
                }
            }
            '/' => {
                self.chars.next();
                Token::Divide
            }
            '^' => {
                self.chars.next();
                Token::Power
            }
            '%' => {
                self.chars.next();
                if self.input[start..].starts_with("%in%") {
                    for _ in 0..3 {
                        self.chars.next();
                    }
                    Token::In
                } else {
                    self.next_is('%');
                    Token::Modulo
                }
            }
            '(' => {
                self.chars.next();
                Token::LeftParen
            }
            ')' => {
                self.chars.next();
                Token::RightParen
            }
            ',' => {
                self.chars.next();
                Token::Comma
            }
            '=' => {
                self.chars.next();
                if self.next_is('=') {
                    Token::Equal
                } else {
                    Token::Assign
                }
            }
            '!' => {
                self.chars.next();
                if self.next_is('=') {
                    Token::NotEqual
                } else {
                    Token::Not
                }
            }
            '<' => {
                self.chars.next();
                if self.next_is('=') {
                    Token::LessThanOrEqual
                } else if self.next_is('>') {
                    Token::NotEqual
                } else {
                    Token::LessThan
                }
            }
            '>' => {
                self.chars.next();
                if self.next_is('=') {
                    Token::GreaterThanOrEqual
                } else {
                    Token::GreaterThan
                }
            }
            '&' => {
                self.chars.next();
                self.next_is('&');
                Token::And
            }
            '|' => {
                self.chars.next();
                self.next_is('|');
                Token::Or
            }
            '\'' | '"' => self.read_string(start)?,
            '`' => self.read_quoted_identifier(start)?,
            '0'..='9' => self.read_number(start)?,
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            other => {
                return Err(Error::parse(start, format!("unexpected character `{}`", other)));
            }
        };

        Ok((token, start))
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|&(_, c)| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn read_string(&mut self, start: usize) -> Result<Token> {
        let Some((_, quote)) = self.chars.next() else {
            return Err(Error::parse(start, "expected a string literal"));
        };
        let mut value = String::new();

        while let Some((_, ch)) = self.chars.next() {
            if ch == quote {
                return Ok(Token::String(value));
            } else if ch == '\\' {
                match self.chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, escaped @ ('\\' | '\'' | '"'))) => value.push(escaped),
                    Some((_, other)) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => break,
                }
            } else {
                value.push(ch);
            }
        }

        Err(Error::parse(start, "unterminated string literal"))
    }

    fn read_quoted_identifier(&mut self, start: usize) -> Result<Token> {
        self.chars.next();
        let mut name = String::new();
        for (_, ch) in self.chars.by_ref() {
            if ch == '`' {
                return Ok(Token::QuotedIdentifier(name));
            }
            name.push(ch);
        }
        Err(Error::parse(start, "unterminated backtick-quoted name"))
    }

    fn read_number(&mut self, start: usize) -> Result<Token> {
        let mut number = String::new();
        let mut is_float = false;

        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_ascii_digit() {
                number.push(ch);
            } else if ch == '.' && !is_float {
                is_float = true;
                number.push(ch);
            } else if (ch == 'e' || ch == 'E') && !number.contains(['e', 'E']) {
                is_float = true;
                number.push(ch);
                self.chars.next();
                if let Some(&(_, sign @ ('+' | '-'))) = self.chars.peek() {
                    number.push(sign);
                } else {
                    continue;
                }
            } else {
                break;
            }
            self.chars.next();
        }

        // R integer suffix, `10L`
        if !is_float && self.next_is('L') {
            return number
                .parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| Error::parse(start, format!("invalid integer `{}`", number)));
        }

        if !is_float {
            if let Ok(value) = number.parse::<i64>() {
                return Ok(Token::Integer(value));
            }
        }
        number
            .parse::<f64>()
            .map(Token::Float)
            .map_err(|_| Error::parse(start, format!("invalid number `{}`", number)))
    }

    fn read_identifier(&mut self) -> Token {
        let mut identifier = String::new();

        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '.' {
                identifier.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }

        match identifier.as_str() {
            "TRUE" | "true" | "True" => Token::Boolean(true),
            "FALSE" | "false" | "False" => Token::Boolean(false),
            "NA" | "null" => Token::Na,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "in" => Token::In,
            _ => Token::Identifier(identifier),
        }
    }
}

enum Argument {
    Positional(Expr),
    Named(String, Expr, usize),
}

/// Recursive-descent parser producing an [`Expr`]
pub struct Parser {
    tokens: Vec<(Token, usize)>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<(Token, usize)>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parses a complete expression; trailing input is an error
    pub fn parse(&mut self) -> Result<Expr> {
        let expr = self.parse_or_expression()?;
        match self.current_token() {
            Token::Eof => Ok(expr),
            Token::Assign => Err(Error::parse(
                self.offset(),
                "unexpected `=`; use `==` for comparison",
            )),
            other => Err(Error::parse(
                self.offset(),
                format!("unexpected trailing token {:?}", other),
            )),
        }
    }

    fn parse_or_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_and_expression()?;

        while self.match_token(&Token::Or) {
            let right = self.parse_and_expression()?;
            left = binary(left, BinaryOp::Or, right);
        }

        Ok(left)
    }

    fn parse_and_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_equality_expression()?;

        while self.match_token(&Token::And) {
            let right = self.parse_equality_expression()?;
            left = binary(left, BinaryOp::And, right);
        }

        Ok(left)
    }

    fn parse_equality_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_comparison_expression()?;

        while let Some(op) = self.match_equality_operator() {
            let right = self.parse_comparison_expression()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_comparison_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive_expression()?;

        loop {
            if let Some(op) = self.match_comparison_operator() {
                let right = self.parse_additive_expression()?;
                left = binary(left, op, right);
            } else if self.match_token(&Token::In) {
                let set = self.parse_literal_set()?;
                left = Expr::IsIn {
                    expr: Box::new(left),
                    set,
                };
            } else {
                return Ok(left);
            }
        }
    }

    /// `c(a, b, ...)` or `(a, b, ...)` on the right of `%in%`
    fn parse_literal_set(&mut self) -> Result<Vec<DataValue>> {
        if matches!(self.current_token(), Token::Identifier(name) if name == "c") {
            self.advance();
        }
        self.expect(&Token::LeftParen, "expected `(` to start the value list")?;

        let mut set = Vec::new();
        if !self.check_token(&Token::RightParen) {
            loop {
                let position = self.offset();
                let expr = self.parse_unary_expression()?;
                let value = literal_value(&expr)
                    .ok_or_else(|| Error::parse(position, "value lists may only hold literals"))?;
                set.push(value);
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }

        self.expect(&Token::RightParen, "expected `)` to close the value list")?;
        Ok(set)
    }

    fn parse_additive_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative_expression()?;

        while let Some(op) = self.match_additive_operator() {
            let right = self.parse_multiplicative_expression()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary_expression()?;

        while let Some(op) = self.match_multiplicative_operator() {
            let right = self.parse_unary_expression()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    /// Prefix `!` and `-` bind looser than `^`, so `-2^2` is `-(2^2)`
    fn parse_unary_expression(&mut self) -> Result<Expr> {
        if self.match_token(&Token::Not) {
            let operand = self.parse_unary_expression()?;
            Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            })
        } else if self.match_token(&Token::Minus) {
            let operand = self.parse_unary_expression()?;
            // Fold negative literals so they stay literals
            Ok(match operand {
                Expr::Literal(DataValue::Int64(v)) => Expr::Literal(DataValue::Int64(-v)),
                Expr::Literal(DataValue::Float64(v)) => Expr::Literal(DataValue::Float64(-v)),
                operand => Expr::Unary {
                    op: UnaryOp::Negate,
                    operand: Box::new(operand),
                },
            })
        } else {
            self.parse_power_expression()
        }
    }

    fn parse_power_expression(&mut self) -> Result<Expr> {
        let left = self.parse_primary_expression()?;

        if self.match_token(&Token::Power) {
            // Right associative; the exponent may carry its own sign
            let right = self.parse_unary_expression()?;
            return Ok(binary(left, BinaryOp::Power, right));
        }

        Ok(left)
    }

    fn parse_primary_expression(&mut self) -> Result<Expr> {
        let position = self.offset();
        let token = self.current_token().clone();

        match token {
            Token::Integer(value) => {
                self.advance();
                Ok(Expr::Literal(DataValue::Int64(value)))
            }
            Token::Float(value) => {
                self.advance();
                Ok(Expr::Literal(DataValue::Float64(value)))
            }
            Token::String(value) => {
                self.advance();
                Ok(Expr::Literal(DataValue::String(value)))
            }
            Token::Boolean(value) => {
                self.advance();
                Ok(Expr::Literal(DataValue::Boolean(value)))
            }
            Token::Na => {
                self.advance();
                Ok(Expr::Literal(DataValue::Na))
            }
            Token::QuotedIdentifier(name) => {
                self.advance();
                Ok(Expr::Column(name))
            }
            Token::Identifier(name) => {
                self.advance();
                if self.match_token(&Token::LeftParen) {
                    let args = self.parse_arguments()?;
                    build_call(&name, args, position)
                } else {
                    Ok(Expr::Column(name))
                }
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_or_expression()?;
                self.expect(&Token::RightParen, "expected `)` after expression")?;
                Ok(expr)
            }
            Token::Eof => Err(Error::parse(position, "unexpected end of input")),
            other => Err(Error::parse(position, format!("unexpected token {:?}", other))),
        }
    }

    /// Argument list after the opening parenthesis, through the closing one
    fn parse_arguments(&mut self) -> Result<Vec<Argument>> {
        let mut args = Vec::new();

        if !self.check_token(&Token::RightParen) {
            loop {
                let named = match (self.current_token(), self.peek_token()) {
                    (Token::Identifier(name), Token::Assign) => Some(name.clone()),
                    _ => None,
                };
                match named {
                    Some(name) => {
                        let position = self.offset();
                        self.advance();
                        self.advance();
                        args.push(Argument::Named(name, self.parse_or_expression()?, position));
                    }
                    None => args.push(Argument::Positional(self.parse_or_expression()?)),
                }

                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }

        self.expect(&Token::RightParen, "expected `)` after function arguments")?;
        Ok(args)
    }

    fn current_token(&self) -> &Token {
        self.tokens.get(self.position).map_or(&Token::Eof, |(t, _)| t)
    }

    fn peek_token(&self) -> &Token {
        self.tokens.get(self.position + 1).map_or(&Token::Eof, |(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map_or(0, |&(_, p)| p)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn match_token(&mut self, expected: &Token) -> bool {
        if self.check_token(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check_token(&self, expected: &Token) -> bool {
        std::mem::discriminant(self.current_token()) == std::mem::discriminant(expected)
    }

    fn expect(&mut self, expected: &Token, message: &str) -> Result<()> {
        if self.match_token(expected) {
            Ok(())
        } else {
            Err(Error::parse(self.offset(), message))
        }
    }

    fn match_operator(&mut self, table: &[(Token, BinaryOp)]) -> Option<BinaryOp> {
        let op = table
            .iter()
            .find(|(token, _)| token == self.current_token())
            .map(|&(_, op)| op)?;
        self.advance();
        Some(op)
    }

    fn match_equality_operator(&mut self) -> Option<BinaryOp> {
        self.match_operator(&[
            (Token::Equal, BinaryOp::Equal),
            (Token::NotEqual, BinaryOp::NotEqual),
        ])
    }

    fn match_comparison_operator(&mut self) -> Option<BinaryOp> {
        self.match_operator(&[
            (Token::LessThan, BinaryOp::LessThan),
            (Token::LessThanOrEqual, BinaryOp::LessThanOrEqual),
            (Token::GreaterThan, BinaryOp::GreaterThan),
            (Token::GreaterThanOrEqual, BinaryOp::GreaterThanOrEqual),
        ])
    }

    fn match_additive_operator(&mut self) -> Option<BinaryOp> {
        self.match_operator(&[
            (Token::Plus, BinaryOp::Add),
            (Token::Minus, BinaryOp::Subtract),
        ])
    }

    fn match_multiplicative_operator(&mut self) -> Option<BinaryOp> {
        self.match_operator(&[
            (Token::Multiply, BinaryOp::Multiply),
            (Token::Divide, BinaryOp::Divide),
            (Token::Modulo, BinaryOp::Modulo),
        ])
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn literal_value(expr: &Expr) -> Option<DataValue> {
    match expr {
        Expr::Literal(value) => Some(value.clone()),
        _ => None,
    }
}

/// Splits call arguments, rejecting named ones the function does not take
fn positional(name: &str, args: Vec<Argument>) -> Result<Vec<Expr>> {
    args.into_iter()
        .map(|arg| match arg {
            Argument::Positional(expr) => Ok(expr),
            Argument::Named(arg_name, _, at) => Err(Error::parse(
                at,
                format!("{}() does not take a named argument `{}`", name, arg_name),
            )),
        })
        .collect()
}

fn arity(name: &str, args: &[Expr], expected: usize, position: usize) -> Result<()> {
    if args.len() != expected {
        return Err(Error::parse(
            position,
            format!("{}() takes {} argument(s), found {}", name, expected, args.len()),
        ));
    }
    Ok(())
}

fn build_call(name: &str, args: Vec<Argument>, position: usize) -> Result<Expr> {
    if let Some(func) = AggFunc::from_name(name) {
        return build_aggregate(func, name, args, position);
    }

    let mut args = positional(name, args)?;

    let cast = |to: ColumnType, mut args: Vec<Expr>| -> Result<Expr> {
        arity(name, &args, 1, position)?;
        Ok(Expr::Cast {
            expr: Box::new(args.remove(0)),
            to,
        })
    };

    let window = |func: WindowFunc, mut args: Vec<Expr>| -> Result<Expr> {
        arity(name, &args, 1, position)?;
        Ok(Expr::Window {
            func,
            arg: Some(Box::new(args.remove(0))),
        })
    };

    match name {
        "row_number" => {
            arity(name, &args, 0, position)?;
            Ok(Expr::Window {
                func: WindowFunc::RowNumber,
                arg: None,
            })
        }
        "lag" | "lead" => {
            let k = match args.len() {
                1 => 1,
                2 => match args.pop() {
                    Some(Expr::Literal(DataValue::Int64(k))) if k >= 0 => k as usize,
                    _ => {
                        return Err(Error::parse(
                            position,
                            format!("{}() offset must be a non-negative integer", name),
                        ))
                    }
                },
                n => {
                    return Err(Error::parse(
                        position,
                        format!("{}() takes 1 or 2 arguments, found {}", name, n),
                    ))
                }
            };
            let func = if name == "lag" {
                WindowFunc::Lag(k)
            } else {
                WindowFunc::Lead(k)
            };
            window(func, args)
        }
        "cumsum" => window(WindowFunc::CumSum, args),
        "min_rank" | "rank" => window(WindowFunc::MinRank, args),
        "is_na" | "is.na" => {
            arity(name, &args, 1, position)?;
            Ok(Expr::IsNa(Box::new(args.remove(0))))
        }
        "between" => {
            arity(name, &args, 3, position)?;
            let high = args.remove(2);
            let low = args.remove(1);
            Ok(Expr::Between {
                expr: Box::new(args.remove(0)),
                low: Box::new(low),
                high: Box::new(high),
            })
        }
        "if_else" | "ifelse" => {
            arity(name, &args, 3, position)?;
            let otherwise = args.remove(2);
            let then = args.remove(1);
            Ok(Expr::IfElse {
                condition: Box::new(args.remove(0)),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            })
        }
        "coalesce" => {
            if args.is_empty() {
                return Err(Error::parse(position, "coalesce() needs at least one argument"));
            }
            Ok(Expr::Coalesce(args))
        }
        "as_integer" | "as.integer" => cast(ColumnType::Int64, args),
        "as_numeric" | "as.numeric" | "as_double" | "as.double" => cast(ColumnType::Float64, args),
        "as_character" | "as.character" => cast(ColumnType::String, args),
        "as_logical" | "as.logical" => cast(ColumnType::Boolean, args),
        "c" => Err(Error::parse(
            position,
            "c() is only valid on the right-hand side of %in%",
        )),
        _ => match ScalarFunc::from_name(name) {
            Some(func) => Ok(Expr::Function { func, args }),
            None => Err(Error::parse(position, format!("unknown function `{}`", name))),
        },
    }
}

fn build_aggregate(func: AggFunc, name: &str, args: Vec<Argument>, position: usize) -> Result<Expr> {
    let mut inputs = Vec::new();
    let mut missing = None;
    let mut default = None;

    for arg in args {
        match arg {
            Argument::Positional(expr) => inputs.push(expr),
            Argument::Named(arg_name, expr, at) => match arg_name.as_str() {
                "na_rm" | "na.rm" => match expr {
                    Expr::Literal(DataValue::Boolean(flag)) => {
                        missing = Some(MissingPolicy::from_na_rm(flag))
                    }
                    _ => return Err(Error::parse(at, "na_rm must be TRUE or FALSE")),
                },
                "default" => match literal_value(&expr) {
                    Some(value) => default = Some(value),
                    None => return Err(Error::parse(at, "default must be a literal value")),
                },
                other => {
                    return Err(Error::parse(
                        at,
                        format!("{}() does not take a named argument `{}`", name, other),
                    ))
                }
            },
        }
    }

    let expected = if func == AggFunc::N { 0 } else { 1 };
    arity(name, &inputs, expected, position)?;

    Ok(Expr::from(AggExpr {
        func,
        input: inputs.pop(),
        missing,
        default,
    }))
}

/// Parses an expression from text
pub fn parse_expr(text: &str) -> Result<Expr> {
    let tokens = Lexer::new(text).tokenize()?;
    Parser::new(tokens).parse()
}

impl Expr {
    /// Parses an expression from text, e.g. `n / sum(n, na_rm = TRUE)`
    pub fn parse(text: &str) -> Result<Expr> {
        parse_expr(text)
    }
}

impl FromStr for Expr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_expr(s)
    }
}
