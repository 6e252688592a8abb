//! Math tool implementation
//!
//! Small arithmetic expression evaluator: + - * / % ^, unary minus,
//! parentheses, decimal numbers. Recursive descent, no dependencies,
//! and no access to anything beyond the expression itself: the safe
//! stand-in for "code execution" style tools.

use crate::errors::{Result, ToolError};
use serde_json::{json, Value};

/// Evaluate an arithmetic expression
pub fn calculate(expression: &str) -> Result<Value> {
    let mut parser = Parser::new(expression);
    let value = parser.parse_expression()?;
    parser.expect_end()?;

    if !value.is_finite() {
        return Err(ToolError::ValidationError(format!(
            "Expression result is not finite: '{}'",
            expression
        )));
    }

    Ok(json!(value))
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    // expression := term (('+' | '-') term)*
    fn parse_expression(&mut self) -> Result<f64> {
        let mut value = self.parse_term()?;

        loop {
            match self.peek() {
                Some('+') => {
                    self.pos += 1;
                    value += self.parse_term()?;
                }
                Some('-') => {
                    self.pos += 1;
                    value -= self.parse_term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    // term := power (('*' | '/' | '%') power)*
    fn parse_term(&mut self) -> Result<f64> {
        let mut value = self.parse_power()?;

        loop {
            match self.peek() {
                Some('*') => {
                    self.pos += 1;
                    value *= self.parse_power()?;
                }
                Some('/') => {
                    self.pos += 1;
                    let divisor = self.parse_power()?;
                    if divisor == 0.0 {
                        return Err(ToolError::ValidationError(format!(
                            "division by zero in '{}'",
                            self.source
                        )));
                    }
                    value /= divisor;
                }
                Some('%') => {
                    self.pos += 1;
                    let divisor = self.parse_power()?;
                    if divisor == 0.0 {
                        return Err(ToolError::ValidationError(format!(
                            "division by zero in '{}'",
                            self.source
                        )));
                    }
                    value %= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    // power := unary ('^' power)?   (right-associative)
    fn parse_power(&mut self) -> Result<f64> {
        let base = self.parse_unary()?;

        if self.peek() == Some('^') {
            self.pos += 1;
            let exponent = self.parse_power()?;
            return Ok(base.powf(exponent));
        }

        Ok(base)
    }

    // unary := '-' unary | atom
    fn parse_unary(&mut self) -> Result<f64> {
        if self.peek() == Some('-') {
            self.pos += 1;
            return Ok(-self.parse_unary()?);
        }
        self.parse_atom()
    }

    // atom := number | '(' expression ')'
    fn parse_atom(&mut self) -> Result<f64> {
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let value = self.parse_expression()?;
                if self.peek() != Some(')') {
                    return Err(self.unexpected("expected ')'"));
                }
                self.pos += 1;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.parse_number(),
            _ => Err(self.unexpected("expected a number or '('")),
        }
    }

    fn parse_number(&mut self) -> Result<f64> {
        let start = self.pos;
        while matches!(self.chars.get(self.pos), Some(c) if c.is_ascii_digit() || *c == '.') {
            self.pos += 1;
        }

        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map_err(|_| self.unexpected("malformed number"))
    }

    /// Next non-whitespace character, advancing past whitespace
    fn peek(&mut self) -> Option<char> {
        while matches!(self.chars.get(self.pos), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        self.chars.get(self.pos).copied()
    }

    fn expect_end(&mut self) -> Result<()> {
        if self.peek().is_some() {
            return Err(self.unexpected("trailing input"));
        }
        Ok(())
    }

    fn unexpected(&self, detail: &str) -> ToolError {
        ToolError::ValidationError(format!(
            "invalid expression '{}' at position {}: {}",
            self.source, self.pos, detail
        ))
    }
}
