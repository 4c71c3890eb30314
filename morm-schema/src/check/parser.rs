//! Recursive-descent parser translating CHECK expressions to SQL.

use super::lexer::{Lexer, Token};
use super::CheckError;

/// Parser over a token stream, emitting SQL text directly.
///
/// Precedence, low to high: `OR`, `AND`, `NOT`, comparison, additive,
/// multiplicative, primary. Every level is left-associative and every
/// binary node is parenthesized in the output, so the emitted SQL is
/// unambiguous regardless of the reader's precedence rules.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Translate a CHECK expression source into a SQL expression.
    pub fn translate(source: &str) -> Result<String, CheckError> {
        let tokens = Lexer::new(source).tokenize()?;
        if tokens.is_empty() {
            return Err(CheckError::new("empty expression"));
        }
        let mut parser = Self { tokens, pos: 0 };
        let sql = parser.parse_or()?;
        if parser.pos < parser.tokens.len() {
            return Err(CheckError::new("trailing input after expression"));
        }
        Ok(sql)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, context: &str) -> Result<(), CheckError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(CheckError::new(format!("expected {context}")))
        }
    }

    fn parse_or(&mut self) -> Result<String, CheckError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.parse_and()?;
            lhs = format!("({lhs} OR {rhs})");
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<String, CheckError> {
        let mut lhs = self.parse_not()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.parse_not()?;
            lhs = format!("({lhs} AND {rhs})");
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<String, CheckError> {
        if self.eat(&Token::Bang) {
            let inner = self.parse_not()?;
            return Ok(format!("NOT ({inner})"));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<String, CheckError> {
        let mut lhs = self.parse_additive()?;
        while let Some(op) = self.peek().and_then(comparison_op) {
            self.pos += 1;
            let rhs = self.parse_additive()?;
            lhs = format!("({lhs} {op} {rhs})");
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<String, CheckError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => "+",
                Some(Token::Minus) => "-",
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = format!("({lhs} {op} {rhs})");
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<String, CheckError> {
        let mut lhs = self.parse_primary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => "*",
                Some(Token::Slash) => "/",
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_primary()?;
            lhs = format!("({lhs} {op} {rhs})");
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<String, CheckError> {
        match self.advance() {
            Some(Token::Number(lexeme)) => Ok(lexeme),
            Some(Token::Minus) => match self.advance() {
                Some(Token::Number(lexeme)) => Ok(format!("-{lexeme}")),
                _ => Err(CheckError::new("expected number after `-`")),
            },
            Some(Token::Str(value)) => Ok(quote_string(&value)),
            Some(Token::True) => Ok("TRUE".to_string()),
            Some(Token::False) => Ok("FALSE".to_string()),
            Some(Token::Null) => Ok("NULL".to_string()),
            Some(Token::Ident(name)) => {
                if self.eat(&Token::LParen) {
                    let args = self.parse_args()?;
                    Ok(format!("{name}({})", args.join(", ")))
                } else {
                    Ok(name)
                }
            }
            Some(Token::LBracket) => {
                let elements = self.parse_elements()?;
                Ok(format!("ARRAY[{}]", elements.join(", ")))
            }
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen, "closing `)`")?;
                Ok(inner)
            }
            Some(token) => Err(CheckError::new(format!("unexpected token {token:?}"))),
            None => Err(CheckError::new("unexpected end of expression")),
        }
    }

    /// Function-call arguments up to the closing paren.
    fn parse_args(&mut self) -> Result<Vec<String>, CheckError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(Token::RParen, "closing `)` after arguments")?;
            return Ok(args);
        }
    }

    /// Array-literal elements up to the closing bracket.
    fn parse_elements(&mut self) -> Result<Vec<String>, CheckError> {
        let mut elements = Vec::new();
        if self.eat(&Token::RBracket) {
            return Ok(elements);
        }
        loop {
            elements.push(self.parse_or()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(Token::RBracket, "closing `]` after array elements")?;
            return Ok(elements);
        }
    }
}

/// Map a comparison token to its SQL operator.
fn comparison_op(token: &Token) -> Option<&'static str> {
    let op = match token {
        Token::Gt => ">",
        Token::GtEq => ">=",
        Token::Lt => "<",
        Token::LtEq => "<=",
        Token::Eq => "=",
        Token::NotEq => "<>",
        _ => return None,
    };
    Some(op)
}

/// Single-quote a string literal, doubling embedded quotes.
fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate(source: &str) -> String {
        Parser::translate(source).unwrap()
    }

    #[test]
    fn test_comparison() {
        assert_eq!(translate("age >= 18"), "(age >= 18)");
        assert_eq!(translate("role === 'ADMIN'"), "(role = 'ADMIN')");
        assert_eq!(translate("n !== 0"), "(n <> 0)");
    }

    #[test]
    fn test_logical_precedence() {
        assert_eq!(
            translate("age >= 18 && (role === 'ADMIN' || role === 'STUDENT')"),
            "((age >= 18) AND ((role = 'ADMIN') OR (role = 'STUDENT')))"
        );
    }

    #[test]
    fn test_and_keyword_synonym() {
        assert_eq!(translate("a > 1 AND b < 2"), translate("a > 1 && b < 2"));
        assert_eq!(translate("a > 1 or b < 2"), translate("a > 1 || b < 2"));
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(translate("a + b * c > 0"), "((a + (b * c)) > 0)");
        assert_eq!(translate("a - b - c > 0"), "(((a - b) - c) > 0)");
    }

    #[test]
    fn test_not() {
        assert_eq!(translate("!deleted"), "NOT (deleted)");
        assert_eq!(translate("!(a > 1)"), "NOT ((a > 1))");
    }

    #[test]
    fn test_literals() {
        assert_eq!(translate("active == true"), "(active = TRUE)");
        assert_eq!(translate("flag == false"), "(flag = FALSE)");
        assert_eq!(translate("parent == null"), "(parent = NULL)");
        assert_eq!(translate("delta > -5"), "(delta > -5)");
    }

    #[test]
    fn test_string_quote_doubling() {
        assert_eq!(translate(r#"name == 'it\'s'"#), "(name = 'it''s')");
    }

    #[test]
    fn test_array_literal() {
        assert_eq!(
            translate("tags == ['a', 'b']"),
            "(tags = ARRAY['a', 'b'])"
        );
    }

    #[test]
    fn test_function_call_passthrough() {
        assert_eq!(
            translate("length(name) > 3"),
            "(length(name) > 3)"
        );
        assert_eq!(translate("now() > created_at"), "(now() > created_at)");
    }

    #[test]
    fn test_trailing_input() {
        assert!(Parser::translate("a > 1 b").is_err());
        assert!(Parser::translate("a > 1)").is_err());
    }

    #[test]
    fn test_unbalanced_parens() {
        assert!(Parser::translate("(a > 1").is_err());
        assert!(Parser::translate("[1, 2").is_err());
    }

    #[test]
    fn test_empty_expression() {
        assert!(Parser::translate("").is_err());
        assert!(Parser::translate("   ").is_err());
    }

    #[test]
    fn test_reparse_is_stable() {
        // The emitted SQL is itself parseable (modulo keywords), and a
        // second translation of the re-surfaced comparison form does not
        // change under normalization.
        let first = translate("a >= 1 AND b == 2");
        let resurfaced = first.replace('=', "==").replace(">==", ">=");
        let second = translate(&resurfaced);
        assert_eq!(
            super::super::normalize(&first),
            super::super::normalize(&second)
        );
    }
}
