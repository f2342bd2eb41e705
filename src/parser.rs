use crate::ast::{BinaryOp, DeclarationKind, Expr, Program, Stmt, UnaryOp};
use crate::error::{CypeError, Span};
use crate::lexer::{Literal, Token, TokenKind};
use crate::value::Value;

/// Recursive-descent parser. Fails fast on the first structural error.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    end: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let end = tokens.last().map(|token| token.span.end).unwrap_or(0);
        Self {
            tokens,
            current: 0,
            end,
        }
    }

    pub fn parse(&mut self) -> Result<Program, CypeError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.statement()?);
        }

        Ok(Program { statements })
    }

    fn statement(&mut self) -> Result<Stmt, CypeError> {
        self.skip_to_statement();

        let token = match self.peek() {
            Some(token) => token.clone(),
            None => {
                return Err(CypeError::parse_error_with_help(
                    self.end_span(),
                    "Unexpected end of input".to_string(),
                    "Stray tokens after the last statement were skipped; the program ended before another statement began.".to_string(),
                ))
            }
        };

        match (token.kind, token.text()) {
            (TokenKind::Keyword, Some("let")) => self.declaration(DeclarationKind::Let),
            (TokenKind::Keyword, Some("var")) => self.declaration(DeclarationKind::Var),
            (TokenKind::Keyword, Some("const")) => self.declaration(DeclarationKind::Const),
            (TokenKind::Keyword, Some("if")) => self.if_statement(),
            (TokenKind::Keyword, Some("while")) => self.while_statement(),
            (TokenKind::Keyword, Some("for")) => self.for_statement(),
            (TokenKind::Keyword, Some("do")) => self.do_while_statement(),
            (TokenKind::Identifier, _) => self.identifier_statement(),
            _ => Err(CypeError::parse_error(
                token.span.clone(),
                format!("Unexpected token: {}", token.value),
            )),
        }
    }

    /// Tolerance for lexer noise: tokens that cannot begin a statement are
    /// dropped. Braces are kept so blocks still close where they should.
    fn skip_to_statement(&mut self) {
        while let Some(token) = self.peek() {
            let starts_statement = matches!(token.kind, TokenKind::Keyword | TokenKind::Identifier)
                || token.is(TokenKind::Operator, "{")
                || token.is(TokenKind::Operator, "}");
            if starts_statement {
                break;
            }
            self.current += 1;
        }
    }

    fn declaration(&mut self, kind: DeclarationKind) -> Result<Stmt, CypeError> {
        let keyword = self.advance_token();
        let keyword_text = keyword.value.to_string();

        let name = self.consume_identifier(&format!("Expected variable name after '{}'", keyword_text))?;

        if self.check_operator(":") {
            self.advance();
            let is_type = matches!(
                self.peek().map(|token| token.kind),
                Some(TokenKind::Identifier) | Some(TokenKind::Keyword)
            );
            if !is_type {
                return Err(CypeError::parse_error_with_help(
                    self.error_span(),
                    "Expected type after ':'".to_string(),
                    "Type annotations name a type, for example 'let x: i32 = 5;'.".to_string(),
                ));
            }
            // Annotations are accepted and ignored.
            self.advance();
        }

        self.consume_assign("Expected '=' in variable declaration")?;
        let value = self.expression()?;
        let end = self.consume_with_help(
            ";",
            "Expected ';' after variable declaration",
            "Declarations end with a semicolon: let x = 5;".to_string(),
        )?;

        Ok(Stmt::Declaration {
            kind,
            name,
            value,
            span: keyword.span.to(&end),
        })
    }

    fn if_statement(&mut self) -> Result<Stmt, CypeError> {
        let start = self.advance_token().span;

        self.consume_with_help(
            "(",
            "Expected '(' after 'if'",
            "If statements require parentheses around the condition: if (condition) { ... }".to_string(),
        )?;
        let condition = self.expression()?;
        self.consume_with_help(
            ")",
            "Expected ')' after if condition",
            "If conditions must be enclosed in parentheses: if (condition) { ... }".to_string(),
        )?;

        let (then_branch, mut end) =
            self.block("Expected '{' after if condition", "Expected '}' to close if block")?;

        let mut else_branch = Vec::new();
        if self.check_keyword("else") {
            self.advance();
            if self.check_keyword("if") {
                let nested = self.if_statement()?;
                end = nested.span().clone();
                else_branch.push(nested);
            } else {
                let (statements, else_end) =
                    self.block("Expected '{' after 'else'", "Expected '}' to close else block")?;
                else_branch = statements;
                end = else_end;
            }
        }

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            span: start.to(&end),
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, CypeError> {
        let start = self.advance_token().span;

        self.consume("(", "Expected '(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(")", "Expected ')' after while condition")?;

        let (body, end) =
            self.block("Expected '{' after while condition", "Expected '}' to close while block")?;

        Ok(Stmt::While {
            condition,
            body,
            span: start.to(&end),
        })
    }

    fn for_statement(&mut self) -> Result<Stmt, CypeError> {
        let start = self.advance_token().span;

        self.consume("(", "Expected '(' after 'for'")?;

        // The initializer is a full statement and consumes its own ';'.
        let init = if self.check_operator(";") {
            self.advance();
            None
        } else {
            Some(Box::new(self.statement()?))
        };

        let condition = if self.check_operator(";") {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(";", "Expected ';' after for condition")?;

        let increment = if self.check_operator(")") {
            None
        } else {
            Some(Box::new(self.for_increment()?))
        };
        self.consume(")", "Expected ')' after for header")?;

        let (body, end) = self.block("Expected '{' after for header", "Expected '}' to close for block")?;

        Ok(Stmt::For {
            init,
            condition,
            increment,
            body,
            span: start.to(&end),
        })
    }

    fn for_increment(&mut self) -> Result<Stmt, CypeError> {
        let start = self.error_span();
        let name = self.consume_identifier("Expected ')' after for header").map_err(|error| {
            CypeError::parse_error_with_help(
                error.span,
                error.message,
                "The increment clause of a for loop must be an assignment such as 'i = i + 1'.".to_string(),
            )
        })?;
        self.consume_assign("Expected '=' in for increment")?;
        let value = self.expression()?;
        let span = start.to(value.span());

        Ok(Stmt::Assignment { name, value, span })
    }

    fn do_while_statement(&mut self) -> Result<Stmt, CypeError> {
        let start = self.advance_token().span;

        let (body, _) = self.block("Expected '{' after 'do'", "Expected '}' to close do block")?;

        if !self.check_keyword("while") {
            return Err(CypeError::parse_error_with_help(
                self.error_span(),
                "Expected 'while' after do block".to_string(),
                "A do loop is written: do { ... } while (condition);".to_string(),
            ));
        }
        self.advance();

        self.consume("(", "Expected '(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(")", "Expected ')' after while condition")?;
        let end = self.consume(";", "Expected ';' after do-while")?;

        Ok(Stmt::DoWhile {
            condition,
            body,
            span: start.to(&end),
        })
    }

    fn identifier_statement(&mut self) -> Result<Stmt, CypeError> {
        let token = self.advance_token();
        let name = token.value.to_string();

        if self.check_operator("(") {
            self.advance();
            let mut arguments = Vec::new();

            if !self.check_operator(")") {
                loop {
                    arguments.push(self.expression()?);
                    if !self.check_operator(",") {
                        break;
                    }
                    self.advance();
                }
            }

            self.consume_with_help(
                ")",
                "Expected ')' after function arguments",
                "Every opening parenthesis '(' must have a matching closing parenthesis ')'.".to_string(),
            )?;
            let end = self.consume(";", "Expected ';' after function call")?;

            return Ok(Stmt::Call {
                name,
                arguments,
                span: token.span.to(&end),
            });
        }

        if self.check_assign() {
            self.advance();
            let value = self.expression()?;
            let end = self.consume(";", "Expected ';' after assignment")?;

            return Ok(Stmt::Assignment {
                name,
                value,
                span: token.span.to(&end),
            });
        }

        Err(CypeError::parse_error_with_help(
            token.span,
            format!("Unexpected identifier: {}", name),
            "A statement starting with a name must be a call like 'name(...);' or an assignment like 'name = value;'.".to_string(),
        ))
    }

    /// Parses `{ statements }` and returns the statements with the span of
    /// the closing brace.
    fn block(&mut self, opening: &str, closing: &str) -> Result<(Vec<Stmt>, Span), CypeError> {
        self.consume_with_help(
            "{",
            opening,
            "Bodies of if, else, while, for and do are always written inside braces.".to_string(),
        )?;

        let mut statements = Vec::new();
        loop {
            self.skip_to_statement();
            if self.check_operator("}") || self.is_at_end() {
                break;
            }
            statements.push(self.statement()?);
        }

        let end = self.consume_with_help(
            "}",
            closing,
            "Block statements must be closed with '}' after the opening '{'.".to_string(),
        )?;
        Ok((statements, end))
    }

    fn expression(&mut self) -> Result<Expr, CypeError> {
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, CypeError> {
        let mut expr = self.additive()?;

        while let Some((operator, symbol)) = self.match_operator(BinaryOp::comparison) {
            let right = self.operand_after(&symbol, Self::additive)?;
            expr = Self::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn additive(&mut self) -> Result<Expr, CypeError> {
        let mut expr = self.multiplicative()?;

        while let Some((operator, symbol)) = self.match_operator(BinaryOp::additive) {
            let right = self.operand_after(&symbol, Self::multiplicative)?;
            expr = Self::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn multiplicative(&mut self) -> Result<Expr, CypeError> {
        let mut expr = self.unary()?;

        while let Some((operator, symbol)) = self.match_operator(BinaryOp::multiplicative) {
            let right = self.operand_after(&symbol, Self::unary)?;
            expr = Self::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, CypeError> {
        let operator = if self.check_operator("-") {
            UnaryOp::Negate
        } else if self.check_operator("!") {
            UnaryOp::Not
        } else {
            return self.primary();
        };

        let start = self.advance_token().span;
        let operand = self.unary()?;
        let span = start.to(operand.span());

        Ok(Expr::Unary {
            operator,
            operand: Box::new(operand),
            span,
        })
    }

    fn primary(&mut self) -> Result<Expr, CypeError> {
        let token = match self.peek() {
            Some(token) => token.clone(),
            None => {
                return Err(CypeError::parse_error_with_help(
                    self.end_span(),
                    "Unexpected end of input, expected an expression".to_string(),
                    "Check for unmatched parentheses or incomplete statements.".to_string(),
                ))
            }
        };

        match (token.kind, &token.value) {
            (TokenKind::Number, Literal::Number(n)) => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::Number(*n),
                    span: token.span,
                })
            }
            (TokenKind::String, Literal::Text(s)) => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::Text(s.clone()),
                    span: token.span,
                })
            }
            (TokenKind::Boolean, Literal::Boolean(b)) => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::Bool(*b),
                    span: token.span,
                })
            }
            (TokenKind::Identifier, Literal::Text(name)) => {
                self.advance();
                Ok(Expr::Variable {
                    name: name.clone(),
                    span: token.span,
                })
            }
            (TokenKind::Operator, Literal::Text(symbol)) if symbol == "(" => {
                self.advance();
                let expr = self.expression()?;
                self.consume_with_help(
                    ")",
                    "Expected ')' after expression",
                    "Every opening parenthesis '(' must have a matching closing parenthesis ')'.".to_string(),
                )?;
                Ok(expr)
            }
            _ => Err(CypeError::parse_error_with_help(
                token.span,
                format!("Unexpected token in expression: {}", token.value),
                "Expected a literal value, variable, or parenthesized expression here.".to_string(),
            )),
        }
    }

    fn binary(left: Expr, operator: BinaryOp, right: Expr) -> Expr {
        let span = left.span().to(right.span());
        Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span,
        }
    }

    /// Parses the right operand of `symbol`, pointing at the operator when
    /// input ends right after it. Errors from a partly parsed operand are
    /// kept as they are.
    fn operand_after(
        &mut self,
        symbol: &str,
        operand: fn(&mut Self) -> Result<Expr, CypeError>,
    ) -> Result<Expr, CypeError> {
        let operator_span = self.previous_span();
        let before = self.current;
        operand(self).map_err(|error| {
            if self.current == before && self.is_at_end() {
                CypeError::parse_error_with_help(
                    operator_span,
                    format!("Expected expression after '{}'", symbol),
                    "Binary operators require expressions on both sides.".to_string(),
                )
            } else {
                error
            }
        })
    }

    fn match_operator(&mut self, lookup: fn(&str) -> Option<BinaryOp>) -> Option<(BinaryOp, String)> {
        let token = self.peek()?;
        if token.kind != TokenKind::Operator {
            return None;
        }
        let symbol = token.text()?.to_string();
        let operator = lookup(&symbol)?;
        self.advance();
        Some((operator, symbol))
    }

    fn check_operator(&self, symbol: &str) -> bool {
        self.peek()
            .map_or(false, |token| token.is(TokenKind::Operator, symbol))
    }

    fn check_keyword(&self, word: &str) -> bool {
        self.peek()
            .map_or(false, |token| token.is(TokenKind::Keyword, word))
    }

    fn check_assign(&self) -> bool {
        self.peek()
            .map_or(false, |token| token.kind == TokenKind::Assign)
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    /// Advance and return the consumed token. Only called after a successful
    /// check, so a token is present.
    fn advance_token(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        self.current += 1;
        token
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn previous_span(&self) -> Span {
        match self.current.checked_sub(1).and_then(|index| self.tokens.get(index)) {
            Some(token) => token.span.clone(),
            None => Span::single(0),
        }
    }

    fn end_span(&self) -> Span {
        Span::single(self.end)
    }

    /// Points at the offending token, or just past the last one at end of input.
    fn error_span(&self) -> Span {
        match self.peek() {
            Some(token) => token.span.clone(),
            None => self.end_span(),
        }
    }

    fn consume(&mut self, symbol: &str, message: &str) -> Result<Span, CypeError> {
        if self.check_operator(symbol) {
            Ok(self.advance_token().span)
        } else {
            Err(CypeError::parse_error(self.error_span(), message.to_string()))
        }
    }

    fn consume_with_help(&mut self, symbol: &str, message: &str, help: String) -> Result<Span, CypeError> {
        if self.check_operator(symbol) {
            Ok(self.advance_token().span)
        } else {
            Err(CypeError::parse_error_with_help(
                self.error_span(),
                message.to_string(),
                help,
            ))
        }
    }

    fn consume_assign(&mut self, message: &str) -> Result<Span, CypeError> {
        if self.check_assign() {
            Ok(self.advance_token().span)
        } else {
            Err(CypeError::parse_error(self.error_span(), message.to_string()))
        }
    }

    fn consume_identifier(&mut self, message: &str) -> Result<String, CypeError> {
        let is_identifier = self
            .peek()
            .map_or(false, |token| token.kind == TokenKind::Identifier);

        if is_identifier {
            Ok(self.advance_token().value.to_string())
        } else {
            Err(CypeError::parse_error(self.error_span(), message.to_string()))
        }
    }
}
