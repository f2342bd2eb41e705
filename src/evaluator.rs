use crate::ast::{BinaryOp, DeclarationKind, Expr, Program, Stmt, UnaryOp};
use crate::error::{CypeError, Span};
use crate::output::Output;
use crate::value::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    constant: bool,
}

/// The single flat namespace of one run. Blocks do not open new scopes.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Binding>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any earlier binding.
    pub fn define(&mut self, name: &str, value: Value, constant: bool) {
        self.values
            .insert(name.to_string(), Binding { value, constant });
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).map(|binding| &binding.value)
    }

    pub fn assign(&mut self, name: &str, value: Value, span: &Span) -> Result<(), CypeError> {
        match self.values.get_mut(name) {
            Some(binding) if binding.constant => Err(CypeError::runtime_error_with_help(
                span.clone(),
                format!("Cannot assign to constant '{}'", name),
                format!("'{}' was declared with 'const'. Declare it with 'let' to allow assignment.", name),
            )),
            Some(binding) => {
                binding.value = value;
                Ok(())
            }
            None => Err(CypeError::runtime_error_with_help(
                span.clone(),
                format!("Undefined variable: {}", name),
                format!("Declare it first: let {} = ...;", name),
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Walks a `Program` against a run-scoped environment and output buffer.
pub struct Evaluator {
    environment: Environment,
    output: Output,
    steps: u64,
    step_limit: Option<u64>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            environment: Environment::new(),
            output: Output::new(),
            steps: 0,
            step_limit: None,
        }
    }

    /// Abort with a runtime error once more than `limit` statements and loop
    /// iterations have run.
    pub fn with_step_limit(limit: u64) -> Self {
        Self {
            step_limit: Some(limit),
            ..Self::new()
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Run the program and return every output line, the in-progress line
    /// included when non-empty.
    pub fn evaluate(mut self, program: &Program) -> Result<Vec<String>, CypeError> {
        self.evaluate_program(program)?;
        Ok(self.output.finish())
    }

    pub fn evaluate_program(&mut self, program: &Program) -> Result<(), CypeError> {
        for statement in &program.statements {
            self.execute_statement(statement)?;
        }
        Ok(())
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> Result<(), CypeError> {
        self.tick(stmt.span())?;

        match stmt {
            Stmt::Declaration {
                kind, name, value, ..
            } => {
                let value = self.evaluate_expression(value)?;
                self.environment
                    .define(name, value, *kind == DeclarationKind::Const);
                Ok(())
            }
            Stmt::Assignment { name, value, span } => {
                let value = self.evaluate_expression(value)?;
                self.environment.assign(name, value, span)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate_expression(condition)?.is_truthy() {
                    self.execute_block(then_branch)
                } else {
                    self.execute_block(else_branch)
                }
            }
            Stmt::While {
                condition,
                body,
                span,
            } => {
                while self.evaluate_expression(condition)?.is_truthy() {
                    self.tick(span)?;
                    self.execute_block(body)?;
                }
                Ok(())
            }
            Stmt::For {
                init,
                condition,
                increment,
                body,
                span,
            } => {
                if let Some(init) = init {
                    self.execute_statement(init)?;
                }

                loop {
                    if let Some(cond) = condition {
                        if !self.evaluate_expression(cond)?.is_truthy() {
                            break;
                        }
                    }

                    self.tick(span)?;
                    self.execute_block(body)?;

                    if let Some(inc) = increment {
                        self.execute_statement(inc)?;
                    }
                }
                Ok(())
            }
            Stmt::DoWhile {
                condition,
                body,
                span,
            } => {
                loop {
                    self.tick(span)?;
                    self.execute_block(body)?;
                    if !self.evaluate_expression(condition)?.is_truthy() {
                        break;
                    }
                }
                Ok(())
            }
            Stmt::Call {
                name,
                arguments,
                span,
            } => self.call_builtin(name, arguments, span),
        }
    }

    fn execute_block(&mut self, statements: &[Stmt]) -> Result<(), CypeError> {
        for statement in statements {
            self.execute_statement(statement)?;
        }
        Ok(())
    }

    fn call_builtin(&mut self, name: &str, arguments: &[Expr], span: &Span) -> Result<(), CypeError> {
        if name != "print" && name != "println" {
            return Err(CypeError::runtime_error_with_help(
                span.clone(),
                format!("Unknown function: {}", name),
                "Only the built-in functions print() and println() are available.".to_string(),
            ));
        }

        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            values.push(self.evaluate_expression(argument)?);
        }

        for value in &values {
            self.output.write(&value.to_string());
        }
        if name == "println" {
            self.output.flush_line();
        }
        Ok(())
    }

    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value, CypeError> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Variable { name, span } => self.environment.get(name).cloned().ok_or_else(|| {
                CypeError::runtime_error_with_help(
                    span.clone(),
                    format!("Undefined variable: {}", name),
                    format!("Declare it first: let {} = ...;", name),
                )
            }),
            Expr::Binary {
                left,
                operator,
                right,
                ..
            } => {
                // Both operands are always evaluated; nothing short-circuits.
                let left_val = self.evaluate_expression(left)?;
                let right_val = self.evaluate_expression(right)?;
                Ok(self.evaluate_binary_op(*operator, &left_val, &right_val))
            }
            Expr::Unary {
                operator, operand, ..
            } => {
                let operand_val = self.evaluate_expression(operand)?;
                Ok(match operator {
                    UnaryOp::Negate => Value::Number(-operand_val.to_number()),
                    UnaryOp::Not => Value::Bool(!operand_val.is_truthy()),
                })
            }
        }
    }

    fn evaluate_binary_op(&self, operator: BinaryOp, left: &Value, right: &Value) -> Value {
        match operator {
            BinaryOp::Add => match (left, right) {
                (Value::Text(_), _) | (_, Value::Text(_)) => Value::Text(format!("{}{}", left, right)),
                _ => Value::Number(left.to_number() + right.to_number()),
            },
            BinaryOp::Subtract => Value::Number(left.to_number() - right.to_number()),
            BinaryOp::Multiply => Value::Number(left.to_number() * right.to_number()),
            BinaryOp::Divide => Value::Number((left.to_number() / right.to_number()).floor()),
            BinaryOp::Modulo => Value::Number(left.to_number() % right.to_number()),
            BinaryOp::Equal => Value::Bool(left == right),
            BinaryOp::NotEqual => Value::Bool(left != right),
            BinaryOp::Less => Value::Bool(left.compare(right) == Some(Ordering::Less)),
            BinaryOp::LessEqual => Value::Bool(matches!(
                left.compare(right),
                Some(Ordering::Less | Ordering::Equal)
            )),
            BinaryOp::Greater => Value::Bool(left.compare(right) == Some(Ordering::Greater)),
            BinaryOp::GreaterEqual => Value::Bool(matches!(
                left.compare(right),
                Some(Ordering::Greater | Ordering::Equal)
            )),
        }
    }

    fn tick(&mut self, span: &Span) -> Result<(), CypeError> {
        self.steps += 1;
        match self.step_limit {
            Some(limit) if self.steps > limit => Err(CypeError::runtime_error_with_help(
                span.clone(),
                format!("Step limit of {} exceeded", limit),
                "The program ran longer than allowed; check loop conditions for termination.".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
