use crate::ast::{Expr, Stmt};
use crate::environment::{EnvRef, Environment};
use crate::errors::RuntimeError;
use crate::scanner::TokenType;
use crate::stack::ensure_sufficient_stack;
use crate::value::{NativeFunction, UserFunction, Value};
use std::io;
use std::rc::Rc;

type EvalResult<T> = Result<T, RuntimeError>;

/// Where `print` sends its lines.
pub trait Output {
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

impl<W: io::Write + ?Sized> Output for W {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self, "{line}")
    }
}

/// How a statement finished. `Return` unwinds every enclosing statement up
/// to the function call that is running them.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

const NATIVES: &[NativeFunction] = &[NativeFunction {
    name: "print",
    arity: 1,
    func: native_print,
}];

fn native_print(evaluator: &mut Evaluator<'_>, arguments: &[Value]) -> EvalResult<Value> {
    let line = arguments.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
    evaluator.write_line(&line)?;
    Ok(Value::Nil)
}

/// Tree-walking executor for one program run.
pub struct Evaluator<'a> {
    globals: EnvRef,
    environment: EnvRef,
    output: &'a mut dyn Output,
}

impl<'a> Evaluator<'a> {
    pub fn new(output: &'a mut dyn Output) -> Self {
        let mut globals = Environment::new();
        for native in NATIVES {
            // a fresh scope never rejects the first definition of a name
            let _ = globals.define(native.name, Value::Callable(Rc::new(*native)));
        }
        let globals = globals.into_ref();
        Self {
            environment: Rc::clone(&globals),
            globals,
            output,
        }
    }

    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn interpret(&mut self, statements: &[Stmt]) -> EvalResult<()> {
        for stmt in statements {
            if let Flow::Return(_) = self.execute(stmt)? {
                return Err(RuntimeError::new("Can't return from top-level code."));
            }
        }
        tracing::debug!("program finished");
        Ok(())
    }

    pub fn write_line(&mut self, line: &str) -> EvalResult<()> {
        self.output
            .write_line(line)
            .map_err(|e| RuntimeError::new(format!("Failed to write output: {e}")))
    }

    /// Runs `statements` in `environment`, then restores the previous scope
    /// whether they finished, failed or returned.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> EvalResult<Flow> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> EvalResult<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn execute(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        ensure_sufficient_stack(|| match stmt {
            Stmt::Block(statements) => {
                let scope = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, scope.into_ref())
            }
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Function(declaration) => {
                let function = UserFunction::new(Rc::clone(declaration), Rc::clone(&self.environment));
                tracing::trace!(name = %declaration.name.lexeme, "declaring function");
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Callable(Rc::new(function)))?;
                Ok(Flow::Normal)
            }
            Stmt::If { condition, then_branch, else_branch } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Var { name, initializer } => {
                let value = self.evaluate(initializer)?;
                self.environment.borrow_mut().define(&name.lexeme, value)?;
                Ok(Flow::Normal)
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
        })
    }

    pub fn evaluate(&mut self, expr: &Expr) -> EvalResult<Value> {
        ensure_sufficient_stack(|| match expr {
            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment.borrow_mut().assign(&name.lexeme, value.clone())?;
                Ok(value)
            }
            Expr::Binary { left, operator, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                if operator.tt == TokenType::EqualEqual {
                    return Ok(Value::Bool(left == right));
                }
                let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
                    return Err(RuntimeError::new(format!(
                        "Operands to '{}' must be numbers.",
                        operator.lexeme
                    )));
                };
                let (a, b) = (*a, *b);
                match operator.tt {
                    TokenType::Less => Ok(Value::Bool(a < b)),
                    TokenType::Minus => Ok(Value::Number(a - b)),
                    TokenType::Plus => Ok(Value::Number(a + b)),
                    TokenType::Slash => Ok(Value::Number(a / b)),
                    TokenType::Star => Ok(Value::Number(a * b)),
                    _ => Err(RuntimeError::new(format!("Unknown operator '{}'.", operator.lexeme))),
                }
            }
            Expr::Call { callee, arguments, .. } => {
                let callee = self.evaluate(callee)?;
                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }
                let Value::Callable(function) = callee else {
                    return Err(RuntimeError::new("Can only call functions."));
                };
                if values.len() != function.arity() {
                    return Err(RuntimeError::new(format!(
                        "Expected {} arguments but got {}.",
                        function.arity(),
                        values.len()
                    )));
                }
                function.call(self, values)
            }
            Expr::Literal(literal) => Ok(Value::from(literal)),
            Expr::Logical { left, operator, right } => {
                let left = self.evaluate(left)?;
                if operator.tt == TokenType::Or {
                    if left.is_truthy() {
                        return Ok(Value::Bool(true));
                    }
                } else if !left.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.evaluate(right)?.is_truthy()))
            }
            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match operator.tt {
                    TokenType::Not => Ok(Value::Bool(!right.is_truthy())),
                    _ => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::new(format!(
                            "Operand to '{}' must be a number.",
                            operator.lexeme
                        ))),
                    },
                }
            }
            Expr::Variable { name } => self.environment.borrow().get(&name.lexeme),
        })
    }
}
