//! Renders the syntax tree as parenthesized S-expressions for `--ast`.

use crate::ast::{Expr, Stmt};

#[derive(Default)]
pub struct AstPrinter;

impl AstPrinter {
    pub fn new() -> Self {
        Self
    }

    /// One statement per line.
    pub fn print_program(&self, statements: &[Stmt]) -> String {
        let mut out = String::new();
        for stmt in statements {
            out.push_str(&self.print_stmt(stmt));
            out.push('\n');
        }
        out
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Block(statements) => {
                let parts: Vec<_> = statements.iter().map(|s| self.print_stmt(s)).collect();
                s_expr("BlockStmt", &parts)
            }
            Stmt::Expression(expr) => s_expr("ExpressionStmt", &[self.print_expr(expr)]),
            Stmt::Function(decl) => {
                let params: Vec<_> = decl.params.iter().map(|p| p.lexeme.clone()).collect();
                let body: Vec<_> = decl.body.iter().map(|s| self.print_stmt(s)).collect();
                s_expr(
                    "FunctionDeclStmt",
                    &[decl.name.lexeme.clone(), s_expr("Params", &params), s_expr("Body", &body)],
                )
            }
            Stmt::If { condition, then_branch, else_branch } => {
                let mut parts = vec![self.print_expr(condition), self.print_stmt(then_branch)];
                if let Some(else_branch) = else_branch {
                    parts.push(self.print_stmt(else_branch));
                }
                s_expr("IfStmt", &parts)
            }
            Stmt::Return { value, .. } => {
                let parts: Vec<_> = value.iter().map(|v| self.print_expr(v)).collect();
                s_expr("ReturnStmt", &parts)
            }
            Stmt::Var { name, initializer } => {
                s_expr("VarDeclStmt", &[name.lexeme.clone(), self.print_expr(initializer)])
            }
            Stmt::While { condition, body } => {
                s_expr("WhileStmt", &[self.print_expr(condition), self.print_stmt(body)])
            }
        }
    }

    pub fn print_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Assign { name, value } => {
                s_expr("AssignExpr", &[name.lexeme.clone(), self.print_expr(value)])
            }
            Expr::Binary { left, operator, right } => s_expr(
                "BinaryExpr",
                &[operator.lexeme.clone(), self.print_expr(left), self.print_expr(right)],
            ),
            Expr::Call { callee, arguments, .. } => {
                let mut parts = vec![self.print_expr(callee)];
                parts.extend(arguments.iter().map(|a| self.print_expr(a)));
                s_expr("CallExpr", &parts)
            }
            Expr::Literal(literal) => s_expr("LiteralExpr", &[literal.to_string()]),
            Expr::Logical { left, operator, right } => s_expr(
                "LogicalExpr",
                &[operator.lexeme.clone(), self.print_expr(left), self.print_expr(right)],
            ),
            Expr::Unary { operator, right } => {
                s_expr("UnaryExpr", &[operator.lexeme.clone(), self.print_expr(right)])
            }
            Expr::Variable { name } => s_expr("VariableExpr", &[name.lexeme.clone()]),
        }
    }
}

fn s_expr(name: &str, parts: &[String]) -> String {
    if parts.is_empty() {
        format!("({name})")
    } else {
        format!("({name} {})", parts.join(" "))
    }
}
