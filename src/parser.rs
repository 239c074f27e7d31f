use crate::ast::{Expr, FunctionDecl, Stmt};
use crate::errors::ParseError;
use crate::scanner::{Literal, Token, TokenType};
use crate::stack::ensure_sufficient_stack;
use std::rc::Rc;

type ParseResult<T> = Result<T, ParseError>;

/// Recursive-descent parser with one token of lookahead. There is no error
/// recovery: the first error ends the parse.
pub struct Parser {
    pub tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    /// `tokens` must end with an `Eof` token, as produced by the scanner.
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser { tokens, current: 0 }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn parse(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.global()?);
        }
        tracing::debug!(count = statements.len(), "parsed top-level statements");
        Ok(statements)
    }

    // Function declarations are only reachable from here, so nested
    // functions are a syntax error.
    fn global(&mut self) -> ParseResult<Stmt> {
        if self.match_tokens(&[TokenType::Fun]) {
            return self.function();
        }
        self.declaration()
    }

    fn declaration(&mut self) -> ParseResult<Stmt> {
        if self.match_tokens(&[TokenType::Var]) {
            return self.var_declaration();
        }
        self.statement()
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        ensure_sufficient_stack(|| {
            if self.match_tokens(&[TokenType::If]) {
                return self.if_statement();
            }
            if self.match_tokens(&[TokenType::Return]) {
                return self.return_statement();
            }
            if self.match_tokens(&[TokenType::While]) {
                return self.while_statement();
            }
            if self.match_tokens(&[TokenType::LeftBrace]) {
                return Ok(Stmt::Block(self.block()?));
            }
            self.expression_statement()
        })
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        let condition = self.expression()?;
        self.consume(TokenType::Then, "Expect 'then' after if condition.")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_tokens(&[TokenType::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If { condition, then_branch, else_branch })
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        let value = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenType::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenType::Identifier, "Expect variable name.")?;
        self.consume(TokenType::Equal, "Expect '=' after variable name.")?;
        let initializer = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        let condition = self.expression()?;
        self.consume(TokenType::Do, "Expect 'do' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { condition, body })
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn function(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenType::Identifier, "Expect function name.")?;
        self.consume(TokenType::LeftParen, "Expect '(' after function name.")?;
        let mut params = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                params.push(self.consume(TokenType::Identifier, "Expect parameter name.")?);
                if !self.match_tokens(&[TokenType::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightParen, "Expect ')' after parameters.")?;
        self.consume(TokenType::LeftBrace, "Expect '{' before function body.")?;
        let body = self.block()?;
        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }
        self.consume(TokenType::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        ensure_sufficient_stack(|| self.assignment())
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;

        if self.match_tokens(&[TokenType::Equal]) {
            let equals_line = self.previous().line;
            let value = Box::new(self.assignment()?);
            if let Expr::Variable { name } = expr {
                return Ok(Expr::Assign { name, value });
            }
            return Err(ParseError::new("Invalid assignment target.", equals_line));
        }

        Ok(expr)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;
        while self.match_tokens(&[TokenType::Or]) {
            let operator = self.previous().clone();
            let right = Box::new(self.and()?);
            expr = Expr::Logical { left: Box::new(expr), operator, right };
        }
        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;
        while self.match_tokens(&[TokenType::And]) {
            let operator = self.previous().clone();
            let right = Box::new(self.equality()?);
            expr = Expr::Logical { left: Box::new(expr), operator, right };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.binary(&[TokenType::EqualEqual], Self::comparison)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.binary(&[TokenType::Less], Self::term)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        self.binary(&[TokenType::Minus, TokenType::Plus], Self::factor)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        self.binary(&[TokenType::Slash, TokenType::Star], Self::unary)
    }

    /// Left-folds `operand (op operand)*` into nested binary nodes.
    fn binary(
        &mut self,
        operators: &[TokenType],
        operand: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let mut expr = operand(self)?;
        while self.match_tokens(operators) {
            let operator = self.previous().clone();
            let right = Box::new(operand(self)?);
            expr = Expr::Binary { left: Box::new(expr), operator, right };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.match_tokens(&[TokenType::Not, TokenType::Minus]) {
            let operator = self.previous().clone();
            let right = Box::new(ensure_sufficient_stack(|| self.unary())?);
            return Ok(Expr::Unary { operator, right });
        }
        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        while self.match_tokens(&[TokenType::LeftParen]) {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                arguments.push(self.expression()?);
                if !self.match_tokens(&[TokenType::Comma]) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenType::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::Call { callee: Box::new(callee), paren, arguments })
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if self.match_tokens(&[TokenType::False]) {
            return Ok(Expr::Literal(Literal::Bool(false)));
        }
        if self.match_tokens(&[TokenType::True]) {
            return Ok(Expr::Literal(Literal::Bool(true)));
        }
        if self.match_tokens(&[TokenType::Nil]) {
            return Ok(Expr::Literal(Literal::Nil));
        }
        if self.match_tokens(&[TokenType::Number, TokenType::String]) {
            let literal = self.previous().literal.clone().unwrap_or(Literal::Nil);
            return Ok(Expr::Literal(literal));
        }
        if self.match_tokens(&[TokenType::Identifier]) {
            return Ok(Expr::Variable { name: self.previous().clone() });
        }
        if self.match_tokens(&[TokenType::LeftParen]) {
            let expr = self.expression()?;
            self.consume(TokenType::RightParen, "Expect ')' after expression.")?;
            return Ok(expr);
        }
        Err(self.error("Expect expression."))
    }

    fn match_tokens(&mut self, types: &[TokenType]) -> bool {
        for &tt in types {
            if self.check(tt) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, tt: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }
        self.peek().tt == tt
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().tt == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn error(&self, msg: &str) -> ParseError {
        ParseError::new(msg, self.peek().line)
    }

    fn consume(&mut self, tt: TokenType, msg: &str) -> ParseResult<Token> {
        if self.check(tt) {
            return Ok(self.advance().clone());
        }
        Err(self.error(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::AstPrinter;
    use crate::scanner::Scanner;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> ParseResult<Vec<Stmt>> {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        Parser::new(tokens).parse()
    }

    fn sexpr(source: &str) -> String {
        AstPrinter::new().print_program(&parse(source).unwrap())
    }

    fn parse_error(source: &str) -> ParseError {
        parse(source).unwrap_err()
    }

    #[test]
    fn precedence_climbs_from_or_to_factor() {
        assert_eq!(
            sexpr("1 or 0 and 2;"),
            "(ExpressionStmt (LogicalExpr or (LiteralExpr 1.0) (LogicalExpr and (LiteralExpr 0.0) (LiteralExpr 2.0))))\n"
        );
        assert_eq!(
            sexpr("a == 1 + 2 * 3 < 4;"),
            "(ExpressionStmt (BinaryExpr == (VariableExpr a) (BinaryExpr < (BinaryExpr + (LiteralExpr 1.0) (BinaryExpr * (LiteralExpr 2.0) (LiteralExpr 3.0))) (LiteralExpr 4.0))))\n"
        );
    }

    #[test]
    fn binary_chains_fold_left() {
        assert_eq!(
            sexpr("1 - 2 - 3;"),
            "(ExpressionStmt (BinaryExpr - (BinaryExpr - (LiteralExpr 1.0) (LiteralExpr 2.0)) (LiteralExpr 3.0)))\n"
        );
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(
            sexpr("a = b = 1;"),
            "(ExpressionStmt (AssignExpr a (AssignExpr b (LiteralExpr 1.0))))\n"
        );
    }

    #[test]
    fn unary_is_right_recursive() {
        assert_eq!(
            sexpr("- - not x;"),
            "(ExpressionStmt (UnaryExpr - (UnaryExpr - (UnaryExpr not (VariableExpr x)))))\n"
        );
    }

    #[test]
    fn calls_chain_and_keep_closing_paren() {
        let stmts = parse("f(1, \"a\")();").unwrap();
        let Stmt::Expression(Expr::Call { callee, paren, arguments }) = &stmts[0] else {
            panic!("expected call, got {stmts:?}");
        };
        assert_eq!(paren.tt, TokenType::RightParen);
        assert!(arguments.is_empty());
        let Expr::Call { arguments, .. } = callee.as_ref() else {
            panic!("expected inner call");
        };
        assert_eq!(arguments.len(), 2);
    }

    #[test]
    fn statements() {
        assert_eq!(
            sexpr("fun f(a, b) { var c = a; if c then return c; else return; while c do c = nil; }"),
            "(FunctionDeclStmt f (Params a b) (Body (VarDeclStmt c (VariableExpr a)) (IfStmt (VariableExpr c) (ReturnStmt (VariableExpr c)) (ReturnStmt)) (WhileStmt (VariableExpr c) (ExpressionStmt (AssignExpr c (LiteralExpr nil))))))\n"
        );
        assert_eq!(sexpr("{ }"), "(BlockStmt)\n");
    }

    #[test]
    fn grouping_leaves_no_node() {
        assert_eq!(
            sexpr("(1 + 2) * 3;"),
            "(ExpressionStmt (BinaryExpr * (BinaryExpr + (LiteralExpr 1.0) (LiteralExpr 2.0)) (LiteralExpr 3.0)))\n"
        );
    }

    #[test]
    fn invalid_assignment_target_reports_equals_line() {
        let err = parse_error("1 +\n2\n= 3;");
        assert_eq!(err, ParseError::new("Invalid assignment target.", 3));
    }

    #[test]
    fn nested_function_declaration_is_rejected() {
        let err = parse_error("fun a(x) { fun b(y) {} }");
        assert_eq!(err.message, "Expect expression.");
    }

    #[test]
    fn expectation_messages() {
        assert_eq!(parse_error("print(1)").message, "Expect ';' after expression.");
        assert_eq!(parse_error("if x print(1);").message, "Expect 'then' after if condition.");
        assert_eq!(parse_error("while x print(1);").message, "Expect 'do' after condition.");
        assert_eq!(parse_error("var = 1;").message, "Expect variable name.");
        assert_eq!(parse_error("var x;").message, "Expect '=' after variable name.");
        assert_eq!(parse_error("var x = 1").message, "Expect ';' after variable declaration.");
        assert_eq!(parse_error("return 1").message, "Expect ';' after return value.");
        assert_eq!(parse_error("fun (){}").message, "Expect function name.");
        assert_eq!(parse_error("fun f{}").message, "Expect '(' after function name.");
        assert_eq!(parse_error("fun f(1){}").message, "Expect parameter name.");
        assert_eq!(parse_error("fun f(a b){}").message, "Expect ')' after parameters.");
        assert_eq!(parse_error("fun f() print(1);").message, "Expect '{' before function body.");
        assert_eq!(parse_error("{ print(1);").message, "Expect '}' after block.");
        assert_eq!(parse_error("f(1;").message, "Expect ')' after arguments.");
        assert_eq!(parse_error("(1;").message, "Expect ')' after expression.");
    }

    #[test]
    fn brackets_are_not_consumed_by_any_rule() {
        assert_eq!(parse_error("[1];").message, "Expect expression.");
    }

    #[test]
    fn error_line_is_the_offending_token() {
        let err = parse_error("var a = 1;\n\nvar b = ;");
        assert_eq!(err, ParseError::new("Expect expression.", 3));
    }
}
