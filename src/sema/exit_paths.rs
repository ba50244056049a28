//! Function exit path navigation
//!
//! A function returning a value must reach a `return` on every path.
//! Statements following a `return`, `break` or `continue` in the same block
//! are unreachable, and loop control is only allowed inside loops.
//! Loop bodies may not run at all, so a `return` inside a loop does not
//! count for the enclosing block.

use log::trace;

use crate::frontend::ast::{FunctionDefinition, Statement};
use crate::utils::{Error, Result, Span};

/// How control leaves a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    FallsThrough,
    /// Every path ends in a `return`
    Returns,
    /// Every path ends in a `return`, `break` or `continue`
    Jumps,
}

impl Exit {
    fn terminates(self) -> bool {
        self != Self::FallsThrough
    }

    fn join(self, other: Self) -> Self {
        match (self, other) {
            (Self::Returns, Self::Returns) => Self::Returns,
            (a, b) if a.terminates() && b.terminates() => Self::Jumps,
            _ => Self::FallsThrough,
        }
    }
}

pub struct FunctionExitPathNavigator<'a> {
    function: &'a FunctionDefinition,
    loop_depth: usize,
}

impl<'a> FunctionExitPathNavigator<'a> {
    pub fn new(function: &'a FunctionDefinition) -> Self {
        Self { function, loop_depth: 0 }
    }

    pub fn visit_function_definition(mut self) -> Result<()> {
        let function = self.function;
        let exit = self.visit_code_block(&function.body)?;
        trace!("function {} exits with {:?}", function.name, exit);
        if function.return_type.is_some() && exit != Exit::Returns {
            return Err(Error::MissingReturnPath {
                function: function.name.clone(),
                span: function.span,
            });
        }
        Ok(())
    }

    fn visit_code_block(&mut self, statements: &[Statement]) -> Result<Exit> {
        let mut exit = Exit::FallsThrough;
        for statement in statements {
            if exit.terminates() {
                return Err(Error::UnreachableCode {
                    function: self.function.name.clone(),
                    span: statement.span(),
                });
            }
            exit = self.visit_statement(statement)?;
        }
        Ok(exit)
    }

    fn visit_statement(&mut self, statement: &Statement) -> Result<Exit> {
        match statement {
            Statement::Return { .. } => Ok(Exit::Returns),
            Statement::Break { span } => self.visit_loop_control("break", *span),
            Statement::Continue { span } => self.visit_loop_control("continue", *span),
            Statement::Conditional { then_branch, else_branch, .. } => {
                let then_exit = self.visit_code_block(then_branch)?;
                let else_exit = self.visit_code_block(else_branch)?;
                Ok(then_exit.join(else_exit))
            }
            Statement::WhileLoop { body, .. } | Statement::UntilLoop { body, .. } => {
                self.loop_depth += 1;
                let result = self.visit_code_block(body);
                self.loop_depth -= 1;
                result.map(|_| Exit::FallsThrough)
            }
            Statement::VariableDeclaration { .. }
            | Statement::ConstDeclaration { .. }
            | Statement::Assignment { .. }
            | Statement::FunctionCall(_) => Ok(Exit::FallsThrough),
        }
    }

    fn visit_loop_control(&self, keyword: &str, span: Span) -> Result<Exit> {
        if self.loop_depth == 0 {
            return Err(Error::MisplacedLoopControl { keyword: keyword.to_string(), span });
        }
        Ok(Exit::Jumps)
    }
}
