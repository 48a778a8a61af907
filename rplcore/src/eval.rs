//! Evaluation of objects and execution of commands.

use log::{debug, trace};

use crate::{
    arithmetic,
    command::{Command, Fixity},
    error::{RplError, RplResult},
    object::{Object, Symbol, postfix},
    parser,
    polynomial::Polynomial,
    runtime::Runtime,
    solver,
};

/// Replace every occurrence of `name` in a postfix list by `value`.
fn substitute(items: &[Object], name: &Symbol, value: &[Object], case_sensitive: bool) -> Vec<Object> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Object::Symbol(s) if s.matches(name, case_sensitive) => out.extend_from_slice(value),
            other => out.push(other.clone()),
        }
    }
    out
}

/// Rewrite `expr | name=value` by substituting the binding into `expr`.
fn expand_where(items: &[Object], case_sensitive: bool) -> RplResult<Vec<Object>> {
    if !items.contains(&Object::Command(Command::Where)) {
        return Ok(items.to_vec());
    }
    let mut folded = postfix::fold(
        items,
        |leaf| Ok(vec![leaf.clone()]),
        |cmd, args| {
            let mut args = args.into_iter();
            let (Some(body), binding) = (args.next(), args.next()) else {
                return Err(RplError::InvalidObject("operator is missing operands"));
            };
            if cmd != Command::Where {
                let mut out = body;
                for arg in std::iter::once(binding).flatten().chain(args) {
                    out.extend(arg);
                }
                out.push(cmd.into());
                return Ok(out);
            }
            let binding = binding.unwrap_or_default();
            match postfix::split_last(&binding) {
                Some((Command::Equation, sides)) => match sides[0] {
                    [Object::Symbol(name)] => Ok(substitute(&body, name, sides[1], case_sensitive)),
                    _ => Err(RplError::ValueError),
                },
                _ => Err(RplError::ValueError),
            }
        },
    )?;
    match folded.len() {
        1 => Ok(folded.remove(0)),
        _ => Err(RplError::InvalidObject("expression does not reduce to one value")),
    }
}

impl Runtime {
    /// Parse and execute a command line.
    ///
    /// On error the stack is restored to its state before the line ran and
    /// the error is recorded in the last-error slot.
    pub fn run(&mut self, src: &str) -> RplResult<()> {
        let snapshot = self.snapshot();
        let marker = self.scribble();
        for handle in &snapshot {
            self.protect(*handle);
        }
        let result = parser::parse(src, self.settings()).and_then(|program| match program {
            Object::Program(items) => items.iter().try_for_each(|item| self.execute(item)),
            other => self.execute(&other),
        });
        self.release(marker);
        if let Err(error) = &result {
            debug!("command line failed: {error}");
            self.restore(snapshot);
            self.set_error(error.clone());
        }
        result
    }

    /// Execute an object as it appears in a program: commands run, names are
    /// looked up, everything else is pushed.
    pub fn execute(&mut self, object: &Object) -> RplResult<()> {
        match object {
            Object::Command(cmd) => self.command(*cmd),
            Object::Symbol(name) => self.evaluate_name(name),
            other => self.push(other),
        }
    }

    /// Evaluate an object: programs run, expressions are computed, names are looked up.
    pub fn evaluate(&mut self, object: &Object) -> RplResult<()> {
        if self.nesting >= self.settings().max_recursion {
            return Err(RplError::Recursion);
        }
        self.nesting += 1;
        let result = match object {
            Object::Program(items) => items.iter().try_for_each(|item| self.execute(item)),
            Object::Expression(items) => self.evaluate_expression(items),
            Object::Polynomial(p) => self.evaluate_polynomial(p),
            other => self.execute(other),
        };
        self.nesting -= 1;
        result
    }

    /// Evaluate `object` and return the single value it produces.
    pub fn evaluate_value(&mut self, object: &Object) -> RplResult<Object> {
        let depth = self.depth();
        self.evaluate(object)?;
        match self.depth().checked_sub(depth) {
            Some(1) => self.pop(),
            Some(extra) if extra > 1 => {
                self.drop_n(extra)?;
                Err(RplError::ValueError)
            }
            _ => Err(RplError::TooFewArguments),
        }
    }

    fn evaluate_name(&mut self, name: &Symbol) -> RplResult<()> {
        if self.enter(name) {
            return Ok(());
        }
        match self.recall(name) {
            Some(value @ (Object::Program(_) | Object::Expression(_) | Object::Polynomial(_))) => {
                self.evaluate(&value)
            }
            Some(Object::Symbol(other)) => {
                if self.nesting >= self.settings().max_recursion {
                    return Err(RplError::Recursion);
                }
                self.nesting += 1;
                let result = self.evaluate_name(&other);
                self.nesting -= 1;
                result
            }
            Some(value) => self.push(&value),
            None => self.push(&Object::Expression(vec![Object::Symbol(name.clone())])),
        }
    }

    fn evaluate_expression(&mut self, items: &[Object]) -> RplResult<()> {
        let cs = self.settings().case_sensitive;
        let items = expand_where(items, cs)?;

        if let Ok(p) = Polynomial::from_expression(&items, self.settings()) {
            if !p.variables().is_empty() && p.variables().iter().all(|v| self.is_numeric(v)) {
                trace!("evaluating expression as a polynomial");
                let value = p.evaluate(self)?;
                return self.push(&value);
            }
        }

        let depth = self.depth();
        for item in &items {
            self.execute(item)?;
        }
        if self.depth() != depth + 1 {
            return Err(RplError::InvalidObject("expression does not reduce to one value"));
        }
        Ok(())
    }

    fn evaluate_polynomial(&mut self, p: &Polynomial) -> RplResult<()> {
        if p.variables().iter().all(|v| self.is_numeric(v)) {
            let value = p.evaluate(self)?;
            return self.push(&value);
        }
        self.evaluate_expression(&p.to_expression())
    }

    fn is_numeric(&self, name: &Symbol) -> bool {
        self.recall(name).is_some_and(|value| value.is_number())
    }

    fn name_argument(object: &Object) -> RplResult<Symbol> {
        object.as_symbol().cloned().ok_or(RplError::TypeError)
    }

    /// Run one command against the stack.
    pub fn command(&mut self, cmd: Command) -> RplResult<()> {
        trace!("command {}", cmd.name());
        match cmd {
            Command::Dup => self.dup(),
            Command::Drop => self.drop_n(1),
            Command::Swap => self.swap(),
            Command::Over => self.over(),
            Command::Rot => self.rot(),
            Command::Depth => {
                let depth = self.depth() as u64;
                self.push(&Object::from_u64(depth))
            }
            Command::Pick => {
                let n = self.top()?.to_i64().ok_or(RplError::TypeError)?;
                let n = usize::try_from(n).map_err(|_| RplError::ValueError)?;
                self.need_levels(n + 1)?;
                self.drop_n(1)?;
                self.pick(n)
            }
            Command::Clear => {
                self.clear();
                Ok(())
            }
            Command::Dup2 => self.dup2(),
            Command::Drop2 => self.drop_n(2),

            Command::Sto => {
                let args = self.args(2)?;
                let name = Self::name_argument(&args[1])?;
                self.store(&name, &args[0])?;
                self.drop_n(2)
            }
            Command::Rcl => {
                let name = Self::name_argument(&self.top()?)?;
                let value = self
                    .recall(&name)
                    .ok_or_else(|| RplError::UndefinedName(name.name().to_string()))?;
                self.drop_n(1)?;
                self.push(&value)
            }
            Command::Purge => {
                let name = Self::name_argument(&self.top()?)?;
                self.purge(&name)?;
                self.drop_n(1)
            }
            Command::CrDir => {
                let name = Self::name_argument(&self.top()?)?;
                self.crdir(&name)?;
                self.drop_n(1)
            }
            Command::UpDir => {
                self.updir();
                Ok(())
            }
            Command::Home => {
                self.home();
                Ok(())
            }

            Command::Eval => {
                let object = self.top()?;
                self.drop_n(1)?;
                self.evaluate(&object)
            }
            Command::ToNum => {
                let object = self.top()?;
                let value = if object.is_symbolic() {
                    self.evaluate_value(&object)?
                } else {
                    object
                };
                let result = arithmetic::to_decimal(&value, self.settings())?;
                self.drop_n(1)?;
                self.push(&result)
            }
            Command::ToPoly => {
                let object = self.top()?;
                let p = Polynomial::from_object(&object, self.settings())?;
                self.drop_n(1)?;
                self.push(&Object::Polynomial(p))
            }
            Command::ToExpr => {
                let object = self.top()?;
                let result = match &object {
                    Object::Expression(_) => object.clone(),
                    Object::Polynomial(p) => Object::Expression(p.to_expression()),
                    Object::Symbol(_) => Object::Expression(vec![object.clone()]),
                    x if x.is_number() => Object::Expression(vec![object.clone()]),
                    _ => return Err(RplError::TypeError),
                };
                self.drop_n(1)?;
                self.push(&result)
            }
            Command::Root => {
                let args = self.args(3)?;
                let root = solver::solve(self, &args[0], &args[1], &args[2])?;
                self.drop_n(3)?;
                self.push(&root)
            }

            _ => self.algebraic_command(cmd),
        }
    }

    fn need_levels(&self, n: usize) -> RplResult<()> {
        if self.depth() < n {
            Err(RplError::TooFewArguments)
        } else {
            Ok(())
        }
    }

    /// Commands that also appear in expressions, applied to stack values.
    fn algebraic_command(&mut self, cmd: Command) -> RplResult<()> {
        let arity = cmd.arity();
        let args = self.args(arity)?;
        let result = match (cmd.fixity(), args.as_slice()) {
            (Fixity::Stack, _) => return Err(RplError::Unimplemented),
            (_, [x]) => arithmetic::unary(cmd, x, self.settings())?,
            (_, [x, y]) => arithmetic::binary(cmd, x, y, self.settings())?,
            _ => return Err(RplError::Unimplemented),
        };
        self.drop_n(arity)?;
        self.push(&result)
    }
}
