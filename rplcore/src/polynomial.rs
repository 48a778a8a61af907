//! Multivariate polynomials with exact or decimal coefficients.
//!
//! Variables are kept sorted in descending order, and terms are kept sorted by
//! descending exponent vector with like terms combined and zero terms removed.

use std::cmp::Ordering;

use log::trace;

use crate::{
    arithmetic,
    command::Command,
    error::{RplError, RplResult},
    object::{Object, Symbol, postfix},
    runtime::Runtime,
    settings::Settings,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub factor: Object,
    /// One exponent per polynomial variable.
    pub exponents: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polynomial {
    variables: Vec<Symbol>,
    terms: Vec<Term>,
}

/// Union of two descending variable lists, with the position of each input variable in the union.
fn union(a: &[Symbol], b: &[Symbol], case_sensitive: bool) -> (Vec<Symbol>, Vec<usize>, Vec<usize>) {
    let mut variables = Vec::with_capacity(a.len() + b.len());
    let (mut map_a, mut map_b) = (Vec::with_capacity(a.len()), Vec::with_capacity(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        let order = match (a.get(i), b.get(j)) {
            (Some(x), Some(y)) => x.compare(y, case_sensitive),
            (Some(_), None) => Ordering::Greater,
            _ => Ordering::Less,
        };
        match order {
            Ordering::Greater => {
                map_a.push(variables.len());
                variables.push(a[i].clone());
                i += 1;
            }
            Ordering::Less => {
                map_b.push(variables.len());
                variables.push(b[j].clone());
                j += 1;
            }
            Ordering::Equal => {
                map_a.push(variables.len());
                map_b.push(variables.len());
                variables.push(a[i].clone());
                i += 1;
                j += 1;
            }
        }
    }
    (variables, map_a, map_b)
}

impl Polynomial {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant(value: Object) -> Self {
        if value.is_zero() {
            return Self::zero();
        }
        Self {
            variables: Vec::new(),
            terms: vec![Term {
                factor: value,
                exponents: Vec::new(),
            }],
        }
    }

    pub fn variable(name: Symbol) -> Self {
        Self {
            variables: vec![name],
            terms: vec![Term {
                factor: Object::integer(1),
                exponents: vec![1],
            }],
        }
    }

    /// Assemble a polynomial from decoded parts without re-normalizing it.
    pub(crate) fn from_parts(variables: Vec<Symbol>, terms: Vec<Term>) -> Self {
        Self { variables, terms }
    }

    pub fn variables(&self) -> &[Symbol] {
        &self.variables
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// The value of a polynomial without variables.
    pub fn as_constant(&self) -> Option<Object> {
        match self.terms.as_slice() {
            [] => Some(Object::integer(0)),
            [term] if term.exponents.iter().all(|e| *e == 0) => Some(term.factor.clone()),
            _ => None,
        }
    }

    pub fn from_object(object: &Object, settings: &Settings) -> RplResult<Self> {
        match object {
            Object::Polynomial(p) => Ok(p.clone()),
            Object::Symbol(s) => Ok(Self::variable(s.clone())),
            Object::Expression(items) => Self::from_expression(items, settings),
            n if n.is_number() => Ok(Self::constant(n.clone())),
            _ => Err(RplError::TypeError),
        }
    }

    /// Convert an expression built from negation, addition, subtraction,
    /// multiplication and non-negative integer powers.
    pub fn from_expression(items: &[Object], settings: &Settings) -> RplResult<Self> {
        let leaf = |item: &Object| match item {
            Object::Symbol(s) => Ok(Self::variable(s.clone())),
            Object::Polynomial(p) => Ok(p.clone()),
            n if n.is_number() => Ok(Self::constant(n.clone())),
            _ => Err(RplError::TypeError),
        };
        let node = |cmd: Command, args: Vec<Polynomial>| -> RplResult<Polynomial> {
            match (cmd, args.as_slice()) {
                (Command::Neg, [x]) => x.neg(settings),
                (Command::Sq, [x]) => x.pow(2, settings),
                (Command::Cube, [x]) => x.pow(3, settings),
                (Command::Add, [x, y]) => x.add(y, settings),
                (Command::Sub, [x, y]) => x.sub(y, settings),
                (Command::Mul, [x, y]) => x.mul(y, settings),
                (Command::Pow, [x, y]) => {
                    let exponent = y
                        .as_constant()
                        .and_then(|e| e.to_i64())
                        .and_then(|e| u32::try_from(e).ok())
                        .ok_or(RplError::ValueError)?;
                    x.pow(exponent, settings)
                }
                _ => Err(RplError::ValueError),
            }
        };
        let mut result = postfix::fold(items, leaf, node)?;
        match result.len() {
            1 => Ok(result.remove(0)),
            _ => Err(RplError::ValueError),
        }
    }

    fn remap(&self, count: usize, map: &[usize]) -> impl Iterator<Item = Term> + '_ {
        let map = map.to_vec();
        self.terms.iter().map(move |term| {
            let mut exponents = vec![0; count];
            for (k, e) in term.exponents.iter().enumerate() {
                exponents[map[k]] = *e;
            }
            Term {
                factor: term.factor.clone(),
                exponents,
            }
        })
    }

    /// Sort terms, combine like terms, drop zero terms and unused variables.
    fn normalize(variables: Vec<Symbol>, mut terms: Vec<Term>, settings: &Settings) -> RplResult<Self> {
        terms.sort_by(|a, b| b.exponents.cmp(&a.exponents));
        let mut merged: Vec<Term> = Vec::with_capacity(terms.len());
        for term in terms {
            match merged.last_mut() {
                Some(last) if last.exponents == term.exponents => {
                    last.factor = arithmetic::add(&last.factor, &term.factor, settings)?;
                }
                _ => merged.push(term),
            }
        }
        merged.retain(|term| !term.factor.is_zero());

        let used: Vec<bool> = (0..variables.len())
            .map(|k| merged.iter().any(|term| term.exponents[k] > 0))
            .collect();
        if used.iter().all(|u| *u) {
            return Ok(Self {
                variables,
                terms: merged,
            });
        }
        let variables = variables
            .into_iter()
            .zip(&used)
            .filter_map(|(v, u)| u.then_some(v))
            .collect();
        for term in &mut merged {
            term.exponents = term
                .exponents
                .iter()
                .zip(&used)
                .filter_map(|(e, u)| u.then_some(*e))
                .collect();
        }
        Ok(Self {
            variables,
            terms: merged,
        })
    }

    pub fn add(&self, other: &Polynomial, settings: &Settings) -> RplResult<Self> {
        let (variables, map_a, map_b) = union(&self.variables, &other.variables, settings.case_sensitive);
        let count = variables.len();
        let terms = self
            .remap(count, &map_a)
            .chain(other.remap(count, &map_b))
            .collect();
        Self::normalize(variables, terms, settings)
    }

    pub fn neg(&self, settings: &Settings) -> RplResult<Self> {
        let terms = self
            .terms
            .iter()
            .map(|term| {
                Ok(Term {
                    factor: arithmetic::neg(&term.factor, settings)?,
                    exponents: term.exponents.clone(),
                })
            })
            .collect::<RplResult<Vec<_>>>()?;
        Ok(Self {
            variables: self.variables.clone(),
            terms,
        })
    }

    pub fn sub(&self, other: &Polynomial, settings: &Settings) -> RplResult<Self> {
        self.add(&other.neg(settings)?, settings)
    }

    pub fn mul(&self, other: &Polynomial, settings: &Settings) -> RplResult<Self> {
        let (variables, map_a, map_b) = union(&self.variables, &other.variables, settings.case_sensitive);
        let count = variables.len();
        let right: Vec<Term> = other.remap(count, &map_b).collect();
        let mut terms = Vec::with_capacity(self.terms.len() * right.len());
        for a in self.remap(count, &map_a) {
            for b in &right {
                let exponents = a
                    .exponents
                    .iter()
                    .zip(&b.exponents)
                    .map(|(x, y)| x.checked_add(*y).ok_or(RplError::ValueError))
                    .collect::<RplResult<_>>()?;
                terms.push(Term {
                    factor: arithmetic::mul(&a.factor, &b.factor, settings)?,
                    exponents,
                });
            }
        }
        Self::normalize(variables, terms, settings)
    }

    pub fn pow(&self, mut exponent: u32, settings: &Settings) -> RplResult<Self> {
        if exponent == 0 && self.is_zero() {
            return Err(RplError::UndefinedOperation);
        }
        let mut base = self.clone();
        let mut result = Self::constant(Object::integer(1));
        while exponent > 0 {
            if exponent & 1 == 1 {
                result = result.mul(&base, settings)?;
            }
            exponent >>= 1;
            if exponent > 0 {
                base = base.mul(&base, settings)?;
            }
        }
        Ok(result)
    }

    pub fn div(&self, _other: &Polynomial, _settings: &Settings) -> RplResult<Self> {
        Err(RplError::Unimplemented)
    }

    pub fn rem(&self, _other: &Polynomial, _settings: &Settings) -> RplResult<Self> {
        Err(RplError::Unimplemented)
    }

    /// Postfix expression with the same value.
    pub fn to_expression(&self) -> Vec<Object> {
        if self.terms.is_empty() {
            return vec![Object::integer(0)];
        }
        let mut items = Vec::new();
        for (index, term) in self.terms.iter().enumerate() {
            let subtract = index > 0 && term.factor.is_real() && term.factor.is_negative();
            let factor = if subtract {
                arithmetic::negate(&term.factor).unwrap_or_else(|_| term.factor.clone())
            } else {
                term.factor.clone()
            };

            let mut monomial = Vec::new();
            for (variable, &e) in self.variables.iter().zip(&term.exponents) {
                if e == 0 {
                    continue;
                }
                let first = monomial.is_empty();
                monomial.push(Object::Symbol(variable.clone()));
                if e > 1 {
                    monomial.push(Object::from_u64(e as u64));
                    monomial.push(Command::Pow.into());
                }
                if !first {
                    monomial.push(Command::Mul.into());
                }
            }

            if monomial.is_empty() {
                items.push(factor);
            } else if factor.is_one() {
                items.extend(monomial);
            } else if factor == Object::integer(-1) {
                items.extend(monomial);
                items.push(Command::Neg.into());
            } else {
                items.push(factor);
                items.extend(monomial);
                items.push(Command::Mul.into());
            }

            if index > 0 {
                items.push(if subtract { Command::Sub } else { Command::Add }.into());
            }
        }
        items
    }

    /// Value of the polynomial for the given variable values, in variable order.
    pub fn evaluate_with(&self, values: &[Object], settings: &Settings) -> RplResult<Object> {
        if values.len() != self.variables.len() {
            return Err(RplError::TooFewArguments);
        }
        let mut sum = Object::integer(0);
        for term in &self.terms {
            let mut product = term.factor.clone();
            for (value, &e) in values.iter().zip(&term.exponents) {
                if e > 0 {
                    let power = arithmetic::pow(value, &Object::from_u64(e as u64), settings)?;
                    product = arithmetic::mul(&product, &power, settings)?;
                }
            }
            sum = arithmetic::add(&sum, &product, settings)?;
        }
        Ok(sum)
    }

    /// Recall each variable once, then fold the terms.
    pub fn evaluate(&self, rt: &mut Runtime) -> RplResult<Object> {
        let mut values = Vec::with_capacity(self.variables.len());
        for variable in &self.variables {
            let value = rt
                .recall(variable)
                .ok_or_else(|| RplError::UndefinedName(variable.name().to_string()))?;
            let value = if value.is_number() {
                value
            } else {
                rt.evaluate_value(&value)?
            };
            if !value.is_number() {
                return Err(RplError::TypeError);
            }
            values.push(value);
        }
        trace!("evaluating polynomial in {} variables", values.len());
        self.evaluate_with(&values, rt.settings())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Polynomial {
        Polynomial::variable(Symbol::new("X"))
    }

    fn y() -> Polynomial {
        Polynomial::variable(Symbol::new("Y"))
    }

    fn k(v: i64) -> Polynomial {
        Polynomial::constant(Object::integer(v))
    }

    #[test]
    fn variables_are_descending() {
        let s = Settings::default();
        let p = x().add(&y(), &s).unwrap();
        let names: Vec<&str> = p.variables().iter().map(Symbol::name).collect();
        assert_eq!(names, vec!["Y", "X"]);
    }

    #[test]
    fn square_of_binomial() {
        let s = Settings::default();
        let p = x().add(&k(1), &s).unwrap().pow(2, &s).unwrap();
        let factors: Vec<Object> = p.terms().iter().map(|t| t.factor.clone()).collect();
        assert_eq!(factors, vec![Object::integer(1), Object::integer(2), Object::integer(1)]);
        let exponents: Vec<Vec<u32>> = p.terms().iter().map(|t| t.exponents.clone()).collect();
        assert_eq!(exponents, vec![vec![2], vec![1], vec![0]]);
    }

    #[test]
    fn cancellation_drops_terms_and_variables() {
        let s = Settings::default();
        let p = x().add(&y(), &s).unwrap().sub(&x(), &s).unwrap();
        assert_eq!(p, y());
        assert!(x().sub(&x(), &s).unwrap().is_zero());
    }

    #[test]
    fn product_coalesces_like_terms() {
        let s = Settings::default();
        // (X+Y)(X-Y) = X² - Y²
        let p = x().add(&y(), &s).unwrap().mul(&x().sub(&y(), &s).unwrap(), &s).unwrap();
        assert_eq!(p.terms().len(), 2);
    }

    #[test]
    fn conversion_rejects_non_polynomial_operators() {
        let s = Settings::default();
        let items = vec![Object::symbol("X"), Object::symbol("Y"), Command::Div.into()];
        assert!(matches!(Polynomial::from_expression(&items, &s), Err(RplError::ValueError)));
        let items = vec![Object::text("a"), Object::integer(1), Command::Add.into()];
        assert!(matches!(Polynomial::from_expression(&items, &s), Err(RplError::TypeError)));
        let items = vec![Object::symbol("X"), Object::symbol("N"), Command::Pow.into()];
        assert!(matches!(Polynomial::from_expression(&items, &s), Err(RplError::ValueError)));
    }

    #[test]
    fn expression_form() {
        let s = Settings::default();
        let p = x().pow(2, &s).unwrap().sub(&x().mul(&k(3), &s).unwrap(), &s).unwrap();
        assert_eq!(
            p.to_expression(),
            vec![
                Object::symbol("X"),
                Object::integer(2),
                Command::Pow.into(),
                Object::integer(3),
                Object::symbol("X"),
                Command::Mul.into(),
                Command::Sub.into(),
            ]
        );
        let back = Polynomial::from_expression(&p.to_expression(), &s).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn evaluation_with_values() {
        let s = Settings::default();
        let p = x().pow(2, &s).unwrap().add(&k(1), &s).unwrap();
        assert_eq!(p.evaluate_with(&[Object::integer(3)], &s).unwrap(), Object::integer(10));
        assert!(matches!(p.div(&x(), &s), Err(RplError::Unimplemented)));
    }

    #[test]
    fn exponent_overflow_is_a_value_error() {
        let s = Settings::default();
        let big = x().pow(4_000_000_000, &s).unwrap();
        assert!(matches!(big.mul(&big, &s), Err(RplError::ValueError)));
        assert!(matches!(big.pow(2, &s), Err(RplError::ValueError)));
    }
}
