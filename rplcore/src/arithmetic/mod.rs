//! The numeric tower.
//!
//! Every operation first tries the cheapest representation that can hold the
//! result: machine integers, then bignums, then exact fractions, then
//! decimals. Complex operands, units, text and symbolic operands are handled
//! before the real tower is entered.

pub mod bignum;
pub mod complex;
pub mod decimal;
pub mod fraction;
pub mod integer;

use std::cmp::Ordering;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_integer::Integer as _;

use crate::{
    command::Command,
    error::{RplError, RplResult},
    object::{Complex, Decimal, Object, Unit},
    polynomial::Polynomial,
    settings::Settings,
};

pub fn add(x: &Object, y: &Object, settings: &Settings) -> RplResult<Object> {
    binary(Command::Add, x, y, settings)
}

pub fn sub(x: &Object, y: &Object, settings: &Settings) -> RplResult<Object> {
    binary(Command::Sub, x, y, settings)
}

pub fn mul(x: &Object, y: &Object, settings: &Settings) -> RplResult<Object> {
    binary(Command::Mul, x, y, settings)
}

pub fn div(x: &Object, y: &Object, settings: &Settings) -> RplResult<Object> {
    binary(Command::Div, x, y, settings)
}

pub fn pow(x: &Object, y: &Object, settings: &Settings) -> RplResult<Object> {
    binary(Command::Pow, x, y, settings)
}

pub fn neg(x: &Object, settings: &Settings) -> RplResult<Object> {
    unary(Command::Neg, x, settings)
}

/// Expression `x y op`.
pub fn symbolic_binary(op: Command, x: &Object, y: &Object) -> Object {
    let mut items = x.postfix_items();
    items.extend(y.postfix_items());
    items.push(Object::Command(op));
    Object::Expression(items)
}

/// Expression `x op`.
pub fn symbolic_unary(op: Command, x: &Object) -> Object {
    let mut items = x.postfix_items();
    items.push(Object::Command(op));
    Object::Expression(items)
}

/// Exact integer value of an integer object or an integral decimal.
fn integral_value(x: &Object) -> Option<BigInt> {
    match x {
        Object::Decimal(d) => decimal::integral(&d.value),
        other => other.to_bigint(),
    }
}

/// Convert fraction results to decimals in numerical-results mode.
fn finish(result: Object, settings: &Settings) -> Object {
    match &result {
        Object::Fraction(_) if settings.numerical_results => match decimal::to_bigdecimal(&result)
        {
            Some(value) => Object::decimal(value, settings.precision),
            None => result,
        },
        _ => result,
    }
}

/// Order of two real numbers.
pub fn compare(x: &Object, y: &Object) -> RplResult<Ordering> {
    if let (Object::Integer(a), Object::Integer(b)) = (x, y) {
        return Ok(integer::cmp(*a, *b));
    }
    if let (Some(a), Some(b)) = (fraction::rational(x), fraction::rational(y)) {
        return Ok(fraction::cmp(&a, &b));
    }
    match (decimal::to_bigdecimal(x), decimal::to_bigdecimal(y)) {
        (Some(a), Some(b)) => Ok(decimal::cmp(&a, &b)),
        _ => Err(RplError::TypeError),
    }
}

/// Numeric equality, including complex numbers in either form.
fn numerically_equal(x: &Object, y: &Object, settings: &Settings) -> RplResult<bool> {
    if x.is_real() && y.is_real() {
        return Ok(compare(x, y)? == Ordering::Equal);
    }
    let (a, b) = complex::rectangular_parts(x, settings)?;
    let (c, d) = complex::rectangular_parts(y, settings)?;
    Ok(compare(&a, &c)? == Ordering::Equal && compare(&b, &d)? == Ordering::Equal)
}

fn comparison(op: Command, x: &Object, y: &Object, settings: &Settings) -> RplResult<Object> {
    let equal = |settings: &Settings| -> RplResult<bool> {
        if x.is_number() && y.is_number() {
            numerically_equal(x, y, settings)
        } else {
            Ok(x == y)
        }
    };
    let ordering = || -> RplResult<Ordering> {
        match (x, y) {
            (Object::Text(a), Object::Text(b)) => Ok(a.cmp(b)),
            _ if x.is_real() && y.is_real() => compare(x, y),
            _ => Err(RplError::TypeError),
        }
    };
    let truth = match op {
        Command::Same => equal(settings)?,
        Command::NotEqual => !equal(settings)?,
        Command::Less => ordering()? == Ordering::Less,
        Command::LessEq => ordering()? != Ordering::Greater,
        Command::Greater => ordering()? == Ordering::Greater,
        Command::GreaterEq => ordering()? != Ordering::Less,
        _ => return Err(RplError::TypeError),
    };
    Ok(Object::from_bool(truth))
}

fn truth_value(x: &Object) -> RplResult<bool> {
    if x.is_real() {
        Ok(compare(x, &Object::integer(0))? != Ordering::Equal)
    } else {
        Err(RplError::TypeError)
    }
}

fn logical(op: Command, x: &Object, y: &Object) -> RplResult<Object> {
    let (a, b) = (truth_value(x)?, truth_value(y)?);
    Ok(Object::from_bool(match op {
        Command::And => a && b,
        Command::Or => a || b,
        Command::Xor => a != b,
        _ => return Err(RplError::TypeError),
    }))
}

fn text(op: Command, x: &Object, y: &Object) -> RplResult<Option<Object>> {
    let repeat = |text: &str, count: &Object| -> RplResult<Object> {
        let count = count
            .to_i64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or(RplError::ValueError)?;
        Ok(Object::text(text.repeat(count)))
    };
    Ok(match (op, x, y) {
        (Command::Add, Object::Text(a), Object::Text(b)) => Some(Object::text(format!("{a}{b}"))),
        (Command::Mul, Object::Text(a), n) | (Command::Mul, n, Object::Text(a))
            if n.is_integer() =>
        {
            Some(repeat(a, n)?)
        }
        _ => None,
    })
}

fn unit(value: Object, unit: Vec<Object>) -> Object {
    Object::Unit(Unit {
        value: Box::new(value),
        unit,
    })
}

fn combine_units(a: &[Object], b: &[Object], op: Command) -> Vec<Object> {
    let mut items = a.to_vec();
    items.extend_from_slice(b);
    items.push(Object::Command(op));
    items
}

fn units(op: Command, x: &Object, y: &Object, settings: &Settings) -> RplResult<Object> {
    match (x, y) {
        (Object::Unit(a), Object::Unit(b)) => match op {
            Command::Add | Command::Sub => {
                if a.unit != b.unit {
                    return Err(RplError::InconsistentUnits);
                }
                Ok(unit(binary(op, &a.value, &b.value, settings)?, a.unit.clone()))
            }
            Command::Mul | Command::Div => Ok(unit(
                binary(op, &a.value, &b.value, settings)?,
                combine_units(&a.unit, &b.unit, op),
            )),
            Command::Same
            | Command::NotEqual
            | Command::Less
            | Command::LessEq
            | Command::Greater
            | Command::GreaterEq => {
                if a.unit != b.unit {
                    return Err(RplError::InconsistentUnits);
                }
                comparison(op, &a.value, &b.value, settings)
            }
            _ => Err(RplError::TypeError),
        },
        (Object::Unit(a), other) => match op {
            Command::Mul | Command::Div => Ok(unit(
                binary(op, &a.value, other, settings)?,
                a.unit.clone(),
            )),
            Command::Pow if other.is_integer() => Ok(unit(
                binary(op, &a.value, other, settings)?,
                combine_units(&a.unit, std::slice::from_ref(other), op),
            )),
            Command::Add | Command::Sub => Err(RplError::InconsistentUnits),
            _ => Err(RplError::TypeError),
        },
        (other, Object::Unit(b)) => match op {
            Command::Mul => Ok(unit(binary(op, other, &b.value, settings)?, b.unit.clone())),
            Command::Div => {
                let mut inverse = b.unit.clone();
                inverse.push(Object::Command(Command::Inv));
                Ok(unit(binary(op, other, &b.value, settings)?, inverse))
            }
            Command::Add | Command::Sub => Err(RplError::InconsistentUnits),
            _ => Err(RplError::TypeError),
        },
        _ => Err(RplError::TypeError),
    }
}

fn as_polynomial(x: &Object, settings: &Settings) -> Option<Polynomial> {
    match x {
        Object::Polynomial(p) => Some(p.clone()),
        _ => Polynomial::from_object(x, settings).ok(),
    }
}

fn polynomial_binary(
    op: Command,
    x: &Object,
    y: &Object,
    settings: &Settings,
) -> RplResult<Option<Object>> {
    match op {
        Command::Div | Command::Mod | Command::Rem => Err(RplError::Unimplemented),
        Command::Add | Command::Sub | Command::Mul => {
            let (Some(a), Some(b)) = (as_polynomial(x, settings), as_polynomial(y, settings)) else {
                return Ok(None);
            };
            let result = match op {
                Command::Add => a.add(&b, settings)?,
                Command::Sub => a.sub(&b, settings)?,
                _ => a.mul(&b, settings)?,
            };
            Ok(Some(Object::Polynomial(result)))
        }
        Command::Pow => {
            let (Some(a), Some(n)) = (
                as_polynomial(x, settings),
                y.to_i64().and_then(|n| u32::try_from(n).ok()),
            ) else {
                return Ok(None);
            };
            Ok(Some(Object::Polynomial(a.pow(n, settings)?)))
        }
        _ => Ok(None),
    }
}

fn real_binary(op: Command, x: &Object, y: &Object, settings: &Settings) -> RplResult<Object> {
    if let (Object::Integer(a), Object::Integer(b)) = (x, y) {
        let (a, b) = (*a, *b);
        let zero_check = || {
            if b.is_zero() {
                Err(RplError::ZeroDivide)
            } else {
                Ok(())
            }
        };
        let fast = match op {
            Command::Add => integer::add(a, b),
            Command::Sub => integer::sub(a, b),
            Command::Mul => integer::mul(a, b),
            Command::Div => {
                zero_check()?;
                integer::div(a, b)
            }
            Command::Rem => {
                zero_check()?;
                Some(integer::rem(a, b))
            }
            Command::Mod => {
                zero_check()?;
                integer::modulo(a, b)
            }
            Command::Pow if !b.is_negative() => {
                if a.is_zero() && b.is_zero() {
                    return Err(RplError::UndefinedOperation);
                }
                integer::pow(a, b.magnitude())
            }
            _ => None,
        };
        if let Some(result) = fast {
            return Ok(Object::Integer(result));
        }
    }

    if let (Some(a), Some(b)) = (x.to_bigint(), y.to_bigint()) {
        if let Some(result) = bignum::binary(op, &a, &b)? {
            return Ok(result);
        }
    }

    if let (Some(a), Some(b)) = (fraction::rational(x), fraction::rational(y)) {
        if let Some(result) = fraction::binary(op, &a, &b)? {
            return Ok(finish(result, settings));
        }
    }

    decimal::binary(op, x, y, settings)
}

/// `n`-th root of `x`, real for odd roots of negative numbers.
fn xroot(x: &Object, n: &Object, settings: &Settings) -> RplResult<Object> {
    if n.is_zero() {
        return Err(RplError::ZeroDivide);
    }
    if x.is_real() && x.is_negative() {
        if let Some(k) = integral_value(n) {
            if k.is_odd() {
                let root = xroot(&unary(Command::Neg, x, settings)?, n, settings)?;
                return unary(Command::Neg, &root, settings);
            }
        }
    }
    let inverse = unary(Command::Inv, n, settings)?;
    binary(Command::Pow, x, &inverse, settings)
}

/// Evaluate `x op y`.
pub fn binary(op: Command, x: &Object, y: &Object, settings: &Settings) -> RplResult<Object> {
    if matches!(op, Command::Equation | Command::Where) {
        return Ok(symbolic_binary(op, x, y));
    }
    if matches!(x, Object::Polynomial(_)) || matches!(y, Object::Polynomial(_)) {
        if let Some(result) = polynomial_binary(op, x, y, settings)? {
            return Ok(result);
        }
    }
    if x.is_symbolic() || y.is_symbolic() {
        return Ok(symbolic_binary(op, x, y));
    }
    if matches!(x, Object::Unit(_)) || matches!(y, Object::Unit(_)) {
        return units(op, x, y, settings);
    }
    if let Some(result) = text(op, x, y)? {
        return Ok(result);
    }

    match op {
        Command::Same
        | Command::NotEqual
        | Command::Less
        | Command::LessEq
        | Command::Greater
        | Command::GreaterEq => return comparison(op, x, y, settings),
        Command::And | Command::Or | Command::Xor => return logical(op, x, y),
        Command::Xroot if x.is_number() && y.is_real() => return xroot(x, y, settings),
        _ => {}
    }

    if !x.is_number() || !y.is_number() {
        return Err(RplError::TypeError);
    }
    if matches!(x, Object::Complex(_)) || matches!(y, Object::Complex(_)) {
        return complex::binary(op, x, y, settings);
    }
    if op == Command::Pow && x.is_negative() && integral_value(y).is_none() {
        return complex::binary(op, x, y, settings);
    }
    real_binary(op, x, y, settings)
}

/// Negate a real number.
pub fn negate(x: &Object) -> RplResult<Object> {
    Ok(match x {
        Object::Integer(i) => Object::Integer(i.negated()),
        Object::Bignum(b) => Object::from_bigint(-b),
        Object::Fraction(f) => Object::Fraction(f.negated()),
        Object::Decimal(d) => Object::Decimal(Decimal {
            value: -d.value.clone(),
            precision: d.precision,
        }),
        _ => return Err(RplError::TypeError),
    })
}

fn real_unary(op: Command, x: &Object, settings: &Settings) -> RplResult<Object> {
    let precision = decimal::precision_of(x, settings);
    let value = || decimal::to_bigdecimal(x).ok_or(RplError::TypeError);
    let result = match op {
        Command::Neg => negate(x)?,
        Command::Abs if x.is_negative() => negate(x)?,
        Command::Abs => x.clone(),
        Command::Inv => binary(Command::Div, &Object::integer(1), x, settings)?,
        Command::Sq => binary(Command::Mul, x, x, settings)?,
        Command::Cube => {
            let square = binary(Command::Mul, x, x, settings)?;
            binary(Command::Mul, &square, x, settings)?
        }
        Command::Not => Object::from_bool(!truth_value(x)?),
        Command::Fact => match x {
            Object::Decimal(d) => {
                let n = decimal::integral(&d.value).ok_or(RplError::ValueError)?;
                let exact = bignum::factorial(&n)?;
                decimal::to_bigdecimal(&exact)
                    .map(|v| Object::decimal(v, d.precision))
                    .ok_or(RplError::TypeError)?
            }
            Object::Fraction(_) => return Err(RplError::ValueError),
            _ => bignum::factorial(&x.to_bigint().ok_or(RplError::TypeError)?)?,
        },
        Command::Sqrt if x.is_negative() => {
            let root = real_unary(Command::Sqrt, &negate(x)?, settings)?;
            complex::rectangular(Object::integer(0), root)
        }
        Command::Sqrt => match fraction::rational(x).and_then(|q| fraction::sqrt(&q)) {
            Some(exact) => exact,
            None => decimal::function(op, &value()?, precision)?,
        },
        Command::Ln | Command::Log if x.is_negative() => {
            complex::unary(op, &complex::rectangular_object(x.clone()), settings)?
        }
        Command::Ln | Command::Log if x.is_one() => Object::integer(0),
        Command::Exp | Command::Cos if x.is_zero() && x.is_exact() => Object::integer(1),
        Command::Sin | Command::Tan | Command::Asin | Command::Atan
            if x.is_zero() && x.is_exact() =>
        {
            Object::integer(0)
        }
        Command::Alog if x.is_exact() => {
            binary(Command::Pow, &Object::integer(10), x, settings)?
        }
        Command::Sin
        | Command::Cos
        | Command::Tan
        | Command::Asin
        | Command::Acos
        | Command::Atan
        | Command::Exp
        | Command::Ln
        | Command::Log
        | Command::Alog => decimal::function(op, &value()?, precision)?,
        _ => return Err(RplError::TypeError),
    };
    Ok(finish(result, settings))
}

fn polynomial_unary(op: Command, p: &Polynomial, settings: &Settings) -> RplResult<Option<Object>> {
    Ok(match op {
        Command::Neg => Some(Object::Polynomial(p.neg(settings)?)),
        Command::Sq => Some(Object::Polynomial(p.pow(2, settings)?)),
        Command::Cube => Some(Object::Polynomial(p.pow(3, settings)?)),
        Command::Inv => return Err(RplError::Unimplemented),
        _ => None,
    })
}

/// Evaluate `op x`.
pub fn unary(op: Command, x: &Object, settings: &Settings) -> RplResult<Object> {
    if let Object::Polynomial(p) = x {
        if let Some(result) = polynomial_unary(op, p, settings)? {
            return Ok(result);
        }
    }
    if x.is_symbolic() {
        return Ok(symbolic_unary(op, x));
    }
    match x {
        Object::Unit(u) => match op {
            Command::Neg | Command::Abs => Ok(unit(unary(op, &u.value, settings)?, u.unit.clone())),
            Command::Sq | Command::Cube => {
                let power = if op == Command::Sq { 2 } else { 3 };
                binary(Command::Pow, x, &Object::integer(power), settings)
            }
            _ => Err(RplError::TypeError),
        },
        Object::Complex(_) => complex::unary(op, x, settings),
        _ if x.is_real() => real_unary(op, x, settings),
        _ => Err(RplError::TypeError),
    }
}

/// Convert numbers to decimals at their precision tier, element-wise for lists and arrays.
pub fn to_decimal(x: &Object, settings: &Settings) -> RplResult<Object> {
    Ok(match x {
        Object::Decimal(_) => x.clone(),
        _ if x.is_real() => {
            let value: BigDecimal = decimal::to_bigdecimal(x).ok_or(RplError::TypeError)?;
            Object::decimal(value, settings.precision)
        }
        Object::Complex(c) => {
            let (a, b) = c.parts();
            let (a, b) = (to_decimal(a, settings)?, to_decimal(b, settings)?);
            Object::Complex(match c {
                Complex::Rectangular(..) => Complex::rectangular(a, b),
                Complex::Polar(..) => Complex::polar(a, b),
            })
        }
        Object::Unit(u) => unit(to_decimal(&u.value, settings)?, u.unit.clone()),
        Object::List(items) => Object::List(
            items
                .iter()
                .map(|item| to_decimal(item, settings))
                .collect::<RplResult<_>>()?,
        ),
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| to_decimal(item, settings))
                .collect::<RplResult<_>>()?,
        ),
        _ => return Err(RplError::TypeError),
    })
}

/// Real value as a decimal, for the solver and numeric conversions.
pub fn real_value(x: &Object) -> Option<BigDecimal> {
    decimal::to_bigdecimal(x)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::settings::Precision;

    fn s() -> Settings {
        Settings::default()
    }

    fn frac(a: i64, b: i64) -> Object {
        fraction::make(BigInt::from(a), BigInt::from(b)).unwrap()
    }

    fn dec(text: &str) -> Object {
        Object::decimal(BigDecimal::from_str(text).unwrap(), Precision::Decimal64)
    }

    #[test]
    fn integer_overflow_escalates() {
        let max = Object::from_u64(u64::MAX);
        let sum = add(&max, &Object::integer(1), &s()).unwrap();
        assert_eq!(sum.to_bigint().unwrap(), BigInt::from(u64::MAX) + 1);
        assert!(matches!(sum, Object::Bignum(_)));
        let back = sub(&sum, &Object::integer(1), &s()).unwrap();
        assert_eq!(back, max);
    }

    #[test]
    fn division_stays_exact() {
        assert_eq!(div(&Object::integer(6), &Object::integer(3), &s()).unwrap(), Object::integer(2));
        assert_eq!(div(&Object::integer(1), &Object::integer(3), &s()).unwrap(), frac(1, 3));
        assert!(matches!(
            div(&Object::integer(1), &Object::integer(0), &s()),
            Err(RplError::ZeroDivide)
        ));
    }

    #[test]
    fn numerical_results_mode() {
        let settings = Settings {
            numerical_results: true,
            ..s()
        };
        let third = div(&Object::integer(1), &Object::integer(4), &settings).unwrap();
        assert_eq!(third, dec("0.25"));
        assert_eq!(div(&Object::integer(8), &Object::integer(4), &settings).unwrap(), Object::integer(2));
    }

    #[test]
    fn powers() {
        let two = Object::integer(2);
        assert_eq!(pow(&two, &Object::integer(-2), &s()).unwrap(), frac(1, 4));
        assert!(matches!(
            pow(&Object::integer(0), &Object::integer(0), &s()),
            Err(RplError::UndefinedOperation)
        ));
        let big = pow(&two, &Object::integer(100), &s()).unwrap();
        assert_eq!(big.to_bigint().unwrap(), BigInt::from(2).pow(100));
        let root = pow(&Object::integer(-4), &frac(1, 2), &s()).unwrap();
        assert!(matches!(root, Object::Complex(_)));
    }

    #[test]
    fn mixed_decimal_and_exact() {
        let sum = add(&dec("0.5"), &frac(1, 4), &s()).unwrap();
        assert_eq!(sum, dec("0.75"));
        assert_eq!(compare(&frac(1, 3), &dec("0.3")).unwrap(), Ordering::Greater);
    }

    #[test]
    fn unary_exactness() {
        let settings = s();
        assert_eq!(unary(Command::Sqrt, &frac(9, 4), &settings).unwrap(), frac(3, 2));
        assert_eq!(
            unary(Command::Fact, &Object::integer(5), &settings).unwrap(),
            Object::integer(120)
        );
        assert_eq!(unary(Command::Inv, &Object::integer(4), &settings).unwrap(), frac(1, 4));
        assert_eq!(unary(Command::Exp, &Object::integer(0), &settings).unwrap(), Object::integer(1));
        assert_eq!(
            unary(Command::Alog, &Object::integer(3), &settings).unwrap(),
            Object::integer(1000)
        );
        let root = unary(Command::Sqrt, &Object::integer(-4), &settings).unwrap();
        assert_eq!(
            root,
            complex::rectangular(Object::integer(0), Object::integer(2))
        );
    }

    #[test]
    fn xroot_of_negative_odd() {
        let r = binary(Command::Xroot, &Object::integer(-8), &Object::integer(3), &s()).unwrap();
        assert_eq!(r, Object::integer(-2));
    }

    #[test]
    fn text_and_comparisons() {
        let settings = s();
        let ab = add(&Object::text("a"), &Object::text("b"), &settings).unwrap();
        assert_eq!(ab, Object::text("ab"));
        let rep = mul(&Object::integer(3), &Object::text("ab"), &settings).unwrap();
        assert_eq!(rep, Object::text("ababab"));
        let lt = binary(Command::Less, &frac(1, 3), &frac(1, 2), &settings).unwrap();
        assert_eq!(lt, Object::integer(1));
        let same = binary(Command::Same, &Object::integer(2), &dec("2"), &settings).unwrap();
        assert_eq!(same, Object::integer(1));
    }

    #[test]
    fn symbolic_operands_build_expressions() {
        let x = Object::symbol("X");
        let e = add(&x, &Object::integer(1), &s()).unwrap();
        assert_eq!(
            e,
            Object::Expression(vec![x.clone(), Object::integer(1), Command::Add.into()])
        );
        let eq = binary(Command::Equation, &Object::integer(1), &Object::integer(2), &s()).unwrap();
        assert!(matches!(eq, Object::Expression(_)));
    }

    #[test]
    fn units_need_matching_dimensions() {
        let metres = |v: i64| unit(Object::integer(v), vec![Object::symbol("m")]);
        let settings = s();
        assert_eq!(add(&metres(2), &metres(3), &settings).unwrap(), metres(5));
        assert_eq!(mul(&metres(2), &Object::integer(3), &settings).unwrap(), metres(6));
        let seconds = unit(Object::integer(1), vec![Object::symbol("s")]);
        assert!(matches!(
            add(&metres(1), &seconds, &settings),
            Err(RplError::InconsistentUnits)
        ));
        assert!(matches!(
            add(&metres(1), &Object::integer(1), &settings),
            Err(RplError::InconsistentUnits)
        ));
    }
}
