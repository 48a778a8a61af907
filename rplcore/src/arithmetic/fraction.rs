//! Exact rational arithmetic.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_integer::Integer as _;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::{
    command::Command,
    error::{RplError, RplResult},
    object::{Fraction, Object},
};

pub type Rational = (BigInt, BigInt);

/// Build the reduced form of `num / den`, which is an integer when `den` divides `num`.
pub fn make(num: BigInt, den: BigInt) -> RplResult<Object> {
    if den.is_zero() {
        return Err(RplError::ZeroDivide);
    }
    let g = num.gcd(&den);
    let (mut num, mut den) = (num / &g, den / &g);
    if den.is_negative() {
        num = -num;
        den = -den;
    }
    if den.is_one() {
        return Ok(Object::from_bigint(num));
    }
    Ok(Object::Fraction(Fraction {
        negative: num.is_negative(),
        num: num.magnitude().clone(),
        den: den.magnitude().clone(),
    }))
}

/// Numerator and denominator of an exact number.
pub fn rational(object: &Object) -> Option<Rational> {
    match object {
        Object::Integer(i) => Some((i.to_bigint(), BigInt::one())),
        Object::Bignum(b) => Some((b.clone(), BigInt::one())),
        Object::Fraction(f) => Some((f.numerator(), f.denominator())),
        _ => None,
    }
}

pub fn cmp((a, b): &Rational, (c, d): &Rational) -> Ordering {
    (a * d).cmp(&(c * b))
}

fn quotient((a, b): &Rational, (c, d): &Rational, floor: bool) -> RplResult<BigInt> {
    if c.is_zero() {
        return Err(RplError::ZeroDivide);
    }
    let (n, m) = (a * d, b * c);
    Ok(if floor { n.div_floor(&m) } else { n / m })
}

/// Exact root of a non-negative integer, if it has one.
fn exact_root(value: &BigInt, n: u32) -> Option<BigInt> {
    if value.is_negative() {
        return None;
    }
    let root = value.nth_root(n);
    (root.pow(n) == *value).then_some(root)
}

fn pow(base: &Rational, exponent: &Rational) -> RplResult<Option<Object>> {
    let (a, b) = base;
    let (c, d) = exponent;
    if a.is_zero() {
        return match c.sign() {
            num_bigint::Sign::NoSign => Err(RplError::UndefinedOperation),
            num_bigint::Sign::Minus => Err(RplError::ZeroDivide),
            num_bigint::Sign::Plus => Ok(Some(Object::integer(0))),
        };
    }

    // Rational exponent: only exact when both parts have an exact root.
    let (a, b) = if d.is_one() {
        (a.clone(), b.clone())
    } else {
        let Some(n) = d.to_u32().filter(|n| *n <= 64) else {
            return Ok(None);
        };
        match (exact_root(a, n), exact_root(b, n)) {
            (Some(ra), Some(rb)) => (ra, rb),
            _ => return Ok(None),
        }
    };

    let e = c.magnitude().to_u32().ok_or(RplError::OutOfMemory)?;
    let bits = a.bits().max(b.bits()).saturating_mul(e as u64);
    if bits > 1 << 22 {
        return Err(RplError::OutOfMemory);
    }
    let (num, den) = (a.pow(e), b.pow(e));
    make_opt(if c.is_negative() { (den, num) } else { (num, den) })
}

fn make_opt((num, den): Rational) -> RplResult<Option<Object>> {
    make(num, den).map(Some)
}

/// Exact result of `x op y`, `None` when the result is not rational.
pub fn binary(op: Command, x: &Rational, y: &Rational) -> RplResult<Option<Object>> {
    let (a, b) = x;
    let (c, d) = y;
    match op {
        Command::Add => make_opt((a * d + c * b, b * d)),
        Command::Sub => make_opt((a * d - c * b, b * d)),
        Command::Mul => make_opt((a * c, b * d)),
        Command::Div => {
            if c.is_zero() {
                return Err(RplError::ZeroDivide);
            }
            make_opt((a * d, b * c))
        }
        Command::Mod | Command::Rem => {
            let q = quotient(x, y, op == Command::Mod)?;
            make_opt((a * d - q * c * b, b * d))
        }
        Command::Pow => pow(x, y),
        _ => Ok(None),
    }
}

/// Exact square root of a non-negative rational, if it has one.
pub fn sqrt((a, b): &Rational) -> Option<Object> {
    let (ra, rb) = (exact_root(a, 2)?, exact_root(b, 2)?);
    make(ra, rb).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(a: i64, b: i64) -> Rational {
        (BigInt::from(a), BigInt::from(b))
    }

    fn frac(a: i64, b: i64) -> Object {
        make(BigInt::from(a), BigInt::from(b)).unwrap()
    }

    #[test]
    fn make_reduces_and_normalizes_sign() {
        let Object::Fraction(f) = frac(6, -8) else {
            panic!("expected a fraction");
        };
        assert!(f.is_negative());
        assert_eq!(f.numerator(), BigInt::from(-3));
        assert_eq!(f.denominator(), BigInt::from(4));
        assert_eq!(frac(8, 4), Object::integer(2));
        assert_eq!(frac(0, 5), Object::integer(0));
        assert!(matches!(make(BigInt::from(1), BigInt::from(0)), Err(RplError::ZeroDivide)));
    }

    #[test]
    fn exact_operations() {
        assert_eq!(binary(Command::Add, &q(1, 3), &q(1, 6)).unwrap(), Some(frac(1, 2)));
        assert_eq!(binary(Command::Sub, &q(1, 3), &q(1, 3)).unwrap(), Some(Object::integer(0)));
        assert_eq!(binary(Command::Div, &q(2, 3), &q(4, 9)).unwrap(), Some(frac(3, 2)));
        assert_eq!(binary(Command::Mod, &q(-7, 2), &q(2, 1)).unwrap(), Some(frac(1, 2)));
        assert_eq!(binary(Command::Rem, &q(-7, 2), &q(2, 1)).unwrap(), Some(frac(-3, 2)));
    }

    #[test]
    fn powers() {
        assert_eq!(binary(Command::Pow, &q(2, 1), &q(-3, 1)).unwrap(), Some(frac(1, 8)));
        assert_eq!(binary(Command::Pow, &q(4, 9), &q(1, 2)).unwrap(), Some(frac(2, 3)));
        assert_eq!(binary(Command::Pow, &q(2, 1), &q(1, 2)).unwrap(), None);
        assert!(matches!(binary(Command::Pow, &q(0, 1), &q(-1, 1)), Err(RplError::ZeroDivide)));
        assert!(matches!(
            binary(Command::Pow, &q(0, 1), &q(0, 1)),
            Err(RplError::UndefinedOperation)
        ));
    }

    #[test]
    fn ordering_and_roots() {
        assert_eq!(cmp(&q(1, 3), &q(1, 2)), Ordering::Less);
        assert_eq!(cmp(&q(-1, 2), &q(-2, 4)), Ordering::Equal);
        assert_eq!(sqrt(&q(9, 4)), Some(frac(3, 2)));
        assert_eq!(sqrt(&q(2, 1)), None);
    }
}
