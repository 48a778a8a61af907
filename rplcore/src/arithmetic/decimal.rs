//! Decimal arithmetic and transcendental functions.
//!
//! Results are computed with a few guard digits above the precision tier and
//! rounded when wrapped into a [`Decimal`](crate::object::Decimal).

use std::{cmp::Ordering, str::FromStr};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_integer::Integer as _;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::{
    command::Command,
    error::{RplError, RplResult},
    object::Object,
    settings::{Precision, Settings},
};

const GUARD_DIGITS: u64 = 8;

/// Exponents beyond this magnitude overflow the decimal range.
const EXP_LIMIT: i64 = 1_000_000_000;

/// Largest integer, in digits, built from a decimal value.
const INTEGRAL_DIGITS: u64 = 1000;

/// Powers with more exponent digits than this cannot be represented.
const POWER_DIGITS: i64 = 18;

pub fn precision_of(object: &Object, settings: &Settings) -> Precision {
    match object {
        Object::Decimal(d) => d.precision,
        _ => settings.precision,
    }
}

/// Precision of an operation: the widest operand tier.
pub fn tier(x: &Object, y: &Object, settings: &Settings) -> Precision {
    precision_of(x, settings).max(precision_of(y, settings))
}

pub fn working_digits(precision: Precision) -> u64 {
    precision.digits() + GUARD_DIGITS
}

pub fn to_bigdecimal(object: &Object) -> Option<BigDecimal> {
    match object {
        Object::Integer(i) => Some(BigDecimal::from(i.to_bigint())),
        Object::Bignum(b) => Some(BigDecimal::from(b.clone())),
        Object::Fraction(f) => {
            Some(BigDecimal::from(f.numerator()) / BigDecimal::from(f.denominator()))
        }
        Object::Decimal(d) => Some(d.value.clone()),
        _ => None,
    }
}

fn pow10(n: u64) -> RplResult<BigInt> {
    match u32::try_from(n) {
        Ok(n) if u64::from(n) <= INTEGRAL_DIGITS => Ok(BigInt::from(10).pow(n)),
        _ => Err(RplError::ValueError),
    }
}

/// Integer part of `x` below one in magnitude, rounded by `floor`.
fn small(x: &BigDecimal, floor: bool) -> Option<BigInt> {
    (exponent10(x) < 0 && !x.is_zero()).then(|| {
        if floor && x.is_negative() {
            -BigInt::one()
        } else {
            BigInt::zero()
        }
    })
}

/// Decimal exponent of the leading digit: `exponent10(1234.5) == 3`.
pub fn exponent10(x: &BigDecimal) -> i64 {
    if x.is_zero() {
        return 0;
    }
    let (mantissa, scale) = x.as_bigint_and_exponent();
    let digits = mantissa.magnitude().to_string().len() as i64;
    digits - 1 - scale
}

pub fn floor(x: &BigDecimal) -> RplResult<BigInt> {
    if let Some(n) = small(x, true) {
        return Ok(n);
    }
    let (mantissa, scale) = x.as_bigint_and_exponent();
    if scale <= 0 {
        Ok(mantissa * pow10(scale.unsigned_abs())?)
    } else {
        Ok(mantissa.div_floor(&pow10(scale as u64)?))
    }
}

pub fn trunc(x: &BigDecimal) -> RplResult<BigInt> {
    if let Some(n) = small(x, false) {
        return Ok(n);
    }
    let (mantissa, scale) = x.as_bigint_and_exponent();
    if scale <= 0 {
        Ok(mantissa * pow10(scale.unsigned_abs())?)
    } else {
        Ok(mantissa / pow10(scale as u64)?)
    }
}

/// Integer value of `x`, if it has no fractional part and a usable size.
pub fn integral(x: &BigDecimal) -> Option<BigInt> {
    if small(x, false).is_some() {
        return None;
    }
    let (mantissa, scale) = x.as_bigint_and_exponent();
    if scale <= 0 {
        return Some(mantissa * pow10(scale.unsigned_abs()).ok()?);
    }
    let (q, r) = mantissa.div_rem(&pow10(scale as u64).ok()?);
    r.is_zero().then_some(q)
}

fn negligible(term: &BigDecimal, sum: &BigDecimal, digits: u64) -> bool {
    term.is_zero() || (!sum.is_zero() && exponent10(term) < exponent10(sum) - digits as i64 - 1)
}

fn half() -> BigDecimal {
    BigDecimal::new(BigInt::from(5), 1)
}

pub fn exp(x: &BigDecimal, digits: u64) -> RplResult<BigDecimal> {
    if x.is_zero() {
        return Ok(BigDecimal::one());
    }
    if exponent10(x) > 9 || x.abs() > BigDecimal::from(EXP_LIMIT) {
        return if x.is_negative() {
            Ok(BigDecimal::zero())
        } else {
            Err(RplError::ValueError)
        };
    }

    let half = half();
    let mut r = x.clone();
    let mut halvings = 0u64;
    while r.abs() > half {
        r = &r * &half;
        halvings += 1;
    }

    let work = digits + 4 + halvings * 3 / 10;
    let mut sum = BigDecimal::one();
    let mut term = BigDecimal::one();
    let mut n = 1u32;
    loop {
        term = (&term * &r / BigDecimal::from(n)).with_prec(work);
        if negligible(&term, &sum, work) {
            break;
        }
        sum += &term;
        n += 1;
    }
    for _ in 0..halvings {
        sum = (&sum * &sum).with_prec(work);
    }
    Ok(sum.with_prec(digits))
}

/// `atanh(z) * 2`, the series behind [`ln`].
fn ln_series(m: &BigDecimal, work: u64) -> BigDecimal {
    let z = ((m - BigDecimal::one()) / (m + BigDecimal::one())).with_prec(work);
    let z2 = (&z * &z).with_prec(work);
    let mut power = z.clone();
    let mut sum = z;
    let mut n = 1u32;
    loop {
        power = (&power * &z2).with_prec(work);
        n += 2;
        let term = (&power / BigDecimal::from(n)).with_prec(work);
        if negligible(&term, &sum, work) {
            break;
        }
        sum += term;
    }
    sum * BigDecimal::from(2)
}

/// Natural logarithm of a positive value.
pub fn ln(x: &BigDecimal, digits: u64) -> RplResult<BigDecimal> {
    if !x.is_positive() {
        return Err(RplError::ValueError);
    }
    if x.is_one() {
        return Ok(BigDecimal::zero());
    }

    let work = digits + 6;
    // x = m * 10^e with m in [1, 10)
    let e = exponent10(x);
    let (mantissa, scale) = x.as_bigint_and_exponent();
    let m = BigDecimal::new(mantissa, scale + e);

    let mantissa_ln = reduced_ln(&m, work)?;
    let result = if e == 0 {
        mantissa_ln
    } else {
        mantissa_ln + reduced_ln(&BigDecimal::from(10), work)? * BigDecimal::from(e)
    };
    Ok(result.with_prec(digits))
}

/// `ln(m)` by repeated square roots until `m` is close to one.
fn reduced_ln(m: &BigDecimal, work: u64) -> RplResult<BigDecimal> {
    let close = BigDecimal::new(BigInt::one(), 1);
    let mut m = m.clone();
    let mut roots = 0u32;
    while (&m - BigDecimal::one()).abs() > close {
        m = m.sqrt().ok_or(RplError::ValueError)?.with_prec(work + 4);
        roots += 1;
    }
    Ok(ln_series(&m, work + 4) * BigDecimal::from(1u64 << roots))
}

fn atan_series(x: &BigDecimal, work: u64) -> BigDecimal {
    let x2 = (x * x).with_prec(work);
    let mut power = x.clone();
    let mut sum = x.clone();
    let mut n = 1u32;
    let mut negative = true;
    loop {
        power = (&power * &x2).with_prec(work);
        n += 2;
        let term = (&power / BigDecimal::from(n)).with_prec(work);
        if negligible(&term, &sum, work) {
            break;
        }
        if negative {
            sum -= term;
        } else {
            sum += term;
        }
        negative = !negative;
    }
    sum
}

pub fn pi(digits: u64) -> BigDecimal {
    let work = digits + 6;
    let fifth = BigDecimal::new(BigInt::from(2), 1);
    let inv239 = (BigDecimal::one() / BigDecimal::from(239)).with_prec(work);
    let pi = atan_series(&fifth, work) * BigDecimal::from(16)
        - atan_series(&inv239, work) * BigDecimal::from(4);
    pi.with_prec(digits)
}

pub fn atan(x: &BigDecimal, digits: u64) -> RplResult<BigDecimal> {
    if x.is_zero() {
        return Ok(BigDecimal::zero());
    }
    let work = digits + 6;
    if x.abs() > BigDecimal::one() {
        let quarter_turn = pi(work) * &half();
        let inverse = atan(&(BigDecimal::one() / x).with_prec(work), work)?;
        let result = if x.is_negative() {
            -quarter_turn - inverse
        } else {
            quarter_turn - inverse
        };
        return Ok(result.with_prec(digits));
    }

    // atan(x) = 2 atan(x / (1 + sqrt(1 + x²)))
    let limit = BigDecimal::new(BigInt::from(2), 1);
    let mut r = x.clone();
    let mut doublings = 0u32;
    while r.abs() > limit {
        let root = (BigDecimal::one() + &r * &r).sqrt().ok_or(RplError::ValueError)?;
        r = (&r / (BigDecimal::one() + root)).with_prec(work);
        doublings += 1;
    }
    Ok((atan_series(&r, work) * BigDecimal::from(1u32 << doublings)).with_prec(digits))
}

pub fn atan2(y: &BigDecimal, x: &BigDecimal, digits: u64) -> RplResult<BigDecimal> {
    let work = digits + 4;
    if x.is_zero() {
        return Ok(match y.sign() {
            num_bigint::Sign::NoSign => BigDecimal::zero(),
            num_bigint::Sign::Plus => (pi(work) * half()).with_prec(digits),
            num_bigint::Sign::Minus => (-pi(work) * half()).with_prec(digits),
        });
    }
    let base = atan(&(y / x).with_prec(work), work)?;
    let result = if x.is_positive() {
        base
    } else if y.is_negative() {
        base - pi(work)
    } else {
        base + pi(work)
    };
    Ok(result.with_prec(digits))
}

/// Reduce an angle into `[-π, π]`.
fn reduce_angle(x: &BigDecimal, work: u64) -> RplResult<BigDecimal> {
    let extra = exponent10(x).max(0) as u64;
    if extra > INTEGRAL_DIGITS {
        return Err(RplError::ValueError);
    }
    let two_pi = pi(work + extra) * BigDecimal::from(2);
    let turns = floor(&(x / &two_pi + half()))?;
    Ok((x - two_pi * BigDecimal::from(turns)).with_prec(work))
}

fn trig_series(r: &BigDecimal, start: BigDecimal, first: u32, work: u64) -> BigDecimal {
    let r2 = (r * r).with_prec(work);
    let mut term = start.clone();
    let mut sum = start;
    let mut n = first;
    loop {
        term = (-(&term * &r2) / BigDecimal::from((n + 1) * (n + 2))).with_prec(work);
        n += 2;
        if negligible(&term, &sum, work) {
            break;
        }
        sum += &term;
    }
    sum
}

pub fn sin(x: &BigDecimal, digits: u64) -> RplResult<BigDecimal> {
    if x.is_zero() {
        return Ok(BigDecimal::zero());
    }
    let work = digits + 6;
    let r = reduce_angle(x, work)?;
    if r.is_zero() {
        return Ok(BigDecimal::zero());
    }
    Ok(trig_series(&r, r.clone(), 1, work).with_prec(digits))
}

pub fn cos(x: &BigDecimal, digits: u64) -> RplResult<BigDecimal> {
    let work = digits + 6;
    let r = reduce_angle(x, work)?;
    Ok(trig_series(&r, BigDecimal::one(), 0, work).with_prec(digits))
}

pub fn sqrt(x: &BigDecimal, digits: u64) -> RplResult<BigDecimal> {
    if x.is_negative() {
        return Err(RplError::ValueError);
    }
    if x.is_zero() {
        return Ok(BigDecimal::zero());
    }
    Ok(x.sqrt().ok_or(RplError::ValueError)?.with_prec(digits))
}

/// `x^n` for an integer exponent by square-and-multiply.
pub fn powi(x: &BigDecimal, n: &BigInt, digits: u64) -> RplResult<BigDecimal> {
    if x.is_zero() {
        return match n.sign() {
            num_bigint::Sign::NoSign => Err(RplError::UndefinedOperation),
            num_bigint::Sign::Minus => Err(RplError::ZeroDivide),
            num_bigint::Sign::Plus => Ok(BigDecimal::zero()),
        };
    }
    let Some(mut e) = n.magnitude().to_u64() else {
        return Err(RplError::ValueError);
    };
    let work = digits + 6 + 64 - e.leading_zeros() as u64;
    let mut base = x.clone();
    let mut result = BigDecimal::one();
    while e > 0 {
        if e & 1 == 1 {
            result = (&result * &base).with_prec(work);
        }
        e >>= 1;
        if e > 0 {
            base = (&base * &base).with_prec(work);
        }
    }
    if n.is_negative() {
        result = BigDecimal::one() / result;
    }
    Ok(result.with_prec(digits))
}

/// `x^y` for a non-negative base or an integral exponent.
pub fn pow(x: &BigDecimal, y: &BigDecimal, digits: u64) -> RplResult<BigDecimal> {
    if exponent10(y) > POWER_DIGITS {
        return if x.is_zero() && y.is_positive() {
            Ok(BigDecimal::zero())
        } else {
            Err(RplError::ValueError)
        };
    }
    if let Some(n) = integral(y) {
        return powi(x, &n, digits);
    }
    if x.is_zero() {
        return if y.is_positive() {
            Ok(BigDecimal::zero())
        } else {
            Err(RplError::ZeroDivide)
        };
    }
    if x.is_negative() {
        return Err(RplError::ValueError);
    }
    let work = digits + 6;
    let product = (y * ln(x, work + exponent10(y).max(0) as u64)?).with_prec(work);
    Ok(exp(&product, work)?.with_prec(digits))
}

pub fn cmp(x: &BigDecimal, y: &BigDecimal) -> Ordering {
    x.cmp(y)
}

/// Decimal result of `x op y` for two real operands.
pub fn binary(op: Command, x: &Object, y: &Object, settings: &Settings) -> RplResult<Object> {
    let precision = tier(x, y, settings);
    let digits = working_digits(precision);
    let (Some(a), Some(b)) = (to_bigdecimal(x), to_bigdecimal(y)) else {
        return Err(RplError::TypeError);
    };
    let nonzero = |b: &BigDecimal| {
        if b.is_zero() {
            Err(RplError::ZeroDivide)
        } else {
            Ok(())
        }
    };

    let value = match op {
        Command::Add => a + b,
        Command::Sub => a - b,
        Command::Mul => a * b,
        Command::Div => {
            nonzero(&b)?;
            a / b
        }
        Command::Mod | Command::Rem => {
            nonzero(&b)?;
            let spread = exponent10(&a) - exponent10(&b);
            if spread > INTEGRAL_DIGITS as i64 {
                return Err(RplError::ValueError);
            }
            let q = (&a / &b).with_prec(digits + spread.max(0) as u64);
            let q = if op == Command::Mod { floor(&q)? } else { trunc(&q)? };
            a - b * BigDecimal::from(q)
        }
        Command::Pow => pow(&a, &b, digits)?,
        Command::Hypot => sqrt(&(&a * &a + &b * &b), digits)?,
        Command::Atan2 => atan2(&a, &b, digits)?,
        _ => return Err(RplError::TypeError),
    };
    Ok(Object::decimal(value, precision))
}

/// Apply a real function to a decimal value.
pub fn function(op: Command, x: &BigDecimal, precision: Precision) -> RplResult<Object> {
    let digits = working_digits(precision);
    let value = match op {
        Command::Sqrt => sqrt(x, digits)?,
        Command::Sin => sin(x, digits)?,
        Command::Cos => cos(x, digits)?,
        Command::Tan => {
            let c = cos(x, digits)?;
            if c.is_zero() {
                return Err(RplError::ZeroDivide);
            }
            sin(x, digits)? / c
        }
        Command::Asin | Command::Acos => {
            let one = BigDecimal::one();
            if x.abs() > one {
                return Err(RplError::ValueError);
            }
            let quarter_turn = pi(digits) * half();
            let asin = if x.abs() == one {
                if x.is_negative() { -quarter_turn.clone() } else { quarter_turn.clone() }
            } else {
                let root = sqrt(&(&one - x * x), digits)?;
                atan(&(x / root).with_prec(digits), digits)?
            };
            if op == Command::Asin { asin } else { quarter_turn - asin }
        }
        Command::Atan => atan(x, digits)?,
        Command::Exp => exp(x, digits)?,
        Command::Ln => ln(x, digits)?,
        Command::Log => ln(x, digits)? / ln(&BigDecimal::from(10), digits)?,
        Command::Alog => pow(&BigDecimal::from(10), x, digits)?,
        _ => return Err(RplError::TypeError),
    };
    Ok(Object::decimal(value, precision))
}

/// Parse a decimal literal such as `1.5`, `2.` or `1E-3`.
pub fn parse_literal(text: &str) -> Option<BigDecimal> {
    let normalized = text.replace('⁳', "E").replace(".E", "E").replace(".e", "e");
    let normalized = normalized.strip_suffix('.').unwrap_or(&normalized);
    let normalized = if normalized.starts_with('.') {
        format!("0{normalized}")
    } else {
        normalized.to_string()
    };
    BigDecimal::from_str(&normalized).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn close(a: &BigDecimal, b: &str, digits: i64) {
        let diff = (a - d(b)).abs();
        assert!(
            diff < BigDecimal::new(BigInt::one(), digits),
            "{a} differs from {b}"
        );
    }

    #[test]
    fn constants() {
        close(&pi(30), "3.14159265358979323846264338327950", 28);
        close(&exp(&BigDecimal::one(), 24).unwrap(), "2.71828182845904523536028747", 22);
        close(&ln(&BigDecimal::from(10), 24).unwrap(), "2.30258509299404568401799145", 22);
    }

    #[test]
    fn logarithm_inverts_exponential() {
        for text in ["0.001", "0.5", "3", "123.456", "1E20"] {
            let x = d(text);
            let back = exp(&ln(&x, 30).unwrap(), 30).unwrap();
            let rel = ((&back - &x) / &x).abs();
            assert!(rel < d("1E-25"), "exp(ln({text})) = {back}");
        }
        assert!(ln(&BigDecimal::zero(), 16).is_err());
    }

    #[test]
    fn trigonometry() {
        close(&sin(&d("0.5"), 24).unwrap(), "0.479425538604203000273287935", 22);
        close(&cos(&d("0.5"), 24).unwrap(), "0.877582561890372716116281582", 22);
        close(&atan(&d("1"), 24).unwrap(), "0.785398163397448309615660845", 22);
        close(&atan(&d("-7"), 24).unwrap(), "-1.42889927219073269641847007", 22);
        close(&sin(&d("100"), 24).unwrap(), "-0.50636564110975879365655761", 21);
        close(&atan2(&d("1"), &d("-1"), 24).unwrap(), "2.35619449019234492884698253", 22);
        assert_eq!(atan2(&BigDecimal::zero(), &BigDecimal::zero(), 16).unwrap(), BigDecimal::zero());
    }

    #[test]
    fn powers() {
        close(&pow(&d("2"), &d("0.5"), 24).unwrap(), "1.41421356237309504880168872", 22);
        assert_eq!(powi(&d("1.5"), &BigInt::from(2), 16).unwrap(), d("2.25"));
        assert!(matches!(powi(&d("0"), &BigInt::from(-1), 16), Err(RplError::ZeroDivide)));
        assert!(matches!(pow(&d("-2"), &d("0.5"), 16), Err(RplError::ValueError)));
    }

    #[test]
    fn huge_exponents_fail_fast() {
        let huge = d("1E300000000");
        assert!(matches!(pow(&d("2"), &huge, 16), Err(RplError::ValueError)));
        assert!(matches!(pow(&d("0.5"), &huge, 16), Err(RplError::ValueError)));
        assert_eq!(pow(&d("0"), &huge, 16).unwrap(), BigDecimal::zero());
        assert_eq!(integral(&huge), None);
        assert!(matches!(floor(&huge), Err(RplError::ValueError)));
        assert!(matches!(sin(&huge, 16), Err(RplError::ValueError)));
        assert_eq!(integral(&d("1E1000")), Some(BigInt::from(10).pow(1000)));
        assert_eq!(integral(&d("1E-300000000")), None);
    }

    #[test]
    fn rounding_helpers() {
        assert_eq!(floor(&d("-2.5")).unwrap(), BigInt::from(-3));
        assert_eq!(trunc(&d("-2.5")).unwrap(), BigInt::from(-2));
        assert_eq!(floor(&d("-0.25")).unwrap(), BigInt::from(-1));
        assert_eq!(trunc(&d("-0.25")).unwrap(), BigInt::zero());
        assert_eq!(integral(&d("4.000")), Some(BigInt::from(4)));
        assert_eq!(integral(&d("1E3")), Some(BigInt::from(1000)));
        assert_eq!(integral(&d("4.5")), None);
        assert_eq!(exponent10(&d("1234.5")), 3);
        assert_eq!(exponent10(&d("0.00125")), -3);
    }

    #[test]
    fn literals() {
        assert_eq!(parse_literal("2."), Some(d("2")));
        assert_eq!(parse_literal(".5"), Some(d("0.5")));
        assert_eq!(parse_literal("1.E3"), Some(d("1000")));
        assert_eq!(parse_literal("1⁳-3"), Some(d("0.001")));
    }

    #[test]
    fn tier_is_widest() {
        let settings = Settings::default();
        let narrow = Object::decimal(d("1"), Precision::Decimal32);
        let wide = Object::decimal(d("1"), Precision::Decimal128);
        assert_eq!(tier(&narrow, &wide, &settings), Precision::Decimal128);
        assert_eq!(tier(&narrow, &Object::integer(1), &settings), Precision::Decimal64);
        let third = binary(Command::Div, &Object::integer(1), &narrow, &settings).unwrap();
        assert_eq!(third, Object::decimal(d("1"), Precision::Decimal64));
    }
}
