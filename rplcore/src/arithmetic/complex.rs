//! Complex arithmetic on rectangular and polar numbers.
//!
//! Parts are ordinary real objects, so exact parts stay exact as long as the
//! operation allows it.

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};

use crate::{
    arithmetic::{self, decimal},
    command::Command,
    error::{RplError, RplResult},
    object::{Complex, Object},
    settings::Settings,
};

/// Rectangular number, demoted to its real part when the imaginary part is an exact zero.
pub fn rectangular(re: Object, im: Object) -> Object {
    if im.is_zero() && im.is_exact() {
        re
    } else {
        Object::Complex(Complex::rectangular(re, im))
    }
}

/// Polar number, demoted to its modulus when the argument is an exact zero.
pub fn polar(modulus: Object, argument: Object) -> Object {
    if argument.is_zero() && argument.is_exact() {
        modulus
    } else {
        Object::Complex(Complex::polar(modulus, argument))
    }
}

/// A real number as a complex object with a zero imaginary part.
pub fn rectangular_object(re: Object) -> Object {
    Object::Complex(Complex::rectangular(re, Object::integer(0)))
}

/// Real and imaginary parts of any number.
pub fn rectangular_parts(x: &Object, settings: &Settings) -> RplResult<(Object, Object)> {
    match x {
        Object::Complex(Complex::Rectangular(re, im)) => Ok((re.as_ref().clone(), im.as_ref().clone())),
        Object::Complex(Complex::Polar(r, theta)) => {
            let cos = arithmetic::unary(Command::Cos, theta, settings)?;
            let sin = arithmetic::unary(Command::Sin, theta, settings)?;
            Ok((arithmetic::mul(r, &cos, settings)?, arithmetic::mul(r, &sin, settings)?))
        }
        _ if x.is_real() => Ok((x.clone(), Object::integer(0))),
        _ => Err(RplError::TypeError),
    }
}

fn half_turn(x: &Object, settings: &Settings) -> Object {
    let precision = decimal::precision_of(x, settings);
    Object::decimal(decimal::pi(decimal::working_digits(precision)), precision)
}

/// Modulus and argument of any number.
pub fn polar_parts(x: &Object, settings: &Settings) -> RplResult<(Object, Object)> {
    match x {
        Object::Complex(Complex::Polar(r, theta)) => Ok((r.as_ref().clone(), theta.as_ref().clone())),
        Object::Complex(Complex::Rectangular(re, im)) => {
            let modulus = modulus(re, im, settings)?;
            let argument = arithmetic::binary(Command::Atan2, im, re, settings)?;
            Ok((modulus, argument))
        }
        _ if x.is_real() && x.is_negative() => {
            Ok((arithmetic::neg(x, settings)?, half_turn(x, settings)))
        }
        _ if x.is_real() => Ok((x.clone(), Object::integer(0))),
        _ => Err(RplError::TypeError),
    }
}

/// `sqrt(re² + im²)`, exact when the sum of squares is a perfect square.
fn modulus(re: &Object, im: &Object, settings: &Settings) -> RplResult<Object> {
    let a = arithmetic::mul(re, re, settings)?;
    let b = arithmetic::mul(im, im, settings)?;
    arithmetic::unary(Command::Sqrt, &arithmetic::add(&a, &b, settings)?, settings)
}

fn is_polar(x: &Object) -> bool {
    matches!(x, Object::Complex(Complex::Polar(..)))
}

fn powi(x: &Object, n: &BigInt, settings: &Settings) -> RplResult<Object> {
    let Some(mut e) = n.magnitude().to_u64().filter(|e| *e <= 1 << 20) else {
        return Err(RplError::OutOfMemory);
    };
    let mut base = x.clone();
    let mut result = Object::integer(1);
    while e > 0 {
        if e & 1 == 1 {
            result = binary(Command::Mul, &result, &base, settings)?;
        }
        e >>= 1;
        if e > 0 {
            base = binary(Command::Mul, &base, &base, settings)?;
        }
    }
    if n.is_negative() {
        result = binary(Command::Div, &Object::integer(1), &result, settings)?;
    }
    Ok(result)
}

fn exp(x: &Object, settings: &Settings) -> RplResult<Object> {
    let (a, b) = rectangular_parts(x, settings)?;
    let scale = arithmetic::unary(Command::Exp, &a, settings)?;
    let cos = arithmetic::unary(Command::Cos, &b, settings)?;
    let sin = arithmetic::unary(Command::Sin, &b, settings)?;
    Ok(rectangular(
        arithmetic::mul(&scale, &cos, settings)?,
        arithmetic::mul(&scale, &sin, settings)?,
    ))
}

fn ln(x: &Object, settings: &Settings) -> RplResult<Object> {
    let (r, theta) = polar_parts(x, settings)?;
    if r.is_zero() {
        return Err(RplError::ValueError);
    }
    Ok(rectangular(arithmetic::unary(Command::Ln, &r, settings)?, theta))
}

fn sqrt(x: &Object, settings: &Settings) -> RplResult<Object> {
    if is_polar(x) {
        let (r, theta) = polar_parts(x, settings)?;
        let root = arithmetic::unary(Command::Sqrt, &r, settings)?;
        let half = arithmetic::div(&theta, &Object::integer(2), settings)?;
        return Ok(polar(root, half));
    }
    // sqrt(a+ib) = sqrt((|z|+a)/2) + i·sign(b)·sqrt((|z|-a)/2)
    let (a, b) = rectangular_parts(x, settings)?;
    let m = modulus(&a, &b, settings)?;
    let two = Object::integer(2);
    let re_sq = arithmetic::div(&arithmetic::add(&m, &a, settings)?, &two, settings)?;
    let im_sq = arithmetic::div(&arithmetic::sub(&m, &a, settings)?, &two, settings)?;
    let re = arithmetic::unary(Command::Sqrt, &re_sq, settings)?;
    let mut im = arithmetic::unary(Command::Sqrt, &im_sq, settings)?;
    if b.is_negative() {
        im = arithmetic::neg(&im, settings)?;
    }
    Ok(rectangular(re, im))
}

/// Evaluate `x op y` when at least one operand is complex.
pub fn binary(op: Command, x: &Object, y: &Object, settings: &Settings) -> RplResult<Object> {
    let both_polar = is_polar(x) && is_polar(y);
    match op {
        Command::Add | Command::Sub => {
            let (a, b) = rectangular_parts(x, settings)?;
            let (c, d) = rectangular_parts(y, settings)?;
            Ok(rectangular(
                arithmetic::binary(op, &a, &c, settings)?,
                arithmetic::binary(op, &b, &d, settings)?,
            ))
        }
        Command::Mul if both_polar => {
            let (r1, t1) = polar_parts(x, settings)?;
            let (r2, t2) = polar_parts(y, settings)?;
            Ok(polar(
                arithmetic::mul(&r1, &r2, settings)?,
                arithmetic::add(&t1, &t2, settings)?,
            ))
        }
        Command::Mul => {
            let (a, b) = rectangular_parts(x, settings)?;
            let (c, d) = rectangular_parts(y, settings)?;
            let ac = arithmetic::mul(&a, &c, settings)?;
            let bd = arithmetic::mul(&b, &d, settings)?;
            let ad = arithmetic::mul(&a, &d, settings)?;
            let bc = arithmetic::mul(&b, &c, settings)?;
            Ok(rectangular(
                arithmetic::sub(&ac, &bd, settings)?,
                arithmetic::add(&ad, &bc, settings)?,
            ))
        }
        Command::Div if both_polar => {
            let (r1, t1) = polar_parts(x, settings)?;
            let (r2, t2) = polar_parts(y, settings)?;
            if r2.is_zero() {
                return Err(RplError::ZeroDivide);
            }
            Ok(polar(
                arithmetic::div(&r1, &r2, settings)?,
                arithmetic::sub(&t1, &t2, settings)?,
            ))
        }
        Command::Div => {
            let (a, b) = rectangular_parts(x, settings)?;
            let (c, d) = rectangular_parts(y, settings)?;
            let cc = arithmetic::mul(&c, &c, settings)?;
            let dd = arithmetic::mul(&d, &d, settings)?;
            let denominator = arithmetic::add(&cc, &dd, settings)?;
            if denominator.is_zero() {
                return Err(RplError::ZeroDivide);
            }
            let ac = arithmetic::mul(&a, &c, settings)?;
            let bd = arithmetic::mul(&b, &d, settings)?;
            let bc = arithmetic::mul(&b, &c, settings)?;
            let ad = arithmetic::mul(&a, &d, settings)?;
            let re = arithmetic::add(&ac, &bd, settings)?;
            let im = arithmetic::sub(&bc, &ad, settings)?;
            Ok(rectangular(
                arithmetic::div(&re, &denominator, settings)?,
                arithmetic::div(&im, &denominator, settings)?,
            ))
        }
        Command::Pow => match y.to_bigint() {
            Some(n) => powi(x, &n, settings),
            None => {
                let product = binary(Command::Mul, y, &rectangular_object_of(ln(x, settings)?), settings)?;
                exp(&product, settings)
            }
        },
        _ => Err(RplError::TypeError),
    }
}

fn rectangular_object_of(x: Object) -> Object {
    if x.is_real() { rectangular_object(x) } else { x }
}

/// Evaluate `op x` for a complex `x`.
pub fn unary(op: Command, x: &Object, settings: &Settings) -> RplResult<Object> {
    match op {
        Command::Neg => {
            let (a, b) = rectangular_parts(x, settings)?;
            Ok(rectangular(arithmetic::neg(&a, settings)?, arithmetic::neg(&b, settings)?))
        }
        Command::Inv => binary(Command::Div, &rectangular_object(Object::integer(1)), x, settings),
        Command::Sq => binary(Command::Mul, x, x, settings),
        Command::Cube => {
            let square = binary(Command::Mul, x, x, settings)?;
            binary(Command::Mul, &square, x, settings)
        }
        Command::Abs => {
            let (a, b) = rectangular_parts(x, settings)?;
            modulus(&a, &b, settings)
        }
        Command::Sqrt => sqrt(x, settings),
        Command::Exp => exp(x, settings),
        Command::Ln => ln(x, settings),
        Command::Log => {
            let ten = Object::integer(10);
            let ln10 = arithmetic::unary(Command::Ln, &ten, settings)?;
            binary(Command::Div, &ln(x, settings)?, &rectangular_object(ln10), settings)
        }
        _ => Err(RplError::Unimplemented),
    }
}
