//! Arbitrary precision integer operations.

use num_bigint::BigInt;
use num_integer::Integer as _;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::{
    command::Command,
    error::{RplError, RplResult},
    object::Object,
};

/// Largest result, in bits, a power is allowed to produce.
const MAX_POWER_BITS: u64 = 1 << 22;

pub fn pow(base: &BigInt, exponent: &BigInt) -> RplResult<Object> {
    if exponent.is_negative() {
        return Err(RplError::ValueError);
    }
    if base.is_zero() {
        return if exponent.is_zero() {
            Err(RplError::UndefinedOperation)
        } else {
            Ok(Object::integer(0))
        };
    }
    if base.magnitude().is_one() {
        let negative = base.is_negative() && exponent.is_odd();
        return Ok(Object::integer(if negative { -1 } else { 1 }));
    }

    let exponent = exponent.to_u32().ok_or(RplError::OutOfMemory)?;
    if base.bits().saturating_mul(exponent as u64) > MAX_POWER_BITS {
        return Err(RplError::OutOfMemory);
    }
    Ok(Object::from_bigint(base.pow(exponent)))
}

/// Integer result of `x op y`, `None` when the result is not an integer.
pub fn binary(op: Command, x: &BigInt, y: &BigInt) -> RplResult<Option<Object>> {
    let nonzero = |y: &BigInt| {
        if y.is_zero() {
            Err(RplError::ZeroDivide)
        } else {
            Ok(())
        }
    };
    Ok(match op {
        Command::Add => Some(Object::from_bigint(x + y)),
        Command::Sub => Some(Object::from_bigint(x - y)),
        Command::Mul => Some(Object::from_bigint(x * y)),
        Command::Div => {
            nonzero(y)?;
            let (q, r) = x.div_rem(y);
            r.is_zero().then(|| Object::from_bigint(q))
        }
        Command::Rem => {
            nonzero(y)?;
            Some(Object::from_bigint(x % y))
        }
        Command::Mod => {
            nonzero(y)?;
            Some(Object::from_bigint(x.mod_floor(y)))
        }
        Command::Pow if !y.is_negative() => Some(pow(x, y)?),
        _ => None,
    })
}

/// `n!` for a non-negative integer.
pub fn factorial(n: &BigInt) -> RplResult<Object> {
    if n.is_negative() {
        return Err(RplError::ValueError);
    }
    let n = n.to_u64().filter(|n| *n <= 100_000).ok_or(RplError::OutOfMemory)?;
    let mut result = BigInt::one();
    for k in 2..=n {
        result *= k;
    }
    Ok(Object::from_bigint(result))
}
