//! Machine integer fast paths. Every operation returns `None` when the result
//! does not fit, and the caller retries with bignums.

use std::cmp::Ordering;

use crate::object::Integer;

pub fn add(x: Integer, y: Integer) -> Option<Integer> {
    let (xm, ym) = (x.magnitude(), y.magnitude());
    if x.is_negative() == y.is_negative() {
        xm.checked_add(ym).map(|m| Integer::new(x.is_negative(), m))
    } else if xm >= ym {
        Some(Integer::new(x.is_negative(), xm - ym))
    } else {
        Some(Integer::new(y.is_negative(), ym - xm))
    }
}

pub fn sub(x: Integer, y: Integer) -> Option<Integer> {
    add(x, y.negated())
}

pub fn mul(x: Integer, y: Integer) -> Option<Integer> {
    x.magnitude()
        .checked_mul(y.magnitude())
        .map(|m| Integer::new(x.is_negative() != y.is_negative(), m))
}

/// Exact quotient, `None` when `y` does not divide `x`. `y` must not be zero.
pub fn div(x: Integer, y: Integer) -> Option<Integer> {
    let (xm, ym) = (x.magnitude(), y.magnitude());
    (xm % ym == 0).then(|| Integer::new(x.is_negative() != y.is_negative(), xm / ym))
}

/// Truncated remainder, with the sign of `x`. `y` must not be zero.
pub fn rem(x: Integer, y: Integer) -> Integer {
    Integer::new(x.is_negative(), x.magnitude() % y.magnitude())
}

/// Floored modulo, with the sign of `y`. `y` must not be zero.
pub fn modulo(x: Integer, y: Integer) -> Option<Integer> {
    let r = rem(x, y);
    if r.is_zero() || x.is_negative() == y.is_negative() {
        Some(r)
    } else {
        add(r, y)
    }
}

pub fn pow(x: Integer, mut exponent: u64) -> Option<Integer> {
    let negative = x.is_negative() && exponent % 2 == 1;
    let mut base = x.magnitude();
    let mut result: u64 = 1;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result.checked_mul(base)?;
        }
        exponent >>= 1;
        if exponent > 0 {
            base = base.checked_mul(base)?;
        }
    }
    Some(Integer::new(negative, result))
}

pub fn cmp(x: Integer, y: Integer) -> Ordering {
    match (x.is_negative(), y.is_negative()) {
        (false, true) => Ordering::Greater,
        (true, false) => Ordering::Less,
        (false, false) => x.magnitude().cmp(&y.magnitude()),
        (true, true) => y.magnitude().cmp(&x.magnitude()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn i(v: i64) -> Integer {
        Integer::from_i64(v)
    }

    #[test]
    fn mixed_sign_addition() {
        assert_eq!(add(i(5), i(-7)), Some(i(-2)));
        assert_eq!(add(i(-5), i(5)), Some(Integer::ZERO));
        assert_eq!(sub(i(3), i(10)), Some(i(-7)));
    }

    #[test]
    fn overflow_is_reported() {
        let max = Integer::new(false, u64::MAX);
        assert_eq!(add(max, i(1)), None);
        assert_eq!(mul(max, i(2)), None);
        assert_eq!(pow(i(2), 64), None);
        assert_eq!(pow(i(2), 63), Some(Integer::new(false, 1 << 63)));
        // Largest magnitude is representable with either sign.
        assert_eq!(add(Integer::new(true, u64::MAX), i(-1)), None);
        assert_eq!(sub(Integer::new(true, u64::MAX - 1), i(1)), Some(Integer::new(true, u64::MAX)));
    }

    #[test]
    fn division_family() {
        assert_eq!(div(i(12), i(-4)), Some(i(-3)));
        assert_eq!(div(i(7), i(2)), None);
        assert_eq!(rem(i(-7), i(2)), i(-1));
        assert_eq!(modulo(i(-7), i(2)), Some(i(1)));
        assert_eq!(modulo(i(7), i(-2)), Some(i(-1)));
        assert_eq!(modulo(i(6), i(-2)), Some(Integer::ZERO));
    }

    #[test]
    fn signed_power_and_order() {
        assert_eq!(pow(i(-3), 3), Some(i(-27)));
        assert_eq!(pow(i(-3), 2), Some(i(9)));
        assert_eq!(pow(i(0), 0), Some(i(1)));
        assert_eq!(cmp(i(-3), i(-2)), Ordering::Less);
        assert_eq!(cmp(i(4), i(-9)), Ordering::Greater);
    }
}
