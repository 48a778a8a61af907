//! The object model: every value the runtime manipulates.

pub mod id;
pub mod postfix;
pub mod symbol;

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{Signed, ToPrimitive, Zero};

pub use id::{COMMAND_BASE, ObjectId};
pub use symbol::Symbol;

use crate::{command::Command, polynomial::Polynomial, settings::Precision};

/// Machine integer: a magnitude and a sign. Zero is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Integer {
    negative: bool,
    magnitude: u64,
}

impl Integer {
    pub const ZERO: Integer = Integer {
        negative: false,
        magnitude: 0,
    };
    pub const ONE: Integer = Integer {
        negative: false,
        magnitude: 1,
    };

    pub fn new(negative: bool, magnitude: u64) -> Self {
        Self {
            negative: negative && magnitude != 0,
            magnitude,
        }
    }

    pub fn from_i64(value: i64) -> Self {
        Self::new(value < 0, value.unsigned_abs())
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn magnitude(&self) -> u64 {
        self.magnitude
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude == 0
    }

    pub fn negated(self) -> Self {
        Self::new(!self.negative, self.magnitude)
    }

    pub fn abs(self) -> Self {
        Self::new(false, self.magnitude)
    }

    pub fn to_i64(self) -> Option<i64> {
        if self.negative {
            0i64.checked_sub_unsigned(self.magnitude)
        } else {
            i64::try_from(self.magnitude).ok()
        }
    }

    pub fn to_bigint(self) -> BigInt {
        let sign = if self.negative { Sign::Minus } else { Sign::Plus };
        BigInt::from_biguint(sign, BigUint::from(self.magnitude))
    }
}

/// Reduced rational number with a positive denominator greater than one.
///
/// Built through [`crate::arithmetic::fraction::make`], which returns an
/// integer object when the denominator divides the numerator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fraction {
    pub(crate) negative: bool,
    pub(crate) num: BigUint,
    pub(crate) den: BigUint,
}

impl Fraction {
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn numerator(&self) -> BigInt {
        let sign = if self.negative { Sign::Minus } else { Sign::Plus };
        BigInt::from_biguint(sign, self.num.clone())
    }

    pub fn denominator(&self) -> BigInt {
        BigInt::from(self.den.clone())
    }

    pub fn magnitude(&self) -> (&BigUint, &BigUint) {
        (&self.num, &self.den)
    }

    /// Both parts fit in machine words.
    pub fn is_small(&self) -> bool {
        self.num.to_u64().is_some() && self.den.to_u64().is_some()
    }

    pub fn negated(&self) -> Self {
        Self {
            negative: !self.negative,
            ..self.clone()
        }
    }
}

/// Decimal floating point value, rounded to the digits of its precision tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    pub value: BigDecimal,
    pub precision: Precision,
}

impl Decimal {
    pub fn new(value: BigDecimal, precision: Precision) -> Self {
        let value = if value.is_zero() {
            BigDecimal::zero()
        } else {
            value.with_prec(precision.digits()).normalized()
        };
        Self { value, precision }
    }

    pub fn is_negative(&self) -> bool {
        self.value.is_negative()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Complex {
    Rectangular(Box<Object>, Box<Object>),
    Polar(Box<Object>, Box<Object>),
}

impl Complex {
    pub fn rectangular(re: Object, im: Object) -> Self {
        Self::Rectangular(Box::new(re), Box::new(im))
    }

    pub fn polar(modulus: Object, argument: Object) -> Self {
        Self::Polar(Box::new(modulus), Box::new(argument))
    }

    pub fn id(&self) -> ObjectId {
        match self {
            Complex::Rectangular(..) => ObjectId::Rectangular,
            Complex::Polar(..) => ObjectId::Polar,
        }
    }

    pub fn parts(&self) -> (&Object, &Object) {
        match self {
            Complex::Rectangular(a, b) | Complex::Polar(a, b) => (a, b),
        }
    }
}

/// A value tagged with a unit expression, as in `3_m` or `9.81_m/s^2`.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub value: Box<Object>,
    /// Postfix items of the unit expression.
    pub unit: Vec<Object>,
}

/// The four sequence flavours share one payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeqKind {
    List,
    Array,
    Program,
    Expression,
}

impl SeqKind {
    pub fn id(self) -> ObjectId {
        match self {
            SeqKind::List => ObjectId::List,
            SeqKind::Array => ObjectId::Array,
            SeqKind::Program => ObjectId::Program,
            SeqKind::Expression => ObjectId::Expression,
        }
    }

    pub fn from_id(id: ObjectId) -> Option<Self> {
        match id {
            ObjectId::List => Some(SeqKind::List),
            ObjectId::Array => Some(SeqKind::Array),
            ObjectId::Program => Some(SeqKind::Program),
            ObjectId::Expression => Some(SeqKind::Expression),
            _ => None,
        }
    }

    pub fn open(self) -> &'static str {
        match self {
            SeqKind::List => "{",
            SeqKind::Array => "[",
            SeqKind::Program => "«",
            SeqKind::Expression => "'",
        }
    }

    pub fn close(self) -> &'static str {
        match self {
            SeqKind::List => "}",
            SeqKind::Array => "]",
            SeqKind::Program => "»",
            SeqKind::Expression => "'",
        }
    }

    pub fn wrap(self, items: Vec<Object>) -> Object {
        match self {
            SeqKind::List => Object::List(items),
            SeqKind::Array => Object::Array(items),
            SeqKind::Program => Object::Program(items),
            SeqKind::Expression => Object::Expression(items),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Integer(Integer),
    Bignum(BigInt),
    Fraction(Fraction),
    Decimal(Decimal),
    Complex(Complex),
    Symbol(Symbol),
    Text(String),
    List(Vec<Object>),
    Array(Vec<Object>),
    Program(Vec<Object>),
    Expression(Vec<Object>),
    Polynomial(Polynomial),
    Unit(Unit),
    Command(Command),
}

impl Object {
    pub fn integer(value: i64) -> Self {
        Object::Integer(Integer::from_i64(value))
    }

    pub fn from_u64(value: u64) -> Self {
        Object::Integer(Integer::new(false, value))
    }

    pub fn from_bool(value: bool) -> Self {
        Object::from_u64(value as u64)
    }

    /// Wrap a big integer, demoting it to a machine integer when it fits.
    pub fn from_bigint(value: BigInt) -> Self {
        match value.magnitude().to_u64() {
            Some(magnitude) => Object::Integer(Integer::new(value.is_negative(), magnitude)),
            None => Object::Bignum(value),
        }
    }

    pub fn decimal(value: BigDecimal, precision: Precision) -> Self {
        Object::Decimal(Decimal::new(value, precision))
    }

    pub fn symbol(name: &str) -> Self {
        Object::Symbol(Symbol::new(name))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Object::Text(text.into())
    }

    /// Tag of the encoded form. The sign of exact numbers is part of the tag.
    pub fn tag(&self) -> u64 {
        match self {
            Object::Command(cmd) => COMMAND_BASE + cmd.opcode() as u64,
            _ => self.id().map(ObjectId::tag).unwrap_or_default(),
        }
    }

    /// Type id of the object, `None` for commands.
    pub fn id(&self) -> Option<ObjectId> {
        Some(match self {
            Object::Integer(i) if i.is_negative() => ObjectId::NegInteger,
            Object::Integer(_) => ObjectId::Integer,
            Object::Bignum(b) if b.is_negative() => ObjectId::NegBignum,
            Object::Bignum(_) => ObjectId::Bignum,
            Object::Fraction(f) => match (f.is_small(), f.is_negative()) {
                (true, false) => ObjectId::Fraction,
                (true, true) => ObjectId::NegFraction,
                (false, false) => ObjectId::BigFraction,
                (false, true) => ObjectId::NegBigFraction,
            },
            Object::Decimal(d) => d.precision.id(),
            Object::Complex(c) => c.id(),
            Object::Symbol(_) => ObjectId::Symbol,
            Object::Text(_) => ObjectId::Text,
            Object::List(_) => ObjectId::List,
            Object::Array(_) => ObjectId::Array,
            Object::Program(_) => ObjectId::Program,
            Object::Expression(_) => ObjectId::Expression,
            Object::Polynomial(_) => ObjectId::Polynomial,
            Object::Unit(_) => ObjectId::Unit,
            Object::Command(_) => return None,
        })
    }

    pub fn is_real(&self) -> bool {
        matches!(
            self,
            Object::Integer(_) | Object::Bignum(_) | Object::Fraction(_) | Object::Decimal(_)
        )
    }

    /// Integer or fraction.
    pub fn is_exact(&self) -> bool {
        matches!(self, Object::Integer(_) | Object::Bignum(_) | Object::Fraction(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Object::Integer(_) | Object::Bignum(_))
    }

    pub fn is_number(&self) -> bool {
        self.is_real() || matches!(self, Object::Complex(_))
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(
            self,
            Object::Symbol(_) | Object::Expression(_) | Object::Polynomial(_)
        )
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Object::Integer(i) => i.is_zero(),
            Object::Decimal(d) => d.value.is_zero(),
            _ => false,
        }
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Object::Integer(i) if !i.is_negative() && i.magnitude() == 1)
    }

    /// Sign of a real number.
    pub fn is_negative(&self) -> bool {
        match self {
            Object::Integer(i) => i.is_negative(),
            Object::Bignum(b) => b.is_negative(),
            Object::Fraction(f) => f.is_negative(),
            Object::Decimal(d) => d.is_negative(),
            _ => false,
        }
    }

    /// Integer value of an exact integer object.
    pub fn to_bigint(&self) -> Option<BigInt> {
        match self {
            Object::Integer(i) => Some(i.to_bigint()),
            Object::Bignum(b) => Some(b.clone()),
            _ => None,
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => i.to_i64(),
            Object::Bignum(b) => b.to_i64(),
            _ => None,
        }
    }

    /// Symbol named by a symbol object or by an expression holding only a symbol.
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Object::Symbol(s) => Some(s),
            Object::Expression(items) => match items.as_slice() {
                [Object::Symbol(s)] => Some(s),
                _ => None,
            },
            _ => None,
        }
    }

    /// Postfix items this object contributes when embedded in an expression.
    pub fn postfix_items(&self) -> Vec<Object> {
        match self {
            Object::Expression(items) => items.clone(),
            Object::Polynomial(poly) => poly.to_expression(),
            other => vec![other.clone()],
        }
    }

    pub fn sequence(&self) -> Option<(SeqKind, &[Object])> {
        match self {
            Object::List(items) => Some((SeqKind::List, items)),
            Object::Array(items) => Some((SeqKind::Array, items)),
            Object::Program(items) => Some((SeqKind::Program, items)),
            Object::Expression(items) => Some((SeqKind::Expression, items)),
            _ => None,
        }
    }
}

impl From<Integer> for Object {
    fn from(value: Integer) -> Self {
        Object::Integer(value)
    }
}

impl From<Symbol> for Object {
    fn from(value: Symbol) -> Self {
        Object::Symbol(value)
    }
}

impl From<Command> for Object {
    fn from(value: Command) -> Self {
        Object::Command(value)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn integer_has_no_negative_zero() {
        assert_eq!(Integer::new(true, 0), Integer::ZERO);
        assert_eq!(Integer::from_i64(i64::MIN).magnitude(), 1 << 63);
        assert_eq!(Integer::from_i64(i64::MIN).to_i64(), Some(i64::MIN));
        assert_eq!(Integer::new(false, u64::MAX).to_i64(), None);
    }

    #[test]
    fn bignum_demotes() {
        let big: BigInt = BigInt::from(u64::MAX) + 1;
        assert!(matches!(Object::from_bigint(big.clone()), Object::Bignum(_)));
        assert_eq!(Object::from_bigint(big - 1), Object::from_u64(u64::MAX));
        assert_eq!(Object::from_bigint(BigInt::from(-5)), Object::integer(-5));
    }

    #[test]
    fn sign_lives_in_the_tag() {
        assert_eq!(Object::integer(-3).id(), Some(ObjectId::NegInteger));
        assert_eq!(Object::integer(3).id(), Some(ObjectId::Integer));
        let big: BigInt = -(BigInt::from(u64::MAX) * BigInt::from(4u32));
        assert_eq!(Object::from_bigint(big).id(), Some(ObjectId::NegBignum));
        assert_eq!(Object::Command(Command::Add).id(), None);
        assert_eq!(Object::Command(Command::Add).tag(), COMMAND_BASE);
    }

    #[test]
    fn decimal_rounds_to_tier() {
        let d = Decimal::new(BigDecimal::from_str("1.23456789").unwrap(), Precision::Decimal32);
        assert_eq!(d.value, BigDecimal::from_str("1.234568").unwrap());
        assert_eq!(Object::Decimal(d).id(), Some(ObjectId::Decimal32));
    }

    #[test]
    fn lone_symbol_expression() {
        let e = Object::Expression(vec![Object::symbol("X")]);
        assert_eq!(e.as_symbol().map(Symbol::name), Some("X"));
        assert!(e.is_symbolic());
        assert_eq!(e.postfix_items(), vec![Object::symbol("X")]);
    }
}
