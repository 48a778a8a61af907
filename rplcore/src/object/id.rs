//! Type tags of encoded objects.
//!
//! Conventions:
//! - The tag is the first LEB128 value of every encoded object.
//! - The sign of integers, bignums and fractions is carried by the tag, never by the payload.
//! - Commands have no payload; their tag is `COMMAND_BASE + opcode`.

use strum::{EnumIter, FromRepr, IntoEnumIterator, IntoStaticStr};

/// First tag used by commands.
pub const COMMAND_BASE: u64 = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, FromRepr, EnumIter, IntoStaticStr)]
#[repr(u8)]
pub enum ObjectId {
    Integer = 0x01, // payload: magnitude
    NegInteger = 0x02, // payload: magnitude
    Bignum = 0x03, // payload: len bytes[len] (little-endian magnitude)
    NegBignum = 0x04, // payload: len bytes[len]
    Fraction = 0x05, // payload: numerator denominator
    NegFraction = 0x06, // payload: numerator denominator
    BigFraction = 0x07, // payload: len bytes[len] len bytes[len]
    NegBigFraction = 0x08, // payload: len bytes[len] len bytes[len]
    Decimal32 = 0x09, // payload: zigzag(scale) len bytes[len] (signed mantissa)
    Decimal64 = 0x0A, // payload: zigzag(scale) len bytes[len]
    Decimal128 = 0x0B, // payload: zigzag(scale) len bytes[len]
    Rectangular = 0x0C, // payload: re im
    Polar = 0x0D, // payload: modulus argument

    Symbol = 0x10, // payload: len utf8[len]
    Text = 0x11, // payload: len utf8[len]
    List = 0x12, // payload: len objects
    Array = 0x13, // payload: len objects
    Program = 0x14, // payload: len objects
    Expression = 0x15, // payload: len objects (postfix)
    Polynomial = 0x16, // payload: len nvars (len utf8)[nvars] (factor exponent[nvars])*
    Unit = 0x17, // payload: value unit-expression
}

impl ObjectId {
    pub fn tag(self) -> u64 {
        self as u64
    }

    pub fn from_tag(tag: u64) -> Option<Self> {
        u8::try_from(tag).ok().and_then(Self::from_repr)
    }

    pub fn to_str(self) -> &'static str {
        self.into()
    }

    pub fn from_str(name: &str) -> Option<Self> {
        Self::iter().find(|id| id.to_str().eq_ignore_ascii_case(name))
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Self::Integer | Self::NegInteger | Self::Bignum | Self::NegBignum)
    }

    pub fn is_fraction(self) -> bool {
        matches!(
            self,
            Self::Fraction | Self::NegFraction | Self::BigFraction | Self::NegBigFraction
        )
    }

    pub fn is_decimal(self) -> bool {
        matches!(self, Self::Decimal32 | Self::Decimal64 | Self::Decimal128)
    }

    pub fn is_real(self) -> bool {
        self.is_integer() || self.is_fraction() || self.is_decimal()
    }

    pub fn is_complex(self) -> bool {
        matches!(self, Self::Rectangular | Self::Polar)
    }

    pub fn is_number(self) -> bool {
        self.is_real() || self.is_complex()
    }

    pub fn is_negative(self) -> bool {
        matches!(
            self,
            Self::NegInteger | Self::NegBignum | Self::NegFraction | Self::NegBigFraction
        )
    }

    pub fn is_sequence(self) -> bool {
        matches!(self, Self::List | Self::Array | Self::Program | Self::Expression)
    }
}
