//! Encoding and decoding of [`Object`] values.

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer as _;
use num_traits::{One, ToPrimitive, Zero};

use crate::{
    command::Command,
    encoding::{RawEncodable, Reader, SequenceIter, integer::unzigzag, integer::zigzag},
    error::{RplError, RplResult},
    object::{
        COMMAND_BASE, Complex, Decimal, Fraction, Integer, Object, ObjectId, SeqKind, Symbol, Unit,
    },
    polynomial::{Polynomial, Term},
    settings::Precision,
};

use super::encode_u64;

/// Deepest object nesting accepted by the decoder.
const MAX_NESTING: usize = 1024;

fn encode_counted<F: FnMut(&[u8])>(bytes: &[u8], f: &mut F) -> u64 {
    let size = encode_u64(bytes.len() as u64, f);
    f(bytes);
    size + bytes.len() as u64
}

fn encode_biguint<F: FnMut(&[u8])>(value: &BigUint, f: &mut F) -> u64 {
    encode_counted(&value.to_bytes_le(), f)
}

// Each child is encoded exactly once, so nesting costs linear time
fn encode_items<F: FnMut(&[u8])>(items: &[Object], f: &mut F) -> u64 {
    let mut body: Vec<u8> = Vec::new();
    for item in items {
        let mut sink: &mut dyn FnMut(&[u8]) = &mut |b: &[u8]| body.extend_from_slice(b);
        item.encode_raw(&mut sink);
    }
    encode_counted(&body, f)
}

fn encode_polynomial<F: FnMut(&[u8])>(poly: &Polynomial, f: &mut F) -> u64 {
    let mut body: Vec<u8> = Vec::new();
    let mut push = |b: &[u8]| body.extend_from_slice(b);
    encode_u64(poly.variables().len() as u64, &mut push);
    for var in poly.variables() {
        encode_counted(var.name().as_bytes(), &mut push);
    }
    for term in poly.terms() {
        push(&encode(&term.factor)[..]);
        for &exponent in &term.exponents {
            encode_u64(exponent as u64, &mut push);
        }
    }
    encode_counted(&body, f)
}

impl RawEncodable for Object {
    fn encode_raw<F: FnMut(&[u8])>(&self, f: &mut F) -> u64 {
        let tag = encode_u64(self.tag(), f);
        let payload = match self {
            Object::Integer(i) => encode_u64(i.magnitude(), f),
            Object::Bignum(b) => encode_biguint(b.magnitude(), f),
            Object::Fraction(fr) => {
                let (num, den) = fr.magnitude();
                match (num.to_u64(), den.to_u64()) {
                    (Some(n), Some(d)) => encode_u64(n, f) + encode_u64(d, f),
                    _ => encode_biguint(num, f) + encode_biguint(den, f),
                }
            }
            Object::Decimal(d) => {
                let (mantissa, scale) = d.value.as_bigint_and_exponent();
                encode_u64(zigzag(scale), f) + encode_counted(&mantissa.to_signed_bytes_le(), f)
            }
            Object::Complex(c) => {
                let (a, b) = c.parts();
                a.encode_raw(f) + b.encode_raw(f)
            }
            Object::Symbol(s) => encode_counted(s.name().as_bytes(), f),
            Object::Text(t) => encode_counted(t.as_bytes(), f),
            Object::List(items)
            | Object::Array(items)
            | Object::Program(items)
            | Object::Expression(items) => encode_items(items, f),
            Object::Polynomial(p) => encode_polynomial(p, f),
            Object::Unit(u) => {
                let unit = Object::Expression(u.unit.clone());
                u.value.encode_raw(f) + unit.encode_raw(f)
            }
            Object::Command(_) => 0,
        };
        tag + payload
    }
}

/// Encode an object into a fresh buffer.
pub fn encode(object: &Object) -> super::DynBuf {
    let mut buf = super::DynBuf::new();
    object.encode_dynbuf(&mut buf);
    buf
}

fn utf8(bytes: &[u8]) -> RplResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| RplError::InvalidObject("invalid UTF-8"))
}

fn fraction(negative: bool, num: BigUint, den: BigUint) -> RplResult<Object> {
    if den <= BigUint::one() || num.is_zero() || !num.gcd(&den).is_one() {
        return Err(RplError::InvalidObject("fraction is not reduced"));
    }
    Ok(Object::Fraction(Fraction { negative, num, den }))
}

impl<'a> Reader<'a> {
    fn biguint(&mut self) -> RplResult<BigUint> {
        Ok(BigUint::from_bytes_le(self.counted()?))
    }

    fn items(&mut self, depth: usize) -> RplResult<Vec<Object>> {
        SequenceIter::new(self.counted()?)
            .map(|bytes| Reader::new(bytes?).object_at(depth))
            .collect()
    }

    fn polynomial(&mut self, depth: usize) -> RplResult<Polynomial> {
        let mut body = Reader::new(self.counted()?);
        let count = body.length()?;
        let mut variables = Vec::new();
        for _ in 0..count {
            variables.push(Symbol::new(utf8(body.counted()?)?));
        }
        let mut terms = Vec::new();
        while !body.is_empty() {
            let factor = body.object_at(depth)?;
            let exponents = (0..count)
                .map(|_| {
                    let e = body.u64()?;
                    u32::try_from(e).map_err(|_| RplError::InvalidObject("exponent out of range"))
                })
                .collect::<RplResult<Vec<u32>>>()?;
            terms.push(Term { factor, exponents });
        }
        Ok(Polynomial::from_parts(variables, terms))
    }

    /// Decode the object at the cursor.
    pub fn object(&mut self) -> RplResult<Object> {
        self.object_at(0)
    }

    fn object_at(&mut self, depth: usize) -> RplResult<Object> {
        if depth > MAX_NESTING {
            return Err(RplError::InvalidObject("nesting too deep"));
        }
        let inner = depth + 1;
        let tag = self.u64()?;
        if tag >= COMMAND_BASE {
            return Command::from_opcode(tag - COMMAND_BASE)
                .map(Object::Command)
                .ok_or(RplError::InvalidObject("unknown command"));
        }

        let id = ObjectId::from_tag(tag).ok_or(RplError::InvalidObject("unknown type tag"))?;
        Ok(match id {
            ObjectId::Integer | ObjectId::NegInteger => {
                let magnitude = self.u64()?;
                if id.is_negative() && magnitude == 0 {
                    return Err(RplError::InvalidObject("negative zero"));
                }
                Object::Integer(Integer::new(id.is_negative(), magnitude))
            }
            ObjectId::Bignum | ObjectId::NegBignum => {
                let sign = if id.is_negative() { Sign::Minus } else { Sign::Plus };
                Object::from_bigint(BigInt::from_biguint(sign, self.biguint()?))
            }
            ObjectId::Fraction | ObjectId::NegFraction => {
                let num = BigUint::from(self.u64()?);
                let den = BigUint::from(self.u64()?);
                fraction(id.is_negative(), num, den)?
            }
            ObjectId::BigFraction | ObjectId::NegBigFraction => {
                let num = self.biguint()?;
                let den = self.biguint()?;
                fraction(id.is_negative(), num, den)?
            }
            ObjectId::Decimal32 | ObjectId::Decimal64 | ObjectId::Decimal128 => {
                let scale = unzigzag(self.u64()?);
                let mantissa = BigInt::from_signed_bytes_le(self.counted()?);
                let precision =
                    Precision::from_id(id).ok_or(RplError::InvalidObject("unknown precision"))?;
                Object::Decimal(Decimal::new(BigDecimal::new(mantissa, scale), precision))
            }
            ObjectId::Rectangular => {
                let re = self.object_at(inner)?;
                let im = self.object_at(inner)?;
                Object::Complex(Complex::rectangular(re, im))
            }
            ObjectId::Polar => {
                let modulus = self.object_at(inner)?;
                let argument = self.object_at(inner)?;
                Object::Complex(Complex::polar(modulus, argument))
            }
            ObjectId::Symbol => Object::Symbol(Symbol::new(utf8(self.counted()?)?)),
            ObjectId::Text => Object::Text(utf8(self.counted()?)?),
            ObjectId::List | ObjectId::Array | ObjectId::Program | ObjectId::Expression => {
                let kind = SeqKind::from_id(id).ok_or(RplError::InvalidObject("not a sequence"))?;
                kind.wrap(self.items(inner)?)
            }
            ObjectId::Polynomial => Object::Polynomial(self.polynomial(inner)?),
            ObjectId::Unit => {
                let value = self.object_at(inner)?;
                let Object::Expression(unit) = self.object_at(inner)? else {
                    return Err(RplError::InvalidObject("unit is not an expression"));
                };
                Object::Unit(Unit {
                    value: Box::new(value),
                    unit,
                })
            }
        })
    }
}

/// Decode the object at the start of `bytes`, returning it with its size.
pub fn decode(bytes: &[u8]) -> RplResult<(Object, usize)> {
    let mut reader = Reader::new(bytes);
    let object = reader.object()?;
    Ok((object, bytes.len() - reader.remaining().len()))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::{encoding::object_size, settings::Settings};

    fn roundtrip(object: Object) {
        let bytes = encode(&object);
        assert_eq!(object_size(&bytes).unwrap(), bytes.len(), "size of {object:?}");
        let (back, used) = decode(&bytes).unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(back, object);
    }

    #[test]
    fn integers_are_leb128() {
        assert_eq!(&encode(&Object::integer(300))[..], &[0x01, 0xAC, 0x02]);
        assert_eq!(&encode(&Object::integer(-1))[..], &[0x02, 0x01]);
    }

    #[test]
    fn representative_objects() {
        let big = BigInt::from(u64::MAX) * BigInt::from(u64::MAX);
        roundtrip(Object::from_bigint(big.clone()));
        roundtrip(Object::from_bigint(-big));
        roundtrip(Object::Fraction(Fraction {
            negative: true,
            num: BigUint::from(1u32),
            den: BigUint::from(3u32),
        }));
        roundtrip(Object::decimal(
            BigDecimal::from_str("-1.25E-30").unwrap(),
            Precision::Decimal128,
        ));
        roundtrip(Object::Complex(Complex::polar(
            Object::integer(2),
            Object::decimal(BigDecimal::from_str("0.5").unwrap(), Precision::Decimal64),
        )));
        roundtrip(Object::Expression(vec![
            Object::symbol("X"),
            Object::integer(1),
            Object::Command(Command::Add),
        ]));
        roundtrip(Object::Unit(Unit {
            value: Box::new(Object::integer(3)),
            unit: vec![Object::symbol("m")],
        }));
        roundtrip(Object::Command(Command::Home));
    }

    #[test]
    fn polynomials_roundtrip() {
        let s = Settings::default();
        let x = Polynomial::variable(Symbol::new("X"));
        let y = Polynomial::variable(Symbol::new("Y"));
        let big = BigInt::from(u64::MAX) * BigInt::from(7);
        let p = x
            .pow(2, &s)
            .unwrap()
            .mul(&y, &s)
            .unwrap()
            .add(&Polynomial::constant(Object::from_bigint(-big)), &s)
            .unwrap();
        roundtrip(Object::Polynomial(p));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let mut object = Object::integer(1);
        for _ in 0..1100 {
            object = Object::List(vec![object]);
        }
        let bytes = encode(&object);
        assert!(matches!(decode(&bytes), Err(RplError::InvalidObject(_))));

        let mut shallow = Object::integer(1);
        for _ in 0..100 {
            shallow = Object::List(vec![shallow]);
        }
        roundtrip(shallow);
    }

    #[test]
    fn deep_lists_encode_in_one_pass() {
        let mut object = Object::integer(1);
        for _ in 0..1000 {
            object = Object::List(vec![object]);
        }
        let mut calls = 0usize;
        let written = object.encode_raw(&mut |_: &[u8]| calls += 1);
        let bytes = encode(&object);
        assert_eq!(written as usize, bytes.len());
        assert_eq!(object_size(&bytes).unwrap(), bytes.len());
        // Outer tag, two-byte length and one body write
        assert_eq!(calls, 4);
        assert_eq!(&bytes[bytes.len() - 2..], &[0x01, 0x01]);
    }

    #[test]
    fn unreduced_fraction_is_rejected() {
        // Fraction 2/4
        let bytes = [0x05, 0x02, 0x04];
        assert!(matches!(decode(&bytes), Err(RplError::InvalidObject(_))));
    }
}
