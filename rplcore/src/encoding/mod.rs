//! Compact byte encoding of objects.
//!
//! An encoded object is an LEB128 tag followed by a tag-specific payload (see
//! [`crate::object::id`]). Encoded objects are self-describing: their size is
//! recovered by walking the payload with [`object_size`].
use smallvec::SmallVec;

use crate::{
    error::{RplError, RplResult},
    object::{COMMAND_BASE, ObjectId},
};

pub mod codec;
pub mod integer;

pub use codec::decode;
pub use integer::{decode_u64, encode_u64, encoded_size_u64};

/// A small, stack-allocated-first buffer used by the encoder.
///
/// Backed by `smallvec`, this stores up to 32 bytes inline before spilling to the heap.
pub type DynBuf = SmallVec<[u8; 32]>;

/// Trait for types that can append their raw encoding into a buffer.
pub trait RawEncodable {
    /// Write the encoding through `f`, returning the number of bytes written.
    fn encode_raw<F: FnMut(&[u8])>(&self, f: &mut F) -> u64;

    fn encode_dynbuf(&self, buf: &mut DynBuf) {
        self.encode_raw(&mut |b| buf.extend_from_slice(b));
    }

    fn encoded_size(&self) -> u64 {
        let mut size = 0u64;
        self.encode_raw(&mut |b| size += b.len() as u64);
        size
    }
}

impl<T: RawEncodable> RawEncodable for &T {
    #[inline]
    fn encode_raw<F: FnMut(&[u8])>(&self, f: &mut F) -> u64 {
        (*self).encode_raw(f)
    }
}

/// Forward cursor over encoded bytes.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> &'a [u8] {
        self.buf
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn u64(&mut self) -> RplResult<u64> {
        decode_u64(&mut self.buf).ok_or(RplError::InvalidObject("truncated LEB128 value"))
    }

    pub fn length(&mut self) -> RplResult<usize> {
        usize::try_from(self.u64()?).map_err(|_| RplError::InvalidObject("length out of range"))
    }

    pub fn bytes(&mut self, len: usize) -> RplResult<&'a [u8]> {
        if len > self.buf.len() {
            return Err(RplError::InvalidObject("payload extends past the end"));
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// A length-prefixed byte string.
    pub fn counted(&mut self) -> RplResult<&'a [u8]> {
        let len = self.length()?;
        self.bytes(len)
    }

    /// Skip one encoded object, returning its bytes.
    pub fn skip_object(&mut self) -> RplResult<&'a [u8]> {
        let size = object_size(self.buf)?;
        self.bytes(size)
    }
}

/// Size in bytes of the encoded object at the start of `bytes`.
pub fn object_size(bytes: &[u8]) -> RplResult<usize> {
    let mut reader = Reader::new(bytes);
    let tag = reader.u64()?;
    if tag >= COMMAND_BASE {
        return Ok(bytes.len() - reader.remaining().len());
    }

    let id = ObjectId::from_tag(tag).ok_or(RplError::InvalidObject("unknown type tag"))?;
    match id {
        ObjectId::Integer | ObjectId::NegInteger => {
            reader.u64()?;
        }
        ObjectId::Fraction | ObjectId::NegFraction => {
            reader.u64()?;
            reader.u64()?;
        }
        ObjectId::BigFraction | ObjectId::NegBigFraction => {
            reader.counted()?;
            reader.counted()?;
        }
        ObjectId::Decimal32 | ObjectId::Decimal64 | ObjectId::Decimal128 => {
            reader.u64()?;
            reader.counted()?;
        }
        ObjectId::Rectangular | ObjectId::Polar | ObjectId::Unit => {
            reader.skip_object()?;
            reader.skip_object()?;
        }
        ObjectId::Bignum
        | ObjectId::NegBignum
        | ObjectId::Symbol
        | ObjectId::Text
        | ObjectId::List
        | ObjectId::Array
        | ObjectId::Program
        | ObjectId::Expression
        | ObjectId::Polynomial => {
            reader.counted()?;
        }
    }

    Ok(bytes.len() - reader.remaining().len())
}

/// Iterator over the encoded elements of a sequence payload.
pub struct SequenceIter<'a> {
    reader: Reader<'a>,
}

impl<'a> SequenceIter<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            reader: Reader::new(payload),
        }
    }
}

impl<'a> Iterator for SequenceIter<'a> {
    type Item = RplResult<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reader.is_empty() {
            None
        } else {
            Some(self.reader.skip_object())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;

    #[test]
    fn size_of_nested_sequence() {
        let list = Object::List(vec![
            Object::integer(1),
            Object::text("abc"),
            Object::Program(vec![Object::symbol("X")]),
        ]);
        let mut buf = DynBuf::new();
        list.encode_dynbuf(&mut buf);
        buf.extend_from_slice(&[0xEE, 0xEE]);
        assert_eq!(object_size(&buf).unwrap(), buf.len() - 2);
        assert_eq!(list.encoded_size() as usize, buf.len() - 2);
    }

    #[test]
    fn sequence_iter_walks_elements() {
        let items = vec![Object::integer(300), Object::integer(-2), Object::symbol("Y")];
        let mut payload = DynBuf::new();
        for item in &items {
            item.encode_dynbuf(&mut payload);
        }
        let parts: Vec<&[u8]> = SequenceIter::new(&payload)
            .collect::<RplResult<Vec<_>>>()
            .unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(decode(parts[1]).unwrap().0, Object::integer(-2));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let mut buf = DynBuf::new();
        Object::text("hello").encode_dynbuf(&mut buf);
        buf.truncate(buf.len() - 1);
        assert!(matches!(object_size(&buf), Err(RplError::InvalidObject(_))));
    }
}
