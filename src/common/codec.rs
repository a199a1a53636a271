use crate::common::traits::Serialize;
use crate::error::{Error, InternalError, ParseError};
use crate::types::{coil_to_u16, AddressRange, Indexed, MaskWrite};

use scursor::{ReadCursor, WriteCursor};

impl Serialize for AddressRange {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), Error> {
        cursor.write_u16_be(self.start)?;
        cursor.write_u16_be(self.count)?;
        Ok(())
    }
}

impl Serialize for Indexed<bool> {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), Error> {
        cursor.write_u16_be(self.index)?;
        cursor.write_u16_be(coil_to_u16(self.value))?;
        Ok(())
    }
}

impl Serialize for Indexed<u16> {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), Error> {
        cursor.write_u16_be(self.index)?;
        cursor.write_u16_be(self.value)?;
        Ok(())
    }
}

impl Serialize for MaskWrite {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), Error> {
        cursor.write_u16_be(self.address)?;
        cursor.write_u16_be(self.and_mask)?;
        cursor.write_u16_be(self.or_mask)?;
        Ok(())
    }
}

pub(crate) fn num_bytes_for_bits(num_bits: usize) -> usize {
    num_bits.div_ceil(8)
}

pub(crate) fn byte_count_for_bits(num_bits: usize) -> Result<u8, InternalError> {
    let count = num_bytes_for_bits(num_bits);
    u8::try_from(count).map_err(|_| InternalError::BadByteCount(count))
}

pub(crate) fn byte_count_for_registers(num_registers: usize) -> Result<u8, InternalError> {
    let count = 2 * num_registers;
    u8::try_from(count).map_err(|_| InternalError::BadByteCount(count))
}

/// Write a bit sequence as a byte count followed by LSB-first packed bytes
pub(crate) fn write_bits(cursor: &mut WriteCursor, bits: &[bool]) -> Result<(), Error> {
    cursor.write_u8(byte_count_for_bits(bits.len())?)?;

    for byte in bits.chunks(8) {
        let mut acc: u8 = 0;
        for (count, bit) in byte.iter().enumerate() {
            if *bit {
                acc |= 1 << count as u8;
            }
        }
        cursor.write_u8(acc)?;
    }

    Ok(())
}

/// Write a register sequence as a byte count followed by big-endian words
pub(crate) fn write_registers(cursor: &mut WriteCursor, values: &[u16]) -> Result<(), Error> {
    cursor.write_u8(byte_count_for_registers(values.len())?)?;

    for value in values {
        cursor.write_u16_be(*value)?;
    }

    Ok(())
}

/// Read `count` bits packed LSB-first into `⌈count / 8⌉` bytes
pub(crate) fn read_packed_bits(cursor: &mut ReadCursor, count: usize) -> Result<Vec<bool>, Error> {
    let bytes = cursor.read_bytes(num_bytes_for_bits(count))?;

    let mut bits = Vec::with_capacity(count);
    for pos in 0..count {
        // the slice length was validated by the cursor read above
        let byte = bytes[pos / 8];
        bits.push(byte & (1 << (pos % 8)) != 0);
    }
    Ok(bits)
}

/// Read `count` big-endian words
pub(crate) fn read_registers(cursor: &mut ReadCursor, count: usize) -> Result<Vec<u16>, Error> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(cursor.read_u16_be()?);
    }
    Ok(values)
}

/// Parse the payload of a bit-vector response: a byte count followed by packed bytes.
///
/// The wire carries no bit count, so the returned vector always has `byte_count * 8`
/// entries. Callers that know the originally requested count must truncate.
pub(crate) fn parse_bits_response(cursor: &mut ReadCursor) -> Result<Vec<bool>, Error> {
    let byte_count = cursor.read_u8()? as usize;
    read_packed_bits(cursor, byte_count * 8)
}

/// Parse the payload of a register-vector response: a byte count followed by words
pub(crate) fn parse_registers_response(cursor: &mut ReadCursor) -> Result<Vec<u16>, Error> {
    let byte_count = cursor.read_u8()? as usize;
    if byte_count % 2 != 0 {
        return Err(ParseError::MessageSizeMismatch.into());
    }
    read_registers(cursor, byte_count / 2)
}

/// Error out if the cursor still holds unconsumed bytes
pub(crate) fn expect_empty(cursor: &ReadCursor) -> Result<(), Error> {
    if !cursor.is_empty() {
        return Err(ParseError::TrailingBytes(cursor.remaining()).into());
    }
    Ok(())
}
