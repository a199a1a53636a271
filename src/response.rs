use crate::common::codec;
use crate::common::function::FunctionCode;
use crate::common::traits::{Parse, Serialize};
use crate::error::{Error, ParseError};
use crate::exception::ExceptionCode;
use crate::types::{AddressRange, Indexed, MaskWrite};

use scursor::{ReadCursor, WriteCursor};

/// One variant per supported response function
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Response {
    ReadCoils(Vec<bool>),
    ReadDiscreteInputs(Vec<bool>),
    ReadHoldingRegisters(Vec<u16>),
    ReadInputRegisters(Vec<u16>),
    WriteSingleCoil(Indexed<bool>),
    WriteSingleRegister(Indexed<u16>),
    WriteMultipleCoils(AddressRange),
    WriteMultipleRegisters(AddressRange),
    MaskWriteRegister(MaskWrite),
}

impl Response {
    pub(crate) fn function(&self) -> FunctionCode {
        match self {
            Response::ReadCoils(_) => FunctionCode::ReadCoils,
            Response::ReadDiscreteInputs(_) => FunctionCode::ReadDiscreteInputs,
            Response::ReadHoldingRegisters(_) => FunctionCode::ReadHoldingRegisters,
            Response::ReadInputRegisters(_) => FunctionCode::ReadInputRegisters,
            Response::WriteSingleCoil(_) => FunctionCode::WriteSingleCoil,
            Response::WriteSingleRegister(_) => FunctionCode::WriteSingleRegister,
            Response::WriteMultipleCoils(_) => FunctionCode::WriteMultipleCoils,
            Response::WriteMultipleRegisters(_) => FunctionCode::WriteMultipleRegisters,
            Response::MaskWriteRegister(_) => FunctionCode::MaskWriteRegister,
        }
    }

    /// Number of bytes the serialized ADU occupies, including the function code
    pub(crate) fn wire_length(&self) -> usize {
        match self {
            Response::ReadCoils(values) | Response::ReadDiscreteInputs(values) => {
                2 + codec::num_bytes_for_bits(values.len())
            }
            Response::ReadHoldingRegisters(values) | Response::ReadInputRegisters(values) => {
                2 + 2 * values.len()
            }
            Response::WriteSingleCoil(_)
            | Response::WriteSingleRegister(_)
            | Response::WriteMultipleCoils(_)
            | Response::WriteMultipleRegisters(_) => 5,
            Response::MaskWriteRegister(_) => 7,
        }
    }

    /// Parse the payload of a response whose function code was already consumed.
    ///
    /// Bit vectors decode to `byte_count * 8` entries: the wire carries no bit count,
    /// so trailing bits of the last byte are padding the caller must ignore.
    pub(crate) fn parse(function: FunctionCode, cursor: &mut ReadCursor) -> Result<Self, Error> {
        let response = match function {
            FunctionCode::ReadCoils => Response::ReadCoils(codec::parse_bits_response(cursor)?),
            FunctionCode::ReadDiscreteInputs => {
                Response::ReadDiscreteInputs(codec::parse_bits_response(cursor)?)
            }
            FunctionCode::ReadHoldingRegisters => {
                Response::ReadHoldingRegisters(codec::parse_registers_response(cursor)?)
            }
            FunctionCode::ReadInputRegisters => {
                Response::ReadInputRegisters(codec::parse_registers_response(cursor)?)
            }
            FunctionCode::WriteSingleCoil => {
                Response::WriteSingleCoil(Indexed::<bool>::parse(cursor)?)
            }
            FunctionCode::WriteSingleRegister => {
                Response::WriteSingleRegister(Indexed::<u16>::parse(cursor)?)
            }
            FunctionCode::WriteMultipleCoils => {
                Response::WriteMultipleCoils(AddressRange::parse(cursor)?)
            }
            FunctionCode::WriteMultipleRegisters => {
                Response::WriteMultipleRegisters(AddressRange::parse(cursor)?)
            }
            FunctionCode::MaskWriteRegister => {
                Response::MaskWriteRegister(MaskWrite::parse(cursor)?)
            }
        };
        codec::expect_empty(cursor)?;
        Ok(response)
    }

    /// Decode a complete reply ADU on the client side.
    ///
    /// Recognizes exception responses (function code with the high bit set, followed
    /// by the exception code when the frame is long enough to carry one) and validates
    /// that a data response matches the expected function.
    pub(crate) fn parse_reply(expected: FunctionCode, bytes: &[u8]) -> Result<Self, Error> {
        let mut cursor = ReadCursor::new(bytes);
        let function = cursor.read_u8()?;

        if function & 0x80 != 0 {
            return match cursor.read_u8() {
                Ok(code) => Err(Error::Exception(ExceptionCode::from(code))),
                Err(_) => Err(ParseError::MessageSizeMismatch.into()),
            };
        }

        if function != expected.get_value() {
            return Err(ParseError::UnexpectedFunctionCode(function, expected.get_value()).into());
        }

        Self::parse(expected, &mut cursor)
    }
}

impl Serialize for Response {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), Error> {
        cursor.write_u8(self.function().get_value())?;
        match self {
            Response::ReadCoils(values) | Response::ReadDiscreteInputs(values) => {
                codec::write_bits(cursor, values)
            }
            Response::ReadHoldingRegisters(values) | Response::ReadInputRegisters(values) => {
                codec::write_registers(cursor, values)
            }
            Response::WriteSingleCoil(value) => value.serialize(cursor),
            Response::WriteSingleRegister(value) => value.serialize(cursor),
            Response::WriteMultipleCoils(range) => range.serialize(cursor),
            Response::WriteMultipleRegisters(range) => range.serialize(cursor),
            Response::MaskWriteRegister(value) => value.serialize(cursor),
        }
    }
}
