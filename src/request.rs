use crate::common::codec;
use crate::common::function::FunctionCode;
use crate::common::traits::{Parse, Serialize};
use crate::error::{Error, ParseError};
use crate::types::{AddressRange, Indexed, MaskWrite, WriteMultiple};

use scursor::{ReadCursor, WriteCursor};

/// One variant per supported request function
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Request {
    ReadCoils(AddressRange),
    ReadDiscreteInputs(AddressRange),
    ReadHoldingRegisters(AddressRange),
    ReadInputRegisters(AddressRange),
    WriteSingleCoil(Indexed<bool>),
    WriteSingleRegister(Indexed<u16>),
    WriteMultipleCoils(WriteMultiple<bool>),
    WriteMultipleRegisters(WriteMultiple<u16>),
    MaskWriteRegister(MaskWrite),
}

impl Request {
    pub(crate) fn function(&self) -> FunctionCode {
        match self {
            Request::ReadCoils(_) => FunctionCode::ReadCoils,
            Request::ReadDiscreteInputs(_) => FunctionCode::ReadDiscreteInputs,
            Request::ReadHoldingRegisters(_) => FunctionCode::ReadHoldingRegisters,
            Request::ReadInputRegisters(_) => FunctionCode::ReadInputRegisters,
            Request::WriteSingleCoil(_) => FunctionCode::WriteSingleCoil,
            Request::WriteSingleRegister(_) => FunctionCode::WriteSingleRegister,
            Request::WriteMultipleCoils(_) => FunctionCode::WriteMultipleCoils,
            Request::WriteMultipleRegisters(_) => FunctionCode::WriteMultipleRegisters,
            Request::MaskWriteRegister(_) => FunctionCode::MaskWriteRegister,
        }
    }

    /// Number of bytes the serialized ADU occupies, including the function code
    pub(crate) fn wire_length(&self) -> usize {
        match self {
            Request::ReadCoils(_)
            | Request::ReadDiscreteInputs(_)
            | Request::ReadHoldingRegisters(_)
            | Request::ReadInputRegisters(_)
            | Request::WriteSingleCoil(_)
            | Request::WriteSingleRegister(_) => 5,
            Request::WriteMultipleCoils(request) => {
                6 + codec::num_bytes_for_bits(request.values.len())
            }
            Request::WriteMultipleRegisters(request) => 6 + 2 * request.values.len(),
            Request::MaskWriteRegister(_) => 7,
        }
    }

    /// Parse the payload of a request whose function code was already consumed.
    ///
    /// The entire remainder of the cursor must be consumed by the payload.
    pub(crate) fn parse(function: FunctionCode, cursor: &mut ReadCursor) -> Result<Self, Error> {
        let request = match function {
            FunctionCode::ReadCoils => {
                Request::ReadCoils(AddressRange::parse(cursor)?.of_read_bits()?)
            }
            FunctionCode::ReadDiscreteInputs => {
                Request::ReadDiscreteInputs(AddressRange::parse(cursor)?.of_read_bits()?)
            }
            FunctionCode::ReadHoldingRegisters => {
                Request::ReadHoldingRegisters(AddressRange::parse(cursor)?.of_read_registers()?)
            }
            FunctionCode::ReadInputRegisters => {
                Request::ReadInputRegisters(AddressRange::parse(cursor)?.of_read_registers()?)
            }
            FunctionCode::WriteSingleCoil => {
                Request::WriteSingleCoil(Indexed::<bool>::parse(cursor)?)
            }
            FunctionCode::WriteSingleRegister => {
                Request::WriteSingleRegister(Indexed::<u16>::parse(cursor)?)
            }
            FunctionCode::WriteMultipleCoils => {
                let range = AddressRange::parse(cursor)?.of_write_bits()?;
                let byte_count = cursor.read_u8()? as usize;
                if byte_count != codec::num_bytes_for_bits(range.count as usize) {
                    return Err(ParseError::MessageSizeMismatch.into());
                }
                let values = codec::read_packed_bits(cursor, range.count as usize)?;
                Request::WriteMultipleCoils(WriteMultiple { range, values })
            }
            FunctionCode::WriteMultipleRegisters => {
                let range = AddressRange::parse(cursor)?.of_write_registers()?;
                let byte_count = cursor.read_u8()? as usize;
                if byte_count != 2 * range.count as usize {
                    return Err(ParseError::MessageSizeMismatch.into());
                }
                let values = codec::read_registers(cursor, range.count as usize)?;
                Request::WriteMultipleRegisters(WriteMultiple { range, values })
            }
            FunctionCode::MaskWriteRegister => Request::MaskWriteRegister(MaskWrite::parse(cursor)?),
        };
        codec::expect_empty(cursor)?;
        Ok(request)
    }
}

impl Serialize for Request {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), Error> {
        cursor.write_u8(self.function().get_value())?;
        match self {
            Request::ReadCoils(range)
            | Request::ReadDiscreteInputs(range)
            | Request::ReadHoldingRegisters(range)
            | Request::ReadInputRegisters(range) => range.serialize(cursor),
            Request::WriteSingleCoil(value) => value.serialize(cursor),
            Request::WriteSingleRegister(value) => value.serialize(cursor),
            Request::WriteMultipleCoils(request) => {
                request.range.serialize(cursor)?;
                codec::write_bits(cursor, &request.values)
            }
            Request::WriteMultipleRegisters(request) => {
                request.range.serialize(cursor)?;
                codec::write_registers(cursor, &request.values)
            }
            Request::MaskWriteRegister(request) => request.serialize(cursor),
        }
    }
}
