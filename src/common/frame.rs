use crate::common::traits::Serialize;
use crate::constants::frame::{MAX_FRAME_LENGTH, MAX_LENGTH_FIELD};
use crate::error::{Error, ParseError};
use crate::exception::ExceptionCode;
use crate::types::UnitId;

use scursor::{ReadCursor, WriteCursor};

/// Transaction identifier used to correlate requests with responses
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub(crate) struct TxId {
    value: u16,
}

impl TxId {
    pub(crate) fn new(value: u16) -> Self {
        TxId { value }
    }

    pub(crate) fn to_u16(self) -> u16 {
        self.value
    }

    pub(crate) fn next(&mut self) -> TxId {
        let ret = self.value;
        self.value = self.value.wrapping_add(1);
        TxId::new(ret)
    }
}

impl Default for TxId {
    fn default() -> Self {
        TxId::new(0)
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:#06X}", self.value)
    }
}

/// Frame addressing information carried from a request to its reply
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct FrameHeader {
    pub(crate) unit_id: UnitId,
    pub(crate) tx_id: TxId,
}

impl FrameHeader {
    pub(crate) fn new(unit_id: UnitId, tx_id: TxId) -> Self {
        FrameHeader { unit_id, tx_id }
    }
}

/// Parsed MBAP header
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct MbapHeader {
    pub(crate) tx_id: TxId,
    pub(crate) unit_id: UnitId,
    pub(crate) length: u16,
}

impl MbapHeader {
    /// Parse the seven header bytes. The protocol id is always zero for Modbus and
    /// is ignored on receive.
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self, Error> {
        let mut cursor = ReadCursor::new(bytes);
        let tx_id = TxId::new(cursor.read_u16_be()?);
        let _protocol_id = cursor.read_u16_be()?;
        let length = cursor.read_u16_be()?;
        let unit_id = UnitId::new(cursor.read_u8()?);
        Ok(MbapHeader {
            tx_id,
            unit_id,
            length,
        })
    }

    /// The number of ADU bytes that follow the header (function code + body).
    ///
    /// The length field counts the unit identifier, so any well-formed frame has a
    /// value of at least two.
    pub(crate) fn adu_length(&self) -> Result<usize, ParseError> {
        let length = self.length as usize;
        if length < 2 {
            return Err(ParseError::MessageSizeMismatch);
        }
        if length > MAX_LENGTH_FIELD {
            return Err(ParseError::FrameLengthTooBig(length, MAX_LENGTH_FIELD));
        }
        Ok(length - 1)
    }

    pub(crate) fn frame_header(&self) -> FrameHeader {
        FrameHeader::new(self.unit_id, self.tx_id)
    }
}

impl std::fmt::Display for MbapHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "tx_id: {} unit: {} len: {}",
            self.tx_id, self.unit_id, self.length
        )
    }
}

/// Assembles complete frames into an internal buffer
pub(crate) struct FrameWriter {
    buffer: [u8; MAX_FRAME_LENGTH],
}

impl FrameWriter {
    pub(crate) fn new() -> Self {
        Self {
            buffer: [0; MAX_FRAME_LENGTH],
        }
    }

    /// Write the MBAP header and the serialized ADU, patching the length field once
    /// the ADU size is known
    pub(crate) fn format(
        &mut self,
        header: FrameHeader,
        msg: &dyn Serialize,
    ) -> Result<&[u8], Error> {
        let mut cursor = WriteCursor::new(&mut self.buffer);

        cursor.write_u16_be(header.tx_id.to_u16())?;
        cursor.write_u16_be(0)?; // protocol id
        let len_pos = cursor.position();
        cursor.skip(2)?; // write the length later
        cursor.write_u8(header.unit_id.value)?;

        let start_adu = cursor.position();
        msg.serialize(&mut cursor)?;
        let end_adu = cursor.position();

        // the length field includes the unit identifier
        let len_field = (end_adu - start_adu + 1) as u16;
        cursor.seek_to(len_pos)?;
        cursor.write_u16_be(len_field)?;

        Ok(&self.buffer[..end_adu])
    }
}

/// An exception reply: the errored function code followed by the exception code
pub(crate) struct ExceptionReply {
    function: u8,
    code: ExceptionCode,
}

impl ExceptionReply {
    /// `function` is the raw request function value; the high bit is set on serialization
    pub(crate) fn new(function: u8, code: ExceptionCode) -> Self {
        Self { function, code }
    }
}

impl Serialize for ExceptionReply {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), Error> {
        cursor.write_u8(self.function | 0x80)?;
        cursor.write_u8(u8::from(self.code))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockBody {
        body: &'static [u8],
    }

    impl Serialize for MockBody {
        fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), Error> {
            for b in self.body {
                cursor.write_u8(*b)?;
            }
            Ok(())
        }
    }

    //                            |   tx id  |  proto id |  length  | unit | fc | body      |
    const SIMPLE_FRAME: &[u8] = &[0x00, 0x07, 0x00, 0x00, 0x00, 0x04, 0x2A, 0x01, 0xCA, 0xFE];

    #[test]
    fn correctly_formats_frame() {
        let mut writer = FrameWriter::new();
        let msg = MockBody {
            body: &[0x01, 0xCA, 0xFE],
        };
        let bytes = writer
            .format(FrameHeader::new(UnitId::new(0x2A), TxId::new(7)), &msg)
            .unwrap();
        assert_eq!(bytes, SIMPLE_FRAME);
    }

    #[test]
    fn parses_header_fields() {
        let header = MbapHeader::parse(&SIMPLE_FRAME[..7]).unwrap();
        assert_eq!(header.tx_id, TxId::new(0x0007));
        assert_eq!(header.unit_id, UnitId::new(0x2A));
        assert_eq!(header.length, 4);
        assert_eq!(header.adu_length().unwrap(), 3);
    }

    #[test]
    fn rejects_length_that_cannot_hold_a_function_code() {
        let header = MbapHeader::parse(&[0x00, 0x07, 0x00, 0x00, 0x00, 0x01, 0x2A]).unwrap();
        assert_eq!(header.adu_length(), Err(ParseError::MessageSizeMismatch));
    }

    #[test]
    fn rejects_length_beyond_the_maximum() {
        let header = MbapHeader::parse(&[0x00, 0x07, 0x00, 0x00, 0x00, 0xFF, 0x2A]).unwrap();
        assert_eq!(
            header.adu_length(),
            Err(ParseError::FrameLengthTooBig(0xFF, MAX_LENGTH_FIELD))
        );
    }

    #[test]
    fn ignores_the_protocol_id_on_receive() {
        let header = MbapHeader::parse(&[0x00, 0x07, 0xCA, 0xFE, 0x00, 0x04, 0x2A]).unwrap();
        assert_eq!(header.adu_length().unwrap(), 3);
    }

    #[test]
    fn formats_nine_byte_exception_reply() {
        let mut writer = FrameWriter::new();
        let reply = ExceptionReply::new(0x00, ExceptionCode::IllegalFunction);
        let bytes = writer
            .format(FrameHeader::new(UnitId::new(0x38), TxId::new(1)), &reply)
            .unwrap();
        assert_eq!(
            bytes,
            &[0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x38, 0x80, 0x01]
        );
    }

    #[test]
    fn transaction_ids_increment_and_wrap() {
        let mut tx_id = TxId::new(u16::MAX - 1);
        assert_eq!(tx_id.next(), TxId::new(u16::MAX - 1));
        assert_eq!(tx_id.next(), TxId::new(u16::MAX));
        assert_eq!(tx_id.next(), TxId::new(0));
    }
}
