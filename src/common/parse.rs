use crate::common::traits::Parse;
use crate::error::Error;
use crate::types::{coil_from_u16, AddressRange, Indexed, MaskWrite};

use scursor::ReadCursor;

impl Parse for AddressRange {
    fn parse(cursor: &mut ReadCursor) -> Result<Self, Error> {
        Ok(AddressRange::try_from(
            cursor.read_u16_be()?,
            cursor.read_u16_be()?,
        )?)
    }
}

impl Parse for Indexed<bool> {
    fn parse(cursor: &mut ReadCursor) -> Result<Self, Error> {
        Ok(Indexed::new(
            cursor.read_u16_be()?,
            coil_from_u16(cursor.read_u16_be()?)?,
        ))
    }
}

impl Parse for Indexed<u16> {
    fn parse(cursor: &mut ReadCursor) -> Result<Self, Error> {
        Ok(Indexed::new(cursor.read_u16_be()?, cursor.read_u16_be()?))
    }
}

impl Parse for MaskWrite {
    fn parse(cursor: &mut ReadCursor) -> Result<Self, Error> {
        Ok(MaskWrite::new(
            cursor.read_u16_be()?,
            cursor.read_u16_be()?,
            cursor.read_u16_be()?,
        ))
    }
}
