use crate::error::Error;

use scursor::{ReadCursor, WriteCursor};

/// Types that can write themselves into a frame being assembled
pub(crate) trait Serialize {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), Error>;
}

/// Types that can read themselves from a received ADU
pub(crate) trait Parse: Sized {
    fn parse(cursor: &mut ReadCursor) -> Result<Self, Error>;
}
