/// The default Modbus/TCP port
pub const DEFAULT_PORT: u16 = 502;

pub(crate) mod frame {
    /// length of the MBAP header in bytes
    pub(crate) const HEADER_LENGTH: usize = 7;
    /// maximum size of an ADU (function code + payload)
    pub(crate) const MAX_ADU_LENGTH: usize = 253;
    /// maximum size of a complete frame on the wire
    pub(crate) const MAX_FRAME_LENGTH: usize = HEADER_LENGTH + MAX_ADU_LENGTH;
    /// maximum value of the MBAP length field (the unit id counts towards it)
    pub(crate) const MAX_LENGTH_FIELD: usize = MAX_ADU_LENGTH + 1;
}

pub(crate) mod coil {
    pub(crate) const ON: u16 = 0xFF00;
    pub(crate) const OFF: u16 = 0x0000;
}

pub(crate) mod exceptions {
    pub(crate) const ILLEGAL_FUNCTION: u8 = 0x01;
    pub(crate) const ILLEGAL_DATA_ADDRESS: u8 = 0x02;
    pub(crate) const ILLEGAL_DATA_VALUE: u8 = 0x03;
    pub(crate) const SERVER_DEVICE_FAILURE: u8 = 0x04;
    pub(crate) const ACKNOWLEDGE: u8 = 0x05;
    pub(crate) const SERVER_DEVICE_BUSY: u8 = 0x06;
    pub(crate) const MEMORY_PARITY_ERROR: u8 = 0x08;
    pub(crate) const GATEWAY_PATH_UNAVAILABLE: u8 = 0x0A;
    pub(crate) const GATEWAY_TARGET_DEVICE_FAILED_TO_RESPOND: u8 = 0x0B;
}

pub(crate) mod limits {
    pub(crate) const MAX_READ_COILS_COUNT: u16 = 0x07D0;
    pub(crate) const MAX_READ_REGISTERS_COUNT: u16 = 0x007D;
    pub(crate) const MAX_WRITE_COILS_COUNT: u16 = 0x07B0;
    pub(crate) const MAX_WRITE_REGISTERS_COUNT: u16 = 0x007B;
}
