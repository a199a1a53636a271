//! Modbus/TCP client

use crate::common::frame::{FrameHeader, FrameWriter, MbapHeader, TxId};
use crate::common::function::FunctionCode;
use crate::common::phys::PhysLayer;
use crate::constants::frame::{HEADER_LENGTH, MAX_ADU_LENGTH};
use crate::error::{Error, InternalError, ParseError};
use crate::request::Request;
use crate::response::Response;
use crate::types::{AddressRange, Indexed, MaskWrite, UnitId, WriteMultiple};

/// A Modbus/TCP client that owns a single connection to a server.
///
/// The client is strictly serial: every operation writes one request and reads its
/// reply before returning, so there is never more than one request in flight. All
/// operations take `&mut self`, which statically prevents concurrent calls; put the
/// client behind a mutex or a channel if multiple tasks need to share it.
///
/// Operations are cancel-safe in the sense that dropping a future never delivers a
/// partial response. A cancelled or failed operation can leave unread reply bytes on
/// the socket, however, so the connection should be closed and re-established before
/// making further requests.
pub struct Client {
    phys: Option<PhysLayer>,
    tx_id: TxId,
    writer: FrameWriter,
}

impl Client {
    /// Create an unconnected client
    pub fn new() -> Self {
        Self {
            phys: None,
            tx_id: TxId::default(),
            writer: FrameWriter::new(),
        }
    }

    /// Resolve `host` and connect to `port`.
    ///
    /// On success the socket options recommended by the Modbus/TCP implementation
    /// guide (TCP_NODELAY and SO_KEEPALIVE) are applied and the client is marked
    /// connected.
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<(), Error> {
        let socket = tokio::net::TcpStream::connect((host, port)).await?;

        if let Ok(addr) = socket.peer_addr() {
            tracing::info!("connected to: {}", addr);
        }
        if let Err(err) = socket.set_nodelay(true) {
            tracing::warn!("unable to enable TCP_NODELAY: {}", err);
        }
        if let Err(err) = socket2::SockRef::from(&socket).set_keepalive(true) {
            tracing::warn!("unable to enable SO_KEEPALIVE: {}", err);
        }

        self.phys = Some(PhysLayer::new_tcp(socket));
        Ok(())
    }

    /// Returns true if the client holds an open connection
    pub fn is_connected(&self) -> bool {
        self.phys.is_some()
    }

    /// Shut the connection down and drop it.
    ///
    /// Subsequent operations fail with [`Error::NoConnection`] until
    /// [`Client::connect`] succeeds again.
    pub async fn close(&mut self) -> Result<(), Error> {
        if let Some(mut phys) = self.phys.take() {
            phys.shutdown().await?;
        }
        Ok(())
    }

    /// Read a range of coils.
    ///
    /// The reply encodes only a byte count, so the returned vector is padded with
    /// `false` up to the next multiple of eight bits; the first `range.count`
    /// entries are the requested values.
    pub async fn read_coils(
        &mut self,
        unit: UnitId,
        range: AddressRange,
    ) -> Result<Vec<bool>, Error> {
        let request = Request::ReadCoils(range.of_read_bits()?);
        match self.request(unit, &request).await? {
            Response::ReadCoils(values) => Ok(values),
            response => Err(unexpected(&response, FunctionCode::ReadCoils)),
        }
    }

    /// Read a range of discrete inputs.
    ///
    /// The returned vector is padded like [`Client::read_coils`].
    pub async fn read_discrete_inputs(
        &mut self,
        unit: UnitId,
        range: AddressRange,
    ) -> Result<Vec<bool>, Error> {
        let request = Request::ReadDiscreteInputs(range.of_read_bits()?);
        match self.request(unit, &request).await? {
            Response::ReadDiscreteInputs(values) => Ok(values),
            response => Err(unexpected(&response, FunctionCode::ReadDiscreteInputs)),
        }
    }

    /// Read a range of holding registers
    pub async fn read_holding_registers(
        &mut self,
        unit: UnitId,
        range: AddressRange,
    ) -> Result<Vec<u16>, Error> {
        let request = Request::ReadHoldingRegisters(range.of_read_registers()?);
        match self.request(unit, &request).await? {
            Response::ReadHoldingRegisters(values) => Ok(values),
            response => Err(unexpected(&response, FunctionCode::ReadHoldingRegisters)),
        }
    }

    /// Read a range of input registers
    pub async fn read_input_registers(
        &mut self,
        unit: UnitId,
        range: AddressRange,
    ) -> Result<Vec<u16>, Error> {
        let request = Request::ReadInputRegisters(range.of_read_registers()?);
        match self.request(unit, &request).await? {
            Response::ReadInputRegisters(values) => Ok(values),
            response => Err(unexpected(&response, FunctionCode::ReadInputRegisters)),
        }
    }

    /// Write a single coil, returning the echoed address and value
    pub async fn write_single_coil(
        &mut self,
        unit: UnitId,
        value: Indexed<bool>,
    ) -> Result<Indexed<bool>, Error> {
        match self.request(unit, &Request::WriteSingleCoil(value)).await? {
            Response::WriteSingleCoil(echo) => Ok(echo),
            response => Err(unexpected(&response, FunctionCode::WriteSingleCoil)),
        }
    }

    /// Write a single holding register, returning the echoed address and value
    pub async fn write_single_register(
        &mut self,
        unit: UnitId,
        value: Indexed<u16>,
    ) -> Result<Indexed<u16>, Error> {
        match self
            .request(unit, &Request::WriteSingleRegister(value))
            .await?
        {
            Response::WriteSingleRegister(echo) => Ok(echo),
            response => Err(unexpected(&response, FunctionCode::WriteSingleRegister)),
        }
    }

    /// Write multiple coils, returning the range that was written
    pub async fn write_multiple_coils(
        &mut self,
        unit: UnitId,
        request: WriteMultiple<bool>,
    ) -> Result<AddressRange, Error> {
        request.range.of_write_bits()?;
        match self
            .request(unit, &Request::WriteMultipleCoils(request))
            .await?
        {
            Response::WriteMultipleCoils(range) => Ok(range),
            response => Err(unexpected(&response, FunctionCode::WriteMultipleCoils)),
        }
    }

    /// Write multiple holding registers, returning the range that was written
    pub async fn write_multiple_registers(
        &mut self,
        unit: UnitId,
        request: WriteMultiple<u16>,
    ) -> Result<AddressRange, Error> {
        request.range.of_write_registers()?;
        match self
            .request(unit, &Request::WriteMultipleRegisters(request))
            .await?
        {
            Response::WriteMultipleRegisters(range) => Ok(range),
            response => Err(unexpected(&response, FunctionCode::WriteMultipleRegisters)),
        }
    }

    /// Apply an AND mask and an OR mask to a holding register, returning the echoed
    /// request.
    ///
    /// Compliant servers set the register to `(value & and_mask) | (or_mask & !and_mask)`.
    pub async fn mask_write_register(
        &mut self,
        unit: UnitId,
        request: MaskWrite,
    ) -> Result<MaskWrite, Error> {
        match self
            .request(unit, &Request::MaskWriteRegister(request))
            .await?
        {
            Response::MaskWriteRegister(echo) => Ok(echo),
            response => Err(unexpected(&response, FunctionCode::MaskWriteRegister)),
        }
    }

    async fn request(&mut self, unit: UnitId, request: &Request) -> Result<Response, Error> {
        if request.wire_length() > MAX_ADU_LENGTH {
            return Err(InternalError::AduTooBig(request.wire_length()).into());
        }

        let phys = self.phys.as_mut().ok_or(Error::NoConnection)?;

        let tx_id = self.tx_id.next();
        let frame = self
            .writer
            .format(FrameHeader::new(unit, tx_id), request)?;
        phys.write(frame).await?;

        let mut header_bytes = [0u8; HEADER_LENGTH];
        phys.read_exact(&mut header_bytes).await?;
        let header = MbapHeader::parse(&header_bytes)?;
        let adu_length = header.adu_length()?;

        let mut body = [0u8; MAX_ADU_LENGTH];
        phys.read_exact(&mut body[..adu_length]).await?;

        Response::parse_reply(request.function(), &body[..adu_length])
    }

    #[cfg(test)]
    fn from_mock(mock: tokio_test::io::Mock) -> Self {
        Self {
            phys: Some(PhysLayer::new_mock(mock)),
            tx_id: TxId::default(),
            writer: FrameWriter::new(),
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

fn unexpected(response: &Response, expected: FunctionCode) -> Error {
    ParseError::UnexpectedFunctionCode(response.function().get_value(), expected.get_value()).into()
}
