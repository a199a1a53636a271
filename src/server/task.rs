use std::time::Duration;

use crate::common::frame::{ExceptionReply, FrameHeader, FrameWriter, MbapHeader};
use crate::common::function::FunctionCode;
use crate::common::phys::PhysLayer;
use crate::constants::frame::{HEADER_LENGTH, MAX_ADU_LENGTH};
use crate::error::{Error, ParseError};
use crate::exception::ExceptionCode;
use crate::request::Request;
use crate::response::Response;
use crate::server::handler::{ServerHandler, ServerHandlerType};
use crate::types::UnitId;

use scursor::ReadCursor;

/// a session that receives no header bytes for this long is closed silently
pub(crate) const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) struct SessionTask<H>
where
    H: ServerHandler,
{
    phys: PhysLayer,
    handler: ServerHandlerType<H>,
    writer: FrameWriter,
}

impl<H> SessionTask<H>
where
    H: ServerHandler,
{
    pub(crate) fn new(phys: PhysLayer, handler: ServerHandlerType<H>) -> Self {
        Self {
            phys,
            handler,
            writer: FrameWriter::new(),
        }
    }

    /// Run the session until the peer closes, the idle timer fires, or framing
    /// becomes inconsistent
    pub(crate) async fn run(&mut self) -> Result<(), Error> {
        loop {
            let mut header_bytes = [0u8; HEADER_LENGTH];
            match tokio::time::timeout(IDLE_TIMEOUT, self.phys.read_exact(&mut header_bytes)).await
            {
                Err(_) => {
                    tracing::info!(
                        "closing session after {} seconds of inactivity",
                        IDLE_TIMEOUT.as_secs()
                    );
                    return Ok(());
                }
                // the header boundary is the clean close point of the protocol
                Ok(Err(err)) => {
                    tracing::info!("session ended: {}", err);
                    return Ok(());
                }
                Ok(Ok(())) => {}
            }

            let header = MbapHeader::parse(&header_bytes)?;
            let adu_length = match header.adu_length() {
                Ok(x) => x,
                Err(ParseError::MessageSizeMismatch) => {
                    // too short to hold a function code: reply and keep the session
                    self.reply_with_exception(
                        header.frame_header(),
                        0x00,
                        ExceptionCode::IllegalFunction,
                    )
                    .await?;
                    continue;
                }
                Err(err) => {
                    // an oversized frame cannot be skipped reliably
                    tracing::warn!("closing session: {}", err);
                    self.reply_with_exception(
                        header.frame_header(),
                        0x00,
                        ExceptionCode::IllegalDataValue,
                    )
                    .await?;
                    return Err(err.into());
                }
            };

            let mut body = [0u8; MAX_ADU_LENGTH];
            if let Err(err) = self.phys.read_exact(&mut body[..adu_length]).await {
                // the peer stopped mid-frame, so the stream cannot be resynchronized
                tracing::warn!("closing session with inconsistent framing: {}", err);
                self.reply_with_exception(
                    header.frame_header(),
                    0x00,
                    ExceptionCode::IllegalDataValue,
                )
                .await
                .ok();
                return Err(err.into());
            }

            self.reply(header.frame_header(), &body[..adu_length]).await?;
        }
    }

    async fn reply(&mut self, header: FrameHeader, adu: &[u8]) -> Result<(), Error> {
        let mut cursor = ReadCursor::new(adu);
        let function_value = cursor.read_u8()?;

        let function = match FunctionCode::get(function_value) {
            Some(x) => x,
            None => {
                tracing::warn!("received unknown function code: {:#04X}", function_value);
                return self
                    .reply_with_exception(header, function_value, ExceptionCode::IllegalFunction)
                    .await;
            }
        };

        let request = match Request::parse(function, &mut cursor) {
            Ok(x) => x,
            Err(err) => {
                tracing::warn!("error parsing {} request: {}", function, err);
                return self
                    .reply_with_exception(
                        header,
                        function.get_value(),
                        ExceptionCode::IllegalDataValue,
                    )
                    .await;
            }
        };

        let frame = match self.handle(header.unit_id, request) {
            // a handler that produces more data than a frame can carry is a defect
            // in the handler, not in the peer
            Ok(response) if response.wire_length() > MAX_ADU_LENGTH => {
                tracing::warn!(
                    "handler returned an oversized {} response ({} bytes)",
                    function,
                    response.wire_length()
                );
                self.writer.format(
                    header,
                    &ExceptionReply::new(function.get_value(), ExceptionCode::ServerDeviceFailure),
                )?
            }
            Ok(response) => self.writer.format(header, &response)?,
            Err(ex) => self
                .writer
                .format(header, &ExceptionReply::new(function.get_value(), ex))?,
        };
        self.phys.write(frame).await?;
        Ok(())
    }

    fn handle(&mut self, unit: UnitId, request: Request) -> Result<Response, ExceptionCode> {
        let mut handler = match self.handler.lock() {
            Ok(guard) => guard,
            Err(_) => return Err(ExceptionCode::ServerDeviceFailure),
        };

        match request {
            Request::ReadCoils(range) => handler.read_coils(unit, range).map(Response::ReadCoils),
            Request::ReadDiscreteInputs(range) => handler
                .read_discrete_inputs(unit, range)
                .map(Response::ReadDiscreteInputs),
            Request::ReadHoldingRegisters(range) => handler
                .read_holding_registers(unit, range)
                .map(Response::ReadHoldingRegisters),
            Request::ReadInputRegisters(range) => handler
                .read_input_registers(unit, range)
                .map(Response::ReadInputRegisters),
            Request::WriteSingleCoil(value) => handler
                .write_single_coil(unit, value)
                .map(|_| Response::WriteSingleCoil(value)),
            Request::WriteSingleRegister(value) => handler
                .write_single_register(unit, value)
                .map(|_| Response::WriteSingleRegister(value)),
            Request::WriteMultipleCoils(values) => {
                let range = values.range();
                handler
                    .write_multiple_coils(unit, values)
                    .map(|_| Response::WriteMultipleCoils(range))
            }
            Request::WriteMultipleRegisters(values) => {
                let range = values.range();
                handler
                    .write_multiple_registers(unit, values)
                    .map(|_| Response::WriteMultipleRegisters(range))
            }
            Request::MaskWriteRegister(value) => handler
                .mask_write_register(unit, value)
                .map(|_| Response::MaskWriteRegister(value)),
        }
    }

    async fn reply_with_exception(
        &mut self,
        header: FrameHeader,
        function: u8,
        ex: ExceptionCode,
    ) -> Result<(), Error> {
        let frame = self.writer.format(header, &ExceptionReply::new(function, ex))?;
        self.phys.write(frame).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AddressRange, Indexed};

    use tokio_test::io::Builder;

    struct TestHandler {
        coils: [bool; 4],
    }

    impl ServerHandler for TestHandler {
        fn read_coils(
            &mut self,
            _unit: UnitId,
            range: AddressRange,
        ) -> Result<Vec<bool>, ExceptionCode> {
            Self::get_range_of(&self.coils, range)
        }

        fn write_single_coil(
            &mut self,
            _unit: UnitId,
            value: Indexed<bool>,
        ) -> Result<(), ExceptionCode> {
            match self.coils.get_mut(value.index as usize) {
                Some(x) => {
                    *x = value.value;
                    Ok(())
                }
                None => Err(ExceptionCode::IllegalDataAddress),
            }
        }
    }

    fn test_handler() -> ServerHandlerType<TestHandler> {
        TestHandler {
            coils: [true, false, true, false],
        }
        .wrap()
    }

    struct NullHandler;
    impl ServerHandler for NullHandler {}

    #[tokio::test]
    async fn replies_to_read_coils_and_echoes_the_header() {
        let request = [
            0x00, 0x07, 0x00, 0x00, 0x00, 0x06, 0x2A, 0x01, 0x00, 0x00, 0x00, 0x04,
        ];
        let reply = [0x00, 0x07, 0x00, 0x00, 0x00, 0x04, 0x2A, 0x01, 0x01, 0x05];
        let mock = Builder::new().read(&request).write(&reply).build();
        let mut task = SessionTask::new(PhysLayer::new_mock(mock), test_handler());

        // the peer closes after the reply, which ends the session cleanly
        task.run().await.unwrap();
    }

    #[tokio::test]
    async fn replies_to_write_single_coil() {
        let request = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x2A, 0x05, 0x00, 0x01, 0xFF, 0x00,
        ];
        let reply = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x2A, 0x05, 0x00, 0x01, 0xFF, 0x00,
        ];
        let mock = Builder::new().read(&request).write(&reply).build();
        let handler = test_handler();
        let mut task = SessionTask::new(PhysLayer::new_mock(mock), handler.clone());

        task.run().await.unwrap();
        assert!(handler.lock().unwrap().coils[1]);
    }

    #[tokio::test]
    async fn replies_with_illegal_function_when_length_cannot_hold_one() {
        let request = [0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x38];
        let reply = [0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x38, 0x80, 0x01];
        let mock = Builder::new().read(&request).write(&reply).build();
        let mut task = SessionTask::new(PhysLayer::new_mock(mock), test_handler());

        task.run().await.unwrap();
    }

    #[tokio::test]
    async fn replies_with_illegal_function_for_unknown_function_code() {
        let request = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x38, 0x07];
        let reply = [0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x38, 0x87, 0x01];
        let mock = Builder::new().read(&request).write(&reply).build();
        let mut task = SessionTask::new(PhysLayer::new_mock(mock), test_handler());

        task.run().await.unwrap();
    }

    #[tokio::test]
    async fn replies_with_illegal_data_value_when_request_does_not_parse() {
        // byte count of 2 disagrees with a bit count of 8
        let request = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x09, 0x38, 0x0F, 0x00, 0x00, 0x00, 0x08, 0x02, 0xFF,
            0xFF,
        ];
        let reply = [0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x38, 0x8F, 0x03];
        let mock = Builder::new().read(&request).write(&reply).build();
        let mut task = SessionTask::new(PhysLayer::new_mock(mock), test_handler());

        task.run().await.unwrap();
    }

    #[tokio::test]
    async fn forwards_handler_exceptions_verbatim() {
        // NullHandler denies everything with ILLEGAL FUNCTION
        let request = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x38, 0x01, 0x00, 0x00, 0x00, 0x01,
        ];
        let reply = [0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x38, 0x81, 0x01];
        let mock = Builder::new().read(&request).write(&reply).build();
        let mut task = SessionTask::new(PhysLayer::new_mock(mock), NullHandler.wrap());

        task.run().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn closes_silently_after_the_idle_timeout() {
        let (mock, _handle) = Builder::new().build_with_handle();
        let mut task = SessionTask::new(PhysLayer::new_mock(mock), test_handler());

        let start = tokio::time::Instant::now();
        task.run().await.unwrap();
        assert!(start.elapsed() >= IDLE_TIMEOUT);
    }

    #[tokio::test]
    async fn terminates_on_oversized_length_field() {
        let request = [0x00, 0x01, 0x00, 0x00, 0x00, 0xFF, 0x38];
        let reply = [0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x38, 0x80, 0x03];
        let mock = Builder::new().read(&request).write(&reply).build();
        let mut task = SessionTask::new(PhysLayer::new_mock(mock), test_handler());

        let err = task.run().await.unwrap_err();
        assert_eq!(err, ParseError::FrameLengthTooBig(0xFF, 254).into());
    }
}
