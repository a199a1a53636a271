use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use mbtcp::client::Client;
use mbtcp::server::{Server, ServerHandler, ServerHandlerType};
use mbtcp::{AddressRange, Error, ExceptionCode, Indexed, MaskWrite, UnitId, WriteMultiple};

struct Handler {
    coils: [bool; 10],
    discrete_inputs: [bool; 10],
    holding_registers: [u16; 10],
    input_registers: [u16; 10],
}

impl Handler {
    fn new() -> Self {
        Self {
            coils: [false; 10],
            discrete_inputs: [false; 10],
            holding_registers: [0; 10],
            input_registers: [0; 10],
        }
    }
}

impl ServerHandler for Handler {
    fn read_coils(&mut self, _unit: UnitId, range: AddressRange) -> Result<Vec<bool>, ExceptionCode> {
        Self::get_range_of(&self.coils, range)
    }

    fn read_discrete_inputs(
        &mut self,
        _unit: UnitId,
        range: AddressRange,
    ) -> Result<Vec<bool>, ExceptionCode> {
        Self::get_range_of(&self.discrete_inputs, range)
    }

    fn read_holding_registers(
        &mut self,
        _unit: UnitId,
        range: AddressRange,
    ) -> Result<Vec<u16>, ExceptionCode> {
        Self::get_range_of(&self.holding_registers, range)
    }

    fn read_input_registers(
        &mut self,
        _unit: UnitId,
        range: AddressRange,
    ) -> Result<Vec<u16>, ExceptionCode> {
        Self::get_range_of(&self.input_registers, range)
    }

    fn write_single_coil(&mut self, _unit: UnitId, value: Indexed<bool>) -> Result<(), ExceptionCode> {
        match self.coils.get_mut(value.index as usize) {
            Some(x) => {
                *x = value.value;
                Ok(())
            }
            None => Err(ExceptionCode::IllegalDataAddress),
        }
    }

    fn write_single_register(
        &mut self,
        _unit: UnitId,
        value: Indexed<u16>,
    ) -> Result<(), ExceptionCode> {
        match self.holding_registers.get_mut(value.index as usize) {
            Some(x) => {
                *x = value.value;
                Ok(())
            }
            None => Err(ExceptionCode::IllegalDataAddress),
        }
    }

    fn write_multiple_coils(
        &mut self,
        _unit: UnitId,
        values: WriteMultiple<bool>,
    ) -> Result<(), ExceptionCode> {
        for (address, value) in values.range().to_std_range().zip(values.values()) {
            match self.coils.get_mut(address) {
                Some(x) => *x = *value,
                None => return Err(ExceptionCode::IllegalDataAddress),
            }
        }
        Ok(())
    }

    fn write_multiple_registers(
        &mut self,
        _unit: UnitId,
        values: WriteMultiple<u16>,
    ) -> Result<(), ExceptionCode> {
        for (address, value) in values.range().to_std_range().zip(values.values()) {
            match self.holding_registers.get_mut(address) {
                Some(x) => *x = *value,
                None => return Err(ExceptionCode::IllegalDataAddress),
            }
        }
        Ok(())
    }

    fn mask_write_register(&mut self, _unit: UnitId, value: MaskWrite) -> Result<(), ExceptionCode> {
        match self.holding_registers.get_mut(value.address as usize) {
            Some(x) => {
                *x = (*x & value.and_mask) | (value.or_mask & !value.and_mask);
                Ok(())
            }
            None => Err(ExceptionCode::IllegalDataAddress),
        }
    }
}

async fn spawn_server(handler: ServerHandlerType<Handler>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server = Server::new(listener, handler);
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

#[tokio::test]
async fn requests_and_responses() {
    let handler = Handler::new().wrap();
    let addr = spawn_server(handler.clone()).await;

    let mut client = Client::new();
    client.connect("127.0.0.1", addr.port()).await.unwrap();
    assert!(client.is_connected());

    let unit = UnitId::new(0x01);

    {
        let mut guard = handler.lock().unwrap();
        guard.discrete_inputs[0] = true;
        guard.input_registers[0] = 0xCAFE;
    }

    let inputs = client
        .read_discrete_inputs(unit, AddressRange::try_from(0, 2).unwrap())
        .await
        .unwrap();
    assert_eq!(&inputs[..2], &[true, false]);

    assert_eq!(
        client
            .read_input_registers(unit, AddressRange::try_from(0, 2).unwrap())
            .await
            .unwrap(),
        vec![0xCAFE, 0x0000]
    );

    // do a single coil write and verify that it was written by reading it
    assert_eq!(
        client
            .write_single_coil(unit, Indexed::new(1, true))
            .await
            .unwrap(),
        Indexed::new(1, true)
    );
    let coils = client
        .read_coils(unit, AddressRange::try_from(0, 2).unwrap())
        .await
        .unwrap();
    assert_eq!(&coils[..2], &[false, true]);

    // do a single register write and verify that it was written by reading it
    assert_eq!(
        client
            .write_single_register(unit, Indexed::new(1, 0xABCD))
            .await
            .unwrap(),
        Indexed::new(1, 0xABCD)
    );
    assert_eq!(
        client
            .read_holding_registers(unit, AddressRange::try_from(0, 2).unwrap())
            .await
            .unwrap(),
        vec![0x0000, 0xABCD]
    );

    // write multiple coils and verify that they were written
    assert_eq!(
        client
            .write_multiple_coils(unit, WriteMultiple::from(0, vec![true, true, true]).unwrap())
            .await
            .unwrap(),
        AddressRange::try_from(0, 3).unwrap()
    );
    let coils = client
        .read_coils(unit, AddressRange::try_from(0, 4).unwrap())
        .await
        .unwrap();
    assert_eq!(&coils[..4], &[true, true, true, false]);

    // write multiple registers and verify that they were written
    assert_eq!(
        client
            .write_multiple_registers(
                unit,
                WriteMultiple::from(0, vec![0x0102, 0x0304, 0x0506]).unwrap()
            )
            .await
            .unwrap(),
        AddressRange::try_from(0, 3).unwrap()
    );
    assert_eq!(
        client
            .read_holding_registers(unit, AddressRange::try_from(0, 3).unwrap())
            .await
            .unwrap(),
        vec![0x0102, 0x0304, 0x0506]
    );

    // mask-write register 7: preserve the low nibble, set bit 4
    assert_eq!(
        client
            .write_single_register(unit, Indexed::new(7, 0xFFFF))
            .await
            .unwrap(),
        Indexed::new(7, 0xFFFF)
    );
    assert_eq!(
        client
            .mask_write_register(unit, MaskWrite::new(7, 0x000F, 0x0010))
            .await
            .unwrap(),
        MaskWrite::new(7, 0x000F, 0x0010)
    );
    assert_eq!(
        client
            .read_holding_registers(unit, AddressRange::try_from(7, 1).unwrap())
            .await
            .unwrap(),
        vec![0x001F]
    );

    client.close().await.unwrap();
    assert!(!client.is_connected());
    assert_eq!(
        client
            .read_coils(unit, AddressRange::try_from(0, 1).unwrap())
            .await
            .unwrap_err(),
        Error::NoConnection
    );
}

#[tokio::test]
async fn handler_exceptions_reach_the_client() {
    let addr = spawn_server(Handler::new().wrap()).await;

    let mut client = Client::new();
    client.connect("127.0.0.1", addr.port()).await.unwrap();

    let unit = UnitId::new(0x01);

    // the handler stores ten coils, so reading past the end is an address error
    assert_eq!(
        client
            .read_coils(unit, AddressRange::try_from(9, 5).unwrap())
            .await
            .unwrap_err(),
        Error::Exception(ExceptionCode::IllegalDataAddress)
    );

    // the session stays usable after an exception reply
    let coils = client
        .read_coils(unit, AddressRange::try_from(0, 1).unwrap())
        .await
        .unwrap();
    assert!(!coils[0]);
}

#[tokio::test]
async fn undersized_length_field_gets_an_exception_reply() {
    let addr = spawn_server(Handler::new().wrap()).await;
    let mut socket = TcpStream::connect(addr).await.unwrap();

    // length of one cannot hold a function code
    socket
        .write_all(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x38])
        .await
        .unwrap();

    let mut reply = [0u8; 9];
    socket.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x38, 0x80, 0x01]);

    // the session survives and still answers well-formed requests
    socket
        .write_all(&[0x00, 0x02, 0x00, 0x00, 0x00, 0x06, 0x01, 0x01, 0x00, 0x00, 0x00, 0x01])
        .await
        .unwrap();
    let mut reply = [0u8; 10];
    socket.read_exact(&mut reply).await.unwrap();
    assert_eq!(
        reply,
        [0x00, 0x02, 0x00, 0x00, 0x00, 0x04, 0x01, 0x01, 0x01, 0x00]
    );
}

#[tokio::test]
async fn short_body_gets_an_exception_reply_and_a_disconnect() {
    let addr = spawn_server(Handler::new().wrap()).await;
    let mut socket = TcpStream::connect(addr).await.unwrap();

    // the header promises five ADU bytes but only two arrive
    socket
        .write_all(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x38, 0x03, 0x00])
        .await
        .unwrap();
    socket.shutdown().await.unwrap();

    let mut reply = [0u8; 9];
    socket.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x38, 0x80, 0x03]);

    // the server closes the connection after the reply
    assert_eq!(socket.read(&mut [0u8; 1]).await.unwrap(), 0);
}

#[tokio::test]
async fn server_echoes_transaction_and_unit_ids() {
    let addr = spawn_server(Handler::new().wrap()).await;
    let mut socket = TcpStream::connect(addr).await.unwrap();

    socket
        .write_all(&[0xAB, 0xCD, 0x00, 0x00, 0x00, 0x06, 0x7F, 0x01, 0x00, 0x00, 0x00, 0x01])
        .await
        .unwrap();

    let mut reply = [0u8; 10];
    socket.read_exact(&mut reply).await.unwrap();
    assert_eq!(&reply[..2], &[0xAB, 0xCD]); // transaction id
    assert_eq!(reply[6], 0x7F); // unit id
}
