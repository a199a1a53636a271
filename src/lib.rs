//! An implementation of the [Modbus](http://modbus.org/) TCP protocol using
//! [Tokio](https://docs.rs/tokio) and Rust's `async/await` syntax.
//!
//! # Features
//!
//! * Panic-free parsing
//! * Focus on correctness and compliance to the specification
//! * TCP client and server with per-connection server sessions
//! * Strictly serial client: one request in flight per connection, enforced by the type system
//!
//! # Supported functions
//!
//! * Read Coils
//! * Read Discrete Inputs
//! * Read Holding Registers
//! * Read Input Registers
//! * Write Single Coil
//! * Write Single Register
//! * Write Multiple Coils
//! * Write Multiple Registers
//! * Mask Write Register
//!
//! Serial-line framing (RTU/ASCII), broadcast addressing, and other function codes are
//! out of scope.
//!
//! # Example client
//!
//! ```no_run
//! use mbtcp::client::Client;
//! use mbtcp::{AddressRange, UnitId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::new();
//!     client.connect("10.0.0.1", mbtcp::constants::DEFAULT_PORT).await?;
//!
//!     let registers = client
//!         .read_holding_registers(UnitId::new(0x02), AddressRange::try_from(0, 5)?)
//!         .await?;
//!
//!     for (i, value) in registers.iter().enumerate() {
//!         println!("register {i}: {value:#06X}");
//!     }
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Example server
//!
//! ```no_run
//! use mbtcp::server::{Server, ServerHandler};
//! use mbtcp::{AddressRange, ExceptionCode, UnitId};
//!
//! struct CoilsOnlyHandler {
//!     coils: [bool; 10],
//! }
//!
//! impl ServerHandler for CoilsOnlyHandler {
//!     fn read_coils(
//!         &mut self,
//!         _unit: UnitId,
//!         range: AddressRange,
//!     ) -> Result<Vec<bool>, ExceptionCode> {
//!         Self::get_range_of(&self.coils, range)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handler = CoilsOnlyHandler { coils: [false; 10] }.wrap();
//!
//!     let server = Server::bind(mbtcp::constants::DEFAULT_PORT, handler).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

#![deny(
    non_camel_case_types,
    non_snake_case,
    non_upper_case_globals,
    unconditional_recursion,
    unreachable_pub,
    // missing_docs,
    trivial_casts,
    unused_import_braces,
    clippy::all
)]
#![forbid(unsafe_code, while_true, bare_trait_objects)]

/// client API
pub mod client;
/// public constant values related to the Modbus specification
pub mod constants;
/// server API
pub mod server;

// internal modules
mod common;
mod error;
mod exception;
mod request;
mod response;
mod types;

pub use crate::error::{Error, InternalError, InvalidRange, ParseError};
pub use crate::exception::ExceptionCode;
pub use crate::types::{AddressRange, Indexed, MaskWrite, UnitId, WriteMultiple};
