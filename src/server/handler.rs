use std::sync::{Arc, Mutex};

use crate::exception::ExceptionCode;
use crate::types::{AddressRange, Indexed, MaskWrite, UnitId, WriteMultiple};

/// Trait implemented by the user to process requests received from clients.
///
/// Every operation has a default implementation that answers
/// [`ExceptionCode::IllegalFunction`], so a handler only implements the functions it
/// supports. The unit identifier is passed through untouched; handlers that sit in
/// front of a gateway can use it to select a downstream device, everyone else can
/// ignore it.
///
/// The handler is shared by every session of a server. Sessions lock it for the
/// duration of a single request, so implementations do not need their own
/// synchronization for per-request state.
pub trait ServerHandler: Send + 'static {
    /// Read a range of coils, returning one value per requested address
    fn read_coils(&mut self, _unit: UnitId, _range: AddressRange) -> Result<Vec<bool>, ExceptionCode> {
        Err(ExceptionCode::IllegalFunction)
    }

    /// Read a range of discrete inputs, returning one value per requested address
    fn read_discrete_inputs(
        &mut self,
        _unit: UnitId,
        _range: AddressRange,
    ) -> Result<Vec<bool>, ExceptionCode> {
        Err(ExceptionCode::IllegalFunction)
    }

    /// Read a range of holding registers, returning one value per requested address
    fn read_holding_registers(
        &mut self,
        _unit: UnitId,
        _range: AddressRange,
    ) -> Result<Vec<u16>, ExceptionCode> {
        Err(ExceptionCode::IllegalFunction)
    }

    /// Read a range of input registers, returning one value per requested address
    fn read_input_registers(
        &mut self,
        _unit: UnitId,
        _range: AddressRange,
    ) -> Result<Vec<u16>, ExceptionCode> {
        Err(ExceptionCode::IllegalFunction)
    }

    /// Write a single coil
    fn write_single_coil(
        &mut self,
        _unit: UnitId,
        _value: Indexed<bool>,
    ) -> Result<(), ExceptionCode> {
        Err(ExceptionCode::IllegalFunction)
    }

    /// Write a single holding register
    fn write_single_register(
        &mut self,
        _unit: UnitId,
        _value: Indexed<u16>,
    ) -> Result<(), ExceptionCode> {
        Err(ExceptionCode::IllegalFunction)
    }

    /// Write multiple coils
    fn write_multiple_coils(
        &mut self,
        _unit: UnitId,
        _values: WriteMultiple<bool>,
    ) -> Result<(), ExceptionCode> {
        Err(ExceptionCode::IllegalFunction)
    }

    /// Write multiple holding registers
    fn write_multiple_registers(
        &mut self,
        _unit: UnitId,
        _values: WriteMultiple<u16>,
    ) -> Result<(), ExceptionCode> {
        Err(ExceptionCode::IllegalFunction)
    }

    /// Apply an AND mask and an OR mask to a holding register
    fn mask_write_register(
        &mut self,
        _unit: UnitId,
        _value: MaskWrite,
    ) -> Result<(), ExceptionCode> {
        Err(ExceptionCode::IllegalFunction)
    }

    /// Move the handler into an `Arc<Mutex<_>>` suitable for passing to a server
    fn wrap(self) -> ServerHandlerType<Self>
    where
        Self: Sized,
    {
        Arc::new(Mutex::new(self))
    }

    /// Retrieve a sub-range of a slice or [`ExceptionCode::IllegalDataAddress`]
    fn get_range_of<T: Copy>(slice: &[T], range: AddressRange) -> Result<Vec<T>, ExceptionCode> {
        let rng = range.to_std_range();
        if rng.end > slice.len() {
            return Err(ExceptionCode::IllegalDataAddress);
        }
        Ok(slice[rng].to_vec())
    }
}

/// Shared handler reference passed to a server
pub type ServerHandlerType<T> = Arc<Mutex<T>>;
