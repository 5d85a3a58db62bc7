use crate::device::{ChipModel, TransportMode};
use crate::pins::PinRole;
use thiserror::Error;

/// Errors that can occur while configuring or driving a programmer device.
///
/// Configuration-time errors (`InvalidPin`, `PinConflict`, `UnsupportedMode`)
/// abort session setup; no partial pin binding survives a failed
/// configuration. `Transport` carries the full two-line diagnostic of a
/// failed USB transfer so callers that never see the log still get both the
/// failing operation and the transport's own error text.
#[derive(Error, Debug)]
pub enum Error {
    /// Pin number is outside the 16-bit pin register.
    #[error("pin {pin} out of range (0-15)")]
    PinOutOfRange {
        /// The invalid pin number that was specified.
        pin: u8,
    },
    /// Pin is not legal for the requested role under the active transport mode.
    #[error("pin {pin} cannot carry {role} in {mode} mode: {message}")]
    InvalidPin {
        /// The role that was being bound.
        role: PinRole,
        /// The offending pin number.
        pin: u8,
        /// The transport mode whose descriptor table rejected the pin.
        mode: TransportMode,
        /// Detailed explanation of the constraint.
        message: String,
    },
    /// Two mandatory signal roles were bound to the same physical pin.
    #[error("pin {pin} already carries {bound}, cannot also carry {requested}")]
    PinConflict {
        /// The contested pin number.
        pin: u8,
        /// The role already bound to the pin.
        bound: PinRole,
        /// The role whose binding was rejected.
        requested: PinRole,
    },
    /// The requested transport mode is not available on the attached chip.
    #[error("{mode} mode is not supported by the {chip}")]
    UnsupportedMode {
        /// The mode that was requested.
        mode: TransportMode,
        /// The attached chip variant.
        chip: ChipModel,
    },
    /// The JTAG instruction value has no operation assigned to it.
    #[error("JTAG instruction 0x{ir:X} has no assigned operation")]
    UnsupportedOperation {
        /// The raw 4-bit instruction value.
        ir: u8,
    },
    /// A signal role needed by the requested operation was never bound.
    #[error("{role} is not bound to any pin")]
    RoleNotBound {
        /// The missing role.
        role: PinRole,
    },
    /// The USB device could not be opened.
    #[error("cannot open FTDI device '{name}': {message}")]
    Open {
        /// The description string the open was attempted with.
        name: String,
        /// The underlying open failure.
        message: String,
    },
    /// A transport transfer failed. Displays as the two diagnostic lines:
    /// the failing operation with the platform error, then the transport's
    /// native error string.
    #[error("{op}: {source}\n{native}")]
    Transport {
        /// The operation that failed.
        op: &'static str,
        /// Platform error (description and OS error code where available).
        #[source]
        source: std::io::Error,
        /// The transport's own error string.
        native: String,
    },
    /// Provided buffer does not match the requested transfer size.
    #[error("buffer size mismatch (expected {expected}, got {actual})")]
    BufferTooSmall {
        /// Required buffer size.
        expected: usize,
        /// Actual buffer size provided.
        actual: usize,
    },
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
