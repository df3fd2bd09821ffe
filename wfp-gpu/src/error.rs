use thiserror::Error;
use wfp_core::DispatchError;

/// Errors raised by the GPU dispatch backend.
#[derive(Debug, Error)]
pub enum GpuError {
    /// No adapter matched the request (no GPU, or no usable driver).
    #[error("GPU adapter request failed: {0}")]
    AdapterRequestFailed(String),
    #[error("GPU device request failed: {0}")]
    DeviceRequestFailed(#[from] wgpu::RequestDeviceError),
    /// Mapping a staging buffer for read-back failed.
    #[error("Buffer map failed: {0}")]
    BufferMapFailed(String),
    /// Waiting for submitted work failed (device lost or timed out).
    #[error("Device poll failed: {0}")]
    PollFailed(String),
    /// The grid does not fit the limits of the device or the 32-bit indices used on it.
    #[error("Grid too large for the GPU backend: {0}")]
    GridTooLarge(String),
}

impl From<GpuError> for DispatchError {
    fn from(err: GpuError) -> Self {
        Self::Backend(err.to_string())
    }
}
