use crate::error::GpuError;
use log::info;
use std::sync::Arc;

/// The WGPU device and queue shared by the dispatch resources.
#[derive(Debug, Clone)]
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Requests a high-performance adapter and a compute-capable device.
    ///
    /// # Errors
    ///
    /// * [`GpuError::AdapterRequestFailed`] when no adapter is available.
    /// * [`GpuError::DeviceRequestFailed`] when the device cannot be created.
    pub async fn new() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| GpuError::AdapterRequestFailed(e.to_string()))?;
        let adapter_info = adapter.get_info();
        info!(
            "Using GPU adapter {} ({:?})",
            adapter_info.name, adapter_info.backend
        );

        // Storage bindings: costs, both frontiers, distances and flags.
        let mut limits = wgpu::Limits::downlevel_defaults();
        limits.max_storage_buffers_per_shader_stage = 5;
        limits.max_storage_buffer_binding_size = adapter.limits().max_storage_buffer_binding_size;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Wavefront Device"),
                required_features: wgpu::Features::empty(),
                required_limits: limits,
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
            })
            .await?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_info,
        })
    }

    /// Blocking variant of [`GpuContext::new`] for synchronous callers.
    pub fn new_blocking() -> Result<Self, GpuError> {
        pollster::block_on(Self::new())
    }

    /// Largest storage buffer binding the device accepts, in bytes.
    pub fn max_storage_binding(&self) -> u64 {
        u64::from(self.device.limits().max_storage_buffer_binding_size)
    }
}
