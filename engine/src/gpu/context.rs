/// GPU context management - handles wgpu device/queue initialization
use anyhow::{Context, Result};
use wgpu;

/// GPU context containing device, queue, and adapter info
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_name: String,
    /// `None` when the device was provided by the host
    pub backend: Option<wgpu::Backend>,
}

impl GpuContext {
    /// Create a headless GPU context on the best available adapter
    pub async fn new() -> Result<Self> {
        log::info!("Initializing GPU context...");

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
            .context("Failed to find suitable GPU adapter")?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Selected GPU adapter: {} ({:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Attract Video GPU Device"),
                ..Default::default()
            })
            .await
            .context("Failed to create GPU device")?;

        Ok(Self {
            device,
            queue,
            adapter_name: adapter_info.name,
            backend: Some(adapter_info.backend),
        })
    }

    /// Blocking variant of [`GpuContext::new`] for hosts without an executor
    pub fn new_blocking() -> Result<Self> {
        pollster::block_on(Self::new())
    }

    /// Wrap a device the host renderer already owns
    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            adapter_name: "host".to_string(),
            backend: None,
        }
    }
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("adapter", &self.adapter_name)
            .field("backend", &self.backend)
            .finish()
    }
}
