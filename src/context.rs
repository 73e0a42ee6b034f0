//! GPU context management.
//!
//! This module lazily initializes a global wgpu device and queue on first
//! access. The rasterizer renders off-screen only, so no surface or window
//! is ever created.
//!
//! # Example
//!
//! ```no_run
//! use mesh_heightfield::context::GpuContext;
//!
//! if let Some(ctx) = GpuContext::get() {
//!     println!("GPU available: {}", ctx.adapter_info.name);
//! } else {
//!     println!("No GPU available");
//! }
//! ```

use std::sync::OnceLock;

use tracing::{debug, info, warn};
use wgpu::{Device, DeviceDescriptor, Instance, Queue, RequestAdapterOptions};

use crate::error::{HeightFieldError, HeightFieldResult};

/// Global GPU context, lazily initialized on first access.
static GPU_CONTEXT: OnceLock<Option<GpuContext>> = OnceLock::new();

/// Information about the GPU adapter.
#[derive(Debug, Clone)]
pub struct GpuAdapterInfo {
    /// Device name (e.g., "NVIDIA RTX 3080").
    pub name: String,

    /// Device type (e.g., Discrete, Integrated).
    pub device_type: String,

    /// Backend API (e.g., Vulkan, Metal, Dx12).
    pub backend: String,
}

impl From<wgpu::AdapterInfo> for GpuAdapterInfo {
    fn from(info: wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name,
            device_type: format!("{:?}", info.device_type),
            backend: format!("{:?}", info.backend),
        }
    }
}

/// GPU context containing device, queue, and adapter information.
///
/// This is a lazy-initialized singleton; use [`GpuContext::get()`] for
/// optional access or [`GpuContext::try_get()`] for error handling. The
/// underlying wgpu device and queue are safe to share across threads, but
/// a single rasterization pipeline must not serve two computations
/// concurrently (its targets are overwritten in place).
pub struct GpuContext {
    /// The wgpu device for creating resources and pipelines.
    pub device: Device,

    /// The command queue for submitting work.
    pub queue: Queue,

    /// Information about the GPU adapter.
    pub adapter_info: GpuAdapterInfo,

    limits: wgpu::Limits,
}

impl GpuContext {
    /// Get or initialize the global GPU context.
    ///
    /// Returns `Some(&GpuContext)` if a GPU is available, `None` otherwise.
    /// The context is lazily initialized on first call.
    #[must_use]
    pub fn get() -> Option<&'static Self> {
        GPU_CONTEXT
            .get_or_init(|| match pollster::block_on(Self::try_init()) {
                Ok(ctx) => {
                    info!(
                        adapter = %ctx.adapter_info.name,
                        backend = %ctx.adapter_info.backend,
                        "GPU context initialized"
                    );
                    Some(ctx)
                }
                Err(e) => {
                    warn!("GPU initialization failed: {}", e);
                    None
                }
            })
            .as_ref()
    }

    /// Try to get the global GPU context, returning an error if unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`HeightFieldError::NotAvailable`] if no GPU is available.
    pub fn try_get() -> HeightFieldResult<&'static Self> {
        Self::get().ok_or(HeightFieldError::NotAvailable)
    }

    /// Check if a GPU is available.
    ///
    /// Note: this initializes the context on first call to determine
    /// availability.
    #[must_use]
    pub fn is_available() -> bool {
        Self::get().is_some()
    }

    /// Try to initialize a new GPU context.
    async fn try_init() -> HeightFieldResult<Self> {
        debug!("Initializing GPU context");

        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .ok_or(HeightFieldError::NotAvailable)?;

        let adapter_info = adapter.get_info();
        debug!(
            name = %adapter_info.name,
            device_type = ?adapter_info.device_type,
            backend = ?adapter_info.backend,
            "GPU adapter found"
        );

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("mesh-heightfield"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| HeightFieldError::Execution(format!("device request failed: {e}")))?;

        let limits = device.limits();

        Ok(Self {
            device,
            queue,
            adapter_info: adapter_info.into(),
            limits,
        })
    }

    /// Largest square render target edge the device supports.
    ///
    /// Requested resolutions above this fail with
    /// [`HeightFieldError::ResolutionTooLarge`].
    #[must_use]
    pub const fn max_resolution(&self) -> u32 {
        self.limits.max_texture_dimension_2d
    }

    /// Maximum buffer size supported by this device, in bytes.
    #[must_use]
    pub const fn max_buffer_size(&self) -> u64 {
        self.limits.max_buffer_size
    }
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("adapter_info", &self.adapter_info)
            .field("max_resolution", &self.limits.max_texture_dimension_2d)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_availability_check() {
        // Must not panic regardless of GPU presence.
        let _available = GpuContext::is_available();
    }

    #[test]
    fn test_gpu_context_get_is_consistent() {
        let first = GpuContext::get();
        let second = GpuContext::get();

        assert_eq!(first.is_some(), second.is_some());

        if let Some(ctx) = first {
            assert!(!ctx.adapter_info.name.is_empty());
            assert!(ctx.max_resolution() > 0);
            assert!(ctx.max_buffer_size() > 0);
        }
    }

    #[test]
    fn test_adapter_info_debug() {
        let info = GpuAdapterInfo {
            name: "Test GPU".to_string(),
            device_type: "DiscreteGpu".to_string(),
            backend: "Vulkan".to_string(),
        };

        let debug_str = format!("{info:?}");
        assert!(debug_str.contains("Test GPU"));
        assert!(debug_str.contains("Vulkan"));
    }
}
