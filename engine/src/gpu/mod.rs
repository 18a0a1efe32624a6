/// GPU texture support using wgpu
///
/// Decoded frames can be uploaded straight into a wgpu texture instead of a
/// system-memory one. The host either lets the engine open a headless device
/// or hands over its own device and queue.
///
/// Architecture:
/// - `context`: wgpu device/queue management
/// - `texture`: YUY2 texture creation and upload
pub mod context;
pub mod texture;

pub use context::GpuContext;
pub use texture::GpuTexture;
