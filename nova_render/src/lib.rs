/*!
# Nova Render

Vulkan swapchain lifecycle and presentation for the Nova quad demo.

The crate is split along the two lifetimes in the system:

- **Process lifetime**: [`VkContext`] (instance, surface, device, queue,
  upload pool), [`Pipeline`] + [`Descriptors`], [`ShaderModule`]s,
  [`Buffer`]s, and the [`FramePresenter`]'s two semaphores — created once.
- **Swapchain lifetime**: everything owned by [`SwapchainManager`]
  (swapchain, image views, render pass, framebuffers, command pool and
  pre-recorded command buffers) — destroyed and rebuilt together whenever
  the window is resized or presentation reports the surface out of date.

Built on the Ash Vulkan bindings; windowing is supplied by the caller
through raw-window-handle.
*/

mod error;
pub mod log;
mod geometry;
mod vulkan_buffer;
mod vulkan_context;
mod vulkan_frame;
mod vulkan_pipeline;
mod vulkan_shader;
mod vulkan_swapchain;

pub use error::{Error, Result};
pub use geometry::{spin_transform, TransformUbo, Vertex, QUAD_INDICES, QUAD_VERTICES};
pub use vulkan_buffer::{find_memory_type, Buffer};
pub use vulkan_context::{VkContext, PHYSICAL_DEVICE_INDEX, QUEUE_FAMILY_INDEX};
pub use vulkan_frame::{tick_action, FrameOutcome, FramePresenter, TickAction};
pub use vulkan_pipeline::{Descriptors, Pipeline};
pub use vulkan_shader::ShaderModule;
pub use vulkan_swapchain::{
    choose_image_count, clamp_extent, resize_requires_rebuild, FrameAcquire, RecordedDraw,
    SwapchainManager, PREFERRED_IMAGE_COUNT, SURFACE_FORMAT,
};
