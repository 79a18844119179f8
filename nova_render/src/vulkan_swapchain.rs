/// SwapchainManager - owns the presentable image chain and everything
/// whose validity depends on its extent or format
///
/// Owned resources: swapchain, images, image views, render pass,
/// framebuffers, command pool and the pre-recorded per-image command
/// buffers. All of them are torn down and rebuilt together on recreation;
/// the graphics pipeline, its layout, and the shader modules are NOT
/// rebuilt — the new render pass is compatible with the old one, so the
/// pipeline stays valid across resizes.

use crate::error::{Error, Result};
use crate::vulkan_context::VkContext;
use crate::{render_debug, render_err, render_error, render_info, render_warn};
use ash::vk;
use std::sync::Arc;

/// Minimum image count requested from the surface (clamped to its bounds)
pub const PREFERRED_IMAGE_COUNT: u32 = 3;

/// Fixed color format; no format negotiation is performed
pub const SURFACE_FORMAT: vk::Format = vk::Format::B8G8R8A8_UNORM;

const COLOR_SPACE: vk::ColorSpaceKHR = vk::ColorSpaceKHR::SRGB_NONLINEAR;

/// Result of an image acquisition
///
/// `OutOfDate` is the one expected transient condition in the present
/// path; it triggers recreation, never an `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAcquire {
    /// Image at this index is ready to be rendered to
    Ready(u32),
    /// The swapchain no longer matches the surface; recreate and skip
    OutOfDate,
}

/// Everything needed to record the per-image draw command buffers
///
/// Raw handles only; the owning objects (pipeline, buffers, descriptor
/// set) are created once and survive swapchain recreation.
#[derive(Debug, Clone, Copy)]
pub struct RecordedDraw {
    pub pipeline: vk::Pipeline,
    pub pipeline_layout: vk::PipelineLayout,
    pub descriptor_set: vk::DescriptorSet,
    pub vertex_buffer: vk::Buffer,
    pub index_buffer: vk::Buffer,
    pub index_count: u32,
}

/// Swapchain and all extent-dependent resources
pub struct SwapchainManager {
    device: Arc<ash::Device>,
    pub(crate) swapchain_loader: ash::khr::swapchain::Device,

    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
    physical_device: vk::PhysicalDevice,
    queue_family_index: u32,

    pub(crate) swapchain: vk::SwapchainKHR,
    format: vk::Format,
    extent: vk::Extent2D,

    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    render_pass: vk::RenderPass,
    framebuffers: Vec<vk::Framebuffer>,

    command_pool: vk::CommandPool,
    command_buffers: Vec<vk::CommandBuffer>,
}

impl SwapchainManager {
    /// Create the swapchain and all dependent resources for a window of
    /// `width` x `height` pixels
    ///
    /// The extent is clamped into the surface's reported range and the
    /// image count into `[minImageCount, maxImageCount]`. Command buffers
    /// are allocated but not recorded; call
    /// [`record_commands`](Self::record_commands) once the draw resources
    /// exist.
    pub fn new(ctx: &VkContext, width: u32, height: u32) -> Result<Self> {
        let device = ctx.device.clone();
        let swapchain_loader = ash::khr::swapchain::Device::new(&ctx.instance, &device);

        let capabilities = ctx.surface_capabilities()?;
        let extent = clamp_extent(&capabilities, width, height);
        let image_count = choose_image_count(&capabilities);

        let swapchain = build_swapchain(
            &swapchain_loader,
            ctx.surface,
            &capabilities,
            extent,
            image_count,
            vk::SwapchainKHR::null(),
        )?;

        let images = unsafe {
            swapchain_loader.get_swapchain_images(swapchain).map_err(|e| {
                render_err!("nova::swapchain", "Failed to get swapchain images: {:?}", e)
            })?
        };

        let image_views = build_image_views(&device, &images, SURFACE_FORMAT)?;
        let render_pass = build_render_pass(&device, SURFACE_FORMAT)?;
        let framebuffers = build_framebuffers(&device, render_pass, &image_views, extent)?;
        let (command_pool, command_buffers) =
            build_commands(&device, crate::vulkan_context::QUEUE_FAMILY_INDEX, images.len())?;

        render_info!(
            "nova::swapchain",
            "Swapchain created: {} images, {}x{}, {:?}",
            images.len(),
            extent.width,
            extent.height,
            SURFACE_FORMAT
        );

        Ok(Self {
            device,
            swapchain_loader,
            surface: ctx.surface,
            surface_loader: ctx.surface_loader.clone(),
            physical_device: ctx.physical_device,
            queue_family_index: crate::vulkan_context::QUEUE_FAMILY_INDEX,
            swapchain,
            format: SURFACE_FORMAT,
            extent,
            images,
            image_views,
            render_pass,
            framebuffers,
            command_pool,
            command_buffers,
        })
    }

    /// Record the draw into every per-image command buffer
    ///
    /// Each buffer clears its framebuffer, binds the pipeline, vertex and
    /// index buffers and the uniform descriptor set, and issues one
    /// indexed draw of `draw.index_count` indices.
    pub fn record_commands(&self, draw: &RecordedDraw) -> Result<()> {
        unsafe {
            for (index, &command_buffer) in self.command_buffers.iter().enumerate() {
                let begin_info = vk::CommandBufferBeginInfo::default()
                    .flags(vk::CommandBufferUsageFlags::SIMULTANEOUS_USE);
                self.device
                    .begin_command_buffer(command_buffer, &begin_info)
                    .map_err(|e| {
                        render_err!("nova::swapchain", "Failed to begin command buffer: {:?}", e)
                    })?;

                let clear_values = [vk::ClearValue {
                    color: vk::ClearColorValue {
                        float32: [0.0, 0.0, 0.0, 1.0],
                    },
                }];
                let render_pass_info = vk::RenderPassBeginInfo::default()
                    .render_pass(self.render_pass)
                    .framebuffer(self.framebuffers[index])
                    .render_area(vk::Rect2D {
                        offset: vk::Offset2D { x: 0, y: 0 },
                        extent: self.extent,
                    })
                    .clear_values(&clear_values);

                self.device.cmd_begin_render_pass(
                    command_buffer,
                    &render_pass_info,
                    vk::SubpassContents::INLINE,
                );
                self.device.cmd_bind_pipeline(
                    command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    draw.pipeline,
                );
                self.device
                    .cmd_bind_vertex_buffers(command_buffer, 0, &[draw.vertex_buffer], &[0]);
                self.device.cmd_bind_index_buffer(
                    command_buffer,
                    draw.index_buffer,
                    0,
                    vk::IndexType::UINT32,
                );
                self.device.cmd_bind_descriptor_sets(
                    command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    draw.pipeline_layout,
                    0,
                    &[draw.descriptor_set],
                    &[],
                );
                self.device
                    .cmd_draw_indexed(command_buffer, draw.index_count, 1, 0, 0, 0);
                self.device.cmd_end_render_pass(command_buffer);

                self.device.end_command_buffer(command_buffer).map_err(|e| {
                    render_err!("nova::swapchain", "Failed to end command buffer: {:?}", e)
                })?;
            }
        }

        render_debug!(
            "nova::swapchain",
            "Recorded {} command buffers ({} indices)",
            self.command_buffers.len(),
            draw.index_count
        );
        Ok(())
    }

    /// Tear down and rebuild everything extent-dependent
    ///
    /// Drains the device first: destroyed resources may still be
    /// referenced by submitted command buffers. The outgoing swapchain is
    /// passed as the replacement hint and destroyed only after the new
    /// chain and its dependents exist. A zero-sized extent is ignored.
    ///
    /// The fresh command buffers are empty; callers re-record them with
    /// [`record_commands`](Self::record_commands) before the next frame.
    pub fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        if !resize_requires_rebuild(width, height) {
            render_warn!(
                "nova::swapchain",
                "Ignoring degenerate resize to {}x{}",
                width,
                height
            );
            return Ok(());
        }

        unsafe {
            self.device.device_wait_idle().map_err(|e| {
                render_err!("nova::swapchain", "Failed to wait idle before recreate: {:?}", e)
            })?;

            // Extent-dependent teardown; the swapchain itself survives
            // until the replacement exists. Destroyed handles are nulled
            // right away: Drop may still run if a rebuild step fails.
            for &framebuffer in &self.framebuffers {
                self.device.destroy_framebuffer(framebuffer, None);
            }
            self.framebuffers.clear();
            for &image_view in &self.image_views {
                self.device.destroy_image_view(image_view, None);
            }
            self.image_views.clear();
            self.device.destroy_command_pool(self.command_pool, None);
            self.command_pool = vk::CommandPool::null();
            self.command_buffers.clear();
            self.device.destroy_render_pass(self.render_pass, None);
            self.render_pass = vk::RenderPass::null();

            let capabilities = self
                .surface_loader
                .get_physical_device_surface_capabilities(self.physical_device, self.surface)
                .map_err(|e| {
                    render_err!(
                        "nova::swapchain",
                        "Failed to get surface capabilities during recreate: {:?}",
                        e
                    )
                })?;
            let extent = clamp_extent(&capabilities, width, height);
            let image_count = choose_image_count(&capabilities);

            let old_swapchain = self.swapchain;
            self.swapchain = build_swapchain(
                &self.swapchain_loader,
                self.surface,
                &capabilities,
                extent,
                image_count,
                old_swapchain,
            )?;
            self.extent = extent;

            self.images = self
                .swapchain_loader
                .get_swapchain_images(self.swapchain)
                .map_err(|e| {
                    render_err!(
                        "nova::swapchain",
                        "Failed to get swapchain images during recreate: {:?}",
                        e
                    )
                })?;

            self.image_views = build_image_views(&self.device, &self.images, self.format)?;
            self.render_pass = build_render_pass(&self.device, self.format)?;
            self.framebuffers =
                build_framebuffers(&self.device, self.render_pass, &self.image_views, extent)?;
            let (command_pool, command_buffers) =
                build_commands(&self.device, self.queue_family_index, self.images.len())?;
            self.command_pool = command_pool;
            self.command_buffers = command_buffers;

            // Replacement and dependents exist; the old handle can go now
            self.swapchain_loader.destroy_swapchain(old_swapchain, None);
        }

        render_info!(
            "nova::swapchain",
            "Swapchain recreated: {} images, {}x{}",
            self.images.len(),
            self.extent.width,
            self.extent.height
        );
        Ok(())
    }

    /// Acquire the next presentable image, waiting indefinitely
    ///
    /// Signals `semaphore` when the image is available. `SUBOPTIMAL`
    /// counts as ready; only `ERROR_OUT_OF_DATE_KHR` maps to
    /// [`FrameAcquire::OutOfDate`].
    pub fn acquire_next_image(&self, semaphore: vk::Semaphore) -> Result<FrameAcquire> {
        unsafe {
            match self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                semaphore,
                vk::Fence::null(),
            ) {
                Ok((image_index, _suboptimal)) => Ok(FrameAcquire::Ready(image_index)),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(FrameAcquire::OutOfDate),
                Err(e) => Err(render_err!(
                    "nova::swapchain",
                    "Failed to acquire next swapchain image: {:?}",
                    e
                )),
            }
        }
    }

    /// Current swapchain extent
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Number of swapchain images (views, framebuffers, command buffers)
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Render pass the pipeline must be compatible with
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    /// Pre-recorded command buffer for a swapchain image
    pub fn command_buffer(&self, image_index: u32) -> vk::CommandBuffer {
        self.command_buffers[image_index as usize]
    }
}

impl Drop for SwapchainManager {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            self.device.destroy_command_pool(self.command_pool, None);
            for &framebuffer in &self.framebuffers {
                self.device.destroy_framebuffer(framebuffer, None);
            }
            self.device.destroy_render_pass(self.render_pass, None);
            for &image_view in &self.image_views {
                self.device.destroy_image_view(image_view, None);
            }
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

// ===== PURE HELPERS =====

/// Clamp a requested extent into the surface's reported range
///
/// When the surface pins the extent (anything but the `u32::MAX`
/// sentinel), that value wins; otherwise the request is clamped into
/// `[minImageExtent, maxImageExtent]`.
pub fn clamp_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    width: u32,
    height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// Pick the image count: [`PREFERRED_IMAGE_COUNT`] clamped into the
/// surface's bounds (`maxImageCount` 0 means unbounded)
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = PREFERRED_IMAGE_COUNT.max(capabilities.min_image_count);
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

/// A resize to zero width or height is ignored: a degenerate swapchain
/// extent is rejected by the backend
pub fn resize_requires_rebuild(width: u32, height: u32) -> bool {
    width > 0 && height > 0
}

// ===== BUILD HELPERS =====

fn build_swapchain(
    swapchain_loader: &ash::khr::swapchain::Device,
    surface: vk::SurfaceKHR,
    capabilities: &vk::SurfaceCapabilitiesKHR,
    extent: vk::Extent2D,
    image_count: u32,
    old_swapchain: vk::SwapchainKHR,
) -> Result<vk::SwapchainKHR> {
    let create_info = vk::SwapchainCreateInfoKHR::default()
        .surface(surface)
        .min_image_count(image_count)
        .image_format(SURFACE_FORMAT)
        .image_color_space(COLOR_SPACE)
        .image_extent(extent)
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        .pre_transform(capabilities.current_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(vk::PresentModeKHR::FIFO)
        .clipped(true)
        .old_swapchain(old_swapchain);

    unsafe {
        swapchain_loader
            .create_swapchain(&create_info, None)
            .map_err(|e| {
                render_error!("nova::swapchain", "Failed to create swapchain: {:?}", e);
                Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
            })
    }
}

fn build_image_views(
    device: &ash::Device,
    images: &[vk::Image],
    format: vk::Format,
) -> Result<Vec<vk::ImageView>> {
    images
        .iter()
        .map(|&image| {
            let create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });
            unsafe {
                device.create_image_view(&create_info, None).map_err(|e| {
                    render_err!("nova::swapchain", "Failed to create image view: {:?}", e)
                })
            }
        })
        .collect()
}

fn build_render_pass(device: &ash::Device, format: vk::Format) -> Result<vk::RenderPass> {
    let attachments = [vk::AttachmentDescription::default()
        .format(format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)];

    let color_refs = [vk::AttachmentReference::default()
        .attachment(0)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)];

    let subpasses = [vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs)];

    let dependencies = [vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .dst_access_mask(
            vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        )];

    let create_info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(&subpasses)
        .dependencies(&dependencies);

    unsafe {
        device
            .create_render_pass(&create_info, None)
            .map_err(|e| render_err!("nova::swapchain", "Failed to create render pass: {:?}", e))
    }
}

fn build_framebuffers(
    device: &ash::Device,
    render_pass: vk::RenderPass,
    image_views: &[vk::ImageView],
    extent: vk::Extent2D,
) -> Result<Vec<vk::Framebuffer>> {
    image_views
        .iter()
        .map(|&image_view| {
            let attachments = [image_view];
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass)
                .attachments(&attachments)
                .width(extent.width)
                .height(extent.height)
                .layers(1);
            unsafe {
                device.create_framebuffer(&create_info, None).map_err(|e| {
                    render_err!("nova::swapchain", "Failed to create framebuffer: {:?}", e)
                })
            }
        })
        .collect()
}

fn build_commands(
    device: &ash::Device,
    queue_family_index: u32,
    count: usize,
) -> Result<(vk::CommandPool, Vec<vk::CommandBuffer>)> {
    unsafe {
        let pool_info =
            vk::CommandPoolCreateInfo::default().queue_family_index(queue_family_index);
        let command_pool = device.create_command_pool(&pool_info, None).map_err(|e| {
            render_err!("nova::swapchain", "Failed to create command pool: {:?}", e)
        })?;

        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count as u32);
        let command_buffers = match device.allocate_command_buffers(&alloc_info) {
            Ok(buffers) => buffers,
            Err(e) => {
                device.destroy_command_pool(command_pool, None);
                return Err(render_err!(
                    "nova::swapchain",
                    "Failed to allocate command buffers: {:?}",
                    e
                ));
            }
        };

        Ok((command_pool, command_buffers))
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
