/// FramePresenter - drives one render+present iteration per loop tick
///
/// Owns the two binary semaphores that order a frame: "image available"
/// (signaled by acquisition, waited on by the submit at the
/// color-attachment-output stage) and "rendering done" (signaled by the
/// submit, waited on by the present). Both live for the whole process and
/// are never recreated with the swapchain.

use crate::error::Result;
use crate::vulkan_swapchain::{FrameAcquire, RecordedDraw, SwapchainManager};
use crate::{render_debug, render_err, render_trace};
use ash::vk;
use std::sync::Arc;

/// What happened during one presentation tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was submitted and queued for presentation
    Presented,
    /// The swapchain was stale; it was recreated and the frame dropped
    SwapchainRebuilt,
}

/// What a presentation tick does with its acquisition result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// Submit the image's command buffer and queue it for presentation
    SubmitAndPresent(u32),
    /// Rebuild the swapchain and drop the frame; nothing is submitted or
    /// presented until the next tick
    RebuildAndSkip,
}

/// Map an acquisition result to the action for this tick
///
/// A ready image proceeds to submit and present; an out-of-date report
/// yields exactly one rebuild and skips the rest of the tick.
pub fn tick_action(acquire: FrameAcquire) -> TickAction {
    match acquire {
        FrameAcquire::Ready(image_index) => TickAction::SubmitAndPresent(image_index),
        FrameAcquire::OutOfDate => TickAction::RebuildAndSkip,
    }
}

/// Per-frame orchestration: acquire, submit, present
pub struct FramePresenter {
    device: Arc<ash::Device>,
    graphics_queue: vk::Queue,

    /// Signaled when the acquired image is ready to be written
    image_available: vk::Semaphore,
    /// Signaled when rendering to the image has finished
    rendering_done: vk::Semaphore,
}

impl FramePresenter {
    /// Create the presenter and its synchronization pair
    pub fn new(device: Arc<ash::Device>, graphics_queue: vk::Queue) -> Result<Self> {
        let semaphore_info = vk::SemaphoreCreateInfo::default();
        unsafe {
            let image_available = device
                .create_semaphore(&semaphore_info, None)
                .map_err(|e| {
                    render_err!("nova::frame", "Failed to create image-available semaphore: {:?}", e)
                })?;
            let rendering_done = match device.create_semaphore(&semaphore_info, None) {
                Ok(semaphore) => semaphore,
                Err(e) => {
                    device.destroy_semaphore(image_available, None);
                    return Err(render_err!(
                        "nova::frame",
                        "Failed to create rendering-done semaphore: {:?}",
                        e
                    ));
                }
            };

            Ok(Self {
                device,
                graphics_queue,
                image_available,
                rendering_done,
            })
        }
    }

    /// Render and present one frame
    ///
    /// Acquires an image, submits its pre-recorded command buffer, and
    /// queues it for presentation. An out-of-date report from acquisition
    /// or presentation triggers exactly one recreation (at the window's
    /// current `width` x `height`) and drops the frame; the caller just
    /// ticks again. Any other non-success result is fatal.
    pub fn present_frame(
        &mut self,
        swapchain: &mut SwapchainManager,
        width: u32,
        height: u32,
        draw: &RecordedDraw,
    ) -> Result<FrameOutcome> {
        let acquire = swapchain.acquire_next_image(self.image_available)?;
        let image_index = match tick_action(acquire) {
            TickAction::SubmitAndPresent(index) => index,
            TickAction::RebuildAndSkip => {
                render_debug!("nova::frame", "Swapchain out of date during acquire");
                swapchain.recreate(width, height)?;
                swapchain.record_commands(draw)?;
                return Ok(FrameOutcome::SwapchainRebuilt);
            }
        };

        unsafe {
            let wait_semaphores = [self.image_available];
            let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
            let command_buffers = [swapchain.command_buffer(image_index)];
            let signal_semaphores = [self.rendering_done];

            let submit_info = vk::SubmitInfo::default()
                .wait_semaphores(&wait_semaphores)
                .wait_dst_stage_mask(&wait_stages)
                .command_buffers(&command_buffers)
                .signal_semaphores(&signal_semaphores);

            self.device
                .queue_submit(self.graphics_queue, &[submit_info], vk::Fence::null())
                .map_err(|e| render_err!("nova::frame", "Failed to submit frame: {:?}", e))?;

            let swapchains = [swapchain.swapchain];
            let image_indices = [image_index];
            let present_wait = [self.rendering_done];
            let present_info = vk::PresentInfoKHR::default()
                .wait_semaphores(&present_wait)
                .swapchains(&swapchains)
                .image_indices(&image_indices);

            match swapchain
                .swapchain_loader
                .queue_present(self.graphics_queue, &present_info)
            {
                Ok(_) | Err(vk::Result::SUBOPTIMAL_KHR) => {
                    render_trace!("nova::frame", "Presented image {}", image_index);
                    Ok(FrameOutcome::Presented)
                }
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                    render_debug!("nova::frame", "Swapchain out of date during present");
                    swapchain.recreate(width, height)?;
                    swapchain.record_commands(draw)?;
                    Ok(FrameOutcome::SwapchainRebuilt)
                }
                Err(e) => Err(render_err!("nova::frame", "Failed to present frame: {:?}", e)),
            }
        }
    }
}

impl Drop for FramePresenter {
    fn drop(&mut self) {
        unsafe {
            // The semaphores may still be referenced by queued work
            self.device.device_wait_idle().ok();
            self.device.destroy_semaphore(self.image_available, None);
            self.device.destroy_semaphore(self.rendering_done, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_frame_tests.rs"]
mod tests;
