/// Buffer - Vulkan buffer plus its explicitly allocated device memory
///
/// Allocation goes through find_memory_type: the first memory type whose
/// bit is set in the requirements mask and whose flags contain the
/// requested properties wins. There is no fallback search; a miss is
/// fatal ([`Error::NoCompatibleMemoryType`]).

use crate::error::{Error, Result};
use crate::render_err;
use crate::vulkan_context::VkContext;
use ash::vk;
use std::sync::Arc;

/// Vulkan buffer with owned device memory
pub struct Buffer {
    /// Vulkan device (for writes and cleanup)
    device: Arc<ash::Device>,
    /// Vulkan buffer
    pub(crate) buffer: vk::Buffer,
    /// Backing memory
    memory: vk::DeviceMemory,
    /// Buffer size in bytes
    size: vk::DeviceSize,
}

impl Buffer {
    /// Create a buffer and allocate + bind memory for it
    pub fn new(
        ctx: &VkContext,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        memory_flags: vk::MemoryPropertyFlags,
    ) -> Result<Self> {
        let device = ctx.device.clone();
        unsafe {
            let buffer_info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = device
                .create_buffer(&buffer_info, None)
                .map_err(|e| render_err!("nova::vulkan", "Failed to create buffer: {:?}", e))?;

            let requirements = device.get_buffer_memory_requirements(buffer);
            let memory_type_index = match find_memory_type(
                ctx.memory_properties(),
                requirements.memory_type_bits,
                memory_flags,
            ) {
                Ok(index) => index,
                Err(e) => {
                    device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            let alloc_info = vk::MemoryAllocateInfo::default()
                .allocation_size(requirements.size)
                .memory_type_index(memory_type_index);

            let memory = match device.allocate_memory(&alloc_info, None) {
                Ok(memory) => memory,
                Err(e) => {
                    device.destroy_buffer(buffer, None);
                    return Err(render_err!(
                        "nova::vulkan",
                        "Failed to allocate {} bytes of buffer memory: {:?}",
                        requirements.size,
                        e
                    ));
                }
            };

            if let Err(e) = device.bind_buffer_memory(buffer, memory, 0) {
                device.free_memory(memory, None);
                device.destroy_buffer(buffer, None);
                return Err(render_err!(
                    "nova::vulkan",
                    "Failed to bind buffer memory: {:?}",
                    e
                ));
            }

            Ok(Self {
                device,
                buffer,
                memory,
                size,
            })
        }
    }

    /// Create a device-local buffer seeded through a staging upload
    ///
    /// Writes `data` into a host-visible staging buffer, then copies it
    /// into the device-local buffer with a one-shot command buffer from
    /// the context's upload pool, waiting for the copy to finish.
    pub fn device_local_with_data(
        ctx: &VkContext,
        usage: vk::BufferUsageFlags,
        data: &[u8],
    ) -> Result<Self> {
        let size = data.len() as vk::DeviceSize;

        let staging = Buffer::new(
            ctx,
            size,
            vk::BufferUsageFlags::TRANSFER_SRC,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        staging.write(0, data)?;

        let device_local = Buffer::new(
            ctx,
            size,
            usage | vk::BufferUsageFlags::TRANSFER_DST,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;

        unsafe {
            let device = &ctx.device;

            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(ctx.upload_command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = device
                .allocate_command_buffers(&alloc_info)
                .map_err(|e| {
                    render_err!("nova::vulkan", "Failed to allocate upload command buffer: {:?}", e)
                })?[0];

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| {
                    render_err!("nova::vulkan", "Failed to begin upload command buffer: {:?}", e)
                })?;

            let region = vk::BufferCopy::default().size(size);
            device.cmd_copy_buffer(command_buffer, staging.buffer, device_local.buffer, &[region]);

            device.end_command_buffer(command_buffer).map_err(|e| {
                render_err!("nova::vulkan", "Failed to end upload command buffer: {:?}", e)
            })?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
            device
                .queue_submit(ctx.graphics_queue, &[submit_info], vk::Fence::null())
                .map_err(|e| render_err!("nova::vulkan", "Failed to submit upload: {:?}", e))?;

            // Block until the copy finishes so the staging buffer can drop
            device
                .queue_wait_idle(ctx.graphics_queue)
                .map_err(|e| render_err!("nova::vulkan", "Failed to wait for upload: {:?}", e))?;

            device.free_command_buffers(ctx.upload_command_pool, &command_buffers);
        }

        Ok(device_local)
    }

    /// Write bytes into host-visible memory at `offset`
    ///
    /// Maps, copies, unmaps. Requires the buffer to have been created with
    /// `HOST_VISIBLE` memory.
    pub fn write(&self, offset: vk::DeviceSize, data: &[u8]) -> Result<()> {
        unsafe {
            let mapped = self
                .device
                .map_memory(
                    self.memory,
                    offset,
                    data.len() as vk::DeviceSize,
                    vk::MemoryMapFlags::empty(),
                )
                .map_err(|e| render_err!("nova::vulkan", "Failed to map buffer memory: {:?}", e))?;

            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped as *mut u8, data.len());
            self.device.unmap_memory(self.memory);
        }
        Ok(())
    }

    /// Buffer size in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// Raw buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Find the index of a memory type matching `type_bits` and `required`
///
/// Returns the first matching index; a miss is fatal with
/// [`Error::NoCompatibleMemoryType`].
pub fn find_memory_type(
    properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    required: vk::MemoryPropertyFlags,
) -> Result<u32> {
    for index in 0..properties.memory_type_count {
        let supported = type_bits & (1 << index) != 0;
        let flags = properties.memory_types[index as usize].property_flags;
        if supported && flags.contains(required) {
            return Ok(index);
        }
    }

    Err(Error::NoCompatibleMemoryType {
        type_bits,
        flags: required,
    })
}

#[cfg(test)]
#[path = "vulkan_buffer_tests.rs"]
mod tests;
