/// Pipeline - fixed-function graphics pipeline plus descriptor plumbing
///
/// Built once at startup against the initial render pass and extent and
/// never rebuilt: recreated render passes stay compatible (same single
/// color attachment, format, and sample count), so the pipeline, its
/// layout, and the shader modules all survive swapchain recreation.

use crate::error::Result;
use crate::geometry::Vertex;
use crate::render_err;
use crate::vulkan_buffer::Buffer;
use crate::vulkan_shader::ShaderModule;
use ash::vk;
use std::sync::Arc;

/// Graphics pipeline with its layout and descriptor set layout
pub struct Pipeline {
    device: Arc<ash::Device>,
    pub(crate) descriptor_set_layout: vk::DescriptorSetLayout,
    pub pipeline_layout: vk::PipelineLayout,
    pub pipeline: vk::Pipeline,
}

impl Pipeline {
    /// Build the pipeline for the quad demo
    ///
    /// One vertex-stage uniform buffer binding, the [`Vertex`] input
    /// layout, triangle lists, a static viewport at `extent`, no blending.
    pub fn new(
        device: Arc<ash::Device>,
        render_pass: vk::RenderPass,
        extent: vk::Extent2D,
        vertex_shader: &ShaderModule,
        fragment_shader: &ShaderModule,
    ) -> Result<Self> {
        unsafe {
            let bindings = [vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::VERTEX)];
            let layout_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
            let descriptor_set_layout = device
                .create_descriptor_set_layout(&layout_info, None)
                .map_err(|e| {
                    render_err!("nova::pipeline", "Failed to create descriptor set layout: {:?}", e)
                })?;

            let set_layouts = [descriptor_set_layout];
            let pipeline_layout_info =
                vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
            let pipeline_layout = match device.create_pipeline_layout(&pipeline_layout_info, None)
            {
                Ok(layout) => layout,
                Err(e) => {
                    device.destroy_descriptor_set_layout(descriptor_set_layout, None);
                    return Err(render_err!(
                        "nova::pipeline",
                        "Failed to create pipeline layout: {:?}",
                        e
                    ));
                }
            };

            let stages = [
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(vk::ShaderStageFlags::VERTEX)
                    .module(vertex_shader.module)
                    .name(c"main"),
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(vk::ShaderStageFlags::FRAGMENT)
                    .module(fragment_shader.module)
                    .name(c"main"),
            ];

            let binding_descriptions = [Vertex::binding_description()];
            let attribute_descriptions = Vertex::attribute_descriptions();
            let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
                .vertex_binding_descriptions(&binding_descriptions)
                .vertex_attribute_descriptions(&attribute_descriptions);

            let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
                .topology(vk::PrimitiveTopology::TRIANGLE_LIST);

            let viewports = [vk::Viewport {
                x: 0.0,
                y: 0.0,
                width: extent.width as f32,
                height: extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            }];
            let scissors = [vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            }];
            let viewport_state = vk::PipelineViewportStateCreateInfo::default()
                .viewports(&viewports)
                .scissors(&scissors);

            let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
                .polygon_mode(vk::PolygonMode::FILL)
                .cull_mode(vk::CullModeFlags::NONE)
                .front_face(vk::FrontFace::CLOCKWISE)
                .line_width(1.0);

            let multisample = vk::PipelineMultisampleStateCreateInfo::default()
                .rasterization_samples(vk::SampleCountFlags::TYPE_1);

            let blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
                .blend_enable(false)
                .color_write_mask(vk::ColorComponentFlags::RGBA)];
            let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
                .attachments(&blend_attachments);

            let create_info = vk::GraphicsPipelineCreateInfo::default()
                .stages(&stages)
                .vertex_input_state(&vertex_input)
                .input_assembly_state(&input_assembly)
                .viewport_state(&viewport_state)
                .rasterization_state(&rasterization)
                .multisample_state(&multisample)
                .color_blend_state(&color_blend)
                .layout(pipeline_layout)
                .render_pass(render_pass)
                .subpass(0);

            let pipeline = match device.create_graphics_pipelines(
                vk::PipelineCache::null(),
                &[create_info],
                None,
            ) {
                Ok(pipelines) => pipelines[0],
                Err((_, e)) => {
                    device.destroy_pipeline_layout(pipeline_layout, None);
                    device.destroy_descriptor_set_layout(descriptor_set_layout, None);
                    return Err(render_err!(
                        "nova::pipeline",
                        "Failed to create graphics pipeline: {:?}",
                        e
                    ));
                }
            };

            Ok(Self {
                device,
                descriptor_set_layout,
                pipeline_layout,
                pipeline,
            })
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.pipeline_layout, None);
            self.device
                .destroy_descriptor_set_layout(self.descriptor_set_layout, None);
        }
    }
}

/// Descriptor pool plus the single uniform descriptor set
///
/// Created once; the set points at the uniform buffer and is rebound on
/// every command-buffer re-record, never reallocated.
pub struct Descriptors {
    device: Arc<ash::Device>,
    descriptor_pool: vk::DescriptorPool,
    pub descriptor_set: vk::DescriptorSet,
}

impl Descriptors {
    /// Allocate the set and point binding 0 at `uniform_buffer`
    pub fn new(
        device: Arc<ash::Device>,
        pipeline: &Pipeline,
        uniform_buffer: &Buffer,
    ) -> Result<Self> {
        unsafe {
            let pool_sizes = [vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: 1,
            }];
            let pool_info = vk::DescriptorPoolCreateInfo::default()
                .pool_sizes(&pool_sizes)
                .max_sets(1);
            let descriptor_pool = device
                .create_descriptor_pool(&pool_info, None)
                .map_err(|e| {
                    render_err!("nova::pipeline", "Failed to create descriptor pool: {:?}", e)
                })?;

            let set_layouts = [pipeline.descriptor_set_layout];
            let alloc_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(descriptor_pool)
                .set_layouts(&set_layouts);
            let descriptor_set = match device.allocate_descriptor_sets(&alloc_info) {
                Ok(sets) => sets[0],
                Err(e) => {
                    device.destroy_descriptor_pool(descriptor_pool, None);
                    return Err(render_err!(
                        "nova::pipeline",
                        "Failed to allocate descriptor set: {:?}",
                        e
                    ));
                }
            };

            let buffer_infos = [vk::DescriptorBufferInfo {
                buffer: uniform_buffer.buffer,
                offset: 0,
                range: uniform_buffer.size(),
            }];
            let writes = [vk::WriteDescriptorSet::default()
                .dst_set(descriptor_set)
                .dst_binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&buffer_infos)];
            device.update_descriptor_sets(&writes, &[]);

            Ok(Self {
                device,
                descriptor_pool,
                descriptor_set,
            })
        }
    }
}

impl Drop for Descriptors {
    fn drop(&mut self) {
        unsafe {
            // Frees the set too
            self.device.destroy_descriptor_pool(self.descriptor_pool, None);
        }
    }
}
