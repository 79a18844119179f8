//! Nova demo - a rotating colored quad
//!
//! Opens an 800x600 window and presents a quad spinning around the Z axis,
//! recreating the swapchain whenever the window is resized or presentation
//! reports the surface out of date.
//!
//! Expects pre-compiled shader binaries `vert.spv` and `frag.spv` in the
//! working directory (sources in `shaders/`, compile with glslc).

use nova_render::{
    render_error, render_info, resize_requires_rebuild, spin_transform, Buffer, Descriptors,
    FramePresenter, Pipeline, RecordedDraw, Result, ShaderModule, SwapchainManager, TransformUbo,
    VkContext, QUAD_INDICES, QUAD_VERTICES,
};
use ash::vk;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

const WINDOW_WIDTH: u32 = 800;
const WINDOW_HEIGHT: u32 = 600;

/// Everything the demo renders with
///
/// Field order doubles as drop order: presenter and swapchain go down
/// before the buffers and pipeline they reference, the context last.
struct RenderState {
    presenter: FramePresenter,
    swapchain: SwapchainManager,
    draw: RecordedDraw,
    uniform_buffer: Buffer,
    _descriptors: Descriptors,
    _pipeline: Pipeline,
    _vertex_buffer: Buffer,
    _index_buffer: Buffer,
    _vertex_shader: ShaderModule,
    _fragment_shader: ShaderModule,
    _ctx: VkContext,
    started: Instant,
}

impl RenderState {
    fn new(window: &Window) -> Result<Self> {
        let ctx = VkContext::new(window)?;
        let size = window.inner_size();

        let mut swapchain = SwapchainManager::new(&ctx, size.width, size.height)?;

        let vertex_shader = ShaderModule::from_file(ctx.device.clone(), "vert.spv")?;
        let fragment_shader = ShaderModule::from_file(ctx.device.clone(), "frag.spv")?;

        let pipeline = Pipeline::new(
            ctx.device.clone(),
            swapchain.render_pass(),
            swapchain.extent(),
            &vertex_shader,
            &fragment_shader,
        )?;

        let vertex_buffer = Buffer::device_local_with_data(
            &ctx,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            bytemuck::cast_slice(&QUAD_VERTICES),
        )?;
        let index_buffer = Buffer::device_local_with_data(
            &ctx,
            vk::BufferUsageFlags::INDEX_BUFFER,
            bytemuck::cast_slice(&QUAD_INDICES),
        )?;
        let uniform_buffer = Buffer::new(
            &ctx,
            std::mem::size_of::<TransformUbo>() as vk::DeviceSize,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;

        let descriptors = Descriptors::new(ctx.device.clone(), &pipeline, &uniform_buffer)?;

        let draw = RecordedDraw {
            pipeline: pipeline.pipeline,
            pipeline_layout: pipeline.pipeline_layout,
            descriptor_set: descriptors.descriptor_set,
            vertex_buffer: vertex_buffer.handle(),
            index_buffer: index_buffer.handle(),
            index_count: QUAD_INDICES.len() as u32,
        };
        swapchain.record_commands(&draw)?;

        let presenter = FramePresenter::new(ctx.device.clone(), ctx.graphics_queue)?;

        render_info!("nova::demo", "Render state ready");

        Ok(Self {
            presenter,
            swapchain,
            draw,
            uniform_buffer,
            _descriptors: descriptors,
            _pipeline: pipeline,
            _vertex_buffer: vertex_buffer,
            _index_buffer: index_buffer,
            _vertex_shader: vertex_shader,
            _fragment_shader: fragment_shader,
            _ctx: ctx,
            started: Instant::now(),
        })
    }

    /// Update the transform and present one frame
    fn draw_frame(&mut self, window: &Window) -> Result<()> {
        let elapsed = self.started.elapsed().as_secs_f32();
        let extent = self.swapchain.extent();
        let ubo = TransformUbo {
            mvp: spin_transform(elapsed, extent.width, extent.height),
        };
        // No fence guards this write; a submission still in flight may
        // read the buffer while it is updated (tutorial behavior kept)
        self.uniform_buffer.write(0, bytemuck::bytes_of(&ubo))?;

        let size = window.inner_size();
        self.presenter
            .present_frame(&mut self.swapchain, size.width, size.height, &self.draw)?;
        Ok(())
    }

    /// Rebuild the swapchain for a new window size
    fn handle_resize(&mut self, width: u32, height: u32) -> Result<()> {
        if !resize_requires_rebuild(width, height) {
            return Ok(());
        }
        self.swapchain.recreate(width, height)?;
        self.swapchain.record_commands(&self.draw)
    }
}

#[derive(Default)]
struct App {
    // State before window: the surface must go down first
    state: Option<RenderState>,
    window: Option<Window>,
}

/// Log the error and terminate with a non-zero exit code
fn fail(err: nova_render::Error) -> ! {
    render_error!("nova::demo", "Unrecoverable render error: {}", err);
    eprintln!("nova_demo: {}", err);
    std::process::exit(1);
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Nova")
            .with_inner_size(winit::dpi::PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));
        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => window,
            Err(e) => {
                render_error!("nova::demo", "Failed to create window: {}", e);
                eprintln!("nova_demo: failed to create window: {}", e);
                std::process::exit(1);
            }
        };

        match RenderState::new(&window) {
            Ok(state) => self.state = Some(state),
            Err(e) => fail(e),
        }
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                render_info!("nova::demo", "Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(state) = self.state.as_mut() {
                    if let Err(e) = state.handle_resize(size.width, size.height) {
                        fail(e);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let (Some(state), Some(window)) = (self.state.as_mut(), self.window.as_ref()) {
                    if let Err(e) = state.draw_frame(window) {
                        fail(e);
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

fn main() {
    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            eprintln!("nova_demo: failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::default();
    if let Err(e) = event_loop.run_app(&mut app) {
        eprintln!("nova_demo: event loop error: {}", e);
        std::process::exit(1);
    }
}
