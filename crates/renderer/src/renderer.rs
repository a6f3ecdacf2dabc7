//! Renderer orchestration and the draw loop.
//!
//! [`Renderer::new`] builds the whole Vulkan object tree; any failure on
//! the way unwinds everything already created through the RAII wrappers.
//! [`Renderer::render_frame`] runs one iteration of the
//! frames-in-flight loop; [`Renderer::resize`] only flags the swap targets
//! stale, and the rebuild happens at the top of the next iteration.

use std::path::Path;
use std::sync::Arc;

use glam::Mat4;
use glaze_rhi::vk;
use tracing::{debug, error, info};

use glaze_platform::{InputState, KeyCode, MouseButton, Surface, Window};
use glaze_resources::{MeshData, TexturePixels};
use glaze_rhi::buffer::{Buffer, BufferUsage};
use glaze_rhi::command::CommandPool;
use glaze_rhi::device::Device;
use glaze_rhi::instance::Instance;
use glaze_rhi::physical_device::select_physical_device;
use glaze_rhi::pipeline::{GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use glaze_rhi::render_pass::{RenderPass, find_depth_format};
use glaze_rhi::swapchain::{SwapchainSupportDetails, choose_surface_format};
use glaze_rhi::vertex::MeshVertex;
use glaze_rhi::{RhiError, RhiResult};
use glaze_scene::Camera;

use crate::MAX_FRAMES_IN_FLIGHT;
use crate::descriptor::DescriptorState;
use crate::frame::FrameSync;
use crate::shaders::load_shader_pair;
use crate::swap_targets::SwapTargets;
use crate::texture_set::{SamplerSet, TextureSet};
use crate::ubo::MvpUbo;

/// Mouse-look sensitivity in degrees per pixel.
const LOOK_SENSITIVITY: f32 = 0.1;

/// Owns every GPU resource and drives the frame loop.
///
/// Field order is the teardown contract: sync objects and swap targets go
/// first, then the pipeline and GPU-resident mesh/texture state, then the
/// pools, and the device, surface, and instance last. `Drop` only inserts
/// the device-idle wait in front of that sequence.
pub struct Renderer {
    // Scene state
    camera: Camera,
    model_transform: Mat4,

    // Swap-dependent state; `None` between teardown and rebuild
    frame_sync: Option<FrameSync>,
    swap_targets: Option<SwapTargets>,

    // Per-frame-slot command buffers; freed with the pool
    command_buffers: Vec<vk::CommandBuffer>,

    // Write-once GPU state
    descriptor_state: DescriptorState,
    uniform_buffers: Vec<Buffer>,
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
    textures: TextureSet,
    samplers: SamplerSet,
    pipeline: Pipeline,
    pipeline_layout: PipelineLayout,
    render_pass: RenderPass,
    command_pool: CommandPool,

    // Core context, destroyed last in this order
    device: Arc<Device>,
    surface: Surface,
    instance: Instance,

    // Plain data
    depth_format: vk::Format,
    resize_requested: bool,
    width: u32,
    height: u32,
}

impl Renderer {
    /// Initializes the full renderer for a window and an already-loaded
    /// scene.
    ///
    /// # Arguments
    ///
    /// * `window` - Window to present to
    /// * `mesh` - Deduplicated vertex/index data
    /// * `texture_pixels` - Decoded textures, in registry index order
    ///
    /// # Errors
    ///
    /// Any failure is fatal to initialization; resources created before the
    /// failure are released on the way out.
    pub fn new(
        window: &Window,
        mesh: &MeshData,
        texture_pixels: &[TexturePixels],
    ) -> RhiResult<Self> {
        let width = window.width();
        let height = window.height();

        info!("Initializing renderer ({}x{})", width, height);

        let enable_validation = cfg!(debug_assertions);
        let surface_extensions = window
            .required_extensions()
            .map_err(|e| RhiError::Surface(e.to_string()))?;

        let instance = Instance::new(c"glaze", &surface_extensions, enable_validation)?;

        let surface = window
            .create_surface(instance.entry(), instance.handle())
            .map_err(|e| RhiError::Surface(e.to_string()))?;

        let gpu = select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        let device = Device::new(&instance, &gpu)?;

        let graphics_family = gpu
            .queue_families
            .graphics_family
            .ok_or(RhiError::NoSuitableDevice)?;
        let command_pool = CommandPool::new(device.clone(), graphics_family)?;

        // The color and depth formats are stable for the process lifetime,
        // so the render pass survives every swap target rebuild.
        let support =
            SwapchainSupportDetails::query(gpu.device, surface.handle(), surface.loader())?;
        let color_format = choose_surface_format(&support.formats).format;
        let depth_format = find_depth_format(instance.handle(), gpu.device)?;

        let render_pass = RenderPass::new(device.clone(), color_format, depth_format)?;

        let swap_targets = SwapTargets::new(
            device.clone(),
            &instance,
            surface.handle(),
            &render_pass,
            depth_format,
            width,
            height,
        )?;

        let samplers = SamplerSet::new(device.clone())?;
        let textures = TextureSet::upload(device.clone(), &instance, &command_pool, texture_pixels)?;

        let vertex_buffer = Buffer::device_local_with_data(
            device.clone(),
            &command_pool,
            BufferUsage::Vertex,
            bytemuck::cast_slice(&mesh.vertices),
        )?;
        let index_buffer = Buffer::device_local_with_data(
            device.clone(),
            &command_pool,
            BufferUsage::Index,
            bytemuck::cast_slice(&mesh.indices),
        )?;
        let index_count = mesh.index_count() as u32;

        let uniform_buffers = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| {
                Buffer::new(
                    device.clone(),
                    BufferUsage::Uniform,
                    MvpUbo::SIZE as vk::DeviceSize,
                )
            })
            .collect::<RhiResult<Vec<_>>>()?;

        let descriptor_state =
            DescriptorState::new(&device, &uniform_buffers, &samplers, &textures)?;

        let (vertex_shader, fragment_shader) = load_shader_pair(&device, Path::new("shaders"))?;

        let pipeline_layout = PipelineLayout::new(device.clone(), &[descriptor_state.layout()])?;
        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(&vertex_shader)
            .fragment_shader(&fragment_shader)
            .vertex_binding(MeshVertex::binding_description())
            .vertex_attributes(&MeshVertex::attribute_descriptions())
            .build(device.clone(), &pipeline_layout, &render_pass)?;

        let command_buffers =
            command_pool.allocate_command_buffers(MAX_FRAMES_IN_FLIGHT as u32)?;

        let frame_sync = FrameSync::new(
            &device,
            MAX_FRAMES_IN_FLIGHT,
            swap_targets.image_count() as usize,
        )?;

        info!(
            "Renderer initialized: {} swap images, {} frames in flight, {} vertices, {} textures",
            swap_targets.image_count(),
            MAX_FRAMES_IN_FLIGHT,
            mesh.vertex_count(),
            textures.len()
        );

        Ok(Self {
            camera: Camera::new(),
            model_transform: Mat4::IDENTITY,
            frame_sync: Some(frame_sync),
            swap_targets: Some(swap_targets),
            command_buffers,
            descriptor_state,
            uniform_buffers,
            vertex_buffer,
            index_buffer,
            index_count,
            textures,
            samplers,
            pipeline,
            pipeline_layout,
            render_pass,
            command_pool,
            device,
            surface,
            instance,
            depth_format,
            resize_requested: false,
            width,
            height,
        })
    }

    /// Returns the camera for external control.
    #[inline]
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Sets the model transform applied to the whole mesh.
    pub fn set_model_transform(&mut self, transform: Mat4) {
        self.model_transform = transform;
    }

    /// Records a new framebuffer size and flags the swap targets stale.
    ///
    /// Zero-sized (minimized) windows are recorded too; the draw loop keeps
    /// skipping frames until a nonzero size arrives.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width != self.width || height != self.height {
            debug!(
                "Resize requested: {}x{} -> {}x{}",
                self.width, self.height, width, height
            );
            self.width = width;
            self.height = height;
            self.resize_requested = true;
        }
    }

    /// Applies one frame of input to the camera.
    pub fn update(&mut self, input: &InputState, delta: f32) {
        let axis = |positive: bool, negative: bool| match (positive, negative) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };

        let forward = axis(
            input.is_key_pressed(KeyCode::KeyW),
            input.is_key_pressed(KeyCode::KeyS),
        );
        let right = axis(
            input.is_key_pressed(KeyCode::KeyD),
            input.is_key_pressed(KeyCode::KeyA),
        );
        let up = axis(
            input.is_key_pressed(KeyCode::Space),
            input.is_key_pressed(KeyCode::ShiftLeft),
        );

        self.camera.advance(forward, right, up, delta);

        if input.is_mouse_pressed(MouseButton::Right) {
            let (dx, dy) = input.mouse_delta();
            // Screen Y grows downward; pitch grows upward
            self.camera
                .look(dx * LOOK_SENSITIVITY, -dy * LOOK_SENSITIVITY);
        }
    }

    /// Runs one iteration of the draw loop.
    ///
    /// Returns `Ok(true)` when a frame was submitted and presented and
    /// `Ok(false)` when the iteration was skipped (minimized window, stale
    /// swapchain, or a dropped frame).
    ///
    /// # Errors
    ///
    /// Only non-recoverable synchronization failures surface as errors;
    /// stale-swapchain conditions set the resize flag instead, and
    /// record/submit failures drop the frame with a log line.
    pub fn render_frame(&mut self) -> RhiResult<bool> {
        // Step 1: deferred swap target rebuild
        if self.resize_requested {
            self.rebuild_swap_targets()?;
        }

        let (Some(targets), Some(sync)) = (self.swap_targets.as_ref(), self.frame_sync.as_ref())
        else {
            // Minimized, or a rebuild has not succeeded yet
            return Ok(false);
        };

        let frame_index = sync.current_index();
        let slot = sync.current_slot();

        // Step 2: cap the pipeline at MAX_FRAMES_IN_FLIGHT
        slot.in_flight().wait(u64::MAX)?;

        // Step 3: acquire with this slot's semaphore
        let acquire = targets
            .swapchain()
            .acquire_next_image(slot.image_available().handle());
        let image_index = match acquire {
            Ok((image_index, _suboptimal)) => image_index,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                // The fence was not reset, so this slot stays consistent
                debug!("Swapchain out of date during acquire");
                self.resize_requested = true;
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let extent = targets.extent();

        // Step 4: write this slot's mapped uniform memory
        self.write_uniforms(frame_index, extent)?;

        // Step 5: re-record this slot's command buffer. The fence reset
        // waits until a submission is certain; a failed recording drops the
        // frame and leaves the slot signaled and reusable.
        let cmd = self.command_buffers[frame_index];
        let framebuffer = targets.framebuffer(image_index);
        if let Err(e) = self.record_commands(cmd, framebuffer, extent, frame_index) {
            error!("Frame dropped, command recording failed: {e}");
            return Ok(false);
        }

        let slot = match self.frame_sync.as_ref() {
            Some(sync) => sync.current_slot(),
            None => return Ok(false),
        };
        slot.in_flight().reset()?;

        // Step 6: submit, signaling the fence and the per-image semaphore
        let sync = match self.frame_sync.as_ref() {
            Some(sync) => sync,
            None => return Ok(false),
        };
        let wait_semaphores = [slot.image_available().handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [sync.render_finished(image_index)];
        let command_buffers = [cmd];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        let submit = unsafe {
            self.device.handle().queue_submit(
                self.device.graphics_queue(),
                &[submit_info],
                slot.in_flight().handle(),
            )
        };
        if let Err(e) = submit {
            error!("Frame dropped, queue submission failed: {e}");
            return Ok(false);
        }

        // Step 7: present, waiting on the same per-image semaphore
        let targets = match self.swap_targets.as_ref() {
            Some(targets) => targets,
            None => return Ok(false),
        };
        let present = targets.swapchain().present(
            self.device.present_queue(),
            image_index,
            signal_semaphores[0],
        );
        match present {
            Ok(suboptimal) => {
                if suboptimal {
                    debug!("Swapchain suboptimal during present");
                    self.resize_requested = true;
                }
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) | Err(vk::Result::SUBOPTIMAL_KHR) => {
                debug!("Swapchain stale during present");
                self.resize_requested = true;
            }
            Err(e) => {
                error!("Presentation failed: {e}");
            }
        }

        // Step 8: advance the frame slot
        if let Some(sync) = self.frame_sync.as_mut() {
            sync.advance();
        }

        Ok(true)
    }

    /// Tears down and rebuilds everything tied to the swap image count.
    ///
    /// Sync objects go first, then the swap target chain; both are rebuilt
    /// from scratch with the slot cursor back at zero. A minimized window
    /// defers the rebuild and leaves the resize flag set.
    fn rebuild_swap_targets(&mut self) -> RhiResult<()> {
        if self.width == 0 || self.height == 0 {
            debug!("Window minimized, deferring swap target rebuild");
            return Ok(());
        }

        self.device.wait_idle()?;

        // The surface hosts one swapchain at a time, and semaphore counts
        // are tied to the image count: destroy, then create.
        self.frame_sync = None;
        self.swap_targets = None;

        let targets = SwapTargets::new(
            self.device.clone(),
            &self.instance,
            self.surface.handle(),
            &self.render_pass,
            self.depth_format,
            self.width,
            self.height,
        )?;
        let sync = FrameSync::new(
            &self.device,
            MAX_FRAMES_IN_FLIGHT,
            targets.image_count() as usize,
        )?;

        info!(
            "Swap targets rebuilt at {}x{} ({} images)",
            targets.extent().width,
            targets.extent().height,
            targets.image_count()
        );

        self.swap_targets = Some(targets);
        self.frame_sync = Some(sync);
        self.resize_requested = false;

        Ok(())
    }

    /// Writes model/view/projection into the slot's persistently mapped
    /// uniform buffer.
    fn write_uniforms(&self, frame_index: usize, extent: vk::Extent2D) -> RhiResult<()> {
        let aspect = extent.width as f32 / extent.height as f32;

        let ubo = MvpUbo::new(
            self.model_transform,
            self.camera.view_matrix(),
            self.camera.projection_matrix(aspect),
        );

        self.uniform_buffers[frame_index].write(0, bytemuck::bytes_of(&ubo))
    }

    /// Records the frame's command buffer: one render pass, one indexed
    /// draw over the whole mesh.
    fn record_commands(
        &self,
        cmd: vk::CommandBuffer,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        frame_index: usize,
    ) -> RhiResult<()> {
        let device = self.device.handle();

        unsafe {
            device.reset_command_buffer(cmd, vk::CommandBufferResetFlags::empty())?;

            let begin_info = vk::CommandBufferBeginInfo::default();
            device.begin_command_buffer(cmd, &begin_info)?;
        }

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: [0.0, 0.0, 0.0, 1.0],
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];

        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };

        let render_pass_begin = vk::RenderPassBeginInfo::default()
            .render_pass(self.render_pass.handle())
            .framebuffer(framebuffer)
            .render_area(render_area)
            .clear_values(&clear_values);

        unsafe {
            device.cmd_begin_render_pass(cmd, &render_pass_begin, vk::SubpassContents::INLINE);

            device.cmd_bind_pipeline(
                cmd,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline.handle(),
            );

            // Extent can change between rebuilds while the pipeline stays
            // fixed, so viewport and scissor are dynamic state
            let viewport = vk::Viewport {
                x: 0.0,
                y: 0.0,
                width: extent.width as f32,
                height: extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            };
            device.cmd_set_viewport(cmd, 0, &[viewport]);
            device.cmd_set_scissor(cmd, 0, &[render_area]);

            device.cmd_bind_vertex_buffers(cmd, 0, &[self.vertex_buffer.handle()], &[0]);
            device.cmd_bind_index_buffer(
                cmd,
                self.index_buffer.handle(),
                0,
                vk::IndexType::UINT32,
            );
            device.cmd_bind_descriptor_sets(
                cmd,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline_layout.handle(),
                0,
                &[self.descriptor_state.set(frame_index)],
                &[],
            );

            device.cmd_draw_indexed(cmd, self.index_count, 1, 0, 0, 0);

            device.cmd_end_render_pass(cmd);
            device.end_command_buffer(cmd)?;
        }

        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Everything below may still be referenced by in-flight work
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for device idle during teardown: {:?}", e);
        }
        info!("Renderer shut down");
        // Fields drop in declaration order: sync and swap targets first,
        // pipeline and GPU resources next, device/surface/instance last.
    }
}
