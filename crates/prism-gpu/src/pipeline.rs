//! Fixed-function render pipeline construction.
//!
//! Builds the minimal presentable pipeline for a display session: a
//! single-subpass render pass matching the swapchain format, two shader
//! modules, one graphics pipeline with dynamic viewport/scissor, and one
//! framebuffer per swapchain image view.

use crate::error::{GpuError, Result};
use crate::swapchain::Swapchain;
use ash::vk;

/// The pipeline objects owned by a display session.
///
/// Shader modules stay alive for the pipeline's lifetime and are released in
/// teardown order, after the pipeline itself.
pub struct RenderPipeline {
    pub render_pass: vk::RenderPass,
    pub layout: vk::PipelineLayout,
    pub pipeline: vk::Pipeline,
    pub vertex_module: vk::ShaderModule,
    pub fragment_module: vk::ShaderModule,
    pub framebuffers: Vec<vk::Framebuffer>,
}

impl RenderPipeline {
    /// Build the pipeline against the current swapchain.
    ///
    /// # Safety
    /// The device must be valid, the swapchain live, and the shader code
    /// valid SPIR-V.
    pub unsafe fn build(
        device: &ash::Device,
        swapchain: &Swapchain,
        vertex_code: &[u32],
        fragment_code: &[u32],
    ) -> Result<Self> {
        let render_pass = unsafe { create_render_pass(device, swapchain.format) }?;

        let vert_info = vk::ShaderModuleCreateInfo::default().code(vertex_code);
        let vertex_module = unsafe { device.create_shader_module(&vert_info, None) }
            .map_err(|e| GpuError::PipelineCreation(format!("vertex module: {e}")))?;

        let frag_info = vk::ShaderModuleCreateInfo::default().code(fragment_code);
        let fragment_module = unsafe { device.create_shader_module(&frag_info, None) }
            .map_err(|e| GpuError::PipelineCreation(format!("fragment module: {e}")))?;

        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_module)
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_module)
                .name(c"main"),
        ];

        // No vertex input bindings yet.
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default();

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // Viewport and scissor are set per-frame, not baked in.
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::CLOCKWISE)
            .depth_bias_enable(false)
            .line_width(1.0);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1)
            .sample_shading_enable(false);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(false)
            .color_write_mask(vk::ColorComponentFlags::RGBA)];

        let color_blending = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        // No descriptor sets or push constants yet.
        let layout_info = vk::PipelineLayoutCreateInfo::default();
        let layout = unsafe { device.create_pipeline_layout(&layout_info, None) }
            .map_err(|e| GpuError::PipelineCreation(e.to_string()))?;

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisampling)
            .color_blend_state(&color_blending)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass)
            .subpass(0);

        let pipelines = unsafe {
            device.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
        }
        .map_err(|(_pipelines, e)| GpuError::PipelineCreation(e.to_string()))?;

        let mut built = Self {
            render_pass,
            layout,
            pipeline: pipelines[0],
            vertex_module,
            fragment_module,
            framebuffers: Vec::new(),
        };
        unsafe { built.rebuild_framebuffers(device, swapchain) }?;

        Ok(built)
    }

    /// Rebuild the per-image framebuffers, e.g. after a swapchain resize.
    ///
    /// # Safety
    /// The device must be valid and the old framebuffers not in use.
    pub unsafe fn rebuild_framebuffers(
        &mut self,
        device: &ash::Device,
        swapchain: &Swapchain,
    ) -> Result<()> {
        for &framebuffer in &self.framebuffers {
            unsafe { device.destroy_framebuffer(framebuffer, None) };
        }
        self.framebuffers.clear();

        for &view in &swapchain.image_views {
            let attachments = [view];
            let framebuffer_info = vk::FramebufferCreateInfo::default()
                .render_pass(self.render_pass)
                .attachments(&attachments)
                .width(swapchain.extent.width)
                .height(swapchain.extent.height)
                .layers(swapchain.array_layers);

            let framebuffer = unsafe { device.create_framebuffer(&framebuffer_info, None) }
                .map_err(|e| GpuError::PipelineCreation(format!("framebuffer: {e}")))?;
            self.framebuffers.push(framebuffer);
        }

        Ok(())
    }

    /// Destroy in reverse build order: framebuffers, pipeline, layout,
    /// render pass, shader modules.
    ///
    /// # Safety
    /// The device must be valid and the pipeline not in use.
    pub unsafe fn destroy(&mut self, device: &ash::Device) {
        for &framebuffer in &self.framebuffers {
            unsafe { device.destroy_framebuffer(framebuffer, None) };
        }
        self.framebuffers.clear();
        unsafe {
            device.destroy_pipeline(self.pipeline, None);
            device.destroy_pipeline_layout(self.layout, None);
            device.destroy_render_pass(self.render_pass, None);
            device.destroy_shader_module(self.vertex_module, None);
            device.destroy_shader_module(self.fragment_module, None);
        }
    }
}

/// Single-subpass render pass with one presentable color attachment.
///
/// # Safety
/// The device must be valid.
unsafe fn create_render_pass(device: &ash::Device, format: vk::Format) -> Result<vk::RenderPass> {
    let color_attachment = vk::AttachmentDescription::default()
        .format(format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);

    let color_ref = [vk::AttachmentReference::default()
        .attachment(0)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)];

    let subpass = [vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_ref)];

    let attachments = [color_attachment];
    let render_pass_info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(&subpass);

    unsafe { device.create_render_pass(&render_pass_info, None) }
        .map_err(|e| GpuError::PipelineCreation(format!("render pass: {e}")))
}
