/// Mock graphics device for unit tests (no GPU required)
///
/// Every trait in the device seam has a mock here. The device keeps one
/// shared, ordered log of command-list and queue events so tests can assert
/// cross-object ordering (e.g. the idle drain happens before resources are
/// rebuilt), and a live-resource counter map decremented from `Drop` so
/// tests can prove nothing leaks.

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::config::ShaderSet;
use crate::device::*;
use crate::error::{Error, Result};
use crate::text::{FontAtlas, FontRasterizer, GlyphMetrics, ATLAS_SIZE, GLYPH_COUNT};

type EventLog = Arc<Mutex<Vec<String>>>;

// ============================================================================
// Resource tracking
// ============================================================================

/// Live-resource counters, one per resource kind
#[derive(Default)]
pub struct ResourceCounters {
    live: Mutex<HashMap<&'static str, i64>>,
}

impl ResourceCounters {
    fn created(&self, kind: &'static str) {
        *self.live.lock().unwrap().entry(kind).or_insert(0) += 1;
    }

    fn destroyed(&self, kind: &'static str) {
        *self.live.lock().unwrap().entry(kind).or_insert(0) -= 1;
    }

    /// Currently live resources of one kind
    pub fn live(&self, kind: &str) -> i64 {
        self.live.lock().unwrap().get(kind).copied().unwrap_or(0)
    }

    /// Currently live resources of every kind
    pub fn live_total(&self) -> i64 {
        self.live.lock().unwrap().values().sum()
    }
}

/// RAII guard tying a mock resource's lifetime to the counters
struct Tracked {
    kind: &'static str,
    counters: Arc<ResourceCounters>,
}

impl Tracked {
    fn new(kind: &'static str, counters: &Arc<ResourceCounters>) -> Self {
        counters.created(kind);
        Self {
            kind,
            counters: counters.clone(),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.counters.destroyed(self.kind);
    }
}

// ============================================================================
// Mock resources
// ============================================================================

pub struct MockBuffer {
    pub label: &'static str,
    size: u64,
    pub data: Mutex<Vec<u8>>,
    _track: Tracked,
}

impl Buffer for MockBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut stored = self.data.lock().unwrap();
        let end = offset as usize + data.len();
        if stored.len() < end {
            stored.resize(end, 0);
        }
        stored[offset as usize..end].copy_from_slice(data);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockTexture {
    pub label: &'static str,
    width: u32,
    height: u32,
    format: TextureFormat,
    log: EventLog,
    _track: Tracked,
}

impl Texture for MockTexture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn fill(&self, _color: [f32; 4]) -> Result<()> {
        self.log.lock().unwrap().push(format!("fill({})", self.label));
        Ok(())
    }

    fn upload(&self, pixels: &[u8]) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("upload({}, {})", self.label, pixels.len()));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockShader {
    _track: Tracked,
}

impl Shader for MockShader {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockPipeline {
    label: &'static str,
    _track: Tracked,
}

impl Pipeline for MockPipeline {
    fn label(&self) -> &'static str {
        self.label
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockRenderPass {
    _track: Tracked,
}

impl RenderPass for MockRenderPass {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockRenderTarget {
    width: u32,
    height: u32,
    format: TextureFormat,
    _track: Tracked,
}

impl RenderTarget for MockRenderTarget {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockFramebuffer {
    width: u32,
    height: u32,
    _track: Tracked,
}

impl Framebuffer for MockFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockFence {
    signaled: Mutex<bool>,
    cond: Condvar,
    _track: Tracked,
}

impl MockFence {
    /// Signal the fence, releasing any waiter (what the GPU would do when
    /// the submitted frame completes)
    pub fn signal(&self) {
        *self.signaled.lock().unwrap() = true;
        self.cond.notify_all();
    }

    fn reset(&self) {
        *self.signaled.lock().unwrap() = false;
    }

    fn wait(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut signaled = self.signaled.lock().unwrap();
        while !*signaled {
            let now = Instant::now();
            if now >= deadline {
                return Err(Error::DeviceLost("fence wait timed out".to_string()));
            }
            let (guard, _) = self.cond.wait_timeout(signaled, deadline - now).unwrap();
            signaled = guard;
        }
        Ok(())
    }
}

impl Fence for MockFence {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockSemaphore {
    _track: Tracked,
}

impl Semaphore for MockSemaphore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock command list
// ============================================================================

/// Records every command as a string into the device's shared log
pub struct MockCommandList {
    log: EventLog,
    _track: Tracked,
}

fn buffer_label(buffer: &Arc<dyn Buffer>) -> &'static str {
    buffer
        .as_any()
        .downcast_ref::<MockBuffer>()
        .map(|b| b.label)
        .unwrap_or("?")
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        self.log.lock().unwrap().push("begin".to_string());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.log.lock().unwrap().push("end".to_string());
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        _render_pass: &Arc<dyn RenderPass>,
        _framebuffer: &Arc<dyn Framebuffer>,
        _clear_values: &[ClearValue],
    ) -> Result<()> {
        self.log.lock().unwrap().push("begin_render_pass".to_string());
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.log.lock().unwrap().push("end_render_pass".to_string());
        Ok(())
    }

    fn set_viewport(&mut self, _viewport: Viewport) -> Result<()> {
        self.log.lock().unwrap().push("set_viewport".to_string());
        Ok(())
    }

    fn set_scissor(&mut self, _scissor: Rect2D) -> Result<()> {
        self.log.lock().unwrap().push("set_scissor".to_string());
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("bind_pipeline({})", pipeline.label()));
        Ok(())
    }

    fn bind_vertex_buffer(
        &mut self,
        binding: u32,
        buffer: &Arc<dyn Buffer>,
        _offset: u64,
    ) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("bind_vertex_buffer({}, {})", binding, buffer_label(buffer)));
        Ok(())
    }

    fn bind_index_buffer(
        &mut self,
        buffer: &Arc<dyn Buffer>,
        _offset: u64,
        _index_type: IndexType,
    ) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("bind_index_buffer({})", buffer_label(buffer)));
        Ok(())
    }

    fn bind_texture(
        &mut self,
        pipeline: &Arc<dyn Pipeline>,
        texture: &Arc<dyn Texture>,
    ) -> Result<()> {
        let texture_label = texture
            .as_any()
            .downcast_ref::<MockTexture>()
            .map(|t| t.label)
            .unwrap_or("?");
        self.log
            .lock()
            .unwrap()
            .push(format!("bind_texture({}, {})", pipeline.label(), texture_label));
        Ok(())
    }

    fn push_constants(&mut self, _stage: ShaderStage, _offset: u32, data: &[u8]) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("push_constants({})", data.len()));
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("draw({}, {})", vertex_count, first_vertex));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.log.lock().unwrap().push(format!(
            "draw_indexed({}, {}, {})",
            index_count, first_index, vertex_offset
        ));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock graphics device
// ============================================================================

pub struct MockDevice {
    pub counters: Arc<ResourceCounters>,
    pub log: EventLog,
    /// When true (the default) `submit` signals the fence immediately,
    /// simulating a GPU that finishes instantly. Manual mode lets tests
    /// delay the signal and observe the blocking wait.
    auto_signal: bool,
    /// Every fence this device created, in creation order. Weak so the
    /// registry does not keep torn-down fences alive under the counters.
    pub fences: Mutex<Vec<std::sync::Weak<MockFence>>>,
}

impl MockDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            counters: Arc::new(ResourceCounters::default()),
            log: Arc::new(Mutex::new(Vec::new())),
            auto_signal: true,
            fences: Mutex::new(Vec::new()),
        })
    }

    /// A device whose fences only signal when the test calls
    /// `MockFence::signal`: `submit` leaves them pending.
    pub fn with_manual_fences() -> Arc<Self> {
        Arc::new(Self {
            counters: Arc::new(ResourceCounters::default()),
            log: Arc::new(Mutex::new(Vec::new())),
            auto_signal: false,
            fences: Mutex::new(Vec::new()),
        })
    }

    pub fn log_snapshot(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn downcast_fence<'a>(&self, fence: &'a Arc<dyn Fence>) -> Result<&'a MockFence> {
        fence
            .as_any()
            .downcast_ref::<MockFence>()
            .ok_or_else(|| Error::InvalidResource("fence from another device".to_string()))
    }
}

impl GraphicsDevice for MockDevice {
    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        Ok(Arc::new(MockBuffer {
            label: desc.label,
            size: desc.size,
            data: Mutex::new(Vec::new()),
            _track: Tracked::new("buffer", &self.counters),
        }))
    }

    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        Ok(Arc::new(MockTexture {
            label: desc.label,
            width: desc.width,
            height: desc.height,
            format: desc.format,
            log: self.log.clone(),
            _track: Tracked::new("texture", &self.counters),
        }))
    }

    fn create_shader(&self, desc: ShaderDesc) -> Result<Arc<dyn Shader>> {
        if desc.code.len() % 4 != 0 {
            return Err(Error::InvalidResource(
                "shader code must be a multiple of 4 bytes".to_string(),
            ));
        }
        Ok(Arc::new(MockShader {
            _track: Tracked::new("shader", &self.counters),
        }))
    }

    fn create_render_pass(&self, _desc: RenderPassDesc) -> Result<Arc<dyn RenderPass>> {
        Ok(Arc::new(MockRenderPass {
            _track: Tracked::new("render_pass", &self.counters),
        }))
    }

    fn create_pipeline(&self, desc: PipelineDesc) -> Result<Arc<dyn Pipeline>> {
        Ok(Arc::new(MockPipeline {
            label: desc.label,
            _track: Tracked::new("pipeline", &self.counters),
        }))
    }

    fn create_compute_pipeline(&self, desc: ComputePipelineDesc) -> Result<Arc<dyn Pipeline>> {
        Ok(Arc::new(MockPipeline {
            label: desc.label,
            _track: Tracked::new("pipeline", &self.counters),
        }))
    }

    fn create_depth_target(&self, width: u32, height: u32) -> Result<Arc<dyn RenderTarget>> {
        Ok(Arc::new(MockRenderTarget {
            width,
            height,
            format: self.depth_format(),
            _track: Tracked::new("depth_target", &self.counters),
        }))
    }

    fn create_framebuffer(&self, desc: FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        Ok(Arc::new(MockFramebuffer {
            width: desc.width,
            height: desc.height,
            _track: Tracked::new("framebuffer", &self.counters),
        }))
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(MockCommandList {
            log: self.log.clone(),
            _track: Tracked::new("command_list", &self.counters),
        }))
    }

    fn create_fence(&self, signaled: bool) -> Result<Arc<dyn Fence>> {
        let fence = Arc::new(MockFence {
            signaled: Mutex::new(signaled),
            cond: Condvar::new(),
            _track: Tracked::new("fence", &self.counters),
        });
        self.fences.lock().unwrap().push(Arc::downgrade(&fence));
        Ok(fence)
    }

    fn create_semaphore(&self) -> Result<Arc<dyn Semaphore>> {
        Ok(Arc::new(MockSemaphore {
            _track: Tracked::new("semaphore", &self.counters),
        }))
    }

    fn wait_for_fence(&self, fence: &Arc<dyn Fence>, timeout_ns: u64) -> Result<()> {
        self.log.lock().unwrap().push("wait_fence".to_string());
        self.downcast_fence(fence)?
            .wait(Duration::from_nanos(timeout_ns))
    }

    fn reset_fence(&self, fence: &Arc<dyn Fence>) -> Result<()> {
        self.log.lock().unwrap().push("reset_fence".to_string());
        self.downcast_fence(fence)?.reset();
        Ok(())
    }

    fn submit(
        &self,
        _cmd: &dyn CommandList,
        _wait: &Arc<dyn Semaphore>,
        _signal: &Arc<dyn Semaphore>,
        fence: &Arc<dyn Fence>,
    ) -> Result<()> {
        self.log.lock().unwrap().push("submit".to_string());
        if self.auto_signal {
            self.downcast_fence(fence)?.signal();
        }
        Ok(())
    }

    fn composite_glyphs(
        &self,
        pipeline: &Arc<dyn Pipeline>,
        _atlas: &Arc<dyn Texture>,
        _overlay: &Arc<dyn Texture>,
        _placements: &Arc<dyn Buffer>,
        glyph_count: u32,
        _bg_color: [f32; 4],
        _text_color: [f32; 4],
    ) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("composite_glyphs({}, {})", pipeline.label(), glyph_count));
        Ok(())
    }

    fn depth_format(&self) -> TextureFormat {
        TextureFormat::D32_SFLOAT
    }

    fn wait_idle(&self) -> Result<()> {
        self.log.lock().unwrap().push("wait_idle".to_string());
        Ok(())
    }
}

// ============================================================================
// Mock swapchain
// ============================================================================

pub struct MockSwapchain {
    image_count: usize,
    extent: [u32; 2],
    format: TextureFormat,
    /// Scripted acquire outcomes; once drained, acquisition cycles
    /// `Ready(0..image_count)`
    pub acquire_script: Arc<Mutex<VecDeque<Acquire>>>,
    /// Scripted present outcomes; once drained, presentation succeeds
    pub present_script: Arc<Mutex<VecDeque<Present>>>,
    pub recreate_count: Arc<Mutex<u32>>,
    next_image: u32,
    log: EventLog,
    counters: Arc<ResourceCounters>,
}

impl MockSwapchain {
    pub fn new(device: &MockDevice, image_count: usize, extent: [u32; 2]) -> Self {
        Self {
            image_count,
            extent,
            format: TextureFormat::B8G8R8A8_SRGB,
            acquire_script: Arc::new(Mutex::new(VecDeque::new())),
            present_script: Arc::new(Mutex::new(VecDeque::new())),
            recreate_count: Arc::new(Mutex::new(0)),
            next_image: 0,
            log: device.log.clone(),
            counters: device.counters.clone(),
        }
    }
}

impl Swapchain for MockSwapchain {
    fn image_count(&self) -> usize {
        self.image_count
    }

    fn extent(&self) -> [u32; 2] {
        self.extent
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn acquire(&mut self, _image_available: &Arc<dyn Semaphore>) -> Result<Acquire> {
        self.log.lock().unwrap().push("acquire".to_string());
        if let Some(outcome) = self.acquire_script.lock().unwrap().pop_front() {
            return Ok(outcome);
        }
        let index = self.next_image;
        self.next_image = (self.next_image + 1) % self.image_count as u32;
        Ok(Acquire::Ready(index))
    }

    fn present(&mut self, image_index: u32, _render_finished: &Arc<dyn Semaphore>) -> Result<Present> {
        self.log
            .lock()
            .unwrap()
            .push(format!("present({})", image_index));
        if let Some(outcome) = self.present_script.lock().unwrap().pop_front() {
            return Ok(outcome);
        }
        Ok(Present::Presented)
    }

    fn recreate(&mut self) -> Result<()> {
        self.log.lock().unwrap().push("recreate".to_string());
        *self.recreate_count.lock().unwrap() += 1;
        Ok(())
    }

    fn color_target(&self, _image_index: u32) -> Result<Arc<dyn RenderTarget>> {
        Ok(Arc::new(MockRenderTarget {
            width: self.extent[0],
            height: self.extent[1],
            format: self.format,
            _track: Tracked::new("color_target", &self.counters),
        }))
    }
}

// ============================================================================
// Test helpers
// ============================================================================

/// Dummy SPIR-V blobs (the mock device only checks alignment)
pub fn test_shader_set() -> ShaderSet {
    ShaderSet {
        particles_vert: vec![0; 4],
        particles_frag: vec![0; 4],
        wireframe_vert: vec![0; 4],
        wireframe_frag: vec![0; 4],
        overlay_vert: vec![0; 4],
        overlay_frag: vec![0; 4],
        glyph_blit: vec![0; 4],
    }
}

/// Rasterizer producing uniform 8x16 glyphs advancing 10px
pub struct MockRasterizer;

impl FontRasterizer for MockRasterizer {
    fn bake(&self, _path: &Path, font_size: f32) -> Result<FontAtlas> {
        let mut glyphs = [GlyphMetrics::default(); GLYPH_COUNT];
        for (index, glyph) in glyphs.iter_mut().enumerate() {
            let x = (index as u16 * 8) % 504;
            *glyph = GlyphMetrics {
                x0: x,
                y0: 0,
                x1: x + 8,
                y1: 16,
                xoff: 0.0,
                yoff: 0.0,
                xadvance: 10.0,
            };
        }
        Ok(FontAtlas {
            width: ATLAS_SIZE,
            height: ATLAS_SIZE,
            pixels: vec![0; (ATLAS_SIZE * ATLAS_SIZE) as usize],
            glyphs,
            font_size,
        })
    }
}
