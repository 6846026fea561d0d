//! Heads-up display: status bar, dialogue box and inspection panel, each a
//! CPU-rasterised RGBA texture drawn as a screen-space quad.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use bytemuck::cast_slice;
use fontdue::{Font, FontSettings, Metrics};
use lexroom_engine::HudState;
use once_cell::sync::{Lazy, OnceCell};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use super::shaders::QuadVertex;

const FONT_SIZE_PX: f32 = 18.0;
const MARGIN: f32 = 16.0;

static FONT: OnceCell<Font> = OnceCell::new();
static GLYPH_LAYOUT: OnceCell<GlyphLayout> = OnceCell::new();
static GLYPH_CACHE: Lazy<Mutex<HashMap<char, GlyphBitmap>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Loads the HUD font. Only the first successful call takes effect.
pub fn install_font(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    let font = Font::from_bytes(bytes, FontSettings::default())
        .map_err(|err| anyhow!("parsing font {}: {err}", path.display()))?;
    if FONT.set(font).is_err() {
        log::debug!("HUD font already installed; ignoring {}", path.display());
    }
    Ok(())
}

fn glyph_layout() -> Option<&'static GlyphLayout> {
    let font = FONT.get()?;
    Some(GLYPH_LAYOUT.get_or_init(|| GlyphLayout::from_font(font, FONT_SIZE_PX)))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelKind {
    Status,
    Dialogue,
    Inspection,
}

impl PanelKind {
    const ALL: [PanelKind; 3] = [PanelKind::Status, PanelKind::Dialogue, PanelKind::Inspection];

    fn config(self) -> PanelConfig {
        match self {
            PanelKind::Status => PanelConfig {
                width: 460,
                height: 36,
                padding_x: 10,
                padding_y: 8,
                label: "hud-status",
                background: [0, 0, 0, 150],
            },
            PanelKind::Dialogue => PanelConfig {
                width: 820,
                height: 112,
                padding_x: 14,
                padding_y: 10,
                label: "hud-dialogue",
                background: [10, 14, 30, 200],
            },
            PanelKind::Inspection => PanelConfig {
                width: 420,
                height: 340,
                padding_x: 14,
                padding_y: 12,
                label: "hud-inspection",
                background: [20, 16, 10, 210],
            },
        }
    }

    /// Status bottom-left, dialogue bottom-centre above the status bar,
    /// inspection top-right.
    pub fn rect(self, window: PhysicalSize<u32>) -> PanelRect {
        let config = self.config();
        let window_w = window.width as f32;
        let window_h = window.height as f32;
        let width = (config.width as f32).min((window_w - MARGIN * 2.0).max(1.0));
        let height = config.height as f32;
        let status_h = PanelKind::Status.config().height as f32;
        let (x, y) = match self {
            PanelKind::Status => (MARGIN, window_h - MARGIN - height),
            PanelKind::Dialogue => (
                (window_w - width) * 0.5,
                window_h - MARGIN * 2.0 - status_h - height,
            ),
            PanelKind::Inspection => (window_w - MARGIN - width, MARGIN),
        };
        PanelRect {
            x: x.max(0.0),
            y: y.max(0.0),
            width,
            height,
        }
    }

    pub fn lines(self, hud: &HudState) -> Vec<String> {
        match self {
            PanelKind::Status => vec![hud.status.clone()],
            PanelKind::Dialogue => hud
                .dialogue
                .as_ref()
                .map(|line| vec![format!("{}:", line.speaker), line.text.clone()])
                .unwrap_or_default(),
            PanelKind::Inspection => hud
                .inspection
                .as_ref()
                .map(|detail| {
                    let mut lines = vec![detail.title.clone(), String::new()];
                    lines.extend(detail.lines.iter().cloned());
                    lines.push(String::new());
                    lines.push(String::from("[C] close"));
                    lines
                })
                .unwrap_or_default(),
        }
    }
}

struct PanelConfig {
    width: u32,
    height: u32,
    padding_x: u32,
    padding_y: u32,
    label: &'static str,
    background: [u8; 4],
}

/// One text panel backed by its own texture.
struct TextPanel {
    texture: wgpu::Texture,
    _view: wgpu::TextureView,
    _sampler: wgpu::Sampler,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    config: PanelConfig,
    pixels: Vec<u8>,
    dirty: bool,
    visible: bool,
}

impl TextPanel {
    const FG_COLOR: [u8; 4] = [255, 255, 255, 240];

    fn new(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        window: PhysicalSize<u32>,
        kind: PanelKind,
    ) -> Self {
        let config = kind.config();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(config.label),
            size: config.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(config.label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(config.label),
            layout: bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });
        let vertex_buffer = create_vertex_buffer(device, kind.rect(window), window, config.label);
        let pixels = vec![0u8; (config.width * config.height * 4) as usize];
        Self {
            texture,
            _view: view,
            _sampler: sampler,
            bind_group,
            vertex_buffer,
            config,
            pixels,
            dirty: false,
            visible: false,
        }
    }

    fn set_lines(&mut self, lines: &[String], layout: &GlyphLayout) {
        let background = self.config.background;
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&background);
        }
        self.dirty = true;
        self.visible = !lines.is_empty();

        let usable_width = self.config.width.saturating_sub(self.config.padding_x * 2);
        let usable_height = self.config.height.saturating_sub(self.config.padding_y * 2);
        let max_cols = (usable_width / layout.cell_advance.max(1)) as usize;
        let max_rows = (usable_height / layout.line_height.max(1)) as usize;

        for (row, line) in wrap_lines(lines, max_cols, max_rows).iter().enumerate() {
            let line_top = self.config.padding_y + row as u32 * layout.line_height;
            for (col, ch) in line.chars().enumerate() {
                let glyph = glyph_for_char(ch);
                let cell_x = self.config.padding_x + col as u32 * layout.cell_advance;
                self.blit_glyph(cell_x, line_top, &glyph, layout);
            }
        }
    }

    fn blit_glyph(&mut self, cell_x: u32, line_top: u32, glyph: &GlyphBitmap, layout: &GlyphLayout) {
        let start_x = cell_x as i32 + layout.left_bearing + glyph.xmin;
        let start_y = line_top as i32 + layout.ascent - (glyph.ymin + glyph.height as i32);
        let (width, height) = (self.config.width as i32, self.config.height as i32);

        for gy in 0..glyph.height as i32 {
            let dest_y = start_y + gy;
            if !(0..height).contains(&dest_y) {
                continue;
            }
            for gx in 0..glyph.width as i32 {
                let dest_x = start_x + gx;
                let coverage = glyph.alpha[(gy * glyph.width as i32 + gx) as usize];
                if coverage == 0 || !(0..width).contains(&dest_x) {
                    continue;
                }
                let idx = ((dest_y * width + dest_x) * 4) as usize;
                let alpha = (coverage as u16 * Self::FG_COLOR[3] as u16 / u8::MAX as u16) as u8;
                let under = self.pixels[idx + 3];
                self.pixels[idx..idx + 4].copy_from_slice(&[
                    Self::FG_COLOR[0],
                    Self::FG_COLOR[1],
                    Self::FG_COLOR[2],
                    alpha.max(under),
                ]);
            }
        }
    }

    fn upload(&mut self, queue: &wgpu::Queue) {
        if !self.dirty {
            return;
        }
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &self.pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.config.width * 4),
                rows_per_image: Some(self.config.height),
            },
            self.config.extent(),
        );
        self.dirty = false;
    }
}

impl PanelConfig {
    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

/// Maps a pixel rectangle to a clip-space quad.
pub(super) fn vertex_positions(rect: PanelRect, window: PhysicalSize<u32>) -> [QuadVertex; 4] {
    let width = window.width.max(1) as f32;
    let height = window.height.max(1) as f32;
    let left = rect.x / width * 2.0 - 1.0;
    let right = (rect.x + rect.width) / width * 2.0 - 1.0;
    let top = 1.0 - rect.y / height * 2.0;
    let bottom = 1.0 - (rect.y + rect.height) / height * 2.0;
    [
        QuadVertex {
            position: [left, top],
            uv: [0.0, 0.0],
        },
        QuadVertex {
            position: [right, top],
            uv: [1.0, 0.0],
        },
        QuadVertex {
            position: [left, bottom],
            uv: [0.0, 1.0],
        },
        QuadVertex {
            position: [right, bottom],
            uv: [1.0, 1.0],
        },
    ]
}

fn create_vertex_buffer(
    device: &wgpu::Device,
    rect: PanelRect,
    window: PhysicalSize<u32>,
    label: &str,
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: cast_slice(&vertex_positions(rect, window)),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

/// Word-wraps each line to `max_cols`, splitting words longer than a row,
/// and stops after `max_rows` rows.
pub(super) fn wrap_lines(lines: &[String], max_cols: usize, max_rows: usize) -> Vec<String> {
    let mut rows = Vec::new();
    if max_cols == 0 || max_rows == 0 {
        return rows;
    }
    for line in lines.iter().flat_map(|line| line.split('\n')) {
        let mut current = String::new();
        for word in line.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            let current_len = current.chars().count();
            if current_len > 0 && current_len + 1 + word.len() > max_cols {
                rows.push(std::mem::take(&mut current));
            }
            while word.len() > max_cols {
                if !current.is_empty() {
                    rows.push(std::mem::take(&mut current));
                }
                rows.push(word.drain(..max_cols).collect());
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.extend(word);
        }
        rows.push(current);
    }
    rows.truncate(max_rows);
    rows
}

/// All HUD panels plus the last overlay revision they were drawn from.
pub struct HudOverlay {
    panels: Vec<(PanelKind, TextPanel)>,
    revision: Option<u64>,
}

impl HudOverlay {
    /// Returns `None` when no font has been installed.
    pub fn new(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        window: PhysicalSize<u32>,
    ) -> Option<Self> {
        glyph_layout()?;
        let panels = PanelKind::ALL
            .into_iter()
            .map(|kind| (kind, TextPanel::new(device, bind_group_layout, window, kind)))
            .collect();
        Some(Self {
            panels,
            revision: None,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, window: PhysicalSize<u32>) {
        for (kind, panel) in &mut self.panels {
            panel.vertex_buffer =
                create_vertex_buffer(device, kind.rect(window), window, panel.config.label);
        }
    }

    /// Re-rasterises panel text when the overlay changed since the last call.
    pub fn refresh(&mut self, revision: u64, hud: impl FnOnce() -> HudState) {
        if self.revision == Some(revision) {
            return;
        }
        let Some(layout) = glyph_layout() else {
            return;
        };
        let hud = hud();
        for (kind, panel) in &mut self.panels {
            panel.set_lines(&kind.lines(&hud), layout);
        }
        self.revision = Some(revision);
    }

    pub fn upload(&mut self, queue: &wgpu::Queue) {
        for (_, panel) in &mut self.panels {
            panel.upload(queue);
        }
    }

    pub fn visible(&self) -> impl Iterator<Item = (&wgpu::BindGroup, &wgpu::Buffer)> {
        self.panels
            .iter()
            .filter(|(_, panel)| panel.visible)
            .map(|(_, panel)| (&panel.bind_group, &panel.vertex_buffer))
    }
}

#[derive(Clone)]
struct GlyphBitmap {
    width: u32,
    height: u32,
    xmin: i32,
    ymin: i32,
    alpha: Arc<[u8]>,
}

impl GlyphBitmap {
    fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            xmin: 0,
            ymin: 0,
            alpha: Arc::from([]),
        }
    }
}

/// Monospace cell metrics covering printable ASCII.
struct GlyphLayout {
    line_height: u32,
    cell_advance: u32,
    ascent: i32,
    left_bearing: i32,
}

impl GlyphLayout {
    fn from_font(font: &Font, size: f32) -> Self {
        let metrics: Vec<Metrics> = (32u8..=126)
            .map(|byte| font.metrics(byte as char, size))
            .collect();
        let drawn = metrics.iter().filter(|m| m.width > 0 && m.height > 0);
        let min_xmin = drawn.clone().map(|m| m.xmin).min().unwrap_or(0);
        let max_xmax = drawn.clone().map(|m| m.xmin + m.width as i32).max().unwrap_or(0);
        let min_ymin = drawn.clone().map(|m| m.ymin).min().unwrap_or(0);
        let max_ymax = drawn.map(|m| m.ymin + m.height as i32).max().unwrap_or(0);
        let max_advance = metrics
            .iter()
            .map(|m| m.advance_width)
            .fold(0.0f32, f32::max);

        let left_bearing = -min_xmin.min(0);
        let cell_width = (left_bearing + max_xmax).max(1) as u32;
        Self {
            line_height: (max_ymax - min_ymin).max(1) as u32,
            cell_advance: (max_advance.ceil() as u32).max(cell_width).max(1),
            ascent: max_ymax,
            left_bearing,
        }
    }
}

fn glyph_for_char(ch: char) -> GlyphBitmap {
    load_or_cache_glyph(ch)
        .or_else(|| load_or_cache_glyph('?'))
        .unwrap_or_else(GlyphBitmap::empty)
}

fn load_or_cache_glyph(ch: char) -> Option<GlyphBitmap> {
    let mut cache = GLYPH_CACHE.lock().ok()?;
    if let Some(glyph) = cache.get(&ch) {
        return Some(glyph.clone());
    }
    let font = FONT.get()?;
    let index = font.lookup_glyph_index(ch);
    if index == 0 && ch != '?' && ch != ' ' {
        return None;
    }
    let (metrics, bitmap) = font.rasterize_indexed(index, FONT_SIZE_PX);
    let glyph = GlyphBitmap {
        width: metrics.width as u32,
        height: metrics.height as u32,
        xmin: metrics.xmin,
        ymin: metrics.ymin,
        alpha: Arc::from(bitmap.into_boxed_slice()),
    };
    cache.insert(ch, glyph.clone());
    Some(glyph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexroom_engine::overlay::OverlaySink;
    use lexroom_engine::scene::{InspectableKind, InspectableMetadata, InspectionDetail};
    use lexroom_engine::DialogueLine;

    fn strings(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        let rows = wrap_lines(&strings(&["the quick brown fox jumps"]), 10, 10);
        assert_eq!(rows, strings(&["the quick", "brown fox", "jumps"]));
    }

    #[test]
    fn wrap_splits_long_words_and_caps_rows() {
        let rows = wrap_lines(&strings(&["abcdefghijkl xy", "next", "third"]), 5, 4);
        assert_eq!(rows, strings(&["abcde", "fghij", "kl xy", "next"]));
        assert!(wrap_lines(&strings(&["anything"]), 0, 3).is_empty());
    }

    #[test]
    fn wrap_keeps_blank_spacer_lines() {
        let rows = wrap_lines(&strings(&["Title", "", "body"]), 20, 5);
        assert_eq!(rows, strings(&["Title", "", "body"]));
    }

    #[test]
    fn panels_follow_hud_state() {
        let mut hud = HudState::default();
        assert_eq!(PanelKind::Status.lines(&hud), strings(&["Ready"]));
        assert!(PanelKind::Dialogue.lines(&hud).is_empty());
        assert!(PanelKind::Inspection.lines(&hud).is_empty());

        hud.show_dialogue(&DialogueLine {
            speaker: "Client".into(),
            text: "I was at home.".into(),
        });
        hud.show_inspection(&InspectionDetail::for_metadata(&InspectableMetadata::new(
            InspectableKind::Contract,
            Some("LEGAL CONTRACT"),
        )));
        assert_eq!(
            PanelKind::Dialogue.lines(&hud),
            strings(&["Client:", "I was at home."])
        );
        let inspection = PanelKind::Inspection.lines(&hud);
        assert_eq!(inspection[0], "LEGAL CONTRACT");
        assert_eq!(inspection.last().map(String::as_str), Some("[C] close"));
    }

    #[test]
    fn panel_rects_stay_inside_window() {
        for window in [PhysicalSize::new(1280, 720), PhysicalSize::new(640, 480)] {
            for kind in PanelKind::ALL {
                let rect = kind.rect(window);
                assert!(rect.x >= 0.0 && rect.y >= 0.0, "{kind:?}");
                assert!(rect.x + rect.width <= window.width as f32, "{kind:?}");
                assert!(rect.y + rect.height <= window.height as f32, "{kind:?}");
            }
        }
        let status = PanelKind::Status.rect(PhysicalSize::new(1280, 720));
        let dialogue = PanelKind::Dialogue.rect(PhysicalSize::new(1280, 720));
        assert!(dialogue.y + dialogue.height <= status.y);
    }

    #[test]
    fn quad_covers_rect_in_clip_space() {
        let window = PhysicalSize::new(200, 100);
        let quad = vertex_positions(
            PanelRect {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 50.0,
            },
            window,
        );
        assert_eq!(quad[0].position, [-1.0, 1.0]);
        assert_eq!(quad[3].position, [0.0, 0.0]);
        assert_eq!(quad[3].uv, [1.0, 1.0]);
    }
}
