use std::cmp::Ordering;

use image::{imageops, Rgba, RgbaImage};
use nalgebra_glm as glm;

use crate::chunk::ChunkFlags;
use crate::chunk_store::ChunkStore;
use crate::config::EngineConfig;
use crate::coords::to_vec2;

/// One composited chunk canvas and where it goes on screen.
#[derive(Clone, Copy)]
pub struct DrawItem<'a> {
    pub chunk: glm::IVec2,
    pub image: &'a RgbaImage,
    pub screen_pos: glm::Vec2,
}

/// Anything that can take a frame's worth of draw items.
pub trait RenderSink {
    fn draw(&mut self, items: &[DrawItem<'_>]);
}

/// Screen-space draw list for every resident chunk whose canvas overlaps the
/// screen, back to front by `(y, x)`.
pub fn draw_batch<'a>(
    store: &'a ChunkStore,
    config: &EngineConfig,
    camera_offset: &glm::Vec2,
) -> Vec<DrawItem<'a>> {
    let (canvas_w, canvas_h) = store.canvas_size();
    let screen = glm::vec2(config.screen_width as f32, config.screen_height as f32);
    let mut items: Vec<DrawItem> = store
        .resident()
        .filter_map(|(pos, chunk)| {
            let image = chunk.surface.as_ref()?;
            let mut screen_pos = to_vec2(&chunk.iso_pos) + camera_offset;
            if chunk.flags.contains(ChunkFlags::MOUSE_OVER) {
                screen_pos.y -= config.chunk_hover_raise_pixels as f32;
            }
            let off_screen = screen_pos.x >= screen.x
                || screen_pos.y >= screen.y
                || screen_pos.x + canvas_w as f32 <= 0.0
                || screen_pos.y + canvas_h as f32 <= 0.0;
            (!off_screen).then_some(DrawItem {
                chunk: *pos,
                image,
                screen_pos,
            })
        })
        .collect();
    items.sort_by(|a, b| depth_order(&a.screen_pos, &b.screen_pos));
    items
}

fn depth_order(a: &glm::Vec2, b: &glm::Vec2) -> Ordering {
    a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x))
}

/// CPU framebuffer sink.
pub struct FrameCanvas {
    pub image: RgbaImage,
    pub clear_color: Rgba<u8>,
}

impl FrameCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            clear_color: Rgba([0, 0, 0, 255]),
        }
    }

    pub fn clear(&mut self) {
        let color = self.clear_color;
        for pixel in self.image.pixels_mut() {
            *pixel = color;
        }
    }
}

impl RenderSink for FrameCanvas {
    fn draw(&mut self, items: &[DrawItem<'_>]) {
        for item in items {
            imageops::overlay(
                &mut self.image,
                item.image,
                item.screen_pos.x.floor() as i64,
                item.screen_pos.y.floor() as i64,
            );
        }
    }
}
