use nalgebra_glm as glm;

use crate::camera::Camera;
use crate::chunk::{ChunkFlags, TileFlags};
use crate::chunk_store::{ChunkStore, SyncReport};
use crate::config::EngineConfig;
use crate::coords::IsoProjection;
use crate::error::Result;
use crate::profiler::Profiler;
use crate::render::{draw_batch, RenderSink};
use crate::ripple::RippleEffect;
use crate::surface_cache::AssetTable;
use crate::tile_map::TileMap;

/// Per-frame input, sampled once before the frame runs.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput {
    /// Normalised scroll direction.
    pub direction: glm::Vec2,
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Cursor in screen pixels, if inside the window.
    pub mouse: Option<glm::Vec2>,
}

impl Default for FrameInput {
    fn default() -> Self {
        Self {
            direction: glm::vec2(0.0, 0.0),
            dt: 0.0,
            mouse: None,
        }
    }
}

/// The active map with its streaming state, camera and effects.
pub struct Scene {
    config: EngineConfig,
    assets: AssetTable,
    store: ChunkStore,
    camera: Camera,
    tiles: IsoProjection,
    chunks: IsoProjection,
    ripple: Option<RippleEffect>,
    time: f32,
    profiler: Profiler,
}

impl Scene {
    /// Checks assets against the map (missing ids get the placeholder) and
    /// loads the chunks around the map centre.
    pub fn new(config: EngineConfig, map: TileMap, mut assets: AssetTable) -> Result<Self> {
        let missing = assets.reconcile(&map);
        if !missing.is_empty() {
            log::warn!("{} tile ids have no image", missing.len());
        }
        let middle = glm::vec2(map.width() / 2, map.height() / 2);
        let camera = Camera::centered_on(&config, &middle);
        let store = ChunkStore::new(&config, map)?;
        let mut scene = Self {
            tiles: IsoProjection::tiles(&config),
            chunks: IsoProjection::chunks(&config),
            config,
            assets,
            store,
            camera,
            ripple: None,
            time: 0.0,
            profiler: Profiler::new(),
        };
        scene.store.sync(&scene.camera.offset(), &scene.assets)?;
        Ok(scene)
    }

    pub fn set_ripple(&mut self, ripple: Option<RippleEffect>) {
        self.ripple = ripple;
    }

    /// Scroll, stream, flag and rebuild. Leaves every resident chunk's
    /// canvas current for [`Self::draw`].
    pub fn update(&mut self, input: &FrameInput) -> Result<SyncReport> {
        self.profiler.begin_frame();
        self.time += input.dt;
        self.camera.scroll(&input.direction, input.dt);
        let camera = self.camera.offset();

        let report = match self
            .profiler
            .profile("sync", || self.store.sync(&camera, &self.assets))
        {
            Ok(report) => report,
            Err(err) => {
                self.profiler.abort_frame();
                return Err(err);
            }
        };

        let hover = input
            .mouse
            .map(|mouse| (self.chunk_at_screen(&mouse), self.tile_at_screen(&mouse)));
        self.profiler.profile("flags", || {
            if let Some((chunk, tile)) = hover {
                self.store.flag_chunk(&chunk, ChunkFlags::MOUSE_OVER);
                self.store.flag_tile(&tile, TileFlags::MOUSE_OVER);
            }
            if let Some(ripple) = &self.ripple {
                ripple.apply(&mut self.store, self.time);
            }
        });

        self.profiler
            .profile("rebuild", || self.store.rebuild_dirty(&self.assets));
        Ok(report)
    }

    pub fn draw(&self, sink: &mut impl RenderSink) {
        let items = self.profiler.profile("batch", || {
            draw_batch(&self.store, &self.config, &self.camera.offset())
        });
        self.profiler.profile("draw", || sink.draw(&items));
    }

    /// Clears this frame's flags and closes the frame's timings.
    pub fn end_frame(&mut self) -> usize {
        let rebuilt = self
            .profiler
            .profile("clear", || self.store.clear_frame(&self.assets));
        self.profiler.end_frame();
        rebuilt
    }

    pub fn chunk_at_screen(&self, screen: &glm::Vec2) -> glm::IVec2 {
        self.chunks.pick(&self.camera.screen_to_iso(screen))
    }

    pub fn tile_at_screen(&self, screen: &glm::Vec2) -> glm::IVec2 {
        self.tiles.pick(&self.camera.screen_to_iso(screen))
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }
}
