pub mod camera;
pub mod chunk;
pub mod chunk_pool;
pub mod chunk_store;
pub mod config;
pub mod coords;
pub mod dirty;
pub mod error;
pub mod key_tracker;
mod present;
pub mod profiler;
pub mod render;
pub mod ripple;
pub mod scene;
pub mod surface_cache;
pub mod tile_map;
pub mod visibility;
mod wgpu_context;

pub use crate::chunk_store::{ChunkStore, SyncReport};
pub use crate::config::EngineConfig;
pub use crate::error::{EngineError, Result};
pub use crate::render::{DrawItem, FrameCanvas, RenderSink};
pub use crate::ripple::RippleEffect;
pub use crate::scene::{FrameInput, Scene};
pub use crate::surface_cache::AssetTable;
pub use crate::tile_map::TileMap;

use std::time::Instant;

use nalgebra_glm as glm;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::PhysicalKey;
use winit::window::WindowBuilder;

use crate::key_tracker::KeyTracker;
use crate::present::Presenter;
use crate::wgpu_context::WgpuContext;

/// Opens a window on `scene`'s screen size and runs it until closed.
pub async fn start(mut scene: Scene) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    let screen_width = scene.config().screen_width as u32;
    let screen_height = scene.config().screen_height as u32;

    let window = WindowBuilder::new()
        .with_title("isochunk")
        .with_inner_size(PhysicalSize::new(screen_width, screen_height))
        .build(&event_loop)?;

    let mut ctx = WgpuContext::new(&window).await?;
    let presenter = Presenter::new(&ctx, screen_width, screen_height);
    let mut canvas = FrameCanvas::new(screen_width, screen_height);

    let mut key_tracker = KeyTracker::new();
    let mut mouse: Option<glm::Vec2> = None;
    let mut requested_surface_size: Option<PhysicalSize<u32>> = None;
    let mut last_frame = Instant::now();

    event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::Resized(size) => {
                requested_surface_size = Some(size);
            }
            WindowEvent::Focused(false) => key_tracker.reset(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state,
                        ..
                    },
                ..
            } => {
                if state == ElementState::Pressed {
                    key_tracker.key_down(key_code);
                } else {
                    key_tracker.key_up(key_code);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                // The frame is stretched over the surface; map back to frame pixels.
                let surface = &ctx.surface_config;
                mouse = Some(glm::vec2(
                    position.x as f32 * screen_width as f32 / surface.width as f32,
                    position.y as f32 * screen_height as f32 / surface.height as f32,
                ));
            }
            WindowEvent::CursorLeft { .. } => mouse = None,
            WindowEvent::RedrawRequested => {
                if let Some(size) = requested_surface_size.take() {
                    ctx.resize(size.width, size.height);
                }

                let now = Instant::now();
                let input = FrameInput {
                    direction: key_tracker.direction(),
                    dt: (now - last_frame).as_secs_f32(),
                    mouse,
                };
                last_frame = now;

                if let Err(err) = scene.update(&input) {
                    log::error!("Frame update failed: {}", err);
                    elwt.exit();
                    return;
                }
                canvas.clear();
                scene.draw(&mut canvas);
                scene.end_frame();
                presenter.upload(&ctx, &canvas.image);

                match ctx.surface.get_current_texture() {
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        requested_surface_size = Some(window.inner_size());
                        log::warn!("get_current_texture() Lost/Outdated");
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("get_current_texture() OutOfMemory");
                        elwt.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::warn!("get_current_texture() Timeout")
                    }
                    Ok(surface_texture) => {
                        let surface_view = surface_texture
                            .texture
                            .create_view(&wgpu::TextureViewDescriptor::default());
                        let mut encoder =
                            ctx.device
                                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                                    label: Some("encoder main"),
                                });
                        presenter.draw(&mut encoder, &surface_view);
                        ctx.queue.submit(Some(encoder.finish()));
                        surface_texture.present();
                    }
                }
            }
            _ => (),
        },
        Event::AboutToWait => {
            window.request_redraw();
        }
        _ => (),
    })?;
    Ok(())
}
