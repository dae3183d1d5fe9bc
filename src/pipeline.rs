//! Frame Pipeline
//!
//! Owns the canvas and runs one frame through every pass in order:
//! clear, composite, reflection resolve, lighting, HUD, finish.

use log::debug;

use crate::canvas::Canvas;
use crate::compositor::{CompositeStats, Compositor, FrameScene};
use crate::config::RenderConfig;
use crate::display::PixelBuffer;
use crate::error::ConfigError;
use crate::finisher;
use crate::hud::{self, GlyphSource, HudItem};
use crate::lighting::{LightingStats, Raytracer};
use crate::timing::{timed, PassTimings};

/// Counters of the last rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub composite: CompositeStats,
    pub lighting: LightingStats,
    pub hud_items: usize,
}

pub struct FramePipeline {
    canvas: Canvas,
    compositor: Compositor,
    raytracer: Raytracer,
    surface: PixelBuffer,
    scale: u32,
    timings: PassTimings,
    stats: FrameStats,
}

impl FramePipeline {
    pub fn new(config: &RenderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            canvas: Canvas::new(),
            compositor: Compositor::new(),
            raytracer: Raytracer::new(config.parallel_lighting),
            surface: PixelBuffer::for_scale(config.scale),
            scale: config.scale,
            timings: PassTimings::default(),
            stats: FrameStats::default(),
        })
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// The finished, magnified frame
    pub fn surface(&self) -> &PixelBuffer {
        &self.surface
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn parallel_lighting(&self) -> bool {
        self.raytracer.is_parallel()
    }

    /// Switch between rayon row tracing and a single thread
    pub fn set_parallel_lighting(&mut self, parallel: bool) {
        self.raytracer.set_parallel(parallel);
    }

    pub fn timings(&self) -> PassTimings {
        self.timings
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Compose and light `scene` and overlay `hud` on the canvas, without
    /// producing display pixels
    pub fn render_canvas(&mut self, scene: &FrameScene, hud_items: &[HudItem], font: &dyn GlyphSource) {
        self.canvas.clear();
        self.compositor.reset();

        let ((), composite) = timed(|| self.compositor.composite(&mut self.canvas, scene));
        let ((), reflections) = timed(|| self.compositor.resolve_reflections(&mut self.canvas));
        let ((), lighting) = timed(|| self.raytracer.light(&mut self.canvas));
        let ((), hud_time) = timed(|| hud::draw_hud(&mut self.canvas, font, hud_items));

        self.timings = PassTimings {
            composite,
            reflections,
            lighting,
            hud: hud_time,
            finish: Default::default(),
        };
        self.stats = FrameStats {
            frame: self.stats.frame + 1,
            composite: self.compositor.stats(),
            lighting: self.raytracer.stats(),
            hud_items: hud_items.len(),
        };
    }

    /// Render one complete frame and return the display surface
    pub fn render(&mut self, scene: &FrameScene, hud_items: &[HudItem], font: &dyn GlyphSource) -> &PixelBuffer {
        self.render_canvas(scene, hud_items, font);
        let ((), finish) = timed(|| finisher::finish(&self.canvas, &mut self.surface, self.scale));
        self.timings.finish = finish;

        let s = &self.stats;
        debug!(
            "frame {}: {} draws, {} cells, {}/{} reflections, {} sources, {} lit, {:.2}ms",
            s.frame,
            s.composite.draws,
            s.composite.cells_written,
            s.composite.reflections_resolved,
            s.composite.reflection_sites,
            s.lighting.sources,
            s.lighting.cells_lit,
            self.timings.total().as_secs_f32() * 1000.0
        );
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{CellType, Rgb, FULL_LIGHT};
    use crate::compositor::{DrawCall, Layer};
    use crate::hud::TinyFont;
    use crate::texture::{Asset, SampleMode, Texture};

    #[test]
    fn test_invalid_scale_rejected() {
        for scale in [0, 5000] {
            let config = RenderConfig {
                scale,
                ..Default::default()
            };
            assert!(matches!(
                FramePipeline::new(&config),
                Err(ConfigError::InvalidScale(s)) if s == scale
            ));
        }
        assert_eq!(FramePipeline::new(&RenderConfig::default()).unwrap().scale(), 4);
    }

    #[test]
    fn test_lighting_mode_switch_keeps_output() {
        let bulb = Asset::new(Texture::solid_gray(2, 2, 255), SampleMode::Tint).unwrap();
        let mut scene = FrameScene::new();
        scene.push(DrawCall::new(Layer::Lightbulbs, &bulb, 40, 40));

        let mut pipeline = FramePipeline::new(&RenderConfig::default()).unwrap();
        assert!(pipeline.parallel_lighting());
        pipeline.render_canvas(&scene, &[], &TinyFont);
        let parallel = pipeline.canvas().cells().to_vec();

        pipeline.set_parallel_lighting(false);
        assert!(!pipeline.parallel_lighting());
        pipeline.render_canvas(&scene, &[], &TinyFont);
        assert_eq!(pipeline.canvas().cells(), &parallel[..]);
        assert!(pipeline.canvas().light_at(50, 40) > 0);
    }

    #[test_log::test]
    fn test_frames_do_not_leak_state() {
        let bulb = Asset::new(Texture::solid_gray(4, 4, 255), SampleMode::Tint).unwrap();
        let mut pipeline = FramePipeline::new(&RenderConfig {
            scale: 1,
            ..Default::default()
        })
        .unwrap();

        let mut scene = FrameScene::new();
        scene.push(DrawCall::new(Layer::Lightbulbs, &bulb, 10, 10));
        pipeline.render(&scene, &[], &TinyFont);
        assert_eq!(pipeline.canvas().light_at(10, 10), FULL_LIGHT);
        assert_eq!(pipeline.stats().frame, 1);

        pipeline.render(&FrameScene::new(), &[], &TinyFont);
        assert_eq!(pipeline.canvas().light_at(10, 10), 0);
        assert_eq!(pipeline.canvas().kind_at(10, 10), None);
        assert_eq!(pipeline.stats().frame, 2);
        assert_eq!(pipeline.stats().lighting.sources, 0);
    }

    #[test]
    fn test_hud_drawn_after_lighting() {
        let floor = Asset::new(Texture::solid_gray(32, 32, 0), SampleMode::Tint).unwrap();
        let mut pipeline = FramePipeline::new(&RenderConfig::default()).unwrap();
        let mut scene = FrameScene::new();
        scene.push(DrawCall::terrain(CellType::Floor, &floor, 0, 0));
        let hud = [HudItem::Rect {
            x: 0,
            y: 0,
            w: 2,
            h: 2,
            color: Rgb::WHITE,
        }];
        let surface = pipeline.render(&scene, &hud, &TinyFont);
        assert_eq!(surface.width(), 1024);
        // Forced light 255 gives the 2.5x multiplier, clamped
        assert_eq!(surface.get_pixel(0, 0), Some((255, 255, 255)));
        assert_eq!(pipeline.canvas().kind_at(0, 0), Some(CellType::Floor));
        assert_eq!(pipeline.canvas().light_at(5, 5), 0);
    }
}
