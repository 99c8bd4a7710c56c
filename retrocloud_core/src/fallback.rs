//! Placeholder rendering used when real emulation cannot start.
//!
//! Nothing drawn here depends on ROM contents. The animation only signals that the player is
//! alive: a gradient background, a few colored blocks sliding across the screen and some
//! sparkles.
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::framebuffer::Framebuffer;
use crate::framebuffer::Rgba32;
use crate::framebuffer::SCREEN_HEIGHT;
use crate::framebuffer::SCREEN_WIDTH;

const SPARKLES_PER_FRAME: usize = 40;
const BLOCK_SIZE: i32 = 16;

/// Gradient stops, picked from the ROM URL so different games look a little different.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub top: Rgba32,
    pub middle: Rgba32,
    pub bottom: Rgba32,
}

impl Palette {
    pub fn for_rom_url(url: &str) -> Palette {
        if url.contains("Contra") {
            Palette {
                top: Rgba32::rgb(0x2a, 0x18, 0x10),
                middle: Rgba32::rgb(0x4a, 0x28, 0x18),
                bottom: Rgba32::rgb(0x6a, 0x38, 0x20),
            }
        } else if url.contains("Donkey") {
            Palette {
                top: Rgba32::rgb(0x1a, 0x3a, 0x1a),
                middle: Rgba32::rgb(0x2a, 0x5a, 0x2a),
                bottom: Rgba32::rgb(0x3a, 0x7a, 0x3a),
            }
        } else {
            Palette {
                top: Rgba32::rgb(0x1a, 0x1a, 0x2e),
                middle: Rgba32::rgb(0x16, 0x21, 0x3e),
                bottom: Rgba32::rgb(0x0f, 0x34, 0x60),
            }
        }
    }

    fn at(&self, t: f32) -> Rgba32 {
        if t < 0.5 {
            self.top.lerp(self.middle, t * 2.0)
        } else {
            self.middle.lerp(self.bottom, (t - 0.5) * 2.0)
        }
    }
}

struct Block {
    color: Rgba32,
    row: i32,
    speed: i32,
}

pub struct FallbackRenderer {
    palette: Palette,
    blocks: Vec<Block>,
    frame_interval: f64,
    last_frame: Option<f64>,
    frame_count: u64,
    rng: StdRng,
}

impl FallbackRenderer {
    pub fn new(rom_url: &str, fps: u32) -> Self {
        Self {
            palette: Palette::for_rom_url(rom_url),
            blocks: vec![
                Block {
                    color: Rgba32::rgb(0xe7, 0x4c, 0x3c),
                    row: 40,
                    speed: 2,
                },
                Block {
                    color: Rgba32::rgb(0xf1, 0xc4, 0x0f),
                    row: 96,
                    speed: 3,
                },
                Block {
                    color: Rgba32::rgb(0x2e, 0xcc, 0x71),
                    row: 152,
                    speed: 1,
                },
                Block {
                    color: Rgba32::rgb(0x34, 0x98, 0xdb),
                    row: 200,
                    speed: 4,
                },
            ],
            frame_interval: 1.0 / fps.max(1) as f64,
            last_frame: None,
            frame_count: 0,
            rng: StdRng::seed_from_u64(0x4E45_531A),
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Draws a new frame if at least one frame interval passed since the last one.
    ///
    /// `now` is a monotonic time in seconds. Returns true if a frame was drawn.
    pub fn advance(&mut self, now: f64, framebuffer: &mut Framebuffer) -> bool {
        if let Some(last_frame) = self.last_frame {
            if now - last_frame < self.frame_interval {
                return false;
            }
        }
        self.last_frame = Some(now);
        self.render(framebuffer);
        self.frame_count += 1;
        true
    }

    /// Draws the frame for the current frame count without advancing the animation.
    pub fn render(&mut self, framebuffer: &mut Framebuffer) {
        for y in 0..SCREEN_HEIGHT {
            let color = self.palette.at(y as f32 / (SCREEN_HEIGHT - 1) as f32);
            framebuffer.fill_rect(0, y as i32, SCREEN_WIDTH as i32, 1, color);
        }

        let track = SCREEN_WIDTH as i32 + BLOCK_SIZE;
        for block in &self.blocks {
            let x = (self.frame_count as i64 * block.speed as i64).rem_euclid(track as i64) as i32
                - BLOCK_SIZE;
            framebuffer.fill_rect(x, block.row, BLOCK_SIZE, BLOCK_SIZE, block.color);
        }

        for _ in 0..SPARKLES_PER_FRAME {
            let x = self.rng.random_range(0..SCREEN_WIDTH);
            let y = self.rng.random_range(0..SCREEN_HEIGHT);
            let shade = self.rng.random_range(0xA0..=0xFF);
            framebuffer.set(x, y, Rgba32::rgb(shade, shade, 0xFF));
        }
    }
}

/// The static screen shown when fallback animation is turned off.
pub fn render_error_screen(framebuffer: &mut Framebuffer) {
    framebuffer.fill(Rgba32::rgb(0x2a, 0x0a, 0x0a));
    framebuffer.fill_rect(
        32,
        SCREEN_HEIGHT as i32 / 2 - 2,
        SCREEN_WIDTH as i32 - 64,
        4,
        Rgba32::rgb(0xff, 0x44, 0x44),
    );
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_palette_depends_on_url() {
        assert_ne!(
            Palette::for_rom_url("/roms/Contra (U).nes"),
            Palette::for_rom_url("/roms/test.nes")
        );
        assert_eq!(
            Palette::for_rom_url("/roms/other.nes"),
            Palette::for_rom_url("/roms/test.nes")
        );
    }

    #[test]
    fn test_advance_respects_frame_rate() {
        let mut renderer = FallbackRenderer::new("/roms/test.nes", 10);
        let mut framebuffer = Framebuffer::default();
        assert!(renderer.advance(1.0, &mut framebuffer));
        assert!(!renderer.advance(1.05, &mut framebuffer));
        assert!(renderer.advance(1.1, &mut framebuffer));
        assert_eq!(renderer.frame_count(), 2);
    }

    #[test]
    fn test_frames_change_over_time() {
        let mut renderer = FallbackRenderer::new("/roms/test.nes", 30);
        let mut framebuffer = Framebuffer::default();
        renderer.advance(0.0, &mut framebuffer);
        let first = framebuffer.clone();
        renderer.advance(1.0, &mut framebuffer);
        assert_ne!(first.pixels(), framebuffer.pixels());
    }

    #[test]
    fn test_gradient_runs_top_to_bottom() {
        let mut renderer = FallbackRenderer::new("/roms/Contra (U).nes", 30);
        let mut framebuffer = Framebuffer::default();
        renderer.render(&mut framebuffer);
        let palette = Palette::for_rom_url("/roms/Contra (U).nes");
        // Blocks never reach the first row, only sparkles can cover it.
        let top_row_matches = (0..SCREEN_WIDTH)
            .filter(|x| framebuffer.get(*x, 0) == palette.top)
            .count();
        assert!(top_row_matches >= SCREEN_WIDTH - SPARKLES_PER_FRAME);
    }
}
