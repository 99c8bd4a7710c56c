//! The drawing surface the bridge renders into.
use log::warn;

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 240;
pub const SCREEN_PIXELS: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

/// 32-bit RGBA color.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rgba32(pub [u8; 4]);

impl Rgba32 {
    pub const BLACK: Rgba32 = Rgba32([0, 0, 0, 255]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    /// Unpacks the `0x00BBGGRR` layout used by the emulation library's frame callback.
    pub fn from_packed_bgr(value: u32) -> Self {
        Self([
            (value & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            ((value >> 16) & 0xFF) as u8,
            255,
        ])
    }

    /// Linear interpolation between two colors, `t` in 0..=1.
    pub fn lerp(self, other: Rgba32, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self([
            mix(self.0[0], other.0[0]),
            mix(self.0[1], other.0[1]),
            mix(self.0[2], other.0[2]),
            255,
        ])
    }
}

/// Abstract interface for the image type a frontend displays, e.g. `egui::ColorImage`.
pub trait Image {
    fn new(width: u32, height: u32) -> Self;
    fn set_pixel(&mut self, index: (u32, u32), value: Rgba32);
}

/// A 256x240 RGBA pixel buffer, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: Vec<Rgba32>,
    generation: u64,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self {
            pixels: vec![Rgba32::BLACK; SCREEN_PIXELS],
            generation: 0,
        }
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("generation", &self.generation)
            .finish()
    }
}

impl Framebuffer {
    /// Copies a frame of packed pixels as delivered by the emulation library.
    ///
    /// Returns false and leaves the buffer untouched if `packed` is not exactly one frame.
    pub fn blit_packed(&mut self, packed: &[u32]) -> bool {
        if packed.len() != SCREEN_PIXELS {
            warn!(
                "Ignoring frame of {} pixels, expected {}",
                packed.len(),
                SCREEN_PIXELS
            );
            return false;
        }
        for (pixel, value) in self.pixels.iter_mut().zip(packed) {
            *pixel = Rgba32::from_packed_bgr(*value);
        }
        self.touch();
        true
    }

    pub fn fill(&mut self, color: Rgba32) {
        self.pixels.fill(color);
        self.touch();
    }

    /// Fills the rectangle, clipped to the screen.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgba32) {
        let x0 = x.clamp(0, SCREEN_WIDTH as i32) as usize;
        let y0 = y.clamp(0, SCREEN_HEIGHT as i32) as usize;
        let x1 = (x + width).clamp(0, SCREEN_WIDTH as i32) as usize;
        let y1 = (y + height).clamp(0, SCREEN_HEIGHT as i32) as usize;
        if x1 <= x0 || y1 <= y0 {
            return;
        }
        for row in y0..y1 {
            self.pixels[row * SCREEN_WIDTH + x0..row * SCREEN_WIDTH + x1].fill(color);
        }
        self.touch();
    }

    pub fn set(&mut self, x: usize, y: usize, color: Rgba32) {
        if x < SCREEN_WIDTH && y < SCREEN_HEIGHT {
            self.pixels[y * SCREEN_WIDTH + x] = color;
            self.touch();
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgba32 {
        self.pixels[y * SCREEN_WIDTH + x]
    }

    pub fn pixels(&self) -> &[Rgba32] {
        &self.pixels
    }

    /// Incremented on every modification. Lets frontends skip texture uploads of unchanged
    /// frames.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn to_rgba<ImageT: Image>(&self) -> ImageT {
        let mut image = ImageT::new(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
        for (index, pixel) in self.pixels.iter().enumerate() {
            let x = (index % SCREEN_WIDTH) as u32;
            let y = (index / SCREEN_WIDTH) as u32;
            image.set_pixel((x, y), *pixel);
        }
        image
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}
