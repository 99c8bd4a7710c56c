use egui::Color32;
use egui::ColorImage;
use retrocloud_core::framebuffer::Image;
use retrocloud_core::framebuffer::Rgba32;

/// Lets the bridge framebuffer be converted straight into an egui texture image.
pub struct EguiImage(pub ColorImage);

impl Image for EguiImage {
    fn new(width: u32, height: u32) -> Self {
        EguiImage(ColorImage::filled(
            [width as usize, height as usize],
            Color32::BLACK,
        ))
    }

    fn set_pixel(&mut self, index: (u32, u32), value: Rgba32) {
        let width = self.0.size[0];
        let [r, g, b, a] = value.0;
        self.0.pixels[index.1 as usize * width + index.0 as usize] =
            Color32::from_rgba_unmultiplied(r, g, b, a);
    }
}

pub fn accent_color(accent: [u8; 3]) -> Color32 {
    Color32::from_rgb(accent[0], accent[1], accent[2])
}
