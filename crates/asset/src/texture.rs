//! Texture loading and procedural textures.
//! Globe surface: RGBA8 PNG or a generated graticule; glow ring: alpha ramp.

use std::path::Path;

use anyhow::Context;

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureData {
    /// Create a new texture with given dimensions and RGBA8 format.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            Some(data.len()),
            rgba8_len(width, height),
            "Data size doesn't match RGBA8 format"
        );
        Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        }
    }

    /// Like [`TextureData::new_rgba8`], but reports a size mismatch as an error.
    pub fn try_new_rgba8(width: u32, height: u32, data: Vec<u8>) -> anyhow::Result<Self> {
        match rgba8_len(width, height) {
            Some(expected) if expected == data.len() => Ok(Self::new_rgba8(width, height, data)),
            expected => anyhow::bail!(
                "RGBA8 {width}x{height} needs {expected:?} bytes, got {}",
                data.len()
            ),
        }
    }

    /// Load texture from PNG file.
    pub fn load_png<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        log::info!("Loading texture from {:?}", path);

        let img = image::open(path).with_context(|| format!("Failed to open image {:?}", path))?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let data = rgba.into_raw();

        log::info!("Loaded texture {}x{} with {} bytes", width, height, data.len());

        Self::try_new_rgba8(width, height, data)
    }

    /// Equirectangular ocean-blue map with a line every `step_deg` of
    /// longitude and latitude; the equator and prime meridian are brighter.
    pub fn graticule(width: u32, height: u32, step_deg: f32) -> Self {
        const OCEAN: [u8; 4] = [24, 58, 110, 255];
        const LINE: [u8; 4] = [90, 140, 200, 255];
        const MAIN_LINE: [u8; 4] = [220, 220, 150, 255];

        let deg_per_px_x = 360.0 / width as f32;
        let deg_per_px_y = 180.0 / height as f32;
        let on_line = |deg: f32, px: f32| {
            let r = deg.rem_euclid(step_deg);
            r < px || step_deg - r < px * 0.5
        };

        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            // row 0 is the north pole
            let lat = 90.0 - (y as f32 + 0.5) * deg_per_px_y;
            for x in 0..width {
                let lon = -180.0 + (x as f32 + 0.5) * deg_per_px_x;
                let texel = if lat.abs() < deg_per_px_y || lon.abs() < deg_per_px_x {
                    MAIN_LINE
                } else if on_line(lon, deg_per_px_x) || on_line(lat, deg_per_px_y) {
                    LINE
                } else {
                    OCEAN
                };
                data.extend_from_slice(&texel);
            }
        }

        Self::new_rgba8(width, height, data)
    }

    /// One-row ramp: `color` at u = 0 fading quadratically to transparent at u = 1.
    pub fn glow_fade(width: u32, color: [f32; 4]) -> Self {
        let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        let mut data = Vec::with_capacity((width * 4) as usize);
        let last = width.saturating_sub(1).max(1) as f32;
        for x in 0..width {
            let u = x as f32 / last;
            let alpha = color[3] * (1.0 - u) * (1.0 - u);
            data.extend_from_slice(&[to_u8(color[0]), to_u8(color[1]), to_u8(color[2]), to_u8(alpha)]);
        }
        Self::new_rgba8(width, 1, data)
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(self.bytes_per_pixel() as usize));
        expected_size == Some(self.data.len()) && self.width > 0 && self.height > 0
    }
}

/// Byte length of a `width × height` RGBA8 image, `None` on overflow.
fn rgba8_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
}
