// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::spectrum::RGBSpectrum;

use exr::prelude::*;
use image::io::Reader as ImageReader;
use image::GenericImageView;

/// Linear-space RGB raster with bilinear filtering and repeat addressing.
pub struct ImageTexture {
    width: usize,
    height: usize,
    data: Vec<Vector3f>,
}

fn srgb_to_linear(v: Float) -> Float {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

struct ExrPixels {
    width: usize,
    height: usize,
    data: Vec<Vector3f>,
}

impl ImageTexture {
    pub fn from_pixels(width: usize, height: usize, data: Vec<Vector3f>)
        -> std::result::Result<Self, String> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(format!("texture has invalid layout: {}x{} with {} texels",
                               width, height, data.len()));
        }
        Ok(Self { width, height, data })
    }

    pub fn from_exr(path: &str) -> std::result::Result<Self, String> {
        let image = read_first_rgba_layer_from_file(
            path,
            |resolution, _| {
                ExrPixels {
                    width: resolution.width(),
                    height: resolution.height(),
                    data: vec![Vector3f::zeros(); resolution.width() * resolution.height()],
                }
            },
            |pixels: &mut ExrPixels, position, (r, g, b, _a): (f32, f32, f32, f32)| {
                pixels.data[position.y() * pixels.width + position.x()] = Vector3f::new(r, g, b);
            },
        )
        .map_err(|e| format!("failed to read exr {}: {}", path, e))?;

        let pixels = image.layer_data.channel_data.pixels;
        Self::from_pixels(pixels.width, pixels.height, pixels.data)
    }

    pub fn from_image(path: &str, srgb: bool) -> std::result::Result<Self, String> {
        let img = ImageReader::open(path)
            .map_err(|e| format!("failed to open image {}: {}", path, e))?
            .decode()
            .map_err(|e| format!("failed to decode image {}: {}", path, e))?;

        let (width, height) = img.dimensions();
        let (width, height) = (width as usize, height as usize);
        let rgb = img.to_rgb32f();
        let mut data = vec![Vector3f::zeros(); width * height];
        for y in 0..height {
            for x in 0..width {
                let p = rgb.get_pixel(x as u32, y as u32);
                let (mut r, mut g, mut b) = (p[0], p[1], p[2]);
                if srgb {
                    r = srgb_to_linear(r);
                    g = srgb_to_linear(g);
                    b = srgb_to_linear(b);
                }
                data[y * width + x] = Vector3f::new(r, g, b);
            }
        }
        Self::from_pixels(width, height, data)
    }

    /// Loads by file extension: `.exr` stays linear, everything else is
    /// decoded as sRGB.
    pub fn from_file(path: &str) -> std::result::Result<Self, String> {
        if path.to_ascii_lowercase().ends_with(".exr") {
            Self::from_exr(path)
        } else {
            Self::from_image(path, true)
        }
    }

    fn texel(&self, x: i64, y: i64) -> Vector3f {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        self.data[y * self.width + x]
    }

    pub fn sample(&self, uv: Vector2f) -> RGBSpectrum {
        let x = uv.x * self.width as Float - 0.5;
        let y = uv.y * self.height as Float - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let c00 = self.texel(x0, y0);
        let c10 = self.texel(x0 + 1, y0);
        let c01 = self.texel(x0, y0 + 1);
        let c11 = self.texel(x0 + 1, y0 + 1);

        let filtered = c00 * (1.0 - fx) * (1.0 - fy)
            + c10 * fx * (1.0 - fy)
            + c01 * (1.0 - fx) * fy
            + c11 * fx * fy;
        RGBSpectrum::from_vector(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker2x2() -> ImageTexture {
        ImageTexture::from_pixels(2, 2, vec![
            Vector3f::new(1.0, 0.0, 0.0),
            Vector3f::new(0.0, 1.0, 0.0),
            Vector3f::new(0.0, 0.0, 1.0),
            Vector3f::new(1.0, 1.0, 1.0),
        ]).expect("valid layout")
    }

    #[test]
    fn test_sample_texel_centers() {
        let tex = checker2x2();
        let red = tex.sample(Vector2f::new(0.25, 0.25));
        assert!((red[0] - 1.0).abs() < 1e-5);
        assert!(red[1].abs() < 1e-5);

        let white = tex.sample(Vector2f::new(0.75, 0.75));
        assert!((white[0] - 1.0).abs() < 1e-5);
        assert!((white[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_sample_wraps() {
        let tex = checker2x2();
        let a = tex.sample(Vector2f::new(0.25, 0.25));
        let b = tex.sample(Vector2f::new(1.25, -0.75));
        assert!((a.rgb() - b.rgb()).norm() < 1e-5);
    }

    #[test]
    fn test_invalid_layout_rejected() {
        assert!(ImageTexture::from_pixels(2, 2, vec![Vector3f::zeros(); 3]).is_err());
    }
}
