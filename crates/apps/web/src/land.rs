//! Land/ocean lookup in the equirectangular globe texture.

use foundation::math::GeoPoint;
use image::GrayImage;

/// Grayscale copy of the globe texture, sampled once per globe vertex.
#[derive(Debug, Clone)]
pub struct LandMask {
    image: GrayImage,
}

impl LandMask {
    pub fn from_image_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
        Ok(Self::from_luma(image::load_from_memory(bytes)?.to_luma8()))
    }

    pub fn from_luma(image: GrayImage) -> Self {
        Self { image }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Luminance in `0..=1` of the texel under `point`. Longitude -180 maps to
    /// the left edge, latitude 90 to the top row.
    pub fn luminance(&self, point: GeoPoint) -> f32 {
        let (w, h) = self.image.dimensions();
        if w == 0 || h == 0 {
            return 0.0;
        }
        let u = (point.longitude() + 180.0) / 360.0;
        let v = (90.0 - point.latitude()) / 180.0;
        let x = ((u * w as f64) as u32).min(w - 1);
        let y = ((v * h as f64) as u32).min(h - 1);
        f32::from(self.image.get_pixel(x, y).0[0]) / 255.0
    }

    pub fn is_land(&self, point: GeoPoint, threshold: f32) -> bool {
        self.luminance(point) >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::LandMask;
    use foundation::math::GeoPoint;
    use image::{GrayImage, Luma};

    /// 4×2 texture: eastern hemisphere bright, western dark.
    fn half_lit() -> LandMask {
        LandMask::from_luma(GrayImage::from_fn(4, 2, |x, _| {
            if x >= 2 { Luma([255]) } else { Luma([0]) }
        }))
    }

    fn p(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).expect("valid")
    }

    #[test]
    fn samples_by_longitude() {
        let mask = half_lit();
        assert!(mask.is_land(p(10.0, 45.0), 0.5));
        assert!(!mask.is_land(p(10.0, -45.0), 0.5));
    }

    #[test]
    fn edges_stay_inside_the_image() {
        let mask = half_lit();
        assert_eq!(mask.luminance(p(-90.0, 180.0)), 1.0);
        assert_eq!(mask.luminance(p(90.0, -180.0)), 0.0);
    }

    #[test]
    fn decodes_encoded_images() {
        let mut png = Vec::new();
        GrayImage::from_pixel(8, 4, Luma([200]))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .expect("encode");
        let mask = LandMask::from_image_bytes(&png).expect("decode");
        assert_eq!(mask.dimensions(), (8, 4));
        assert!(mask.is_land(p(0.0, 0.0), 0.5));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(LandMask::from_image_bytes(b"not an image").is_err());
    }
}
