use image::RgbImage;
use ndarray::Array1;
use palette::{FromColor, Lab, LinSrgb, Srgb};

use crate::config::LabConfig;
use crate::data_handling::resize_to;
use crate::descriptors::{DescriptorKind, DescriptorParams, DescriptorSignature, FeatureDescriptor};
use crate::error::Result;

/// Number of scalar statistics preceding the histograms: mean and standard
/// deviation of L, A and B.
pub const LAB_STATS_LEN: usize = 6;

/// Colour statistics in CIE L*a*b* space.
///
/// Output layout: `[l_mean, l_std, a_mean, a_std, b_mean, b_std, l_hist..,
/// a_hist.., b_hist..]`, each histogram counting 8-bit channel values over
/// `[0, 255]`.
#[derive(Debug, Clone)]
pub struct LabDescriptor {
    image_size: (u32, u32),
    config: LabConfig,
}

impl LabDescriptor {
    pub fn new(image_size: (u32, u32), config: LabConfig) -> Self {
        Self { image_size, config }
    }
}

/// Convert an sRGB pixel to the 8-bit L*a*b* encoding used by common vision
/// libraries: `L * 255 / 100`, `a + 128`, `b + 128`.
pub fn lab_u8(rgb: [u8; 3]) -> [u8; 3] {
    let srgb: Srgb<f32> = Srgb::new(rgb[0], rgb[1], rgb[2]).into_format();
    let lin: LinSrgb<f32> = srgb.into_linear();
    let lab: Lab = Lab::from_color(lin);
    [
        to_u8(lab.l * 255.0 / 100.0),
        to_u8(lab.a + 128.0),
        to_u8(lab.b + 128.0),
    ]
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn mean_std(values: &[u8]) -> (f64, f64) {
    let values: Array1<f64> = values.iter().map(|&v| f64::from(v)).collect();
    match values.mean() {
        Some(mean) => (mean, values.std(0.0)),
        None => (0.0, 0.0),
    }
}

/// Equal-width histogram over [0, 255]; the last bin is closed.
fn histogram(values: &[u8], bins: usize) -> Vec<f64> {
    let mut hist = vec![0.0; bins];
    for &v in values {
        let bin = (v as usize * bins / 255).min(bins - 1);
        hist[bin] += 1.0;
    }
    hist
}

impl FeatureDescriptor for LabDescriptor {
    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Lab
    }

    fn feature_len(&self) -> usize {
        LAB_STATS_LEN + 3 * self.config.bins
    }

    fn signature(&self) -> DescriptorSignature {
        DescriptorSignature {
            kind: DescriptorKind::Lab,
            image_size: self.image_size,
            params: DescriptorParams::Lab(self.config),
            feature_len: self.feature_len(),
        }
    }

    fn extract(&self, image: &RgbImage) -> Result<Vec<f64>> {
        let resized = resize_to(image, self.image_size);
        let n = resized.width() as usize * resized.height() as usize;
        let mut channels = [Vec::with_capacity(n), Vec::with_capacity(n), Vec::with_capacity(n)];
        for px in resized.pixels() {
            let lab = lab_u8(px.0);
            for (channel, value) in channels.iter_mut().zip(lab) {
                channel.push(value);
            }
        }

        let mut features = Vec::with_capacity(self.feature_len());
        for channel in &channels {
            let (mean, std) = mean_std(channel);
            features.push(mean);
            features.push(std);
        }
        for channel in &channels {
            features.extend(histogram(channel, self.config.bins));
        }
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn reference_colours_match_8bit_lab() {
        assert_eq!(lab_u8([0, 0, 0]), [0, 128, 128]);
        assert_eq!(lab_u8([255, 255, 255]), [255, 128, 128]);
        // Pure red: L* ~ 53.2, a* ~ 80.1, b* ~ 67.2
        let [l, a, b] = lab_u8([255, 0, 0]);
        assert!((l as i32 - 136).abs() <= 1, "l = {}", l);
        assert!((a as i32 - 208).abs() <= 1, "a = {}", a);
        assert!((b as i32 - 195).abs() <= 1, "b = {}", b);
    }

    #[test]
    fn histogram_closes_last_bin() {
        let hist = histogram(&[0, 7, 8, 254, 255], 32);
        assert_eq!(hist.len(), 32);
        assert_eq!(hist[0], 2.0);
        assert_eq!(hist[1], 1.0);
        assert_eq!(hist[31], 2.0);
    }

    #[test]
    fn channel_statistics_use_population_std() {
        let (mean, std) = mean_std(&[2, 4, 4, 4, 5, 5, 7, 9]);
        assert!((mean - 5.0).abs() < 1e-12);
        assert!((std - 2.0).abs() < 1e-12);
        assert_eq!(mean_std(&[]), (0.0, 0.0));
    }

    #[test]
    fn uniform_image_has_zero_spread() {
        let d = LabDescriptor::new((16, 16), LabConfig::default());
        let img = RgbImage::from_pixel(16, 16, Rgb([255, 255, 255]));
        let v = d.extract(&img).unwrap();
        assert_eq!(v.len(), 102);
        assert_eq!(&v[..6], &[255.0, 0.0, 128.0, 0.0, 128.0, 0.0]);
        // every pixel lands in one bin per channel
        let l_hist = &v[6..38];
        assert_eq!(l_hist.iter().sum::<f64>(), 256.0);
        assert_eq!(l_hist[31], 256.0);
    }
}
