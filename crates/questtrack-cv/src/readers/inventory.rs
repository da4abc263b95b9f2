//! Subscreen triforce reading.
//!
//! The assembled triforce is drawn as up to eight warm triangular pieces
//! side by side. Per-piece template matching is fragile here because the
//! pieces pulse and adjacent pieces touch; instead the reader clusters
//! bright warm pixel columns along the x axis and counts the clusters.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use questtrack_core::TriforceReading;

use crate::classify::is_warm;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriforceConfig {
    /// Warm pixels a column needs before it belongs to a piece.
    pub column_pixels_min: u32,
    /// Dark columns that end a cluster.
    pub gap_columns_min: u32,
    /// Columns a cluster needs to count as a piece.
    pub cluster_width_min: u32,
}

impl Default for TriforceConfig {
    fn default() -> Self {
        Self {
            column_pixels_min: 2,
            gap_columns_min: 2,
            cluster_width_min: 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TriforceReader {
    config: TriforceConfig,
}

impl TriforceReader {
    pub fn new(config: TriforceConfig) -> Self {
        Self { config }
    }

    /// Count assembled pieces in the subscreen triforce region and map each
    /// cluster to its eighth-of-the-region slot (bit N = slot N, left to
    /// right). Only meaningful on subscreen frames; the caller gates on
    /// screen type.
    pub fn read(&self, region: &RgbImage) -> TriforceReading {
        let width = region.width();
        if width == 0 || region.height() == 0 {
            return TriforceReading::default();
        }

        // Warm-pixel histogram along x.
        let mut columns = vec![0u32; width as usize];
        for (x, _, p) in region.enumerate_pixels() {
            if is_warm(p) {
                columns[x as usize] += 1;
            }
        }

        let mut count = 0u8;
        let mut bits = 0u8;
        let mut run_start: Option<u32> = None;
        let mut gap = 0u32;
        let slot_width = (width as f64 / 8.0).max(1.0);

        let close_run = |start: u32, end: u32, count: &mut u8, bits: &mut u8| {
            if end - start >= self.config.cluster_width_min && *count < 8 {
                *count += 1;
                let center = (start + end) as f64 / 2.0;
                let slot = ((center / slot_width) as u8).min(7);
                *bits |= 1 << slot;
            }
        };

        for x in 0..width {
            let lit = columns[x as usize] >= self.config.column_pixels_min;
            match (lit, run_start) {
                (true, None) => {
                    run_start = Some(x);
                    gap = 0;
                }
                (true, Some(_)) => gap = 0,
                (false, Some(start)) => {
                    gap += 1;
                    if gap >= self.config.gap_columns_min {
                        close_run(start, x - gap + 1, &mut count, &mut bits);
                        run_start = None;
                    }
                }
                (false, None) => {}
            }
        }
        if let Some(start) = run_start {
            close_run(start, width, &mut count, &mut bits);
        }

        TriforceReading { count, bits }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const GOLD: Rgb<u8> = Rgb([252, 152, 56]);

    /// Region with warm vertical bands at the given column ranges.
    fn region_with_pieces(ranges: &[(u32, u32)]) -> RgbImage {
        let mut img = RgbImage::from_pixel(96, 48, Rgb([0, 0, 0]));
        for &(x0, x1) in ranges {
            for x in x0..x1 {
                for y in 10..40 {
                    img.put_pixel(x, y, GOLD);
                }
            }
        }
        img
    }

    #[test]
    fn test_counts_separated_pieces() {
        let reader = TriforceReader::default();
        // Three pieces in slots 0, 3 and 7 (slot width 12).
        let reading = reader.read(&region_with_pieces(&[(2, 10), (38, 46), (86, 94)]));
        assert_eq!(reading.count, 3);
        assert_eq!(reading.bits, 0b1000_1001);
    }

    #[test]
    fn test_empty_region_is_zero() {
        let reader = TriforceReader::default();
        let reading = reader.read(&RgbImage::from_pixel(96, 48, Rgb([0, 0, 0])));
        assert_eq!(reading, TriforceReading::default());
    }

    #[test]
    fn test_narrow_noise_is_ignored() {
        let reader = TriforceReader::default();
        // A 2-column sliver, below the cluster width minimum.
        let reading = reader.read(&region_with_pieces(&[(40, 42)]));
        assert_eq!(reading.count, 0);
    }

    #[test]
    fn test_full_triforce() {
        let reader = TriforceReader::default();
        let pieces: Vec<(u32, u32)> = (0..8).map(|i| (i * 12 + 2, i * 12 + 10)).collect();
        let reading = reader.read(&region_with_pieces(&pieces));
        assert_eq!(reading.count, 8);
        assert_eq!(reading.bits, 0xff);
    }
}
