use eframe::egui::Color32;
use palette::{Darken, Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Threshold colour scale for undergraduate population
// ---------------------------------------------------------------------------

/// Population thresholds separating the colour buckets.
pub const UG_DOMAIN: [u64; 5] = [1000, 3000, 5000, 7000, 9000];

/// One colour per bucket, light to dark blue.
pub const UG_COLORS: [(u8, u8, u8); 6] = [
    (0x9e, 0xca, 0xe1),
    (0x6b, 0xae, 0xd6),
    (0x42, 0x92, 0xc6),
    (0x21, 0x71, 0xb5),
    (0x08, 0x51, 0x9c),
    (0x08, 0x30, 0x6b),
];

/// Maps an undergraduate population to one of [`UG_COLORS`].
#[derive(Debug, Clone)]
pub struct ThresholdScale {
    domain: Vec<u64>,
    range: Vec<Color32>,
}

impl Default for ThresholdScale {
    fn default() -> Self {
        Self::new(&UG_DOMAIN, &UG_COLORS)
    }
}

impl ThresholdScale {
    /// `range` must hold one more colour than `domain` has thresholds.
    pub fn new(domain: &[u64], range: &[(u8, u8, u8)]) -> Self {
        debug_assert_eq!(range.len(), domain.len() + 1);
        Self {
            domain: domain.to_vec(),
            range: range.iter().map(|&(r, g, b)| to_color32(Srgb::new(r, g, b))).collect(),
        }
    }

    /// Bucket index: values below the first threshold land in bucket 0,
    /// values at or above the last in the final bucket.
    pub fn bucket(&self, value: u64) -> usize {
        self.domain.partition_point(|&t| t <= value)
    }

    pub fn color(&self, bucket: usize) -> Color32 {
        self.range
            .get(bucket)
            .or(self.range.last())
            .copied()
            .unwrap_or(Color32::GRAY)
    }

    pub fn bucket_count(&self) -> usize {
        self.range.len()
    }

    /// Legend label for a bucket: `< 1000`, …, `>= 9000`.
    pub fn label(&self, bucket: usize) -> String {
        match self.domain.get(bucket) {
            Some(upper) => format!("< {upper}"),
            None => format!(">= {}", self.domain.last().copied().unwrap_or(0)),
        }
    }

    /// Return the legend entries (label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        (0..self.bucket_count())
            .map(|i| (self.label(i), self.color(i)))
            .collect()
    }
}

/// Outline colour for the selected state.
pub fn highlight(base: Color32) -> Color32 {
    let rgb: Srgb = Srgb::new(base.r(), base.g(), base.b()).into_format();
    let hsl: Hsl = rgb.into_color();
    let darker: Srgb = hsl.darken(0.35).into_color();
    to_color32(darker.into_format())
}

fn to_color32(rgb: Srgb<u8>) -> Color32 {
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}
