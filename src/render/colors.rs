/// Golden-ratio hue step so neighbouring blocks never share a hue family.
const HUE_STEP: f32 = 0.618_034;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Hue walks by placement index
    Index,
    /// Hue from a hash of the entity name (stable across relayouts)
    NameHash,
    /// Single hue, lightness fades down the ranking
    Ramp,
}

#[derive(Debug, Clone, Copy)]
pub struct ColorSettings {
    pub mode: ColorMode,
    pub vibrancy: f32,
    /// Base hue for `Ramp` (0..1)
    pub base_hue: f32,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            mode: ColorMode::Index,
            vibrancy: 1.20,
            base_hue: 210.0 / 360.0,
        }
    }
}

/// Plain RGBA colour in 0..1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl AppColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// `#rrggbb` for markup renderers.
    pub fn to_hex(self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

/// Fill colour for the `index`-th placement (magnitude rank). Pure function of
/// its arguments, independent of geometry.
pub fn placement_color(
    index: usize,
    name: &str,
    count: usize,
    settings: &ColorSettings,
) -> AppColor {
    let base = match settings.mode {
        ColorMode::Index => {
            let h = (settings.base_hue + index as f32 * HUE_STEP).rem_euclid(1.0);
            hsv_to_rgb(h, 0.62, 0.88)
        }
        ColorMode::NameHash => hsv_to_rgb(hash01(name), 0.66, 0.86),
        ColorMode::Ramp => {
            let t = if count > 1 {
                index as f32 / (count - 1) as f32
            } else {
                0.0
            };
            hsv_to_rgb(settings.base_hue, 0.70 - 0.35 * t, 0.92 - 0.40 * t)
        }
    };
    apply_vibrancy(base, settings.vibrancy)
}

/// Label colour that stays readable on `fill`.
pub fn text_color(fill: AppColor) -> AppColor {
    let luma = 0.2126 * fill.r + 0.7152 * fill.g + 0.0722 * fill.b;
    if luma > 0.55 {
        AppColor::new(0.08, 0.08, 0.10)
    } else {
        AppColor::new(0.97, 0.97, 0.98)
    }
}

fn apply_vibrancy(color: AppColor, vibrancy: f32) -> AppColor {
    let (h, mut s, v) = rgb_to_hsv(color);
    s = (s * vibrancy.clamp(0.6, 2.0)).clamp(0.0, 1.0);
    hsv_to_rgb(h, s, v)
}

fn rgb_to_hsv(c: AppColor) -> (f32, f32, f32) {
    let max = c.r.max(c.g.max(c.b));
    let min = c.r.min(c.g.min(c.b));
    let d = max - min;
    let h = if d <= 1e-6 {
        0.0
    } else if (max - c.r).abs() <= 1e-6 {
        ((c.g - c.b) / d).rem_euclid(6.0) / 6.0
    } else if (max - c.g).abs() <= 1e-6 {
        (((c.b - c.r) / d) + 2.0) / 6.0
    } else {
        (((c.r - c.g) / d) + 4.0) / 6.0
    };
    let s = if max <= 1e-6 { 0.0 } else { d / max };
    (h, s, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> AppColor {
    let h6 = (h * 6.0).rem_euclid(6.0);
    let i = h6.floor() as i32;
    let f = h6 - i as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match i {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    AppColor { r, g, b, a: 1.0 }
}

// FNV-1a
fn hash01(s: &str) -> f32 {
    let mut h: u32 = 2166136261;
    for &b in s.as_bytes() {
        h ^= b as u32;
        h = h.wrapping_mul(16777619);
    }
    ((h >> 8) as f32) / ((u32::MAX >> 8) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_color() {
        let s = ColorSettings::default();
        assert_eq!(placement_color(3, "Acme", 10, &s), placement_color(3, "Acme", 10, &s));
    }

    #[test]
    fn neighbours_differ() {
        let s = ColorSettings::default();
        assert_ne!(
            placement_color(0, "a", 10, &s).to_hex(),
            placement_color(1, "a", 10, &s).to_hex()
        );
    }

    #[test]
    fn name_hash_ignores_index() {
        let s = ColorSettings {
            mode: ColorMode::NameHash,
            ..Default::default()
        };
        assert_eq!(placement_color(0, "Acme", 5, &s), placement_color(4, "Acme", 5, &s));
    }

    #[test]
    fn ramp_darkens_down_the_ranking() {
        let s = ColorSettings {
            mode: ColorMode::Ramp,
            ..Default::default()
        };
        let first = placement_color(0, "a", 5, &s);
        let last = placement_color(4, "e", 5, &s);
        assert!(first.r.max(first.g).max(first.b) > last.r.max(last.g).max(last.b));
    }

    #[test]
    fn hex_and_contrast() {
        assert_eq!(AppColor::new(1.0, 0.0, 0.5).to_hex(), "#ff0080");
        assert_eq!(
            text_color(AppColor::new(1.0, 1.0, 1.0)),
            AppColor::new(0.08, 0.08, 0.10)
        );
        assert_eq!(
            text_color(AppColor::new(0.0, 0.0, 0.2)),
            AppColor::new(0.97, 0.97, 0.98)
        );
    }
}
