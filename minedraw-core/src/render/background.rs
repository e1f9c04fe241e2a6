//! Sky backgrounds painted behind the layers on PNG export.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::debug;

/// Background presets the user can choose from.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BackgroundPreset {
    Day,
    #[default]
    DaySun,
    NightMoon,
    NightStars,
}

const DAY_TOP: Rgba<u8> = Rgba([0x87, 0xce, 0xeb, 0xff]);
const DAY_BOTTOM: Rgba<u8> = Rgba([0xb0, 0xd9, 0xf5, 0xff]);
const NIGHT_TOP: Rgba<u8> = Rgba([0x0a, 0x16, 0x28, 0xff]);
const NIGHT_BOTTOM: Rgba<u8> = Rgba([0x1a, 0x27, 0x44, 0xff]);
const SUN_EDGE: Rgba<u8> = Rgba([0xfd, 0xb8, 0x13, 0xff]);
const SUN_CENTER: Rgba<u8> = Rgba([0xff, 0xdd, 0x44, 0xff]);
const MOON_EDGE: Rgba<u8> = Rgba([0xe8, 0xe8, 0xe8, 0xff]);
const MOON_CENTER: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);

/// Sun and moon are an 80px square, 140px from the right and 40px from the top.
const ORB_SIZE: i64 = 80;
const ORB_RIGHT: i64 = 140;
const ORB_TOP: i64 = 40;

const STAR_COUNT: u64 = 160;
const STAR_SEED: u64 = 0x4d49_4e45_4452_4157;

/// Galaxy glow colour stops: (offset, rgb, alpha).
const GALAXY_STOPS: [(f32, [f32; 3], f32); 5] = [
    (0.0, [220.0, 230.0, 255.0], 0.18),
    (0.15, [180.0, 200.0, 255.0], 0.12),
    (0.3, [140.0, 170.0, 255.0], 0.07),
    (0.5, [100.0, 140.0, 255.0], 0.03),
    (0.7, [100.0, 140.0, 255.0], 0.0),
];
const GALAXY_ALPHA: f32 = 0.75;
const GALAXY_TILT_DEG: f32 = -12.0;

impl BackgroundPreset {
    pub fn is_night(self) -> bool {
        matches!(self, Self::NightMoon | Self::NightStars)
    }

    /// Paint this background over the whole image.
    pub fn paint(self, target: &mut RgbaImage) {
        debug!(preset = %self, width = target.width(), height = target.height(), "painting background");
        let (top, bottom) = if self.is_night() {
            (NIGHT_TOP, NIGHT_BOTTOM)
        } else {
            (DAY_TOP, DAY_BOTTOM)
        };
        vertical_gradient(target, top, bottom);

        match self {
            Self::Day => {}
            Self::DaySun => orb(target, SUN_EDGE, SUN_CENTER),
            Self::NightMoon => orb(target, MOON_EDGE, MOON_CENTER),
            Self::NightStars => {
                galaxy(target);
                stars(target);
            }
        }
    }
}

fn lerp(a: Rgba<u8>, b: Rgba<u8>, t: f32) -> Rgba<u8> {
    let t = t.clamp(0.0, 1.0);
    let mut out = [0u8; 4];
    for (i, c) in out.iter_mut().enumerate() {
        *c = (f32::from(a.0[i]) + (f32::from(b.0[i]) - f32::from(a.0[i])) * t).round() as u8;
    }
    Rgba(out)
}

/// Source-over blend of an rgb colour with straight alpha.
fn blend(dst: &mut Rgba<u8>, rgb: [f32; 3], alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    for (i, channel) in rgb.iter().enumerate() {
        let d = f32::from(dst.0[i]);
        dst.0[i] = (d + (channel - d) * alpha).round() as u8;
    }
}

fn vertical_gradient(target: &mut RgbaImage, top: Rgba<u8>, bottom: Rgba<u8>) {
    let span = target.height().saturating_sub(1).max(1) as f32;
    for (_, y, px) in target.enumerate_pixels_mut() {
        *px = lerp(top, bottom, y as f32 / span);
    }
}

/// Square with a diagonal edge-center-edge gradient.
fn orb(target: &mut RgbaImage, edge: Rgba<u8>, center: Rgba<u8>) {
    let (w, h) = (i64::from(target.width()), i64::from(target.height()));
    let x0 = w - ORB_RIGHT;
    for y in ORB_TOP.max(0)..(ORB_TOP + ORB_SIZE).min(h) {
        for x in x0.max(0)..(x0 + ORB_SIZE).min(w) {
            let t = ((x - x0) + (y - ORB_TOP)) as f32 / (2 * ORB_SIZE) as f32;
            let color = if t < 0.5 {
                lerp(edge, center, t * 2.0)
            } else {
                lerp(center, edge, (t - 0.5) * 2.0)
            };
            target.put_pixel(x as u32, y as u32, color);
        }
    }
}

fn galaxy_stop(r: f32) -> Option<([f32; 3], f32)> {
    let last = GALAXY_STOPS[GALAXY_STOPS.len() - 1];
    if r >= last.0 {
        return None;
    }
    GALAXY_STOPS.windows(2).find_map(|pair| {
        let (a, b) = (pair[0], pair[1]);
        (r >= a.0 && r < b.0).then(|| {
            let t = (r - a.0) / (b.0 - a.0);
            let rgb = [0, 1, 2].map(|i| a.1[i] + (b.1[i] - a.1[i]) * t);
            (rgb, a.2 + (b.2 - a.2) * t)
        })
    })
}

/// Faint tilted elliptical glow across the middle of the sky.
fn galaxy(target: &mut RgbaImage) {
    let (w, h) = (target.width() as f32, target.height() as f32);
    let radius = w.max(h) * 1.2;
    let (sin, cos) = (-GALAXY_TILT_DEG).to_radians().sin_cos();
    for (x, y, px) in target.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - w / 2.0;
        let dy = y as f32 + 0.5 - h / 2.0;
        // Undo the tilt, then the 1.5 x 0.5 stretch.
        let lx = (dx * cos - dy * sin) / 1.5;
        let ly = (dx * sin + dy * cos) / 0.5;
        let r = (lx * lx + ly * ly).sqrt() / radius;
        if let Some((rgb, alpha)) = galaxy_stop(r) {
            blend(px, rgb, alpha * GALAXY_ALPHA);
        }
    }
}

/// SplitMix64 step, so the star field is the same on every export.
fn mix(seed: u64, index: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E3779B97F4A7C15).wrapping_add(index);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

fn unit(bits: u64) -> f32 {
    (bits >> 40) as f32 / (1u64 << 24) as f32
}

/// `(x, y, size)` with x and y as fractions of the surface, size in pixels.
pub fn star_field() -> Vec<(f32, f32, f32)> {
    (0..STAR_COUNT)
        .map(|i| {
            let bits = mix(STAR_SEED, i * 3);
            let x = unit(bits);
            let y = unit(mix(STAR_SEED, i * 3 + 1));
            let size = 1.0 + (mix(STAR_SEED, i * 3 + 2) % 3) as f32;
            (x, y, size)
        })
        .collect()
}

fn stars(target: &mut RgbaImage) {
    let (w, h) = (target.width() as f32, target.height() as f32);
    for (fx, fy, size) in star_field() {
        let (cx, cy, r) = (fx * w, fy * h, size / 2.0);
        let x_range = (cx - r).floor().max(0.0) as u32..((cx + r).ceil() as u32).min(target.width());
        for x in x_range {
            let y_range =
                (cy - r).floor().max(0.0) as u32..((cy + r).ceil() as u32).min(target.height());
            for y in y_range {
                let (px, py) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
                if px * px + py * py <= r * r {
                    target.put_pixel(x, y, Rgba([0xff, 0xff, 0xff, 0xff]));
                }
            }
        }
    }
}
