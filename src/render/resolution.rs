/*!
 * Working-resolution decision.
 *
 * Sources below the legibility threshold are upscaled before burn-in so the
 * caption strokes survive; everything else renders at native size.
 */

use std::fmt;

use serde::Serialize;

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Pick the canvas used for layout and encoding.
///
/// Returns the working resolution and whether it is an upscale. Upscaled
/// dimensions preserve the aspect ratio and are both even, since common
/// encoders reject odd chroma plane sizes.
pub fn working_resolution(native: Resolution, min_height: u32) -> (Resolution, bool) {
    if native.height >= min_height || native.height == 0 {
        return (native, false);
    }

    let height = round_up_even(min_height);
    let width = nearest_even(native.width as f64 * height as f64 / native.height as f64);

    (Resolution::new(width, height), true)
}

fn round_up_even(value: u32) -> u32 {
    value + value % 2
}

// Nearest even integer, never below 2
fn nearest_even(value: f64) -> u32 {
    let even = ((value / 2.0).round() * 2.0).clamp(2.0, u32::MAX as f64 - 1.0);
    even as u32
}
