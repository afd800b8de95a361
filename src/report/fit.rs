/// The binding side of a picture box; the other side follows from the
/// picture's own aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fit {
    Width(f32),
    Height(f32),
}

/// Fit an image of `image_size` pixels into a `max_width` × `max_height`
/// box. Proportionally wider images are constrained by width, all others by
/// height. `image_size` must have a non-zero height.
pub fn fit(image_size: (u32, u32), max_width: f32, max_height: f32) -> Fit {
    let (w, h) = image_size;
    let image_ratio = w as f32 / h as f32;
    let target_ratio = max_width / max_height;
    if image_ratio > target_ratio {
        Fit::Width(max_width)
    } else {
        Fit::Height(max_height)
    }
}

impl Fit {
    pub fn width(self) -> Option<f32> {
        match self {
            Fit::Width(w) => Some(w),
            Fit::Height(_) => None,
        }
    }

    pub fn height(self) -> Option<f32> {
        match self {
            Fit::Width(_) => None,
            Fit::Height(h) => Some(h),
        }
    }

    /// Both sides, deriving the unconstrained one from `pixels`.
    pub fn resolve(self, pixels: (u32, u32)) -> (f32, f32) {
        let ratio = pixels.0 as f32 / pixels.1 as f32;
        match self {
            Fit::Width(w) => (w, w / ratio),
            Fit::Height(h) => (h * ratio, h),
        }
    }
}
