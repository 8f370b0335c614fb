//=========================================================================
// View Geometry
//=========================================================================
//
// Logical view size and device scale, normalized at the bridge edge so
// engines never see an empty or non-finite render target.
//
// Rules:
//   width/height <= 0          → 1
//   width/height > 16384       → 16384
//   scale not finite or <= 0   → 1.0
//   physical = round(logical × scale), within 1..=16384
//
// The cap keeps the largest BGRA buffer (16384² × 4 bytes) below
// `i32::MAX`, the limit of the C paint callback's length argument.
//
//=========================================================================

//=== Limits ==============================================================

/// Largest logical or physical view dimension, in pixels.
pub const MAX_VIEW_DIMENSION: u32 = 16_384;

//=== ViewSize ============================================================

/// Logical size of a browser view, always at least 1×1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewSize {
    width: u32,
    height: u32,
}

impl ViewSize {
    /// Builds a size from raw C values, clamping each dimension to
    /// `1..=MAX_VIEW_DIMENSION`.
    pub fn clamped(width: i32, height: i32) -> Self {
        let clamp = |dim: i32| dim.clamp(1, MAX_VIEW_DIMENSION as i32) as u32;
        Self {
            width: clamp(width),
            height: clamp(height),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size of the pixel buffer at `scale`, capped at `MAX_VIEW_DIMENSION`.
    pub fn physical(&self, scale: DeviceScale) -> (u32, u32) {
        let factor = scale.get() as f64;
        let scale_dim = |dim: u32| {
            let scaled = (dim as f64 * factor).round().min(MAX_VIEW_DIMENSION as f64);
            (scaled as u32).max(1)
        };
        (scale_dim(self.width), scale_dim(self.height))
    }
}

//=== DeviceScale =========================================================

/// Device pixel ratio of a view, always finite and positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceScale(f32);

impl DeviceScale {
    pub const ONE: Self = Self(1.0);

    /// Builds a scale from a raw value, replacing invalid ones with 1.0.
    pub fn clamped(scale: f32) -> Self {
        if scale.is_finite() && scale > 0.0 {
            Self(scale)
        } else {
            Self::ONE
        }
    }

    pub fn get(&self) -> f32 {
        self.0
    }
}

impl Default for DeviceScale {
    fn default() -> Self {
        Self::ONE
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_sizes_clamp_to_one() {
        let size = ViewSize::clamped(0, -20);
        assert_eq!((size.width(), size.height()), (1, 1));
    }

    #[test]
    fn valid_sizes_pass_through() {
        let size = ViewSize::clamped(800, 600);
        assert_eq!((size.width(), size.height()), (800, 600));
    }

    #[test]
    fn invalid_scales_fall_back_to_one() {
        assert_eq!(DeviceScale::clamped(0.0), DeviceScale::ONE);
        assert_eq!(DeviceScale::clamped(-2.0), DeviceScale::ONE);
        assert_eq!(DeviceScale::clamped(f32::NAN), DeviceScale::ONE);
        assert_eq!(DeviceScale::clamped(f32::INFINITY), DeviceScale::ONE);
        assert_eq!(DeviceScale::clamped(2.0).get(), 2.0);
    }

    #[test]
    fn physical_size_scales_and_rounds() {
        let size = ViewSize::clamped(101, 50);
        assert_eq!(size.physical(DeviceScale::clamped(2.0)), (202, 100));
        assert_eq!(size.physical(DeviceScale::clamped(1.5)), (152, 75));
    }

    #[test]
    fn oversized_sizes_clamp_to_max() {
        let size = ViewSize::clamped(i32::MAX, MAX_VIEW_DIMENSION as i32 + 1);
        assert_eq!((size.width(), size.height()), (MAX_VIEW_DIMENSION, MAX_VIEW_DIMENSION));
    }

    #[test]
    fn physical_size_is_capped() {
        let size = ViewSize::clamped(10_000, 20);
        let (width, height) = size.physical(DeviceScale::clamped(1e6));
        assert_eq!((width, height), (MAX_VIEW_DIMENSION, MAX_VIEW_DIMENSION));

        let largest = width as u64 * height as u64 * 4;
        assert!(largest <= i32::MAX as u64);
    }

    #[test]
    fn physical_size_never_zero() {
        let size = ViewSize::clamped(1, 1);
        assert_eq!(size.physical(DeviceScale::clamped(0.1)), (1, 1));
    }
}
