//! Interpolation shapes applied to the segment starting at a keyframe.

/// The four interpolation modes a [`Key`](super::track::Key) can carry.
///
/// The numeric discriminants match the wire protocol and the CTF file
/// format tag byte, so `as u8`/[`From<u8>`] round-trip without a lookup
/// table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Interpolation {
    /// Holds the left key's value for the whole segment.
    Step = 0,
    /// `t`
    Linear = 1,
    /// `t * t * (3 - 2 * t)`
    Smooth = 2,
    /// `t.powi(2)`
    Ramp = 3,
}

impl From<u8> for Interpolation {
    /// Unknown tag bytes fall back to [`Interpolation::Step`], matching the
    /// editor's own tolerant decoding.
    fn from(raw: u8) -> Interpolation {
        match raw {
            0 => Interpolation::Step,
            1 => Interpolation::Linear,
            2 => Interpolation::Smooth,
            3 => Interpolation::Ramp,
            _ => Interpolation::Step,
        }
    }
}

impl Interpolation {
    /// This performs the interpolation.
    ///
    /// `t` is already normalized to the `[0, 1]` range of the segment.
    ///
    /// # Examples
    ///
    /// ```
    /// # use crocket::lowlevel::interpolation::Interpolation;
    /// assert_eq!(Interpolation::Linear.interpolate(0.5), 0.5);
    /// ```
    ///
    /// ```
    /// # use crocket::lowlevel::interpolation::Interpolation;
    /// assert_eq!(Interpolation::Step.interpolate(0.5), 0.);
    /// ```
    pub fn interpolate(self, t: f32) -> f32 {
        match self {
            Interpolation::Step => 0.0,
            Interpolation::Linear => t,
            Interpolation::Smooth => t * t * (3.0 - 2.0 * t),
            Interpolation::Ramp => t.powi(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u8_round_trips_known_tags() {
        assert!(matches!(Interpolation::from(0), Interpolation::Step));
        assert!(matches!(Interpolation::from(1), Interpolation::Linear));
        assert!(matches!(Interpolation::from(2), Interpolation::Smooth));
        assert!(matches!(Interpolation::from(3), Interpolation::Ramp));
    }

    #[test]
    fn unknown_tag_falls_back_to_step() {
        assert!(matches!(Interpolation::from(255), Interpolation::Step));
    }

    #[test]
    fn shapes_at_endpoints() {
        for mode in [Interpolation::Linear, Interpolation::Smooth, Interpolation::Ramp] {
            assert_eq!(mode.interpolate(0.0), 0.0);
            assert!((mode.interpolate(1.0) - 1.0).abs() < 1e-6);
        }
        assert_eq!(Interpolation::Step.interpolate(0.5), 0.0);
    }
}
