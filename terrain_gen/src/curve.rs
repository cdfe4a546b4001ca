//! Height response curves.
//!
//! The mesh builder multiplies each vertex height by `curve(h)`, where `h` is the
//! normalized height. Any `Fn(f32) -> f32` works; [`KeyframeCurve`] is the
//! data-driven version loaded from config.

use serde::{Deserialize, Serialize};

/// Something that maps a normalized height to a multiplier.
pub trait HeightCurve {
    fn evaluate(&self, t: f32) -> f32;
}

impl<F: Fn(f32) -> f32> HeightCurve for F {
    fn evaluate(&self, t: f32) -> f32 {
        self(t)
    }
}

/// One control point of a [`KeyframeCurve`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    /// Slope arriving at this key.
    #[serde(default)]
    pub in_tangent: f32,
    /// Slope leaving this key.
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    /// A key with flat tangents.
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }

    pub fn with_tangents(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// Piecewise cubic Hermite curve through a list of keyframes.
///
/// Outside the key range the curve holds the first/last value. A curve with no
/// keys evaluates to 1.0 everywhere, which leaves heights unshaped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct KeyframeCurve {
    keys: Vec<Keyframe>,
}

impl Default for KeyframeCurve {
    /// Straight line from (0, 0) to (1, 1).
    fn default() -> Self {
        Self::linear(0.0, 0.0, 1.0, 1.0)
    }
}

impl From<Vec<Keyframe>> for KeyframeCurve {
    fn from(keys: Vec<Keyframe>) -> Self {
        Self::new(keys)
    }
}

impl From<KeyframeCurve> for Vec<Keyframe> {
    fn from(curve: KeyframeCurve) -> Self {
        curve.keys
    }
}

impl KeyframeCurve {
    /// Build a curve, sorting the keys by time.
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// Straight segment between two points, tangents set to its slope.
    pub fn linear(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        let slope = if t1 != t0 { (v1 - v0) / (t1 - t0) } else { 0.0 };
        Self::new(vec![
            Keyframe::with_tangents(t0, v0, slope, slope),
            Keyframe::with_tangents(t1, v1, slope, slope),
        ])
    }

    /// The same value everywhere.
    pub fn constant(value: f32) -> Self {
        Self::new(vec![Keyframe::new(0.0, value)])
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }
}

impl HeightCurve for KeyframeCurve {
    fn evaluate(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 1.0;
        };

        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; the one before it starts the segment.
        let next = self.keys.partition_point(|k| k.time <= t);
        let k0 = &self.keys[next - 1];
        let k1 = &self.keys[next];

        let dt = k1.time - k0.time;
        if dt <= 0.0 {
            return k1.value;
        }

        let s = (t - k0.time) / dt;
        let s2 = s * s;
        let s3 = s2 * s;

        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        h00 * k0.value + h10 * dt * k0.out_tangent + h01 * k1.value + h11 * dt * k1.in_tangent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_curve_is_identity() {
        let curve = KeyframeCurve::default();
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!((curve.evaluate(t) - t).abs() < 1e-5, "curve({t}) = {}", curve.evaluate(t));
        }
    }

    #[test]
    fn test_clamps_outside_keys() {
        let curve = KeyframeCurve::linear(0.2, 1.0, 0.8, 3.0);
        assert_eq!(curve.evaluate(-5.0), 1.0);
        assert_eq!(curve.evaluate(5.0), 3.0);
    }

    #[test]
    fn test_plateau_shape() {
        // Flat tangents give a smooth step that holds its ends.
        let curve = KeyframeCurve::new(vec![
            Keyframe::new(0.0, 0.0),
            Keyframe::new(0.5, 1.0),
            Keyframe::new(1.0, 1.0),
        ]);
        assert!((curve.evaluate(0.25) - 0.5).abs() < 1e-5);
        assert!((curve.evaluate(0.75) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_keys_are_sorted() {
        let curve = KeyframeCurve::new(vec![Keyframe::new(1.0, 2.0), Keyframe::new(0.0, 0.0)]);
        assert_eq!(curve.keys()[0].time, 0.0);
    }

    #[test]
    fn test_empty_and_constant() {
        assert_eq!(KeyframeCurve::new(Vec::new()).evaluate(0.3), 1.0);
        assert_eq!(KeyframeCurve::constant(0.4).evaluate(0.9), 0.4);
    }

    #[test]
    fn test_closure_curve() {
        let squared = |t: f32| t * t;
        assert_eq!(squared.evaluate(0.5), 0.25);
    }
}
