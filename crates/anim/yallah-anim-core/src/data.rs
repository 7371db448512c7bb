//! Keyframe curves and per-bone quaternion rotation channels.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::quat::Quat;

/// One `(time, value)` sample. Serialized as a two-element array.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Keyframe {
    pub time: f64,
    pub value: f64,
}

impl Keyframe {
    #[inline]
    pub const fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

impl From<[f64; 2]> for Keyframe {
    fn from(co: [f64; 2]) -> Self {
        Self::new(co[0], co[1])
    }
}

impl From<Keyframe> for [f64; 2] {
    fn from(k: Keyframe) -> Self {
        [k.time, k.value]
    }
}

/// Bezier control points around a keyframe, as `(time, value)` pairs.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Handles {
    pub left: [f64; 2],
    pub right: [f64; 2],
}

/// An animation curve for one numeric property.
///
/// Handles are derived from the keyframes and cached; any value change
/// through [`Curve::set_value`] marks them stale until [`Curve::update`] runs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curve {
    keyframes: Vec<Keyframe>,
    #[serde(skip)]
    handles: Vec<Handles>,
    #[serde(skip)]
    stale: bool,
}

impl PartialEq for Curve {
    fn eq(&self, other: &Self) -> bool {
        self.keyframes == other.keyframes
    }
}

impl Curve {
    /// Build a curve and compute its handles.
    pub fn new(keyframes: Vec<Keyframe>) -> Self {
        let mut curve = Self {
            keyframes,
            handles: Vec::new(),
            stale: true,
        };
        curve.update();
        curve
    }

    pub fn from_points(points: &[(f64, f64)]) -> Self {
        Self::new(points.iter().map(|&(t, v)| Keyframe::new(t, v)).collect())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    #[inline]
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.keyframes.iter().map(|k| k.time)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.keyframes.iter().map(|k| k.value)
    }

    /// Cached handles; empty or outdated while [`Curve::handles_stale`] is true.
    #[inline]
    pub fn handles(&self) -> &[Handles] {
        &self.handles
    }

    #[inline]
    pub fn handles_stale(&self) -> bool {
        self.stale || self.handles.len() != self.keyframes.len()
    }

    /// Overwrite the value of keyframe `index`; the time is left untouched.
    ///
    /// Panics if `index` is out of bounds.
    pub fn set_value(&mut self, index: usize, value: f64) {
        self.keyframes[index].value = value;
        self.stale = true;
    }

    /// Add `delta` to every keyframe value.
    pub fn shift_values(&mut self, delta: f64) {
        for k in &mut self.keyframes {
            k.value += delta;
        }
        self.stale = true;
    }

    /// Sort keyframes chronologically and recompute auto-clamped handles.
    pub fn update(&mut self) {
        self.keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.handles = auto_clamped_handles(&self.keyframes);
        self.stale = false;
    }
}

/// Auto-clamped Bezier handles: one third of the neighbouring interval in
/// time, slope from the neighbours, flattened at extremes and end points, and
/// never overshooting the neighbouring values.
fn auto_clamped_handles(keys: &[Keyframe]) -> Vec<Handles> {
    let n = keys.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let k = keys[i];
        let prev = if i > 0 { Some(keys[i - 1]) } else { None };
        let next = keys.get(i + 1).copied();

        let dt_prev = prev.map(|p| k.time - p.time);
        let dt_next = next.map(|q| q.time - k.time);
        let span_left = dt_prev.or(dt_next).unwrap_or(0.0) / 3.0;
        let span_right = dt_next.or(dt_prev).unwrap_or(0.0) / 3.0;

        let slope = match (prev, next) {
            (Some(p), Some(q)) => {
                let rising = (k.value - p.value) * (q.value - k.value);
                let dt = q.time - p.time;
                if rising <= 0.0 || dt == 0.0 {
                    0.0
                } else {
                    (q.value - p.value) / dt
                }
            }
            _ => 0.0,
        };

        let mut left_v = k.value - slope * span_left;
        let mut right_v = k.value + slope * span_right;
        if let Some(p) = prev {
            left_v = left_v.clamp(p.value.min(k.value), p.value.max(k.value));
        }
        if let Some(q) = next {
            right_v = right_v.clamp(q.value.min(k.value), q.value.max(k.value));
        }

        out.push(Handles {
            left: [k.time - span_left, left_v],
            right: [k.time + span_right, right_v],
        });
    }
    out
}

/// Quaternion component, in rotation-curve array-index order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum QuatComponent {
    W,
    X,
    Y,
    Z,
}

impl QuatComponent {
    pub const ALL: [QuatComponent; 4] = [Self::W, Self::X, Self::Y, Self::Z];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::W => 0,
            Self::X => 1,
            Self::Y => 2,
            Self::Z => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// The four component curves of one bone's quaternion rotation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationChannel {
    pub w: Curve,
    pub x: Curve,
    pub y: Curve,
    pub z: Curve,
}

/// Rotation channels keyed by bone name, in insertion order.
pub type ChannelMap = IndexMap<String, RotationChannel>;

impl RotationChannel {
    pub fn new(w: Curve, x: Curve, y: Curve, z: Curve) -> Self {
        Self { w, x, y, z }
    }

    /// Build four aligned curves from `(time, rotation)` samples.
    pub fn from_samples(samples: &[(f64, Quat)]) -> Self {
        let curve = |pick: fn(&Quat) -> f64| {
            Curve::new(
                samples
                    .iter()
                    .map(|(t, q)| Keyframe::new(*t, pick(q)))
                    .collect(),
            )
        };
        Self::new(curve(|q| q.w), curve(|q| q.x), curve(|q| q.y), curve(|q| q.z))
    }

    #[inline]
    pub fn curve(&self, component: QuatComponent) -> &Curve {
        match component {
            QuatComponent::W => &self.w,
            QuatComponent::X => &self.x,
            QuatComponent::Y => &self.y,
            QuatComponent::Z => &self.z,
        }
    }

    #[inline]
    pub fn curve_mut(&mut self, component: QuatComponent) -> &mut Curve {
        match component {
            QuatComponent::W => &mut self.w,
            QuatComponent::X => &mut self.x,
            QuatComponent::Y => &mut self.y,
            QuatComponent::Z => &mut self.z,
        }
    }

    pub fn counts(&self) -> [usize; 4] {
        [self.w.len(), self.x.len(), self.y.len(), self.z.len()]
    }

    /// Check the four curves share a sample count and, index by index,
    /// timestamps within `time_epsilon`. Returns the common sample count.
    pub fn validate(&self, bone: &str, time_epsilon: f64) -> Result<usize> {
        let counts = self.counts();
        if counts.iter().any(|&c| c != counts[0]) {
            return Err(Error::UnalignedCurve {
                bone: bone.to_string(),
                counts,
            });
        }
        for index in 0..counts[0] {
            let times = [
                self.w.keyframes[index].time,
                self.x.keyframes[index].time,
                self.y.keyframes[index].time,
                self.z.keyframes[index].time,
            ];
            let aligned = times[1..]
                .iter()
                .all(|t| (t - times[0]).abs() <= time_epsilon);
            if !aligned {
                return Err(Error::MisalignedTimestamps {
                    bone: bone.to_string(),
                    index,
                    times,
                });
            }
        }
        Ok(counts[0])
    }

    /// Rotation at keyframe `index`. Assumes a validated channel.
    #[inline]
    pub fn sample(&self, index: usize) -> Quat {
        Quat::new(
            self.w.keyframes[index].value,
            self.x.keyframes[index].value,
            self.y.keyframes[index].value,
            self.z.keyframes[index].value,
        )
    }

    /// Overwrite the rotation at keyframe `index`, leaving times alone.
    pub fn set_sample(&mut self, index: usize, q: Quat) {
        self.w.set_value(index, q.w);
        self.x.set_value(index, q.x);
        self.y.set_value(index, q.y);
        self.z.set_value(index, q.z);
    }

    /// Keyframe times, taken from the w curve.
    pub fn times(&self) -> Vec<f64> {
        self.w.times().collect()
    }
}
