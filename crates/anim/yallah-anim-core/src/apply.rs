//! Applying rotation offsets to quaternion rotation channels.
//!
//! Every sampled rotation `R` of a bone listed in the offset table becomes
//! `O * R`: the offset is the left Hamilton operand. Timestamps never change.
//! All channels are validated before any is written, so an error leaves the
//! whole map untouched.

use crate::config::Config;
use crate::data::{ChannelMap, Curve, QuatComponent};
use crate::error::{Error, Result};
use crate::offsets::OffsetTable;

/// Hook invoked once per rewritten curve so interpolation state derived from
/// the old values (handles, caches) is rebuilt. Hosts that own their own
/// curve representation implement this; [`RecomputeHandles`] is the default.
pub trait CurveRefresh {
    fn refresh(&mut self, bone: &str, component: QuatComponent, curve: &mut Curve);
}

/// Recomputes the curve's own auto-clamped handles.
#[derive(Copy, Clone, Debug, Default)]
pub struct RecomputeHandles;

impl CurveRefresh for RecomputeHandles {
    fn refresh(&mut self, bone: &str, component: QuatComponent, curve: &mut Curve) {
        log::debug!("recomputing handles for {bone}[{}]", component.index());
        curve.update();
    }
}

impl<F> CurveRefresh for F
where
    F: FnMut(&str, QuatComponent, &mut Curve),
{
    fn refresh(&mut self, bone: &str, component: QuatComponent, curve: &mut Curve) {
        self(bone, component, curve)
    }
}

/// Outcome of a successful [`apply_offsets`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Bones whose channels were rewritten, in channel-map order.
    pub bones: Vec<String>,
    /// Total keyframes rewritten across all bones.
    pub samples: usize,
}

/// Pre-multiply every sample of each bone in `offsets` by that bone's offset,
/// in place, then hand each rewritten curve to `refresh`.
///
/// Bones with channels but no offset are untouched. Fails with
/// [`Error::MissingChannel`], [`Error::UnalignedCurve`], or
/// [`Error::MisalignedTimestamps`] before writing anything.
pub fn apply_offsets<R: CurveRefresh + ?Sized>(
    channels: &mut ChannelMap,
    offsets: &OffsetTable,
    config: &Config,
    refresh: &mut R,
) -> Result<ApplyReport> {
    for (bone, _) in offsets.iter() {
        let channel = channels.get(bone).ok_or_else(|| Error::MissingChannel {
            bone: bone.to_string(),
        })?;
        channel.validate(bone, config.timestamp_epsilon)?;
    }

    let mut report = ApplyReport::default();
    for (bone, channel) in channels.iter_mut() {
        let Some(offset) = offsets.get(bone) else {
            continue;
        };
        log::info!("applying offset {offset} to bone {bone}");
        let count = channel.w.len();
        for i in 0..count {
            let rotated = offset * channel.sample(i);
            channel.set_sample(i, rotated);
        }
        for component in QuatComponent::ALL {
            refresh.refresh(bone, component, channel.curve_mut(component));
        }
        report.bones.push(bone.clone());
        report.samples += count;
    }
    Ok(report)
}

/// Non-mutating variant of [`apply_offsets`] using [`RecomputeHandles`].
pub fn offset_channels(
    channels: &ChannelMap,
    offsets: &OffsetTable,
    config: &Config,
) -> Result<ChannelMap> {
    let mut out = channels.clone();
    apply_offsets(&mut out, offsets, config, &mut RecomputeHandles)?;
    Ok(out)
}
