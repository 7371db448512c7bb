//! Command implementations

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use yallah_anim_core::{
    classify_rest_pose, location_data_path, offsets_for_skeleton, shoulder_wrist_drop, Action,
    Config, OffsetTable, RecomputeHandles, RestPose, RestSkeleton,
};

use crate::cli::{ApplyArgs, OffsetSource, ShiftArgs};

/// Result of a command: text for stdout or the `--output` file.
#[derive(Debug)]
pub struct Output {
    pub text: String,
    pub path: Option<std::path::PathBuf>,
}

impl Output {
    fn new(text: String, path: Option<&Path>) -> Self {
        Self {
            text,
            path: path.map(Path::to_path_buf),
        }
    }

    pub fn emit(self) -> Result<()> {
        match self.path {
            Some(path) => fs::write(&path, self.text)
                .with_context(|| format!("failed to write {}", path.display())),
            None => {
                println!("{}", self.text);
                Ok(())
            }
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_json_str(&read(path)?)
            .with_context(|| format!("invalid config {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn load_action(path: &Path) -> Result<Action> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Action::from_json_str(&read(path)?)
        .with_context(|| format!("invalid action {}", path.display()))?
        .with_name(name))
}

fn load_skeleton(path: &Path) -> Result<RestSkeleton> {
    RestSkeleton::from_json_str(&read(path)?)
        .with_context(|| format!("invalid rest skeleton {}", path.display()))
}

fn resolve_offsets(source: &OffsetSource, config: &Config) -> Result<OffsetTable> {
    if let Some(path) = &source.offsets {
        return OffsetTable::from_json_str_with_config(&read(path)?, config)
            .with_context(|| format!("invalid offset table {}", path.display()));
    }
    if let Some(preset) = source.preset {
        return Ok(OffsetTable::preset(preset.into()));
    }
    if let Some(path) = &source.skeleton {
        return Ok(offsets_for_skeleton(&load_skeleton(path)?, config)?);
    }
    anyhow::bail!("no offset source given")
}

pub fn apply(args: &ApplyArgs, config: &Config) -> Result<Output> {
    let mut action = load_action(&args.action)?;
    let mut offsets = resolve_offsets(&args.source, config)?;
    if args.invert {
        offsets = offsets.inverted();
    }
    let report = action
        .apply_offsets(&offsets, config, &mut RecomputeHandles)
        .with_context(|| format!("cannot apply offsets to action '{}'", action.name))?;
    log::info!(
        "updated {} bones ({} keyframes) in '{}'",
        report.bones.len(),
        report.samples,
        action.name
    );
    Ok(Output::new(action.to_json_string()?, args.output.as_deref()))
}

pub fn detect_pose(skeleton: &Path, config: &Config) -> Result<Output> {
    let skeleton = load_skeleton(skeleton)?;
    let drop = shoulder_wrist_drop(&skeleton, config)?;
    let label = match classify_rest_pose(&skeleton, config)? {
        RestPose::T => "T-pose",
        RestPose::A => "A-pose",
    };
    Ok(Output::new(
        format!("{label} (shoulder-wrist drop {drop:.4}, threshold {})", config.pose_threshold),
        None,
    ))
}

pub fn shift(args: &ShiftArgs) -> Result<Output> {
    let mut action = load_action(&args.action)?;
    let data_path = args
        .data_path
        .clone()
        .unwrap_or_else(|| location_data_path(&args.bone));
    action.shift_values(&data_path, args.index, args.delta)?;
    Ok(Output::new(action.to_json_string()?, args.output.as_deref()))
}

pub fn preset(preset: yallah_anim_core::Preset) -> Result<Output> {
    Ok(Output::new(OffsetTable::preset(preset).to_json_string()?, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PresetArg;
    use yallah_anim_core::{Error, Preset};
    use yallah_test_fixtures::{actions, offsets, skeletons};

    fn source(
        offsets: Option<std::path::PathBuf>,
        preset: Option<PresetArg>,
        skeleton: Option<std::path::PathBuf>,
    ) -> OffsetSource {
        OffsetSource {
            offsets,
            preset,
            skeleton,
        }
    }

    fn apply_args(source: OffsetSource, invert: bool) -> ApplyArgs {
        ApplyArgs {
            action: actions::path("walk-cycle").unwrap(),
            source,
            invert,
            output: None,
        }
    }

    #[test]
    fn skeleton_source_picks_detected_preset() {
        let cfg = Config::default();
        let src = source(None, None, Some(skeletons::path("female-a-pose").unwrap()));
        assert_eq!(
            resolve_offsets(&src, &cfg).unwrap(),
            OffsetTable::preset(Preset::APose)
        );
        let src = source(offsets::path("mixamo-t-pose").ok(), None, None);
        assert_eq!(resolve_offsets(&src, &cfg).unwrap().len(), 6);
    }

    #[test]
    fn apply_then_invert_restores_action() {
        let cfg = Config::default();
        let original = load_action(&actions::path("walk-cycle").unwrap()).unwrap();

        let out = apply(&apply_args(source(None, Some(PresetArg::TPose), None), false), &cfg).unwrap();
        assert!(out.path.is_none());
        let applied = Action::from_json_str(&out.text).unwrap();
        assert_ne!(applied.curves, original.curves);

        let offsets = OffsetTable::preset(Preset::TPose).inverted();
        let mut restored = applied.clone();
        restored
            .apply_offsets(&offsets, &cfg, &mut RecomputeHandles)
            .unwrap();
        let (a, b) = (restored.rotation_channels(), original.rotation_channels());
        for (bone, ch) in &b {
            for i in 0..ch.w.len() {
                assert!(a[bone].sample(i).abs_diff_eq(ch.sample(i), 1e-6), "bone {bone}");
            }
        }
    }

    #[test]
    fn apply_surfaces_core_error() {
        let cfg = Config::default();
        let mut args = apply_args(source(None, Some(PresetArg::APose), None), false);
        args.action = actions::path("walk-cycle-unaligned").unwrap();
        let err = apply(&args, &cfg).unwrap_err();
        let core = err.downcast_ref::<Error>().expect("core error kept in chain");
        assert!(matches!(core, Error::UnalignedCurve { bone, .. } if bone == "lowerarm_L"));
    }

    #[test]
    fn detect_pose_reports_label() {
        let out = detect_pose(&skeletons::path("female-t-pose").unwrap(), &Config::default()).unwrap();
        assert!(out.text.starts_with("T-pose"));
    }

    #[test]
    fn preset_prints_reloadable_json() {
        let out = preset(Preset::TPoseTwist).unwrap();
        let table = OffsetTable::from_json_str(&out.text).unwrap();
        assert_eq!(table.len(), 10);
    }
}
