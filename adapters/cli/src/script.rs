//! Scripted frame input for headless runs.

use std::str::FromStr;

use outbreak_core::FrameInput;
use thiserror::Error;

/// Input held for a number of frames.
///
/// Parsed from `keys:frames`, where `keys` joins `up`, `down`, `left`,
/// `right`, `infect`, `rally` and `pause` with `+`, or is `idle`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct InputSegment {
    pub(crate) input: FrameInput,
    pub(crate) frames: u64,
}

/// Reasons an input segment may be rejected.
#[derive(Debug, PartialEq, Eq, Error)]
pub(crate) enum ScriptError {
    /// The segment lacks the `:frames` suffix.
    #[error("segment '{0}' must look like keys:frames")]
    MissingFrames(String),
    /// The frame count is not a number.
    #[error("could not parse frame count '{0}'")]
    InvalidFrames(String),
    /// A key name is unknown.
    #[error("unknown key '{0}'")]
    UnknownKey(String),
}

impl FromStr for InputSegment {
    type Err = ScriptError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (keys, frames) = value
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| ScriptError::MissingFrames(value.to_owned()))?;
        let frames = frames
            .trim()
            .parse::<u64>()
            .map_err(|_| ScriptError::InvalidFrames(frames.to_owned()))?;

        let mut input = FrameInput::default();
        for key in keys.split('+').map(str::trim) {
            let flag = match key {
                "idle" => continue,
                "up" => &mut input.up,
                "down" => &mut input.down,
                "left" => &mut input.left,
                "right" => &mut input.right,
                "infect" => &mut input.infect,
                "rally" => &mut input.rally,
                "pause" => &mut input.pause,
                other => return Err(ScriptError::UnknownKey(other.to_owned())),
            };
            *flag = true;
        }

        Ok(Self { input, frames })
    }
}

/// Expands segments into one input per frame, idling once the script ends.
pub(crate) fn frames(segments: &[InputSegment]) -> impl Iterator<Item = FrameInput> + '_ {
    segments
        .iter()
        .flat_map(|segment| (0..segment.frames).map(move |_| segment.input))
        .chain(std::iter::repeat_with(FrameInput::default))
}
