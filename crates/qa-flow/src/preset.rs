use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::animation::Direction;

/// Animatable channels of a step container. A `None` channel is not driven
/// by the preset and stays at its resting value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelBundle {
    pub opacity: Option<f32>,
    pub offset_x: Option<f32>,
    pub offset_y: Option<f32>,
    pub scale: Option<f32>,
}

impl ChannelBundle {
    pub fn opacity(mut self, value: f32) -> Self {
        self.opacity = Some(value);
        self
    }

    pub fn offset_x(mut self, value: f32) -> Self {
        self.offset_x = Some(value);
        self
    }

    pub fn offset_y(mut self, value: f32) -> Self {
        self.offset_y = Some(value);
        self
    }

    pub fn scale(mut self, value: f32) -> Self {
        self.scale = Some(value);
        self
    }

    /// Linear blend between two bundles; `progress` is clamped to `0..=1`.
    pub fn lerp(&self, to: &ChannelBundle, progress: f32) -> ChannelBundle {
        let progress = progress.clamp(0.0, 1.0);
        let blend = |from: Option<f32>, to: Option<f32>, rest: f32| match (from, to) {
            (None, None) => None,
            (from, to) => {
                let from = from.unwrap_or(rest);
                let to = to.unwrap_or(rest);
                Some(from + (to - from) * progress)
            }
        };
        ChannelBundle {
            opacity: blend(self.opacity, to.opacity, 1.0),
            offset_x: blend(self.offset_x, to.offset_x, 0.0),
            offset_y: blend(self.offset_y, to.offset_y, 0.0),
            scale: blend(self.scale, to.scale, 1.0),
        }
    }
}

/// Render-time transform handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub opacity: f32,
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        opacity: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
    };
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

/// Named enter/exit behaviour over a channel set.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationPreset {
    None,
    #[default]
    Fade,
    SlideHorizontal,
    SlideVertical,
    FadeSlide,
    Scale,
}

impl AnimationPreset {
    pub const ALL: [AnimationPreset; 6] = [
        AnimationPreset::None,
        AnimationPreset::Fade,
        AnimationPreset::SlideHorizontal,
        AnimationPreset::SlideVertical,
        AnimationPreset::FadeSlide,
        AnimationPreset::Scale,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            AnimationPreset::None => "none",
            AnimationPreset::Fade => "fade",
            AnimationPreset::SlideHorizontal => "slide-horizontal",
            AnimationPreset::SlideVertical => "slide-vertical",
            AnimationPreset::FadeSlide => "fade-slide",
            AnimationPreset::Scale => "scale",
        }
    }

    /// Starting channels for an entering step. Forward entries come from the
    /// positive side, backward entries from the negative side.
    pub fn initialize(&self, direction: Direction, offset: f32) -> ChannelBundle {
        let from = direction.sign() * offset;
        match self {
            AnimationPreset::None => ChannelBundle::default(),
            AnimationPreset::Fade => ChannelBundle::default().opacity(0.0),
            AnimationPreset::SlideHorizontal => ChannelBundle::default().offset_x(from),
            AnimationPreset::SlideVertical => ChannelBundle::default().offset_y(from),
            AnimationPreset::FadeSlide => ChannelBundle::default().opacity(0.0).offset_x(from),
            AnimationPreset::Scale => ChannelBundle::default()
                .opacity(0.0)
                .scale(1.0 - direction.sign() * 0.08),
        }
    }

    /// Visible resting state for the channels the bundle drives.
    pub fn enter(&self, bundle: &ChannelBundle) -> ChannelBundle {
        ChannelBundle {
            opacity: bundle.opacity.map(|_| 1.0),
            offset_x: bundle.offset_x.map(|_| 0.0),
            offset_y: bundle.offset_y.map(|_| 0.0),
            scale: bundle.scale.map(|_| 1.0),
        }
    }

    /// Hidden state for a leaving step; it leaves towards the side opposite
    /// to where the next step enters from.
    pub fn exit(&self, bundle: &ChannelBundle, direction: Direction, offset: f32) -> ChannelBundle {
        let to = -direction.sign() * offset;
        match self {
            AnimationPreset::None => *bundle,
            AnimationPreset::Fade => ChannelBundle {
                opacity: Some(0.0),
                ..*bundle
            },
            AnimationPreset::SlideHorizontal => ChannelBundle {
                offset_x: Some(to),
                ..*bundle
            },
            AnimationPreset::SlideVertical => ChannelBundle {
                offset_y: Some(to),
                ..*bundle
            },
            AnimationPreset::FadeSlide => ChannelBundle {
                opacity: Some(0.0),
                offset_x: Some(to),
                ..*bundle
            },
            AnimationPreset::Scale => ChannelBundle {
                opacity: Some(0.0),
                scale: Some(1.0 + direction.sign() * 0.08),
                ..*bundle
            },
        }
    }

    /// Resting channels of a fully visible step.
    pub fn resting(&self, direction: Direction, offset: f32) -> ChannelBundle {
        self.enter(&self.initialize(direction, offset))
    }

    pub fn project(&self, bundle: &ChannelBundle) -> Transform {
        if matches!(self, AnimationPreset::None) {
            return Transform::IDENTITY;
        }
        Transform {
            opacity: bundle.opacity.unwrap_or(1.0).clamp(0.0, 1.0),
            translate_x: bundle.offset_x.unwrap_or(0.0),
            translate_y: bundle.offset_y.unwrap_or(0.0),
            scale: bundle.scale.unwrap_or(1.0),
        }
    }
}

impl fmt::Display for AnimationPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AnimationPreset {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        AnimationPreset::ALL
            .into_iter()
            .find(|preset| preset.id() == normalized)
            .ok_or_else(|| {
                let known = AnimationPreset::ALL
                    .iter()
                    .map(AnimationPreset::id)
                    .collect::<Vec<_>>();
                format!("unknown preset '{}'; expected one of {}", raw, known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_flips_entry_side() {
        let preset = AnimationPreset::SlideHorizontal;
        let forward = preset.initialize(Direction::Forward, 24.0);
        let backward = preset.initialize(Direction::Backward, 24.0);
        assert_eq!(forward.offset_x, Some(24.0));
        assert_eq!(backward.offset_x, Some(-24.0));
    }

    #[test]
    fn exit_leaves_opposite_to_entry() {
        let preset = AnimationPreset::FadeSlide;
        let resting = preset.resting(Direction::Forward, 10.0);
        let hidden = preset.exit(&resting, Direction::Forward, 10.0);
        assert_eq!(hidden.opacity, Some(0.0));
        assert_eq!(hidden.offset_x, Some(-10.0));
    }

    #[test]
    fn enter_drives_only_declared_channels() {
        let bundle = AnimationPreset::Fade.initialize(Direction::Forward, 24.0);
        let rest = AnimationPreset::Fade.enter(&bundle);
        assert_eq!(rest, ChannelBundle::default().opacity(1.0));
        assert_eq!(AnimationPreset::Fade.project(&rest), Transform::IDENTITY);
    }

    #[test]
    fn lerp_fills_missing_channels_with_rest_values() {
        let from = ChannelBundle::default().opacity(0.0);
        let to = ChannelBundle::default().offset_x(20.0);
        let mid = from.lerp(&to, 0.5);
        assert_eq!(mid.opacity, Some(0.5));
        assert_eq!(mid.offset_x, Some(10.0));
        assert_eq!(mid.scale, None);
    }

    #[test]
    fn presets_parse_by_id() {
        assert_eq!(
            "slide_horizontal".parse::<AnimationPreset>(),
            Ok(AnimationPreset::SlideHorizontal)
        );
        assert_eq!("Scale".parse::<AnimationPreset>(), Ok(AnimationPreset::Scale));
        assert!("wobble".parse::<AnimationPreset>().is_err());
    }

    #[test]
    fn serde_names_match_ids() {
        for preset in AnimationPreset::ALL {
            let encoded = serde_json::to_value(preset).expect("serialize");
            assert_eq!(encoded, serde_json::Value::String(preset.id().to_string()));
        }
    }
}
