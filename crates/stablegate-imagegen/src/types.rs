use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use stablegate_config::GenerationDefaults;

use crate::error::GenerationError;

/// Kind of generation requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationType {
    /// Generate from noise guided by text prompts
    #[default]
    TextToImage,
    /// Transform an init image
    ImageToImage,
    /// Repaint the masked area of an init image
    ImageToImageMasking,
}

/// A text prompt with an optional weight (negative values steer away)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TextPrompt {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
}

impl TextPrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            weight: None,
        }
    }

    #[must_use]
    pub const fn with_weight(mut self, weight: f32) -> Self {
        self.weight = Some(weight);
        self
    }
}

/// Diffusion sampling algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Sampler {
    Ddim,
    Ddpm,
    KEuler,
    KEulerAncestral,
    KHeun,
    KDpm2,
    KDpm2Ancestral,
    KLms,
    KDpmpp2sAncestral,
    KDpmpp2m,
    KDpmppSde,
}

impl Sampler {
    pub const ALL: [Self; 11] = [
        Self::Ddim,
        Self::Ddpm,
        Self::KEuler,
        Self::KEulerAncestral,
        Self::KHeun,
        Self::KDpm2,
        Self::KDpm2Ancestral,
        Self::KLms,
        Self::KDpmpp2sAncestral,
        Self::KDpmpp2m,
        Self::KDpmppSde,
    ];

    /// Name used in configuration and JSON bodies
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ddim => "ddim",
            Self::Ddpm => "ddpm",
            Self::KEuler => "k_euler",
            Self::KEulerAncestral => "k_euler_ancestral",
            Self::KHeun => "k_heun",
            Self::KDpm2 => "k_dpm_2",
            Self::KDpm2Ancestral => "k_dpm_2_ancestral",
            Self::KLms => "k_lms",
            Self::KDpmpp2sAncestral => "k_dpmpp_2s_ancestral",
            Self::KDpmpp2m => "k_dpmpp_2m",
            Self::KDpmppSde => "k_dpmpp_sde",
        }
    }

    /// Whether CLIP guidance can be used with this sampler
    pub const fn is_ancestral(self) -> bool {
        matches!(
            self,
            Self::KEulerAncestral | Self::KDpm2Ancestral | Self::KDpmpp2sAncestral
        )
    }
}

impl fmt::Display for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Sampler {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sampler| sampler.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown sampler '{s}'"))
    }
}

impl TryFrom<String> for Sampler {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Sampler> for String {
    fn from(sampler: Sampler) -> Self {
        sampler.name().to_string()
    }
}

/// CLIP guidance preset
///
/// Only meaningful with ancestral samplers (or with no sampler, letting the
/// service pick one). The pairing is not checked here; the remote service
/// owns the compatibility rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipGuidancePreset {
    Simple,
    #[default]
    FastBlue,
    FastGreen,
    Slow,
    Slower,
    Slowest,
}

/// Caller-facing generation parameters
///
/// Numeric fields left as `None` (or zero) fall back to the remote service's defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerationParameters {
    #[serde(default)]
    pub generation_type: GenerationType,
    pub prompts: Vec<TextPrompt>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub samples: Option<u64>,
    pub steps: Option<u64>,
    pub seed: Option<u32>,
    pub cfg_scale: Option<f32>,
    pub sampler: Option<Sampler>,
    pub clip_guidance_preset: Option<ClipGuidancePreset>,
    #[serde(default, deserialize_with = "base64_bytes::deserialize")]
    pub init_image: Option<Vec<u8>>,
    #[serde(default, deserialize_with = "base64_bytes::deserialize")]
    pub mask_image: Option<Vec<u8>>,
    pub step_schedule_start: Option<f32>,
    pub step_schedule_end: Option<f32>,
}

impl GenerationParameters {
    /// Text-to-image parameters for a single unweighted prompt
    pub fn text_to_image(prompt: impl Into<String>) -> Self {
        Self {
            prompts: vec![TextPrompt::new(prompt)],
            ..Self::default()
        }
    }
}

/// Image parameters applied to prompt-only requests
#[derive(Debug, Clone, PartialEq)]
pub struct PromptDefaults {
    pub width: u64,
    pub height: u64,
    pub samples: u64,
    pub cfg_scale: f32,
    pub steps: u64,
    pub sampler: Option<Sampler>,
}

impl PromptDefaults {
    /// Expand a bare prompt into full text-to-image parameters
    pub fn apply(&self, prompt: &str) -> GenerationParameters {
        GenerationParameters {
            width: Some(self.width),
            height: Some(self.height),
            samples: Some(self.samples),
            cfg_scale: Some(self.cfg_scale),
            steps: Some(self.steps),
            sampler: self.sampler,
            ..GenerationParameters::text_to_image(prompt)
        }
    }
}

impl Default for PromptDefaults {
    fn default() -> Self {
        Self {
            width: 768,
            height: 768,
            samples: 1,
            cfg_scale: 13.0,
            steps: 30,
            sampler: Some(Sampler::KDpmpp2m),
        }
    }
}

impl TryFrom<&GenerationDefaults> for PromptDefaults {
    type Error = GenerationError;

    fn try_from(defaults: &GenerationDefaults) -> Result<Self, Self::Error> {
        let sampler = defaults
            .sampler
            .as_deref()
            .map(str::parse::<Sampler>)
            .transpose()
            .map_err(GenerationError::Config)?;

        Ok(Self {
            width: defaults.width,
            height: defaults.height,
            samples: defaults.samples,
            cfg_scale: defaults.cfg_scale,
            steps: defaults.steps,
            sampler,
        })
    }
}

/// Kind of an artifact exchanged with the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Image,
    Mask,
    /// Any other artifact type (text, latent, embedding, ...)
    Other,
}

/// Outcome tag attached to a generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Success,
    /// Rejected by the remote content classifier
    Filtered,
    Other,
}

/// One artifact from the response stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub binary: Vec<u8>,
    pub kind: ArtifactKind,
    pub finish_reason: FinishReason,
    pub seed: u32,
}

impl Artifact {
    /// A successfully generated image
    pub const fn image(binary: Vec<u8>, seed: u32) -> Self {
        Self {
            binary,
            kind: ArtifactKind::Image,
            finish_reason: FinishReason::Success,
            seed,
        }
    }

    /// An image withheld by the content classifier
    pub const fn filtered(binary: Vec<u8>, seed: u32) -> Self {
        Self {
            binary,
            kind: ArtifactKind::Image,
            finish_reason: FinishReason::Filtered,
            seed,
        }
    }
}

/// One message from the response stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamedAnswer {
    pub artifacts: Vec<Artifact>,
}

impl StreamedAnswer {
    pub const fn new(artifacts: Vec<Artifact>) -> Self {
        Self { artifacts }
    }
}

/// Body of the prompt-only route
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptRequest {
    pub prompt: String,
}

/// Response of the prompt-only route
///
/// `photo` is absent when every artifact was filtered
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PromptResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| STANDARD.decode(encoded.trim()).map_err(serde::de::Error::custom))
            .transpose()
    }
}
