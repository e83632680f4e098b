use crate::error::{GenerationError, Result};
use crate::types::{ArtifactKind, ClipGuidancePreset, GenerationParameters, GenerationType, Sampler, TextPrompt};

/// Schedule start used for masked repaints
const MASKING_SCHEDULE_START: f32 = 1.0;

/// Protocol-level request, built once per call and never mutated
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRequest {
    pub engine_id: String,
    pub requested_type: ArtifactKind,
    pub classifier: ClassifierParameters,
    pub image: ImageParameters,
    pub prompts: Vec<Prompt>,
}

/// Content classifier tuning; always present and empty for now
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifierParameters;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageParameters {
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub samples: Option<u64>,
    pub steps: Option<u64>,
    pub seeds: Vec<u32>,
    pub sampler: Option<Sampler>,
    pub step: StepParameters,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepParameters {
    pub sampler: SamplerParameters,
    pub schedule: ScheduleParameters,
    pub guidance: Option<GuidanceParameters>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplerParameters {
    pub cfg_scale: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleParameters {
    pub start: Option<f32>,
    pub end: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuidanceParameters {
    pub preset: ClipGuidancePreset,
}

/// One entry of the prompt list
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    Text {
        text: String,
        weight: Option<f32>,
    },
    Artifact {
        binary: Vec<u8>,
        kind: ArtifactKind,
        init: Option<bool>,
    },
}

impl From<&TextPrompt> for Prompt {
    fn from(prompt: &TextPrompt) -> Self {
        Self::Text {
            text: prompt.text.clone(),
            weight: prompt.weight,
        }
    }
}

impl Prompt {
    fn init_image(binary: &[u8]) -> Self {
        Self::Artifact {
            binary: binary.to_vec(),
            kind: ArtifactKind::Image,
            init: Some(true),
        }
    }

    fn mask_image(binary: &[u8]) -> Self {
        Self::Artifact {
            binary: binary.to_vec(),
            kind: ArtifactKind::Mask,
            init: None,
        }
    }
}

/// Build the protocol request for one generation call
///
/// # Errors
///
/// Returns [`GenerationError::Validation`] when there are no prompts, when an
/// image-to-image variant is missing its images, or when image-to-image has
/// no schedule start.
pub fn build_request(engine_id: &str, params: &GenerationParameters) -> Result<StructuredRequest> {
    if params.prompts.is_empty() {
        return Err(GenerationError::validation("at least one prompt is required"));
    }

    let mut image = ImageParameters {
        width: non_zero(params.width),
        height: non_zero(params.height),
        samples: non_zero(params.samples),
        steps: non_zero(params.steps),
        sampler: params.sampler,
        ..ImageParameters::default()
    };

    if let Some(seed) = params.seed.filter(|seed| *seed != 0) {
        image.seeds.push(seed);
    }

    image.step.sampler.cfg_scale = params.cfg_scale.filter(|scale| *scale != 0.0);
    image.step.guidance = params
        .clip_guidance_preset
        .map(|preset| GuidanceParameters { preset });

    let mut prompts: Vec<Prompt> = params.prompts.iter().map(Prompt::from).collect();

    match params.generation_type {
        GenerationType::TextToImage => {}
        GenerationType::ImageToImage => {
            let start = params
                .step_schedule_start
                .ok_or_else(|| GenerationError::validation("image-to-image requires stepScheduleStart"))?;
            let init = required_image(params.init_image.as_deref(), "image-to-image requires initImage")?;

            image.step.schedule = ScheduleParameters {
                start: Some(start),
                end: params.step_schedule_end,
            };
            prompts.push(Prompt::init_image(init));
        }
        GenerationType::ImageToImageMasking => {
            let init = required_image(
                params.init_image.as_deref(),
                "image-to-image-masking requires initImage",
            )?;
            let mask = required_image(
                params.mask_image.as_deref(),
                "image-to-image-masking requires maskImage",
            )?;

            image.step.schedule.start = Some(MASKING_SCHEDULE_START);
            prompts.push(Prompt::init_image(init));
            prompts.push(Prompt::mask_image(mask));
        }
    }

    Ok(StructuredRequest {
        engine_id: engine_id.to_string(),
        requested_type: ArtifactKind::Image,
        classifier: ClassifierParameters,
        image,
        prompts,
    })
}

fn non_zero(value: Option<u64>) -> Option<u64> {
    value.filter(|v| *v != 0)
}

fn required_image<'a>(image: Option<&'a [u8]>, message: &str) -> Result<&'a [u8]> {
    image
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| GenerationError::validation(message))
}
