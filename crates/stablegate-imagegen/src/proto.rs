//! Wire messages for the `gooseai.GenerationService` streaming API
//!
//! Only the fields this adapter reads or writes are declared; unknown fields
//! in responses are skipped by the decoder.
#![allow(clippy::derive_partial_eq_without_eq)]

use crate::request::{Prompt as RequestPrompt, StepParameters, StructuredRequest};
use crate::types::{self, ArtifactKind, ClipGuidancePreset, Sampler, StreamedAnswer};

/// Fully qualified path of the server-streaming generate method
pub const GENERATE_PATH: &str = "/gooseai.GenerationService/Generate";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ArtifactType {
    None = 0,
    Image = 1,
    Video = 2,
    Text = 3,
    Tokens = 4,
    Embedding = 5,
    Classifications = 6,
    Mask = 7,
    Latent = 8,
    Tensor = 9,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum FinishReason {
    Null = 0,
    Length = 1,
    Stop = 2,
    Error = 3,
    Filter = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum DiffusionSampler {
    Ddim = 0,
    Ddpm = 1,
    KEuler = 2,
    KEulerAncestral = 3,
    KHeun = 4,
    KDpm2 = 5,
    KDpm2Ancestral = 6,
    KLms = 7,
    KDpmpp2sAncestral = 8,
    KDpmpp2m = 9,
    KDpmppSde = 10,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum GuidancePreset {
    None = 0,
    Simple = 1,
    FastBlue = 2,
    FastGreen = 3,
    Slow = 4,
    Slower = 5,
    Slowest = 6,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Artifact {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(enumeration = "ArtifactType", tag = "2")]
    pub r#type: i32,
    #[prost(string, tag = "3")]
    pub mime: String,
    #[prost(string, optional, tag = "4")]
    pub magic: Option<String>,
    #[prost(oneof = "artifact::Data", tags = "5, 6")]
    pub data: Option<artifact::Data>,
    #[prost(uint32, tag = "8")]
    pub index: u32,
    #[prost(enumeration = "FinishReason", tag = "9")]
    pub finish_reason: i32,
    #[prost(uint32, tag = "10")]
    pub seed: u32,
    #[prost(string, tag = "12")]
    pub uuid: String,
    #[prost(uint64, tag = "13")]
    pub size: u64,
}

pub mod artifact {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Data {
        #[prost(bytes = "vec", tag = "5")]
        Binary(Vec<u8>),
        #[prost(string, tag = "6")]
        Text(String),
    }
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct PromptParameters {
    #[prost(bool, optional, tag = "1")]
    pub init: Option<bool>,
    #[prost(float, optional, tag = "2")]
    pub weight: Option<f32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Prompt {
    #[prost(message, optional, tag = "1")]
    pub parameters: Option<PromptParameters>,
    #[prost(oneof = "prompt::Prompt", tags = "2, 4")]
    pub prompt: Option<prompt::Prompt>,
}

pub mod prompt {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Prompt {
        #[prost(string, tag = "2")]
        Text(String),
        #[prost(message, tag = "4")]
        Artifact(super::Artifact),
    }
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct SamplerParameters {
    #[prost(float, optional, tag = "5")]
    pub cfg_scale: Option<f32>,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct ScheduleParameters {
    #[prost(float, optional, tag = "1")]
    pub start: Option<f32>,
    #[prost(float, optional, tag = "2")]
    pub end: Option<f32>,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct GuidanceParameters {
    #[prost(enumeration = "GuidancePreset", tag = "1")]
    pub guidance_preset: i32,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct StepParameter {
    #[prost(float, tag = "1")]
    pub scaled_step: f32,
    #[prost(message, optional, tag = "2")]
    pub sampler: Option<SamplerParameters>,
    #[prost(message, optional, tag = "3")]
    pub schedule: Option<ScheduleParameters>,
    #[prost(message, optional, tag = "4")]
    pub guidance: Option<GuidanceParameters>,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct TransformType {
    #[prost(oneof = "transform_type::Type", tags = "1")]
    pub r#type: Option<transform_type::Type>,
}

pub mod transform_type {
    #[derive(Clone, Copy, PartialEq, prost::Oneof)]
    pub enum Type {
        #[prost(enumeration = "super::DiffusionSampler", tag = "1")]
        Diffusion(i32),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ImageParameters {
    #[prost(uint64, optional, tag = "1")]
    pub height: Option<u64>,
    #[prost(uint64, optional, tag = "2")]
    pub width: Option<u64>,
    #[prost(uint32, repeated, tag = "3")]
    pub seed: Vec<u32>,
    #[prost(uint64, optional, tag = "4")]
    pub samples: Option<u64>,
    #[prost(uint64, optional, tag = "5")]
    pub steps: Option<u64>,
    #[prost(message, optional, tag = "6")]
    pub transform: Option<TransformType>,
    #[prost(message, repeated, tag = "7")]
    pub parameters: Vec<StepParameter>,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct ClassifierParameters {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Request {
    #[prost(string, tag = "1")]
    pub engine_id: String,
    #[prost(string, tag = "2")]
    pub request_id: String,
    #[prost(enumeration = "ArtifactType", tag = "3")]
    pub requested_type: i32,
    #[prost(message, repeated, tag = "4")]
    pub prompt: Vec<Prompt>,
    #[prost(oneof = "request::Params", tags = "5, 7")]
    pub params: Option<request::Params>,
}

pub mod request {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Params {
        #[prost(message, tag = "5")]
        Image(super::ImageParameters),
        #[prost(message, tag = "7")]
        Classifier(super::ClassifierParameters),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Answer {
    #[prost(string, tag = "1")]
    pub answer_id: String,
    #[prost(string, tag = "2")]
    pub request_id: String,
    #[prost(uint64, tag = "3")]
    pub received: u64,
    #[prost(uint64, tag = "4")]
    pub created: u64,
    #[prost(message, repeated, tag = "7")]
    pub artifacts: Vec<Artifact>,
}

impl From<ArtifactKind> for ArtifactType {
    fn from(kind: ArtifactKind) -> Self {
        match kind {
            ArtifactKind::Image => Self::Image,
            ArtifactKind::Mask => Self::Mask,
            ArtifactKind::Other => Self::None,
        }
    }
}

impl From<Sampler> for DiffusionSampler {
    fn from(sampler: Sampler) -> Self {
        match sampler {
            Sampler::Ddim => Self::Ddim,
            Sampler::Ddpm => Self::Ddpm,
            Sampler::KEuler => Self::KEuler,
            Sampler::KEulerAncestral => Self::KEulerAncestral,
            Sampler::KHeun => Self::KHeun,
            Sampler::KDpm2 => Self::KDpm2,
            Sampler::KDpm2Ancestral => Self::KDpm2Ancestral,
            Sampler::KLms => Self::KLms,
            Sampler::KDpmpp2sAncestral => Self::KDpmpp2sAncestral,
            Sampler::KDpmpp2m => Self::KDpmpp2m,
            Sampler::KDpmppSde => Self::KDpmppSde,
        }
    }
}

impl From<ClipGuidancePreset> for GuidancePreset {
    fn from(preset: ClipGuidancePreset) -> Self {
        match preset {
            ClipGuidancePreset::Simple => Self::Simple,
            ClipGuidancePreset::FastBlue => Self::FastBlue,
            ClipGuidancePreset::FastGreen => Self::FastGreen,
            ClipGuidancePreset::Slow => Self::Slow,
            ClipGuidancePreset::Slower => Self::Slower,
            ClipGuidancePreset::Slowest => Self::Slowest,
        }
    }
}

impl From<StepParameters> for StepParameter {
    fn from(step: StepParameters) -> Self {
        Self {
            scaled_step: 0.0,
            sampler: Some(SamplerParameters {
                cfg_scale: step.sampler.cfg_scale,
            }),
            schedule: Some(ScheduleParameters {
                start: step.schedule.start,
                end: step.schedule.end,
            }),
            guidance: step.guidance.map(|guidance| GuidanceParameters {
                guidance_preset: GuidancePreset::from(guidance.preset).into(),
            }),
        }
    }
}

impl From<RequestPrompt> for Prompt {
    fn from(prompt: RequestPrompt) -> Self {
        match prompt {
            RequestPrompt::Text { text, weight } => Self {
                parameters: weight.map(|weight| PromptParameters {
                    init: None,
                    weight: Some(weight),
                }),
                prompt: Some(prompt::Prompt::Text(text)),
            },
            RequestPrompt::Artifact { binary, kind, init } => Self {
                parameters: init.map(|init| PromptParameters {
                    init: Some(init),
                    weight: None,
                }),
                prompt: Some(prompt::Prompt::Artifact(Artifact {
                    r#type: ArtifactType::from(kind).into(),
                    data: Some(artifact::Data::Binary(binary)),
                    ..Artifact::default()
                })),
            },
        }
    }
}

/// The classifier parameters stay on the structured request: `params` is a
/// oneof on the wire, and the image parameters occupy it.
impl From<StructuredRequest> for Request {
    fn from(request: StructuredRequest) -> Self {
        let image = request.image;

        let params = ImageParameters {
            height: image.height,
            width: image.width,
            seed: image.seeds,
            samples: image.samples,
            steps: image.steps,
            transform: image.sampler.map(|sampler| TransformType {
                r#type: Some(transform_type::Type::Diffusion(
                    DiffusionSampler::from(sampler).into(),
                )),
            }),
            parameters: vec![image.step.into()],
        };

        Self {
            engine_id: request.engine_id,
            request_id: String::new(),
            requested_type: ArtifactType::from(request.requested_type).into(),
            prompt: request.prompts.into_iter().map(Prompt::from).collect(),
            params: Some(request::Params::Image(params)),
        }
    }
}

impl From<Artifact> for types::Artifact {
    fn from(artifact: Artifact) -> Self {
        let kind = match ArtifactType::try_from(artifact.r#type) {
            Ok(ArtifactType::Image) => ArtifactKind::Image,
            Ok(ArtifactType::Mask) => ArtifactKind::Mask,
            _ => ArtifactKind::Other,
        };

        let finish_reason = match FinishReason::try_from(artifact.finish_reason) {
            Ok(FinishReason::Filter) => types::FinishReason::Filtered,
            Ok(FinishReason::Null | FinishReason::Stop) => types::FinishReason::Success,
            _ => types::FinishReason::Other,
        };

        let binary = match artifact.data {
            Some(artifact::Data::Binary(binary)) => binary,
            _ => Vec::new(),
        };

        Self {
            binary,
            kind,
            finish_reason,
            seed: artifact.seed,
        }
    }
}

impl From<Answer> for StreamedAnswer {
    fn from(answer: Answer) -> Self {
        Self::new(answer.artifacts.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::*;
    use crate::request::build_request;
    use crate::types::{GenerationParameters, GenerationType, TextPrompt};

    fn wire_request(params: &GenerationParameters) -> Request {
        build_request("stable-diffusion-768-v2-1", params).unwrap().into()
    }

    fn image_params(request: &Request) -> &ImageParameters {
        match request.params.as_ref() {
            Some(request::Params::Image(image)) => image,
            other => panic!("expected image params, got {other:?}"),
        }
    }

    fn image_artifact(finish_reason: FinishReason, binary: &[u8]) -> Artifact {
        Artifact {
            r#type: ArtifactType::Image.into(),
            finish_reason: finish_reason.into(),
            data: Some(artifact::Data::Binary(binary.to_vec())),
            seed: 42,
            ..Artifact::default()
        }
    }

    #[test]
    fn text_to_image_request_fields() {
        let params = GenerationParameters {
            width: Some(768),
            height: Some(768),
            samples: Some(1),
            steps: Some(30),
            cfg_scale: Some(13.0),
            sampler: Some(Sampler::KDpmpp2m),
            prompts: vec![TextPrompt::new("a cat"), TextPrompt::new("dark").with_weight(-0.8)],
            ..GenerationParameters::default()
        };

        let request = wire_request(&params);
        assert_eq!(request.engine_id, "stable-diffusion-768-v2-1");
        assert_eq!(request.requested_type, i32::from(ArtifactType::Image));

        let image = image_params(&request);
        assert_eq!(image.width, Some(768));
        assert_eq!(image.height, Some(768));
        assert_eq!(image.steps, Some(30));
        assert_eq!(
            image.transform.and_then(|t| t.r#type),
            Some(transform_type::Type::Diffusion(9))
        );

        let step = image.parameters[0];
        assert_eq!(step.sampler.and_then(|s| s.cfg_scale), Some(13.0));
        assert_eq!(step.schedule, Some(ScheduleParameters::default()));
        assert!(step.guidance.is_none());

        assert!(request.prompt[0].parameters.is_none());
        assert_eq!(
            request.prompt[0].prompt,
            Some(prompt::Prompt::Text("a cat".into()))
        );
        assert_eq!(
            request.prompt[1].parameters,
            Some(PromptParameters {
                init: None,
                weight: Some(-0.8)
            })
        );
    }

    #[test]
    fn masking_request_carries_init_and_mask_artifacts() {
        let params = GenerationParameters {
            generation_type: GenerationType::ImageToImageMasking,
            prompts: vec![TextPrompt::new("a red door")],
            init_image: Some(vec![1, 1]),
            mask_image: Some(vec![2, 2]),
            clip_guidance_preset: Some(ClipGuidancePreset::Slow),
            ..GenerationParameters::default()
        };

        let request = wire_request(&params);
        let step = image_params(&request).parameters[0];
        assert_eq!(step.schedule.and_then(|s| s.start), Some(1.0));
        assert_eq!(
            step.guidance.map(|g| g.guidance_preset),
            Some(i32::from(GuidancePreset::Slow))
        );

        let init = &request.prompt[1];
        assert_eq!(init.parameters.and_then(|p| p.init), Some(true));
        let Some(prompt::Prompt::Artifact(init_artifact)) = &init.prompt else {
            panic!("expected init artifact prompt");
        };
        assert_eq!(init_artifact.r#type, i32::from(ArtifactType::Image));
        assert_eq!(init_artifact.data, Some(artifact::Data::Binary(vec![1, 1])));

        let mask = &request.prompt[2];
        assert!(mask.parameters.is_none());
        let Some(prompt::Prompt::Artifact(mask_artifact)) = &mask.prompt else {
            panic!("expected mask artifact prompt");
        };
        assert_eq!(mask_artifact.r#type, i32::from(ArtifactType::Mask));
    }

    #[test]
    fn encoded_request_uses_image_params_slot() {
        let request = wire_request(&GenerationParameters::text_to_image("a cat"));
        let decoded = Request::decode(request.encode_to_vec().as_slice()).unwrap();
        assert!(matches!(decoded.params, Some(request::Params::Image(_))));
        assert_eq!(decoded.prompt.len(), 1);
    }

    #[test]
    fn zero_weight_reaches_the_wire() {
        let params = GenerationParameters {
            prompts: vec![TextPrompt::new("x").with_weight(0.0)],
            ..GenerationParameters::default()
        };

        let request = wire_request(&params);
        assert_eq!(
            request.prompt[0].parameters,
            Some(PromptParameters {
                init: None,
                weight: Some(0.0)
            })
        );

        let decoded = Request::decode(request.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.prompt[0].parameters.and_then(|p| p.weight), Some(0.0));
    }

    #[test]
    fn decoded_answer_keeps_artifact_fields() {
        let answer = Answer {
            artifacts: vec![
                image_artifact(FinishReason::Stop, &[0x89, 0x50]),
                image_artifact(FinishReason::Filter, &[0x00]),
            ],
            ..Answer::default()
        };

        let decoded = Answer::decode(answer.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, answer);

        let streamed = StreamedAnswer::from(decoded);
        assert_eq!(streamed.artifacts[0], types::Artifact::image(vec![0x89, 0x50], 42));
        assert_eq!(streamed.artifacts[1], types::Artifact::filtered(vec![0x00], 42));
    }

    #[test]
    fn answer_decodes_from_service_bytes() {
        // artifacts (7) holding type (2) = IMAGE, binary (5), finish_reason (9) = FILTER, seed (10) = 42
        let bytes = [
            0x3a, 0x09, 0x10, 0x01, 0x2a, 0x01, 0xab, 0x48, 0x04, 0x50, 0x2a,
        ];

        let streamed = StreamedAnswer::from(Answer::decode(bytes.as_slice()).unwrap());
        assert_eq!(streamed.artifacts, vec![types::Artifact::filtered(vec![0xab], 42)]);
    }

    #[test]
    fn answer_artifacts_are_mapped() {
        let answer = Answer {
            artifacts: vec![
                image_artifact(FinishReason::Stop, &[0x89, 0x50]),
                image_artifact(FinishReason::Filter, &[0x00]),
                image_artifact(FinishReason::Error, &[]),
                Artifact {
                    r#type: ArtifactType::Text.into(),
                    data: Some(artifact::Data::Text("meta".into())),
                    ..Artifact::default()
                },
            ],
            ..Answer::default()
        };

        let streamed = StreamedAnswer::from(answer);
        assert_eq!(streamed.artifacts[0], types::Artifact::image(vec![0x89, 0x50], 42));
        assert_eq!(streamed.artifacts[1], types::Artifact::filtered(vec![0x00], 42));
        assert_eq!(streamed.artifacts[2].finish_reason, types::FinishReason::Other);
        assert_eq!(streamed.artifacts[3].kind, ArtifactKind::Other);
        assert!(streamed.artifacts[3].binary.is_empty());
    }

    #[test]
    fn unknown_enum_values_map_to_other() {
        let artifact = Artifact {
            r#type: 99,
            finish_reason: 99,
            ..Artifact::default()
        };

        let mapped = types::Artifact::from(artifact);
        assert_eq!(mapped.kind, ArtifactKind::Other);
        assert_eq!(mapped.finish_reason, types::FinishReason::Other);
    }
}
