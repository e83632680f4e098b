use crate::types::{Artifact, ArtifactKind, FinishReason, StreamedAnswer};

/// Image artifacts of one call, split by the content classifier verdict
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedResult {
    pub filtered_artifacts: Vec<Artifact>,
    pub image_artifacts: Vec<Artifact>,
}

impl ClassifiedResult {
    /// Number of image artifacts seen across both buckets
    pub fn total(&self) -> usize {
        self.filtered_artifacts.len() + self.image_artifacts.len()
    }
}

/// Partition image artifacts into filtered and accepted, preserving order
///
/// Mask and other artifact kinds are ignored.
pub fn classify(answers: Vec<StreamedAnswer>) -> ClassifiedResult {
    let mut result = ClassifiedResult::default();

    for artifact in answers.into_iter().flat_map(|answer| answer.artifacts) {
        if artifact.kind != ArtifactKind::Image {
            continue;
        }

        if artifact.finish_reason == FinishReason::Filtered {
            result.filtered_artifacts.push(artifact);
        } else {
            result.image_artifacts.push(artifact);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(kind: ArtifactKind, finish_reason: FinishReason, byte: u8) -> Artifact {
        Artifact {
            binary: vec![byte],
            kind,
            finish_reason,
            seed: 0,
        }
    }

    #[test]
    fn splits_success_and_filtered() {
        let answers = vec![StreamedAnswer::new(vec![
            Artifact::image(vec![1], 7),
            Artifact::filtered(vec![2], 8),
        ])];

        let result = classify(answers);
        assert_eq!(result.image_artifacts, vec![Artifact::image(vec![1], 7)]);
        assert_eq!(result.filtered_artifacts, vec![Artifact::filtered(vec![2], 8)]);
        assert_eq!(result.total(), 2);
    }

    #[test]
    fn preserves_order_across_answers() {
        let answers = vec![
            StreamedAnswer::new(vec![Artifact::image(vec![1], 0), Artifact::image(vec![2], 0)]),
            StreamedAnswer::new(vec![Artifact::image(vec![3], 0)]),
        ];

        let bytes: Vec<u8> = classify(answers)
            .image_artifacts
            .iter()
            .map(|a| a.binary[0])
            .collect();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn non_image_kinds_are_never_counted() {
        let answers = vec![StreamedAnswer::new(vec![
            artifact(ArtifactKind::Mask, FinishReason::Success, 1),
            artifact(ArtifactKind::Other, FinishReason::Filtered, 2),
            artifact(ArtifactKind::Image, FinishReason::Other, 3),
        ])];

        let result = classify(answers);
        assert!(result.filtered_artifacts.is_empty());
        assert_eq!(result.image_artifacts.len(), 1);
        assert_eq!(result.image_artifacts[0].binary, vec![3]);
    }

    #[test]
    fn no_answers_yield_empty_buckets() {
        assert_eq!(classify(Vec::new()), ClassifiedResult::default());
    }
}
