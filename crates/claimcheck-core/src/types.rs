//! Core data types produced by the claimcheck pipeline.

use serde::{Deserialize, Serialize};

/// Classifier verdict for a claim/image pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Real,
    Fake,
}

impl Verdict {
    /// Derive the verdict from `[score_fake, score_real]`.
    ///
    /// `Real` only when the real score is strictly greater; ties are `Fake`.
    pub fn from_scores(scores: [f32; 2]) -> Self {
        if scores[1] > scores[0] {
            Verdict::Real
        } else {
            Verdict::Fake
        }
    }

    /// Lowercase name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Real => "real",
            Verdict::Fake => "fake",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The response body of a successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// "real" or "fake"
    pub label: Verdict,

    /// Raw classifier output, `[score_fake, score_real]`
    pub softmax: [f32; 2],
}

impl Prediction {
    /// Build a prediction from classifier scores.
    pub fn from_scores(scores: [f32; 2]) -> Self {
        Self {
            label: Verdict::from_scores(scores),
            softmax: scores,
        }
    }
}

/// A prediction plus the intermediate values that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// The prediction itself
    #[serde(flatten)]
    pub prediction: Prediction,

    /// Space-joined labels of detected objects ("" when none cleared the threshold)
    pub detected_objects: String,

    /// Number of tokens in the encoded claim
    pub claim_tokens: usize,

    /// Number of tokens in the encoded object-label string
    pub object_tokens: usize,
}
