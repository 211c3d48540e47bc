//! Combines the transformer probability and the VADER compound score into one verdict.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pivot for the transformer probability: below it the text reads negative.
pub const TRANSFORMER_PIVOT: f64 = 0.5;
/// Pivot for the VADER compound score.
pub const VADER_PIVOT: f64 = 0.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub transformer_score: Option<f64>,
    pub vader_compound: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "definitely negative")]
    DefinitelyNegative,
    #[serde(rename = "possibly negative")]
    PossiblyNegative,
    #[serde(rename = "neutral")]
    Neutral,
    #[serde(rename = "definitely not negative")]
    DefinitelyNotNegative,
    #[serde(rename = "possibly not negative")]
    PossiblyNotNegative,
    #[serde(rename = "negative")]
    Negative,
    #[serde(rename = "not negative")]
    NotNegative,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DefinitelyNegative => "definitely negative",
            Self::PossiblyNegative => "possibly negative",
            Self::Neutral => "neutral",
            Self::DefinitelyNotNegative => "definitely not negative",
            Self::PossiblyNotNegative => "possibly not negative",
            Self::Negative => "negative",
            Self::NotNegative => "not negative",
        }
    }

    pub fn is_negative(self) -> bool {
        matches!(self, Self::DefinitelyNegative | Self::PossiblyNegative | Self::Negative)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which scores a caller wants aggregated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentModel {
    Vader,
    Transformer,
    All,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SentimentError {
    #[error("at least one sentiment score is required")]
    InsufficientInput,
    #[error("{model} score {value} is outside {min}..={max}")]
    OutOfRange { model: &'static str, value: f64, min: f64, max: f64 },
}

impl SentimentScores {
    pub fn new(transformer_score: Option<f64>, vader_compound: Option<f64>) -> Self {
        Self { transformer_score, vader_compound }
    }

    /// Drops the score the selected model does not use.
    pub fn select(self, model: SentimentModel) -> Self {
        match model {
            SentimentModel::Vader => Self { transformer_score: None, ..self },
            SentimentModel::Transformer => Self { vader_compound: None, ..self },
            SentimentModel::All => self,
        }
    }

    pub fn classify(self) -> Result<Classification, SentimentError> {
        classify(self.transformer_score, self.vader_compound)
    }
}

pub fn classify(
    transformer_score: Option<f64>,
    vader_compound: Option<f64>,
) -> Result<Classification, SentimentError> {
    let transformer = transformer_score
        .map(|value| check_range("transformer", value, 0.0, 1.0))
        .transpose()?;
    let vader = vader_compound.map(|value| check_range("vader", value, -1.0, 1.0)).transpose()?;

    let classification = match (transformer, vader) {
        (None, None) => return Err(SentimentError::InsufficientInput),
        (Some(t), None) => single(t < TRANSFORMER_PIVOT),
        (None, Some(v)) => single(v < VADER_PIVOT),
        (Some(t), Some(v)) => combined(t, v),
    };
    Ok(classification)
}

fn single(negative: bool) -> Classification {
    if negative {
        Classification::Negative
    } else {
        Classification::NotNegative
    }
}

// Rules are evaluated in order; the first match wins.
#[allow(clippy::float_cmp)]
fn combined(t: f64, v: f64) -> Classification {
    if t < TRANSFORMER_PIVOT && v < VADER_PIVOT {
        Classification::DefinitelyNegative
    } else if t >= TRANSFORMER_PIVOT && v < VADER_PIVOT {
        Classification::PossiblyNegative
    } else if t == TRANSFORMER_PIVOT && v == VADER_PIVOT {
        Classification::Neutral
    } else if t >= TRANSFORMER_PIVOT || v >= VADER_PIVOT {
        Classification::DefinitelyNotNegative
    } else {
        Classification::PossiblyNotNegative
    }
}

fn check_range(model: &'static str, value: f64, min: f64, max: f64) -> Result<f64, SentimentError> {
    if value.is_nan() || value < min || value > max {
        return Err(SentimentError::OutOfRange { model, value, min, max });
    }
    Ok(value)
}
