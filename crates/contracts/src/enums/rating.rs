use serde::{Deserialize, Serialize};

use crate::domain::common::ValidationError;

/// Оценка курса по шкале звёзд (1–5, только целые звёзды)
///
/// На проводе передаётся десятичным числом (`5.0`), как и средняя оценка.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum Rating {
    One,
    Two,
    Three,
    Four,
    Five,
}

impl Rating {
    /// Значение в звёздах
    pub fn star_value(&self) -> f64 {
        match self {
            Rating::One => 1.0,
            Rating::Two => 2.0,
            Rating::Three => 3.0,
            Rating::Four => 4.0,
            Rating::Five => 5.0,
        }
    }

    pub fn all() -> Vec<Rating> {
        vec![
            Rating::One,
            Rating::Two,
            Rating::Three,
            Rating::Four,
            Rating::Five,
        ]
    }
}

impl TryFrom<f64> for Rating {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Rating::all()
            .into_iter()
            .find(|rating| rating.star_value() == value)
            .ok_or(ValidationError::InvalidRate(value))
    }
}

impl From<Rating> for f64 {
    fn from(rating: Rating) -> Self {
        rating.star_value()
    }
}
