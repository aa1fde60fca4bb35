//! Cardiology risk scores used on the consultation screens.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// HAS-BLED scores at or above this value indicate a high bleeding risk.
pub const HAS_BLED_HIGH_RISK: u8 = 3;

/// Inputs for the CHA₂DS₂-VASc stroke risk score in atrial fibrillation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cha2Ds2VascInputs {
    pub congestive_heart_failure: bool,
    pub hypertension: bool,
    pub age: u32,
    pub diabetes: bool,
    pub stroke_history: bool,
    pub vascular_disease: bool,
    pub is_female: bool,
}

impl Cha2Ds2VascInputs {
    #[must_use]
    pub fn score(&self) -> u8 {
        let age_points = match self.age {
            75.. => 2,
            65..=74 => 1,
            _ => 0,
        };
        u8::from(self.congestive_heart_failure)
            + u8::from(self.hypertension)
            + age_points
            + u8::from(self.diabetes)
            + 2 * u8::from(self.stroke_history)
            + u8::from(self.vascular_disease)
            + u8::from(self.is_female)
    }
}

/// Inputs for the HAS-BLED bleeding risk score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasBledInputs {
    pub hypertension: bool,
    pub abnormal_renal: bool,
    pub abnormal_liver: bool,
    pub stroke_history: bool,
    pub bleeding_history: bool,
    pub labile_inr: bool,
    /// Older than 65.
    pub elderly: bool,
    /// Antiplatelet agents or NSAIDs.
    pub drugs: bool,
    pub alcohol: bool,
}

impl HasBledInputs {
    #[must_use]
    pub fn score(&self) -> u8 {
        [
            self.hypertension,
            self.abnormal_renal,
            self.abnormal_liver,
            self.stroke_history,
            self.bleeding_history,
            self.labile_inr,
            self.elderly,
            self.drugs,
            self.alcohol,
        ]
        .into_iter()
        .map(u8::from)
        .sum()
    }

    #[must_use]
    pub fn is_high_risk(&self) -> bool {
        self.score() >= HAS_BLED_HIGH_RISK
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub const ALL: [Self; 4] = [Self::Low, Self::Moderate, Self::High, Self::VeryHigh];

    /// Position on the scale, from 1 (`Low`) to 4 (`VeryHigh`).
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Moderate => 2,
            Self::High => 3,
            Self::VeryHigh => 4,
        }
    }

    /// Label shown to clinicians.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Bas",
            Self::Moderate => "Modéré",
            Self::High => "Élevé",
            Self::VeryHigh => "Très Élevé",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    /// Accepts the French label or the variant name in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let wanted = trimmed.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| {
                level.label().to_lowercase() == wanted
                    || format!("{level:?}").to_lowercase() == wanted
            })
            .ok_or_else(|| format!("unknown risk level: {trimmed}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cha2ds2vasc_age_bands() {
        let at = |age| Cha2Ds2VascInputs {
            age,
            ..Cha2Ds2VascInputs::default()
        };
        assert_eq!(at(64).score(), 0);
        assert_eq!(at(65).score(), 1);
        assert_eq!(at(74).score(), 1);
        assert_eq!(at(75).score(), 2);
    }

    #[test]
    fn cha2ds2vasc_maximum_is_nine() {
        let inputs = Cha2Ds2VascInputs {
            congestive_heart_failure: true,
            hypertension: true,
            age: 80,
            diabetes: true,
            stroke_history: true,
            vascular_disease: true,
            is_female: true,
        };
        assert_eq!(inputs.score(), 9);
    }

    #[test]
    fn cha2ds2vasc_stroke_counts_double() {
        let inputs = Cha2Ds2VascInputs {
            stroke_history: true,
            is_female: true,
            age: 50,
            ..Cha2Ds2VascInputs::default()
        };
        assert_eq!(inputs.score(), 3);
    }

    #[test]
    fn has_bled_flags_high_risk_from_three() {
        let two = HasBledInputs {
            hypertension: true,
            elderly: true,
            ..HasBledInputs::default()
        };
        assert_eq!(two.score(), 2);
        assert!(!two.is_high_risk());

        let three = HasBledInputs { alcohol: true, ..two };
        assert_eq!(three.score(), 3);
        assert!(three.is_high_risk());
    }

    #[test]
    fn inputs_deserialize_with_missing_fields() {
        let inputs: HasBledInputs =
            serde_json::from_str(r#"{"labile_inr": true}"#).expect("partial inputs");
        assert_eq!(inputs.score(), 1);
    }

    #[test]
    fn risk_levels_use_french_labels() {
        assert_eq!(RiskLevel::VeryHigh.to_string(), "Très Élevé");
        assert_eq!("Modéré".parse(), Ok(RiskLevel::Moderate));
        assert_eq!("veryhigh".parse(), Ok(RiskLevel::VeryHigh));
        assert!("unknown".parse::<RiskLevel>().is_err());
        assert!(RiskLevel::High.rank() < RiskLevel::VeryHigh.rank());
    }

    #[test]
    fn risk_level_labels_parse_in_any_case() {
        assert_eq!("très élevé".parse(), Ok(RiskLevel::VeryHigh));
        assert_eq!("TRÈS ÉLEVÉ".parse(), Ok(RiskLevel::VeryHigh));
        assert_eq!(" élevé ".parse(), Ok(RiskLevel::High));
        assert_eq!("modéré".parse(), Ok(RiskLevel::Moderate));
        assert!(RiskLevel::Low < RiskLevel::High);
    }
}
