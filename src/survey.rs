//! Survey vocabulary
//!
//! Every closed answer set of the questionnaire as a typed enum. Labels are
//! the canonical strings stored in the database and sent over the wire; range
//! labels use the en dash, and the ASCII hyphen spelling is accepted on input.

use serde::{Deserialize, Serialize};

/// A string that is not part of a closed answer set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct InvalidChoice {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! survey_choice {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $variant:ident => $label:literal $(| $alias:literal)* ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label $(, alias = $alias)*)]
                $variant
            ),+
        }

        impl $name {
            /// All answers in questionnaire order
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $( $label $(| $alias)* => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Canonical labels, used in validation messages
            pub fn labels() -> Vec<&'static str> {
                Self::ALL.iter().map(|c| c.as_str()).collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidChoice;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::parse(value).ok_or_else(|| InvalidChoice {
                    kind: $kind,
                    value: value.to_string(),
                })
            }
        }
    };
}

survey_choice! {
    Gender ("gender") {
        Male => "Male",
        Female => "Female",
    }
}

survey_choice! {
    PrimaryDevice ("primary device") {
        Smartphone => "Smartphone",
        Laptop => "Laptop",
        Tablet => "Tablet",
    }
}

survey_choice! {
    YesNo ("yes/no answer") {
        Yes => "Yes",
        No => "No",
    }
}

survey_choice! {
    /// How often the student relies on a mobile data plan
    MobileDataPlan ("mobile data answer") {
        Always => "Always",
        Sometimes => "Sometimes",
        Rarely => "Rarely",
        No => "No",
    }
}

survey_choice! {
    /// Daily screen time range
    ScreenTime ("screen time range") {
        UnderTwoHours => "<2h",
        TwoToThree => "2–3h" | "2-3h",
        ThreeToFour => "3–4h" | "3-4h",
        FourToSix => "4–6h" | "4-6h",
        OverSixHours => ">6h",
    }
}

survey_choice! {
    /// Phone use after lights out
    NightPhoneUse ("night phone use range") {
        Never => "Never",
        UnderThirtyMinutes => "<30m",
        ThirtyToSixty => "30–60m" | "30-60m",
        OneToTwoHours => "1–2h" | "1-2h",
        OverTwoHours => ">2h",
    }
}

survey_choice! {
    NotificationRate ("notification rate") {
        UnderFive => "<5 times",
        FiveToTen => "5–10 times" | "5-10 times",
        ElevenToTwenty => "11–20 times" | "11-20 times",
        OverTwenty => ">20 times",
    }
}

survey_choice! {
    /// Daily social media time range
    SocialTime ("social media range") {
        UnderOneHour => "<1h",
        OneToTwo => "1–2h" | "1-2h",
        TwoToThree => "2–3h" | "2-3h",
        ThreeToFour => "3–4h" | "3-4h",
        OverFourHours => ">4h",
    }
}

survey_choice! {
    /// Daily gaming time range
    GamingTime ("gaming time range") {
        NoGaming => "None",
        UnderThirtyMinutes => "<30m",
        ThirtyToSixty => "30–60m" | "30-60m",
        OneToTwoHours => "1–2h" | "1-2h",
        OverTwoHours => ">2h",
    }
}

survey_choice! {
    Platform ("platform") {
        YouTube => "YouTube",
        TikTok => "TikTok",
        Instagram => "Instagram",
        Facebook => "Facebook",
        WhatsApp => "WhatsApp",
        XTwitter => "X/Twitter",
        Snapchat => "Snapchat",
        Gaming => "Gaming",
    }
}

survey_choice! {
    /// The student's own estimate of their risk
    SelfRating ("self-rated risk") {
        NotAtRisk => "not_at_risk" | "Not at Risk",
        Mild => "mild" | "Mild",
        Moderate => "moderate" | "Moderate",
        Severe => "severe" | "Severe",
    }
}

survey_choice! {
    /// Risk label emitted by the classifier
    RiskLevel ("risk level") {
        NotAtRisk => "Not at Risk",
        Mild => "Mild",
        Moderate => "Moderate",
        Severe => "Severe",
    }
}

impl RiskLevel {
    /// Risk level for a class index of the trained pipeline
    pub fn from_class_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::NotAtRisk),
            1 => Some(Self::Mild),
            2 => Some(Self::Moderate),
            3 => Some(Self::Severe),
            _ => None,
        }
    }
}

impl SelfRating {
    pub fn risk_level(&self) -> RiskLevel {
        match self {
            Self::NotAtRisk => RiskLevel::NotAtRisk,
            Self::Mild => RiskLevel::Mild,
            Self::Moderate => RiskLevel::Moderate,
            Self::Severe => RiskLevel::Severe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_and_alias() {
        assert_eq!(ScreenTime::parse("2–3h"), Some(ScreenTime::TwoToThree));
        assert_eq!(ScreenTime::parse("2-3h"), Some(ScreenTime::TwoToThree));
        assert_eq!(ScreenTime::TwoToThree.as_str(), "2–3h");
        assert_eq!(ScreenTime::parse("2 to 3h"), None);
    }

    #[test]
    fn test_from_str_error_names_kind() {
        let err = "Robot".parse::<Gender>().unwrap_err();
        assert_eq!(err.kind, "gender");
        assert_eq!(err.value, "Robot");
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&Platform::XTwitter).unwrap();
        assert_eq!(json, "\"X/Twitter\"");

        let level: RiskLevel = serde_json::from_str("\"Not at Risk\"").unwrap();
        assert_eq!(level, RiskLevel::NotAtRisk);
        assert!(serde_json::from_str::<RiskLevel>("\"Extreme\"").is_err());

        let screen: ScreenTime = serde_json::from_str("\"2-3h\"").unwrap();
        assert_eq!(screen, ScreenTime::TwoToThree);
        assert_eq!(serde_json::to_string(&screen).unwrap(), "\"2–3h\"");
    }

    #[test]
    fn test_class_index_mapping() {
        for (index, level) in RiskLevel::ALL.iter().enumerate() {
            assert_eq!(RiskLevel::from_class_index(index as i64), Some(*level));
        }
        assert_eq!(RiskLevel::from_class_index(4), None);
        assert_eq!(RiskLevel::from_class_index(-1), None);
    }

    #[test]
    fn test_self_rating_accepts_both_spellings() {
        assert_eq!(SelfRating::parse("not_at_risk"), Some(SelfRating::NotAtRisk));
        assert_eq!(SelfRating::parse("Not at Risk"), Some(SelfRating::NotAtRisk));
        assert_eq!(SelfRating::Severe.risk_level(), RiskLevel::Severe);
    }

    #[test]
    fn test_labels_in_questionnaire_order() {
        assert_eq!(
            NotificationRate::labels(),
            vec!["<5 times", "5–10 times", "11–20 times", ">20 times"]
        );
        assert_eq!(Platform::ALL.len(), 8);
    }
}
