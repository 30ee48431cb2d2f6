use crate::error::{Result, WellnessError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const QUESTION_COUNT: usize = 10;
pub const MAX_SCALE_SCORE: u8 = 20;

/// Five GAD items followed by five PHQ items, answered on a 1..=4 scale.
pub const QUESTIONS: [&str; QUESTION_COUNT] = [
    "How often have you felt nervous, anxious, or on edge?",
    "How often have you had trouble controlling your worry?",
    "How often have you found it difficult to relax?",
    "How often have you been so restless it's hard to sit still?",
    "How often have you felt afraid that something bad might happen?",
    "How often have you felt little interest or pleasure in doing things?",
    "How often have you felt down, depressed, or hopeless?",
    "How often have you had trouble falling or staying asleep, or sleeping too much?",
    "How often have you felt tired or had little energy?",
    "How often have you felt bad about yourself or that you are a failure?",
];

pub fn answer_text(value: u8) -> Option<&'static str> {
    match value {
        1 => Some("Not at all"),
        2 => Some("Several days"),
        3 => Some("More than half the days"),
        4 => Some("Nearly every day"),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Anxiety,
    Depression,
}

impl Scale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::Anxiety => "Anxiety",
            Scale::Depression => "Depression",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SeverityLevel {
    Minimal,
    Mild,
    Moderate,
    Severe,
}

impl SeverityLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=5 => SeverityLevel::Minimal,
            6..=10 => SeverityLevel::Mild,
            11..=15 => SeverityLevel::Moderate,
            _ => SeverityLevel::Severe,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLevel::Minimal => "Minimal",
            SeverityLevel::Mild => "Mild",
            SeverityLevel::Moderate => "Moderate",
            SeverityLevel::Severe => "Severe",
        }
    }

    /// e.g. "Severe Anxiety", the form stored alongside check records.
    pub fn label(&self, scale: Scale) -> String {
        format!("{} {}", self.as_str(), scale.as_str())
    }

    fn feedback(&self, scale: Scale) -> &'static str {
        match (scale, self) {
            (Scale::Anxiety, SeverityLevel::Minimal) => "Your anxiety levels are minimal. It's great that you're experiencing low anxiety! Continue practicing good habits to maintain your well-being.",
            (Scale::Anxiety, SeverityLevel::Mild) => "You have mild anxiety, which can be managed with some focused self-care. Let's explore simple techniques to help you stay calm.",
            (Scale::Anxiety, SeverityLevel::Moderate) => "Your anxiety levels are moderate, indicating a need for more structured support. We can work on strategies to manage your anxiety effectively.",
            (Scale::Anxiety, SeverityLevel::Severe) => "You're experiencing severe anxiety, and it's important to seek professional help. Let's make sure you have access to the necessary support.",
            (Scale::Depression, SeverityLevel::Minimal) => "Your depression levels are minimal. It's wonderful that you're feeling good. Keep up the positive lifestyle choices.",
            (Scale::Depression, SeverityLevel::Mild) => "You have mild depression, which can be addressed with some targeted self-care strategies. Let's find ways to uplift your mood.",
            (Scale::Depression, SeverityLevel::Moderate) => "Your depression is moderate, indicating that you could benefit from more structured help. We can focus on improving your mood together.",
            (Scale::Depression, SeverityLevel::Severe) => "You're experiencing severe depression, and it's important to seek professional help. Let's make sure you have access to the necessary support.",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assessment {
    pub gad_score: u8,
    pub phq_score: u8,
    /// Activity name -> affinity score (0-100).
    #[serde(default)]
    pub preferences: BTreeMap<String, f64>,
}

impl Assessment {
    pub fn new(gad_score: u8, phq_score: u8, preferences: BTreeMap<String, f64>) -> Result<Self> {
        if gad_score > MAX_SCALE_SCORE || phq_score > MAX_SCALE_SCORE {
            return Err(WellnessError::InvalidAssessment(format!(
                "scores must be within 0-{MAX_SCALE_SCORE} (gad={gad_score}, phq={phq_score})"
            )));
        }
        Ok(Self {
            gad_score,
            phq_score,
            preferences,
        })
    }

    pub fn from_answers(answers: &[u8], preferences: BTreeMap<String, f64>) -> Result<Self> {
        if answers.len() != QUESTION_COUNT {
            return Err(WellnessError::InvalidAssessment(format!(
                "expected {QUESTION_COUNT} answers, got {}",
                answers.len()
            )));
        }
        if let Some(bad) = answers.iter().find(|a| answer_text(**a).is_none()) {
            return Err(WellnessError::InvalidAssessment(format!(
                "answer {bad} is outside the 1-4 scale"
            )));
        }
        let (gad, phq) = answers.split_at(QUESTION_COUNT / 2);
        Self::new(gad.iter().sum(), phq.iter().sum(), preferences)
    }

    pub fn gad_level(&self) -> SeverityLevel {
        SeverityLevel::from_score(self.gad_score)
    }

    pub fn phq_level(&self) -> SeverityLevel {
        SeverityLevel::from_score(self.phq_score)
    }

    pub fn summary(&self) -> String {
        format!(
            "{}\n\n{}",
            self.gad_level().feedback(Scale::Anxiety),
            self.phq_level().feedback(Scale::Depression)
        )
    }
}
