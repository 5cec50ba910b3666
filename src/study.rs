use serde::{Deserialize, Serialize};

/// Flavor of study material requested from the service
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    #[default]
    Default,
    Math,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Default => "default",
            Mode::Math => "math",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Mode::Default => Mode::Math,
            Mode::Math => Mode::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

impl QuizQuestion {
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_answer
    }

    /// Letter label shown next to an option ("A", "B", ...)
    pub fn option_label(index: usize) -> char {
        (b'A' + (index % 26) as u8) as char
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathQuestion {
    pub question: String,
    pub answer: String,
    pub explanation: String,
}

/// Study material returned for a topic.
///
/// The service answers with a different shape per mode; the variant is picked
/// from the mode that was requested rather than guessed from the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StudyData {
    Default {
        summary: Vec<String>,
        quiz: Vec<QuizQuestion>,
        #[serde(rename = "studyTip")]
        study_tip: String,
    },
    Math {
        #[serde(rename = "mathQuestion")]
        math_question: MathQuestion,
        #[serde(rename = "studyTip")]
        study_tip: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefaultPayload {
    summary: Vec<String>,
    quiz: Vec<QuizQuestion>,
    study_tip: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MathPayload {
    math_question: MathQuestion,
    study_tip: String,
}

impl StudyData {
    /// Interpret the raw `data` object of a service response for `mode`.
    pub fn from_payload(mode: Mode, payload: serde_json::Value) -> Result<Self, String> {
        let data = match mode {
            Mode::Default => {
                let p: DefaultPayload =
                    serde_json::from_value(payload).map_err(|e| e.to_string())?;
                StudyData::Default {
                    summary: p.summary,
                    quiz: p.quiz,
                    study_tip: p.study_tip,
                }
            }
            Mode::Math => {
                let p: MathPayload = serde_json::from_value(payload).map_err(|e| e.to_string())?;
                StudyData::Math {
                    math_question: p.math_question,
                    study_tip: p.study_tip,
                }
            }
        };
        data.validate()?;
        Ok(data)
    }

    fn validate(&self) -> Result<(), String> {
        if let StudyData::Default { quiz, .. } = self {
            for (i, q) in quiz.iter().enumerate() {
                if q.correct_answer >= q.options.len() {
                    return Err(format!(
                        "question {} has correctAnswer {} but only {} options",
                        i + 1,
                        q.correct_answer,
                        q.options.len()
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn mode(&self) -> Mode {
        match self {
            StudyData::Default { .. } => Mode::Default,
            StudyData::Math { .. } => Mode::Math,
        }
    }

    pub fn study_tip(&self) -> &str {
        match self {
            StudyData::Default { study_tip, .. } | StudyData::Math { study_tip, .. } => study_tip,
        }
    }

    pub fn summary(&self) -> &[String] {
        match self {
            StudyData::Default { summary, .. } => summary,
            StudyData::Math { .. } => &[],
        }
    }

    pub fn quiz(&self) -> &[QuizQuestion] {
        match self {
            StudyData::Default { quiz, .. } => quiz,
            StudyData::Math { .. } => &[],
        }
    }

    pub fn math_question(&self) -> Option<&MathQuestion> {
        match self {
            StudyData::Math { math_question, .. } => Some(math_question),
            StudyData::Default { .. } => None,
        }
    }
}
