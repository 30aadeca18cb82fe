use serde::{Deserialize, Serialize};

use crate::models::participation_models::{AnswerValue, Participation};
use crate::models::survey_models::{QuestionType, Survey};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OptionCount {
    pub option: String,
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionStats {
    Choice { counts: Vec<OptionCount> },
    Boolean { true_count: u64, false_count: u64 },
    Rating { average: f64, count: u64 },
    Text { responses: Vec<String> },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuestionBreakdown {
    pub question_id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub stats: QuestionStats,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SurveyBreakdown {
    pub survey_id: String,
    pub title: String,
    pub total_participants: u64,
    pub questions: Vec<QuestionBreakdown>,
}

/// Pure recomputation over stored participations; no side effects, safe to
/// call at any time. Answers referencing questions or options that are no
/// longer declared are excluded from that question's tally rather than
/// treated as an error.
pub fn compute_response_breakdown(
    survey: &Survey,
    participations: &[Participation],
) -> SurveyBreakdown {
    let questions = survey
        .questions
        .iter()
        .map(|question| {
            let answers = participations.iter().filter_map(|participation| {
                participation
                    .answers
                    .iter()
                    .find(|answer| answer.question_id == question.id)
                    .map(|answer| &answer.value)
            });

            let stats = match question.question_type {
                QuestionType::SingleChoice => {
                    let mut counts = empty_counts(&question.options);
                    for value in answers {
                        if let AnswerValue::Text(choice) = value {
                            bump(&mut counts, choice);
                        }
                    }
                    QuestionStats::Choice { counts }
                }
                QuestionType::MultiChoice => {
                    let mut counts = empty_counts(&question.options);
                    for value in answers {
                        if let AnswerValue::Choices(choices) = value {
                            for choice in choices {
                                bump(&mut counts, choice);
                            }
                        }
                    }
                    QuestionStats::Choice { counts }
                }
                QuestionType::Boolean => {
                    let mut true_count = 0;
                    let mut false_count = 0;
                    for value in answers {
                        match value {
                            AnswerValue::Flag(true) => true_count += 1,
                            AnswerValue::Flag(false) => false_count += 1,
                            _ => {}
                        }
                    }
                    QuestionStats::Boolean {
                        true_count,
                        false_count,
                    }
                }
                QuestionType::Rating => {
                    let ratings: Vec<i64> = answers
                        .filter_map(|value| match value {
                            AnswerValue::Rating(rating) => Some(*rating),
                            _ => None,
                        })
                        .collect();
                    let count = ratings.len() as u64;
                    let average = if count == 0 {
                        0.0
                    } else {
                        ratings.iter().sum::<i64>() as f64 / count as f64
                    };
                    QuestionStats::Rating { average, count }
                }
                QuestionType::Text => {
                    let responses = answers
                        .filter_map(|value| match value {
                            AnswerValue::Text(text) => Some(text.clone()),
                            _ => None,
                        })
                        .collect();
                    QuestionStats::Text { responses }
                }
            };

            QuestionBreakdown {
                question_id: question.id.clone(),
                text: question.text.clone(),
                question_type: question.question_type,
                stats,
            }
        })
        .collect();

    SurveyBreakdown {
        survey_id: survey.id.clone(),
        title: survey.title.clone(),
        total_participants: participations.len() as u64,
        questions,
    }
}

fn empty_counts(options: &[String]) -> Vec<OptionCount> {
    options
        .iter()
        .map(|option| OptionCount {
            option: option.clone(),
            count: 0,
        })
        .collect()
}

// Stale answer values (options removed since submission) simply find no
// bucket and are dropped.
fn bump(counts: &mut [OptionCount], choice: &str) {
    if let Some(entry) = counts.iter_mut().find(|entry| entry.option == choice) {
        entry.count += 1;
    }
}
