use crate::models::survey_models::QuestionType;
use crate::utils::error::{AppError, AppResult};

pub const MIN_TITLE_LENGTH: usize = 5;
pub const MAX_TITLE_LENGTH: usize = 100;
pub const MIN_DESCRIPTION_LENGTH: usize = 20;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
pub const MIN_QUESTION_LENGTH: usize = 5;
pub const MAX_QUESTION_LENGTH: usize = 200;
pub const MAX_REWARD: u64 = 1000;
pub const MAX_PARTICIPANTS_LIMIT: u32 = 100;

pub fn validate_title(title: &str) -> AppResult<()> {
    let len = title.trim().chars().count();
    if len < MIN_TITLE_LENGTH || len > MAX_TITLE_LENGTH {
        return Err(AppError::ValidationError(format!(
            "title must be between {} and {} characters",
            MIN_TITLE_LENGTH, MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> AppResult<()> {
    let len = description.trim().chars().count();
    if len < MIN_DESCRIPTION_LENGTH || len > MAX_DESCRIPTION_LENGTH {
        return Err(AppError::ValidationError(format!(
            "description must be between {} and {} characters",
            MIN_DESCRIPTION_LENGTH, MAX_DESCRIPTION_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_reward(reward: u64) -> AppResult<()> {
    if reward == 0 {
        return Err(AppError::ValidationError(
            "reward_per_participant must be positive".to_string(),
        ));
    }
    if reward > MAX_REWARD {
        return Err(AppError::ValidationError(format!(
            "reward_per_participant must not exceed {}",
            MAX_REWARD
        )));
    }
    Ok(())
}

pub fn validate_max_participants(max_participants: u32) -> AppResult<()> {
    if max_participants == 0 {
        return Err(AppError::ValidationError(
            "max_participants must be positive".to_string(),
        ));
    }
    if max_participants > MAX_PARTICIPANTS_LIMIT {
        return Err(AppError::ValidationError(format!(
            "max_participants must not exceed {}",
            MAX_PARTICIPANTS_LIMIT
        )));
    }
    Ok(())
}

/// Choice questions need at least two distinct options; other types carry none.
pub fn validate_question(text: &str, question_type: QuestionType, options: &[String]) -> AppResult<()> {
    let len = text.trim().chars().count();
    if len < MIN_QUESTION_LENGTH || len > MAX_QUESTION_LENGTH {
        return Err(AppError::ValidationError(format!(
            "question text must be between {} and {} characters",
            MIN_QUESTION_LENGTH, MAX_QUESTION_LENGTH
        )));
    }

    if question_type.is_choice() {
        let trimmed: Vec<String> = options.iter().map(|opt| opt.trim().to_string()).collect();

        let mut deduped_options = Vec::new();
        for option in &trimmed {
            if !deduped_options.contains(option) {
                deduped_options.push(option.clone());
            }
        }

        if deduped_options.len() < 2 {
            return Err(AppError::ValidationError(
                "choice questions must have at least 2 unique options".to_string(),
            ));
        }

        if deduped_options.len() != trimmed.len() {
            return Err(AppError::ValidationError(
                "question options must be unique".to_string(),
            ));
        }
    } else if !options.is_empty() {
        return Err(AppError::ValidationError(format!(
            "{:?} questions must not declare options",
            question_type
        )));
    }

    Ok(())
}
