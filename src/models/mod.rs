pub mod survey_models;
pub mod participation_models;
pub mod ledger_models;
