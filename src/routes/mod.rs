pub mod survey_routes;
