pub mod evaluator;
pub mod grading_service;
pub mod review_service;
pub mod test_service;
