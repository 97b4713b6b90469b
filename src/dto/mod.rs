pub mod grading_dto;
pub mod test_dto;
