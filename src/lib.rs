pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;

use crate::services::{
    grading_service::GradingService, review_service::ReviewService, test_service::TestService,
};
use sqlx::PgPool;

/// Service bundle the surrounding layer (HTTP, CLI, jobs) is expected to
/// construct once and clone per call. The services themselves are stateless;
/// all state lives behind the pool.
#[derive(Clone)]
pub struct Engine {
    pub pool: PgPool,
    pub test_service: TestService,
    pub grading_service: GradingService,
    pub review_service: ReviewService,
}

impl Engine {
    pub fn new(pool: PgPool) -> Self {
        let test_service = TestService::new(pool.clone());
        let grading_service = GradingService::new(pool.clone());
        let review_service = ReviewService::new(pool.clone());

        Self {
            pool,
            test_service,
            grading_service,
            review_service,
        }
    }
}
