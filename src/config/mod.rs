pub mod grading;
mod r#impl;
mod structs;

pub use grading::{
    CalibrationQuestion, EmailAllowList, GradingConfig, GradingGroup, Rubric,
    MAX_REVIEWS_PER_ESSAY,
};
pub use structs::*;
