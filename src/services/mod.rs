pub mod grading;

pub use grading::GradingService;
