pub mod grading;

pub mod system;

pub use grading::configure_grading_routes;
pub use system::configure_system_routes;
