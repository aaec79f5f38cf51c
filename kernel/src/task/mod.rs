pub mod ready;
pub mod scheduler;
