pub mod duplicate;
pub mod grading;
pub mod intake;
pub mod manifest;
pub mod photo;
pub mod probe;
pub mod session;
pub mod store;
pub mod summary;
pub mod target;
pub mod tournament;
