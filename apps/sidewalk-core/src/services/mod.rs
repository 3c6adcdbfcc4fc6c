pub mod completion;
pub mod education;
pub mod insights;
pub mod live;
pub mod readings;
