pub mod error;
pub mod event;
pub mod person;
pub mod program;
pub mod remedy;
pub mod syllabus;
pub mod time;
