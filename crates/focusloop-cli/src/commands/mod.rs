pub mod history;
pub mod timer;
