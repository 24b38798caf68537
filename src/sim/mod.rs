pub mod catalog;
pub mod event;
pub mod save;
pub mod session;
pub mod step;
