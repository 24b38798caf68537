pub mod achievement;
pub mod catalog;
pub mod powerup;
pub mod scoring;
pub mod timer;
