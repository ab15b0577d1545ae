pub mod agent;
pub mod catalog;
pub mod landscape;
pub mod stdio;
pub mod tooling;
