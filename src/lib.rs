//! Command line work journal and time tracker. Entries go into flat text
//! files you can read and grep without the tool; companies, projects, jobs,
//! notes and tasks live in a small SQLite store next to them.
//!

pub mod cli;
pub mod db;
pub mod journal;
pub mod session;
pub mod utils;
