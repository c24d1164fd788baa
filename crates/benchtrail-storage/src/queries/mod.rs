//! Query modules for each table.

pub mod results;
