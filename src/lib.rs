pub mod aggregate;
pub mod alpha;
pub mod business;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod orchestrate;
pub mod parse;
pub mod rules;
pub mod scan;
pub mod segment;
pub mod summary;
pub mod technical;
pub mod util;
