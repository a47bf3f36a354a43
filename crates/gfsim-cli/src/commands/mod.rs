pub mod dataset;
pub mod merge;
pub mod run;
pub mod validate;
