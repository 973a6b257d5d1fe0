pub mod cohort;
pub mod efficacy;
pub mod error;
pub mod interval;
pub mod kde;
pub mod pipeline;
pub mod posterior;
pub mod render;
pub mod summary;
