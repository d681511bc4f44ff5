pub mod batch;
pub mod geo;
pub mod root;
