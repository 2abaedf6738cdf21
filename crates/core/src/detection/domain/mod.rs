pub mod region_detector;
pub mod region_selector;
