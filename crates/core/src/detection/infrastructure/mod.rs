pub mod haar_cascade;
pub mod haar_cascade_detector;
pub mod integral;
pub mod rect_grouping;
