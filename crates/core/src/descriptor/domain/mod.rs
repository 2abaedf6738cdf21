pub mod descriptor_builder;
pub mod moments;
pub mod normalized_crop;
pub mod shape_descriptor;
pub mod shape_matcher;
