pub mod descriptor;
pub mod detection;
pub mod pipeline;
pub mod session;
pub mod shared;
pub mod video;

#[cfg(test)]
pub(crate) mod test_support;
