pub mod clipboard;
pub mod compositor;
pub mod filters;
pub mod mask;
pub mod noise;
pub mod resample;
pub mod rng;
