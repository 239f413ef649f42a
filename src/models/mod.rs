pub mod usage;
pub mod subscription;

pub use usage::*;
pub use subscription::*;
