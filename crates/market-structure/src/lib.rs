pub mod bos;
pub mod config;
pub mod fvg;
pub mod key_levels;
pub mod structure;
pub mod swings;
pub mod zones;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod bos_tests;

pub use bos::*;
pub use config::*;
pub use fvg::*;
pub use key_levels::*;
pub use structure::*;
pub use swings::*;
pub use zones::*;
