pub mod adaptive;
pub mod calendar;
pub mod error;
pub mod instrument;
pub mod traits;
pub mod types;

pub use calendar::*;
pub use error::*;
pub use instrument::*;
pub use traits::*;
pub use types::*;
