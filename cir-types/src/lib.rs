pub mod error;
pub mod radio;
pub mod record;
pub mod sample;
pub mod status;

pub use error::*;
pub use radio::*;
pub use record::*;
pub use sample::*;
pub use status::*;
