pub mod diagnosis;
pub mod request;

pub use diagnosis::*;
pub use request::*;
