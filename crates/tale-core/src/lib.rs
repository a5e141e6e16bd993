pub mod error;
pub mod model;
pub mod value;

pub use error::TaleError;
pub use model::*;
pub use value::*;
