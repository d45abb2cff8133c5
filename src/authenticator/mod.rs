mod configuration;
mod settings;
mod slice;

pub use configuration::*;
pub use settings::*;
pub use slice::*;
