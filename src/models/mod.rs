// castdeck Models
// Data structures for the controller

mod settings;
mod stream_status;

pub use settings::*;
pub use stream_status::*;
