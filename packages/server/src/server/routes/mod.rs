// HTTP routes
pub mod health;
pub mod jobs;
pub mod status;

pub use health::*;
pub use jobs::*;
pub use status::*;
