pub mod config;
pub mod devices;
pub mod permissions;
pub mod recorder;

pub use config::*;
pub use devices::*;
pub use permissions::*;
pub use recorder::*;
