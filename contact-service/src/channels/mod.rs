pub mod email;

pub use email::{EmailConfig, ResendChannel};
