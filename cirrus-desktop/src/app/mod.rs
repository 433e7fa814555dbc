pub mod bootstrap;
pub mod platform;

pub use bootstrap::{AppBootstrap, AppSetup, bootstrap};
