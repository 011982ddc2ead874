pub mod config;
pub mod molecule;
pub mod mopac;
pub mod optimize;
pub mod server;
pub mod store;
