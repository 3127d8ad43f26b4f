pub use bytes;
pub use log;

pub mod error;
pub use self::error::Error;

pub mod frame;

pub mod codec;

pub mod client;

mod header;

pub mod server;
