pub mod config;
pub mod decode;
pub mod directory;
pub mod error;
pub mod exchange;
pub mod form;
pub mod host;
pub mod schema;
pub mod session;
pub mod transport;

pub use error::{Error, Result};
pub use session::Session;
