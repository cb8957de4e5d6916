mod assets;
pub mod http;

pub use http::Server;
