pub mod directory;
pub mod http;

pub use directory::RemoteUserDirectory;
pub use http::HttpIdentityProvider;
