pub mod local;
pub mod remote;

pub use local::LocalAuthStrategy;
pub use remote::RemoteAuthStrategy;
