//! Remote procedure call access layer.
//!
//! - [`RpcProvider`]: the narrow set of chain calls the keeper needs
//! - [`ConnectionPool`]: round-robin slots over endpoints and proxies
//! - [`ProxyCredential`]: `ip:port:user:pass` proxy tuples

mod error;
mod pool;
mod provider;
mod proxy;

pub use error::*;
pub use pool::*;
pub use provider::*;
pub use proxy::*;
