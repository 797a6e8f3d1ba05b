//! Address resolution restricted to a configured region

mod error;
mod resolver;

pub use error::ResolveError;
pub use resolver::AddressResolver;
