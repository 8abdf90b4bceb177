//! Request, call and chain data carried through the service.
//!
//! Everything here is created per request and dropped when the request is done.

pub mod chain;
pub mod descriptor;
pub mod filter;
mod lenient;
pub mod request;

pub use chain::*;
pub use descriptor::*;
pub use filter::*;
pub use request::*;
