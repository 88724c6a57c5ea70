//! Folio application library
//!
//! Project modules plugged into the Folio kernel. The `books` module proxies
//! searches to the upstream catalog and wraps results in a pagination envelope.

pub mod modules;

pub use modules::register_all;
