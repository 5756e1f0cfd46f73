pub mod errors;

pub use errors::HeaderError;
