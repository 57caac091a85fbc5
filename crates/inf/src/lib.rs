#![warn(clippy::unwrap_used)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use error::Error;
pub type Result<T = ()> = std::result::Result<T, Error>;

pub mod cast;
mod error;
pub mod fs;
pub mod progressinfo;

#[doc(inline)]
pub use progressinfo::ProgressCallback;
#[doc(inline)]
pub use progressinfo::ProgressNotification;
