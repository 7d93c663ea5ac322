mod email;
mod get;
mod post;

pub use email::*;
pub use get::*;
pub use post::*;
