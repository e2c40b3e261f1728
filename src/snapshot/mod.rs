pub mod codec;
pub mod value;

pub use codec::{CodecError, decode, encode};
pub use value::{Node, NodeRef, Snapshot};
