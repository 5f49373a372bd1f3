//! Components H, I, J: the NexStar wire protocol — typed codec, the
//! blocking serial transport, and the deterministic simulator transport.

pub mod angle;
pub mod codec;
pub mod location;
pub mod passthrough;
pub mod serial;
pub mod simulator;
pub mod transport;
pub mod utc;

pub use transport::Transport;
