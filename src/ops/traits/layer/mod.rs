pub mod activation;
pub mod conv;

pub use activation::ExactGeluOps;
pub use conv::{ChannelsLastConvOps, ConvGeometry};
