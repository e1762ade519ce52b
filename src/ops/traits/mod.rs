pub mod layer;

pub use layer::{ChannelsLastConvOps, ConvGeometry, ExactGeluOps};
