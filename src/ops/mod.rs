pub mod cpu;
pub mod impl_generic;
pub mod traits;

pub use impl_generic::layer::{leaky_relu_impl, softmax_impl};
pub use traits::{ChannelsLastConvOps, ConvGeometry, ExactGeluOps};
