pub mod activation;
pub mod conv;

pub use activation::{leaky_relu_impl, normalize_axis, softmax_impl};
pub use conv::{check_conv_shapes, conv1d_nlc_impl};
