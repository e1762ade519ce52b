pub mod activation;
pub mod conv1d;
pub mod conv2d;
pub mod init;
pub mod linear;
pub mod module;
pub mod param_tree;

pub use activation::{Activation, DEFAULT_NEGATIVE_SLOPE};
pub use conv1d::{Conv1d, Conv1dConfig};
pub use conv2d::{Conv2d, Conv2dConfig};
pub use init::Init;
pub use linear::Linear;
pub use module::Module;
pub use param_tree::ParamTree;
