//! Parameter access for layers with learned weights

use crate::nn::param_tree::ParamTree;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// Core trait for neural network modules.
///
/// Forward passes stay as inherent methods on each layer because
/// signatures differ (different client bounds).
pub trait Module<R: Runtime> {
    /// Parameter tree, in declaration order.
    fn parameters(&self) -> ParamTree<&Tensor<R>>;

    /// Flattened parameters. Names use dot notation for nested modules:
    /// `"layers.0.attn.weight"`.
    fn named_parameters(&self) -> Vec<(String, &Tensor<R>)> {
        self.parameters().into_flat()
    }

    /// Total number of scalar parameters.
    fn num_parameters(&self) -> usize {
        self.named_parameters()
            .iter()
            .map(|(_, t)| t.shape().iter().product::<usize>())
            .sum()
    }
}
