//! Channels-last convolution traits
//!
//! numr's `ConvOps` works on channels-first tensors. Fixture layouts are
//! channels-last, with the kernel's input-channel axis innermost.
//!
//! # Layout
//! - 1D: input `[batch, length, in_channels]`, weight `[out_channels, kernel, in_channels/groups]`
//! - 2D: input `[batch, height, width, in_channels]`, weight `[out_channels, kh, kw, in_channels/groups]`
//! - bias: `[out_channels]`

use crate::error::{Error, Result};
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// Stride/padding/dilation for one spatial axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvGeometry {
    pub stride: usize,
    pub padding: usize,
    pub dilation: usize,
}

impl ConvGeometry {
    pub fn new(stride: usize, padding: usize, dilation: usize) -> Self {
        Self {
            stride,
            padding,
            dilation,
        }
    }

    /// Output extent along this axis for an input of `len` and a kernel of `kernel`.
    ///
    /// `(len + 2·padding − dilation·(kernel − 1) − 1) / stride + 1`
    pub fn output_len(&self, len: usize, kernel: usize) -> Result<usize> {
        if self.stride == 0 || self.dilation == 0 || kernel == 0 {
            return Err(Error::InvalidArgument {
                arg: "geometry",
                reason: format!(
                    "stride, dilation and kernel must be positive (stride={}, dilation={}, kernel={})",
                    self.stride, self.dilation, kernel
                ),
            });
        }
        let padded = len + 2 * self.padding;
        let span = self.dilation * (kernel - 1) + 1;
        if padded < span {
            return Err(Error::InvalidArgument {
                arg: "input",
                reason: format!(
                    "padded length {padded} is shorter than the dilated kernel span {span}"
                ),
            });
        }
        Ok((padded - span) / self.stride + 1)
    }
}

impl Default for ConvGeometry {
    fn default() -> Self {
        Self::new(1, 0, 1)
    }
}

/// Convolutions over channels-last tensors.
pub trait ChannelsLastConvOps<R: Runtime> {
    /// 1D convolution: `[N, L, Cin]` → `[N, L_out, Cout]`
    fn conv1d_nlc(
        &self,
        input: &Tensor<R>,
        weight: &Tensor<R>,
        bias: Option<&Tensor<R>>,
        geometry: ConvGeometry,
        groups: usize,
    ) -> Result<Tensor<R>>;

    /// 2D convolution: `[N, H, W, Cin]` → `[N, H_out, W_out, Cout]`
    ///
    /// `geometry` is `(height, width)`.
    fn conv2d_nhwc(
        &self,
        input: &Tensor<R>,
        weight: &Tensor<R>,
        bias: Option<&Tensor<R>>,
        geometry: (ConvGeometry, ConvGeometry),
        groups: usize,
    ) -> Result<Tensor<R>>;
}
