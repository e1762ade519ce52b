//! Channels-last convolution on top of numr's channels-first `ConvOps`

use crate::error::{Error, Result};
use crate::ops::traits::layer::ConvGeometry;
use numr::ops::{ConvOps, PaddingMode};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

/// Validate channels-last input/weight/bias shapes.
///
/// `input` is `[N, *spatial, Cin]`, `weight` is `[Cout, *kernel, Cin/groups]`,
/// both with `spatial_dims` spatial axes. Returns `(Cin, Cout)`.
pub fn check_conv_shapes(
    input: &[usize],
    weight: &[usize],
    bias: Option<&[usize]>,
    spatial_dims: usize,
    groups: usize,
) -> Result<(usize, usize)> {
    let rank = spatial_dims + 2;
    if input.len() != rank {
        return Err(Error::InvalidArgument {
            arg: "input",
            reason: format!("expected {rank}D channels-last input, got {input:?}"),
        });
    }
    if weight.len() != rank {
        return Err(Error::InvalidArgument {
            arg: "weight",
            reason: format!("expected {rank}D weight, got {weight:?}"),
        });
    }
    if groups == 0 {
        return Err(Error::InvalidArgument {
            arg: "groups",
            reason: "must be positive".into(),
        });
    }
    let in_channels = input[rank - 1];
    let out_channels = weight[0];
    let in_per_group = weight[rank - 1];
    if in_per_group * groups != in_channels {
        return Err(Error::InvalidArgument {
            arg: "input",
            reason: format!(
                "input has {in_channels} channels, weight expects {in_per_group} x {groups} groups"
            ),
        });
    }
    if out_channels % groups != 0 {
        return Err(Error::InvalidArgument {
            arg: "weight",
            reason: format!("{out_channels} output channels not divisible by {groups} groups"),
        });
    }
    if let Some(b) = bias {
        if b != [out_channels] {
            return Err(Error::InvalidArgument {
                arg: "bias",
                reason: format!("expected [{out_channels}], got {b:?}"),
            });
        }
    }
    Ok((in_channels, out_channels))
}

/// 1D convolution over `[N, L, Cin]` with a `[Cout, K, Cin/groups]` kernel.
///
/// Permutes into numr's `[N, C, L]` / `[Cout, Cin/groups, K]` layout,
/// convolves with symmetric padding, and permutes back.
pub fn conv1d_nlc_impl<R, C>(
    client: &C,
    input: &Tensor<R>,
    weight: &Tensor<R>,
    bias: Option<&Tensor<R>>,
    geometry: ConvGeometry,
    groups: usize,
) -> Result<Tensor<R>>
where
    R: Runtime,
    C: RuntimeClient<R> + ConvOps<R>,
{
    check_conv_shapes(
        input.shape(),
        weight.shape(),
        bias.map(|b| b.shape()),
        1,
        groups,
    )?;
    geometry.output_len(input.shape()[1], weight.shape()[1])?;

    let x_ncl = input.permute(&[0, 2, 1]).map_err(Error::Numr)?.contiguous();
    let w_oik = weight
        .permute(&[0, 2, 1])
        .map_err(Error::Numr)?
        .contiguous();
    let padding = PaddingMode::Custom(geometry.padding, geometry.padding, 0, 0);

    let y_ncl = client
        .conv1d(
            &x_ncl,
            &w_oik,
            bias,
            geometry.stride,
            padding,
            geometry.dilation,
            groups,
        )
        .map_err(Error::Numr)?;

    Ok(y_ncl.permute(&[0, 2, 1]).map_err(Error::Numr)?.contiguous())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::cpu_setup;
    use numr::runtime::cpu::CpuRuntime;

    #[test]
    fn test_check_conv_shapes() {
        assert_eq!(
            check_conv_shapes(&[2, 8, 3], &[2, 3, 3], Some(&[2]), 1, 1).unwrap(),
            (3, 2)
        );
        assert!(check_conv_shapes(&[2, 8, 4], &[2, 3, 3], None, 1, 1).is_err());
        assert!(check_conv_shapes(&[2, 8, 3], &[2, 3, 3], Some(&[3]), 1, 1).is_err());
        assert!(check_conv_shapes(&[2, 6, 6, 2], &[3, 3, 3, 1], None, 2, 2).is_err());
        assert!(check_conv_shapes(&[2, 6, 6, 2], &[4, 3, 3, 1], None, 2, 2).is_ok());
    }

    #[test]
    fn test_conv1d_nlc_identity_kernel() {
        let (client, device) = cpu_setup();
        // kernel=1, single channel, weight 2.0, bias 1.0
        let input = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0, 3.0], &[1, 3, 1], &device);
        let weight = Tensor::<CpuRuntime>::from_slice(&[2.0f32], &[1, 1, 1], &device);
        let bias = Tensor::<CpuRuntime>::from_slice(&[1.0f32], &[1], &device);
        let out = conv1d_nlc_impl(
            &client,
            &input,
            &weight,
            Some(&bias),
            ConvGeometry::default(),
            1,
        )
        .unwrap();
        assert_eq!(out.shape(), &[1, 3, 1]);
        assert_eq!(out.to_vec::<f32>(), vec![3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_conv1d_nlc_padded_shape() {
        let (client, device) = cpu_setup();
        let input = Tensor::<CpuRuntime>::from_slice(&[0.5f32; 48], &[2, 8, 3], &device);
        let weight = Tensor::<CpuRuntime>::from_slice(&[0.1f32; 18], &[2, 3, 3], &device);
        let out = conv1d_nlc_impl(
            &client,
            &input,
            &weight,
            None,
            ConvGeometry::new(1, 1, 1),
            1,
        )
        .unwrap();
        assert_eq!(out.shape(), &[2, 8, 2]);
        let data = out.to_vec::<f32>();
        // interior positions see all 3 taps x 3 channels: 9 * 0.05
        assert!((data[2] - 0.45).abs() < 1e-5);
        // first position loses one tap to zero padding: 6 * 0.05
        assert!((data[0] - 0.30).abs() < 1e-5);
    }
}
