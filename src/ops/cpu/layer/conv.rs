//! CPU implementation of ChannelsLastConvOps
//!
//! conv1d delegates to impl_generic (numr conv1d through permutes).
//! conv2d is a direct NHWC loop.

use crate::error::{Error, Result};
use crate::ops::impl_generic::layer::{check_conv_shapes, conv1d_nlc_impl};
use crate::ops::traits::layer::{ChannelsLastConvOps, ConvGeometry};
use numr::dtype::DType;
use numr::runtime::cpu::{CpuClient, CpuRuntime};
use numr::tensor::Tensor;

impl ChannelsLastConvOps<CpuRuntime> for CpuClient {
    fn conv1d_nlc(
        &self,
        input: &Tensor<CpuRuntime>,
        weight: &Tensor<CpuRuntime>,
        bias: Option<&Tensor<CpuRuntime>>,
        geometry: ConvGeometry,
        groups: usize,
    ) -> Result<Tensor<CpuRuntime>> {
        conv1d_nlc_impl(self, input, weight, bias, geometry, groups)
    }

    fn conv2d_nhwc(
        &self,
        input: &Tensor<CpuRuntime>,
        weight: &Tensor<CpuRuntime>,
        bias: Option<&Tensor<CpuRuntime>>,
        geometry: (ConvGeometry, ConvGeometry),
        groups: usize,
    ) -> Result<Tensor<CpuRuntime>> {
        let (cin, cout) = check_conv_shapes(
            input.shape(),
            weight.shape(),
            bias.map(|b| b.shape()),
            2,
            groups,
        )?;
        let operands = [Some(input), Some(weight), bias];
        if let Some(t) = operands.iter().flatten().find(|t| t.dtype() != DType::F32) {
            return Err(Error::InvalidArgument {
                arg: "input",
                reason: format!("conv2d_nhwc expects F32 operands, got {:?}", t.dtype()),
            });
        }

        let (gh, gw) = geometry;
        let (n, h, w) = (input.shape()[0], input.shape()[1], input.shape()[2]);
        let (kh, kw) = (weight.shape()[1], weight.shape()[2]);
        let h_out = gh.output_len(h, kh)?;
        let w_out = gw.output_len(w, kw)?;

        let x = input.contiguous().to_vec::<f32>();
        let wt = weight.contiguous().to_vec::<f32>();
        let b = bias.map(|b| b.contiguous().to_vec::<f32>());

        let cin_g = cin / groups;
        let cout_g = cout / groups;
        let mut out = vec![0.0f32; n * h_out * w_out * cout];

        for bi in 0..n {
            for oy in 0..h_out {
                for ox in 0..w_out {
                    let out_base = ((bi * h_out + oy) * w_out + ox) * cout;
                    for oc in 0..cout {
                        let g = oc / cout_g;
                        let mut acc = b.as_ref().map_or(0.0, |b| b[oc]);
                        for ky in 0..kh {
                            let iy = (oy * gh.stride + ky * gh.dilation) as isize
                                - gh.padding as isize;
                            if iy < 0 || iy >= h as isize {
                                continue;
                            }
                            for kx in 0..kw {
                                let ix = (ox * gw.stride + kx * gw.dilation) as isize
                                    - gw.padding as isize;
                                if ix < 0 || ix >= w as isize {
                                    continue;
                                }
                                let x_base =
                                    ((bi * h + iy as usize) * w + ix as usize) * cin + g * cin_g;
                                let w_base = ((oc * kh + ky) * kw + kx) * cin_g;
                                for ic in 0..cin_g {
                                    acc += x[x_base + ic] * wt[w_base + ic];
                                }
                            }
                        }
                        out[out_base + oc] = acc;
                    }
                }
            }
        }

        Ok(Tensor::<CpuRuntime>::from_slice(
            &out,
            &[n, h_out, w_out, cout],
            input.device(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::cpu_setup;

    #[test]
    fn test_conv2d_nhwc_same_padding_shape() {
        let (client, device) = cpu_setup();
        let input = Tensor::<CpuRuntime>::from_slice(&[1.0f32; 2 * 6 * 6 * 2], &[2, 6, 6, 2], &device);
        let weight = Tensor::<CpuRuntime>::from_slice(&[1.0f32; 3 * 3 * 3 * 2], &[3, 3, 3, 2], &device);
        let bias = Tensor::<CpuRuntime>::from_slice(&[0.0f32, 1.0, 2.0], &[3], &device);
        let g = ConvGeometry::new(1, 1, 1);
        let out = client
            .conv2d_nhwc(&input, &weight, Some(&bias), (g, g), 1)
            .unwrap();
        assert_eq!(out.shape(), &[2, 6, 6, 3]);
        let data = out.to_vec::<f32>();
        // corner (0,0): 2x2 window in bounds, 2 channels -> 8
        assert_eq!(&data[0..3], &[8.0, 9.0, 10.0]);
        // interior (1,1): full 3x3 window -> 18
        let idx = (6 + 1) * 3;
        assert_eq!(&data[idx..idx + 3], &[18.0, 19.0, 20.0]);
    }

    #[test]
    fn test_conv2d_nhwc_matches_manual_dot() {
        let (client, device) = cpu_setup();
        // 1x2x2x1 input, single 2x2 kernel, no padding -> 1x1x1x1
        let input = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[1, 2, 2, 1], &device);
        let weight =
            Tensor::<CpuRuntime>::from_slice(&[0.5f32, -1.0, 2.0, 0.25], &[1, 2, 2, 1], &device);
        let g = ConvGeometry::default();
        let out = client.conv2d_nhwc(&input, &weight, None, (g, g), 1).unwrap();
        assert_eq!(out.shape(), &[1, 1, 1, 1]);
        assert_eq!(out.to_vec::<f32>(), vec![0.5 - 2.0 + 6.0 + 1.0]);
    }

    #[test]
    fn test_conv2d_nhwc_grouped() {
        let (client, device) = cpu_setup();
        // depthwise: 2 groups, each output channel sees only its input channel
        let input = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 10.0], &[1, 1, 1, 2], &device);
        let weight = Tensor::<CpuRuntime>::from_slice(&[2.0f32, 3.0], &[2, 1, 1, 1], &device);
        let g = ConvGeometry::default();
        let out = client.conv2d_nhwc(&input, &weight, None, (g, g), 2).unwrap();
        assert_eq!(out.to_vec::<f32>(), vec![2.0, 30.0]);
    }

    #[test]
    fn test_conv2d_nhwc_channel_mismatch() {
        let (client, device) = cpu_setup();
        let input = Tensor::<CpuRuntime>::from_slice(&[1.0f32; 12], &[1, 2, 2, 3], &device);
        let weight = Tensor::<CpuRuntime>::from_slice(&[1.0f32; 8], &[1, 2, 2, 2], &device);
        let g = ConvGeometry::default();
        assert!(client.conv2d_nhwc(&input, &weight, None, (g, g), 1).is_err());
    }

    #[test]
    fn test_conv1d_nlc_delegates() {
        let (client, device) = cpu_setup();
        let input = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[1, 4, 1], &device);
        let weight = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 1.0], &[1, 2, 1], &device);
        let out = client
            .conv1d_nlc(&input, &weight, None, ConvGeometry::default(), 1)
            .unwrap();
        assert_eq!(out.shape(), &[1, 3, 1]);
        assert_eq!(out.to_vec::<f32>(), vec![3.0, 5.0, 7.0]);
    }
}
