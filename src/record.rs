//! Test case records and the tensor serializer
//!
//! A [`TensorRecord`] is `{dtype, shape, data}` with `data` the row-major
//! flattening of the tensor. Float32 values are written as the shortest
//! decimal that reads back to the same `f32`, so decoding is exact.

use crate::catalog::Settings;
use crate::error::{Error, Result};
use numr::dtype::DType;
use numr::ops::TypeConversionOps;
use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
use numr::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Flat element storage, one variant per JSON number family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TensorData {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    Bool(Vec<bool>),
}

impl TensorData {
    pub fn len(&self) -> usize {
        match self {
            TensorData::F32(v) => v.len(),
            TensorData::F64(v) => v.len(),
            TensorData::I64(v) => v.len(),
            TensorData::U64(v) => v.len(),
            TensorData::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Canonical `{dtype, shape, data}` encoding of a tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTensorRecord")]
pub struct TensorRecord {
    pub dtype: String,
    pub shape: Vec<usize>,
    pub data: TensorData,
}

/// A tensor record as read from JSON, before its data is checked against
/// the dtype and shape.
#[derive(Debug, Deserialize)]
pub struct RawTensorRecord {
    dtype: String,
    shape: Vec<usize>,
    data: Vec<serde_json::Value>,
}

/// Lowercase record name for a numr dtype, or `None` if it has no encoding.
pub fn dtype_name(dtype: DType) -> Option<&'static str> {
    Some(match dtype {
        DType::F32 => "float32",
        DType::F64 => "float64",
        DType::F16 => "float16",
        DType::BF16 => "bfloat16",
        DType::I8 => "int8",
        DType::I16 => "int16",
        DType::I32 => "int32",
        DType::I64 => "int64",
        DType::U8 => "uint8",
        DType::U16 => "uint16",
        DType::U32 => "uint32",
        DType::U64 => "uint64",
        DType::Bool => "bool",
        _ => return None,
    })
}

fn widen<T: Copy + Into<i64>>(values: Vec<T>) -> TensorData {
    TensorData::I64(values.into_iter().map(Into::into).collect())
}

fn widen_unsigned<T: Copy + Into<u64>>(values: Vec<T>) -> TensorData {
    TensorData::U64(values.into_iter().map(Into::into).collect())
}

impl TensorRecord {
    /// Encode a CPU tensor.
    ///
    /// Half-precision floats are widened to f32 before encoding, which is
    /// lossless. Dtypes without a record name fail with
    /// [`Error::UnencodableTensor`].
    pub fn from_tensor(client: &CpuClient, tensor: &Tensor<CpuRuntime>) -> Result<Self> {
        let dtype = tensor.dtype();
        let name = dtype_name(dtype).ok_or_else(|| Error::UnencodableTensor {
            dtype: format!("{dtype:?}"),
        })?;
        let t = tensor.contiguous();
        let data = match dtype {
            DType::F32 => TensorData::F32(t.to_vec::<f32>()),
            DType::F64 => TensorData::F64(t.to_vec::<f64>()),
            DType::F16 | DType::BF16 => {
                let wide = client.cast(&t, DType::F32).map_err(Error::Numr)?;
                TensorData::F32(wide.to_vec::<f32>())
            }
            DType::I8 => widen(t.to_vec::<i8>()),
            DType::I16 => widen(t.to_vec::<i16>()),
            DType::I32 => widen(t.to_vec::<i32>()),
            DType::I64 => TensorData::I64(t.to_vec::<i64>()),
            DType::U8 => widen_unsigned(t.to_vec::<u8>()),
            DType::U16 => widen_unsigned(t.to_vec::<u16>()),
            DType::U32 => widen_unsigned(t.to_vec::<u32>()),
            DType::U64 => TensorData::U64(t.to_vec::<u64>()),
            DType::Bool => {
                let bytes = client.cast(&t, DType::U8).map_err(Error::Numr)?;
                TensorData::Bool(bytes.to_vec::<u8>().into_iter().map(|b| b != 0).collect())
            }
            _ => {
                return Err(Error::UnencodableTensor {
                    dtype: format!("{dtype:?}"),
                });
            }
        };
        Ok(Self {
            dtype: name.to_string(),
            shape: t.shape().to_vec(),
            data,
        })
    }

    /// Number of elements implied by `shape`.
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Decode back into a CPU tensor.
    ///
    /// Supported for float32, float64, int32, int64 and uint8 records.
    pub fn to_tensor(&self, device: &CpuDevice) -> Result<Tensor<CpuRuntime>> {
        let unsupported = || Error::InvalidRecord {
            reason: format!("cannot decode {} record into a tensor", self.dtype),
        };
        let out_of_range = || Error::InvalidRecord {
            reason: format!("value out of range for {}", self.dtype),
        };
        let shape = &self.shape;
        match (self.dtype.as_str(), &self.data) {
            ("float32", TensorData::F32(v)) => Ok(Tensor::<CpuRuntime>::from_slice(v, shape, device)),
            ("float64", TensorData::F64(v)) => Ok(Tensor::<CpuRuntime>::from_slice(v, shape, device)),
            ("int64", TensorData::I64(v)) => Ok(Tensor::<CpuRuntime>::from_slice(v, shape, device)),
            ("int32", TensorData::I64(v)) => {
                let narrow = v
                    .iter()
                    .map(|x| i32::try_from(*x).map_err(|_| out_of_range()))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Tensor::<CpuRuntime>::from_slice(&narrow, shape, device))
            }
            ("uint8", TensorData::U64(v)) => {
                let narrow = v
                    .iter()
                    .map(|x| u8::try_from(*x).map_err(|_| out_of_range()))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Tensor::<CpuRuntime>::from_slice(&narrow, shape, device))
            }
            _ => Err(unsupported()),
        }
    }
}

fn decode_values<T>(
    dtype: &str,
    values: Vec<serde_json::Value>,
    convert: impl Fn(&serde_json::Value) -> Option<T>,
) -> Result<Vec<T>> {
    values
        .iter()
        .map(|v| {
            convert(v).ok_or_else(|| Error::InvalidRecord {
                reason: format!("{v} is not a valid {dtype} element"),
            })
        })
        .collect()
}

impl TryFrom<RawTensorRecord> for TensorRecord {
    type Error = Error;

    fn try_from(raw: RawTensorRecord) -> Result<Self> {
        let RawTensorRecord { dtype, shape, data } = raw;
        let data = match dtype.as_str() {
            "float32" | "float16" | "bfloat16" => TensorData::F32(decode_values(&dtype, data, |v| {
                v.as_f64().map(|f| f as f32)
            })?),
            "float64" => TensorData::F64(decode_values(&dtype, data, serde_json::Value::as_f64)?),
            "int8" | "int16" | "int32" | "int64" => {
                TensorData::I64(decode_values(&dtype, data, serde_json::Value::as_i64)?)
            }
            "uint8" | "uint16" | "uint32" | "uint64" => {
                TensorData::U64(decode_values(&dtype, data, serde_json::Value::as_u64)?)
            }
            "bool" => TensorData::Bool(decode_values(&dtype, data, serde_json::Value::as_bool)?),
            _ => return Err(Error::UnencodableTensor { dtype }),
        };
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::InvalidRecord {
                reason: format!(
                    "shape {shape:?} implies {expected} elements, data has {}",
                    data.len()
                ),
            });
        }
        Ok(Self { dtype, shape, data })
    }
}

/// One leaf of a module's parameter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub path: String,
    pub tensor: TensorRecord,
    pub trainable: bool,
}

/// Activation batch test case. `parameters` echoes the layer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationCase {
    pub name: String,
    pub layer: String,
    pub parameters: Settings,
    pub input: TensorRecord,
    pub output: TensorRecord,
}

/// Module batch test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleCase {
    pub name: String,
    pub layer: String,
    pub settings: Settings,
    pub input: TensorRecord,
    pub output: TensorRecord,
    pub parameters: Vec<ParameterRecord>,
}

/// Top-level document: `{"tests": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch<T> {
    pub tests: Vec<T>,
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self { tests: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::cpu_setup;
    use numr::dtype::Complex64;

    #[test]
    fn test_encode_f32_row_major() {
        let (client, device) = cpu_setup();
        let t = Tensor::<CpuRuntime>::from_slice(
            &[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0],
            &[2, 3],
            &device,
        );
        let record = TensorRecord::from_tensor(&client, &t).unwrap();
        assert_eq!(record.dtype, "float32");
        assert_eq!(record.shape, vec![2, 3]);
        assert_eq!(
            record.data,
            TensorData::F32(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        );
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"dtype":"float32","shape":[2,3],"data":[1.0,2.0,3.0,4.0,5.0,6.0]}"#
        );
    }

    #[test]
    fn test_encode_transposed_view() {
        let (client, device) = cpu_setup();
        let t = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[2, 2], &device);
        let view = t.transpose(-2, -1).unwrap();
        let record = TensorRecord::from_tensor(&client, &view).unwrap();
        assert_eq!(record.data, TensorData::F32(vec![1.0, 3.0, 2.0, 4.0]));
    }

    #[test]
    fn test_shortest_f32_decimal() {
        let (client, device) = cpu_setup();
        let t = Tensor::<CpuRuntime>::from_slice(&[0.1f32], &[1], &device);
        let json = serde_json::to_string(&TensorRecord::from_tensor(&client, &t).unwrap()).unwrap();
        assert!(json.contains("[0.1]"), "{json}");
    }

    #[test]
    fn test_integer_dtypes() {
        let (client, device) = cpu_setup();
        let t = Tensor::<CpuRuntime>::from_slice(&[-3i32, 0, 7], &[3], &device);
        let record = TensorRecord::from_tensor(&client, &t).unwrap();
        assert_eq!(record.dtype, "int32");
        assert_eq!(record.data, TensorData::I64(vec![-3, 0, 7]));

        let t = Tensor::<CpuRuntime>::from_slice(&[0u8, 255], &[2], &device);
        let record = TensorRecord::from_tensor(&client, &t).unwrap();
        assert_eq!(record.dtype, "uint8");
        assert_eq!(record.data, TensorData::U64(vec![0, 255]));
    }

    #[test]
    fn test_zero_size_tensor() {
        let (client, device) = cpu_setup();
        let t = Tensor::<CpuRuntime>::from_slice(&[] as &[f32], &[2, 0, 3], &device);
        let record = TensorRecord::from_tensor(&client, &t).unwrap();
        assert_eq!(record.shape, vec![2, 0, 3]);
        assert!(record.data.is_empty());
        let json = serde_json::to_string(&record).unwrap();
        let back: TensorRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_half_precision_widened() {
        let (client, device) = cpu_setup();
        let t = Tensor::<CpuRuntime>::from_slice(&[0.5f32, -2.0, 1.5], &[3], &device);
        for (dtype, name) in [(DType::F16, "float16"), (DType::BF16, "bfloat16")] {
            let half = client.cast(&t, dtype).unwrap();
            let record = TensorRecord::from_tensor(&client, &half).unwrap();
            assert_eq!(record.dtype, name);
            assert_eq!(record.shape, vec![3]);
            assert_eq!(record.data, TensorData::F32(vec![0.5, -2.0, 1.5]));
        }
    }

    #[test]
    fn test_complex_tensor_unencodable() {
        let (client, device) = cpu_setup();
        let t = Tensor::<CpuRuntime>::from_slice(
            &[Complex64::new(1.0, 2.0), Complex64::new(-0.5, 0.0)],
            &[2],
            &device,
        );
        assert_eq!(t.dtype(), DType::Complex64);
        assert!(matches!(
            TensorRecord::from_tensor(&client, &t),
            Err(Error::UnencodableTensor { .. })
        ));
    }

    #[test]
    fn test_dtype_names() {
        assert_eq!(dtype_name(DType::BF16), Some("bfloat16"));
        assert_eq!(dtype_name(DType::Bool), Some("bool"));
        assert_eq!(dtype_name(DType::Complex64), None);
        assert_eq!(dtype_name(DType::FP8E4M3), None);
    }

    #[test]
    fn test_decode_round_trip_exact() {
        let (client, device) = cpu_setup();
        let values = [0.1f32, -1.0e-7, 3.402_823_5e38, 1.0 / 3.0];
        let t = Tensor::<CpuRuntime>::from_slice(&values, &[2, 2], &device);
        let record = TensorRecord::from_tensor(&client, &t).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        let back: TensorRecord = serde_json::from_str(&json).unwrap();
        let decoded = back.to_tensor(&device).unwrap();
        assert_eq!(decoded.shape(), &[2, 2]);
        assert_eq!(decoded.to_vec::<f32>(), values.to_vec());
    }

    #[test]
    fn test_decode_rejects_bad_records() {
        let mismatch = r#"{"dtype":"float32","shape":[2,2],"data":[1.0,2.0]}"#;
        assert!(serde_json::from_str::<TensorRecord>(mismatch).is_err());
        let unknown = r#"{"dtype":"complex64","shape":[1],"data":[1.0]}"#;
        assert!(serde_json::from_str::<TensorRecord>(unknown).is_err());
        let wrong_kind = r#"{"dtype":"int32","shape":[1],"data":[1.5]}"#;
        assert!(serde_json::from_str::<TensorRecord>(wrong_kind).is_err());
    }
}
