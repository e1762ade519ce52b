//! Batch assembly
//!
//! Per case, in this order: reseed with `base + index`, resolve the layer
//! (drawing any weights), draw the input, run one forward pass, flatten
//! parameters, encode.

use crate::catalog::{CatalogEntry, DEFAULT_ACTIVATION_SHAPE, Operation, Settings};
use crate::error::{Error, Result};
use crate::record::{ActivationCase, Batch, ModuleCase, ParameterRecord, TensorRecord};
use crate::rng::GeneratorState;
use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
use tracing::debug;

/// Everything one catalog entry produces.
struct CaseParts {
    name: String,
    layer: String,
    settings: Settings,
    input: TensorRecord,
    output: TensorRecord,
    parameters: Option<Vec<ParameterRecord>>,
}

fn build_case(
    client: &CpuClient,
    device: &CpuDevice,
    state: &mut GeneratorState,
    entry: &CatalogEntry,
    index: usize,
    seed: u64,
    default_shape: Option<&[usize]>,
) -> Result<CaseParts> {
    let label = entry.label();
    let shape = match (&entry.shape, default_shape) {
        (Some(shape), _) => shape.as_slice(),
        (None, Some(shape)) => shape,
        (None, None) => {
            return Err(Error::config(
                label,
                "module entries must declare an input shape",
            ));
        }
    };

    state.reseed(seed);
    let resolved = Operation::<CpuRuntime>::resolve(&entry.name, &entry.settings, state, device)?;
    let input = state.normal::<CpuRuntime>(shape, device);
    let output = resolved.operation.forward(client, &input)?;

    let parameters = match resolved.operation.parameters() {
        Some(tree) => Some(
            tree.into_flat()
                .into_iter()
                .map(|(path, tensor)| {
                    Ok(ParameterRecord {
                        path,
                        tensor: TensorRecord::from_tensor(client, tensor)?,
                        trainable: true,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        None => None,
    };

    let name = format!("{label}_{index}");
    debug!(
        case = %name,
        layer = %resolved.kind,
        seed,
        input_shape = ?shape,
        output_shape = ?output.shape(),
        "generated case"
    );

    Ok(CaseParts {
        name,
        layer: label.to_string(),
        settings: resolved.settings,
        input: TensorRecord::from_tensor(client, &input)?,
        output: TensorRecord::from_tensor(client, &output)?,
        parameters,
    })
}

fn case_seed(seed_base: u64, index: usize) -> Result<u64> {
    seed_base
        .checked_add(index as u64)
        .ok_or_else(|| Error::InvalidArgument {
            arg: "seed_base",
            reason: format!("seed base {seed_base} + case index {index} overflows u64"),
        })
}

/// Build the activation batch. Entries without a shape use
/// [`DEFAULT_ACTIVATION_SHAPE`].
pub fn build_activation_batch(
    client: &CpuClient,
    device: &CpuDevice,
    entries: &[CatalogEntry],
    seed_base: u64,
) -> Result<Batch<ActivationCase>> {
    let mut state = GeneratorState::new(seed_base);
    let tests = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let parts = build_case(
                client,
                device,
                &mut state,
                entry,
                index,
                case_seed(seed_base, index)?,
                Some(&DEFAULT_ACTIVATION_SHAPE[..]),
            )?;
            Ok(ActivationCase {
                name: parts.name,
                layer: parts.layer,
                parameters: parts.settings,
                input: parts.input,
                output: parts.output,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Batch { tests })
}

/// Build the module batch. Every entry must declare its input shape.
pub fn build_module_batch(
    client: &CpuClient,
    device: &CpuDevice,
    entries: &[CatalogEntry],
    seed_base: u64,
) -> Result<Batch<ModuleCase>> {
    let mut state = GeneratorState::new(seed_base);
    let tests = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let parts = build_case(
                client,
                device,
                &mut state,
                entry,
                index,
                case_seed(seed_base, index)?,
                None,
            )?;
            Ok(ModuleCase {
                name: parts.name,
                layer: parts.layer,
                settings: parts.settings,
                input: parts.input,
                output: parts.output,
                parameters: parts.parameters.unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Batch { tests })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{activation_catalog, module_catalog};
    use crate::record::TensorData;
    use crate::test_utils::cpu_setup;

    fn f32_data(record: &TensorRecord) -> &[f32] {
        match &record.data {
            TensorData::F32(v) => v,
            other => panic!("expected f32 data, got {other:?}"),
        }
    }

    #[test]
    fn test_activation_names_and_seeds() {
        let (client, device) = cpu_setup();
        let batch = build_activation_batch(&client, &device, &activation_catalog(), 1000).unwrap();
        let names: Vec<&str> = batch.tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Sigmoid_0",
                "Tanh_1",
                "ReLU_2",
                "LeakyReLU_3",
                "Softmax_4",
                "SiLU_5",
                "Gelu_6"
            ]
        );
        assert_eq!(batch.tests[6].layer, "Gelu");

        let mut state = GeneratorState::new(0);
        state.reseed(1002);
        assert_eq!(f32_data(&batch.tests[2].input), state.normal_values(&[2, 4, 3]));
        assert_eq!(batch.tests[4].input.shape, vec![2, 4]);
    }

    #[test]
    fn test_input_depends_only_on_position() {
        let (client, device) = cpu_setup();
        let base = activation_catalog();
        let mut extended = base.clone();
        extended.push(CatalogEntry::new("Tanh"));
        let mut replaced = base.clone();
        replaced[0] = CatalogEntry::new("Linear").with_settings(
            Settings::new()
                .with("inputDimensions", 3i64)
                .with("outputDimensions", 5i64),
        );

        let a = build_activation_batch(&client, &device, &base, 1000).unwrap();
        let b = build_activation_batch(&client, &device, &extended, 1000).unwrap();
        let c = build_activation_batch(&client, &device, &replaced, 1000).unwrap();
        assert_eq!(&b.tests[..a.tests.len()], &a.tests[..]);
        // weights are drawn between the reseed and the input draw
        assert_ne!(c.tests[0].input, a.tests[0].input);
        for i in 1..a.tests.len() {
            assert_eq!(c.tests[i].input, a.tests[i].input);
        }
        assert_eq!(b.tests[7].name, "Tanh_7");
    }

    #[test]
    fn test_module_parameters() {
        let (client, device) = cpu_setup();
        let batch = build_module_batch(&client, &device, &module_catalog(), 2000).unwrap();
        let paths = |i: usize| -> Vec<String> {
            batch.tests[i]
                .parameters
                .iter()
                .map(|p| p.path.clone())
                .collect()
        };
        assert_eq!(paths(0), vec!["weight", "bias"]);
        assert_eq!(paths(1), vec!["weight"]);
        assert!(batch.tests.iter().flat_map(|t| &t.parameters).all(|p| p.trainable));
        assert_eq!(batch.tests[3].output.shape, vec![2, 6, 6, 3]);
    }

    #[test]
    fn test_module_entry_without_shape_fails() {
        let (client, device) = cpu_setup();
        let entry = CatalogEntry::new("Linear").with_settings(
            Settings::new()
                .with("inputDimensions", 2i64)
                .with("outputDimensions", 2i64),
        );
        assert!(matches!(
            build_module_batch(&client, &device, &[entry], 2000),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_seed_base_overflow_is_an_error() {
        let (client, device) = cpu_setup();
        assert!(matches!(
            build_activation_batch(&client, &device, &activation_catalog(), u64::MAX),
            Err(Error::InvalidArgument { arg: "seed_base", .. })
        ));
        assert!(matches!(
            build_module_batch(&client, &device, &module_catalog(), u64::MAX - 1),
            Err(Error::InvalidArgument { arg: "seed_base", .. })
        ));
        // the last index still fits
        let one = [CatalogEntry::new("ReLU")];
        assert!(build_activation_batch(&client, &device, &one, u64::MAX).is_ok());
    }

    #[test]
    fn test_unknown_layer_aborts_batch() {
        let (client, device) = cpu_setup();
        let mut entries = activation_catalog();
        entries.push(CatalogEntry::new("Hardswish"));
        assert!(matches!(
            build_activation_batch(&client, &device, &entries, 1000),
            Err(Error::UnresolvedLayer { .. })
        ));
    }
}
