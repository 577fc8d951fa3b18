use crate::utils::error::{EchoError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One named tensor in a weights file: row-major `data` with its `shape`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorData {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl TensorData {
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            data: vec![0.0; shape.iter().product()],
        }
    }
}

/// Parameter names and shapes of the digit network, in file order.
pub const PARAMETER_SHAPES: [(&str, &[usize]); 8] = [
    ("conv1.weight", &[32, 1, 3, 3]),
    ("conv1.bias", &[32]),
    ("conv2.weight", &[64, 32, 3, 3]),
    ("conv2.bias", &[64]),
    ("fc1.weight", &[128, 64 * 7 * 7]),
    ("fc1.bias", &[128]),
    ("fc2.weight", &[10, 128]),
    ("fc2.bias", &[10]),
];

/// All parameters of the digit network, keyed by the names in [`PARAMETER_SHAPES`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelWeights {
    tensors: HashMap<String, TensorData>,
}

impl ModelWeights {
    /// Every parameter present with the right shape, all values zero.
    pub fn zeroed() -> Self {
        let tensors = PARAMETER_SHAPES
            .iter()
            .map(|(name, shape)| (name.to_string(), TensorData::zeros(shape)))
            .collect();
        Self { tensors }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = std::fs::read(path_ref)?;
        let weights: Self =
            serde_json::from_slice(&content).map_err(|e| EchoError::ModelLoadError {
                path: path_ref.display().to_string(),
                message: format!("invalid weights JSON: {}", e),
            })?;
        weights
            .check_shapes()
            .map_err(|message| EchoError::ModelLoadError {
                path: path_ref.display().to_string(),
                message,
            })?;
        Ok(weights)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_vec(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TensorData> {
        self.tensors.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TensorData> {
        self.tensors.get_mut(name)
    }

    pub(crate) fn take(&mut self, name: &str) -> Option<TensorData> {
        self.tensors.remove(name)
    }

    pub(crate) fn check_shapes(&self) -> std::result::Result<(), String> {
        for (name, expected) in PARAMETER_SHAPES {
            let tensor = self
                .tensors
                .get(name)
                .ok_or_else(|| format!("missing tensor '{}'", name))?;
            if tensor.shape != expected {
                return Err(format!(
                    "tensor '{}' has shape {:?}, expected {:?}",
                    name, tensor.shape, expected
                ));
            }
            let len: usize = expected.iter().product();
            if tensor.data.len() != len {
                return Err(format!(
                    "tensor '{}' holds {} values, expected {}",
                    name,
                    tensor.data.len(),
                    len
                ));
            }
        }
        Ok(())
    }
}
