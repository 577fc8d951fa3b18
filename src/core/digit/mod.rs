pub mod network;
pub mod preprocess;
pub mod weights;

use crate::domain::model::Classification;
use crate::domain::ports::Classifier;
use crate::utils::error::{EchoError, Result};
use network::DigitNet;
use std::path::Path;
use weights::ModelWeights;

/// Where the model is mounted inside the container.
pub const DEFAULT_MODEL_PATH: &str = "/mnt/model/mnist_classifier.json";

/// Handwritten digit classifier. Stays constructible without a model so the
/// service can start and answer 503 until one is mounted.
pub struct DigitClassifier {
    model: Option<DigitNet>,
}

impl DigitClassifier {
    pub fn new(model: DigitNet) -> Self {
        Self { model: Some(model) }
    }

    pub fn unloaded() -> Self {
        Self { model: None }
    }

    /// Loads weights from `path`. Failures are logged and leave the classifier unready.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::error!("❌ Model file not found at '{}'", path.display());
            tracing::error!("💡 Please ensure the model is mounted correctly in the container");
            return Self::unloaded();
        }

        match ModelWeights::from_file(path).and_then(DigitNet::from_weights) {
            Ok(net) => {
                tracing::info!("✅ Model '{}' loaded successfully", path.display());
                Self::new(net)
            }
            Err(e) => {
                tracing::error!("❌ Error loading model from '{}': {}", path.display(), e);
                Self::unloaded()
            }
        }
    }
}

impl Classifier for DigitClassifier {
    fn name(&self) -> &str {
        "digit"
    }

    fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    fn classify(&self, image: &[u8]) -> Result<Classification> {
        let model = self.model.as_ref().ok_or(EchoError::ModelNotLoaded)?;
        let input = preprocess::preprocess_image(image)?;
        let predicted_digit = model.predict(&input);
        tracing::debug!("Predicted digit {}", predicted_digit);
        Ok(Classification::Digit { predicted_digit })
    }
}
