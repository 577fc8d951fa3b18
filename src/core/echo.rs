use crate::core::codec::to_hex;
use crate::domain::model::Classification;
use crate::domain::ports::Classifier;
use crate::utils::error::Result;

/// Answers with the hex form of whatever bytes it was sent.
#[derive(Debug, Clone, Default)]
pub struct EchoClassifier;

impl EchoClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Classifier for EchoClassifier {
    fn name(&self) -> &str {
        "echo"
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn classify(&self, image: &[u8]) -> Result<Classification> {
        tracing::debug!("Echoing {} decoded bytes", image.len());
        Ok(Classification::Decoded {
            decoded: to_hex(image),
        })
    }
}
