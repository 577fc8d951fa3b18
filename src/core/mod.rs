pub mod codec;
pub mod digit;
pub mod echo;

use crate::domain::model::ClassifierKind;
use std::sync::Arc;

pub use crate::domain::model::{Classification, ClassifyRequest, ErrorBody};
pub use crate::domain::ports::{Classifier, ConfigProvider};
pub use crate::utils::error::Result;

/// Builds the classifier a config asks for. The digit model is loaded eagerly.
pub fn build_classifier<C: ConfigProvider + ?Sized>(config: &C) -> Arc<dyn Classifier> {
    match config.classifier_kind() {
        ClassifierKind::Echo => Arc::new(echo::EchoClassifier::new()),
        ClassifierKind::Digit => Arc::new(digit::DigitClassifier::load(config.model_path())),
    }
}
