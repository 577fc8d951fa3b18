use crate::domain::model::{Classification, ClassifierKind};
use crate::utils::error::Result;

/// Turns decoded image bytes into a classification.
///
/// Implementations are shared across request tasks behind an `Arc`, and
/// `classify` may be called from the blocking pool.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    /// `false` when the backing model could not be loaded; requests are then refused.
    fn is_ready(&self) -> bool;

    fn classify(&self, image: &[u8]) -> Result<Classification>;
}

pub trait ConfigProvider: Send + Sync {
    fn host(&self) -> &str;
    fn port(&self) -> u16;
    fn classifier_kind(&self) -> ClassifierKind;
    fn model_path(&self) -> &str;
    fn max_body_bytes(&self) -> usize;
}
