use crate::core::ModuleKind;
use crate::stage::{Asset, Stage, StageContext, StageError};

/// Marks the asset for emission as a standalone file.
pub struct File;

impl Stage for File {
    fn name(&self) -> &'static str {
        "file"
    }

    fn produces(&self) -> Option<ModuleKind> {
        Some(ModuleKind::File)
    }

    fn apply(&self, asset: Asset, _cx: &StageContext<'_>) -> Result<Asset, StageError> {
        Ok(Asset { map: None, ..asset })
    }
}
