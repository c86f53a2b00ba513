use crate::stage::{Asset, Stage, StageContext, StageError};

/// Returns its input unchanged.
pub struct Identity;

impl Stage for Identity {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn apply(&self, asset: Asset, _cx: &StageContext<'_>) -> Result<Asset, StageError> {
        Ok(asset)
    }
}
