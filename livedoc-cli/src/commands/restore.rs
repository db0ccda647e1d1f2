//! `livedoc restore <id>` — copy a checkpoint back into the live slot.

use anyhow::{Context, Result};
use clap::Args;

use livedoc_core::CheckpointId;

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Checkpoint id from `livedoc checkpoint list`.
    pub id: String,
}

impl RestoreArgs {
    pub fn run(self, session: &super::Session) -> Result<()> {
        let (store, tenant) = session.connect()?;
        let id = CheckpointId::from(self.id);
        store
            .restore_checkpoint(&tenant, &id)
            .with_context(|| format!("failed to restore checkpoint '{id}'"))?;
        println!("✓ Restored checkpoint {id} to tenant '{tenant}'");
        Ok(())
    }
}
