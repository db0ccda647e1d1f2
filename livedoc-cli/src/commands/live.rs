//! `livedoc live` — print the current live document.

use anyhow::{Context, Result};
use clap::Args;

use livedoc_core::document;
use livedoc_sync::get_live;

use super::{print_json, Session};

#[derive(Args, Debug)]
pub struct LiveArgs {
    /// Drop the `_meta` block from the output.
    #[arg(long)]
    pub strip_meta: bool,
}

impl LiveArgs {
    pub fn run(self, session: &Session) -> Result<()> {
        let (store, tenant) = session.connect()?;
        let live = get_live(store.as_ref(), &tenant)
            .with_context(|| format!("failed to read live document for tenant '{tenant}'"))?;
        if self.strip_meta {
            print_json(&document::strip_meta(&live))
        } else {
            print_json(&live)
        }
    }
}
