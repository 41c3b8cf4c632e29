//! Import command: load groups from a JSON file.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use tl_core::{merge_groups, normalize_imported};
use tl_db::{Store, parse_groups};

pub fn run<W: Write>(writer: &mut W, store: &mut dyn Store, path: &Path, merge: bool) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let imported = parse_groups(&contents)
        .with_context(|| format!("{} is not a group collection", path.display()))?;

    if let Some(position) = imported.iter().position(|g| g.name.trim().is_empty()) {
        anyhow::bail!("group #{position} in {} has no name", path.display());
    }
    let imported = normalize_imported(imported)
        .with_context(|| format!("{} cannot be imported", path.display()))?;
    let imported_count = imported.len();

    let groups = if merge {
        let local = store.load().context("failed to load groups")?;
        merge_groups(local, imported)
    } else {
        imported
    };

    store.save(&groups).context("failed to save groups")?;
    tracing::info!(imported = imported_count, total = groups.len(), merge, "import complete");

    writeln!(
        writer,
        "Imported {imported_count} groups ({} total)",
        groups.len()
    )?;
    Ok(())
}
