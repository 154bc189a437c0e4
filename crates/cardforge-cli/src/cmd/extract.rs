use std::path::Path;

use anyhow::{Context, Result, bail};

use cardforge_core::import::{FileKind, detect_file_kind, import_from_json, import_from_png};

pub fn extract(file: &Path, output: Option<&Path>) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;

    let (card, format) = match detect_file_kind(&bytes) {
        FileKind::Png => import_from_png(&bytes)?,
        FileKind::Json => import_from_json(std::str::from_utf8(&bytes)?)?,
        FileKind::Other => bail!("{}: neither PNG nor JSON", file.display()),
    };

    tracing::debug!(?format, "extracted card");
    let json = serde_json::to_string_pretty(&card)?;

    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            println!("wrote {} ({:?} source)", path.display(), format);
        }
        None => println!("{json}"),
    }

    Ok(())
}
