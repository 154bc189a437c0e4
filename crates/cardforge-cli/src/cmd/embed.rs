use std::path::Path;

use anyhow::{Context, Result, bail};

use cardforge_core::export::{ExportOptions, export_to_png, verify_export};
use cardforge_core::import::{FileKind, detect_file_kind, import_from_json, import_from_png};

pub fn embed(image: &Path, card_file: &Path, output: &Path, no_v2_compat: bool) -> Result<()> {
    let png = std::fs::read(image).with_context(|| format!("reading {}", image.display()))?;
    let card_bytes =
        std::fs::read(card_file).with_context(|| format!("reading {}", card_file.display()))?;

    let (card, _) = match detect_file_kind(&card_bytes) {
        FileKind::Json => import_from_json(std::str::from_utf8(&card_bytes)?)?,
        FileKind::Png => import_from_png(&card_bytes)?,
        FileKind::Other => bail!("{}: neither PNG nor JSON", card_file.display()),
    };

    let options = ExportOptions {
        include_v2_compat: !no_v2_compat,
        ..ExportOptions::default()
    };
    let exported = export_to_png(&png, &card, options)?;
    verify_export(&exported, &card, false)?;

    std::fs::write(output, &exported)
        .with_context(|| format!("writing {}", output.display()))?;
    println!(
        "embedded '{}' into {} ({} bytes)",
        card.data.name,
        output.display(),
        exported.len()
    );

    Ok(())
}
