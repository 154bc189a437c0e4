use std::path::Path;

use anyhow::{Context, Result};

use cardforge_core::png::card::{KEYWORD_CCV3, KEYWORD_CHARA, remove_text_chunk};

pub fn strip(file: &Path, keyword: Option<&str>, output: Option<&Path>) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;

    let stripped = match keyword {
        Some(keyword) => remove_text_chunk(&bytes, keyword)?,
        None => {
            let pass = remove_text_chunk(&bytes, KEYWORD_CCV3)?;
            remove_text_chunk(&pass, KEYWORD_CHARA)?
        }
    };

    let target = output.unwrap_or(file);
    std::fs::write(target, &stripped)
        .with_context(|| format!("writing {}", target.display()))?;
    println!(
        "stripped {} ({} -> {} bytes)",
        target.display(),
        bytes.len(),
        stripped.len()
    );

    Ok(())
}
