use std::path::Path;

use anyhow::{Context, Result};

use cardforge_core::import::import_from_png;
use cardforge_core::png::card::card_payload;
use cardforge_schema::estimate_card_tokens;

pub fn inspect(file: &Path, tokens: bool) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;

    let Some((keyword, _)) = card_payload(&bytes) else {
        println!("{}: no card data (no ccv3 or chara chunk)", file.display());
        return Ok(());
    };

    let (card, format) = import_from_png(&bytes)?;
    println!("source chunk:  {keyword}");
    println!("source format: {format:?}");
    println!("name:          {}", card.data.name);
    if !card.data.creator.is_empty() {
        println!("creator:       {}", card.data.creator);
    }
    if !card.data.character_version.is_empty() {
        println!("version:       {}", card.data.character_version);
    }
    if let Some(book) = &card.data.character_book {
        println!("lorebook:      {} entries", book.entries.len());
    }
    if !card.data.tags.is_empty() {
        println!("tags:          {}", card.data.tags.join(", "));
    }

    if tokens {
        let breakdown = estimate_card_tokens(&card);
        println!("\ntokens:");
        for (field, count) in &breakdown.fields {
            println!("  {field:<26} {count}");
        }
        println!("  {:<26} {}", "total", breakdown.total);
    }

    Ok(())
}
