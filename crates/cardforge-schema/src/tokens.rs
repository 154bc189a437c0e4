//! Token-count heuristics for card content.
//!
//! No tokenizer dependency: CJK text runs roughly one token per 0.7
//! characters, everything else roughly one per 4. Good enough for budget
//! warnings, not for billing.

use indexmap::IndexMap;

use crate::card::CharacterCardV3;
use crate::lorebook::Lorebook;

/// CJK in the wide sense: ideographs, kana, hangul, fullwidth forms.
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4e00}'..='\u{9fff}'   // CJK Unified Ideographs
        | '\u{3400}'..='\u{4dbf}' // CJK Extension A
        | '\u{f900}'..='\u{faff}' // CJK Compatibility Ideographs
        | '\u{3000}'..='\u{303f}' // CJK Symbols and Punctuation
        | '\u{3040}'..='\u{309f}' // Hiragana
        | '\u{30a0}'..='\u{30ff}' // Katakana
        | '\u{ac00}'..='\u{d7af}' // Hangul
        | '\u{ff00}'..='\u{ffef}' // Fullwidth Forms
    )
}

/// Estimate the token count of a text string.
pub fn estimate_tokens(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }

    let mut cjk = 0u32;
    let mut other = 0u32;
    for c in text.chars() {
        if is_cjk(c) {
            cjk += 1;
        } else {
            other += 1;
        }
    }

    (f64::from(cjk) / 0.7 + f64::from(other) / 4.0) as u32
}

/// Per-entry lorebook token estimate. Disabled entries are skipped; keys
/// count toward their entry since they end up in the prompt on match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LorebookTokens {
    pub total: u32,
    pub entries: IndexMap<String, u32>,
}

pub fn estimate_lorebook_tokens(book: &Lorebook) -> LorebookTokens {
    let mut result = LorebookTokens::default();

    for (i, entry) in book.entries.iter().enumerate() {
        if !entry.enabled {
            continue;
        }

        let mut tokens = estimate_tokens(&entry.content);
        if !entry.keys.is_empty() {
            tokens += estimate_tokens(&entry.keys.join(" "));
        }
        if !entry.secondary_keys.is_empty() {
            tokens += estimate_tokens(&entry.secondary_keys.join(" "));
        }

        let id = entry
            .id
            .as_ref()
            .map_or_else(|| format!("entry_{i}"), ToString::to_string);
        result.entries.insert(id, tokens);
        result.total += tokens;
    }

    result
}

/// Field-level token breakdown for a whole card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenBreakdown {
    pub fields: IndexMap<&'static str, u32>,
    pub total: u32,
}

pub fn estimate_card_tokens(card: &CharacterCardV3) -> TokenBreakdown {
    let data = &card.data;
    let mut breakdown = TokenBreakdown::default();

    let text_fields: [(&'static str, &str); 9] = [
        ("name", &data.name),
        ("description", &data.description),
        ("first_mes", &data.first_mes),
        ("personality", &data.personality),
        ("scenario", &data.scenario),
        ("mes_example", &data.mes_example),
        ("system_prompt", &data.system_prompt),
        ("post_history_instructions", &data.post_history_instructions),
        ("creator_notes", &data.creator_notes),
    ];

    for (field, value) in text_fields {
        if !value.is_empty() {
            breakdown.fields.insert(field, estimate_tokens(value));
        }
    }

    if !data.alternate_greetings.is_empty() {
        let total = data
            .alternate_greetings
            .iter()
            .map(|g| estimate_tokens(g))
            .sum();
        breakdown.fields.insert("alternate_greetings", total);
    }

    if !data.group_only_greetings.is_empty() {
        let total = data
            .group_only_greetings
            .iter()
            .map(|g| estimate_tokens(g))
            .sum();
        breakdown.fields.insert("group_only_greetings", total);
    }

    if let Some(book) = &data.character_book {
        breakdown
            .fields
            .insert("character_book", estimate_lorebook_tokens(book).total);
    }

    breakdown.total = breakdown.fields.values().sum();
    breakdown
}

/// Budget warning tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenWarning {
    /// 70-90% of budget.
    Warning,
    /// Over 90% of budget.
    Danger,
}

pub fn token_warning_level(current: u32, budget: u32) -> Option<TokenWarning> {
    if budget == 0 {
        return None;
    }

    let percentage = f64::from(current) / f64::from(budget) * 100.0;
    if percentage >= 90.0 {
        Some(TokenWarning::Danger)
    } else if percentage >= 70.0 {
        Some(TokenWarning::Warning)
    } else {
        None
    }
}
