//! Length-aware text segmentation
//!
//! Splits long input at natural boundaries so every piece fits under a
//! backend's generation ceiling. Three cascading levels produce
//! candidate split points:
//!
//! 1. Paragraphs (runs of two or more newlines)
//! 2. Sentences (`.`, `!`, `?`, `…` followed by whitespace, with an
//!    abbreviation allow-list)
//! 3. Clauses (`;`, `:`, `—`, or the comma nearest the midpoint), used
//!    only when a single sentence exceeds the hard ceiling
//!
//! Consecutive units are greedily packed up to the profile's soft
//! target. A unit that cannot be brought under the hard ceiling fails
//! the request; text is never truncated and words are never broken.

use crate::core::error::{Result, TtsError};
use crate::profiles::BackendProfile;

/// Sentence-ending punctuation
const SENTENCE_ENDERS: &[char] = &['.', '!', '?', '…'];

/// Clause-separating punctuation tried before falling back to commas
const CLAUSE_SEPARATORS: &[char] = &[';', ':', '—'];

/// Tokens that end with a period without ending a sentence
const ABBREVIATIONS: &[&str] = &[
    "mr.", "mrs.", "ms.", "dr.", "prof.", "sr.", "jr.", "st.", "vs.", "etc.", "e.g.", "i.e.",
    "inc.", "ltd.", "co.", "no.", "fig.", "al.",
];

/// One backend-sized piece of the input text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based submission index, preserved through parallel synthesis
    pub index: usize,
    /// Whitespace-normalized text of this piece
    pub text: String,
    /// True for the final chunk of the request
    pub is_terminal: bool,
}

/// Count whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Collapse all whitespace runs to single spaces and trim the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into chunks that respect the backend profile
///
/// Joining the returned chunk texts with single spaces reproduces the
/// whitespace-normalized input; nothing is dropped or reordered.
pub fn chunk_text(text: &str, profile: &BackendProfile) -> Result<Vec<Chunk>> {
    let normalized = normalize_whitespace(text);
    if normalized.is_empty() {
        return Ok(Vec::new());
    }

    if !profile.needs_chunking
        || (word_count(&normalized) <= profile.optimal_words
            && normalized.len() <= profile.max_chars)
    {
        return Ok(finish(vec![normalized]));
    }

    let mut pieces = Vec::new();
    for paragraph in paragraphs(text) {
        let mut units = Vec::new();
        for sentence in split_sentences(&paragraph) {
            units.extend(split_clauses(&sentence, profile)?);
        }
        // Chunks never span a paragraph break
        pack_units(units, profile, &mut pieces);
    }

    Ok(finish(pieces))
}

fn finish(pieces: Vec<String>) -> Vec<Chunk> {
    let last = pieces.len().saturating_sub(1);
    pieces
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            index,
            text,
            is_terminal: index == last,
        })
        .collect()
}

/// Group non-blank lines into paragraphs, each single-spaced
fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(normalize_whitespace(&current.join(" ")));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(normalize_whitespace(&current.join(" ")));
    }
    out
}

/// Split a single-spaced paragraph into sentences
fn split_sentences(paragraph: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = paragraph.char_indices().collect();
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        if !SENTENCE_ENDERS.contains(&chars[i].1) {
            i += 1;
            continue;
        }

        // Absorb runs of enders and trailing closers: `?!`, `."`, `.)`
        let mut j = i;
        while j + 1 < chars.len()
            && (SENTENCE_ENDERS.contains(&chars[j + 1].1)
                || matches!(chars[j + 1].1, '"' | '\'' | ')' | '\u{201d}'))
        {
            j += 1;
        }
        let end = chars[j].0 + chars[j].1.len_utf8();

        if is_sentence_boundary(paragraph, &chars, j, end) {
            let piece = paragraph[start..end].trim();
            if !piece.is_empty() {
                out.push(piece.to_string());
            }
            i = j + 1;
            while i < chars.len() && chars[i].1.is_whitespace() {
                i += 1;
            }
            start = chars.get(i).map(|&(b, _)| b).unwrap_or(paragraph.len());
        } else {
            i = j + 1;
        }
    }

    if start < paragraph.len() {
        let piece = paragraph[start..].trim();
        if !piece.is_empty() {
            out.push(piece.to_string());
        }
    }
    out
}

/// Decide whether the ender run finishing at byte `end` closes a sentence
fn is_sentence_boundary(paragraph: &str, chars: &[(usize, char)], j: usize, end: usize) -> bool {
    match chars.get(j + 1) {
        None => true,
        Some(&(_, next)) if next.is_whitespace() => {
            if is_abbreviation(last_token(&paragraph[..end])) {
                return false;
            }
            // A new sentence starts with a capital, digit or opener
            chars
                .iter()
                .skip(j + 1)
                .map(|&(_, c)| c)
                .find(|c| !c.is_whitespace())
                .is_some_and(|c| {
                    c.is_uppercase() || c.is_numeric() || matches!(c, '"' | '\'' | '(' | '\u{201c}')
                })
        }
        // Mid-token punctuation such as decimals or `v1.2`
        Some(_) => false,
    }
}

fn last_token(text: &str) -> &str {
    text.split_whitespace().last().unwrap_or("")
}

fn is_abbreviation(token: &str) -> bool {
    let stripped = token.trim_start_matches(|c: char| !c.is_alphanumeric());
    let lowered = stripped.to_lowercase();
    ABBREVIATIONS.contains(&lowered.as_str())
}

fn fits(text: &str, profile: &BackendProfile) -> bool {
    word_count(text) <= profile.max_words && text.len() <= profile.max_chars
}

/// Reduce a sentence to pieces under the hard ceiling, or fail
fn split_clauses(sentence: &str, profile: &BackendProfile) -> Result<Vec<String>> {
    if fits(sentence, profile) {
        return Ok(vec![sentence.to_string()]);
    }

    let parts = split_after_separators(sentence);
    if parts.len() > 1 {
        let mut out = Vec::new();
        for part in parts {
            out.extend(split_clauses(&part, profile)?);
        }
        return Ok(out);
    }

    split_at_comma(sentence, profile)
}

/// Cut after `;`, `:` or `—` when whitespace follows the separator
fn split_after_separators(sentence: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = sentence.char_indices().collect();
    let mut out = Vec::new();
    let mut start = 0usize;
    for (k, &(b, c)) in chars.iter().enumerate() {
        if CLAUSE_SEPARATORS.contains(&c)
            && chars.get(k + 1).is_some_and(|&(_, n)| n.is_whitespace())
        {
            let end = b + c.len_utf8();
            let piece = sentence[start..end].trim();
            if !piece.is_empty() {
                out.push(piece.to_string());
            }
            start = end;
        }
    }
    let tail = sentence[start..].trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }
    out
}

/// Bisect at the comma nearest the midpoint and recurse on both halves
fn split_at_comma(sentence: &str, profile: &BackendProfile) -> Result<Vec<String>> {
    let commas: Vec<usize> = sentence
        .char_indices()
        .filter(|&(b, c)| {
            c == ',' && sentence[b + 1..].chars().next().is_some_and(|n| n.is_whitespace())
        })
        .map(|(b, _)| b)
        .collect();

    if commas.is_empty() {
        return Err(TtsError::ChunkTooLarge {
            kind: profile.kind,
            words: word_count(sentence),
            max_words: profile.max_words,
        });
    }

    let mid = sentence.len() / 2;
    let cut = commas
        .iter()
        .copied()
        .find(|&b| b >= mid)
        .unwrap_or_else(|| *commas.last().expect("commas is non-empty"));

    let (left, right) = sentence.split_at(cut + 1);
    let mut out = split_clauses(left.trim(), profile)?;
    out.extend(split_clauses(right.trim(), profile)?);
    Ok(out)
}

/// Greedily pack units toward the soft word target
fn pack_units(units: Vec<String>, profile: &BackendProfile, out: &mut Vec<String>) {
    let mut current = String::new();
    for unit in units {
        if current.is_empty() {
            current = unit;
            continue;
        }
        let packed_words = word_count(&current) + word_count(&unit);
        let packed_chars = current.len() + 1 + unit.len();
        if packed_words <= profile.optimal_words && packed_chars <= profile.max_chars {
            current.push(' ');
            current.push_str(&unit);
        } else {
            out.push(std::mem::take(&mut current));
            current = unit;
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{profile, BackendKind};

    fn small_profile() -> BackendProfile {
        BackendProfile {
            optimal_words: 10,
            max_words: 15,
            max_chars: 200,
            ..*profile(BackendKind::Kokoro)
        }
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("Hello, world.", profile(BackendKind::Kokoro)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello, world.");
        assert!(chunks[0].is_terminal);
    }

    #[test]
    fn test_no_chunking_profile_passes_through() {
        let long: String = std::iter::repeat("word ").take(3000).collect();
        let chunks = chunk_text(&long, profile(BackendKind::ElevenLabs)).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_text("   \n\n ", profile(BackendKind::Kokoro)).unwrap().is_empty());
    }

    #[test]
    fn test_one_word_over_soft_target_stays_single() {
        // 11 words in one sentence: over optimal (10), under max (15)
        let text = "one two three four five six seven eight nine ten eleven.";
        let chunks = chunk_text(text, &small_profile()).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_sentences_packed_to_soft_target() {
        let text = "One two three four. Five six seven eight. Nine ten eleven twelve.";
        let chunks = chunk_text(text, &small_profile()).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "One two three four. Five six seven eight.");
        assert_eq!(chunks[1].text, "Nine ten eleven twelve.");
        assert!(!chunks[0].is_terminal);
        assert!(chunks[1].is_terminal);
    }

    #[test]
    fn test_paragraph_break_flushes_chunk() {
        let text = "One two three.\n\nFour five six.";
        let chunks = chunk_text(text, &small_profile()).unwrap();
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_abbreviations_do_not_split() {
        let text = "Dr. Smith met Mr. Jones at 3.14 o'clock. They talked for hours.";
        let p = BackendProfile {
            optimal_words: 8,
            ..small_profile()
        };
        let chunks = chunk_text(text, &p).unwrap();
        assert_eq!(chunks[0].text, "Dr. Smith met Mr. Jones at 3.14 o'clock.");
    }

    #[test]
    fn test_clause_split_at_semicolon() {
        // One 18-word sentence, over max_words=15, with a semicolon
        let text =
            "alpha beta gamma delta epsilon zeta eta theta iota; kappa lambda mu nu xi omicron pi rho sigma.";
        let chunks = chunk_text(text, &small_profile()).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text.ends_with(';'));
    }

    #[test]
    fn test_clause_split_at_midpoint_comma() {
        let text =
            "alpha beta gamma delta epsilon zeta eta theta, iota kappa lambda mu nu xi omicron pi rho sigma.";
        let chunks = chunk_text(text, &small_profile()).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text.ends_with(','));
    }

    #[test]
    fn test_unsplittable_sentence_fails() {
        let words: Vec<String> = (0..30).map(|i| format!("w{i}")).collect();
        let text = format!("{}.", words.join(" "));
        let err = chunk_text(&text, &small_profile()).unwrap_err();
        assert!(matches!(err, TtsError::ChunkTooLarge { .. }));
    }

    #[test]
    fn test_content_preserving_split() {
        let text = "First sentence here. Second one follows!\n\nA new paragraph starts; it runs on, with clauses, for a while. Done?";
        let p = BackendProfile {
            optimal_words: 5,
            max_words: 8,
            ..small_profile()
        };
        let chunks = chunk_text(text, &p).unwrap();
        let joined = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(joined, normalize_whitespace(text));
    }

    #[test]
    fn test_all_chunks_under_ceilings() {
        let sentence = "the quick brown fox jumps over the lazy dog again and again. ";
        let text: String = std::iter::repeat(sentence).take(40).collect();
        let p = small_profile();
        for chunk in chunk_text(&text, &p).unwrap() {
            assert!(word_count(&chunk.text) <= p.max_words);
            assert!(chunk.text.len() <= p.max_chars);
        }
    }
}
