// src/similarity/matcher.rs - Matching extracted names against benchmark names
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{ResolutionError, ResolutionResult};

use super::service::SimilarityService;

static LEGAL_FORM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:общество\s+с\s+ограниченной\s+ответственностью|товарищество\s+с\s+ограниченной\s+ответственностью|публичное\s+акционерное\s+общество|закрытое\s+акционерное\s+общество|открытое\s+акционерное\s+общество|акционерное\s+общество|индивидуальный\s+предприниматель|limited\s+liability\s+company|joint\s+stock\s+company|incorporated|corporation|limited|ооо|оао|зао|пао|нао|ао|ип|тоо|чп|llc|llp|jsc|inc|corp|ltd|gmbh|plc)\b\.?",
    )
    .expect("legal form regex is valid")
});

static QUOTES_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["«»“”„']"#).expect("quotes regex is valid"));

/// Removes legal-form designators and quotes, e.g. `ООО «Ромашка»` -> `Ромашка`.
/// A name made only of designators is returned trimmed but otherwise intact.
pub fn strip_legal_forms(name: &str) -> String {
    let stripped = LEGAL_FORM_REGEX.replace_all(name, " ");
    let stripped = QUOTES_REGEX.replace_all(&stripped, " ");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        name.trim().to_string()
    } else {
        collapsed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameMatch {
    pub candidate: String,
    /// Position of the candidate in the input list.
    pub index: usize,
    pub similarity: f64,
}

/// Finds the benchmark name closest to `query`.
///
/// Returns `None` when no candidate reaches `threshold`. Blank candidates are
/// skipped; ties keep the earliest candidate.
pub fn best_match<S: AsRef<str>>(
    service: &SimilarityService,
    query: &str,
    candidates: &[S],
    threshold: f64,
    strip_forms: bool,
) -> ResolutionResult<Option<NameMatch>> {
    if query.trim().is_empty() {
        return Err(ResolutionError::validation("query name must not be empty"));
    }
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ResolutionError::validation(format!(
            "threshold must be between 0 and 1, got {}",
            threshold
        )));
    }

    let prepare = |name: &str| {
        if strip_forms {
            strip_legal_forms(name)
        } else {
            name.to_string()
        }
    };
    let query_key = prepare(query);

    let mut best: Option<NameMatch> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let candidate = candidate.as_ref();
        if candidate.trim().is_empty() {
            continue;
        }
        let similarity = service.similarity(&query_key, &prepare(candidate))?;
        if best.as_ref().map_or(true, |b| similarity > b.similarity) {
            best = Some(NameMatch {
                candidate: candidate.to_string(),
                index,
                similarity,
            });
        }
    }

    debug!(
        "Best benchmark for '{}': {:?} (threshold {:.2})",
        query, best, threshold
    );
    Ok(best.filter(|m| m.similarity >= threshold))
}
