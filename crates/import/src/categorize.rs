use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use sift_core::{Category, UNKNOWN_CATEGORY};
use tracing::{debug, warn};

use crate::ai::AiCategorizer;
use crate::util::similarity;

/// Lowercase keyword → category name, kept in insertion order.
///
/// When two categories share a keyword the later category takes it over, but
/// the keyword keeps the scan position of its first insertion.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl KeywordIndex {
    pub fn new(categories: &[Category]) -> Self {
        let mut index = Self::default();
        for category in categories {
            for keyword in &category.keywords {
                index.insert(keyword, &category.name);
            }
        }
        index
    }

    fn insert(&mut self, keyword: &str, category: &str) {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return;
        }
        match self.positions.get(&keyword) {
            Some(&pos) => self.entries[pos].1 = category.to_string(),
            None => {
                self.positions.insert(keyword.clone(), self.entries.len());
                self.entries.push((keyword, category.to_string()));
            }
        }
    }

    /// First keyword, in insertion order, contained anywhere in `text`.
    pub fn lookup(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();
        self.entries
            .iter()
            .find(|(keyword, _)| text.contains(keyword.as_str()))
            .map(|(_, category)| category.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), c.as_str()))
    }
}

/// Keyword matcher with an optional AI fallback, built once per import run.
#[derive(Clone)]
pub struct Categorizer {
    index: KeywordIndex,
    names: Vec<String>,
    ai: Option<Arc<dyn AiCategorizer>>,
}

impl Categorizer {
    pub fn new(categories: &[Category]) -> Self {
        let names = categories
            .iter()
            .filter(|c| !c.is_unknown())
            .map(|c| c.name.clone())
            .collect();
        Self { index: KeywordIndex::new(categories), names, ai: None }
    }

    pub fn with_ai(mut self, ai: Arc<dyn AiCategorizer>) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn match_keyword(&self, text: &str) -> Option<&str> {
        self.index.lookup(text)
    }

    pub async fn categorize(&self, description: &str) -> String {
        self.resolve(description, description).await
    }

    /// Keyword-match `query` (a bank category hint, or the description itself);
    /// when nothing matches, ask the AI about `description`.
    pub async fn resolve(&self, query: &str, description: &str) -> String {
        match self.match_keyword(query) {
            Some(category) => category.to_string(),
            None => self.ai_fallback(description).await,
        }
    }

    /// Ask the AI for one description. Failures become Unknown.
    pub async fn ai_fallback(&self, description: &str) -> String {
        let Some(ai) = self.ai.as_ref() else {
            return UNKNOWN_CATEGORY.to_string();
        };
        if self.names.is_empty() {
            return UNKNOWN_CATEGORY.to_string();
        }

        match ai.complete(&single_prompt(description, &self.names)).await {
            Ok(answer) => {
                let category = reconcile(&answer, &self.names);
                debug!(description, answer = answer.trim(), category = %category, "AI categorized");
                category
            }
            Err(e) => {
                warn!(description, error = %e, "AI categorization failed, using Unknown");
                UNKNOWN_CATEGORY.to_string()
            }
        }
    }

    /// Categorize many descriptions with one numbered AI prompt. Indices the
    /// response omits become Unknown; a failed call makes every entry Unknown.
    pub async fn categorize_batch(&self, descriptions: &[String]) -> Vec<String> {
        let unknown = || vec![UNKNOWN_CATEGORY.to_string(); descriptions.len()];
        let Some(ai) = self.ai.as_ref() else {
            return unknown();
        };
        if descriptions.is_empty() || self.names.is_empty() {
            return unknown();
        }

        let response = match ai.complete(&batch_prompt(descriptions, &self.names)).await {
            Ok(response) => response,
            Err(e) => {
                warn!(count = descriptions.len(), error = %e, "AI batch categorization failed");
                return unknown();
            }
        };

        parse_batch_response(&response, descriptions.len())
            .into_iter()
            .enumerate()
            .map(|(i, answer)| match answer {
                Some(answer) => reconcile(&answer, &self.names),
                None => {
                    debug!(index = i, "AI batch response missing entry");
                    UNKNOWN_CATEGORY.to_string()
                }
            })
            .collect()
    }
}

pub fn single_prompt(description: &str, names: &[String]) -> String {
    format!(
        "Categorize this bank transaction into exactly one of these categories: {}.\n\
         Transaction: {}\n\
         Reply with one category name from that list and nothing else.",
        names.join(", "),
        description.trim()
    )
}

pub fn batch_prompt(descriptions: &[String], names: &[String]) -> String {
    let mut prompt = format!(
        "Categorize each bank transaction into exactly one of these categories: {}.\n\
         Reply with one line per transaction in the form `<index>: <category>`, \
         using only names from that list.\n\n",
        names.join(", ")
    );
    for (i, description) in descriptions.iter().enumerate() {
        prompt.push_str(&format!("{i}: {}\n", description.trim()));
    }
    prompt
}

fn re_batch_line() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"^\s*(\d+)\s*[:.)\-]\s*(.+?)\s*$").expect("invalid regex"))
}

/// Pull `<index>: <category>` answers out of a batch response. The first
/// answer for an index wins; out-of-range indices are ignored.
pub fn parse_batch_response(response: &str, count: usize) -> Vec<Option<String>> {
    let mut answers = vec![None; count];
    for line in response.lines() {
        let Some(caps) = re_batch_line().captures(line) else {
            continue;
        };
        let Ok(index) = caps[1].parse::<usize>() else {
            continue;
        };
        if let Some(slot) = answers.get_mut(index) {
            if slot.is_none() {
                *slot = Some(caps[2].to_string());
            }
        }
    }
    answers
}

/// Map a free-text AI answer onto one of `names`: exact match first, then the
/// most similar name. Only an empty answer or an empty list yields Unknown.
pub fn reconcile(answer: &str, names: &[String]) -> String {
    let answer = answer
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.')
        .trim();

    if let Some(exact) = names.iter().find(|n| n.as_str() == answer) {
        return exact.clone();
    }
    if answer.is_empty() {
        return UNKNOWN_CATEGORY.to_string();
    }

    let mut best: Option<(&String, f32)> = None;
    for name in names {
        let score = similarity(answer, name);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((name, score));
        }
    }
    best.map_or_else(|| UNKNOWN_CATEGORY.to_string(), |(name, _)| name.clone())
}
