//! Keyword frequency analysis across reflections.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

use super::parser::Reflection;

static WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[a-zA-Z][a-zA-Z0-9_-]+\b").expect("keyword pattern is valid")
});

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
        "do", "does", "did", "will", "would", "could", "should", "may", "might", "must", "shall",
        "can", "to", "of", "in", "for", "on", "with", "at", "by", "from", "as", "into", "through",
        "during", "before", "after", "above", "below", "between", "under", "again", "further",
        "then", "once", "here", "there", "when", "where", "why", "how", "all", "each", "few",
        "more", "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so",
        "than", "too", "very", "just", "but", "and", "or", "if", "this", "that", "these", "those",
        "it", "its", "i", "we", "you", "he", "she", "they", "added", "updated", "created",
        "fixed", "issue", "bd", "see", "also",
    ]
    .into_iter()
    .collect()
});

const TOP_DISCOVERY: usize = 15;
const TOP_IMPROVEMENT: usize = 15;
const TOP_QUESTION: usize = 10;
const TOP_PATTERN: usize = 10;
const RECURRING_CANDIDATES: usize = 20;
const RECURRING_MIN_COUNT: usize = 2;

/// Extract lowercase keywords, skipping stop words and short tokens
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}

/// Frequency counter ranking by count, ties broken by first appearance
#[derive(Debug, Default)]
pub struct KeywordCounter {
    counts: HashMap<String, (usize, usize)>,
}

impl KeywordCounter {
    pub fn add(&mut self, keyword: &str) {
        let next = self.counts.len();
        self.counts
            .entry(keyword.to_string())
            .or_insert((0, next))
            .0 += 1;
    }

    pub fn add_text(&mut self, text: &str) {
        for kw in extract_keywords(text) {
            self.add(&kw);
        }
    }

    pub fn count(&self, keyword: &str) -> usize {
        self.counts.get(keyword).map(|(c, _)| *c).unwrap_or(0)
    }

    pub fn most_common(&self, n: usize) -> Vec<KeywordCount> {
        let mut ranked: Vec<(&String, &(usize, usize))> = self.counts.iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
        ranked
            .into_iter()
            .take(n)
            .map(|(kw, (count, _))| KeywordCount {
                keyword: kw.clone(),
                count: *count,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringTheme {
    pub keyword: String,
    pub count: usize,
    pub dates: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeSummary {
    pub discovery_keywords: Vec<KeywordCount>,
    pub improvement_keywords: Vec<KeywordCount>,
    pub question_keywords: Vec<KeywordCount>,
    pub pattern_keywords: Vec<KeywordCount>,
    pub recurring_across_sessions: Vec<RecurringTheme>,
}

/// Count keywords per section across all reflections
pub fn analyze_themes(reflections: &[Reflection]) -> ThemeSummary {
    let mut discoveries = KeywordCounter::default();
    let mut improvements = KeywordCounter::default();
    let mut questions = KeywordCounter::default();
    let mut patterns = KeywordCounter::default();
    let mut keyword_dates: HashMap<String, BTreeSet<String>> = HashMap::new();

    for r in reflections {
        for text in r.discoveries.iter().chain(&r.open_questions) {
            for kw in extract_keywords(text) {
                keyword_dates
                    .entry(kw)
                    .or_default()
                    .insert(r.date.clone());
            }
        }

        r.discoveries.iter().for_each(|t| discoveries.add_text(t));
        r.improvements_made.iter().for_each(|t| improvements.add_text(t));
        r.open_questions.iter().for_each(|t| questions.add_text(t));
        r.patterns_to_watch.iter().for_each(|t| patterns.add_text(t));
    }

    let recurring_across_sessions = discoveries
        .most_common(RECURRING_CANDIDATES)
        .into_iter()
        .filter(|kc| kc.count >= RECURRING_MIN_COUNT)
        .map(|kc| RecurringTheme {
            dates: keyword_dates
                .get(&kc.keyword)
                .map(|d| d.iter().cloned().collect())
                .unwrap_or_default(),
            keyword: kc.keyword,
            count: kc.count,
        })
        .collect();

    ThemeSummary {
        discovery_keywords: discoveries.most_common(TOP_DISCOVERY),
        improvement_keywords: improvements.most_common(TOP_IMPROVEMENT),
        question_keywords: questions.most_common(TOP_QUESTION),
        pattern_keywords: patterns.most_common(TOP_PATTERN),
        recurring_across_sessions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_keywords() {
        let kws = extract_keywords("Added the Bash(cargo test:*) permission to settings.json");
        assert_eq!(kws, vec!["bash", "cargo", "test", "permission", "settings", "json"]);
    }

    #[test]
    fn test_extract_keywords_keeps_hyphenated_terms() {
        let kws = extract_keywords("pre-commit hook and re_run it");
        assert_eq!(kws, vec!["pre-commit", "hook", "re_run"]);
    }

    #[test]
    fn test_most_common_ties_by_first_seen() {
        let mut counter = KeywordCounter::default();
        for kw in ["beta", "alpha", "gamma", "alpha", "beta", "delta"] {
            counter.add(kw);
        }
        let top: Vec<(String, usize)> = counter
            .most_common(3)
            .into_iter()
            .map(|kc| (kc.keyword, kc.count))
            .collect();
        assert_eq!(
            top,
            vec![
                ("beta".to_string(), 2),
                ("alpha".to_string(), 2),
                ("gamma".to_string(), 1)
            ]
        );
        assert_eq!(counter.count("missing"), 0);
    }

    fn reflection(date: &str, discoveries: &[&str], questions: &[&str]) -> Reflection {
        Reflection {
            date: date.to_string(),
            discoveries: discoveries.iter().map(|s| s.to_string()).collect(),
            open_questions: questions.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_recurring_requires_two_mentions() {
        let reflections = vec![
            reflection("2025-01-02", &["Permission prompts slow cargo"], &[]),
            reflection(
                "2025-01-01",
                &["Cargo permission missing"],
                &["Why does migration stall?"],
            ),
            reflection("2024-12-30", &["Migration flaky"], &[]),
        ];
        let themes = analyze_themes(&reflections);

        let recurring: Vec<&str> = themes
            .recurring_across_sessions
            .iter()
            .map(|t| t.keyword.as_str())
            .collect();
        assert_eq!(recurring, vec!["permission", "cargo"]);
        assert_eq!(
            themes.recurring_across_sessions[0].dates,
            vec!["2025-01-01", "2025-01-02"]
        );
        assert_eq!(themes.question_keywords[0].keyword, "migration");
        assert!(themes.improvement_keywords.is_empty());
    }

    #[test]
    fn test_undated_reflection_keeps_empty_date() {
        let reflections = vec![
            reflection("2025-01-02", &["Tokenizer spans"], &[]),
            reflection("", &["Tokenizer rewrite"], &[]),
        ];
        let themes = analyze_themes(&reflections);
        assert_eq!(themes.recurring_across_sessions[0].keyword, "tokenizer");
        assert_eq!(themes.recurring_across_sessions[0].dates, vec!["", "2025-01-02"]);
    }
}
