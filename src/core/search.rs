use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use crate::domain::model::{Article, ScoredArticle, Selection};

/// English stopword corpus, shipped with the image and embedded at build
/// time so the search path has no runtime data dependency.
const STOPWORDS_RAW: &str = include_str!("../../data/stopwords/english.txt");

const KEYWORD_WEIGHT: f64 = 0.6;
const SEMANTIC_WEIGHT: f64 = 0.4;

/// Terms present in more than this share of documents carry no signal.
const MAX_DOC_FREQUENCY: f64 = 0.95;

fn stopwords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS_RAW.lines().map(str::trim).filter(|w| !w.is_empty()).collect())
}

/// Lowercases, strips non-alphanumerics and collapses whitespace.
pub fn preprocess_text(text: &str) -> String {
    let mapped: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keyword-overlap relevance score on a 0-100 scale.
///
/// Query words are matched against title (50%), content (40%) and source
/// (10%), with a bonus for exact phrase matches in title or content.
pub fn keyword_score(query: &str, title: &str, content: &str, source: &str) -> f64 {
    if query.is_empty() {
        return 0.0;
    }

    let query_processed = preprocess_text(query);
    let title_processed = preprocess_text(title);
    let content_processed = preprocess_text(content);
    let source_processed = preprocess_text(source);

    let query_words: HashSet<&str> = query_processed.split_whitespace().collect();
    if query_words.is_empty() {
        return 0.0;
    }
    let title_words: HashSet<&str> = title_processed.split_whitespace().collect();
    let content_words: HashSet<&str> = content_processed.split_whitespace().collect();
    let source_words: HashSet<&str> = source_processed.split_whitespace().collect();

    let n_query = query_words.len() as f64;
    let title_matches = query_words.intersection(&title_words).count() as f64;
    let content_matches = query_words.intersection(&content_words).count() as f64;
    let source_matches = query_words.intersection(&source_words).count() as f64;

    let mut score = (title_matches / n_query) * 50.0
        + (content_matches / n_query) * 40.0
        + (source_matches / n_query) * 10.0;

    if title_processed.contains(&query_processed) {
        score += 20.0;
    } else if content_processed.contains(&query_processed) {
        score += 10.0;
    }

    score.min(100.0)
}

/// Tokenizes into stopword-filtered unigrams plus bigrams.
fn terms(text: &str) -> Vec<String> {
    let words: Vec<&str> = text
        .split_whitespace()
        .filter(|w| !stopwords().contains(w))
        .collect();

    let mut out: Vec<String> = words.iter().map(|w| w.to_string()).collect();
    for pair in words.windows(2) {
        out.push(format!("{} {}", pair[0], pair[1]));
    }
    out
}

fn term_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for term in terms(text) {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

/// TF-IDF cosine similarity between the query and each article, 0-100.
///
/// The corpus is the query plus each article's title and snippet. Over-common
/// terms (document frequency above 95%) are dropped; a corpus whose
/// vocabulary ends up empty scores everything zero instead of failing.
pub fn semantic_scores(query: &str, articles: &[Article]) -> Vec<f64> {
    if articles.is_empty() {
        return Vec::new();
    }

    let mut docs: Vec<HashMap<String, usize>> = Vec::with_capacity(articles.len() + 1);
    docs.push(term_counts(&preprocess_text(query)));
    for article in articles {
        let combined = match &article.snippet {
            Some(snippet) => format!("{} {}", article.title, snippet),
            None => article.title.clone(),
        };
        docs.push(term_counts(&preprocess_text(&combined)));
    }

    let n_docs = docs.len();
    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for doc in &docs {
        for term in doc.keys() {
            *doc_freq.entry(term.as_str()).or_insert(0) += 1;
        }
    }

    let max_df = MAX_DOC_FREQUENCY * n_docs as f64;
    let vocabulary: HashMap<&str, usize> = doc_freq
        .iter()
        .filter(|(_, &df)| (df as f64) <= max_df)
        .enumerate()
        .map(|(idx, (&term, _))| (term, idx))
        .collect();

    if vocabulary.is_empty() {
        return vec![0.0; articles.len()];
    }

    // Smoothed idf with l2-normalized vectors; cosine reduces to a dot
    // product of the normalized weights.
    let idf: HashMap<&str, f64> = vocabulary
        .keys()
        .map(|&term| {
            let df = doc_freq[term] as f64;
            (term, ((1.0 + n_docs as f64) / (1.0 + df)).ln() + 1.0)
        })
        .collect();

    let vectors: Vec<HashMap<usize, f64>> = docs
        .iter()
        .map(|doc| {
            let mut vec: HashMap<usize, f64> = HashMap::new();
            for (term, &count) in doc {
                if let Some(&idx) = vocabulary.get(term.as_str()) {
                    vec.insert(idx, count as f64 * idf[term.as_str()]);
                }
            }
            let norm: f64 = vec.values().map(|w| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                for w in vec.values_mut() {
                    *w /= norm;
                }
            }
            vec
        })
        .collect();

    let query_vec = &vectors[0];
    vectors[1..]
        .iter()
        .map(|doc_vec| {
            let dot: f64 = query_vec
                .iter()
                .filter_map(|(idx, qw)| doc_vec.get(idx).map(|dw| qw * dw))
                .sum();
            dot * 100.0
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scores every article against the query and returns them sorted by
/// combined relevance, highest first.
pub fn score_articles(query: &str, articles: Vec<Article>) -> Vec<ScoredArticle> {
    if articles.is_empty() {
        return Vec::new();
    }

    tracing::info!("Calculating relevance scores for {} articles", articles.len());

    let semantic = semantic_scores(query, &articles);

    let mut scored: Vec<ScoredArticle> = articles
        .into_iter()
        .zip(semantic)
        .map(|(article, semantic_score)| {
            let snippet = article.snippet.as_deref().unwrap_or("");
            let kw = keyword_score(query, &article.title, snippet, &article.source);
            let combined = round2(kw * KEYWORD_WEIGHT + semantic_score * SEMANTIC_WEIGHT);
            ScoredArticle {
                article,
                keyword_score: round2(kw),
                semantic_score: round2(semantic_score),
                relevance_score: combined,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if let Some(top) = scored.first() {
        tracing::info!("Relevance calculation completed. Top score: {:.2}", top.relevance_score);
    }

    scored
}

/// Keeps the top results by absolute count or by percentage of the total.
pub fn filter_top(scored: Vec<ScoredArticle>, selection: Selection) -> Vec<ScoredArticle> {
    if scored.is_empty() {
        return scored;
    }

    let keep = match selection {
        Selection::Number(n) => n.min(scored.len()),
        Selection::Percentage(pct) => {
            let share = (scored.len() as f64 * pct / 100.0) as usize;
            share.max(1)
        }
    };

    scored.into_iter().take(keep).collect()
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchSummary {
    pub total_articles: usize,
    pub returned: usize,
    pub avg_relevance: f64,
    pub top_relevance: f64,
}

pub fn summarize(total_articles: usize, top: &[ScoredArticle]) -> SearchSummary {
    let (avg, max) = if top.is_empty() {
        (0.0, 0.0)
    } else {
        let sum: f64 = top.iter().map(|a| a.relevance_score).sum();
        let max = top
            .iter()
            .map(|a| a.relevance_score)
            .fold(f64::MIN, f64::max);
        (round2(sum / top.len() as f64), max)
    };

    SearchSummary {
        total_articles,
        returned: top.len(),
        avg_relevance: avg,
        top_relevance: max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Platform;

    fn article(title: &str, snippet: &str, source: &str) -> Article {
        let mut a = Article::new(title, "https://example.com/a", Platform::GoogleNews);
        a.snippet = Some(snippet.to_string());
        a.source = source.to_string();
        a
    }

    #[test]
    fn test_preprocess_text() {
        assert_eq!(preprocess_text("Hello, World! 123"), "hello world 123");
        assert_eq!(preprocess_text("  spaced \t out \n"), "spaced out");
        assert_eq!(preprocess_text(""), "");
    }

    #[test]
    fn test_keyword_score_full_title_match_with_phrase_bonus() {
        // All query words in title (50) plus exact phrase bonus (20).
        let score = keyword_score("climate change", "Climate change accelerates", "", "");
        assert!((score - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_score_content_and_source() {
        let score = keyword_score("energy", "Unrelated title", "renewable energy boom", "");
        // 0 title + 40 content + 10 phrase-in-content bonus.
        assert!((score - 50.0).abs() < 1e-9);

        let score = keyword_score("reuters", "Title", "content", "Reuters");
        assert!((score - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_score_caps_at_100() {
        let score = keyword_score("rust", "rust", "rust", "rust");
        assert!(score <= 100.0);
    }

    #[test]
    fn test_keyword_score_empty_query() {
        assert_eq!(keyword_score("", "title", "content", "source"), 0.0);
        assert_eq!(keyword_score("!!!", "title", "content", "source"), 0.0);
    }

    #[test]
    fn test_semantic_scores_rank_related_article_higher() {
        let articles = vec![
            article("Electric vehicle sales surge", "battery factories expand", "Reuters"),
            article("Local bakery wins award", "croissant competition results", "Gazette"),
        ];
        let scores = semantic_scores("electric vehicle battery", &articles);
        assert_eq!(scores.len(), 2);
        assert!(scores[0] > scores[1]);
        assert!(scores[0] > 0.0);
    }

    #[test]
    fn test_semantic_scores_degenerate_corpus_yields_zeros() {
        // Stopword-only text leaves an empty vocabulary.
        let articles = vec![article("the and of", "", "")];
        let scores = semantic_scores("the and", &articles);
        assert_eq!(scores, vec![0.0]);
    }

    #[test]
    fn test_score_articles_sorted_descending() {
        let articles = vec![
            article("Unrelated cooking story", "pasta recipes", "Food Blog"),
            article("Rust language release", "Rust 1.80 ships new features", "TechWire"),
        ];
        let scored = score_articles("rust language", articles);
        assert_eq!(scored.len(), 2);
        assert!(scored[0].relevance_score >= scored[1].relevance_score);
        assert_eq!(scored[0].article.title, "Rust language release");
    }

    #[test]
    fn test_filter_top_by_number() {
        let articles: Vec<Article> = (0..5)
            .map(|i| article(&format!("story {}", i), "", ""))
            .collect();
        let scored = score_articles("story", articles);

        let top = filter_top(scored.clone(), Selection::Number(3));
        assert_eq!(top.len(), 3);

        // Requesting more than available returns everything.
        let top = filter_top(scored, Selection::Number(50));
        assert_eq!(top.len(), 5);
    }

    #[test]
    fn test_filter_top_by_percentage() {
        let articles: Vec<Article> = (0..10)
            .map(|i| article(&format!("story {}", i), "", ""))
            .collect();
        let scored = score_articles("story", articles);

        let top = filter_top(scored.clone(), Selection::Percentage(30.0));
        assert_eq!(top.len(), 3);

        // Always keeps at least one result.
        let top = filter_top(scored, Selection::Percentage(1.0));
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn test_summarize() {
        let articles = vec![
            article("Rust language release", "Rust ships", "TechWire"),
            article("Rust in production", "adoption grows", "DevNews"),
        ];
        let scored = score_articles("rust", articles);
        let summary = summarize(10, &scored);
        assert_eq!(summary.total_articles, 10);
        assert_eq!(summary.returned, 2);
        assert!(summary.top_relevance >= summary.avg_relevance);
    }
}
