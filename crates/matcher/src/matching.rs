//! Grouping of store hits into per-document plagiarism matches.

use std::cmp::Ordering;

use hashbrown::HashMap;
use index::{FingerprintStore, ShingleRecord};

use crate::types::{MatchConfig, MatchError, PlagiarismMatch};

/// Queries `store` for the current hashes and groups the hits by source
/// document.
///
/// Records of `current_doc_id` are never reported. An empty hash list
/// returns no matches without touching the store; a store failure is
/// returned as [`MatchError::Store`].
pub async fn find_matches(
    store: &dyn FingerprintStore,
    current_hashes: &[String],
    current_doc_id: &str,
    cfg: &MatchConfig,
) -> Result<Vec<PlagiarismMatch>, MatchError> {
    if current_hashes.is_empty() {
        return Ok(Vec::new());
    }
    let records = store
        .find_matching_shingles(current_hashes, current_doc_id)
        .await?;
    tracing::debug!(
        document_id = %current_doc_id,
        hashes = current_hashes.len(),
        hits = records.len(),
        "store_hits"
    );
    Ok(group_matches(&records, current_hashes.len(), cfg))
}

/// Groups `records` by owning document and scores each group against
/// `total_hashes`.
///
/// Similarity is `group_len / total_hashes * 100`, capped at 100. Groups
/// below `cfg.min_similarity_percent` are dropped. The result is ordered by
/// similarity (highest first), then by source document id.
pub fn group_matches(
    records: &[ShingleRecord],
    total_hashes: usize,
    cfg: &MatchConfig,
) -> Vec<PlagiarismMatch> {
    if total_hashes == 0 || records.is_empty() {
        return Vec::new();
    }

    let mut groups: HashMap<&str, Vec<&ShingleRecord>> = HashMap::new();
    for rec in records {
        groups.entry(rec.document_id.as_str()).or_default().push(rec);
    }

    let mut matches = Vec::with_capacity(groups.len());
    for (document_id, mut group) in groups {
        let similarity =
            ((group.len() as f64 * 100.0) / total_hashes as f64).min(100.0);
        if similarity < cfg.min_similarity_percent {
            continue;
        }

        group.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
        let start = group.iter().map(|r| r.start).min().unwrap_or_default();
        let end = group.iter().map(|r| r.end).max().unwrap_or_default();
        let merged_text = match (group.first(), group.last()) {
            (Some(first), Some(last)) if group.len() > 1 => {
                format!("{} ... {}", first.text, last.text)
            }
            (Some(first), _) => first.text.clone(),
            _ => String::new(),
        };

        matches.push(PlagiarismMatch {
            source_label: format!("{} {}", cfg.source_label_prefix, document_id),
            source_document_id: document_id.to_string(),
            similarity_percent: similarity,
            merged_text,
            start,
            end,
        });
    }

    matches.sort_by(|a, b| {
        b.similarity_percent
            .partial_cmp(&a.similarity_percent)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.source_document_id.cmp(&b.source_document_id))
    });
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use index::InMemoryStore;

    fn rec(doc: &str, hash: &str, text: &str, start: usize, end: usize) -> ShingleRecord {
        ShingleRecord::new(doc, hash, text, start, end)
    }

    #[test]
    fn single_group_spans_and_merged_text() {
        let records = vec![
            rec("doc-b", "h1", "альфа бета", 0, 10),
            rec("doc-b", "h2", "бета гамма", 6, 16),
            rec("doc-b", "h3", "гамма дельта", 11, 23),
        ];
        let matches = group_matches(&records, 4, &MatchConfig::default());
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.source_document_id, "doc-b");
        assert_eq!(m.source_label, "Document doc-b");
        assert_eq!(m.similarity_percent, 75.0);
        assert_eq!(m.merged_text, "альфа бета ... гамма дельта");
        assert_eq!((m.start, m.end), (0, 23));
    }

    #[test]
    fn single_record_group_has_plain_text() {
        let records = vec![rec("doc-b", "h1", "альфа бета", 3, 13)];
        let matches = group_matches(&records, 2, &MatchConfig::default());
        assert_eq!(matches[0].merged_text, "альфа бета");
        assert_eq!(matches[0].similarity_percent, 50.0);
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let records = vec![rec("doc-b", "h1", "t", 0, 1)];
        // 1 of 20 is exactly 5%.
        assert_eq!(group_matches(&records, 20, &MatchConfig::default()).len(), 1);
        // 1 of 21 is just below.
        assert!(group_matches(&records, 21, &MatchConfig::default()).is_empty());
    }

    #[test]
    fn similarity_is_capped_at_one_hundred() {
        let records = vec![
            rec("doc-b", "h1", "t", 0, 1),
            rec("doc-b", "h1", "t", 2, 3),
            rec("doc-b", "h1", "t", 4, 5),
        ];
        let matches = group_matches(&records, 2, &MatchConfig::default());
        assert_eq!(matches[0].similarity_percent, 100.0);
    }

    #[test]
    fn groups_sorted_by_similarity_then_id() {
        let records = vec![
            rec("doc-a", "h1", "t", 0, 1),
            rec("doc-c", "h1", "t", 0, 1),
            rec("doc-c", "h2", "t", 2, 3),
            rec("doc-d", "h1", "t", 0, 1),
        ];
        let matches = group_matches(&records, 4, &MatchConfig::default());
        let ids: Vec<_> = matches
            .iter()
            .map(|m| m.source_document_id.as_str())
            .collect();
        assert_eq!(ids, vec!["doc-c", "doc-a", "doc-d"]);
    }

    #[test]
    fn custom_label_prefix() {
        let cfg = MatchConfig::default().with_source_label_prefix("Документ");
        let records = vec![rec("42", "h1", "t", 0, 1)];
        assert_eq!(group_matches(&records, 1, &cfg)[0].source_label, "Документ 42");
    }

    #[tokio::test]
    async fn find_matches_excludes_current_document() {
        let store = InMemoryStore::new();
        store
            .store_shingles("doc-a", vec![rec("doc-a", "h1", "t", 0, 1)])
            .await
            .unwrap();
        store
            .store_shingles("doc-b", vec![rec("doc-b", "h1", "t", 0, 1)])
            .await
            .unwrap();

        let matches = find_matches(&store, &["h1".to_string()], "doc-a", &MatchConfig::default())
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].source_document_id, "doc-b");
    }

    #[tokio::test]
    async fn no_hashes_means_no_matches() {
        let store = InMemoryStore::new();
        let matches = find_matches(&store, &[], "doc-a", &MatchConfig::default())
            .await
            .unwrap();
        assert!(matches.is_empty());
    }
}
