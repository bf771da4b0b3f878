use std::cmp::Ordering;

use crate::explore::mode::Mode;
use crate::models::profile::{ResultItem, Skill};

/// Share of query terms found in the profile's skills, 0–100.
///
/// A term matches when any lower-cased skill name contains it. An empty query
/// or a profile without skills counts as a full match.
pub fn match_percentage(query: &str, skills: &[Skill]) -> u8 {
    let query = query.to_lowercase();
    let terms: Vec<&str> = query.split_whitespace().collect();
    if terms.is_empty() || skills.is_empty() {
        return 100;
    }

    let names: Vec<String> = skills.iter().map(Skill::normalized_name).collect();
    let matched = terms
        .iter()
        .filter(|term| names.iter().any(|name| name.contains(*term)))
        .count();

    ((matched as f64 / terms.len() as f64) * 100.0).round() as u8
}

/// Replaces the list with a freshly fetched first page.
pub fn merge_reset(hits: Vec<ResultItem>, mode: Mode, query: &str) -> Vec<ResultItem> {
    let mut merged = annotate(hits, mode, query);
    sort_by_score(&mut merged);
    merged
}

/// Appends a load-more page and re-sorts the whole list. Pages are not
/// guaranteed to be disjoint score ranges, so appending alone is not enough.
pub fn merge_more(
    existing: &[ResultItem],
    hits: Vec<ResultItem>,
    mode: Mode,
    query: &str,
) -> Vec<ResultItem> {
    let mut merged = Vec::with_capacity(existing.len() + hits.len());
    merged.extend_from_slice(existing);
    merged.extend(annotate(hits, mode, query));
    sort_by_score(&mut merged);
    merged
}

pub fn is_sorted_by_score(items: &[ResultItem]) -> bool {
    items
        .windows(2)
        .all(|pair| score_desc(&pair[0], &pair[1]) != Ordering::Greater)
}

fn annotate(mut hits: Vec<ResultItem>, mode: Mode, query: &str) -> Vec<ResultItem> {
    for hit in &mut hits {
        hit.match_percentage = match mode {
            Mode::Search => Some(match_percentage(query, &hit.skills)),
            Mode::Browse => None,
        };
    }
    hits
}

// Stable: ties keep backend order.
fn sort_by_score(items: &mut [ResultItem]) {
    items.sort_by(score_desc);
}

fn score_desc(a: &ResultItem, b: &ResultItem) -> Ordering {
    b.profile_score.total_cmp(&a.profile_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explore::testing::item;

    fn names(values: &[&str]) -> Vec<Skill> {
        values.iter().map(|v| Skill::Name(v.to_string())).collect()
    }

    #[test]
    fn test_half_of_terms_matched() {
        assert_eq!(match_percentage("react aws", &names(&["React", "Node.js"])), 50);
    }

    #[test]
    fn test_empty_query_is_full_match() {
        assert_eq!(match_percentage("", &names(&["Go"])), 100);
        assert_eq!(match_percentage("   ", &[]), 100);
    }

    #[test]
    fn test_no_skills_is_full_match() {
        assert_eq!(match_percentage("rust", &[]), 100);
    }

    #[test]
    fn test_substring_and_detailed_skills() {
        let skills = vec![
            Skill::Detailed {
                name: "PostgreSQL".to_string(),
                level: Some("advanced".to_string()),
            },
            Skill::Name("TypeScript".to_string()),
        ];
        assert_eq!(match_percentage("postgres script kafka", &skills), 67);
    }

    #[test]
    fn test_no_terms_matched() {
        assert_eq!(match_percentage("cobol", &names(&["Rust"])), 0);
    }

    #[test]
    fn test_reset_sorts_descending_and_keeps_tie_order() {
        let hits = vec![
            item("a", 50.0, &[]),
            item("b", 90.0, &[]),
            item("c", 50.0, &[]),
            item("d", 70.0, &[]),
        ];
        let merged = merge_reset(hits, Mode::Browse, "");
        let ids: Vec<&str> = merged.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
        assert!(merged.iter().all(|i| i.match_percentage.is_none()));
    }

    #[test]
    fn test_merge_more_resorts_interleaved_page() {
        let existing = merge_reset(
            vec![item("a", 90.0, &[]), item("b", 60.0, &[])],
            Mode::Browse,
            "",
        );
        let merged = merge_more(
            &existing,
            vec![item("c", 75.0, &[]), item("d", 95.0, &[])],
            Mode::Browse,
            "",
        );
        let ids: Vec<&str> = merged.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "a", "c", "b"]);
        assert!(is_sorted_by_score(&merged));
    }

    #[test]
    fn test_search_mode_annotates_new_hits() {
        let merged = merge_reset(
            vec![item("a", 10.0, &["React", "Node.js"])],
            Mode::Search,
            "react aws",
        );
        assert_eq!(merged[0].match_percentage, Some(50));
    }

    #[test]
    fn test_merge_more_does_not_deduplicate() {
        let existing = vec![item("a", 10.0, &[])];
        let merged = merge_more(&existing, vec![item("a", 10.0, &[])], Mode::Browse, "");
        assert_eq!(merged.len(), 2);
    }
}
