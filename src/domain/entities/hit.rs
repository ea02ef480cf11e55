use serde::{Deserialize, Serialize};

/// A matched record exactly as the store adapter decoded it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawHit {
    pub id: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub distance: Option<f64>,
}

/// Normalized search hit handed back to callers.
///
/// Absent fields stay `None` and are skipped on serialization, so callers can
/// tell an omitted field from an empty one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl SearchHit {
    /// Distance used for ordering. A missing distance ranks as `0.0`, ahead of
    /// every scored hit.
    pub fn rank_distance(&self) -> f64 {
        self.distance.unwrap_or(0.0)
    }
}

impl From<RawHit> for SearchHit {
    fn from(raw: RawHit) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
            body: raw.body,
            distance: raw.distance,
        }
    }
}

/// Stable ascending sort by distance. Equal distances keep response order and
/// ranking a ranked sequence is a no-op.
pub fn rank(mut hits: Vec<SearchHit>) -> Vec<SearchHit> {
    hits.sort_by(|a, b| a.rank_distance().total_cmp(&b.rank_distance()));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, distance: Option<f64>) -> SearchHit {
        SearchHit {
            id: Some(id.to_string()),
            title: None,
            body: None,
            distance,
        }
    }

    fn distances(hits: &[SearchHit]) -> Vec<Option<f64>> {
        hits.iter().map(|h| h.distance).collect()
    }

    #[test]
    fn test_rank_ascending() {
        let ranked = rank(vec![
            hit("a", Some(0.8)),
            hit("b", Some(0.1)),
            hit("c", Some(0.5)),
        ]);
        assert_eq!(distances(&ranked), vec![Some(0.1), Some(0.5), Some(0.8)]);
    }

    #[test]
    fn test_rank_is_stable() {
        let ranked = rank(vec![
            hit("first", Some(0.4)),
            hit("low", Some(0.2)),
            hit("second", Some(0.4)),
            hit("third", Some(0.4)),
        ]);
        let ids: Vec<_> = ranked.iter().map(|h| h.id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["low", "first", "second", "third"]);
    }

    #[test]
    fn test_missing_distance_ranks_first() {
        let ranked = rank(vec![hit("scored", Some(0.01)), hit("unscored", None)]);
        assert_eq!(ranked[0].id.as_deref(), Some("unscored"));
        assert_eq!(ranked[0].distance, None);
    }

    #[test]
    fn test_rank_idempotent() {
        let once = rank(vec![
            hit("a", Some(0.3)),
            hit("b", None),
            hit("c", Some(0.3)),
            hit("d", Some(0.05)),
        ]);
        let twice = rank(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_absent_fields_not_serialized() {
        let json = serde_json::to_value(SearchHit {
            id: None,
            title: Some(String::new()),
            body: None,
            distance: Some(0.2),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "title": "", "distance": 0.2 }));
    }
}
