use dashmap::DashSet;
use url::Url;

/// Set of normalized URLs already scheduled for fetching in this run
///
/// The set only grows. [`VisitedSet::try_mark`] is a single atomic
/// check-and-set, so two workers discovering the same URL can never both
/// win it.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: DashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `url`, returning true only on its first call in this run
    pub fn try_mark(&self, url: &Url) -> bool {
        self.seen.insert(url.to_string())
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.seen.contains(url.as_str())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_first_mark_wins() {
        let visited = VisitedSet::new();
        let page = url("https://tabelog.com/tokyo");

        assert!(visited.try_mark(&page));
        assert!(!visited.try_mark(&page));
        assert!(!visited.try_mark(&page));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_distinct_urls() {
        let visited = VisitedSet::new();
        assert!(visited.try_mark(&url("https://tabelog.com/tokyo/rstLst/1")));
        assert!(visited.try_mark(&url("https://tabelog.com/tokyo/rstLst/2")));
        assert_eq!(visited.len(), 2);
        assert!(visited.contains(&url("https://tabelog.com/tokyo/rstLst/1")));
        assert!(!visited.contains(&url("https://tabelog.com/tokyo/rstLst/3")));
    }

    #[test]
    fn test_empty() {
        let visited = VisitedSet::new();
        assert!(visited.is_empty());
        visited.try_mark(&url("https://tabelog.com/tokyo"));
        assert!(!visited.is_empty());
    }

    #[test]
    fn test_concurrent_marks_succeed_once() {
        let visited = Arc::new(VisitedSet::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let visited = Arc::clone(&visited);
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|i| {
                            visited.try_mark(&url(&format!(
                                "https://tabelog.com/tokyo/rstLst/{}",
                                i
                            )))
                        })
                        .count()
                })
            })
            .collect();

        let wins: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(wins, 100);
        assert_eq!(visited.len(), 100);
    }
}
