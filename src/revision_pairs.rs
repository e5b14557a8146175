//! Regrouping of the revision stream into adjacent revisions of the same page.

use std::{iter::FusedIterator, sync::Arc};

use crate::dump_parser::RevisionRecord;

/// Two consecutive text-carrying revisions of one page.
#[derive(Debug, Clone)]
pub struct RevisionPair {
    pub old: Arc<RevisionRecord>,
    pub new: Arc<RevisionRecord>,
}

impl RevisionPair {
    pub fn old_text(&self) -> &str {
        self.old.text.as_deref().unwrap_or_default()
    }

    pub fn new_text(&self) -> &str {
        self.new.text.as_deref().unwrap_or_default()
    }
}

fn same_page(a: &RevisionRecord, b: &RevisionRecord) -> bool {
    match (a.page.id, b.page.id) {
        (Some(a), Some(b)) => a == b,
        // without ids only the shared page header tells pages apart
        _ => Arc::ptr_eq(&a.page, &b.page),
    }
}

/// Iterator adapter yielding [`RevisionPair`]s from a stream of revisions.
///
/// Holds only the previous revision. Revisions without text are skipped before they reach the
/// lookback buffer, so they never take part in a pair. Errors are passed through.
pub struct RevisionPairs<I> {
    records: I,
    previous: Option<Arc<RevisionRecord>>,
}

impl<I> RevisionPairs<I> {
    pub fn new(records: I) -> Self {
        Self {
            records,
            previous: None,
        }
    }
}

impl<I, E> Iterator for RevisionPairs<I>
where
    I: Iterator<Item = Result<RevisionRecord, E>>,
{
    type Item = Result<RevisionPair, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e)),
            };

            if !current.has_text() {
                tracing::trace!(
                    message = "Skipping revision without text",
                    revision_id = current.id,
                    page_id = current.page.id
                );
                continue;
            }

            let current = Arc::new(current);
            match self.previous.replace(current.clone()) {
                Some(previous) if same_page(&previous, &current) => {
                    return Some(Ok(RevisionPair {
                        old: previous,
                        new: current,
                    }));
                }
                _ => {}
            }
        }
    }
}

impl<I, E> FusedIterator for RevisionPairs<I> where
    I: FusedIterator<Item = Result<RevisionRecord, E>>
{
}

pub trait RevisionPairsExt: Sized {
    fn revision_pairs(self) -> RevisionPairs<Self>;
}

impl<I, E> RevisionPairsExt for I
where
    I: Iterator<Item = Result<RevisionRecord, E>>,
{
    fn revision_pairs(self) -> RevisionPairs<Self> {
        RevisionPairs::new(self)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Weak;

    use super::*;
    use crate::dump_parser::{DumpError, DumpReader, PageInfo};
    use crate::test_support::prelude::*;

    fn record(page: &Arc<PageInfo>, id: u64, text: Option<&str>) -> RevisionRecord {
        RevisionRecord {
            id: Some(id),
            text: text.map(str::to_string),
            page: page.clone(),
            ..dummy_revision()
        }
    }

    fn page(id: Option<u64>) -> Arc<PageInfo> {
        Arc::new(PageInfo {
            id,
            title: "Test".into(),
            namespace: Some(0),
        })
    }

    fn pair_ids(records: Vec<RevisionRecord>) -> Vec<(u64, u64)> {
        records
            .into_iter()
            .map(Ok::<_, ()>)
            .revision_pairs()
            .map(|pair| {
                let pair = pair.unwrap();
                (pair.old.id.unwrap(), pair.new.id.unwrap())
            })
            .collect()
    }

    #[test]
    fn test_pairs_within_pages_only() {
        let a = page(Some(1));
        let b = page(Some(2));
        let records = vec![
            record(&a, 10, Some("x")),
            record(&a, 11, Some("y")),
            record(&a, 12, Some("z")),
            record(&b, 20, Some("x")),
            record(&b, 21, Some("y")),
        ];
        assert_eq!(pair_ids(records), vec![(10, 11), (11, 12), (20, 21)]);
    }

    #[test]
    fn test_single_revision_page_gives_no_pair() {
        let a = page(Some(1));
        let b = page(Some(2));
        let records = vec![record(&a, 10, Some("x")), record(&b, 20, Some("y"))];
        assert!(pair_ids(records).is_empty());
    }

    #[test]
    fn test_revisions_without_text_are_excluded() {
        let a = page(Some(1));
        let records = vec![
            record(&a, 10, Some("x")),
            record(&a, 11, None),
            record(&a, 12, Some("z")),
            record(&a, 13, None),
        ];
        assert_eq!(pair_ids(records), vec![(10, 12)]);
    }

    #[test]
    fn test_pages_without_ids_compare_by_identity() {
        let a = page(None);
        let b = page(None);
        let records = vec![
            record(&a, 10, Some("x")),
            record(&b, 20, Some("y")),
            record(&b, 21, Some("z")),
        ];
        assert_eq!(pair_ids(records), vec![(20, 21)]);
    }

    #[test]
    fn test_errors_pass_through() {
        let a = page(Some(1));
        let records: Vec<Result<RevisionRecord, &str>> = vec![
            Ok(record(&a, 10, Some("x"))),
            Ok(record(&a, 11, Some("y"))),
            Err("broken"),
        ];
        let results: Vec<_> = records.into_iter().revision_pairs().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err(), &"broken");
    }

    #[test]
    fn test_live_records_stay_bounded() {
        let pages: Vec<TestPage> = (0..20)
            .map(|page_id| TestPage::new(page_id, (0..30).map(|_| "Some text.".to_string())))
            .collect();
        let xml = dump_to_xml(&pages);

        let mut seen: Vec<Weak<RevisionRecord>> = Vec::new();
        let mut num_pairs = 0;
        for pair in DumpReader::new(xml.as_bytes()).revision_pairs() {
            let pair: RevisionPair = pair.unwrap();
            let old = Arc::downgrade(&pair.old);
            if !seen.iter().any(|w| w.ptr_eq(&old)) {
                seen.push(old);
            }
            seen.push(Arc::downgrade(&pair.new));
            num_pairs += 1;

            // the pair itself plus the lookback buffer
            let live = seen.iter().filter(|w| w.strong_count() > 0).count();
            assert!(live <= 2, "{live} records alive");
            seen.retain(|w| w.strong_count() > 0);
        }
        assert_eq!(num_pairs, 20 * 29);
    }

    proptest! {
        #[test]
        fn test_pair_count_per_page(revisions_per_page in prop::collection::vec(0usize..6, 0..12)) {
            let pages: Vec<TestPage> = revisions_per_page
                .iter()
                .enumerate()
                .map(|(page_id, &k)| TestPage::new(page_id as u64, (0..k).map(|i| format!("Revision {i}."))))
                .collect();
            let xml = dump_to_xml(&pages);

            let pairs: Vec<RevisionPair> = DumpReader::new(xml.as_bytes())
                .revision_pairs()
                .collect::<Result<_, DumpError>>()
                .unwrap();

            let expected: usize = revisions_per_page.iter().map(|&k| k.saturating_sub(1)).sum();
            prop_assert_eq!(pairs.len(), expected);
            for pair in &pairs {
                prop_assert_eq!(pair.old.page.id, pair.new.page.id);
                prop_assert!(pair.old.id < pair.new.id);
            }
        }
    }
}
