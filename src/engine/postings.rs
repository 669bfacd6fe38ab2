//! Posting-list intersection used to locate records carrying two given terms.

use tantivy::schema::IndexRecordOption;
use tantivy::{DocAddress, DocId, DocSet, Searcher, TERMINATED, Term};

use crate::error::Result;

/// Documents present in both doc sets, in increasing order.
///
/// Both inputs are positioned on their first document, as engine doc sets are
/// on creation. On a mismatch the lagging side skips ahead to the other's
/// position; on a match both advance, so the walk is linear in the shorter list
/// plus the skips.
pub fn intersect<A, B>(left: &mut A, right: &mut B) -> Vec<DocId>
where
    A: DocSet,
    B: DocSet,
{
    let mut matches = Vec::new();
    let mut l = left.doc();
    let mut r = right.doc();
    while l != TERMINATED && r != TERMINATED {
        if l < r {
            l = left.seek(r);
        } else if r < l {
            r = right.seek(l);
        } else {
            matches.push(l);
            l = left.advance();
            r = right.advance();
        }
    }
    matches
}

/// Live records that carry both `first` and `second`, across every segment.
pub fn records_with_both(
    searcher: &Searcher,
    first: &Term,
    second: &Term,
) -> Result<Vec<DocAddress>> {
    let mut found = Vec::new();
    for (ord, segment) in searcher.segment_readers().iter().enumerate() {
        let first_index = segment.inverted_index(first.field())?;
        let Some(mut first_postings) =
            first_index.read_postings(first, IndexRecordOption::Basic)?
        else {
            continue;
        };
        let second_index = segment.inverted_index(second.field())?;
        let Some(mut second_postings) =
            second_index.read_postings(second, IndexRecordOption::Basic)?
        else {
            continue;
        };
        let alive = segment.alive_bitset();
        for doc in intersect(&mut first_postings, &mut second_postings) {
            if alive.is_some_and(|bits| bits.is_deleted(doc)) {
                continue;
            }
            found.push(DocAddress::new(ord as u32, doc));
        }
    }
    Ok(found)
}
