//! Related-content bundles computed per focal item.
//!
//! Lists are evaluated in a fixed order (tag related, recent, prev, next,
//! forward index, backward index) and every list draws from the pool left
//! over by the lists before it, so no item appears twice in one bundle.

use crate::models::{Content, ContentKind};
use std::cmp::Reverse;

/// Relation lists for one focal item, borrowing from the snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedBlocks<'a> {
    pub tag_related: Vec<&'a Content>,
    pub recent: Vec<&'a Content>,
    pub prev: Option<&'a Content>,
    pub next: Option<&'a Content>,
    pub index_forward: Vec<&'a Content>,
    pub index_backward: Vec<&'a Content>,
}

impl<'a> GeneratedBlocks<'a> {
    pub fn is_empty(&self) -> bool {
        self.tag_related.is_empty()
            && self.recent.is_empty()
            && self.prev.is_none()
            && self.next.is_none()
            && self.index_forward.is_empty()
            && self.index_backward.is_empty()
    }

    /// Every referenced item, in evaluation order
    pub fn all(&self) -> impl Iterator<Item = &'a Content> + '_ {
        self.tag_related
            .iter()
            .chain(self.recent.iter())
            .copied()
            .chain(self.prev)
            .chain(self.next)
            .chain(self.index_forward.iter().copied())
            .chain(self.index_backward.iter().copied())
    }
}

/// Snapshot positions already handed out to a list of the current bundle
struct Claimed<'f> {
    taken: Vec<bool>,
    focal: &'f Content,
}

impl<'f> Claimed<'f> {
    fn new(focal: &'f Content, len: usize) -> Self {
        Self {
            taken: vec![false; len],
            focal,
        }
    }

    fn is_free(&self, (idx, item): (usize, &Content)) -> bool {
        !self.taken[idx] && !is_same_item(item, self.focal)
    }

    fn claim_all(&mut self, items: &[(usize, &Content)]) {
        for (idx, _) in items {
            self.taken[*idx] = true;
        }
    }
}

fn is_same_item(a: &Content, b: &Content) -> bool {
    std::ptr::eq(a, b) || (!a.id.is_nil() && a.id == b.id)
}

type Ranked<'a> = (usize, &'a Content);

/// Build the relation bundle for `focal` against `snapshot`.
///
/// `max_items` caps every list; prev/next hold at most one item each.
/// Never fails: empty snapshots and focal items without tags or series
/// yield empty lists.
pub fn build_blocks<'a>(
    focal: &Content,
    snapshot: &'a [Content],
    max_items: usize,
) -> GeneratedBlocks<'a> {
    let mut blocks = GeneratedBlocks::default();
    let mut claimed = Claimed::new(focal, snapshot.len());

    if focal.kind.is_stream() {
        let related = tag_related(focal, snapshot, &claimed, max_items);
        claimed.claim_all(&related);
        blocks.tag_related = strip(related);

        let recent = recent(focal, snapshot, &claimed, max_items);
        claimed.claim_all(&recent);
        blocks.recent = strip(recent);
    }

    if let (ContentKind::Series, Some(series)) = (focal.kind, focal.series_name()) {
        let position = focal.series_position();
        let members: Vec<Ranked<'a>> = snapshot
            .iter()
            .enumerate()
            .filter(|(_, c)| c.series_name() == Some(series))
            .collect();

        let prev = members
            .iter()
            .copied()
            .filter(|m| claimed.is_free(*m) && m.1.series_position() < position)
            // max_by_key keeps the last maximum; reverse to prefer snapshot order
            .rev()
            .max_by_key(|m| m.1.series_position());
        if let Some(prev) = prev {
            claimed.claim_all(&[prev]);
            blocks.prev = Some(prev.1);
        }

        let next = members
            .iter()
            .copied()
            .filter(|m| claimed.is_free(*m) && m.1.series_position() > position)
            .min_by_key(|m| m.1.series_position());
        if let Some(next) = next {
            claimed.claim_all(&[next]);
            blocks.next = Some(next.1);
        }

        let mut forward: Vec<Ranked<'a>> = members
            .iter()
            .copied()
            .filter(|m| claimed.is_free(*m) && m.1.series_position() > position)
            .collect();
        forward.sort_by_key(|m| m.1.series_position());
        forward.truncate(max_items);
        claimed.claim_all(&forward);
        blocks.index_forward = strip(forward);

        let mut backward: Vec<Ranked<'a>> = members
            .iter()
            .copied()
            .filter(|m| claimed.is_free(*m) && m.1.series_position() < position)
            .collect();
        backward.sort_by_key(|m| Reverse(m.1.series_position()));
        backward.truncate(max_items);
        claimed.claim_all(&backward);
        blocks.index_backward = strip(backward);
    }

    blocks
}

fn strip(items: Vec<Ranked<'_>>) -> Vec<&Content> {
    items.into_iter().map(|(_, c)| c).collect()
}

fn same_stream(focal: &Content, candidate: &Content) -> bool {
    candidate.section_id == focal.section_id && candidate.kind == focal.kind
}

fn tag_related<'a>(
    focal: &Content,
    snapshot: &'a [Content],
    claimed: &Claimed<'_>,
    max_items: usize,
) -> Vec<Ranked<'a>> {
    if focal.tags.is_empty() {
        return Vec::new();
    }
    snapshot
        .iter()
        .enumerate()
        .filter(|m| claimed.is_free(*m) && same_stream(focal, m.1) && focal.shares_tag_with(m.1))
        .take(max_items)
        .collect()
}

fn recent<'a>(
    focal: &Content,
    snapshot: &'a [Content],
    claimed: &Claimed<'_>,
    max_items: usize,
) -> Vec<Ranked<'a>> {
    let mut candidates: Vec<Ranked<'a>> = snapshot
        .iter()
        .enumerate()
        .filter(|m| claimed.is_free(*m) && same_stream(focal, m.1))
        .collect();
    // Stable sort: equal dates keep snapshot order, unpublished go last.
    candidates.sort_by_key(|m| (m.1.published_at.is_none(), Reverse(m.1.published_at)));
    candidates.truncate(max_items);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tag;
    use std::collections::HashSet;
    use uuid::Uuid;
    use chrono::{TimeZone, Utc};

    fn article(heading: &str, section: Uuid, tags: &[&str], day: Option<u32>) -> Content {
        let mut c = Content::new(ContentKind::Article, heading);
        c.section_id = section;
        c.tags = tags.iter().map(|t| Tag::new(*t)).collect();
        c.published_at = day.map(|d| Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap());
        c
    }

    fn part(series: &str, order: i64) -> Content {
        let mut c = Content::new(ContentKind::Series, format!("{series} {order}"));
        c.series = Some(series.to_string());
        c.series_order = Some(order);
        c
    }

    fn headings(items: &[&Content]) -> Vec<String> {
        items.iter().map(|c| c.heading.clone()).collect()
    }

    fn assert_disjoint(blocks: &GeneratedBlocks<'_>, focal: &Content) {
        let mut seen = HashSet::new();
        for item in blocks.all() {
            assert_ne!(item.id, focal.id, "focal item referenced itself");
            assert!(seen.insert(item.id), "{} listed twice", item.heading);
        }
    }

    #[test]
    fn test_tag_related_and_recent_are_disjoint() {
        let section = Uuid::new_v4();
        let snapshot = vec![
            article("focal", section, &["rust"], Some(5)),
            article("tagged-old", section, &["rust", "web"], Some(1)),
            article("untagged-new", section, &["go"], Some(9)),
            article("tagged-new", section, &["rust"], Some(8)),
            article("unpublished", section, &[], None),
            article("other-section", Uuid::new_v4(), &["rust"], Some(7)),
        ];
        let focal = &snapshot[0];

        let blocks = build_blocks(focal, &snapshot, 5);
        assert_eq!(headings(&blocks.tag_related), vec!["tagged-old", "tagged-new"]);
        assert_eq!(headings(&blocks.recent), vec!["untagged-new", "unpublished"]);
        assert!(blocks.prev.is_none());
        assert_disjoint(&blocks, focal);
    }

    #[test]
    fn test_recent_orders_by_date_then_snapshot() {
        let section = Uuid::new_v4();
        let snapshot = vec![
            article("focal", section, &[], Some(1)),
            article("a-none", section, &[], None),
            article("b-3", section, &[], Some(3)),
            article("c-7", section, &[], Some(7)),
            article("d-3", section, &[], Some(3)),
        ];
        let blocks = build_blocks(&snapshot[0], &snapshot, 10);
        assert_eq!(headings(&blocks.recent), vec!["c-7", "b-3", "d-3", "a-none"]);
    }

    #[test]
    fn test_lists_are_capped() {
        let section = Uuid::new_v4();
        let mut snapshot = vec![article("focal", section, &["x"], Some(1))];
        for i in 0..6 {
            snapshot.push(article(&format!("t{i}"), section, &["x"], Some(2)));
            snapshot.push(article(&format!("r{i}"), section, &[], Some(3)));
        }
        let blocks = build_blocks(&snapshot[0], &snapshot, 3);
        assert_eq!(headings(&blocks.tag_related), vec!["t0", "t1", "t2"]);
        assert_eq!(blocks.recent.len(), 3);
        assert_disjoint(&blocks, &snapshot[0]);

        let none = build_blocks(&snapshot[0], &snapshot, 0);
        assert!(none.is_empty());
    }

    #[test]
    fn test_kind_must_match() {
        let section = Uuid::new_v4();
        let mut blog = article("blog post", section, &["x"], Some(2));
        blog.kind = ContentKind::Blog;
        let snapshot = vec![article("focal", section, &["x"], Some(1)), blog];
        let blocks = build_blocks(&snapshot[0], &snapshot, 5);
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_series_navigation() {
        let snapshot = vec![
            part("rust", 1),
            part("rust", 2),
            part("rust", 3),
            part("rust", 4),
            part("rust", 5),
            part("other", 2),
        ];
        let focal = &snapshot[2];
        let blocks = build_blocks(focal, &snapshot, 5);

        assert_eq!(blocks.prev.map(|c| c.heading.as_str()), Some("rust 2"));
        assert_eq!(blocks.next.map(|c| c.heading.as_str()), Some("rust 4"));
        assert_eq!(headings(&blocks.index_forward), vec!["rust 5"]);
        assert_eq!(headings(&blocks.index_backward), vec!["rust 1"]);
        assert!(blocks.tag_related.is_empty());
        assert_disjoint(&blocks, focal);
    }

    #[test]
    fn test_series_indexes_capped_and_closest_first() {
        // Snapshot order deliberately differs from series order
        let snapshot: Vec<Content> = [9, 2, 7, 5, 1, 8, 3, 6, 4]
            .iter()
            .map(|order| {
                let mut c = part("tour", *order);
                c.heading = format!("p{order}");
                c
            })
            .collect();
        let focal = &snapshot[3];
        assert_eq!(focal.heading, "p5");

        let blocks = build_blocks(focal, &snapshot, 2);
        assert_eq!(blocks.prev.map(|c| c.heading.as_str()), Some("p4"));
        assert_eq!(blocks.next.map(|c| c.heading.as_str()), Some("p6"));
        assert_eq!(headings(&blocks.index_forward), vec!["p7", "p8"]);
        assert_eq!(headings(&blocks.index_backward), vec!["p3", "p2"]);
        assert_disjoint(&blocks, focal);
    }

    #[test]
    fn test_series_ends_have_no_neighbour() {
        let snapshot = vec![part("s", 3), part("s", 1), part("s", 2)];
        let first = build_blocks(&snapshot[1], &snapshot, 5);
        assert!(first.prev.is_none());
        assert_eq!(first.next.map(|c| c.heading.as_str()), Some("s 2"));
        assert_eq!(headings(&first.index_forward), vec!["s 3"]);
        assert!(first.index_backward.is_empty());

        let last = build_blocks(&snapshot[0], &snapshot, 5);
        assert!(last.next.is_none());
        assert_eq!(last.prev.map(|c| c.heading.as_str()), Some("s 2"));
        assert_eq!(headings(&last.index_backward), vec!["s 1"]);
    }

    #[test]
    fn test_series_ties_prefer_snapshot_order() {
        let mut snapshot = vec![part("s", 5), part("s", 2), part("s", 2), part("s", 9)];
        snapshot[1].heading = "first two".into();
        snapshot[2].heading = "second two".into();
        let blocks = build_blocks(&snapshot[0], &snapshot, 5);
        assert_eq!(blocks.prev.map(|c| c.heading.as_str()), Some("first two"));
        assert_eq!(headings(&blocks.index_backward), vec!["second two"]);
    }

    #[test]
    fn test_series_without_name_or_wrong_kind() {
        let mut nameless = part("", 1);
        nameless.series = Some("   ".into());
        let snapshot = vec![nameless, part("s", 2)];
        assert!(build_blocks(&snapshot[0], &snapshot, 5).is_empty());

        let mut blog = part("s", 1);
        blog.kind = ContentKind::Page;
        let snapshot = vec![blog, part("s", 2)];
        assert!(build_blocks(&snapshot[0], &snapshot, 5).is_empty());
    }

    #[test]
    fn test_empty_snapshot() {
        let focal = article("alone", Uuid::new_v4(), &["x"], Some(1));
        assert!(build_blocks(&focal, &[], 5).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let section = Uuid::new_v4();
        let snapshot: Vec<Content> = (0..12u32)
            .map(|i| {
                let tags: &[&str] = if i % 2 == 0 { &["x"] } else { &[] };
                article(&format!("a{i}"), section, tags, Some(1 + i % 3))
            })
            .collect();
        let first = build_blocks(&snapshot[0], &snapshot, 4);
        for _ in 0..10 {
            assert_eq!(build_blocks(&snapshot[0], &snapshot, 4), first);
        }
    }
}
