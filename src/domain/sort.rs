//! In-place partition-exchange sorting of post lists.
//!
//! The ordering contract is fixed: views descending, titles ascending without
//! regard to case, creation time descending with missing timestamps last.
//! Equal keys come out in whatever order the Lomuto partition leaves them,
//! so this is deliberately not a stable sort.

use std::cmp::Ordering;
use std::fmt;

use crate::domain::entities::PostRecord;

/// Ordering applied by [`sort_posts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSortKey {
    /// Newest first; posts without a creation time go last.
    #[default]
    Date,
    /// Most viewed first.
    Views,
    /// Alphabetical, ignoring case.
    Title,
}

impl PostSortKey {
    /// Parse a key name, ignoring case. Unknown names select [`PostSortKey::Date`].
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "views" => Self::Views,
            "title" => Self::Title,
            _ => Self::Date,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Views => "views",
            Self::Title => "title",
        }
    }

    /// Compare two posts under this key. `Less` means `a` is placed before `b`.
    pub fn compare(self, a: &PostRecord, b: &PostRecord) -> Ordering {
        match self {
            Self::Views => b.view_count.cmp(&a.view_count),
            Self::Title => compare_ignore_case(&a.title, &b.title),
            Self::Date => match (a.created_at, b.created_at) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(left), Some(right)) => right.cmp(&left),
            },
        }
    }
}

impl From<&str> for PostSortKey {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl fmt::Display for PostSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort `posts` in place by `key`.
pub fn sort_posts(posts: &mut [PostRecord], key: PostSortKey) {
    quicksort_by(posts, &mut |a: &PostRecord, b: &PostRecord| key.compare(a, b));
}

/// Lomuto quicksort driven by `compare`.
///
/// The pivot is the last element of each range and anything comparing
/// `Less` or `Equal` to it moves to the left partition. The smaller side is
/// recursed into and the larger one is handled by the loop, which keeps stack
/// depth logarithmic without changing the resulting order.
pub fn quicksort_by<T, F>(items: &mut [T], compare: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut range = items;
    while range.len() > 1 {
        let pivot = partition(range, compare);
        let (left, rest) = std::mem::take(&mut range).split_at_mut(pivot);
        let right = &mut rest[1..];
        if left.len() < right.len() {
            quicksort_by(left, compare);
            range = right;
        } else {
            quicksort_by(right, compare);
            range = left;
        }
    }
}

fn partition<T, F>(items: &mut [T], compare: &mut F) -> usize
where
    F: FnMut(&T, &T) -> Ordering,
{
    let high = items.len() - 1;
    let mut store = 0;
    for scan in 0..high {
        if compare(&items[scan], &items[high]) != Ordering::Greater {
            items.swap(store, scan);
            store += 1;
        }
    }
    items.swap(store, high);
    store
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
