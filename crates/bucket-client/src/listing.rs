//! Delimited, cursor-paginated listing over a sorted key sequence.
//!
//! Backends that hold their keys locally (memory, local directory) share this routine so that
//! they page exactly like a remote store: keys and common prefixes both count against
//! `max_keys`, and the cursor is the last key or prefix handed out.

use crate::models::{ListObjectsOutput, ListObjectsRequest, ObjectSummary};

/// Page size used when a request does not set `max_keys`.
pub const DEFAULT_MAX_KEYS: u32 = 1000;

/// Build one listing page from `objects`, which must be sorted by key.
pub fn paginate<I>(objects: I, request: &ListObjectsRequest) -> ListObjectsOutput
where
    I: IntoIterator<Item = ObjectSummary>,
{
    let max_keys = request.max_keys.unwrap_or(DEFAULT_MAX_KEYS).max(1) as usize;
    let delimiter = request.delimiter.as_deref().filter(|d| !d.is_empty());
    let prefix = request.prefix.as_str();

    let mut out = ListObjectsOutput::default();
    let mut emitted = 0usize;
    let mut last: Option<String> = None;

    for object in objects {
        let Some(rest) = object.key.strip_prefix(prefix) else {
            continue;
        };

        if let Some(cursor) = request.cursor.as_deref() {
            if object.key.as_str() <= cursor {
                continue;
            }
            // A prefix cursor covers every key rolled up under it.
            if delimiter.is_some_and(|d| cursor.ends_with(d)) && object.key.starts_with(cursor) {
                continue;
            }
        }

        let rolled_up = delimiter.and_then(|d| {
            rest.find(d)
                .map(|idx| format!("{prefix}{}", &rest[..idx + d.len()]))
        });

        if let Some(common) = &rolled_up
            && out.common_prefixes.last() == Some(common)
        {
            continue;
        }

        if emitted == max_keys {
            out.is_truncated = true;
            out.next_cursor = last;
            return out;
        }
        emitted += 1;

        match rolled_up {
            Some(common) => {
                last = Some(common.clone());
                out.common_prefixes.push(common);
            }
            None => {
                last = Some(object.key.clone());
                out.objects.push(object);
            }
        }
    }

    out
}
