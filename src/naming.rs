//! Folder and file naming.
//!
//! Every output path the engine writes is derived here:
//!
//! ```text
//! <destination>/<job folder>/<document folder[_N]>/<document folder[_N]>_page_<NNN>.jpg
//! ```
//!
//! [`sanitize_name`] turns a display name into something every mainstream
//! filesystem accepts, [`UsedNames`] hands out collision-free folder names in
//! queue order, and [`page_filename`] pads page numbers to the digit width of
//! the document's page count so files sort correctly.

use crate::config::IMAGE_EXTENSION;
use std::collections::HashSet;

/// Name used when sanitisation leaves nothing behind.
pub const FALLBACK_NAME: &str = "untitled";

const ILLEGAL_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Make `name` safe to use as a folder or file name.
///
/// Characters illegal on common filesystems (`< > : " / \ | ? *`) become
/// `-`, then leading/trailing dots and spaces are trimmed. An empty result,
/// or a name made up only of illegal characters, dots and spaces, becomes
/// [`FALLBACK_NAME`].
///
/// The transform is idempotent.
pub fn sanitize_name(name: &str) -> String {
    let has_content = name
        .chars()
        .any(|c| !ILLEGAL_CHARS.contains(&c) && c != '.' && c != ' ');
    if !has_content {
        return FALLBACK_NAME.to_string();
    }

    let replaced: String = name
        .chars()
        .map(|c| if ILLEGAL_CHARS.contains(&c) { '-' } else { c })
        .collect();

    replaced
        .trim_matches(|c| c == '.' || c == ' ')
        .to_string()
}

/// Return `candidate` if unused, else the first free `candidate_1`,
/// `candidate_2`, …
///
/// Does not record the result; see [`UsedNames::claim`].
pub fn resolve_collision(candidate: &str, used: &HashSet<String>) -> String {
    if !used.contains(candidate) {
        return candidate.to_string();
    }

    let mut counter = 1usize;
    loop {
        let probe = format!("{candidate}_{counter}");
        if !used.contains(&probe) {
            return probe;
        }
        counter += 1;
    }
}

/// Folder names assigned so far within one run.
///
/// Scoped to a single run; nothing is persisted, so a fresh run starts from
/// an empty set regardless of what already exists on disk.
#[derive(Debug, Default, Clone)]
pub struct UsedNames {
    names: HashSet<String>,
}

impl UsedNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `candidate` against the names claimed so far and claim the
    /// result immediately.
    pub fn claim(&mut self, candidate: &str) -> String {
        let resolved = resolve_collision(candidate, &self.names);
        self.names.insert(resolved.clone());
        resolved
    }
}

/// Number of decimal digits in `n` (at least 1).
pub fn digit_width(n: usize) -> usize {
    n.max(1).to_string().len()
}

/// File name for the 1-based `page_number` of a document with `total_pages`
/// pages, written into the folder `folder_name`.
///
/// ```rust
/// use pdf2jpg::naming::page_filename;
///
/// assert_eq!(page_filename("Report", 7, 120), "Report_page_007.jpg");
/// assert_eq!(page_filename("Report", 3, 5), "Report_page_3.jpg");
/// ```
pub fn page_filename(folder_name: &str, page_number: usize, total_pages: usize) -> String {
    let width = digit_width(total_pages);
    format!("{folder_name}_page_{page_number:0width$}.{IMAGE_EXTENSION}")
}
