//! Report paginator - splits rendered lines into transport-sized pages.
//!
//! The messaging transport rejects messages over ~4000 characters, so a
//! long report is delivered as several pages. Packing is greedy and
//! order-preserving: lines are never reordered, split, or dropped, which
//! gives the round-trip guarantee that concatenating all pages (minus
//! banners and fences) reproduces the rendered report exactly.

use log::debug;

/// Page budget in characters, with headroom under the transport's ~4000
/// character message limit.
pub const MAX_PAGE_CHARS: usize = 3900;

const FENCE: &str = "```";

/// Room reserved for a `Page (i/N)` banner line. The page count is only
/// known after packing, so the reserve is fixed rather than measured.
const BANNER_RESERVE: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct PageOptions {
    /// Character budget per finished page, banner and fences included.
    pub limit: usize,
    /// Wrap each page in a fixed-width code fence.
    pub fenced: bool,
    /// Prefix each page with `Page (i/N)` when more than one page forms.
    pub banners: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        PageOptions { limit: MAX_PAGE_CHARS, fenced: true, banners: true }
    }
}

/// Split `lines` into pages that fit `opts.limit`.
///
/// Each line costs its character count plus one separator. A single line
/// longer than the remaining budget gets a page of its own and may exceed
/// the limit; the content is never truncated, the oversize page is the
/// accepted trade-off.
///
/// Empty input produces one empty page; the "no content" text on it is
/// the caller's concern.
pub fn paginate(lines: &[String], opts: &PageOptions) -> Vec<String> {
    let fence_overhead = if opts.fenced { 2 * (FENCE.len() + 1) } else { 0 };
    let banner_overhead = if opts.banners { BANNER_RESERVE } else { 0 };
    let budget = opts.limit.saturating_sub(fence_overhead + banner_overhead);

    let mut bodies: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for line in lines {
        let cost = line.chars().count() + 1;
        if !current.is_empty() && current_len + cost > budget {
            bodies.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push(line);
        current_len += cost;
    }
    if !current.is_empty() || bodies.is_empty() {
        bodies.push(current);
    }

    let total = bodies.len();
    if total > 1 {
        debug!("report split into {} pages (budget {} chars)", total, budget);
    }

    // Banners carry the final page count, so they go on in a second pass.
    bodies
        .into_iter()
        .enumerate()
        .map(|(i, body)| {
            let mut page = body.join("\n");
            if opts.fenced {
                page = format!("{}\n{}\n{}", FENCE, page, FENCE);
            }
            if opts.banners && total > 1 {
                page = format!("Page ({}/{})\n{}", i + 1, total, page);
            }
            page
        })
        .collect()
}
