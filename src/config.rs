/// Configuration resolution module
///
/// This module turns validated CLI arguments into the immutable context a
/// report run needs: the link cache location, the optional shortener
/// client, and the pagination budget. The per-source drivers receive the
/// context by reference; nothing here is global.
use std::collections::BTreeMap;

use log::{debug, warn};

use crate::cli::{self, CliArgs};
use crate::linkcache::LinkCache;
use crate::paginate::PageOptions;
use crate::shorten::ShortenClient;

/// Everything a driver needs besides its own subcommand arguments.
pub struct ReportContext {
    cache: LinkCache,
    shortener: Option<ShortenClient>,
    pub page_limit: usize,
    pub plain: bool,
}

/// Build a `ReportContext` from CLI arguments.
pub fn build_context(args: &CliArgs) -> Result<ReportContext, String> {
    let cache_dir =
        args.cache_dir.clone().unwrap_or_else(|| cli::default_cache_dir().join("link-cache"));
    debug!("link cache directory: {}", cache_dir.display());

    let shortener = args
        .shorten_api
        .clone()
        .map(|api| ShortenClient::new(api, args.shorten_user.clone()));
    if shortener.is_none() {
        debug!("no shortening endpoint configured; only cached links will render");
    }

    Ok(ReportContext {
        cache: LinkCache::new(cache_dir),
        shortener,
        page_limit: args.page_limit,
        plain: args.plain,
    })
}

impl ReportContext {
    /// Pagination settings for the chat transport: fenced, bannered, and
    /// bounded by the configured page limit.
    pub fn page_options(&self) -> PageOptions {
        PageOptions { limit: self.page_limit, fenced: true, banners: true }
    }

    /// Resolve `wanted` (key -> long URL) through the persisted cache.
    ///
    /// Cache trouble (unreadable directory, lock failure) degrades to an
    /// unlinked report rather than failing the run: the counts are the
    /// report, the links are decoration.
    pub fn resolve_links(
        &self,
        scope: &str,
        wanted: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        if wanted.is_empty() {
            return BTreeMap::new();
        }
        let shorten = |long_url: &str| {
            self.shortener.as_ref().and_then(|client| client.shorten(long_url))
        };
        match self.cache.resolve(scope, wanted, shorten) {
            Ok(map) => map,
            Err(e) => {
                warn!("link cache unavailable for {}: {}", scope, e);
                BTreeMap::new()
            }
        }
    }
}
