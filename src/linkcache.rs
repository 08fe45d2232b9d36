//! Link resolution cache.
//!
//! Shortening a drill-down URL costs a network round trip and a row in
//! the shortening service's database, so resolved short links are reused
//! across report runs. Each report scope (the query URL that owns the
//! drill-down links) gets one cache file named by the scope's content
//! hash, holding a JSON map of categorical key -> short URL.
//!
//! The scheduler may run several reports over the same scope at
//! overlapping times as separate processes, so the whole read-modify-
//! write cycle holds an exclusive lock on a sidecar lock file. A process
//! that cannot take the lock waits; it never skips caching. The data
//! file itself is replaced atomically (temp file + rename) so a crashed
//! writer leaves the previous contents intact.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::{debug, warn};

/// On-disk cache of scope -> (categorical key -> short URL).
pub struct LinkCache {
    dir: PathBuf,
}

impl LinkCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LinkCache { dir: dir.into() }
    }

    /// Cache file for one scope, named by the scope's content hash.
    fn scope_file(&self, scope: &str) -> PathBuf {
        let key = blake3::hash(scope.as_bytes()).to_hex().to_string();
        self.dir.join(format!("{}.json", key))
    }

    /// Resolve every key in `wanted` (key -> long URL) to a short URL,
    /// reusing cached entries and calling `shorten` once per key that is
    /// missing or was left empty by an earlier failed run.
    ///
    /// Returns the full mapping for this scope. Unresolved keys map to an
    /// empty string: stored so the next run retries them, never treated
    /// as a permanent negative result.
    pub fn resolve<F>(
        &self,
        scope: &str,
        wanted: &BTreeMap<String, String>,
        mut shorten: F,
    ) -> io::Result<BTreeMap<String, String>>
    where
        F: FnMut(&str) -> Option<String>,
    {
        fs::create_dir_all(&self.dir)?;

        let path = self.scope_file(scope);
        let lock_path = path.with_extension("json.lock");

        // Exclusive across processes for the whole read-modify-write.
        let lock_file = OpenOptions::new().create(true).write(true).open(&lock_path)?;
        lock_file.lock_exclusive()?;

        let mut cache = load_cache(&path);
        let known = cache.len();

        let mut misses = 0usize;
        for (key, long_url) in wanted {
            let unresolved = cache.get(key).map_or(true, String::is_empty);
            if unresolved {
                misses += 1;
                cache.insert(key.clone(), shorten(long_url).unwrap_or_default());
            }
        }

        debug!(
            "link cache {}: {} known, {} resolved this run",
            path.display(),
            known,
            misses
        );

        if misses > 0 {
            write_atomically(&path, &cache)?;
        }

        // The lock releases when lock_file drops.
        Ok(cache)
    }
}

fn load_cache(path: &Path) -> BTreeMap<String, String> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            warn!("cannot read link cache {}: {}", path.display(), e);
            return BTreeMap::new();
        }
    };
    match serde_json::from_str(&text) {
        Ok(map) => map,
        Err(e) => {
            warn!("link cache {} is corrupt, starting over: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}

/// Write to a temp file, then rename over the old contents.
fn write_atomically(path: &Path, cache: &BTreeMap<String, String>) -> io::Result<()> {
    let temp = path.with_extension("json.tmp");
    let mut file = File::create(&temp)?;
    file.write_all(serde_json::to_string_pretty(cache)?.as_bytes())?;
    file.flush()?;
    drop(file);
    fs::rename(&temp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn wanted(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn resolves_and_persists_new_keys() {
        let dir = TempDir::new().unwrap();
        let cache = LinkCache::new(dir.path());

        let map = cache
            .resolve(
                "https://bugs.example/query?id=1",
                &wanted(&[("component=vsan", "https://bugs.example/query?id=1&component=vsan")]),
                |_| Some("https://s.example/abc".to_string()),
            )
            .unwrap();

        assert_eq!(map["component=vsan"], "https://s.example/abc");
        // The mapping survives on disk for the next run.
        let files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().into_string().unwrap())
            .collect();
        assert!(files.iter().any(|f| f.ends_with(".json")), "no cache file in {:?}", files);
    }

    #[test]
    fn second_resolve_makes_no_shortener_calls() {
        let dir = TempDir::new().unwrap();
        let cache = LinkCache::new(dir.path());
        let scope = "https://bugs.example/query?id=2";
        let keys = wanted(&[("component=vsan", "https://bugs.example/a"), ("Total", "https://bugs.example/b")]);

        let mut calls = 0;
        cache
            .resolve(scope, &keys, |_| {
                calls += 1;
                Some("https://s.example/abc".to_string())
            })
            .unwrap();
        assert_eq!(calls, 2);

        let map = cache
            .resolve(scope, &keys, |_| {
                calls += 1;
                Some("https://s.example/other".to_string())
            })
            .unwrap();
        assert_eq!(calls, 2, "cached keys must not call the shortener again");
        assert_eq!(map["component=vsan"], "https://s.example/abc");
    }

    #[test]
    fn failed_keys_are_stored_empty_and_retried_next_run() {
        let dir = TempDir::new().unwrap();
        let cache = LinkCache::new(dir.path());
        let scope = "https://bugs.example/query?id=3";
        let keys = wanted(&[("component=vsan", "https://bugs.example/a")]);

        let map = cache.resolve(scope, &keys, |_| None).unwrap();
        assert_eq!(map["component=vsan"], "");

        // The empty entry is retryable, not a negative cache.
        let map = cache
            .resolve(scope, &keys, |_| Some("https://s.example/ok".to_string()))
            .unwrap();
        assert_eq!(map["component=vsan"], "https://s.example/ok");
    }

    #[test]
    fn one_failed_key_does_not_stop_the_others() {
        let dir = TempDir::new().unwrap();
        let cache = LinkCache::new(dir.path());
        let keys = wanted(&[("a=1", "https://l.example/1"), ("b=2", "https://l.example/2")]);

        let map = cache
            .resolve("scope", &keys, |long| {
                if long.ends_with('1') { None } else { Some("https://s.example/2".to_string()) }
            })
            .unwrap();
        assert_eq!(map["a=1"], "");
        assert_eq!(map["b=2"], "https://s.example/2");
    }

    #[test]
    fn corrupt_cache_file_is_replaced_not_fatal() {
        let dir = TempDir::new().unwrap();
        let cache = LinkCache::new(dir.path());
        let scope = "https://bugs.example/query?id=4";

        // Seed, then corrupt the file in place.
        let keys = wanted(&[("a=1", "https://l.example/1")]);
        cache.resolve(scope, &keys, |_| Some("https://s.example/x".to_string())).unwrap();
        let path = cache.scope_file(scope);
        fs::write(&path, "{ not json").unwrap();

        let map = cache
            .resolve(scope, &keys, |_| Some("https://s.example/y".to_string()))
            .unwrap();
        assert_eq!(map["a=1"], "https://s.example/y");
    }

    #[test]
    fn scopes_do_not_share_cache_files() {
        let dir = TempDir::new().unwrap();
        let cache = LinkCache::new(dir.path());
        let keys = wanted(&[("a=1", "https://l.example/1")]);

        cache.resolve("scope-one", &keys, |_| Some("https://s.example/1".to_string())).unwrap();
        let mut calls = 0;
        cache
            .resolve("scope-two", &keys, |_| {
                calls += 1;
                Some("https://s.example/2".to_string())
            })
            .unwrap();
        assert_eq!(calls, 1, "a different scope starts from an empty cache");
    }
}
