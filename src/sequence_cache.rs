//! A thread-safe, compute-once cache of parsed [AnimationSequence]s keyed by
//! source file name.
//!
//! Trials that share an animation file share one parse. The cache is an
//! ordinary value: whoever owns the experiment session creates one and hands
//! it to everything that loads animations.

use crate::animation_parser::{AnimationParser, ParseError};
use crate::animation_sequence::AnimationSequence;

use log::{debug, info};
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// A per-key slot. Holding its lock means "this key is being parsed".
type Slot = Arc<Mutex<Option<Arc<AnimationSequence>>>>;

/// Maps source names to shared sequences.
///
/// Concurrent requests for the same key block on a single computation
/// instead of racing. A failed computation leaves nothing behind, so the next
/// request tries again.
#[derive(Debug, Default)]
pub struct SequenceCache {
    parser: AnimationParser,
    slots: Mutex<HashMap<String, Slot>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SequenceCache {
    /// An empty cache that parses with `parser`.
    pub fn new(parser: AnimationParser) -> Self {
        SequenceCache {
            parser,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached sequence for the file name of `path`, parsing the
    /// file on first use. `aspect_ratio` only matters for that first parse.
    pub fn get_or_parse(
        &self,
        path: impl AsRef<Path>,
        aspect_ratio: Option<f32>,
    ) -> Result<Arc<AnimationSequence>, ParseError> {
        let path = path.as_ref();
        let key = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.get_or_try_insert_with(&key, || {
            info!("{} : parsing {}", key, path.display());
            self.parser.aspect_ratio(aspect_ratio).parse_file(path)
        })
    }

    /// Returns the sequence under `key`, running `make` to build it if there
    /// is none. Only one `make` runs per key at a time.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &str,
        make: impl FnOnce() -> Result<AnimationSequence, E>,
    ) -> Result<Arc<AnimationSequence>, E> {
        let slot = Arc::clone(lock(&self.slots).entry(key.to_owned()).or_default());

        // the map lock is released; only callers for this key wait here
        let mut entry = lock(&slot);
        if let Some(sequence) = entry.as_ref() {
            debug!("{} : cache hit", key);
            return Ok(Arc::clone(sequence));
        }

        match make() {
            Ok(sequence) => {
                let sequence = Arc::new(sequence);
                *entry = Some(Arc::clone(&sequence));
                Ok(sequence)
            }
            Err(error) => {
                drop(entry);
                self.forget_empty(key, &slot);
                Err(error)
            }
        }
    }

    /// Drops the slot for `key` after a failed computation, unless another
    /// caller is already waiting on it.
    fn forget_empty(&self, key: &str, slot: &Slot) {
        let mut slots = lock(&self.slots);
        // one reference in the map, one held by the caller
        let unused = slots
            .get(key)
            .map_or(false, |s| Arc::ptr_eq(s, slot) && Arc::strong_count(slot) == 2);
        if unused {
            slots.remove(key);
        }
    }

    /// The cached sequence under `key`, if it has been parsed.
    pub fn get(&self, key: &str) -> Option<Arc<AnimationSequence>> {
        let slot = lock(&self.slots).get(key).cloned()?;
        let entry = lock(&slot);
        entry.clone()
    }

    /// Stores `sequence` under its source name, replacing any earlier entry.
    pub fn insert(&self, sequence: AnimationSequence) -> Arc<AnimationSequence> {
        let sequence = Arc::new(sequence);
        let slot = Arc::new(Mutex::new(Some(Arc::clone(&sequence))));
        lock(&self.slots).insert(sequence.source_name().to_owned(), slot);
        sequence
    }

    /// The number of parsed sequences held.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = lock(&self.slots).values().cloned().collect();
        slots.iter().filter(|slot| lock(slot).is_some()).count()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry. Sequences already handed out stay alive.
    pub fn clear(&self) {
        lock(&self.slots).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn parses_once_per_file_name() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0 1 1\n1 2 2").unwrap();

        let cache = SequenceCache::default();
        let a = cache.get_or_parse(file.path(), None).unwrap();
        let b = cache.get_or_parse(file.path(), Some(2.0)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.point_aspect(), 1.0);
        assert_eq!(cache.len(), 1);

        let key = a.source_name().to_owned();
        assert!(cache.get(&key).is_some());
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn failures_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.txt");
        let cache = SequenceCache::default();

        assert!(matches!(
            cache.get_or_parse(&path, None),
            Err(ParseError::NotFound(_))
        ));
        assert!(cache.is_empty());
        assert!(lock(&cache.slots).is_empty());

        std::fs::write(&path, "0 1 1\n").unwrap();
        let seq = cache.get_or_parse(&path, None).unwrap();
        assert_eq!(seq.num_frames(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_requests_share_one_parse() {
        let cache = Arc::new(SequenceCache::default());
        let parses = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let parses = Arc::clone(&parses);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_try_insert_with("shared", || {
                            parses.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(std::time::Duration::from_millis(20));
                            Ok::<_, ParseError>(
                                AnimationParser::new().parse_str("shared", "0 1 1\n"),
                            )
                        })
                        .unwrap()
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(parses.load(Ordering::SeqCst), 1);
        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn failed_keys_leave_no_slots() {
        let cache = SequenceCache::default();
        for i in 0..10 {
            let result = cache.get_or_try_insert_with(&format!("missing-{}", i), || {
                Err::<AnimationSequence, _>(ParseError::NotFound(format!("missing-{}", i).into()))
            });
            assert!(result.is_err());
        }
        assert!(lock(&cache.slots).is_empty());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn insert_replaces_by_source_name() {
        let cache = SequenceCache::new(AnimationParser::new());
        let first = cache.insert(AnimationParser::new().parse_str("walk", "0 1 1\n"));
        let second = cache.insert(AnimationParser::new().parse_str("walk", "0 1 1\n1 2 2\n"));
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.get("walk").unwrap().num_frames(), 2);
    }
}
