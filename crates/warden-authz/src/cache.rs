// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory TTL cache for permission decisions.
//!
//! Entries are purged lazily: an expired entry is removed when it is next
//! looked up, or when space is needed for an insert. Nothing runs in the
//! background.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use warden_authz_core::ProviderError;

use crate::providers::CacheProvider;

pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
	pub size: usize,
	pub hits: u64,
	pub misses: u64,
	/// `hits / (hits + misses)`, `0.0` before the first lookup.
	pub hit_rate: f64,
	/// Time since the cache was created or last fully cleared.
	pub age: Duration,
}

impl CacheStats {
	pub fn new(size: usize, hits: u64, misses: u64, age: Duration) -> Self {
		let total = hits + misses;
		let hit_rate = if total == 0 {
			0.0
		} else {
			hits as f64 / total as f64
		};
		Self {
			size,
			hits,
			misses,
			hit_rate,
			age,
		}
	}
}

#[derive(Debug, Clone)]
struct CacheEntry {
	value: bool,
	inserted_at: Instant,
	ttl: Option<Duration>,
}

impl CacheEntry {
	fn is_expired(&self, now: Instant) -> bool {
		self
			.ttl
			.is_some_and(|ttl| now.saturating_duration_since(self.inserted_at) > ttl)
	}
}

/// Process-local cache backed by a `HashMap` behind a read-write lock.
#[derive(Debug)]
pub struct MemoryCache {
	entries: RwLock<HashMap<String, CacheEntry>>,
	max_entries: usize,
	hits: AtomicU64,
	misses: AtomicU64,
	created_at: RwLock<Instant>,
}

impl Default for MemoryCache {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryCache {
	pub fn new() -> Self {
		Self::with_max_entries(DEFAULT_MAX_ENTRIES)
	}

	pub fn with_max_entries(max_entries: usize) -> Self {
		Self {
			entries: RwLock::new(HashMap::new()),
			max_entries: max_entries.max(1),
			hits: AtomicU64::new(0),
			misses: AtomicU64::new(0),
			created_at: RwLock::new(Instant::now()),
		}
	}

	/// Returns the cached value, or `None` on a miss or an expired entry.
	pub fn lookup(&self, key: &str) -> Option<bool> {
		let now = Instant::now();

		let expired = {
			let entries = self.entries.read();
			match entries.get(key) {
				Some(entry) if !entry.is_expired(now) => {
					self.hits.fetch_add(1, Ordering::Relaxed);
					return Some(entry.value);
				}
				Some(_) => true,
				None => false,
			}
		};

		if expired {
			let mut entries = self.entries.write();
			// Re-check under the write lock; a concurrent insert may have refreshed it.
			if entries.get(key).is_some_and(|e| e.is_expired(now)) {
				entries.remove(key);
			}
		}

		self.misses.fetch_add(1, Ordering::Relaxed);
		None
	}

	pub fn insert(&self, key: impl Into<String>, value: bool, ttl: Option<Duration>) {
		let key = key.into();
		let now = Instant::now();
		let mut entries = self.entries.write();

		if !entries.contains_key(&key) && entries.len() >= self.max_entries {
			entries.retain(|_, entry| !entry.is_expired(now));
			if entries.len() >= self.max_entries {
				evict_oldest(&mut entries);
			}
		}

		entries.insert(
			key,
			CacheEntry {
				value,
				inserted_at: now,
				ttl,
			},
		);
	}

	/// Removes every entry (and resets counters and age), or only the keys
	/// matching a `*` glob. Returns the number of entries removed.
	pub fn remove_matching(&self, pattern: Option<&str>) -> usize {
		let mut entries = self.entries.write();
		match pattern {
			None => {
				let removed = entries.len();
				entries.clear();
				self.hits.store(0, Ordering::Relaxed);
				self.misses.store(0, Ordering::Relaxed);
				*self.created_at.write() = Instant::now();
				removed
			}
			Some(pattern) => {
				let before = entries.len();
				entries.retain(|key, _| !glob_match(pattern, key));
				before - entries.len()
			}
		}
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	pub fn snapshot(&self) -> CacheStats {
		CacheStats::new(
			self.len(),
			self.hits.load(Ordering::Relaxed),
			self.misses.load(Ordering::Relaxed),
			self.created_at.read().elapsed(),
		)
	}
}

fn evict_oldest(entries: &mut HashMap<String, CacheEntry>) {
	if let Some(oldest) = entries
		.iter()
		.min_by_key(|(_, entry)| entry.inserted_at)
		.map(|(k, _)| k.clone())
	{
		entries.remove(&oldest);
	}
}

/// Matches `key` against a pattern where `*` stands for any run of characters
/// and `\\` makes the next pattern character literal.
pub fn glob_match(pattern: &str, key: &str) -> bool {
	let pattern = pattern.as_bytes();
	let key = key.as_bytes();
	let (mut p, mut k) = (0, 0);
	let mut backtrack: Option<(usize, usize)> = None;

	while k < key.len() {
		let literal = match pattern.get(p) {
			Some(b'*') => None,
			Some(b'\\') if p + 1 < pattern.len() => Some((pattern[p + 1], 2)),
			Some(&c) => Some((c, 1)),
			None => Some((0, 0)),
		};

		match literal {
			None => {
				backtrack = Some((p, k));
				p += 1;
			}
			Some((c, width)) if width > 0 && c == key[k] => {
				p += width;
				k += 1;
			}
			_ => match backtrack {
				Some((star, matched)) => {
					p = star + 1;
					k = matched + 1;
					backtrack = Some((star, matched + 1));
				}
				None => return false,
			},
		}
	}

	pattern[p..].iter().all(|&c| c == b'*')
}

/// Escapes `s` so [`glob_match`] treats every character literally.
pub fn escape_glob(s: &str) -> String {
	let mut escaped = String::with_capacity(s.len());
	for c in s.chars() {
		if matches!(c, '*' | '\\') {
			escaped.push('\\');
		}
		escaped.push(c);
	}
	escaped
}

#[async_trait]
impl CacheProvider for MemoryCache {
	async fn get(&self, key: &str) -> Result<Option<bool>, ProviderError> {
		Ok(self.lookup(key))
	}

	async fn set(&self, key: &str, value: bool, ttl: Option<Duration>) -> Result<(), ProviderError> {
		self.insert(key, value, ttl);
		Ok(())
	}

	async fn clear(&self, pattern: Option<&str>) -> Result<usize, ProviderError> {
		Ok(self.remove_matching(pattern))
	}

	async fn stats(&self) -> Result<CacheStats, ProviderError> {
		Ok(self.snapshot())
	}
}
