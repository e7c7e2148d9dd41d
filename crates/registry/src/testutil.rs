//! Shared test utilities for registry testing.
//!
//! This module provides a call-counting directory with fault injection, SID
//! fixtures and assertion macros. It is feature-gated behind `testutil` to
//! prevent leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! adtoken-registry = { path = "../registry", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use adtoken_registry::testutil::{CountingDirectory, sid};
//! ```

use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use adtoken_sid::Sid;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    directory::DirectoryResolver,
    error::{DirectoryError, DirectoryResult},
    memory::MemoryDirectory,
    types::GroupDn,
};

/// Captured `tokenGroups` value for `S-1-5-32-545` (BUILTIN\Users).
pub const BUILTIN_USERS_TOKEN: [u8; 16] = [
    0x01, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, 0x20, 0x00, 0x00, 0x00, 0x21, 0x02, 0x00, 0x00,
];

/// Parses a canonical SID string.
///
/// # Panics
///
/// Panics if `text` is not a valid SID.
#[must_use]
pub fn sid(text: &str) -> Sid {
    text.parse().expect("fixture SID must parse")
}

/// Builds a domain SID `S-1-5-21-{a}-{b}-{c}-{rid}`.
#[must_use]
pub fn domain_sid(domain: [u32; 3], rid: u32) -> Sid {
    Sid::new(1, 5, vec![21, domain[0], domain[1], domain[2], rid])
        .expect("domain SID fixture is valid")
}

/// Wraps a distinguished name.
///
/// # Panics
///
/// Panics if `dn` is empty.
#[must_use]
pub fn group_dn(dn: &str) -> GroupDn {
    GroupDn::new(dn).expect("fixture DN must be non-empty")
}

/// A [`MemoryDirectory`] that counts searches and can be told to fail.
///
/// Queued failures from [`fail_next`](Self::fail_next) are returned one per
/// search, before any standing failure set with
/// [`fail_always`](Self::fail_always). Every search is counted, failed ones
/// included.
#[derive(Debug, Default)]
pub struct CountingDirectory {
    inner: MemoryDirectory,
    calls: AtomicUsize,
    queued_failures: Mutex<VecDeque<DirectoryError>>,
    standing_failure: Mutex<Option<DirectoryError>>,
    latency: Mutex<Duration>,
}

impl CountingDirectory {
    /// Creates an empty directory with no context base.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing in-memory directory.
    #[must_use]
    pub fn wrapping(inner: MemoryDirectory) -> Self {
        Self { inner, ..Self::default() }
    }

    /// Adds an entry to the wrapped directory.
    pub fn insert(&self, relative_dn: impl Into<String>, object_sid: Sid) {
        self.inner.insert(relative_dn, object_sid);
    }

    /// Returns the wrapped directory.
    #[must_use]
    pub fn inner(&self) -> &MemoryDirectory {
        &self.inner
    }

    /// Number of searches issued so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Resets the search counter.
    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    /// Makes the next search fail with `error`.
    pub fn fail_next(&self, error: DirectoryError) {
        self.queued_failures.lock().push_back(error);
    }

    /// Makes every search fail with `error` until [`recover`](Self::recover).
    pub fn fail_always(&self, error: DirectoryError) {
        *self.standing_failure.lock() = Some(error);
    }

    /// Clears queued and standing failures.
    pub fn recover(&self) {
        self.queued_failures.lock().clear();
        *self.standing_failure.lock() = None;
    }

    /// Delays every search by `latency`, widening race windows in
    /// concurrency tests.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }
}

#[async_trait]
impl DirectoryResolver for CountingDirectory {
    async fn search(&self, base_dn: &str, sid: &Sid) -> DirectoryResult<Option<GroupDn>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let failure = self.queued_failures.lock().pop_front();
        if let Some(error) = failure.or_else(|| self.standing_failure.lock().clone()) {
            return Err(error);
        }
        self.inner.search(base_dn, sid).await
    }
}

/// Assert that a registry result is a directory error matching a pattern.
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use adtoken_registry::{DirectoryError, RegistryError, RegistryResult, assert_directory_error};
///
/// let result: RegistryResult<()> = Err(DirectoryError::timeout().into());
/// assert_directory_error!(result, DirectoryError::Timeout);
/// ```
#[macro_export]
macro_rules! assert_directory_error {
    ($result:expr, $pattern:pat) => {
        assert!(
            matches!($result, Err($crate::error::RegistryError::Directory($pattern))),
            "expected RegistryError::Directory({}), got: {:?}",
            stringify!($pattern),
            $result,
        );
    };
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::RegistryError::Directory(_))),
            "expected RegistryError::Directory, got: {:?}",
            $result,
        );
    };
}

/// Assert that a registry result resolved to the given distinguished name.
#[macro_export]
macro_rules! assert_resolves_to {
    ($result:expr, $dn:expr) => {
        match $result {
            Ok(Some(dn)) => assert_eq!(dn.as_str(), $dn),
            other => panic!("expected Ok(Some({:?})), got: {other:?}", $dn),
        }
    };
}

/// Assert that a registry result is `Ok(None)`.
#[macro_export]
macro_rules! assert_not_resolved {
    ($result:expr) => {
        match $result {
            Ok(None) => {},
            other => panic!("expected Ok(None), got: {other:?}"),
        }
    };
}
