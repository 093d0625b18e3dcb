//! Session-scoped permission tracking over the permission input type.
//!
//! The gate caches operator grants for the current session: exact paths and
//! recursive directory grants. A cache hit never re-prompts; a miss asks
//! through the coordinator and maps the decision: `allow_session` stores the
//! grant, `allow_once` grants without storing, and `deny` (or a cancelled
//! prompt) refuses.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::coordinator::Coordinator;
use crate::error::InputError;
use crate::provider::permission::{permission_payload, PERMISSION_TYPE_ID};
use crate::provider::PermissionDecision;

/// Grants remembered for the session.
#[derive(Default)]
struct Grants {
    paths: HashSet<PathBuf>,
    directories: HashSet<PathBuf>,
}

/// Permission gate backed by a coordinator.
pub struct PermissionGate {
    coordinator: Arc<Coordinator>,
    grants: Mutex<Grants>,
}

impl PermissionGate {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self {
            coordinator,
            grants: Mutex::new(Grants::default()),
        }
    }

    /// True when `path` is already covered by a session grant, either exactly
    /// or through a granted ancestor directory.
    pub fn is_granted(&self, path: &str) -> bool {
        let normalized = normalize_path(path);
        let grants = lock(&self.grants);
        if grants.paths.contains(&normalized) {
            return true;
        }
        grants
            .directories
            .iter()
            .any(|dir| normalized.starts_with(dir))
    }

    /// Ensure permission for one operation on `path`, prompting if needed.
    ///
    /// Returns `Ok(true)` when the operation may proceed. Blocks the calling
    /// thread while the operator decides. Errors surface only setup problems
    /// (no delivery callback, permission type unregistered); the operator
    /// refusing or dismissing the prompt is an `Ok(false)`.
    pub fn request(
        &self,
        path: &str,
        operation: &str,
        is_directory: bool,
    ) -> Result<bool, InputError> {
        if self.is_granted(path) {
            return Ok(true);
        }

        let normalized = normalize_path(path);
        let response = self.coordinator.ask(
            PERMISSION_TYPE_ID,
            permission_payload(&normalized.to_string_lossy(), operation),
        )?;
        if response.cancelled {
            return Ok(false);
        }
        let decision = response
            .data
            .as_ref()
            .and_then(PermissionDecision::from_payload);

        match decision {
            Some(PermissionDecision::AllowSession) => {
                self.grant(&normalized.to_string_lossy(), is_directory);
                Ok(true)
            }
            Some(PermissionDecision::AllowOnce) => Ok(true),
            Some(PermissionDecision::Deny) | None => Ok(false),
        }
    }

    /// Record a grant without prompting. `recursive` covers everything under
    /// a directory path.
    pub fn grant(&self, path: &str, recursive: bool) {
        let normalized = normalize_path(path);
        let mut grants = lock(&self.grants);
        if recursive {
            grants.directories.insert(normalized);
        } else {
            grants.paths.insert(normalized);
        }
    }

    /// Forget every stored grant.
    pub fn clear(&self) {
        let mut grants = lock(&self.grants);
        grants.paths.clear();
        grants.directories.clear();
    }
}

/// Normalize a path lexically: absolute, with `.`/`..` components folded.
///
/// Purely textual so permission checks work for paths that do not exist yet;
/// symlinks are not chased.
fn normalize_path(path: &str) -> PathBuf {
    let raw = Path::new(path);
    let absolute = if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("/"))
            .join(raw)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

fn lock(mutex: &Mutex<Grants>) -> MutexGuard<'_, Grants> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::PermissionProvider;
    use crate::types::InputResponse;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Coordinator whose presentation side always answers with `decision`.
    fn gate_with_decision(decision: PermissionDecision) -> (PermissionGate, Arc<AtomicUsize>) {
        let coordinator = Arc::new(Coordinator::new());
        coordinator
            .register_provider(Arc::new(PermissionProvider))
            .expect("register");
        let prompts = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&prompts);
        let inner = Arc::clone(&coordinator);
        coordinator.set_deliver(move |request| {
            seen.fetch_add(1, Ordering::SeqCst);
            inner.set_response(InputResponse::answered(
                request.request_id.clone(),
                decision.into_payload(),
            ));
        });
        (PermissionGate::new(coordinator), prompts)
    }

    #[test]
    fn allow_once_grants_without_caching() {
        let (gate, prompts) = gate_with_decision(PermissionDecision::AllowOnce);
        assert!(gate.request("/tmp/scratch.txt", "write", false).expect("request"));
        assert!(gate.request("/tmp/scratch.txt", "write", false).expect("request"));
        assert_eq!(prompts.load(Ordering::SeqCst), 2);
        assert!(!gate.is_granted("/tmp/scratch.txt"));
    }

    #[test]
    fn allow_session_caches_and_skips_reprompt() {
        let (gate, prompts) = gate_with_decision(PermissionDecision::AllowSession);
        assert!(gate.request("/tmp/scratch.txt", "write", false).expect("request"));
        assert!(gate.request("/tmp/scratch.txt", "read", false).expect("request"));
        assert_eq!(prompts.load(Ordering::SeqCst), 1);
        assert!(gate.is_granted("/tmp/scratch.txt"));
    }

    #[test]
    fn session_directory_grant_covers_children() {
        let (gate, prompts) = gate_with_decision(PermissionDecision::AllowSession);
        assert!(gate.request("/srv/project", "list", true).expect("request"));
        assert!(gate
            .request("/srv/project/src/lib.rs", "read", false)
            .expect("request"));
        assert_eq!(prompts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn deny_refuses_and_stores_nothing() {
        let (gate, prompts) = gate_with_decision(PermissionDecision::Deny);
        assert!(!gate.request("/etc/passwd", "read", false).expect("request"));
        assert!(!gate.is_granted("/etc/passwd"));
        assert_eq!(prompts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancelled_prompt_counts_as_refusal() {
        let coordinator = Arc::new(Coordinator::new());
        coordinator
            .register_provider(Arc::new(PermissionProvider))
            .expect("register");
        let inner = Arc::clone(&coordinator);
        coordinator.set_deliver(move |request| {
            inner.set_response(InputResponse::cancelled(request.request_id.clone()));
        });
        let gate = PermissionGate::new(coordinator);
        assert!(!gate.request("/tmp/x", "read", false).expect("request"));
    }

    #[test]
    fn manual_grant_and_clear() {
        let (gate, prompts) = gate_with_decision(PermissionDecision::Deny);
        gate.grant("/data", true);
        assert!(gate.is_granted("/data/reports/q3.csv"));
        gate.clear();
        assert!(!gate.is_granted("/data/reports/q3.csv"));
        assert_eq!(prompts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn request_propagates_setup_errors() {
        // A coordinator with no delivery callback means the presentation side
        // was never wired up.
        let coordinator = Arc::new(Coordinator::new());
        coordinator
            .register_provider(Arc::new(PermissionProvider))
            .expect("register");
        let gate = PermissionGate::new(coordinator);
        let err = gate.request("/tmp/x", "read", false).unwrap_err();
        assert!(matches!(err, InputError::NotReady));
    }

    #[test]
    fn normalize_path_folds_dot_components() {
        assert_eq!(
            normalize_path("/a/b/../c/./d"),
            PathBuf::from("/a/c/d")
        );
    }

    #[test]
    fn prompt_payload_carries_normalized_resource() {
        let coordinator = Arc::new(Coordinator::new());
        coordinator
            .register_provider(Arc::new(PermissionProvider))
            .expect("register");
        let seen = Arc::new(Mutex::new(Value::Null));
        let captured = Arc::clone(&seen);
        let inner = Arc::clone(&coordinator);
        coordinator.set_deliver(move |request| {
            *captured.lock().unwrap_or_else(PoisonError::into_inner) = request.data.clone();
            inner.set_response(InputResponse::answered(
                request.request_id.clone(),
                PermissionDecision::Deny.into_payload(),
            ));
        });
        let gate = PermissionGate::new(coordinator);
        gate.request("/a/b/../x.txt", "read", false).expect("request");
        let data = seen.lock().unwrap_or_else(PoisonError::into_inner).clone();
        assert_eq!(data["resource"], "/a/x.txt");
        assert_eq!(data["operation"], "read");
    }
}
