//! Validation of references and destination workspaces.

use serde_json::Value;
use tracing::debug;

use crate::ObjectRef;
use crate::reference;
use crate::service;
use crate::service::ObjectStore;

/// The type allow-list for genome references.
pub const GENOME_TYPES: &[&str] = &[".Genome"];

/// Returns whether `value` is a syntactically valid object reference.
///
/// # Examples
///
/// ```
/// use genome_browser::validate::validate_reference_syntax;
///
/// assert!(validate_reference_syntax("11/22/33"));
/// assert!(validate_reference_syntax("11/22;44/55/66"));
/// assert!(!validate_reference_syntax("11/22/"));
/// ```
pub fn validate_reference_syntax(value: &str) -> bool {
    reference::is_valid(value)
}

/// Returns whether the object named by `reference` has a type containing any
/// of `allowed`.
///
/// Type names in the store are namespaced and versioned (e.g.,
/// `KBaseGenomes.Genome-8.0`), so containment of a fragment such as `.Genome`
/// stands in for an "is-a" check. A failed lookup (a missing or inaccessible
/// object) is an error rather than `false`.
pub fn validate_reference_type(
    store: &dyn ObjectStore,
    reference: &ObjectRef,
    allowed: &[&str],
) -> service::Result<bool> {
    let method = "Workspace.get_object_info3";
    let info = store
        .get_object_info(&[reference.to_string()])?
        .into_iter()
        .next()
        .ok_or_else(|| {
            service::Error::Malformed(
                method.to_string(),
                format!("no object info returned for `{reference}`"),
            )
        })?;

    Ok(allowed
        .iter()
        .any(|fragment| info.type_name().contains(fragment)))
}

/// Returns whether `name` names a workspace the caller can save to.
///
/// Only a string that the store resolves is accepted. `null`, non-string
/// values, and any failure from the store produce `false`; this function never
/// fails.
pub fn validate_workspace_name(store: &dyn ObjectStore, name: &Value) -> bool {
    let Some(name) = name.as_str() else {
        debug!("workspace name is not a string: {name}");
        return false;
    };

    match store.get_workspace_info(name) {
        Ok(()) => true,
        Err(err) => {
            debug!("workspace `{name}` did not resolve: {err}");
            false
        }
    }
}
