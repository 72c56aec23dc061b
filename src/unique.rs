//! Random identifiers for naming per-request artifacts.

/// Generates a random identifier shaped like a UUID
/// (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`).
///
/// # Examples
///
/// ```
/// let id = genome_browser::unique::id();
///
/// assert_eq!(id.len(), 36);
/// assert_eq!(id.matches('-').count(), 4);
/// ```
pub fn id() -> String {
    let bits = rand::random::<u128>();
    let hex = format!("{bits:032x}");

    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Generates `<prefix><id>`.
pub fn name(prefix: &str) -> String {
    format!("{prefix}{}", id())
}
