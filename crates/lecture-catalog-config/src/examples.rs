// crates/lecture-catalog-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Starting point printed by the CLI and checked by tests.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The example lists every key with its default value so it can be copied
//! as-is and edited.

/// Returns a canonical example `lecture-catalog.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[store]
path = "lecture-catalog.sqlite"
busy_timeout_ms = 5000
journal_mode = "wal"
sync_mode = "normal"
integrity_check = true
hierarchy_cache_ttl_ms = 3000

[logging]
level = "info"
ansi = true
"#,
    )
}
