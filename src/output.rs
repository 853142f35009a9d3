use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// `CSV2SQLITE_QUIET=1` (or `true`) silences progress output; errors still print
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("CSV2SQLITE_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

/// Force quiet mode for this process, e.g. when stdout carries JSON
pub fn set_quiet() {
    let _ = QUIET.set(true);
}
