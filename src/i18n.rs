// ==========================================
// Internationalization (i18n) Module
// ==========================================
// rust-i18n, French (default) and English.
// ==========================================
// Note: the rust_i18n::i18n! macro is initialized in lib.rs
// ==========================================

/// Returns the active locale.
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// Switches the active locale.
///
/// # Arguments
/// - `locale`: locale code ("fr" or "en")
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// Translates a message key.
///
/// # Example
/// ```no_run
/// use exam_planner::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// Translates a message key with placeholder substitution.
///
/// # Example
/// ```no_run
/// use exam_planner::i18n::t_with_args;
/// let msg = t_with_args("import.file_not_found", &[("path", "/tmp/rooms.csv")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}
