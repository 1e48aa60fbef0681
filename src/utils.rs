use std::path::PathBuf;

/// Directory name used under the platform config and data directories.
pub const APP_DIR_NAME: &str = "ecodesc";

/// Formats an optional number in shortest form, or returns "—" if None or non-finite.
pub fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => crate::descriptor::writer::format_number(x),
        _ => "—".to_owned(),
    }
}

/// `<config_dir>/ecodesc`, falling back to the working directory.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// `<data_dir>/ecodesc`, falling back to the working directory.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_opt() {
        assert_eq!(fmt_opt(Some(3.0)), "3");
        assert_eq!(fmt_opt(Some(0.25)), "0.25");
        assert_eq!(fmt_opt(None), "—");
        assert_eq!(fmt_opt(Some(f64::NAN)), "—");
    }

    #[test]
    fn test_app_dirs() {
        assert!(config_dir().ends_with(APP_DIR_NAME));
        assert!(data_dir().ends_with(APP_DIR_NAME));
    }
}
