use std::sync::OnceLock;

const BANNER_TEMPLATE: &str = include_str!("../assets/banner.html");
const ERROR_TEMPLATE: &str = include_str!("../assets/error.html");
const FAVICON_BYTES: &[u8] = include_bytes!("../assets/favicon.ico");

static BANNER: OnceLock<String> = OnceLock::new();
static ERROR: OnceLock<String> = OnceLock::new();
static FAVICON: OnceLock<Vec<u8>> = OnceLock::new();

/// Bundled resources are compiled into the binary and loaded into a
/// process-wide cache at most once (§4.9); subsequent calls just clone the
/// cached value.
pub fn banner_template() -> &'static str {
    BANNER.get_or_init(|| BANNER_TEMPLATE.to_string())
}

pub fn error_template() -> &'static str {
    ERROR.get_or_init(|| ERROR_TEMPLATE.to_string())
}

pub fn favicon_bytes() -> &'static [u8] {
    FAVICON.get_or_init(|| FAVICON_BYTES.to_vec())
}

/// Renders the banner template, substituting `{{version}}`.
pub fn render_banner(version: &str) -> String {
    banner_template().replace("{{version}}", version)
}

/// Renders the error template. Falls back to a plain-text body if, for
/// some reason, the template is empty (can't happen with `include_str!`,
/// but mirrors the source's defensive fallback for a resource that could
/// fail to load at runtime).
pub fn render_error(code: u16, reason: &str, explanation: &str, exception: &str) -> String {
    let template = error_template();
    if template.is_empty() {
        return format!("{code} {reason}\n{explanation}\n");
    }
    template
        .replace("{{code}}", &code.to_string())
        .replace("{{reason}}", reason)
        .replace("{{explanation}}", explanation)
        .replace("{{exception}}", exception)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_substitutes_version() {
        let body = render_banner("1.2.3");
        assert!(body.contains("1.2.3"));
        assert!(!body.contains("{{version}}"));
    }

    #[test]
    fn error_template_substitutes_all_placeholders() {
        let body = render_error(404, "Not Found", "no such user", "UserNotFound");
        assert!(body.contains("404"));
        assert!(body.contains("Not Found"));
        assert!(body.contains("no such user"));
    }

    #[test]
    fn favicon_bytes_are_non_empty() {
        assert!(!favicon_bytes().is_empty());
    }
}
