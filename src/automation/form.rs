//! Browser form driver.
//!
//! Thin adapter over a CDP-controlled Chrome instance: open the intake form,
//! locate a field by element id, write a value into it. The browser process
//! is owned for the session and shut down on drop.

use anyhow::{anyhow, Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ScanConfig;
use crate::ocr::FieldKind;

/// Sessions can sit scanning for a long time between fills; keep the
/// browser from reaping itself as idle in the meantime.
const BROWSER_IDLE_TIMEOUT: Duration = Duration::from_secs(86_400);

/// Anything the orchestrator can write confirmed field values through.
/// `set_field` is called at most once per field per confirmed record.
pub trait FormDriver {
    fn set_field(&mut self, kind: FieldKind, value: &str) -> Result<()>;
}

/// The production driver: a Chrome tab holding the intake form.
pub struct FormFiller {
    // Kept alive for the tab; dropping the browser closes the process.
    _browser: Browser,
    tab: Arc<Tab>,
    name_field_id: String,
    phone_field_id: String,
}

impl FormFiller {
    /// Launches the browser and navigates to the configured form. Failure
    /// here is fatal to the session.
    pub fn open(config: &ScanConfig) -> Result<Self> {
        let url = resolve_form_url(&config.form_target)?;

        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .idle_browser_timeout(BROWSER_IDLE_TIMEOUT)
            .build()
            .map_err(|e| anyhow!("failed to assemble browser launch options: {}", e))?;

        let browser = Browser::new(options).context("failed to launch form browser")?;
        let tab = browser.new_tab().context("failed to open form tab")?;
        tab.navigate_to(&url)
            .and_then(|tab| tab.wait_until_navigated())
            .with_context(|| format!("failed to open form at {}", url))?;

        crate::log(&format!("Form opened: {}", url));

        Ok(Self {
            _browser: browser,
            tab,
            name_field_id: config.name_field_id.clone(),
            phone_field_id: config.phone_field_id.clone(),
        })
    }

    fn field_selector(&self, kind: FieldKind) -> String {
        match kind {
            FieldKind::Name => format!("#{}", self.name_field_id),
            FieldKind::Phone => format!("#{}", self.phone_field_id),
        }
    }
}

impl FormDriver for FormFiller {
    fn set_field(&mut self, kind: FieldKind, value: &str) -> Result<()> {
        let selector = self.field_selector(kind);
        let element = self
            .tab
            .wait_for_element(&selector)
            .with_context(|| format!("form field {} not found", selector))?;

        element.scroll_into_view()?;
        element.click()?;
        // Clear any previous value before typing the new one.
        element.call_js_fn("function() { this.value = ''; }", vec![], false)?;
        self.tab.type_str(value)?;

        Ok(())
    }
}

impl Drop for FormFiller {
    fn drop(&mut self) {
        crate::log("Form browser released");
    }
}

/// Renders bare phone digits the way the form displays them:
/// `(DD) DDDDD-DDDD` for 11 digits, `(DD) DDDD-DDDD` for 10. Other digit
/// counts never reach this point and pass through unchanged.
pub fn format_phone(digits: &str) -> String {
    match digits.len() {
        11 => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
        10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        _ => digits.to_string(),
    }
}

/// Accepts an http(s)/file URL as-is; anything else is treated as a local
/// HTML file path and must exist.
pub fn resolve_form_url(target: &str) -> Result<String> {
    if target.starts_with("http://")
        || target.starts_with("https://")
        || target.starts_with("file://")
    {
        return Ok(target.to_string());
    }

    let path = Path::new(target);
    if !path.exists() {
        return Err(anyhow!("form file not found: {}", target));
    }
    let absolute = path
        .canonicalize()
        .with_context(|| format!("failed to resolve form path: {}", target))?;
    Ok(format!("file://{}", absolute.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone_mobile() {
        assert_eq!(format_phone("21998765432"), "(21) 99876-5432");
        assert_eq!(format_phone("11987654321"), "(11) 98765-4321");
    }

    #[test]
    fn test_format_phone_landline() {
        assert_eq!(format_phone("2134567890"), "(21) 3456-7890");
    }

    #[test]
    fn test_format_phone_passthrough_on_unexpected_length() {
        assert_eq!(format_phone("123"), "123");
    }

    #[test]
    fn test_resolve_form_url_passes_urls_through() {
        assert_eq!(
            resolve_form_url("https://example.com/intake").unwrap(),
            "https://example.com/intake"
        );
        assert_eq!(
            resolve_form_url("file:///tmp/form.html").unwrap(),
            "file:///tmp/form.html"
        );
    }

    #[test]
    fn test_resolve_form_url_missing_file_fails() {
        assert!(resolve_form_url("/definitely/not/here.html").is_err());
    }

    #[test]
    fn test_resolve_form_url_local_file() {
        let file = tempfile::NamedTempFile::with_suffix(".html").unwrap();
        let resolved = resolve_form_url(file.path().to_str().unwrap()).unwrap();
        assert!(resolved.starts_with("file://"));
        assert!(resolved.ends_with(".html"));
    }
}
