use anyhow::{anyhow, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::config::get_config;
use crate::log;
use crate::paths::get_tessdata_dir;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

/// Common Tesseract install locations, checked after PATH.
#[cfg(windows)]
const COMMON_EXE_PATHS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];

#[cfg(not(windows))]
const COMMON_EXE_PATHS: &[&str] = &[
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

/// System tessdata locations, checked when the local download dir lacks the
/// requested language.
#[cfg(windows)]
const SYSTEM_TESSDATA_PATHS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];

#[cfg(not(windows))]
const SYSTEM_TESSDATA_PATHS: &[&str] = &[
    "/usr/share/tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
];

/// Ensures the configured recognition language is available, downloading its
/// trained data into the local tessdata dir when no installation provides it.
pub fn ensure_language(lang: &str) -> Result<()> {
    find_tesseract_executable()?;

    if find_tessdata_dir(Some(lang)).is_some() {
        log(&format!("Language data '{}' found", lang));
        return Ok(());
    }

    log(&format!(
        "Language data '{}' not found locally, downloading...",
        lang
    ));
    download_traineddata(lang)
}

/// Finds the Tesseract executable: configured path first, then PATH, then
/// common install locations.
pub fn find_tesseract_executable() -> Result<PathBuf> {
    let configured = &get_config().tesseract_path;
    if !configured.is_empty() {
        let p = PathBuf::from(configured);
        if p.exists() {
            return Ok(p);
        }
        log(&format!(
            "Configured tesseract_path does not exist: {}",
            configured
        ));
    }

    if let Ok(output) = std::process::Command::new("tesseract")
        .arg("--version")
        .output()
    {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for path in COMMON_EXE_PATHS {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "Tesseract not found. Install Tesseract-OCR or set tesseract_path in config.json."
    ))
}

/// Finds a tessdata directory containing the given language (or any tessdata
/// dir when no language is requested). Returns `None` when only the engine's
/// built-in default location is available; the invocation then omits
/// `--tessdata-dir` and lets Tesseract resolve it.
pub fn find_tessdata_dir(lang: Option<&str>) -> Option<PathBuf> {
    let lang = lang.unwrap_or("eng");
    let traineddata = format!("{}.traineddata", lang);

    let local = get_tessdata_dir();
    if local.join(&traineddata).exists() {
        return Some(local);
    }

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if p.join(&traineddata).exists() {
            return Some(p);
        }
        let p = p.join("tessdata");
        if p.join(&traineddata).exists() {
            return Some(p);
        }
    }

    for path in SYSTEM_TESSDATA_PATHS {
        let p = PathBuf::from(path);
        if p.join(&traineddata).exists() {
            return Some(p);
        }
    }

    None
}

/// Downloads `<lang>.traineddata` from the tessdata repository into the
/// local tessdata dir.
fn download_traineddata(lang: &str) -> Result<()> {
    let tessdata_dir = get_tessdata_dir();
    fs::create_dir_all(&tessdata_dir)?;

    let url = format!("{}/{}.traineddata", TESSDATA_REPO, lang);
    let target = tessdata_dir.join(format!("{}.traineddata", lang));

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "intake-scanner")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}.traineddata: HTTP {}",
            lang,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&target)?;
    file.write_all(&bytes)?;

    log(&format!(
        "Downloaded {}.traineddata ({} bytes)",
        lang,
        bytes.len()
    ));

    Ok(())
}
