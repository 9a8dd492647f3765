//! Tesseract invocation.
//!
//! Each recognition attempt shells out to the `tesseract` binary with a temp
//! PNG and reads the text from stdout. A failed attempt is an error here;
//! the strategy runner above decides what that means (usually: empty output).

use anyhow::{anyhow, Result};
use image::DynamicImage;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::{find_tessdata_dir, find_tesseract_executable};

/// One recognition strategy: a language hint and a page-segmentation mode.
/// `None` falls back to the engine's defaults. Configs are immutable; the
/// runner tries a fixed ordered list of them.
#[derive(Debug, Clone, Copy)]
pub struct OcrConfig<'a> {
    pub lang: Option<&'a str>,
    pub psm: Option<u8>,
}

impl<'a> OcrConfig<'a> {
    /// Command-line arguments this config adds to the Tesseract invocation.
    pub fn cli_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(lang) = self.lang {
            args.push("-l".to_string());
            args.push(lang.to_string());
        }
        if let Some(psm) = self.psm {
            args.push("--psm".to_string());
            args.push(psm.to_string());
        }
        args
    }
}

/// Runs Tesseract on an image under the given config and returns the raw
/// recognized text.
pub fn recognize(img: &DynamicImage, config: &OcrConfig) -> Result<String> {
    let tesseract_exe = find_tesseract_executable()?;

    let temp_input = NamedTempFile::with_suffix(".png")?;
    img.save(temp_input.path())?;

    let mut command = Command::new(&tesseract_exe);
    command.arg(temp_input.path()).arg("stdout");

    if let Some(tessdata) = find_tessdata_dir(config.lang) {
        command.arg("--tessdata-dir").arg(tessdata);
    }
    command.args(config.cli_args());

    let output = command.output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("Tesseract failed: {}", stderr));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args_full_config() {
        let config = OcrConfig {
            lang: Some("por"),
            psm: Some(6),
        };
        assert_eq!(config.cli_args(), vec!["-l", "por", "--psm", "6"]);
    }

    #[test]
    fn test_cli_args_defaults_add_nothing() {
        let config = OcrConfig {
            lang: None,
            psm: None,
        };
        assert!(config.cli_args().is_empty());
    }

    #[test]
    fn test_cli_args_psm_only() {
        let config = OcrConfig {
            lang: None,
            psm: Some(13),
        };
        assert_eq!(config.cli_args(), vec!["--psm", "13"]);
    }
}
