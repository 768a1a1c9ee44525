//! Editor parameters and configuration loading.
//!
//! `EditorParams` is the parameter set the host framework binds onto the
//! controller on every update (mount target, visibility, bound value, upload
//! endpoint and headers, extra CSS class). `Config` is the optional on-disk
//! source of the static parts of it, parsed from `htmledit.toml`:
//!
//! ```toml
//! [editor]
//! mount = "editor"
//! visible = true
//! class = "wide"
//!
//! [upload]
//! url = "/upload"
//!
//! [upload.headers]
//! Authorization = "Bearer token"
//! ```
//!
//! Unknown fields are ignored. A missing or unparsable file falls back to
//! defaults so a broken config never prevents the editor from starting.

use anyhow::Result;
use core_bridge::{MountRef, UploadHeaders};
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const DEFAULT_MOUNT: &str = "html-editor";
pub const CONFIG_FILE_NAME: &str = "htmledit.toml";

/// Parameters bound onto the controller by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorParams {
    pub mount: MountRef,
    pub visible: bool,
    /// Externally bound document value (html).
    pub value: String,
    pub upload_url: Option<String>,
    /// `None` means "not configured"; the header supplier answers with an empty map.
    pub upload_headers: Option<UploadHeaders>,
    pub css_class: Option<String>,
}

impl Default for EditorParams {
    fn default() -> Self {
        Self {
            mount: MountRef::new(DEFAULT_MOUNT),
            visible: true,
            value: String::new(),
            upload_url: None,
            upload_headers: None,
            css_class: None,
        }
    }
}

impl EditorParams {
    pub fn new(mount: impl Into<String>) -> Self {
        Self {
            mount: MountRef::new(mount),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = Some(url.into());
        self
    }

    pub fn with_upload_headers(mut self, headers: UploadHeaders) -> Self {
        self.upload_headers = Some(headers);
        self
    }

    pub fn with_css_class(mut self, class: impl Into<String>) -> Self {
        self.css_class = Some(class.into());
        self
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditorSection {
    #[serde(default = "EditorSection::default_mount")]
    pub mount: String,
    #[serde(default = "EditorSection::default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub class: Option<String>,
}

impl Default for EditorSection {
    fn default() -> Self {
        Self {
            mount: Self::default_mount(),
            visible: Self::default_visible(),
            class: None,
        }
    }
}

impl EditorSection {
    fn default_mount() -> String {
        DEFAULT_MOUNT.to_owned()
    }
    const fn default_visible() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct UploadSection {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub headers: UploadHeaders,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub editor: EditorSection,
    #[serde(default)]
    pub upload: UploadSection,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

/// Best-effort config path: working directory first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("htmledit").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        info!(target: "config", path = %path.display(), "config_missing_using_defaults");
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(
                target: "config",
                path = %path.display(),
                mount = file.editor.mount.as_str(),
                visible = file.editor.visible,
                upload = file.upload.url.is_some(),
                header_count = file.upload.headers.len(),
                "config_loaded"
            );
            Ok(Config {
                raw: Some(content),
                file,
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Build the initial parameter set with `value` as the bound document.
    pub fn params(&self, value: impl Into<String>) -> EditorParams {
        let editor = &self.file.editor;
        let upload = &self.file.upload;
        EditorParams {
            mount: MountRef::new(editor.mount.clone()),
            visible: editor.visible,
            value: value.into(),
            upload_url: upload.url.clone(),
            upload_headers: (!upload.headers.is_empty()).then(|| upload.headers.clone()),
            css_class: editor.class.clone(),
        }
    }
}
