/// Environment events observed by the hook layer.
///
/// The host application (or a front-end bridge) publishes these on the
/// `EnvBus`. They are serde-tagged by `type` so they can be fed as NDJSON.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Event payload pieces
// ---------------------------------------------------------------------------

/// Element the user interacted with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl ElementInfo {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Buttons and links, by tag or by ARIA role.
    pub fn is_interactive(&self) -> bool {
        let tag = self.tag.to_ascii_lowercase();
        let role = self.role.as_deref().map(str::to_ascii_lowercase);
        matches!(tag.as_str(), "button" | "a") || matches!(role.as_deref(), Some("button" | "link"))
    }
}

/// Submitted form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Page-load timing figures in milliseconds, relative to navigation start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationTiming {
    pub dns_ms: f64,
    pub connect_ms: f64,
    pub ttfb_ms: f64,
    pub dom_content_loaded_ms: f64,
    pub load_complete_ms: f64,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnvEvent {
    UncaughtError {
        message: String,
        #[serde(default)]
        source: Option<String>,
        #[serde(default)]
        line: Option<u32>,
        #[serde(default)]
        column: Option<u32>,
        #[serde(default)]
        stack: Option<String>,
    },
    UnhandledRejection {
        reason: String,
    },
    VisibilityChange {
        visible: bool,
    },
    Resize {
        width: u32,
        height: u32,
    },
    Load {
        url: String,
        #[serde(default)]
        referrer: Option<String>,
        #[serde(default)]
        timing: Option<NavigationTiming>,
    },
    Navigate {
        from: String,
        to: String,
    },
    Unload {
        url: String,
    },
    Click {
        element: ElementInfo,
    },
    Submit {
        #[serde(default)]
        form: FormInfo,
    },
    InputChange {
        #[serde(rename = "inputType")]
        input_type: String,
        #[serde(default)]
        name: Option<String>,
        /// Raw value. Never copied into an entry.
        #[serde(default)]
        value: String,
    },
}

impl EnvEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UncaughtError { .. } => "uncaught_error",
            Self::UnhandledRejection { .. } => "unhandled_rejection",
            Self::VisibilityChange { .. } => "visibility_change",
            Self::Resize { .. } => "resize",
            Self::Load { .. } => "load",
            Self::Navigate { .. } => "navigate",
            Self::Unload { .. } => "unload",
            Self::Click { .. } => "click",
            Self::Submit { .. } => "submit",
            Self::InputChange { .. } => "input_change",
        }
    }
}
