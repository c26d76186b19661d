//! Mapping from failed responses to user-facing messages.
//!
//! Classification is a two-step lookup: [`classify`] turns an optional status
//! code into a [`Classification`] through [`STATUS_TABLE`], and a
//! [`MessageCatalog`] turns the classification into the message shown to the
//! user. Anything not listed in the table, including failures without a
//! response, falls back to [`Classification::DEFAULT`].

use std::str::FromStr;

use http::StatusCode;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// The category a failed request falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// 401: the session or token is no longer valid.
    SessionExpired,
    /// 403: the caller may not access the resource.
    Forbidden,
    /// 404: the route or resource does not exist.
    NotFound,
    /// 500: the server failed.
    ServerError,
    /// Any other status, or no response at all.
    Connectivity,
}

impl Classification {
    /// Used for every status not in [`STATUS_TABLE`] and for failures without a response.
    pub const DEFAULT: Classification = Classification::Connectivity;

    /// Every classification, in table order followed by the default.
    pub const ALL: [Classification; 5] = [
        Classification::SessionExpired,
        Classification::Forbidden,
        Classification::NotFound,
        Classification::ServerError,
        Classification::Connectivity,
    ];

    /// Stable snake_case label, used as a structured log field.
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::SessionExpired => "session_expired",
            Classification::Forbidden => "forbidden",
            Classification::NotFound => "not_found",
            Classification::ServerError => "server_error",
            Classification::Connectivity => "connectivity",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status codes with a dedicated classification.
pub const STATUS_TABLE: [(StatusCode, Classification); 4] = [
    (StatusCode::UNAUTHORIZED, Classification::SessionExpired),
    (StatusCode::FORBIDDEN, Classification::Forbidden),
    (StatusCode::NOT_FOUND, Classification::NotFound),
    (StatusCode::INTERNAL_SERVER_ERROR, Classification::ServerError),
];

/// Classifies a failure by its response status.
///
/// `None` means the request failed without a response (network failure,
/// timeout, or a failure before dispatch).
pub fn classify(status: Option<StatusCode>) -> Classification {
    status
        .and_then(|status| {
            STATUS_TABLE
                .iter()
                .find(|(code, _)| *code == status)
                .map(|(_, classification)| *classification)
        })
        .unwrap_or(Classification::DEFAULT)
}

// ---------------------------------------------------------------------------
// Locale and catalog
// ---------------------------------------------------------------------------

/// Language of the user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    /// Simplified Chinese.
    #[default]
    #[serde(rename = "zh-CN")]
    ZhCn,
    /// English.
    #[serde(rename = "en")]
    En,
}

impl Locale {
    /// The BCP 47 tag for this locale.
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::ZhCn => "zh-CN",
            Locale::En => "en",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zh-cn" | "zh" => Ok(Locale::ZhCn),
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            other => Err(format!("unsupported locale '{other}' (expected 'zh-CN' or 'en')")),
        }
    }
}

/// User-facing messages for each [`Classification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageCatalog {
    locale: Locale,
}

impl MessageCatalog {
    /// Creates the catalog for `locale`.
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// The catalog's locale.
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// The message shown for `classification`.
    pub fn message(&self, classification: Classification) -> &'static str {
        match (self.locale, classification) {
            (Locale::ZhCn, Classification::SessionExpired) => "token过期",
            (Locale::ZhCn, Classification::Forbidden) => "无权访问",
            (Locale::ZhCn, Classification::NotFound) => "请求地址错误",
            (Locale::ZhCn, Classification::ServerError) => "服务器出现问题",
            (Locale::ZhCn, Classification::Connectivity) => "无网络",
            (Locale::En, Classification::SessionExpired) => "Session expired, please sign in again",
            (Locale::En, Classification::Forbidden) => "Access forbidden",
            (Locale::En, Classification::NotFound) => "Requested resource not found",
            (Locale::En, Classification::ServerError) => "Server error",
            (Locale::En, Classification::Connectivity) => "Network unavailable",
        }
    }
}
