// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Init-data payload model and query-string parsing.

use std::collections::HashMap;

use serde::Deserialize;

use super::InitDataError;

/// Mini-App user embedded in init data as a URL-encoded JSON object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebAppUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub allows_write_to_pm: bool,
}

/// Chat the Mini App was launched from, when present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebAppChat {
    pub id: i64,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Validated init-data payload.
///
/// Structured fields cover what the platform models today; `raw` retains
/// every parsed key so unmodeled fields survive without a schema change.
#[derive(Debug, Clone, Default)]
pub struct InitData {
    pub query_id: Option<String>,
    pub user: Option<WebAppUser>,
    pub receiver: Option<WebAppUser>,
    pub chat: Option<WebAppChat>,
    pub chat_type: Option<String>,
    pub chat_instance: Option<String>,
    pub start_param: Option<String>,
    pub can_send_after: Option<i64>,
    pub auth_date: Option<String>,
    pub hash: Option<String>,
    pub signature: Option<String>,
    /// Every field as parsed, proof fields included.
    pub raw: HashMap<String, String>,
}

impl InitData {
    /// Build the structured payload from the parsed field map.
    pub(crate) fn from_fields(fields: HashMap<String, String>) -> Result<Self, InitDataError> {
        let mut out = InitData {
            query_id: plain(&fields, "query_id"),
            chat_type: plain(&fields, "chat_type"),
            chat_instance: plain(&fields, "chat_instance"),
            start_param: plain(&fields, "start_param"),
            auth_date: plain(&fields, "auth_date"),
            hash: plain(&fields, "hash"),
            signature: plain(&fields, "signature"),
            can_send_after: fields
                .get("can_send_after")
                .and_then(|v| v.parse::<i64>().ok()),
            ..InitData::default()
        };

        out.user = json_field(&fields, "user")?;
        out.receiver = json_field(&fields, "receiver")?;
        out.chat = json_field(&fields, "chat")?;
        out.raw = fields;

        Ok(out)
    }
}

fn plain(fields: &HashMap<String, String>, key: &str) -> Option<String> {
    fields.get(key).filter(|v| !v.is_empty()).cloned()
}

fn json_field<T: for<'de> Deserialize<'de>>(
    fields: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, InitDataError> {
    let Some(value) = fields.get(key).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    // Values arrive URL-encoded JSON; a value already decoded upstream passes
    // through unescape unchanged.
    let decoded = unescape(value)?;
    serde_json::from_str(&decoded)
        .map(Some)
        .map_err(|_| InitDataError::Malformed("cannot decode init data json"))
}

/// Decode one layer of URL escaping: `%xx` sequences plus `+` as space.
///
/// Invalid escape sequences are rejected rather than passed through.
pub(crate) fn unescape(raw: &str) -> Result<String, InitDataError> {
    if !raw.contains('%') && !raw.contains('+') {
        return Ok(raw.to_string());
    }

    let bytes = raw.as_bytes();
    let mut buffer = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'%' => {
                if index + 2 >= bytes.len() {
                    return Err(InitDataError::Malformed("cannot unescape init data"));
                }
                let hi = (bytes[index + 1] as char).to_digit(16);
                let lo = (bytes[index + 2] as char).to_digit(16);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => buffer.push((hi * 16 + lo) as u8),
                    _ => return Err(InitDataError::Malformed("cannot unescape init data")),
                }
                index += 3;
            }
            b'+' => {
                buffer.push(b' ');
                index += 1;
            }
            byte => {
                buffer.push(byte);
                index += 1;
            }
        }
    }

    String::from_utf8(buffer).map_err(|_| InitDataError::Malformed("cannot unescape init data"))
}

/// Parse the (already outer-decoded) init data as a flat key→value map.
/// Duplicate keys keep the last value.
pub(crate) fn parse_fields(data: &str) -> Result<HashMap<String, String>, InitDataError> {
    if data.trim().is_empty() {
        return Err(InitDataError::Malformed("init data cannot be empty"));
    }

    let mut fields = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(data.as_bytes()) {
        fields.insert(key.into_owned(), value.into_owned());
    }
    Ok(fields)
}

/// Canonical newline-joined `key=value` serialization of all fields except
/// `exclude`, keys sorted ascending. This is the material both proof schemes
/// authenticate.
pub(crate) fn data_check_string(fields: &HashMap<String, String>, exclude: &[&str]) -> String {
    let mut keys: Vec<&str> = fields
        .keys()
        .map(String::as_str)
        .filter(|key| !exclude.contains(key))
        .collect();
    keys.sort_unstable();

    let mut lines = Vec::with_capacity(keys.len());
    for key in keys {
        lines.push(format!("{key}={}", fields[key]));
    }
    lines.join("\n")
}
