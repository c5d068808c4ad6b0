//! Attributes shared by the Gerrit event types.

use std::fmt;

use serde::{Deserialize, Deserializer};

/// Identity of the user behind an event: comment author, uploader, submitter...
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct Account {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
}

impl Account {
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.email) {
            (Some(name), Some(email)) => write!(f, "{name} <{email}>"),
            (Some(name), None) => f.write_str(name),
            (None, Some(email)) => f.write_str(email),
            (None, None) => f.write_str(self.username.as_deref().unwrap_or("<unknown>")),
        }
    }
}

/// The server connection an event was received from.
///
/// Events never carry a provider on the wire; the worker attaches the one
/// submitted together with the raw payload. Only `name` takes part in
/// suppression lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Provider {
    pub name: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub scheme: Option<String>,
    pub url: Option<String>,
    pub version: Option<String>,
}

impl Provider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Change {
    pub project: Option<String>,
    pub branch: Option<String>,
    pub id: Option<String>,
    #[serde(deserialize_with = "number_or_string")]
    pub number: Option<u64>,
    pub subject: Option<String>,
    pub owner: Option<Account>,
    pub url: Option<String>,
    pub commit_message: Option<String>,
    pub status: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatchSet {
    #[serde(deserialize_with = "number_or_string")]
    pub number: Option<u64>,
    pub revision: Option<String>,
    #[serde(rename = "ref")]
    pub ref_name: Option<String>,
    pub uploader: Option<Account>,
    pub author: Option<Account>,
    pub created_on: Option<u64>,
    pub kind: Option<String>,
    pub is_draft: bool,
}

/// A label vote attached to a `comment-added` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Approval {
    #[serde(rename = "type")]
    pub label: Option<String>,
    pub description: Option<String>,
    pub value: Option<String>,
    pub old_value: Option<String>,
    pub by: Option<Account>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RefUpdate {
    pub old_rev: Option<String>,
    pub new_rev: Option<String>,
    pub ref_name: Option<String>,
    pub project: Option<String>,
}

/// Older Gerrit versions send change and patch set numbers as strings.
fn number_or_string<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
