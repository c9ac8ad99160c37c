use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Placeholder id the service replaces with a real one
///
/// As an account id it means "the account of the caller".
pub const ZERO_GUID: &str = "00000000-0000-0000-0000-000000000000";

const DEFAULT_ACCOUNT_NAME: &str = "Default";

/// A user record as exchanged with the user API
///
/// Fields this tool does not know about are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub is_active: bool,
    pub roleid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accountid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accountname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_accountid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profileid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profilename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customerid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_license: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles: Option<Vec<Profile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles_json: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loglevel: Option<LogLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_modified_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A profile assigned to a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub profileid: String,
    pub profilename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<String>,
}

impl User {
    /// Builds a new active Agent in the caller's account with a single profile
    pub fn new_agent(
        username: &str,
        profileid: &str,
        profilename: &str,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        for (field, value) in [
            ("username", username),
            ("profileid", profileid),
            ("profilename", profilename),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Validation(format!("{field} must not be empty")));
            }
        }

        let profiles = vec![Profile {
            profileid: profileid.to_string(),
            profilename: profilename.to_string(),
            userid: Some(ZERO_GUID.to_string()),
        }];
        let profiles_json = serde_json::to_string(&profiles)?;
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);

        Ok(Self {
            userid: None,
            username: Some(username.to_string()),
            first_name: None,
            last_name: None,
            email: username.to_string(),
            password: None,
            is_active: true,
            roleid: Role::Agent.id().to_string(),
            rolename: None,
            accountid: Some(ZERO_GUID.to_string()),
            accountname: Some(DEFAULT_ACCOUNT_NAME.to_string()),
            original_accountid: None,
            profileid: Some(profileid.to_string()),
            profilename: Some(profilename.to_string()),
            customerid: None,
            has_license: Some(true),
            profiles: Some(profiles),
            profiles_json: Some(profiles_json),
            loglevel: Some(LogLevel::None),
            last_login_time: Some(timestamp.clone()),
            log_modified_date: Some(timestamp),
            attributes: None,
            extra: Map::new(),
        })
    }

    /// Checks the fields the import endpoint cannot do without
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(Error::Validation("email must not be empty".to_string()));
        }

        if self.roleid.trim().is_empty() {
            return Err(Error::Validation("roleid must not be empty".to_string()));
        }

        Ok(())
    }

    pub fn role(&self) -> Option<Role> {
        Role::from_id(&self.roleid)
    }
}

/// The built-in roles of the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Agent,
    NoAccess,
}

impl Role {
    pub fn id(self) -> &'static str {
        match self {
            Self::Admin => "413f59a5-6354-116b-3b3e-0a94f94ea000",
            Self::Agent => "d5fa771f-11a2-73af-a5fe-91f42c06e709",
            Self::NoAccess => "e3759ee3-6add-ad4c-e970-4a5c7be32c1f",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        [Self::Admin, Self::Agent, Self::NoAccess]
            .into_iter()
            .find(|role| role.id().eq_ignore_ascii_case(id))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Admin => "Admin",
            Self::Agent => "Agent",
            Self::NoAccess => "No-Access",
        })
    }
}

/// Per-user logging level, sent as its numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LogLevel {
    Loop,
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
    /// Logging disabled
    None,
}

impl TryFrom<u8> for LogLevel {
    type Error = String;

    fn try_from(code: u8) -> std::result::Result<Self, String> {
        match code {
            0 => Ok(LogLevel::Loop),
            1 => Ok(LogLevel::Trace),
            2 => Ok(LogLevel::Debug),
            3 => Ok(LogLevel::Info),
            4 => Ok(LogLevel::Warn),
            5 => Ok(LogLevel::Error),
            6 => Ok(LogLevel::Critical),
            100 => Ok(LogLevel::None),
            code => Err(format!("unknown log level {code}")),
        }
    }
}

impl From<LogLevel> for u8 {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Loop => 0,
            LogLevel::Trace => 1,
            LogLevel::Debug => 2,
            LogLevel::Info => 3,
            LogLevel::Warn => 4,
            LogLevel::Error => 5,
            LogLevel::Critical => 6,
            LogLevel::None => 100,
        }
    }
}
