use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::domain::ports::Document;
use crate::shared::{describe_validation_errors, DomainError, DomainResult};

/// Collection holding one profile document per account, keyed by uid.
pub const PROFILES_COLLECTION: &str = "users";
/// Collection holding one handle mapping per username, keyed by the handle.
pub const HANDLES_COLLECTION: &str = "usernames";

/// Profile fields an administrator may overwrite.
pub const UPDATABLE_FIELDS: &[&str] = &[
    "coins",
    "xp",
    "kills",
    "deaths",
    "matches",
    "skinTag",
    "friends",
    "guns",
    "friendRequests",
];

/// Game profile stored alongside each account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub coins: i64,
    #[serde(default)]
    pub xp: i64,
    #[serde(default)]
    pub kills: i64,
    #[serde(default)]
    pub deaths: i64,
    #[serde(default)]
    pub matches: i64,
    /// Cosmetic tag; any JSON value, `0` when unset.
    #[serde(default = "default_skin_tag")]
    pub skin_tag: Value,
    #[serde(default)]
    pub friends: Vec<Value>,
    #[serde(default)]
    pub guns: Vec<Value>,
    #[serde(default)]
    pub friend_requests: Vec<Value>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

fn default_skin_tag() -> Value {
    Value::from(0)
}

impl Profile {
    /// Fresh profile: every counter zero, every list empty.
    pub fn new(username: &str, email: &str, now: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            coins: 0,
            xp: 0,
            kills: 0,
            deaths: 0,
            matches: 0,
            skin_tag: default_skin_tag(),
            friends: Vec::new(),
            guns: Vec::new(),
            friend_requests: Vec::new(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    pub fn from_document(doc: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(doc))
    }

    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("username".into(), self.username.clone().into());
        doc.insert("email".into(), self.email.clone().into());
        doc.insert("coins".into(), self.coins.into());
        doc.insert("xp".into(), self.xp.into());
        doc.insert("kills".into(), self.kills.into());
        doc.insert("deaths".into(), self.deaths.into());
        doc.insert("matches".into(), self.matches.into());
        doc.insert("skinTag".into(), self.skin_tag.clone());
        doc.insert("friends".into(), Value::Array(self.friends.clone()));
        doc.insert("guns".into(), Value::Array(self.guns.clone()));
        doc.insert(
            "friendRequests".into(),
            Value::Array(self.friend_requests.clone()),
        );
        doc.insert("createdAt".into(), self.created_at.clone().into());
        doc.insert("updatedAt".into(), self.updated_at.clone().into());
        doc
    }
}

/// Allow-listed subset of profile fields to overwrite.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(range(min = 0, message = "must not be negative"))]
    pub coins: Option<i64>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub xp: Option<i64>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub kills: Option<i64>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub deaths: Option<i64>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub matches: Option<i64>,
    pub skin_tag: Option<Value>,
    pub friends: Option<Vec<Value>>,
    pub guns: Option<Vec<Value>>,
    pub friend_requests: Option<Vec<Value>>,
}

impl ProfileUpdate {
    /// Keeps only allow-listed keys from an arbitrary JSON object. Unknown
    /// keys are dropped silently; nothing left (or only nulls) is
    /// [`DomainError::NoFieldsProvided`].
    pub fn from_fields(fields: &Document) -> DomainResult<Self> {
        let allowed: Document = fields
            .iter()
            .filter(|(key, _)| UPDATABLE_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        if allowed.is_empty() {
            return Err(DomainError::NoFieldsProvided);
        }

        let update: ProfileUpdate = serde_json::from_value(Value::Object(allowed))
            .map_err(|e| DomainError::Validation(format!("Invalid profile field: {}", e)))?;

        update
            .validate()
            .map_err(|e| DomainError::Validation(describe_validation_errors(&e)))?;

        if update.is_empty() {
            return Err(DomainError::NoFieldsProvided);
        }
        Ok(update)
    }

    pub fn is_empty(&self) -> bool {
        self.field_names().is_empty()
    }

    /// Wire names of the fields this update sets.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.to_pairs().into_iter().map(|(name, _)| name).collect()
    }

    /// Document patch: the set fields plus a refreshed `updatedAt`.
    pub fn to_document(&self, updated_at: &str) -> Document {
        let mut doc: Document = self
            .to_pairs()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        doc.insert("updatedAt".into(), updated_at.into());
        doc
    }

    fn to_pairs(&self) -> Vec<(&'static str, Value)> {
        let counters = [
            ("coins", self.coins),
            ("xp", self.xp),
            ("kills", self.kills),
            ("deaths", self.deaths),
            ("matches", self.matches),
        ];
        let lists = [
            ("friends", &self.friends),
            ("guns", &self.guns),
            ("friendRequests", &self.friend_requests),
        ];

        let mut pairs: Vec<(&'static str, Value)> = counters
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, Value::from(v))))
            .collect();
        if let Some(tag) = &self.skin_tag {
            pairs.push(("skinTag", tag.clone()));
        }
        pairs.extend(
            lists
                .into_iter()
                .filter_map(|(name, value)| value.as_ref().map(|v| (name, Value::Array(v.clone())))),
        );
        pairs
    }
}

/// Document stored under `usernames/{handle}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleMapping {
    pub uid: String,
    #[serde(default)]
    pub created_at: String,
}

impl HandleMapping {
    pub fn from_document(doc: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(doc))
    }

    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("uid".into(), self.uid.clone().into());
        doc.insert("createdAt".into(), self.created_at.clone().into());
        doc
    }
}
