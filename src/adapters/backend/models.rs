//! Wire models of the REST backend

use crate::domain::ResponseRecord;
use serde::{Deserialize, Deserializer};

/// A user as listed by `GET /users/all`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserSummary {
    #[serde(deserialize_with = "id_string")]
    pub id: String,

    pub username: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsersEnvelope {
    #[serde(default)]
    pub users: Vec<UserSummary>,
}

/// Body of `GET /user-responses/{user_id}/{book_id}`
///
/// The backend answers either with a bare array or with an object wrapping it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ResponsesBody {
    List(Vec<ResponseRecord>),
    Wrapped {
        #[serde(default)]
        responses: Vec<ResponseRecord>,
    },
}

impl ResponsesBody {
    pub fn into_records(self) -> Vec<ResponseRecord> {
        match self {
            ResponsesBody::List(records) | ResponsesBody::Wrapped { responses: records } => records,
        }
    }
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
