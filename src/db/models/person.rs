use mongodb::bson::Bson;
use serde::{Deserialize, Deserializer, Serialize};

/// Name of the collection holding [`Person`] documents.
pub const PERSONS_COLLECTION: &str = "persons";

/// A document of the `persons` collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Store-assigned `_id`; ObjectIds are rendered as hex.
    #[serde(rename = "_id", deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(rename = "firstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", default)]
    pub last_name: Option<String>,
    #[serde(rename = "eMail", default)]
    pub e_mail: Option<String>,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Bson::deserialize(deserializer)? {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s,
        other => other.to_string(),
    })
}
