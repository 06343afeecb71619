use serde::{Deserialize, Serialize};

use super::{require, ValidationError};

/// A dog record as returned by the API. The id is server-assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dog {
    pub id: i64,
    pub name: String,
    pub breed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(rename = "isActive", default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Dog {
    /// Age for display, e.g. "1 year" or "4 years".
    pub fn age_display(&self) -> Option<String> {
        self.age.map(|age| {
            if age == 1 {
                "1 year".to_string()
            } else {
                format!("{} years", age)
            }
        })
    }

    /// "Active"/"Inactive" badge, or None when the server sent no flag.
    pub fn status_label(&self) -> Option<&'static str> {
        self.is_active
            .map(|active| if active { "Active" } else { "Inactive" })
    }
}

/// Payload for creating a dog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDog {
    pub name: String,
    pub breed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(rename = "isActive", skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl NewDog {
    pub fn new(name: impl Into<String>, breed: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            breed: breed.into(),
            age: None,
            is_active: None,
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("Name", &self.name)?;
        require("Breed", &self.breed)?;
        Ok(())
    }
}

/// Partial update payload. Only supplied fields are serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DogPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(rename = "isActive", skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl DogPatch {
    /// Patch containing only the fields of `edited` that differ from `current`.
    pub fn from_changes(current: &Dog, edited: &NewDog) -> Self {
        Self {
            name: (edited.name != current.name).then(|| edited.name.clone()),
            breed: (edited.breed != current.breed).then(|| edited.breed.clone()),
            age: edited.age.filter(|_| edited.age != current.age),
            is_active: edited.is_active.filter(|_| edited.is_active != current.is_active),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.breed.is_none() && self.age.is_none() && self.is_active.is_none()
    }

    /// Supplied name/breed must not be blank; omitted fields are not checked.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref name) = self.name {
            require("Name", name)?;
        }
        if let Some(ref breed) = self.breed {
            require("Breed", breed)?;
        }
        Ok(())
    }
}
