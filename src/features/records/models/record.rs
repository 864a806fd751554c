use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

/// A stored value that is not part of a fixed choice list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid {field}")]
pub struct UnknownChoice {
    pub field: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gender {
    Male,
    Female,
    #[default]
    NotSpecified,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::NotSpecified];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::NotSpecified => "not specified",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::NotSpecified => "Not specified",
        }
    }

    /// An empty value means the radio group was left untouched
    pub fn parse(value: &str) -> Result<Self, UnknownChoice> {
        match value.trim() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "" | "not specified" => Ok(Gender::NotSpecified),
            other => Err(UnknownChoice {
                field: "gender",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Country {
    #[default]
    Unspecified,
    UnitedStates,
    UnitedKingdom,
    India,
    Canada,
}

impl Country {
    pub const ALL: [Country; 5] = [
        Country::Unspecified,
        Country::UnitedStates,
        Country::UnitedKingdom,
        Country::India,
        Country::Canada,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Country::Unspecified => "",
            Country::UnitedStates => "US",
            Country::UnitedKingdom => "UK",
            Country::India => "IN",
            Country::Canada => "CA",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Country::Unspecified => "Select Value",
            Country::UnitedStates => "United States",
            Country::UnitedKingdom => "United Kingdom",
            Country::India => "India",
            Country::Canada => "Canada",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownChoice> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.code() == value)
            .ok_or_else(|| UnknownChoice {
                field: "country",
                value: value.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hobby {
    Reading,
    Sports,
    Music,
    Traveling,
    Gaming,
}

impl Hobby {
    /// The fixed catalog, in display order
    pub const ALL: [Hobby; 5] = [
        Hobby::Reading,
        Hobby::Sports,
        Hobby::Music,
        Hobby::Traveling,
        Hobby::Gaming,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Hobby::Reading => "reading",
            Hobby::Sports => "sports",
            Hobby::Music => "music",
            Hobby::Traveling => "traveling",
            Hobby::Gaming => "gaming",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Hobby::Reading => "Reading",
            Hobby::Sports => "Sports",
            Hobby::Music => "Music",
            Hobby::Traveling => "Traveling",
            Hobby::Gaming => "Gaming",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownChoice> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|h| h.as_str() == value)
            .ok_or_else(|| UnknownChoice {
                field: "hobby",
                value: value.to_string(),
            })
    }

    /// Encode as the comma-joined string of the legacy document shape
    pub fn join_delimited(hobbies: &[Hobby]) -> String {
        hobbies
            .iter()
            .map(Hobby::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Decode a comma-joined hobby string, keeping order. Empty segments are
    /// skipped so `""` decodes to no hobbies.
    pub fn parse_delimited(value: &str) -> Result<Vec<Hobby>, UnknownChoice> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Hobby::parse)
            .collect()
    }
}

/// The user-editable fields of a record.
///
/// `password` is `None` in the basic form variant, and on edit when the
/// stored password should be kept.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFields {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub gender: Gender,
    pub dob: NaiveDate,
    pub country: Country,
    pub hobbies: Vec<Hobby>,
    pub message: String,
}

/// Everything needed to insert a record; id and creation time are assigned
/// by the store.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub fields: RecordFields,
    pub file: Option<String>,
}

/// A persisted record
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Uuid,
    pub fields: RecordFields,
    pub file: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Narrows `count` and `find_page` to a subset of the collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Case-insensitive substring matched against name and email
    pub search: Option<String>,
}

impl RecordFilter {
    pub fn search(term: Option<&str>) -> Self {
        Self {
            search: term
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    pub fn matches(&self, fields: &RecordFields) -> bool {
        match &self.search {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                fields.name.to_lowercase().contains(&term)
                    || fields.email.to_lowercase().contains(&term)
            }
        }
    }
}
