use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::features::records::models::{
    Country, Gender, Hobby, NewRecord, Record, RecordFields, RecordFilter,
};
use crate::features::records::store::{RecordStore, StoreError, StoreResult};

/// Document shape of the `modelfield` collection. Hobbies are kept as a
/// comma-joined string and the date of birth as `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordDocument {
    name: String,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    gender: String,
    dob: String,
    country: String,
    hobbies: String,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    created_at: DateTime<Utc>,
}

impl RecordDocument {
    fn new(fields: &RecordFields, file: Option<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            name: fields.name.clone(),
            email: fields.email.clone(),
            password: fields.password.clone(),
            gender: fields.gender.as_str().to_string(),
            dob: fields.dob.format("%Y-%m-%d").to_string(),
            country: fields.country.code().to_string(),
            hobbies: Hobby::join_delimited(&fields.hobbies),
            message: fields.message.clone(),
            file,
            created_at,
        }
    }

    fn into_record(self, id: Uuid) -> StoreResult<Record> {
        let corrupt = |e: String| StoreError::Corrupt(format!("record {}: {}", id, e));

        let dob = NaiveDate::parse_from_str(&self.dob, "%Y-%m-%d")
            .map_err(|e| corrupt(format!("invalid dob '{}': {}", self.dob, e)))?;

        Ok(Record {
            id,
            fields: RecordFields {
                name: self.name,
                email: self.email,
                password: self.password,
                gender: Gender::parse(&self.gender).map_err(|e| corrupt(e.to_string()))?,
                dob,
                country: Country::parse(&self.country).map_err(|e| corrupt(e.to_string()))?,
                hobbies: Hobby::parse_delimited(&self.hobbies)
                    .map_err(|e| corrupt(e.to_string()))?,
                message: self.message,
            },
            file: self.file,
            created_at: self.created_at,
        })
    }
}

fn decode(id: Uuid, doc: &Value) -> StoreResult<Record> {
    serde_json::from_value::<RecordDocument>(doc.clone())
        .map_err(|e| StoreError::Corrupt(format!("record {}: {}", id, e)))?
        .into_record(id)
}

fn encode(doc: &RecordDocument) -> StoreResult<Value> {
    serde_json::to_value(doc).map_err(|e| StoreError::Query(e.to_string()))
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("in-memory collection lock poisoned".to_string())
}

/// An in-process document collection.
///
/// Documents are kept as JSON values in insertion order, which is also the
/// order `find_page` returns them in. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryRecordStore {
    documents: RwLock<Vec<(Uuid, Value)>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw document for an id, as the collection holds it
    #[cfg(test)]
    pub fn document(&self, id: Uuid) -> Option<Value> {
        self.documents
            .read()
            .ok()?
            .iter()
            .find(|(doc_id, _)| *doc_id == id)
            .map(|(_, doc)| doc.clone())
    }

    /// Store a raw document, bypassing validation
    #[cfg(test)]
    pub fn insert_document(&self, doc: Value) -> Uuid {
        let id = Uuid::now_v7();
        self.documents.write().unwrap().push((id, doc));
        id
    }

    fn matching(&self, filter: &RecordFilter) -> StoreResult<Vec<Record>> {
        let documents = self.documents.read().map_err(poisoned)?;
        let mut records = Vec::new();
        for (id, doc) in documents.iter() {
            let record = decode(*id, doc)?;
            if filter.matches(&record.fields) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: NewRecord) -> StoreResult<Uuid> {
        let id = Uuid::now_v7();
        let doc = encode(&RecordDocument::new(
            &record.fields,
            record.file,
            Utc::now(),
        ))?;

        self.documents.write().map_err(poisoned)?.push((id, doc));
        Ok(id)
    }

    async fn update_by_id(&self, id: Uuid, fields: &RecordFields) -> StoreResult<bool> {
        let mut documents = self.documents.write().map_err(poisoned)?;

        let Some((_, doc)) = documents.iter_mut().find(|(doc_id, _)| *doc_id == id) else {
            return Ok(false);
        };

        let existing = decode(id, doc)?;
        let mut fields = fields.clone();
        if fields.password.is_none() {
            fields.password = existing.fields.password;
        }

        *doc = encode(&RecordDocument::new(
            &fields,
            existing.file,
            existing.created_at,
        ))?;
        Ok(true)
    }

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<u64> {
        let mut documents = self.documents.write().map_err(poisoned)?;
        let before = documents.len();
        documents.retain(|(doc_id, _)| *doc_id != id);
        Ok((before - documents.len()) as u64)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Record>> {
        let documents = self.documents.read().map_err(poisoned)?;
        documents
            .iter()
            .find(|(doc_id, _)| *doc_id == id)
            .map(|(_, doc)| decode(id, doc))
            .transpose()
    }

    async fn count(&self, filter: &RecordFilter) -> StoreResult<u64> {
        Ok(self.matching(filter)?.len() as u64)
    }

    async fn find_page(
        &self,
        filter: &RecordFilter,
        skip: u64,
        limit: u64,
    ) -> StoreResult<Vec<Record>> {
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        Ok(self
            .matching(filter)?
            .into_iter()
            .skip(skip)
            .take(limit)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(name: &str) -> RecordFields {
        RecordFields {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            password: Some("Secret#1".into()),
            gender: Gender::Male,
            dob: NaiveDate::from_ymd_opt(1970, 5, 17).unwrap(),
            country: Country::Canada,
            hobbies: vec![Hobby::Reading, Hobby::Gaming, Hobby::Music],
            message: "Nice to meet you".into(),
        }
    }

    #[tokio::test]
    async fn test_insert_keeps_legacy_document_shape() {
        let store = MemoryRecordStore::new();
        let id = store
            .insert(NewRecord {
                fields: fields("Alan"),
                file: Some("/media/files/cv.pdf".into()),
            })
            .await
            .unwrap();

        let doc = store.document(id).unwrap();
        assert_eq!(doc["hobbies"], json!("reading,gaming,music"));
        assert_eq!(doc["dob"], json!("1970-05-17"));
        assert_eq!(doc["country"], json!("CA"));
        assert_eq!(doc["file"], json!("/media/files/cv.pdf"));
        assert!(doc.get("createdAt").is_some());
    }

    #[tokio::test]
    async fn test_legacy_document_decodes_hobby_selection() {
        let store = MemoryRecordStore::new();
        let id = store.insert_document(json!({
            "name": "Legacy",
            "email": "legacy@example.com",
            "gender": "female",
            "dob": "1999-02-03",
            "country": "",
            "hobbies": "reading,gaming,music",
            "message": "imported document",
            "createdAt": "2024-05-22T10:57:00Z"
        }));

        let record = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(
            record.fields.hobbies,
            vec![Hobby::Reading, Hobby::Gaming, Hobby::Music]
        );
        assert_eq!(record.fields.password, None);
        assert_eq!(record.file, None);
    }

    #[tokio::test]
    async fn test_update_keeps_password_file_and_created_at() {
        let store = MemoryRecordStore::new();
        let id = store
            .insert(NewRecord {
                fields: fields("Alan"),
                file: Some("/media/files/cv.pdf".into()),
            })
            .await
            .unwrap();
        let before = store.find_by_id(id).await.unwrap().unwrap();

        let mut changed = fields("Turing");
        changed.password = None;
        assert!(store.update_by_id(id, &changed).await.unwrap());

        let after = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(after.fields.name, "Turing");
        assert_eq!(after.fields.password.as_deref(), Some("Secret#1"));
        assert_eq!(after.file, before.file);
        assert_eq!(after.created_at, before.created_at);

        assert!(!store.update_by_id(Uuid::now_v7(), &changed).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_counts() {
        let store = MemoryRecordStore::new();
        let id = store
            .insert(NewRecord {
                fields: fields("Alan"),
                file: None,
            })
            .await
            .unwrap();

        assert_eq!(store.delete_by_id(Uuid::now_v7()).await.unwrap(), 0);
        assert_eq!(store.delete_by_id(id).await.unwrap(), 1);
        assert_eq!(store.delete_by_id(id).await.unwrap(), 0);
        assert_eq!(store.count(&RecordFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_page_in_insertion_order_with_filter() {
        let store = MemoryRecordStore::new();
        for name in ["Ann", "Bob", "Cid", "Bea"] {
            store
                .insert(NewRecord {
                    fields: fields(name),
                    file: None,
                })
                .await
                .unwrap();
        }

        let all = RecordFilter::default();
        let page = store.find_page(&all, 1, 2).await.unwrap();
        let names: Vec<_> = page.iter().map(|r| r.fields.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Cid"]);

        let b = RecordFilter::search(Some("b"));
        assert_eq!(store.count(&b).await.unwrap(), 2);
        let page = store.find_page(&b, 0, 10).await.unwrap();
        let names: Vec<_> = page.iter().map(|r| r.fields.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Bea"]);

        assert!(store.find_page(&all, 10, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_reported() {
        let store = MemoryRecordStore::new();
        let id = store.insert_document(json!({"name": "broken"}));
        assert!(matches!(
            store.find_by_id(id).await,
            Err(StoreError::Corrupt(_))
        ));
    }
}
