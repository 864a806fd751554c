use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::config::FormVariant;
use crate::core::error::{AppError, Result};
use crate::features::records::dtos::{
    FormMode, FormView, ListView, RecordFormDto, UnavailableView,
};
use crate::features::records::models::{NewRecord, RecordFilter};
use crate::features::records::services::paginator::Paginator;
use crate::features::records::services::validator::FieldErrors;
use crate::features::records::store::{RecordStore, StoreError, StoreResult};
use crate::modules::storage::UploadStorage;

const NOTICE_ADDED: &str = "Record added.";
const NOTICE_UPDATED: &str = "Record updated.";
const NOTICE_DELETED: &str = "Record deleted.";
const NOTICE_NOT_FOUND: &str = "Record not found.";
const NOTICE_SAVE_FAILED: &str = "The record could not be saved. Please try again.";
const NOTICE_UPDATE_FAILED: &str = "The record could not be updated. Please try again.";
const NOTICE_DELETE_FAILED: &str = "The record could not be deleted. Please try again.";

/// What a workflow step wants the HTTP layer to do
#[derive(Debug)]
pub enum Outcome {
    /// Render the record list
    List(ListView),
    /// Render a fresh or prefilled form
    Form(FormView),
    /// Re-render a rejected submission with its errors
    Invalid(FormView),
    /// Redirect (303) to a location
    Redirect(String),
    /// The record store cannot be reached
    Unavailable(UnavailableView),
}

/// Drives the add, edit, delete and list workflows.
///
/// The store handle is `None` when no database is configured; every
/// workflow that needs it then degrades instead of failing.
pub struct RecordService {
    store: Option<Arc<dyn RecordStore>>,
    uploads: Arc<dyn UploadStorage>,
    variant: FormVariant,
    paginator: Paginator,
}

impl RecordService {
    pub fn new(
        store: Option<Arc<dyn RecordStore>>,
        uploads: Arc<dyn UploadStorage>,
        variant: FormVariant,
    ) -> Self {
        Self {
            store,
            uploads,
            variant,
            paginator: Paginator::default(),
        }
    }

    pub fn variant(&self) -> FormVariant {
        self.variant
    }

    /// Close the store's connections on shutdown
    pub async fn shutdown(&self) {
        if let Some(store) = &self.store {
            store.close().await;
        }
    }

    fn store(&self) -> StoreResult<&dyn RecordStore> {
        self.store
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("no record store is configured".to_string()))
    }

    /// Ages are judged against the server's local calendar date
    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    fn list_path(&self) -> &'static str {
        self.variant.list_path()
    }

    /// List location carrying a flash notice
    fn list_url_with_notice(&self, notice: &str) -> String {
        format!("{}?notice={}", self.list_path(), urlencoding::encode(notice))
    }

    /// The canonical (first page) list location, keeping any search term
    fn canonical_list_url(&self, search: Option<&str>) -> String {
        match search {
            Some(q) => format!("{}?q={}", self.list_path(), urlencoding::encode(q)),
            None => self.list_path().to_string(),
        }
    }

    fn unavailable(&self, e: &StoreError) -> Outcome {
        warn!("Record store unavailable: {}", e);
        Outcome::Unavailable(UnavailableView {
            message: "Database connection failed".to_string(),
            list_url: self.list_path(),
        })
    }

    fn add_view(&self, form: &RecordFormDto, errors: FieldErrors) -> FormView {
        FormView::add(form, errors, self.variant.has_file_fields(), self.list_path())
    }

    fn edit_view(&self, id: &str, form: &RecordFormDto, errors: FieldErrors) -> FormView {
        FormView::edit(
            id,
            form,
            errors,
            self.variant.has_file_fields(),
            self.list_path(),
        )
    }

    /// `page` is taken as the raw query value: absent means page 1, and
    /// anything but a positive integer sends the caller back to the
    /// canonical list, as does a page past the end.
    pub async fn list(
        &self,
        page: Option<&str>,
        search: Option<&str>,
        notice: Option<String>,
    ) -> Result<Outcome> {
        let store = match self.store() {
            Ok(store) => store,
            Err(e) => return Ok(self.unavailable(&e)),
        };

        let filter = RecordFilter::search(search);
        let search = filter.search.clone();

        let Some(requested_page) = parse_page(page) else {
            return Ok(Outcome::Redirect(
                self.canonical_list_url(search.as_deref()),
            ));
        };

        let page = match self.paginator.paginate(store, &filter, requested_page).await {
            Ok(page) => page,
            Err(e) if e.is_unavailable() => return Ok(self.unavailable(&e)),
            Err(e) => {
                error!("Failed to list records: {:?}", e);
                return Err(AppError::Store(e));
            }
        };

        if page.is_sentinel() {
            return Ok(Outcome::Redirect(
                self.canonical_list_url(search.as_deref()),
            ));
        }

        Ok(Outcome::List(ListView::new(
            page,
            notice.filter(|n| !n.is_empty()),
            search,
            self.list_path(),
            self.variant.has_file_fields(),
        )))
    }

    pub fn add_form(&self) -> Outcome {
        Outcome::Form(self.add_view(&RecordFormDto::default(), FieldErrors::default()))
    }

    pub async fn add(&self, form: RecordFormDto) -> Result<Outcome> {
        let store = match self.store() {
            Ok(store) => store,
            Err(e) => return Ok(self.unavailable(&e)),
        };

        let cleaned = match form.clean(Self::today(), self.variant, FormMode::Add) {
            Ok(cleaned) => cleaned,
            Err(errors) => return Ok(Outcome::Invalid(self.add_view(&form, errors))),
        };

        // The upload is written before the record; it is not removed again
        // if the insert fails.
        let file = match cleaned.file {
            Some(upload) => Some(
                self.uploads
                    .save(&upload.file_name, upload.data, &upload.content_type)
                    .await?,
            ),
            None => None,
        };

        match store
            .insert(NewRecord {
                fields: cleaned.fields,
                file,
            })
            .await
        {
            Ok(id) => {
                info!("Record created: id={}", id);
                Ok(Outcome::Redirect(self.list_url_with_notice(NOTICE_ADDED)))
            }
            Err(e) if e.is_unavailable() => Ok(self.unavailable(&e)),
            Err(e) => {
                error!("Failed to insert record: {:?}", e);
                Ok(Outcome::Redirect(
                    self.list_url_with_notice(NOTICE_SAVE_FAILED),
                ))
            }
        }
    }

    pub async fn edit_form(&self, id: &str) -> Result<Outcome> {
        let store = match self.store() {
            Ok(store) => store,
            Err(e) => return Ok(self.unavailable(&e)),
        };

        let Ok(record_id) = Uuid::parse_str(id) else {
            return Ok(Outcome::Redirect(
                self.list_url_with_notice(NOTICE_NOT_FOUND),
            ));
        };

        match store.find_by_id(record_id).await {
            Ok(Some(record)) => {
                let form = RecordFormDto::from_record(&record);
                Ok(Outcome::Form(self.edit_view(
                    &record.id.to_string(),
                    &form,
                    FieldErrors::default(),
                )))
            }
            Ok(None) => Ok(Outcome::Redirect(
                self.list_url_with_notice(NOTICE_NOT_FOUND),
            )),
            Err(e) if e.is_unavailable() => Ok(self.unavailable(&e)),
            Err(e) => {
                error!("Failed to load record {}: {:?}", record_id, e);
                Err(AppError::Store(e))
            }
        }
    }

    pub async fn edit(&self, id: &str, form: RecordFormDto) -> Result<Outcome> {
        let store = match self.store() {
            Ok(store) => store,
            Err(e) => return Ok(self.unavailable(&e)),
        };

        let Ok(record_id) = Uuid::parse_str(id) else {
            return Ok(Outcome::Redirect(
                self.list_url_with_notice(NOTICE_NOT_FOUND),
            ));
        };

        let cleaned = match form.clean(Self::today(), self.variant, FormMode::Edit) {
            Ok(cleaned) => cleaned,
            Err(errors) => {
                return Ok(Outcome::Invalid(self.edit_view(
                    &record_id.to_string(),
                    &form,
                    errors,
                )))
            }
        };

        match store.update_by_id(record_id, &cleaned.fields).await {
            Ok(true) => {
                info!("Record updated: id={}", record_id);
                Ok(Outcome::Redirect(self.list_url_with_notice(NOTICE_UPDATED)))
            }
            Ok(false) => Ok(Outcome::Redirect(
                self.list_url_with_notice(NOTICE_NOT_FOUND),
            )),
            Err(e) if e.is_unavailable() => Ok(self.unavailable(&e)),
            Err(e) => {
                error!("Failed to update record {}: {:?}", record_id, e);
                Ok(Outcome::Redirect(
                    self.list_url_with_notice(NOTICE_UPDATE_FAILED),
                ))
            }
        }
    }

    /// Deleting an id that does not exist is not an error; the caller lands
    /// on the list either way.
    pub async fn delete(&self, id: &str) -> Result<Outcome> {
        let store = match self.store() {
            Ok(store) => store,
            Err(e) => return Ok(self.unavailable(&e)),
        };

        let Ok(record_id) = Uuid::parse_str(id) else {
            return Ok(Outcome::Redirect(self.list_path().to_string()));
        };

        match store.delete_by_id(record_id).await {
            Ok(0) => Ok(Outcome::Redirect(self.list_path().to_string())),
            Ok(_) => {
                info!("Record deleted: id={}", record_id);
                Ok(Outcome::Redirect(self.list_url_with_notice(NOTICE_DELETED)))
            }
            Err(e) if e.is_unavailable() => Ok(self.unavailable(&e)),
            Err(e) => {
                error!("Failed to delete record {}: {:?}", record_id, e);
                Ok(Outcome::Redirect(
                    self.list_url_with_notice(NOTICE_DELETE_FAILED),
                ))
            }
        }
    }
}

/// `None` for anything that is not a positive integer
fn parse_page(raw: Option<&str>) -> Option<u64> {
    match raw.map(str::trim) {
        None | Some("") => Some(1),
        Some(value) => value.parse::<u64>().ok().filter(|p| *p >= 1),
    }
}
