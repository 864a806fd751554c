use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;

use crate::core::config::FormVariant;
use crate::features::records::handlers::{
    delete_record, list_records, show_add_form, show_edit_form, submit_add_form,
    submit_edit_form,
};
use crate::features::records::services::RecordService;

/// Create routes for the record pages.
///
/// The basic variant lists records at `/`; the with-file variant serves the
/// add form there and lists at `/list`.
pub fn routes(service: Arc<RecordService>, body_limit: usize) -> Router {
    let root = match service.variant() {
        FormVariant::Basic => get(list_records),
        FormVariant::WithFile => get(show_add_form).post(submit_add_form),
    };

    Router::new()
        .route("/", root)
        .route("/list", get(list_records))
        .route("/add", get(show_add_form).post(submit_add_form))
        .route("/edit/{id}", get(show_edit_form).post(submit_edit_form))
        .route("/delete/{id}", get(delete_record))
        // uploads are capped separately; this only bounds the whole body
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::LocalStorageConfig;
    use crate::features::records::models::RecordFilter;
    use crate::features::records::store::{MemoryRecordStore, RecordStore};
    use crate::modules::storage::LocalUploadStorage;
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use chrono::{Local, Months};
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;
    use fake::Fake;
    use tempfile::TempDir;

    const BODY_LIMIT: usize = 10 * 1024 * 1024;

    struct App {
        server: TestServer,
        store: Arc<MemoryRecordStore>,
        _media: TempDir,
    }

    fn app_with(variant: FormVariant, with_store: bool) -> App {
        let media = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryRecordStore::new());
        let uploads = Arc::new(LocalUploadStorage::new(LocalStorageConfig {
            media_root: media.path().to_path_buf(),
            media_url: "/media".to_string(),
        }));
        let handle: Option<Arc<dyn RecordStore>> = if with_store {
            Some(store.clone())
        } else {
            None
        };
        let service = Arc::new(RecordService::new(handle, uploads, variant));
        let server = TestServer::new(routes(service, BODY_LIMIT)).unwrap();
        App {
            server,
            store,
            _media: media,
        }
    }

    fn dob_years_ago(years: u32) -> String {
        Local::now()
            .date_naive()
            .checked_sub_months(Months::new(years * 12))
            .unwrap()
            .format("%Y-%m-%d")
            .to_string()
    }

    fn submission(dob: &str) -> MultipartForm {
        let name: String = Name().fake();
        let email: String = SafeEmail().fake();
        MultipartForm::new()
            .add_text("name", name)
            .add_text("email", email)
            .add_text("password", "Secret#1")
            .add_text("gender", "male")
            .add_text("dob", dob.to_string())
            .add_text("country", "US")
            .add_text("hobbies", "reading")
            .add_text("hobbies", "gaming")
            .add_text("hobbies", "music")
            .add_text("message", "Nice to meet you all")
            .add_part(
                "file",
                Part::bytes(b"%PDF-1.4 test".to_vec())
                    .file_name("resume.pdf")
                    .mime_type("application/pdf"),
            )
    }

    async fn count(store: &MemoryRecordStore) -> u64 {
        store.count(&RecordFilter::default()).await.unwrap()
    }

    fn location(response: &axum_test::TestResponse) -> String {
        response
            .header("location")
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_underage_submission_rerenders_form() {
        let app = app_with(FormVariant::WithFile, true);

        let response = app
            .server
            .post("/add")
            .multipart(submission(&dob_years_ago(17)))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response
            .text()
            .contains("You must be at least 18 years old to register."));
        assert_eq!(count(&app.store).await, 0);
    }

    #[tokio::test]
    async fn test_valid_submission_redirects_to_list() {
        let app = app_with(FormVariant::WithFile, true);

        let response = app
            .server
            .post("/")
            .multipart(submission(&dob_years_ago(30)))
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("/list?notice="));
        assert_eq!(count(&app.store).await, 1);

        let list = app.server.get("/list").await;
        list.assert_status_ok();
        assert!(list.text().contains("reading,gaming,music"));
    }

    #[tokio::test]
    async fn test_blank_name_is_not_stored() {
        let app = app_with(FormVariant::Basic, true);

        // a repeated part replaces the earlier value
        let form = submission(&dob_years_ago(30)).add_text("name", "   ");
        let response = app.server.post("/add").multipart(form).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.text().contains("This field is required."));
        assert_eq!(count(&app.store).await, 0);
    }

    #[tokio::test]
    async fn test_upload_over_body_limit_rerenders_form() {
        let app = app_with(FormVariant::WithFile, true);

        let form = MultipartForm::new()
            .add_text("name", "Ada Lovelace")
            .add_text("email", "ada@example.com")
            .add_text("password", "Secret#1")
            .add_text("gender", "female")
            .add_text("dob", dob_years_ago(30))
            .add_text("country", "US")
            .add_text("hobbies", "reading")
            .add_text("hobbies", "music")
            .add_text("hobbies", "sports")
            .add_text("message", "Analytical engines")
            .add_part(
                "file",
                Part::bytes(vec![0u8; 11 * 1024 * 1024])
                    .file_name("cv.pdf")
                    .mime_type("application/pdf"),
            );
        let response = app.server.post("/add").multipart(form).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response
            .text()
            .contains("File size must be no more than 5 MB."));
        assert_eq!(count(&app.store).await, 0);
    }

    #[tokio::test]
    async fn test_edit_page_prefills_and_updates() {
        let app = app_with(FormVariant::Basic, true);
        app.server
            .post("/add")
            .multipart(submission(&dob_years_ago(40)))
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let record = app
            .store
            .find_page(&RecordFilter::default(), 0, 1)
            .await
            .unwrap()
            .remove(0);
        let edit_url = format!("/edit/{}", record.id);

        let page = app.server.get(&edit_url).await;
        page.assert_status_ok();
        assert!(page.text().contains(&record.fields.email));

        let form = MultipartForm::new()
            .add_text("name", "Grace Hopper")
            .add_text("email", "grace@example.com")
            .add_text("gender", "female")
            .add_text("dob", dob_years_ago(50))
            .add_text("country", "US")
            .add_text("hobbies", "sports")
            .add_text("hobbies", "music")
            .add_text("hobbies", "traveling")
            .add_text("message", "Compilers all the way down");
        let response = app.server.post(&edit_url).multipart(form).await;
        response.assert_status(StatusCode::SEE_OTHER);

        let updated = app.store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(updated.fields.name, "Grace Hopper");
        assert_eq!(updated.created_at, record.created_at);
    }

    #[tokio::test]
    async fn test_delete_missing_record_redirects() {
        let app = app_with(FormVariant::Basic, true);
        app.server
            .post("/add")
            .multipart(submission(&dob_years_ago(25)))
            .await;

        let response = app
            .server
            .get(&format!("/delete/{}", uuid::Uuid::now_v7()))
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        assert_eq!(count(&app.store).await, 1);
    }

    #[tokio::test]
    async fn test_page_out_of_range_redirects() {
        let app = app_with(FormVariant::Basic, true);
        for _ in 0..3 {
            app.server
                .post("/add")
                .multipart(submission(&dob_years_ago(20)))
                .await;
        }

        let response = app.server.get("/").add_query_param("page", "2").await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");

        let response = app.server.get("/").add_query_param("page", "zero").await;
        response.assert_status(StatusCode::SEE_OTHER);

        app.server
            .get("/")
            .add_query_param("page", "1")
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_missing_store_renders_degraded_page() {
        let app = app_with(FormVariant::WithFile, false);

        let response = app.server.get("/list").await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.text().contains("Database connection failed"));

        // the add form itself does not need the store
        app.server.get("/").await.assert_status_ok();
    }
}
