use chrono::NaiveDate;
use validator::Validate;

use crate::core::config::FormVariant;
use crate::features::records::models::{Record, RecordFields};
use crate::features::records::services::validator::{
    validate_country, validate_dob, validate_file, validate_gender, validate_hobbies,
    validate_message, validate_password, FieldErrors, ValidationError, FILE_TOO_LARGE,
};

/// A file part of a multipart submission
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// The record form as submitted, every field still raw text
#[derive(Debug, Clone, Default, Validate)]
pub struct RecordFormDto {
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    pub name: String,

    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 100, message = "Ensure this value has at most 100 characters.")
    )]
    pub email: String,

    pub password: String,
    pub gender: String,
    pub dob: String,
    pub country: String,
    pub hobbies: Vec<String>,
    pub message: String,
    pub file: Option<UploadedFile>,

    /// The request body went past the size limit before it was fully read,
    /// so the submission is incomplete
    pub too_large: bool,
}

/// Whether the form creates a record or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit,
}

/// A submission that passed every check
#[derive(Debug, Clone)]
pub struct CleanedForm {
    pub fields: RecordFields,
    /// Only present when the variant carries an upload and one was sent
    pub file: Option<UploadedFile>,
}

impl RecordFormDto {
    /// Prefill from a stored record. The password is never echoed back.
    pub fn from_record(record: &Record) -> Self {
        let fields = &record.fields;
        Self {
            name: fields.name.clone(),
            email: fields.email.clone(),
            password: String::new(),
            gender: fields.gender.as_str().to_string(),
            dob: fields.dob.format("%Y-%m-%d").to_string(),
            country: fields.country.code().to_string(),
            hobbies: fields
                .hobbies
                .iter()
                .map(|h| h.as_str().to_string())
                .collect(),
            message: fields.message.clone(),
            file: None,
            too_large: false,
        }
    }

    /// Run every field check and collect all failures.
    ///
    /// In the `WithFile` variant a password and a PDF are required when
    /// adding; when editing, a blank password keeps the stored one and the
    /// upload is ignored.
    pub fn clean(
        &self,
        today: NaiveDate,
        variant: FormVariant,
        mode: FormMode,
    ) -> Result<CleanedForm, FieldErrors> {
        let name = self.name.trim();
        let email = self.email.trim();

        let mut errors = FieldErrors::default();
        for (field, value) in [("name", name), ("email", email)] {
            if value.is_empty() {
                errors.push(ValidationError::new(field, "This field is required."));
            }
        }

        // blank fields already carry "required"; syntax and length apply to
        // the trimmed values of the rest
        let trimmed = RecordFormDto {
            name: name.to_string(),
            email: email.to_string(),
            ..Default::default()
        };
        if let Err(e) = trimmed.validate() {
            errors.merge_missing(FieldErrors::from(e));
        }

        let mut check = |result: Result<(), ValidationError>| {
            if let Err(e) = result {
                errors.push(e);
            }
        };

        let gender = validate_gender(&self.gender);
        let dob = validate_dob(&self.dob, today);
        let country = validate_country(&self.country);
        let hobbies = validate_hobbies(&self.hobbies);
        let message = validate_message(&self.message);

        let mut password = None;
        let mut file = None;
        if variant.has_file_fields() {
            match (mode, self.password.is_empty()) {
                (FormMode::Edit, true) => {}
                (FormMode::Add, true) => {
                    check(Err(ValidationError::new("password", "This field is required.")))
                }
                (_, false) => match validate_password(&self.password) {
                    Ok(p) => password = Some(p),
                    Err(e) => check(Err(e)),
                },
            }

            if mode == FormMode::Add {
                match &self.file {
                    _ if self.too_large => {
                        check(Err(ValidationError::new("file", FILE_TOO_LARGE)))
                    }
                    None => check(Err(ValidationError::new("file", "This field is required."))),
                    Some(upload) => {
                        check(validate_file(upload));
                        file = Some(upload.clone());
                    }
                }
            }
        }

        // no upload field to blame, but a cut-off body must never be saved
        if self.too_large && !(variant.has_file_fields() && mode == FormMode::Add) {
            check(Err(ValidationError::new(
                "form",
                "The submission is too large to be processed.",
            )));
        }

        let cleaned = (gender, dob, country, hobbies, message);
        match cleaned {
            (Ok(gender), Ok(dob), Ok(country), Ok(hobbies), Ok(message)) if errors.is_empty() => {
                Ok(CleanedForm {
                    fields: RecordFields {
                        name: name.to_string(),
                        email: email.to_string(),
                        password,
                        gender,
                        dob,
                        country,
                        hobbies,
                        message,
                    },
                    file,
                })
            }
            (gender, dob, country, hobbies, message) => {
                for e in [
                    gender.err(),
                    dob.err(),
                    country.err(),
                    hobbies.err(),
                    message.err(),
                ]
                .into_iter()
                .flatten()
                {
                    errors.push(e);
                }
                Err(errors)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::records::models::{Country, Gender, Hobby};
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;
    use fake::Fake;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn valid_form() -> RecordFormDto {
        RecordFormDto {
            name: Name().fake(),
            email: SafeEmail().fake(),
            password: "Secret#1".into(),
            gender: "female".into(),
            dob: "1990-06-15".into(),
            country: "IN".into(),
            hobbies: vec!["reading".into(), "sports".into(), "music".into()],
            message: "Hello, this is long enough".into(),
            file: Some(UploadedFile {
                file_name: "resume.pdf".into(),
                content_type: "application/pdf".into(),
                data: b"%PDF-1.4".to_vec(),
            }),
            too_large: false,
        }
    }

    #[test]
    fn test_valid_form_cleans() {
        let form = valid_form();
        let cleaned = form
            .clean(today(), FormVariant::WithFile, FormMode::Add)
            .unwrap();

        assert_eq!(cleaned.fields.gender, Gender::Female);
        assert_eq!(cleaned.fields.country, Country::India);
        assert_eq!(
            cleaned.fields.hobbies,
            vec![Hobby::Reading, Hobby::Sports, Hobby::Music]
        );
        assert_eq!(cleaned.fields.password.as_deref(), Some("Secret#1"));
        assert!(cleaned.file.is_some());
    }

    #[test]
    fn test_all_errors_are_collected() {
        let form = RecordFormDto {
            name: String::new(),
            email: "not-an-email".into(),
            dob: "2010-01-01".into(),
            hobbies: vec!["reading".into()],
            message: "short".into(),
            ..valid_form()
        };

        let errors = form
            .clean(today(), FormVariant::WithFile, FormMode::Add)
            .unwrap_err();
        for field in ["name", "email", "dob", "hobbies", "message"] {
            assert!(errors.contains(field), "missing error for {field}");
        }
        assert!(!errors.contains("password"));
        assert!(!errors.contains("file"));
    }

    #[test]
    fn test_with_file_add_requires_password_and_file() {
        let form = RecordFormDto {
            password: String::new(),
            file: None,
            ..valid_form()
        };

        let errors = form
            .clean(today(), FormVariant::WithFile, FormMode::Add)
            .unwrap_err();
        assert_eq!(errors.get("password").unwrap(), ["This field is required."]);
        assert_eq!(errors.get("file").unwrap(), ["This field is required."]);
    }

    #[test]
    fn test_with_file_edit_keeps_blank_password_and_ignores_file() {
        let form = RecordFormDto {
            password: String::new(),
            file: None,
            ..valid_form()
        };

        let cleaned = form
            .clean(today(), FormVariant::WithFile, FormMode::Edit)
            .unwrap();
        assert_eq!(cleaned.fields.password, None);
        assert!(cleaned.file.is_none());
    }

    #[test]
    fn test_basic_variant_ignores_password_and_file() {
        let form = RecordFormDto {
            password: "weak".into(),
            file: None,
            ..valid_form()
        };

        let cleaned = form
            .clean(today(), FormVariant::Basic, FormMode::Add)
            .unwrap();
        assert_eq!(cleaned.fields.password, None);
        assert!(cleaned.file.is_none());
    }

    #[test]
    fn test_rejected_upload_is_reported() {
        let form = RecordFormDto {
            file: Some(UploadedFile {
                file_name: "photo.png".into(),
                content_type: "image/png".into(),
                data: vec![1, 2, 3],
            }),
            ..valid_form()
        };

        let errors = form
            .clean(today(), FormVariant::WithFile, FormMode::Add)
            .unwrap_err();
        assert_eq!(errors.get("file").unwrap(), ["Only PDF files are allowed."]);
    }

    #[test]
    fn test_blank_name_and_email_are_required() {
        let form = RecordFormDto {
            name: "   ".into(),
            email: "\t ".into(),
            ..valid_form()
        };

        let errors = form
            .clean(today(), FormVariant::Basic, FormMode::Add)
            .unwrap_err();
        assert_eq!(errors.get("name").unwrap(), ["This field is required."]);
        assert_eq!(errors.get("email").unwrap(), ["This field is required."]);
    }

    #[test]
    fn test_empty_name_reports_required() {
        let form = RecordFormDto {
            name: String::new(),
            ..valid_form()
        };

        let errors = form
            .clean(today(), FormVariant::Basic, FormMode::Add)
            .unwrap_err();
        assert_eq!(errors.get("name").unwrap(), ["This field is required."]);
    }

    #[test]
    fn test_name_and_email_are_stored_trimmed() {
        let form = RecordFormDto {
            name: "  Ada Lovelace ".into(),
            email: " ada@example.com\n".into(),
            ..valid_form()
        };

        let cleaned = form
            .clean(today(), FormVariant::Basic, FormMode::Add)
            .unwrap();
        assert_eq!(cleaned.fields.name, "Ada Lovelace");
        assert_eq!(cleaned.fields.email, "ada@example.com");
    }

    #[test]
    fn test_overlong_name_is_rejected() {
        let form = RecordFormDto {
            name: "x".repeat(101),
            ..valid_form()
        };

        let errors = form
            .clean(today(), FormVariant::Basic, FormMode::Add)
            .unwrap_err();
        assert_eq!(
            errors.get("name").unwrap(),
            ["Ensure this value has at most 100 characters."]
        );
    }

    #[test]
    fn test_cut_off_upload_reports_file_size() {
        let form = RecordFormDto {
            file: None,
            too_large: true,
            ..valid_form()
        };

        let errors = form
            .clean(today(), FormVariant::WithFile, FormMode::Add)
            .unwrap_err();
        assert_eq!(errors.get("file").unwrap(), [FILE_TOO_LARGE]);
    }

    #[test]
    fn test_cut_off_body_is_never_cleaned() {
        let form = RecordFormDto {
            too_large: true,
            ..valid_form()
        };

        let errors = form
            .clean(today(), FormVariant::Basic, FormMode::Add)
            .unwrap_err();
        assert!(errors.contains("form"));
        assert!(!errors.contains("file"));
    }

    #[test]
    fn test_from_record_prefills_selection() {
        let cleaned = valid_form()
            .clean(today(), FormVariant::WithFile, FormMode::Add)
            .unwrap();
        let record = Record {
            id: uuid::Uuid::now_v7(),
            fields: cleaned.fields,
            file: None,
            created_at: chrono::Utc::now(),
        };

        let form = RecordFormDto::from_record(&record);
        assert_eq!(form.hobbies, vec!["reading", "sports", "music"]);
        assert_eq!(form.dob, "1990-06-15");
        assert_eq!(form.country, "IN");
        assert!(form.password.is_empty());
    }
}
