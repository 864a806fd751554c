use serde::Serialize;

use crate::features::records::dtos::{FormMode, RecordFormDto};
use crate::features::records::models::{Country, Gender, Hobby, Record};
use crate::features::records::services::paginator::Page;
use crate::features::records::services::validator::FieldErrors;

/// One option of a radio group, select or checkbox list
#[derive(Debug, Clone, Serialize)]
pub struct ChoiceView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// A record as shown in the list; the id is its string form
#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub gender: &'static str,
    pub dob: String,
    pub country: &'static str,
    pub hobbies: String,
    pub message: String,
    pub file: Option<String>,
    pub created_at: String,
}

impl From<Record> for RecordView {
    fn from(r: Record) -> Self {
        Self {
            id: r.id.to_string(),
            name: r.fields.name,
            email: r.fields.email,
            gender: r.fields.gender.label(),
            dob: r.fields.dob.format("%Y-%m-%d").to_string(),
            country: r.fields.country.code(),
            hobbies: Hobby::join_delimited(&r.fields.hobbies),
            message: r.fields.message,
            file: r.file,
            created_at: r.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub current_page: u64,
    pub previous_page: u64,
    pub next_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Context of `list.html`
#[derive(Debug, Clone, Serialize)]
pub struct ListView {
    pub records: Vec<RecordView>,
    pub page: PageView,
    pub notice: Option<String>,
    pub search: Option<String>,
    /// Extra query string appended to page links, e.g. `&q=ada`
    pub query_suffix: String,
    pub list_url: &'static str,
    pub show_file: bool,
}

impl ListView {
    pub fn new(
        page: Page,
        notice: Option<String>,
        search: Option<String>,
        list_url: &'static str,
        show_file: bool,
    ) -> Self {
        let query_suffix = search
            .as_deref()
            .map(|q| format!("&q={}", urlencoding::encode(q)))
            .unwrap_or_default();

        Self {
            page: PageView {
                current_page: page.current_page,
                previous_page: page.previous_page,
                next_page: page.next_page,
                total_pages: page.total_pages,
                total_items: page.total_items,
                has_prev: page.has_prev,
                has_next: page.has_next,
            },
            records: page.items.into_iter().map(RecordView::from).collect(),
            notice,
            search,
            query_suffix,
            list_url,
            show_file,
        }
    }
}

/// Submitted (or prefilled) text values echoed back into the inputs
#[derive(Debug, Clone, Serialize)]
pub struct FormValues {
    pub name: String,
    pub email: String,
    pub dob: String,
    pub message: String,
}

/// Context of `form.html`
#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub title: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub values: FormValues,
    pub genders: Vec<ChoiceView>,
    pub countries: Vec<ChoiceView>,
    pub hobbies: Vec<ChoiceView>,
    pub errors: FieldErrors,
    pub show_password: bool,
    pub show_file: bool,
    pub password_required: bool,
    pub list_url: &'static str,
}

impl FormView {
    pub fn add(
        form: &RecordFormDto,
        errors: FieldErrors,
        show_file: bool,
        list_url: &'static str,
    ) -> Self {
        Self::build(form, errors, show_file, list_url, FormMode::Add, "/add".to_string())
    }

    pub fn edit(
        id: &str,
        form: &RecordFormDto,
        errors: FieldErrors,
        show_file: bool,
        list_url: &'static str,
    ) -> Self {
        Self::build(
            form,
            errors,
            show_file,
            list_url,
            FormMode::Edit,
            format!("/edit/{}", id),
        )
    }

    fn build(
        form: &RecordFormDto,
        errors: FieldErrors,
        show_file: bool,
        list_url: &'static str,
        mode: FormMode,
        action: String,
    ) -> Self {
        let (title, submit_label) = match mode {
            FormMode::Add => ("Add record", "Save"),
            FormMode::Edit => ("Edit record", "Update"),
        };

        let genders = Gender::ALL
            .iter()
            .map(|g| ChoiceView {
                value: g.as_str(),
                label: g.label(),
                selected: g.as_str() == form.gender
                    || (*g == Gender::NotSpecified && form.gender.is_empty()),
            })
            .collect();

        let countries = Country::ALL
            .iter()
            .map(|c| ChoiceView {
                value: c.code(),
                label: c.label(),
                selected: c.code() == form.country,
            })
            .collect();

        let hobbies = Hobby::ALL
            .iter()
            .map(|h| ChoiceView {
                value: h.as_str(),
                label: h.label(),
                selected: form.hobbies.iter().any(|s| s == h.as_str()),
            })
            .collect();

        Self {
            title,
            action,
            submit_label,
            values: FormValues {
                name: form.name.clone(),
                email: form.email.clone(),
                dob: form.dob.clone(),
                message: form.message.clone(),
            },
            genders,
            countries,
            hobbies,
            errors,
            show_password: show_file,
            // uploads are fixed once stored, so only the add form offers one
            show_file: show_file && mode == FormMode::Add,
            password_required: show_file && mode == FormMode::Add,
            list_url,
        }
    }
}

/// Context of `unavailable.html`
#[derive(Debug, Clone, Serialize)]
pub struct UnavailableView {
    pub message: String,
    pub list_url: &'static str,
}
