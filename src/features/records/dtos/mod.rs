mod record_form_dto;
mod record_view_dto;

pub use record_form_dto::{FormMode, RecordFormDto, UploadedFile};
pub use record_view_dto::{FormView, ListView, UnavailableView};
