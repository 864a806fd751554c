pub mod record_handler;

pub use record_handler::{
    delete_record, list_records, show_add_form, show_edit_form, submit_add_form,
    submit_edit_form,
};
