mod record;

pub use record::{
    Country, Gender, Hobby, NewRecord, Record, RecordFields, RecordFilter, UnknownChoice,
};
