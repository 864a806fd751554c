/// Number of records shown on one list page
pub const PAGE_SIZE: u64 = 10;

/// Largest accepted upload, in bytes (5 MiB)
pub const MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

/// Accepted upload extension, compared case-insensitively
pub const UPLOAD_EXTENSION: &str = ".pdf";

/// Minimum age, in whole years, to register
pub const MINIMUM_AGE: i32 = 18;

/// Minimum number of distinct hobbies a record must list
pub const MIN_HOBBIES: usize = 3;

/// Inclusive message length bounds, in characters
pub const MESSAGE_MIN_LEN: usize = 8;
pub const MESSAGE_MAX_LEN: usize = 300;

pub const PASSWORD_MAX_LEN: usize = 40;

/// Characters that satisfy the "special character" password rule
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()-_=+[]{};:'\",.<>/?\\|`~";
