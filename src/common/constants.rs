/// Canonical three-letter month abbreviations, January first
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Separator between identity key parts; a control character never present in airport names
pub const KEY_DELIMITER: char = '\u{1f}';

// Blob keys used by the persisted dataset
pub const RECORDS_BLOB_KEY: &str = "traffic_records";
pub const FILES_BLOB_KEY: &str = "processed_files";

// Document extensions routed to each text extraction strategy
pub const PDF_EXTENSIONS: [&str; 1] = ["pdf"];
pub const SPREADSHEET_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "csv"];
pub const PLAIN_TEXT_EXTENSIONS: [&str; 1] = ["txt"];

/// Suffix appended to the requested export name
pub const EXPORT_SUFFIX: &str = "_Master_Export.csv";

// Defaults for the field-extraction service
pub const DEFAULT_EXTRACTION_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_EXTRACTION_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Retries after the first failed extraction call
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

pub const DEFAULT_CONFIG_PATH: &str = "airport_traffic.toml";
pub const DEFAULT_STORE_PATH: &str = "data/traffic.db";
