//! Where things live in the spreadsheet.
//!
//! These positions are fixed by the spreadsheet template that the bot was built for. Changing any
//! of them breaks compatibility with existing sheets.

/// The tab new records are appended to.
pub const LOGS: &str = "Logs";

/// Rows 1 through 6 of a ledger tab are title, header and formula rows. Records start on row 7.
pub const HEADER_ROWS: usize = 6;

/// The primary column of a record; its length decides where the next record goes.
pub const CREATOR_COLUMN: &str = "C:C";

/// The columns cleared when a record is removed: creator, link and price.
pub const TRACKED_COLUMNS: [&str; 3] = ["C:C", "E:E", "G:G"];

/// The record area read when listing records: creator, link, price and paid.
pub const RECORD_COLUMNS: [&str; 4] = ["C7:C", "E7:E", "G7:G", "J7:J"];

/// An appended row spans columns A through J (0-indexed), ending at the paid column so that a
/// reused row starts out unpaid.
pub const APPEND_FIRST_COL: usize = 0;
pub const APPEND_LAST_COL: usize = 9;

/// The list of known creator names on the Logs tab.
pub const CREATORS: &str = "P7:P18";

/// Summary cells of a month tab.
pub const EARNED_CELL: &str = "Q15";
pub const PENDING_CELL: &str = "Q18";
pub const WORK_DONE_CELL: &str = "Q21";

/// Everything on a month tab that an archive copy keeps.
pub const USED_RANGE: &str = "A1:Z1000";

/// The rows of a ledger tab that roll-over empties.
pub const RECORD_AREA: &str = "A7:G";

/// Archived months are inserted right after the first tab.
pub const ARCHIVE_INDEX: i64 = 1;
