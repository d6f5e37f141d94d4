use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A sheet-qualified range in A1 notation, e.g. `Logs!C7:C`, `JAN!Q15` or
/// `'January ($120.00)'!A1:Z1000`.
///
/// Rows and columns are held 0-indexed. A range whose end row is `None` is open-ended downward,
/// which is how `C7:C` reads "column C from row 7 to the last row with data". A missing start row
/// (as in `C:C`) is the first row of the sheet.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct A1Range {
    sheet: String,
    first_row: usize,
    first_col: usize,
    last_row: Option<usize>,
    last_col: usize,
}

impl A1Range {
    /// Creates a range on `sheet` from the cell part of A1 notation, e.g. `on("Logs", "C7:C")`.
    pub fn on(sheet: impl Into<String>, cells: &str) -> anyhow::Result<Self> {
        let sheet = sheet.into();
        if sheet.is_empty() {
            anyhow::bail!("A range needs a sheet name, got: {cells}");
        }
        let (start, end) = match cells.split_once(':') {
            Some((start, end)) => (start, Some(end)),
            None => (cells, None),
        };
        let (first_col, first_row) = parse_cell(start)?;
        let first_row = first_row.unwrap_or(0);
        let (last_col, last_row) = match end {
            Some(end) => parse_cell(end)?,
            // A single cell
            None => (first_col, Some(first_row)),
        };
        if last_col < first_col || last_row.is_some_and(|r| r < first_row) {
            anyhow::bail!("The end of range '{cells}' comes before its start");
        }
        Ok(Self {
            sheet,
            first_row,
            first_col,
            last_row,
            last_col,
        })
    }

    /// A single-row range covering columns `first_col..=last_col` of `row` (0-indexed).
    pub fn row(sheet: impl Into<String>, row: usize, first_col: usize, last_col: usize) -> Self {
        Self {
            sheet: sheet.into(),
            first_row: row,
            first_col,
            last_row: Some(row),
            last_col,
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn first_row(&self) -> usize {
        self.first_row
    }

    pub fn first_col(&self) -> usize {
        self.first_col
    }

    pub fn last_row(&self) -> Option<usize> {
        self.last_row
    }

    pub fn last_col(&self) -> usize {
        self.last_col
    }

    /// The number of columns spanned by this range.
    pub fn width(&self) -> usize {
        self.last_col - self.first_col + 1
    }

    fn is_single_cell(&self) -> bool {
        self.first_col == self.last_col && self.last_row == Some(self.first_row)
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sheet_name(f, &self.sheet)?;
        write!(
            f,
            "!{}{}",
            column_letters(self.first_col),
            self.first_row + 1
        )?;
        if self.is_single_cell() {
            return Ok(());
        }
        write!(f, ":{}", column_letters(self.last_col))?;
        if let Some(last_row) = self.last_row {
            write!(f, "{}", last_row + 1)?;
        }
        Ok(())
    }
}

impl FromStr for A1Range {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (sheet, cells) = if let Some(quoted) = s.strip_prefix('\'') {
            // Quoted sheet names escape a single quote by doubling it.
            let mut name = String::new();
            let mut chars = quoted.char_indices().peekable();
            let mut rest = None;
            while let Some((i, c)) = chars.next() {
                if c == '\'' {
                    if let Some((_, '\'')) = chars.peek() {
                        name.push('\'');
                        chars.next();
                        continue;
                    }
                    rest = Some(&quoted[i + 1..]);
                    break;
                }
                name.push(c);
            }
            let rest = rest.ok_or_else(|| anyhow::anyhow!("Unterminated sheet name in: {s}"))?;
            let cells = rest
                .strip_prefix('!')
                .ok_or_else(|| anyhow::anyhow!("Expected '!' after the sheet name in: {s}"))?;
            (name, cells)
        } else {
            let (sheet, cells) = s
                .split_once('!')
                .ok_or_else(|| anyhow::anyhow!("Range must be in format 'Sheet!A1:B2', got: {s}"))?;
            (sheet.to_string(), cells)
        };
        A1Range::on(sheet, cells)
    }
}

impl Serialize for A1Range {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for A1Range {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        A1Range::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Parses a cell reference like `C7`, `C` or `AA12` into a 0-indexed column and optional row.
fn parse_cell(s: &str) -> anyhow::Result<(usize, Option<usize>)> {
    let s = s.trim();
    let split = s.find(|c: char| c.is_ascii_digit()).unwrap_or(s.len());
    let (letters, digits) = s.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        anyhow::bail!("Invalid column in cell reference: {s}");
    }
    let col = letters
        .chars()
        .fold(0usize, |acc, c| acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1))
        - 1;
    let row = if digits.is_empty() {
        None
    } else {
        let row = digits
            .parse::<usize>()
            .map_err(|e| anyhow::anyhow!("Invalid row in cell reference {s}: {e}"))?;
        if row == 0 {
            anyhow::bail!("Rows are numbered from 1, got: {s}");
        }
        Some(row - 1)
    };
    Ok((col, row))
}

/// Converts a 0-indexed column to its letters, e.g. 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_letters(col: usize) -> String {
    let mut n = col + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn write_sheet_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        write!(f, "{name}")
    } else {
        write!(f, "'{}'", name.replace('\'', "''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_ended_column() {
        let range: A1Range = "Logs!C7:C".parse().unwrap();
        assert_eq!(range.sheet(), "Logs");
        assert_eq!(range.first_col(), 2);
        assert_eq!(range.first_row(), 6);
        assert_eq!(range.last_col(), 2);
        assert_eq!(range.last_row(), None);
        assert_eq!(range.to_string(), "Logs!C7:C");
    }

    #[test]
    fn test_whole_column() {
        let range: A1Range = "Logs!C:C".parse().unwrap();
        assert_eq!(range.first_row(), 0);
        assert_eq!(range.last_row(), None);
        // Equivalent notation, always written with its first row
        assert_eq!(range.to_string(), "Logs!C1:C");
    }

    #[test]
    fn test_single_cell() {
        let range = A1Range::on("JAN", "Q15").unwrap();
        assert_eq!(range.first_col(), 16);
        assert_eq!(range.first_row(), 14);
        assert_eq!(range.last_row(), Some(14));
        assert_eq!(range.to_string(), "JAN!Q15");
    }

    #[test]
    fn test_block() {
        let range = A1Range::on("JAN", "A1:Z1000").unwrap();
        assert_eq!(range.width(), 26);
        assert_eq!(range.last_row(), Some(999));
        assert_eq!(range.to_string(), "JAN!A1:Z1000");
    }

    #[test]
    fn test_row_range() {
        let range = A1Range::row("Logs", 9, 0, 6);
        assert_eq!(range.to_string(), "Logs!A10:G10");
    }

    #[test]
    fn test_quoted_sheet_name() {
        let range = A1Range::on("January ($120.00)", "A1:Z1000").unwrap();
        assert_eq!(range.to_string(), "'January ($120.00)'!A1:Z1000");
        let parsed: A1Range = range.to_string().parse().unwrap();
        assert_eq!(parsed, range);

        let range = A1Range::on("Bob's", "A1").unwrap();
        assert_eq!(range.to_string(), "'Bob''s'!A1");
        let parsed: A1Range = "'Bob''s'!A1".parse().unwrap();
        assert_eq!(parsed.sheet(), "Bob's");
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(51), "AZ");
        assert_eq!(column_letters(52), "BA");
        let range = A1Range::on("S", "AA3").unwrap();
        assert_eq!(range.first_col(), 26);
    }

    #[test]
    fn test_invalid() {
        assert!("C7:C".parse::<A1Range>().is_err()); // Missing sheet
        assert!("Logs!7:C".parse::<A1Range>().is_err()); // Missing column
        assert!("Logs!C0".parse::<A1Range>().is_err()); // Rows start at 1
        assert!("Logs!D1:C1".parse::<A1Range>().is_err()); // Backwards
        assert!("'Logs!C1".parse::<A1Range>().is_err()); // Unterminated quote
    }

    #[test]
    fn test_serialize() {
        let range = A1Range::on("JAN", "Q15").unwrap();
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(json, r#""JAN!Q15""#);
        let back: A1Range = serde_json::from_str(&json).unwrap();
        assert_eq!(back, range);
    }
}
