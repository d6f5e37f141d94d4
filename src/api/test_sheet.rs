//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets.

use crate::api::{Sheet, Tab, ValueInput};
use crate::ledger::layout;
use crate::model::{A1Range, Period};
use crate::Result;
use anyhow::{bail, Context};
use chrono::Local;
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::{Mutex, MutexGuard};

/// How many times each `Sheet` method has been called. Tests use this to prove that an operation
/// did, or did not, reach the store.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct Calls {
    pub batch_get: usize,
    pub get: usize,
    pub update: usize,
    pub clear: usize,
    pub tabs: usize,
    pub duplicate_tab: usize,
    pub rename_tab: usize,
    pub set_hidden: usize,
}

/// A `Sheet` method, used to make a single kind of call fail.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Op {
    BatchGet,
    Get,
    Update,
    Clear,
    Tabs,
    DuplicateTab,
    RenameTab,
    SetHidden,
}

/// One tab of a `TestSheet`. Rows may be ragged; missing cells read as empty.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct TestTab {
    pub id: i64,
    pub title: String,
    pub hidden: bool,
    pub cells: Vec<Vec<String>>,
}

impl TestTab {
    pub fn new(id: i64, title: impl Into<String>, cells: Vec<Vec<String>>) -> Self {
        Self {
            id,
            title: title.into(),
            hidden: false,
            cells,
        }
    }

    /// The value at 0-indexed `row` and `col`, empty when out of bounds.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Sets the value at 0-indexed `row` and `col`, growing the grid as needed.
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if self.cells.len() <= row {
            self.cells.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.cells[row];
        if cells.len() <= col {
            cells.resize_with(col + 1, String::new);
        }
        cells[col] = value.into();
    }

    /// Reads `range` the way the Sheets API does: trailing empty cells and rows are dropped.
    fn read(&self, range: &A1Range) -> Vec<Vec<String>> {
        let last_row = match range.last_row() {
            Some(last_row) => last_row,
            None if self.cells.is_empty() => return Vec::new(),
            None => self.cells.len() - 1,
        };
        let mut rows: Vec<Vec<String>> = (range.first_row()..=last_row)
            .map(|row| {
                let mut values: Vec<String> = (range.first_col()..=range.last_col())
                    .map(|col| self.cell(row, col).to_string())
                    .collect();
                while values.last().is_some_and(|v| v.is_empty()) {
                    values.pop();
                }
                values
            })
            .collect();
        while rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }
        rows
    }

    fn clear(&mut self, range: &A1Range) {
        let last_row = range
            .last_row()
            .unwrap_or(self.cells.len().saturating_sub(1));
        for row in range.first_row()..=last_row.min(self.cells.len().saturating_sub(1)) {
            for col in range.first_col()..=range.last_col() {
                if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
                    cell.clear();
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct State {
    /// In tab order.
    tabs: Vec<TestTab>,
    calls: Calls,
    offline: bool,
    failing: HashSet<Op>,
}

impl State {
    fn tab(&self, title: &str) -> Result<&TestTab> {
        self.tabs
            .iter()
            .find(|t| t.title == title)
            .with_context(|| format!("Unable to parse range: sheet '{title}' not found"))
    }

    fn tab_mut(&mut self, title: &str) -> Result<&mut TestTab> {
        self.tabs
            .iter_mut()
            .find(|t| t.title == title)
            .with_context(|| format!("Unable to parse range: sheet '{title}' not found"))
    }

    fn position(&self, id: i64) -> Result<usize> {
        self.tabs
            .iter()
            .position(|t| t.id == id)
            .with_context(|| format!("No sheet with id {id}"))
    }

    fn check(&self, op: Op) -> Result<()> {
        if self.offline {
            bail!("The test sheet is offline");
        }
        if self.failing.contains(&op) {
            bail!("The test sheet failed a {op:?} call");
        }
        Ok(())
    }
}

/// An implementation of the `Sheet` trait that does not use Google sheets. It holds its tabs in
/// memory and, by default, is seeded with a ledger template for the current month.
#[derive(Debug)]
pub struct TestSheet {
    state: Mutex<State>,
}

impl TestSheet {
    /// Create a new `TestSheet` holding `tabs` in the given order.
    pub fn new(tabs: Vec<TestTab>) -> Self {
        Self {
            state: Mutex::new(State {
                tabs,
                ..State::default()
            }),
        }
    }

    /// A `TestSheet` with a `Logs` tab holding two records and a tab for `period` holding the same
    /// records and summary values.
    pub fn seeded(period: Period) -> Self {
        Self::new(seed_tabs(period))
    }

    /// When offline every call fails, as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Every later call of `op` fails while the others keep working.
    pub fn fail_on(&self, op: Op) {
        self.lock().failing.insert(op);
    }

    pub fn calls(&self) -> Calls {
        self.lock().calls
    }

    /// A copy of the tab titled `title`.
    pub fn tab(&self, title: &str) -> Option<TestTab> {
        self.lock().tab(title).ok().cloned()
    }

    /// Adds `tab` after the existing tabs.
    pub fn add_tab(&self, tab: TestTab) {
        self.lock().tabs.push(tab);
    }

    /// Titles in tab order.
    pub fn titles(&self) -> Vec<String> {
        self.lock().tabs.iter().map(|t| t.title.clone()).collect()
    }

    /// Sets a single cell, e.g. `set_cell("JAN", "Q15", "$120.00")`.
    pub fn set_cell(&self, sheet: &str, cell: &str, value: &str) -> Result<()> {
        let range = A1Range::on(sheet, cell)?;
        let mut state = self.lock();
        state
            .tab_mut(sheet)?
            .set(range.first_row(), range.first_col(), value);
        Ok(())
    }

    /// Reads a single cell, e.g. `cell("Logs", "C7")`.
    pub fn cell(&self, sheet: &str, cell: &str) -> Result<String> {
        let range = A1Range::on(sheet, cell)?;
        let state = self.lock();
        Ok(state
            .tab(sheet)?
            .cell(range.first_row(), range.first_col())
            .to_string())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn batch_get(&self, ranges: &[A1Range]) -> Result<Vec<Vec<Vec<String>>>> {
        let mut state = self.lock();
        state.calls.batch_get += 1;
        state.check(Op::BatchGet)?;
        ranges
            .iter()
            .map(|range| Ok(state.tab(range.sheet())?.read(range)))
            .collect()
    }

    async fn get(&self, range: &A1Range) -> Result<Vec<Vec<String>>> {
        let mut state = self.lock();
        state.calls.get += 1;
        state.check(Op::Get)?;
        Ok(state.tab(range.sheet())?.read(range))
    }

    async fn update(
        &self,
        range: &A1Range,
        values: Vec<Vec<String>>,
        _input: ValueInput,
    ) -> Result<()> {
        let mut state = self.lock();
        state.calls.update += 1;
        state.check(Op::Update)?;
        let tab = state.tab_mut(range.sheet())?;
        for (r, row) in values.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate().take(range.width()) {
                tab.set(range.first_row() + r, range.first_col() + c, value);
            }
        }
        Ok(())
    }

    async fn clear(&self, ranges: &[A1Range]) -> Result<()> {
        let mut state = self.lock();
        state.calls.clear += 1;
        state.check(Op::Clear)?;
        // Validate every range before touching anything, like a batch request would.
        for range in ranges {
            state.tab(range.sheet())?;
        }
        for range in ranges {
            state.tab_mut(range.sheet())?.clear(range);
        }
        Ok(())
    }

    async fn tabs(&self) -> Result<Vec<Tab>> {
        let mut state = self.lock();
        state.calls.tabs += 1;
        state.check(Op::Tabs)?;
        Ok(state
            .tabs
            .iter()
            .enumerate()
            .map(|(index, t)| Tab {
                id: t.id,
                title: t.title.clone(),
                index: index as i64,
                hidden: t.hidden,
            })
            .collect())
    }

    async fn duplicate_tab(&self, source_id: i64, index: i64, title: &str) -> Result<Tab> {
        let mut state = self.lock();
        state.calls.duplicate_tab += 1;
        state.check(Op::DuplicateTab)?;
        if state.tabs.iter().any(|t| t.title == title) {
            bail!("A sheet with the name \"{title}\" already exists");
        }
        let source = state.position(source_id)?;
        let id = state.tabs.iter().map(|t| t.id).max().unwrap_or_default() + 1;
        let mut copy = state.tabs[source].clone();
        copy.id = id;
        copy.title = title.to_string();
        let index = usize::try_from(index).unwrap_or_default().min(state.tabs.len());
        state.tabs.insert(index, copy);
        Ok(Tab {
            id,
            title: title.to_string(),
            index: index as i64,
            hidden: state.tabs[index].hidden,
        })
    }

    async fn rename_tab(&self, id: i64, title: &str) -> Result<()> {
        let mut state = self.lock();
        state.calls.rename_tab += 1;
        state.check(Op::RenameTab)?;
        if state.tabs.iter().any(|t| t.title == title && t.id != id) {
            bail!("A sheet with the name \"{title}\" already exists");
        }
        let position = state.position(id)?;
        state.tabs[position].title = title.to_string();
        Ok(())
    }

    async fn set_hidden(&self, id: i64, hidden: bool) -> Result<()> {
        let mut state = self.lock();
        state.calls.set_hidden += 1;
        state.check(Op::SetHidden)?;
        let position = state.position(id)?;
        state.tabs[position].hidden = hidden;
        Ok(())
    }
}

impl Default for TestSheet {
    /// Seeded with a ledger for the current month.
    fn default() -> Self {
        Self::seeded(Period::containing(Local::now().date_naive()))
    }
}

fn seed_tabs(period: Period) -> Vec<TestTab> {
    // The seed data is a compile-time constant, so failing to parse it is a programming error
    // that every test would catch.
    let logs = load_csv(LOGS_DATA).unwrap_or_default();
    let mut month = TestTab::new(0, period.abbreviation(), logs.clone());
    for (cell, value) in [
        (layout::EARNED_CELL, "$22.50"),
        (layout::PENDING_CELL, "$12.50"),
        (layout::WORK_DONE_CELL, "2"),
    ] {
        if let Ok(range) = A1Range::on(period.abbreviation(), cell) {
            month.set(range.first_row(), range.first_col(), value);
        }
    }
    vec![month, TestTab::new(1, layout::LOGS, logs)]
}

/// Loads data from a CSV-formatted string. Rows may have different lengths.
fn load_csv(csv_data: &str) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false) // Ensure headers are treated as part of the data
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

/// Seed ledger data. Rows 1 through 6 are the header band; records start on row 7 in columns C, E,
/// G and J. Column P lists the known creators.
const LOGS_DATA: &str = r##",,Work Log
,
,
,
,
,,Creator,,Link,,Price,,,Paid,,,,,,Creators
,,alice,,https://i.ibb.co/a1b2c3/first.png,,10.00,,,TRUE,,,,,,alice
,,bob,,https://i.ibb.co/d4e5f6/second.png,,12.50,,,FALSE,,,,,,bob
,,,,,,,,,,,,,,,carol
"##;
