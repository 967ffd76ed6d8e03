//! Flat-file record store.
//!
//! Every table is a UTF-8 text file holding one `|`-delimited record per line.
//! Lines that are not valid UTF-8 are skipped like any other malformed line.
//! [`RecordStore::append`] adds a line. Every other mutation goes through a
//! whole-table rewrite: read all lines, replace or drop the matching ones,
//! write all lines back.
//!
//! # Single writer
//!
//! Rewrites take no lock and do not swap files atomically. Only one process
//! may have a store open at a time. A crash during a rewrite can leave a
//! truncated table, and a crash between two rewrites that belong together
//! leaves both tables syntactically valid but out of step. The latter case is
//! detectable through the journal (see [`RecordStore::journalled`]).

mod schema;
mod appointments;
mod outcomes;
mod prescriptions;
mod bills;
mod medicines;
mod accounts;
mod sequence;
mod journal;

pub use schema::*;
pub use sequence::*;
pub use journal::*;
pub(crate) use accounts::{PatientRow, StaffRow};

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Split, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::StoreConfig;

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed field: {0}")]
    Parse(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A type that maps onto one line of a table.
pub trait Record: Sized {
    /// Layout of the backing table.
    const TABLE: TableSpec;

    /// Primary key.
    fn key(&self) -> &str;

    /// Field values in column order. Delimiters inside values are replaced on write.
    fn to_fields(&self) -> Vec<String>;

    /// Build a record from a line already split into `TABLE.total_fields` fields.
    fn from_fields(fields: &[&str]) -> StoreResult<Self>;
}

/// Parse a typed field, naming it in the error.
pub(crate) fn parse_field<T: FromStr>(name: &str, value: &str) -> StoreResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| StoreError::Parse(format!("{}: {:?}", name, value)))
}

/// Empty column → `None`.
pub(crate) fn optional_field(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn sanitize(value: &str) -> String {
    value.replace([FIELD_DELIMITER, '\n', '\r'], " ")
}

pub(crate) fn encode_line(fields: &[String]) -> String {
    let mut line = String::new();
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            line.push(FIELD_DELIMITER);
        }
        line.push_str(&sanitize(field));
    }
    line
}

fn split_line<'l>(table: &TableSpec, line: &'l str) -> Option<Vec<&'l str>> {
    let mut fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() < table.required_fields || fields.len() > table.total_fields {
        return None;
    }
    fields.resize(table.total_fields, "");
    Some(fields)
}

/// Parse one line, logging and discarding it if it does not fit the table.
fn parse_line<R: Record>(line: &str, line_no: usize) -> Option<R> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return None;
    }

    let Some(fields) = split_line(&R::TABLE, line) else {
        warn!(
            table = R::TABLE.name,
            line = line_no,
            required = R::TABLE.required_fields,
            total = R::TABLE.total_fields,
            "skipping record with wrong number of fields"
        );
        return None;
    };

    match R::from_fields(&fields) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(table = R::TABLE.name, line = line_no, error = %e, "skipping malformed record");
            None
        }
    }
}

/// Decode and parse one raw line. Invalid UTF-8 is logged and skipped.
fn parse_raw<R: Record>(raw: &[u8], line_no: usize) -> Option<R> {
    match std::str::from_utf8(raw) {
        Ok(line) => parse_line(line, line_no),
        Err(e) => {
            warn!(
                table = R::TABLE.name,
                line = line_no,
                error = %e,
                "skipping line that is not UTF-8"
            );
            None
        }
    }
}

fn is_blank(raw: &[u8]) -> bool {
    raw.iter().all(u8::is_ascii_whitespace)
}

/// Lazy scan over one table.
///
/// Reading happens as the iterator advances. Malformed lines are skipped.
/// A scan of a table that does not exist yet is empty.
pub struct Scan<R> {
    path: PathBuf,
    lines: Option<Split<BufReader<File>>>,
    line_no: usize,
    _record: PhantomData<R>,
}

impl<R: Record> Iterator for Scan<R> {
    type Item = StoreResult<R>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.as_mut()?.next()? {
                Ok(line) => line,
                Err(source) => {
                    self.lines = None;
                    return Some(Err(StoreError::Io {
                        path: self.path.clone(),
                        source,
                    }));
                }
            };
            self.line_no += 1;

            if let Some(record) = parse_raw::<R>(&line, self.line_no) {
                return Some(Ok(record));
            }
        }
    }
}

/// Handle on a directory of flat-file tables.
#[derive(Debug)]
pub struct RecordStore {
    config: StoreConfig,
}

impl RecordStore {
    /// Open the store, creating the data directory if needed.
    ///
    /// Journal markers left behind by an interrupted operation are logged.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        fs::create_dir_all(config.data_dir()).map_err(io_error(config.data_dir()))?;
        let store = Self { config };

        for entry in store.incomplete_operations()? {
            warn!(
                tx = %entry.tx_id,
                operation = %entry.operation,
                subject = %entry.subject,
                started_at = %entry.started_at,
                "found interrupted operation; tables may be out of step"
            );
        }

        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Path of the file backing `R`'s table.
    pub fn table_path<R: Record>(&self) -> PathBuf {
        self.config.table_path(&R::TABLE)
    }

    /// Append one record.
    pub fn append<R: Record>(&self, record: &R) -> StoreResult<()> {
        let path = self.table_path::<R>();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_error(&path))?;
        writeln!(file, "{}", encode_line(&record.to_fields())).map_err(io_error(&path))?;

        debug!(table = R::TABLE.name, key = record.key(), "appended record");
        Ok(())
    }

    /// Start a lazy scan. Each call reopens the table.
    pub fn scan<R: Record>(&self) -> StoreResult<Scan<R>> {
        let path = self.table_path::<R>();
        let lines = match File::open(&path) {
            Ok(file) => Some(BufReader::new(file).split(b'\n')),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Ok(Scan {
            path,
            lines,
            line_no: 0,
            _record: PhantomData,
        })
    }

    /// Every well-formed record, in file order.
    pub fn load_all<R: Record>(&self) -> StoreResult<Vec<R>> {
        self.scan()?.collect()
    }

    /// Every well-formed record satisfying `predicate`, in file order.
    pub fn filter<R, P>(&self, mut predicate: P) -> StoreResult<Vec<R>>
    where
        R: Record,
        P: FnMut(&R) -> bool,
    {
        let mut matches = Vec::new();
        for record in self.scan::<R>()? {
            let record = record?;
            if predicate(&record) {
                matches.push(record);
            }
        }
        Ok(matches)
    }

    /// First record satisfying `predicate`.
    pub fn find_first<R, P>(&self, mut predicate: P) -> StoreResult<Option<R>>
    where
        R: Record,
        P: FnMut(&R) -> bool,
    {
        for record in self.scan::<R>()? {
            let record = record?;
            if predicate(&record) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// First record whose key equals `key`.
    pub fn find_by_key<R: Record>(&self, key: &str) -> StoreResult<Option<R>> {
        self.find_first(|record: &R| record.key() == key)
    }

    /// Rewrite the whole table, replacing each record that satisfies
    /// `predicate` with `transform(record)`.
    ///
    /// Lines that do not parse are written back untouched. Nothing is written
    /// when no record matches. Returns the number of rewritten records.
    pub fn rewrite_matching<R, P, F>(&self, mut predicate: P, mut transform: F) -> StoreResult<usize>
    where
        R: Record,
        P: FnMut(&R) -> bool,
        F: FnMut(R) -> R,
    {
        let path = self.table_path::<R>();
        let lines = self.read_lines(&path)?;

        let mut contents = Vec::new();
        let mut rewritten = 0;
        for (index, line) in lines.iter().enumerate() {
            match parse_raw::<R>(line, index + 1) {
                Some(record) if predicate(&record) => {
                    let line = encode_line(&transform(record).to_fields());
                    contents.extend_from_slice(line.as_bytes());
                    rewritten += 1;
                }
                _ => contents.extend_from_slice(line),
            }
            contents.push(b'\n');
        }

        if rewritten > 0 {
            self.write_table(&path, &contents)?;
            debug!(table = R::TABLE.name, rewritten, "rewrote table");
        }
        Ok(rewritten)
    }

    /// Rewrite the whole table without the first record satisfying `predicate`.
    ///
    /// Returns the removed record, or `None` (and writes nothing) if none matched.
    pub fn remove_first<R, P>(&self, mut predicate: P) -> StoreResult<Option<R>>
    where
        R: Record,
        P: FnMut(&R) -> bool,
    {
        let path = self.table_path::<R>();
        let lines = self.read_lines(&path)?;

        let mut contents = Vec::new();
        let mut removed = None;
        for (index, line) in lines.iter().enumerate() {
            if removed.is_none() {
                if let Some(record) = parse_raw::<R>(line, index + 1) {
                    if predicate(&record) {
                        removed = Some(record);
                        continue;
                    }
                }
            }
            contents.extend_from_slice(line);
            contents.push(b'\n');
        }

        if let Some(record) = &removed {
            self.write_table(&path, &contents)?;
            debug!(table = R::TABLE.name, key = record.key(), "removed record");
        }
        Ok(removed)
    }

    /// Non-blank raw lines of a table, without their `\n`; a missing table has none.
    ///
    /// Lines are kept as bytes so that ones which do not decode survive a rewrite.
    fn read_lines(&self, path: &Path) -> StoreResult<Vec<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(bytes
                .split(|b| *b == b'\n')
                .filter(|line| !is_blank(line))
                .map(<[u8]>::to_vec)
                .collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Truncate-and-write. Not atomic.
    fn write_table(&self, path: &Path, contents: &[u8]) -> StoreResult<()> {
        fs::write(path, contents).map_err(io_error(path))
    }
}
