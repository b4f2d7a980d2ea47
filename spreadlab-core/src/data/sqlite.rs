//! SQLite provider: one table per trading date, named `DDMMYYYY`.
//!
//! Two databases are read:
//! - options: `time, strike, instrument_type, expiry, open, high, low, close`
//! - spot:    `time, open, high, low, close`
//!
//! Connections are opened read-only per query, so the provider is `Sync` and
//! can be shared across worker threads. Every row is parsed into a typed bar
//! at this boundary; a malformed row fails the query instead of leaking NaN.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags, Row};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::provider::{retain_nearest_expiry, DataError, OptionFilter, PriceSeriesProvider};
use crate::domain::{InstrumentType, OptionBar, PriceBar, Strike};

/// Table-name format for a trading date.
pub const TABLE_DATE_FORMAT: &str = "%d%m%Y";

#[derive(Debug, Clone)]
pub struct SqliteProvider {
    opt_db: PathBuf,
    spot_db: PathBuf,
    session_open: NaiveTime,
    session_close: NaiveTime,
}

impl SqliteProvider {
    pub fn new(opt_db: impl Into<PathBuf>, spot_db: impl Into<PathBuf>) -> Self {
        Self {
            opt_db: opt_db.into(),
            spot_db: spot_db.into(),
            session_open: NaiveTime::from_hms_opt(9, 15, 0).unwrap_or(NaiveTime::MIN),
            session_close: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    /// Point both databases at their `_sample` siblings (`OPT.db` → `OPT_sample.db`).
    pub fn sample(opt_db: impl AsRef<Path>, spot_db: impl AsRef<Path>) -> Self {
        Self::new(sample_path(opt_db.as_ref()), sample_path(spot_db.as_ref()))
    }

    /// Restrict option queries to this intraday window.
    pub fn with_session(mut self, open: NaiveTime, close: NaiveTime) -> Self {
        self.session_open = open;
        self.session_close = close;
        self
    }

    pub fn opt_db(&self) -> &Path {
        &self.opt_db
    }

    pub fn spot_db(&self) -> &Path {
        &self.spot_db
    }

    fn open(path: &Path) -> Result<Connection, DataError> {
        if !path.exists() {
            return Err(DataError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("database not found: {}", path.display()),
            )));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    fn table_names(conn: &Connection) -> Result<Vec<String>, DataError> {
        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn require_table(conn: &Connection, date: NaiveDate) -> Result<String, DataError> {
        let table = table_name(date);
        let found: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [&table],
            |row| row.get(0),
        )?;
        if found == 0 {
            return Err(DataError::DateNotFound { date });
        }
        Ok(table)
    }
}

impl PriceSeriesProvider for SqliteProvider {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn list_trading_dates(&self) -> Result<Vec<NaiveDate>, DataError> {
        let conn = Self::open(&self.opt_db)?;
        let mut dates: Vec<NaiveDate> = Self::table_names(&conn)?
            .into_iter()
            .filter_map(|name| match NaiveDate::parse_from_str(&name, TABLE_DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    debug!(table = %name, "ignoring non-date table");
                    None
                }
            })
            .collect();
        dates.sort_unstable();
        Ok(dates)
    }

    fn underlying_series(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Vec<PriceBar>, DataError> {
        let conn = Self::open(&self.spot_db)?;
        let table = Self::require_table(&conn, date)?;
        let sql = format!("SELECT time, open, high, low, close FROM \"{table}\"");
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map([], RawBar::read)?
            .collect::<Result<Vec<_>, _>>()?;
        let context = format!("spot {table}");
        let mut bars = Vec::with_capacity(raw.len());
        for r in raw {
            let bar = r.into_bar(&context)?;
            if bar.time >= start && bar.time <= end {
                bars.push(bar);
            }
        }
        bars.sort_by_key(|b| b.time);
        Ok(bars)
    }

    fn option_series(
        &self,
        date: NaiveDate,
        filter: &OptionFilter,
    ) -> Result<Vec<OptionBar>, DataError> {
        let conn = Self::open(&self.opt_db)?;
        let table = Self::require_table(&conn, date)?;

        let mut sql = format!(
            "SELECT time, strike, instrument_type, expiry, open, high, low, close FROM \"{table}\" \
             WHERE 1 = 1"
        );
        let mut params: Vec<Value> = Vec::new();
        if let Some(strike) = filter.strike {
            params.push(Value::Integer(strike.value()));
            sql.push_str(&format!(" AND strike = ?{}", params.len()));
        }
        if let Some(instrument) = filter.instrument {
            params.push(Value::Text(instrument.code().to_string()));
            sql.push_str(&format!(" AND instrument_type = ?{}", params.len()));
        }

        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params_from_iter(params), RawOptionRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        let context = format!("options {table}");
        let mut rows = Vec::with_capacity(raw.len());
        for r in raw {
            let row = r.into_option_bar(&context)?;
            if row.time() >= self.session_open && row.time() <= self.session_close {
                rows.push(row);
            }
        }
        rows.sort_by_key(|r| (r.time(), r.strike));

        if filter.is_single_contract() {
            retain_nearest_expiry(&mut rows);
        }
        Ok(rows)
    }

    fn list_strikes(&self, date: NaiveDate, expiry: NaiveDate) -> Result<Vec<Strike>, DataError> {
        let conn = Self::open(&self.opt_db)?;
        let table = Self::require_table(&conn, date)?;
        let sql = format!("SELECT DISTINCT strike, expiry FROM \"{table}\"");
        let mut stmt = conn.prepare(&sql)?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get::<_, f64>(0)?, text(row, 1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let context = format!("strikes {table}");
        let mut strikes = BTreeSet::new();
        for (strike, raw_expiry) in pairs {
            if parse_expiry(&raw_expiry, &context)? == expiry {
                strikes.insert(parse_strike(strike, &context)?);
            }
        }
        Ok(strikes.into_iter().collect())
    }
}

/// `DDMMYYYY` table name for a date.
pub fn table_name(date: NaiveDate) -> String {
    date.format(TABLE_DATE_FORMAT).to_string()
}

/// `dir/OPT.db` → `dir/OPT_sample.db`.
pub fn sample_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    match path.extension() {
        Some(ext) => path.with_file_name(format!("{stem}_sample.{}", ext.to_string_lossy())),
        None => path.with_file_name(format!("{stem}_sample")),
    }
}

// ─── Row parsing ─────────────────────────────────────────────────────

struct RawBar {
    time: String,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
}

impl RawBar {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            time: text(row, 0)?,
            open: row.get(1)?,
            high: row.get(2)?,
            low: row.get(3)?,
            close: row.get(4)?,
        })
    }

    fn into_bar(self, context: &str) -> Result<PriceBar, DataError> {
        let time = parse_time(&self.time, context)?;
        let field = |name: &str, v: Option<f64>| {
            v.ok_or_else(|| DataError::Malformed {
                context: context.to_string(),
                detail: format!("NULL {name} at {}", self.time),
            })
        };
        PriceBar::new(
            time,
            field("open", self.open)?,
            field("high", self.high)?,
            field("low", self.low)?,
            field("close", self.close)?,
        )
        .map_err(|source| DataError::InvalidBar {
            context: context.to_string(),
            source,
        })
    }
}

struct RawOptionRow {
    strike: f64,
    instrument: String,
    expiry: String,
    bar: RawBar,
}

impl RawOptionRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            strike: row.get(1)?,
            instrument: text(row, 2)?,
            expiry: text(row, 3)?,
            bar: RawBar {
                time: text(row, 0)?,
                open: row.get(4)?,
                high: row.get(5)?,
                low: row.get(6)?,
                close: row.get(7)?,
            },
        })
    }

    fn into_option_bar(self, context: &str) -> Result<OptionBar, DataError> {
        let instrument: InstrumentType =
            self.instrument.parse().map_err(|e| DataError::Malformed {
                context: context.to_string(),
                detail: format!("{e}"),
            })?;
        Ok(OptionBar {
            strike: parse_strike(self.strike, context)?,
            instrument,
            expiry: parse_expiry(&self.expiry, context)?,
            bar: self.bar.into_bar(context)?,
        })
    }
}

/// Read a column as text whatever its storage class.
fn text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Null | ValueRef::Blob(_) => String::new(),
    })
}

fn parse_time(raw: &str, context: &str) -> Result<NaiveTime, DataError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| DataError::Malformed {
            context: context.to_string(),
            detail: format!("unparseable time '{raw}'"),
        })
}

fn parse_expiry(raw: &str, context: &str) -> Result<NaiveDate, DataError> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d", "%d%m%Y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Ok(date);
        }
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.date());
    }
    Err(DataError::Malformed {
        context: context.to_string(),
        detail: format!("unparseable expiry '{raw}'"),
    })
}

fn parse_strike(raw: f64, context: &str) -> Result<Strike, DataError> {
    if !raw.is_finite() || raw.fract() != 0.0 {
        return Err(DataError::Malformed {
            context: context.to_string(),
            detail: format!("non-integral strike {raw}"),
        });
    }
    Ok(Strike(raw as i64))
}
