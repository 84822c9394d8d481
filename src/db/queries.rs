use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    format_reservation_id, ModificationChanges, Reservation, ReservationStatus, TimeOfDay,
};

const DATE_FMT: &str = "%Y-%m-%d";
const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";

const COLUMNS: &str =
    "id, customer_id, customer_name, service, staff, date, start_time, end_time, status, created_at, updated_at";

struct ReservationRow {
    id: String,
    customer_id: String,
    customer_name: Option<String>,
    service: String,
    staff: String,
    date: String,
    start_time: String,
    end_time: String,
    status: String,
    created_at: String,
    updated_at: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReservationRow> {
    Ok(ReservationRow {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        customer_name: row.get(2)?,
        service: row.get(3)?,
        staff: row.get(4)?,
        date: row.get(5)?,
        start_time: row.get(6)?,
        end_time: row.get(7)?,
        status: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn into_reservation(row: ReservationRow) -> anyhow::Result<Reservation> {
    Ok(Reservation {
        date: NaiveDate::parse_from_str(&row.date, DATE_FMT)
            .with_context(|| format!("bad date in reservation {}: {}", row.id, row.date))?,
        start: TimeOfDay::parse(&row.start_time)
            .with_context(|| format!("bad start time in reservation {}", row.id))?,
        end: TimeOfDay::parse(&row.end_time)
            .with_context(|| format!("bad end time in reservation {}", row.id))?,
        status: ReservationStatus::from_str(&row.status),
        created_at: parse_ts(&row.created_at),
        updated_at: parse_ts(&row.updated_at),
        id: row.id,
        customer_id: row.customer_id,
        customer_name: row.customer_name,
        service: row.service,
        staff: row.staff,
    })
}

fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TS_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

pub fn create_reservation(conn: &Connection, r: &Reservation) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO reservations (id, customer_id, customer_name, service, staff, date, start_time, end_time, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            r.id,
            r.customer_id,
            r.customer_name,
            r.service,
            r.staff,
            r.date.format(DATE_FMT).to_string(),
            r.start.to_string(),
            r.end.to_string(),
            r.status.as_str(),
            r.created_at.format(TS_FMT).to_string(),
            r.updated_at.format(TS_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_reservation(conn: &Connection, id: &str) -> anyhow::Result<Option<Reservation>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM reservations WHERE id = ?1"))?;
    match stmt.query_row(params![id], read_row) {
        Ok(row) => Ok(Some(into_reservation(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// The customer's confirmed reservations, oldest first.
pub fn list_for_customer(conn: &Connection, customer_id: &str) -> anyhow::Result<Vec<Reservation>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM reservations
         WHERE customer_id = ?1 AND status = 'confirmed'
         ORDER BY date, start_time"
    ))?;
    let rows = stmt.query_map(params![customer_id], read_row)?;
    rows.map(|row| into_reservation(row?)).collect()
}

pub fn list_confirmed_on_date(conn: &Connection, date: NaiveDate) -> anyhow::Result<Vec<Reservation>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM reservations
         WHERE date = ?1 AND status = 'confirmed'
         ORDER BY start_time"
    ))?;
    let rows = stmt.query_map(params![date.format(DATE_FMT).to_string()], read_row)?;
    rows.map(|row| into_reservation(row?)).collect()
}

/// Returns false when the reservation does not exist.
pub fn apply_modification(
    conn: &Connection,
    id: &str,
    changes: &ModificationChanges,
) -> anyhow::Result<bool> {
    let Some(mut r) = get_reservation(conn, id)? else {
        return Ok(false);
    };
    if let Some(date) = changes.date {
        r.date = date;
    }
    if let Some(start) = changes.start {
        r.start = start;
    }
    if let Some(end) = changes.end {
        r.end = end;
    }
    if let Some(service) = &changes.service {
        r.service = service.clone();
    }
    if let Some(staff) = &changes.staff {
        r.staff = staff.clone();
    }

    conn.execute(
        "UPDATE reservations
         SET service = ?1, staff = ?2, date = ?3, start_time = ?4, end_time = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            r.service,
            r.staff,
            r.date.format(DATE_FMT).to_string(),
            r.start.to_string(),
            r.end.to_string(),
            Utc::now().naive_utc().format(TS_FMT).to_string(),
            id,
        ],
    )?;
    Ok(true)
}

/// Returns false when there was no confirmed reservation to cancel.
pub fn cancel_reservation(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let n = conn.execute(
        "UPDATE reservations SET status = 'cancelled', updated_at = ?1
         WHERE id = ?2 AND status = 'confirmed'",
        params![Utc::now().naive_utc().format(TS_FMT).to_string(), id],
    )?;
    Ok(n > 0)
}

/// Next `RES-YYYYMMDD-NNNN` for the date. Ids sort lexicographically within
/// a date, so MAX(id) is the latest sequence number.
pub fn next_reservation_id(conn: &Connection, date: NaiveDate) -> anyhow::Result<String> {
    let prefix = format!("RES-{}-", date.format("%Y%m%d"));
    let max: Option<String> = conn.query_row(
        "SELECT MAX(id) FROM reservations WHERE id LIKE ?1 || '%'",
        params![prefix],
        |row| row.get(0),
    )?;
    let next = max
        .and_then(|id| id.rsplit('-').next().and_then(|s| s.parse::<u32>().ok()))
        .map_or(1, |n| n + 1);
    Ok(format_reservation_id(date, next))
}
