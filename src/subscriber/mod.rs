//! Subscriber records as returned by the OCS "list subscribers" call.
//!
//! The backend payload is loosely shaped: any field may be missing, null, or
//! of an unexpected type. [`SubscriberRecord::from_value`] turns any JSON
//! value into a record whose fields are all optional, so the projectors in
//! [`columns`] never have to deal with raw JSON.

pub mod columns;

use serde::Serialize;
use serde_json::Value;

pub use columns::{
    extract_activation_date, extract_balance, extract_current_status_label, extract_esim_flag,
    extract_iccid, project_row, project_rows, select_columns, Column, DisplayRow, COLUMNS,
};

/// A single JSON leaf as it appeared in the payload. `null` never makes it
/// this far; it is treated as absent.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    Composite(Value),
}

impl Scalar {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::Bool(b) => Some(Self::Bool(*b)),
            other => Some(Self::Composite(other.clone())),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Loose truthiness: empty strings, zero, NaN and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty(),
            Self::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
            Self::Bool(b) => *b,
            Self::Composite(_) => true,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => display_number(n),
            Self::Bool(b) => b.to_string(),
            Self::Composite(v) => v.to_string(),
        }
    }
}

fn display_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Display string of an optional field, empty when absent.
pub fn display_opt(value: Option<&Scalar>) -> String {
    value.map(Scalar::display).unwrap_or_default()
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimIdentity {
    pub iccid: Option<Scalar>,
    pub esim: Option<Scalar>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusEntry {
    pub label: Option<Scalar>,
    pub start_date: Option<Scalar>,
    pub end_date: Option<Scalar>,
}

impl StatusEntry {
    /// An entry without an end date is the one currently in effect.
    pub fn is_open(&self) -> bool {
        match &self.end_date {
            None => true,
            Some(Scalar::Text(s)) => s.is_empty(),
            Some(_) => false,
        }
    }

    pub fn label_text(&self) -> String {
        display_opt(self.label.as_ref())
    }

    pub fn start_key(&self) -> String {
        display_opt(self.start_date.as_ref())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubscriberRecord {
    pub subscriber_id: Option<Scalar>,
    pub sims: Vec<SimIdentity>,
    pub status_history: Vec<StatusEntry>,
    pub sim_esim: Option<Scalar>,
    pub activation_date: Option<Scalar>,
    pub ts_activation_utc: Option<Scalar>,
    pub last_usage_date: Option<Scalar>,
    pub reseller_id: Option<Scalar>,
    pub reseller: Option<Scalar>,
    pub account_id: Option<Scalar>,
    pub batch_id: Option<Scalar>,
    pub prepaid: Option<Scalar>,
    pub balance: Option<Scalar>,
}

fn field(value: &Value, key: &str) -> Option<Scalar> {
    value.get(key).and_then(Scalar::from_value)
}

fn sequence<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

impl SubscriberRecord {
    /// Total conversion: a non-object value yields a record with every field
    /// absent.
    pub fn from_value(value: &Value) -> Self {
        let sims = sequence(value, "imsiList")
            .iter()
            .map(|sim| SimIdentity {
                iccid: field(sim, "iccid"),
                esim: field(sim, "esim"),
            })
            .collect();
        let status_history = sequence(value, "status")
            .iter()
            .map(|entry| StatusEntry {
                label: field(entry, "status"),
                start_date: field(entry, "startDate"),
                end_date: field(entry, "endDate"),
            })
            .collect();

        Self {
            subscriber_id: field(value, "subscriberId"),
            sims,
            status_history,
            sim_esim: value.get("sim").and_then(|sim| field(sim, "esim")),
            activation_date: field(value, "activationDate"),
            ts_activation_utc: field(value, "tsactivationutc"),
            last_usage_date: field(value, "lastUsageDate"),
            reseller_id: field(value, "resellerId"),
            reseller: field(value, "reseller"),
            account_id: field(value, "accountId"),
            batch_id: field(value, "batchId"),
            prepaid: field(value, "prepaid"),
            balance: field(value, "balance"),
        }
    }

    pub fn first_sim(&self) -> Option<&SimIdentity> {
        self.sims.first()
    }
}

/// Aggregate counts shown above the table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
}

impl Kpis {
    pub fn from_rows(rows: &[DisplayRow]) -> Self {
        let total = rows.len();
        let active = rows
            .iter()
            .filter(|row| {
                row.get("status")
                    .map(|s| s.trim().eq_ignore_ascii_case("active"))
                    .unwrap_or(false)
            })
            .count();
        Self {
            total,
            active,
            inactive: total - active,
        }
    }
}
