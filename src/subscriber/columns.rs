use std::fmt;

use itertools::Itertools;
use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::Serialize;

use super::{display_opt, Scalar, StatusEntry, SubscriberRecord};

pub type Projector = fn(&SubscriberRecord) -> String;

#[derive(Clone, Copy)]
pub struct Column {
    pub key: &'static str,
    pub title: &'static str,
    pub project: Projector,
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("title", &self.title)
            .finish()
    }
}

pub const COLUMNS: [Column; 11] = [
    Column {
        key: "subscriberId",
        title: "Subscriber ID",
        project: |r| display_opt(r.subscriber_id.as_ref()),
    },
    Column {
        key: "iccid",
        title: "ICCID",
        project: extract_iccid,
    },
    Column {
        key: "status",
        title: "Status",
        project: extract_current_status_label,
    },
    Column {
        key: "esim",
        title: "eSIM",
        project: extract_esim_flag,
    },
    Column {
        key: "activationDate",
        title: "Activation Date",
        project: extract_activation_date,
    },
    Column {
        key: "lastUsageDate",
        title: "Last Usage",
        project: |r| display_opt(r.last_usage_date.as_ref()),
    },
    Column {
        key: "reseller",
        title: "Reseller",
        project: |r| display_opt(r.reseller_id.as_ref().or(r.reseller.as_ref())),
    },
    Column {
        key: "accountId",
        title: "Account ID",
        project: |r| display_opt(r.account_id.as_ref()),
    },
    Column {
        key: "batchId",
        title: "Batch ID",
        project: |r| display_opt(r.batch_id.as_ref()),
    },
    Column {
        key: "prepaid",
        title: "Prepaid",
        project: |r| yes_no(r.prepaid.as_ref()),
    },
    Column {
        key: "balance",
        title: "Balance",
        project: extract_balance,
    },
];

fn yes_no(value: Option<&Scalar>) -> String {
    match value.and_then(Scalar::as_bool) {
        Some(true) => "Yes".to_string(),
        Some(false) => "No".to_string(),
        None => String::new(),
    }
}

pub fn extract_iccid(record: &SubscriberRecord) -> String {
    display_opt(record.first_sim().and_then(|sim| sim.iccid.as_ref()))
}

/// Label of the status entry in effect: the first open entry, else the one
/// with the greatest start date (earliest entry wins ties). Falls back to all
/// distinct labels joined with " / " when the chosen entry has no label.
pub fn extract_current_status_label(record: &SubscriberRecord) -> String {
    let history = &record.status_history;
    if history.is_empty() {
        return String::new();
    }

    let current = history.iter().find(|e| e.is_open()).or_else(|| {
        history.iter().fold(None, |best: Option<&StatusEntry>, entry| match best {
            Some(b) if b.start_key() >= entry.start_key() => Some(b),
            _ => Some(entry),
        })
    });

    match current.map(StatusEntry::label_text) {
        Some(label) if !label.is_empty() => label,
        _ => history
            .iter()
            .map(StatusEntry::label_text)
            .filter(|label| !label.is_empty())
            .unique()
            .join(" / "),
    }
}

pub fn extract_esim_flag(record: &SubscriberRecord) -> String {
    let flag = record
        .sim_esim
        .as_ref()
        .or_else(|| record.first_sim().and_then(|sim| sim.esim.as_ref()));
    yes_no(flag)
}

pub fn extract_activation_date(record: &SubscriberRecord) -> String {
    [&record.activation_date, &record.ts_activation_utc]
        .into_iter()
        .flatten()
        .find(|candidate| candidate.is_truthy())
        .map(Scalar::display)
        .unwrap_or_default()
}

/// Two fraction digits, ties rounded away from zero on the exact binary value.
/// Negative zero prints unsigned.
fn fixed_two(value: f64) -> String {
    let negative = value < 0.0;
    // Every finite f64 has at most 1074 fraction digits, so this expansion is exact.
    let exact = format!("{:.1074}", value.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut frac = frac_part.bytes().chain(std::iter::repeat(b'0'));
    let mut digits: Vec<u8> = int_part.bytes().collect();
    digits.extend(frac.by_ref().take(2));
    if frac.next().is_some_and(|d| d >= b'5') {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, b'1');
                break;
            }
            i -= 1;
            if digits[i] == b'9' {
                digits[i] = b'0';
            } else {
                digits[i] += 1;
                break;
            }
        }
    }
    let split = digits.len() - 2;
    let mut out = String::with_capacity(digits.len() + 2);
    if negative {
        out.push('-');
    }
    out.extend(digits[..split].iter().map(|&d| d as char));
    out.push('.');
    out.extend(digits[split..].iter().map(|&d| d as char));
    out
}

pub fn extract_balance(record: &SubscriberRecord) -> String {
    match &record.balance {
        Some(Scalar::Number(n)) => n.as_f64().map(fixed_two).unwrap_or_default(),
        Some(Scalar::Text(s)) if !s.trim().is_empty() => s.clone(),
        _ => String::new(),
    }
}

/// One record rendered as display strings, keyed by column in column order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayRow {
    cells: Vec<(&'static str, String)>,
}

impl DisplayRow {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn cells(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.cells.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// The same row restricted to `columns`, in their order.
    pub fn select(&self, columns: &[Column]) -> DisplayRow {
        DisplayRow {
            cells: columns
                .iter()
                .filter_map(|c| self.cells.iter().find(|(k, _)| *k == c.key).cloned())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Serialize for DisplayRow {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (key, value) in &self.cells {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

pub fn project_row(record: &SubscriberRecord, columns: &[Column]) -> DisplayRow {
    DisplayRow {
        cells: columns
            .iter()
            .map(|column| (column.key, (column.project)(record)))
            .collect(),
    }
}

/// Rows are independent, so they are projected in parallel; output order
/// matches input order.
pub fn project_rows(records: &[SubscriberRecord], columns: &[Column]) -> Vec<DisplayRow> {
    records
        .par_iter()
        .map(|record| project_row(record, columns))
        .collect()
}

/// Resolve column keys against [`COLUMNS`]. The result keeps the fixed
/// column order regardless of the order the keys were given in. An empty
/// selection means every column.
pub fn select_columns<S: AsRef<str>>(keys: &[S]) -> Result<Vec<Column>, String> {
    let wanted: Vec<&str> = keys
        .iter()
        .map(|k| k.as_ref().trim())
        .filter(|k| !k.is_empty())
        .collect();
    if wanted.is_empty() {
        return Ok(COLUMNS.to_vec());
    }
    if let Some(unknown) = wanted
        .iter()
        .find(|k| !COLUMNS.iter().any(|c| c.key.eq_ignore_ascii_case(k)))
    {
        let known = COLUMNS.iter().map(|c| c.key).join(", ");
        return Err(format!("unknown column '{unknown}' (expected one of: {known})"));
    }
    Ok(COLUMNS
        .iter()
        .filter(|c| wanted.iter().any(|k| c.key.eq_ignore_ascii_case(k)))
        .copied()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> SubscriberRecord {
        SubscriberRecord::from_value(&value)
    }

    #[test]
    fn empty_record_projects_eleven_empty_cells() {
        let row = project_row(&record(json!({})), &COLUMNS);
        assert_eq!(row.len(), 11);
        assert!(row.cells().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn iccid_uses_first_sim_only() {
        assert_eq!(extract_iccid(&record(json!({}))), "");
        assert_eq!(extract_iccid(&record(json!({"imsiList": "89"}))), "");
        assert_eq!(extract_iccid(&record(json!({"imsiList": []}))), "");
        assert_eq!(
            extract_iccid(&record(json!({"imsiList": [{"iccid": "8901"}, {"iccid": "8902"}]}))),
            "8901"
        );
    }

    #[test]
    fn open_status_entry_is_current() {
        let r = record(json!({"status": [
            {"status": "A", "startDate": "2023-01-01", "endDate": "2023-02-01"},
            {"status": "B", "startDate": "2023-02-01"},
        ]}));
        assert_eq!(extract_current_status_label(&r), "B");
    }

    #[test]
    fn closed_history_picks_latest_start_date() {
        let r = record(json!({"status": [
            {"status": "A", "startDate": "2023-01-01", "endDate": "2023-02-01"},
            {"status": "C", "startDate": "2023-03-01", "endDate": "2023-04-01"},
            {"status": "B", "startDate": "2023-02-01", "endDate": "2023-03-01"},
        ]}));
        assert_eq!(extract_current_status_label(&r), "C");
    }

    #[test]
    fn start_date_ties_keep_the_earliest_entry() {
        let r = record(json!({"status": [
            {"status": "FIRST", "startDate": "2023-05-01", "endDate": "2023-06-01"},
            {"status": "SECOND", "startDate": "2023-05-01", "endDate": "2023-06-01"},
        ]}));
        assert_eq!(extract_current_status_label(&r), "FIRST");
    }

    #[test]
    fn empty_or_malformed_history_yields_empty_label() {
        assert_eq!(extract_current_status_label(&record(json!({"status": []}))), "");
        assert_eq!(extract_current_status_label(&record(json!({"status": "ACTIVE"}))), "");
    }

    #[test]
    fn unlabelled_current_entry_falls_back_to_distinct_labels() {
        let r = record(json!({"status": [
            {"status": "A", "startDate": "2023-01-01", "endDate": "2023-02-01"},
            {"status": "B", "startDate": "2023-02-01", "endDate": "2023-03-01"},
            {"status": "A", "startDate": "2023-03-01", "endDate": "2023-04-01"},
            {"startDate": "2023-04-01"},
        ]}));
        assert_eq!(extract_current_status_label(&r), "A / B");
    }

    #[test]
    fn sim_esim_takes_priority() {
        let r = record(json!({"sim": {"esim": true}, "imsiList": [{"esim": false}]}));
        assert_eq!(extract_esim_flag(&r), "Yes");
        let r = record(json!({"imsiList": [{"esim": false}]}));
        assert_eq!(extract_esim_flag(&r), "No");
        let r = record(json!({"sim": {"esim": "yes"}, "imsiList": [{"esim": true}]}));
        assert_eq!(extract_esim_flag(&r), "");
        assert_eq!(extract_esim_flag(&record(json!({}))), "");
    }

    #[test]
    fn activation_date_skips_falsy_candidates() {
        let r = record(json!({"activationDate": "", "tsactivationutc": "2024-02-02T00:00:00Z"}));
        assert_eq!(extract_activation_date(&r), "2024-02-02T00:00:00Z");
        let r = record(json!({"activationDate": "2024-01-01", "tsactivationutc": "2024-02-02"}));
        assert_eq!(extract_activation_date(&r), "2024-01-01");
        let r = record(json!({"activationDate": 0}));
        assert_eq!(extract_activation_date(&r), "");
    }

    #[test]
    fn balance_formatting() {
        assert_eq!(extract_balance(&record(json!({"balance": 42}))), "42.00");
        assert_eq!(extract_balance(&record(json!({"balance": 3.456}))), "3.46");
        assert_eq!(extract_balance(&record(json!({"balance": "  "}))), "");
        assert_eq!(extract_balance(&record(json!({"balance": "100.5"}))), "100.5");
        assert_eq!(extract_balance(&record(json!({"balance": " 7 "}))), " 7 ");
        assert_eq!(extract_balance(&record(json!({}))), "");
        assert_eq!(extract_balance(&record(json!({"balance": true}))), "");
    }

    #[test]
    fn balance_ties_round_away_from_zero() {
        assert_eq!(extract_balance(&record(json!({"balance": 0.125}))), "0.13");
        assert_eq!(extract_balance(&record(json!({"balance": 10.625}))), "10.63");
        assert_eq!(extract_balance(&record(json!({"balance": -0.125}))), "-0.13");
        assert_eq!(extract_balance(&record(json!({"balance": -0.0}))), "0.00");
        assert_eq!(extract_balance(&record(json!({"balance": -1.5}))), "-1.50");
        // 1.005 is stored just below the tie.
        assert_eq!(extract_balance(&record(json!({"balance": 1.005}))), "1.00");
        assert_eq!(extract_balance(&record(json!({"balance": 9.999}))), "10.00");
        assert_eq!(extract_balance(&record(json!({"balance": 0.004}))), "0.00");
    }

    #[test]
    fn reseller_prefers_reseller_id() {
        let r = record(json!({"resellerId": 12, "reseller": "acme"}));
        let row = project_row(&r, &COLUMNS);
        assert_eq!(row.get("reseller"), Some("12"));
        let r = record(json!({"reseller": "acme"}));
        assert_eq!(project_row(&r, &COLUMNS).get("reseller"), Some("acme"));
    }

    #[test]
    fn prepaid_is_tri_state() {
        let cell = |v: Value| project_row(&record(v), &COLUMNS).get("prepaid").map(String::from);
        assert_eq!(cell(json!({"prepaid": true})).as_deref(), Some("Yes"));
        assert_eq!(cell(json!({"prepaid": false})).as_deref(), Some("No"));
        assert_eq!(cell(json!({})).as_deref(), Some(""));
    }

    #[test]
    fn subscriber_id_only_record() {
        let row = project_row(&record(json!({"subscriberId": 7})), &COLUMNS);
        assert_eq!(row.get("subscriberId"), Some("7"));
        assert_eq!(row.cells().filter(|(_, v)| v.is_empty()).count(), 10);
    }

    #[test]
    fn projection_is_idempotent() {
        let r = record(json!({
            "subscriberId": "S-1",
            "imsiList": [{"iccid": "8901", "esim": true}],
            "status": [{"status": "ACTIVE", "startDate": "2024-01-01"}],
            "balance": 1.5,
        }));
        assert_eq!(project_row(&r, &COLUMNS), project_row(&r, &COLUMNS));
    }

    #[test]
    fn parallel_projection_keeps_order() {
        let records: Vec<_> = (0..64).map(|i| record(json!({"subscriberId": i}))).collect();
        let rows = project_rows(&records, &COLUMNS);
        let ids: Vec<_> = rows.iter().map(|r| r.get("subscriberId").unwrap().to_string()).collect();
        let expected: Vec<_> = (0..64).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn row_serializes_in_column_order() {
        let row = project_row(&record(json!({"subscriberId": 1})), &COLUMNS[..2]);
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"subscriberId":"1","iccid":""}"#
        );
    }

    #[test]
    fn row_select_restricts_cells() {
        let row = project_row(&record(json!({"subscriberId": 3, "prepaid": true})), &COLUMNS);
        let cols = select_columns(&["prepaid", "subscriberId"]).unwrap();
        let picked: Vec<_> = row.select(&cols).cells().map(|(k, v)| (k, v.to_string())).collect();
        assert_eq!(
            picked,
            vec![("subscriberId", "3".to_string()), ("prepaid", "Yes".to_string())]
        );
    }

    #[test]
    fn column_selection_keeps_fixed_order() {
        let cols = select_columns(&["status", "subscriberId"]).unwrap();
        let keys: Vec<_> = cols.iter().map(|c| c.key).collect();
        assert_eq!(keys, vec!["subscriberId", "status"]);
        assert_eq!(select_columns::<&str>(&[]).unwrap().len(), 11);
        assert!(select_columns(&["nope"]).is_err());
    }
}
