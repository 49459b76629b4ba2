use serde_json::{json, Value};

use crate::client::response;
use crate::dashboard::{DashboardState, Snapshot};
use crate::output::{self, DashboardView, OutputFormat};
use crate::subscriber::{project_row, SubscriberRecord, COLUMNS};

fn sample_body() -> &'static str {
    r#"{
      "listSubscriber": {
        "subscriberList": [
          {
            "subscriberId": 1001,
            "imsiList": [{"imsi": "208150000000001", "iccid": "8933150000000000001", "esim": false}],
            "sim": {"esim": true},
            "status": [
              {"status": "PREACTIVE", "startDate": "2023-01-01", "endDate": "2023-02-01"},
              {"status": "ACTIVE", "startDate": "2023-02-01"}
            ],
            "activationDate": "2023-02-01",
            "lastUsageDate": "2024-05-30",
            "resellerId": 77,
            "accountId": 3771,
            "batchId": "B-9",
            "prepaid": true,
            "balance": 12.5
          },
          {
            "subscriberId": "1002",
            "imsiList": [],
            "status": [
              {"status": "ACTIVE", "startDate": "2023-01-01", "endDate": "2023-06-01"},
              {"status": "SUSPENDED", "startDate": "2023-06-01", "endDate": "2023-07-01"}
            ],
            "tsactivationutc": "2023-01-01T08:00:00Z",
            "reseller": "acme",
            "prepaid": false,
            "balance": "n/a"
          },
          "garbage"
        ]
      }
    }"#
}

#[test]
fn full_response_projects_expected_rows() {
    let document = response::decode_body(sample_body());
    let snapshot = Snapshot::from_document(document);
    assert_eq!(snapshot.rows.len(), 3);

    let first: Vec<_> = snapshot.rows[0].cells().map(|(_, v)| v.to_string()).collect();
    assert_eq!(
        first,
        vec![
            "1001",
            "8933150000000000001",
            "ACTIVE",
            "Yes",
            "2023-02-01",
            "2024-05-30",
            "77",
            "3771",
            "B-9",
            "Yes",
            "12.50",
        ]
    );

    let second = &snapshot.rows[1];
    assert_eq!(second.get("subscriberId"), Some("1002"));
    assert_eq!(second.get("iccid"), Some(""));
    assert_eq!(second.get("status"), Some("SUSPENDED"));
    assert_eq!(second.get("esim"), Some(""));
    assert_eq!(second.get("activationDate"), Some("2023-01-01T08:00:00Z"));
    assert_eq!(second.get("reseller"), Some("acme"));
    assert_eq!(second.get("prepaid"), Some("No"));
    assert_eq!(second.get("balance"), Some("n/a"));

    assert!(snapshot.rows[2].cells().all(|(_, v)| v.is_empty()));
    assert_eq!(snapshot.kpis.total, 3);
    assert_eq!(snapshot.kpis.active, 1);
    assert_eq!(snapshot.kpis.inactive, 2);
}

#[test]
fn every_projector_is_total_over_odd_shapes() {
    let odd: Vec<Value> = vec![
        json!(null),
        json!([]),
        json!({"imsiList": [null], "status": [null, 3, "x"], "sim": 5}),
        json!({"imsiList": {"iccid": "1"}, "status": {"status": "ACTIVE"}, "sim": {"esim": 1}}),
        json!({"balance": {"amount": 1}, "prepaid": "true", "subscriberId": [1, 2]}),
    ];
    for value in odd.iter() {
        let row = project_row(&SubscriberRecord::from_value(value), &COLUMNS);
        assert_eq!(row.len(), COLUMNS.len());
        assert_eq!(row.get("esim"), Some(""));
        assert_eq!(row.get("balance"), Some(""));
        assert_eq!(row.get("prepaid"), Some(""));
    }
}

#[test]
fn unparsable_body_loads_as_raw_with_no_rows() {
    let document = response::decode_body("502 Bad Gateway");
    let state = DashboardState::Loaded(Snapshot::from_document(document));
    let view = DashboardView {
        account_id: 3771,
        endpoint: "http://ocs.local/api/ocs/list-subscribers",
        columns: &COLUMNS,
        state: &state,
        show_raw: true,
    };
    let text = String::from_utf8(output::render(&view, OutputFormat::Text)).unwrap();
    assert!(text.contains("\"raw\": \"502 Bad Gateway\""));
    assert!(text.contains("No data."));
    assert!(text.contains("[ Total 0 ]"));
}

#[test]
fn report_formats_render_same_rows() {
    let state = DashboardState::Loaded(Snapshot::from_document(response::decode_body(
        sample_body(),
    )));
    let view = DashboardView {
        account_id: 3771,
        endpoint: "http://ocs.local/api/ocs/list-subscribers",
        columns: &COLUMNS,
        state: &state,
        show_raw: false,
    };
    let json_doc: Value =
        serde_json::from_slice(&output::render(&view, OutputFormat::Json)).unwrap();
    assert_eq!(json_doc["rows"].as_array().unwrap().len(), 3);
    assert_eq!(json_doc["rows"][0]["iccid"], "8933150000000000001");

    let html = String::from_utf8(output::render(&view, OutputFormat::Html)).unwrap();
    assert!(html.contains("<td>8933150000000000001</td>"));
    assert!(!html.contains("Raw response"));
}
