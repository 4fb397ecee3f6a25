use serde_json::json;
use vnstockalert::services::providers::{
    price_board::board_lines, vndirect_rest::latest_close, vndirect_ws::SocketSnapshot, yahoo::last_close,
};

fn frame(typ: &str, fields: &[(usize, &str)], len: usize) -> String {
    let mut data = vec!["0"; len];
    for (i, v) in fields {
        data[*i] = *v;
    }
    json!({ "type": typ, "data": data.join("|") }).to_string()
}

#[test]
fn socket_snapshot_reads_ba_and_mi_frames() {
    let mut snap = SocketSnapshot::default();
    snap.ingest(&frame("BA", &[(1, "VCB"), (15, "95500")], 16));
    snap.ingest(&frame("MI", &[(0, "10"), (7, "1250.52")], 8));
    snap.ingest(&frame("BA", &[(1, "FPT"), (15, "120000")], 20));

    assert_eq!(snap.stocks.get("VCB"), Some(&95500.0));
    assert_eq!(snap.indices.get("VNINDEX"), Some(&1250.52));
    assert_eq!(
        snap.to_lines().as_deref(),
        Some("📊 VNINDEX: 1,250.52\n📈 FPT: 120,000\n📈 VCB: 95,500")
    );
}

#[test]
fn socket_snapshot_ignores_short_or_foreign_frames() {
    let mut snap = SocketSnapshot::default();
    snap.ingest(&frame("BA", &[(1, "VCB")], 15));
    snap.ingest(&frame("MI", &[(0, "99"), (7, "10")], 8));
    snap.ingest(&frame("SP", &[(1, "VCB"), (15, "1")], 16));
    snap.ingest("not json");
    snap.ingest(r#"{"type":"BA"}"#);

    assert!(snap.is_empty());
    assert_eq!(snap.to_lines(), None);
}

#[test]
fn latest_close_takes_first_bar() {
    let body = json!({
        "data": [
            { "code": "VCB", "close": 95500.0, "date": "2026-02-16T00:00:00" },
            { "code": "VCB", "close": 94000.0, "date": "2026-02-13" }
        ]
    });
    assert_eq!(latest_close(&body), Some((95500.0, "2026-02-16".to_string())));
    assert_eq!(latest_close(&json!({ "data": [] })), None);
    assert_eq!(latest_close(&json!({ "error": "blocked" })), None);
}

#[test]
fn yahoo_last_close_skips_trailing_nulls() {
    let body = json!({
        "chart": { "result": [{
            "timestamp": [1771200000, 1771286400],
            "indicators": { "quote": [{ "close": [26350.0, null] }] }
        }]}
    });
    assert_eq!(last_close(&body), Some((26350.0, "2026-02-16".to_string())));

    let empty = json!({ "chart": { "result": [{ "indicators": { "quote": [{ "close": [null] }] } }] } });
    assert_eq!(last_close(&empty), None);
}

#[test]
fn board_lines_accept_flat_and_nested_rows() {
    let flat = json!([
        { "symbol": "VCB", "matchPrice": 95500 },
        { "ticker": "FPT", "price": "120,000" },
        { "symbol": "", "price": 1 },
        { "symbol": "HPG", "price": 0 }
    ]);
    assert_eq!(board_lines(&flat), vec!["📈 VCB: 95,500", "📈 FPT: 120,000"]);

    let nested = json!({
        "data": [
            { "listingInfo": { "symbol": "TCB" }, "matchPrice": { "matchPrice": 23450 } }
        ]
    });
    assert_eq!(board_lines(&nested), vec!["📈 TCB: 23,450"]);

    assert!(board_lines(&json!({ "status": "error" })).is_empty());
}
