//! Component F: wraps a dispatcher result in the Alpaca response envelope
//! (spec.md §6 "JSON envelope"). Key order is fixed: `Value`, `ClientID`,
//! `ErrorNumber`, `ErrorMessage`, `ClientTransactionID`, `ServerTransactionID`.

use crate::error::AlpacaResult;
use crate::json::Json;
use crate::params::ArgumentMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Process-wide monotonically increasing transaction id, per spec.md §6
/// ("ServerTransactionID increments once per request, process-wide").
static SERVER_TRANSACTION_ID: AtomicU32 = AtomicU32::new(1);

fn next_server_transaction_id() -> u32 {
    SERVER_TRANSACTION_ID.fetch_add(1, Ordering::SeqCst)
}

/// A rendered HTTP response: status code plus a body. `body` is the
/// envelope's JSON serialization for ordinary responses, or a bare text
/// message for the dispatcher-level `Http` error kind.
pub struct Rendered {
    pub status: u16,
    pub body: Json,
}

/// `ClientID`/`ClientTransactionID` are optional on the wire (missing →
/// `0`) but a malformed value is itself an HTTP 400, per spec.md §7
/// ("Argument parsing errors for ClientID/ClientTransactionID ... reject
/// before the envelope is built, since there is no transaction id yet to
/// report them under").
fn read_transaction_ids(args: &ArgumentMap) -> AlpacaResult<(u32, u32)> {
    let client_id: u32 = args.get_opt("ClientID")?.unwrap_or(0);
    let client_transaction_id: u32 = args.get_opt("ClientTransactionID")?.unwrap_or(0);
    Ok((client_id, client_transaction_id))
}

/// Render a dispatcher result into the wire envelope. `args` is the same
/// argument map the dispatcher was called with, so `ClientID` and
/// `ClientTransactionID` can be echoed back.
pub fn render(result: AlpacaResult<Json>, args: &ArgumentMap) -> Rendered {
    let ids = match read_transaction_ids(args) {
        Ok(ids) => ids,
        Err(_) => {
            return Rendered {
                status: 400,
                body: Json::from("Invalid 'ClientID' or 'ClientTransactionID'"),
            }
        }
    };
    let (client_id, client_transaction_id) = ids;
    let server_transaction_id = next_server_transaction_id();

    match result {
        Err(e) if e.kind.is_http() => Rendered {
            status: e.http_status().unwrap_or(500),
            body: Json::from(e.message),
        },
        Ok(value) => Rendered {
            status: 200,
            body: envelope(value, 0, String::new(), client_id, client_transaction_id, server_transaction_id),
        },
        Err(e) => Rendered {
            status: 200,
            body: envelope(Json::Null, e.kind.code(), e.message, client_id, client_transaction_id, server_transaction_id),
        },
    }
}

fn envelope(value: Json, error_number: u32, error_message: String, client_id: u32, client_transaction_id: u32, server_transaction_id: u32) -> Json {
    Json::object([
        ("Value", value),
        ("ClientID", Json::from(client_id)),
        ("ErrorNumber", Json::from(error_number as i32)),
        ("ErrorMessage", Json::from(error_message)),
        ("ClientTransactionID", Json::from(client_transaction_id)),
        ("ServerTransactionID", Json::from(server_transaction_id)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::params::Case;

    #[test]
    fn ok_result_carries_zero_error_number() {
        let args = ArgumentMap::parse(Case::Insensitive, "ClientID=3&ClientTransactionID=7");
        let rendered = render(Ok(Json::from(true)), &args);
        assert_eq!(rendered.status, 200);
        let Json::Map(map) = rendered.body else { panic!("expected map") };
        assert_eq!(map.get("Value"), Some(&Json::Bool(true)));
        assert_eq!(map.get("ErrorNumber"), Some(&Json::Int(0)));
        assert_eq!(map.get("ClientID"), Some(&Json::Int(3)));
        assert_eq!(map.get("ClientTransactionID"), Some(&Json::Int(7)));
    }

    #[test]
    fn key_order_matches_spec() {
        let args = ArgumentMap::new(Case::Insensitive);
        let rendered = render(Ok(Json::Null), &args);
        let Json::Map(map) = rendered.body else { panic!("expected map") };
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["Value", "ClientID", "ErrorNumber", "ErrorMessage", "ClientTransactionID", "ServerTransactionID"]
        );
    }

    #[test]
    fn driver_error_fills_error_fields_with_http_200() {
        let args = ArgumentMap::new(Case::Insensitive);
        let rendered = render(Err(Error::not_connected()), &args);
        assert_eq!(rendered.status, 200);
        let Json::Map(map) = rendered.body else { panic!("expected map") };
        assert_eq!(map.get("ErrorNumber"), Some(&Json::Int(0x407)));
        assert_eq!(map.get("Value"), Some(&Json::Null));
    }

    #[test]
    fn http_error_bypasses_envelope() {
        let args = ArgumentMap::new(Case::Insensitive);
        let rendered = render(Err(Error::http(404, "unknown operation")), &args);
        assert_eq!(rendered.status, 404);
        assert_eq!(rendered.body, Json::from("unknown operation"));
    }

    #[test]
    fn malformed_client_id_is_http_400() {
        let args = ArgumentMap::parse(Case::Insensitive, "ClientID=notanumber");
        let rendered = render(Ok(Json::Null), &args);
        assert_eq!(rendered.status, 400);
    }

    #[test]
    fn server_transaction_id_increases_across_calls() {
        let args = ArgumentMap::new(Case::Insensitive);
        let first = render(Ok(Json::Null), &args);
        let second = render(Ok(Json::Null), &args);
        let Json::Map(first_map) = first.body else { panic!() };
        let Json::Map(second_map) = second.body else { panic!() };
        let Json::Int(a) = first_map["ServerTransactionID"] else { panic!() };
        let Json::Int(b) = second_map["ServerTransactionID"] else { panic!() };
        assert!(b > a);
    }
}
