//! End-to-end scenarios (spec.md §8): dispatch through the full
//! request -> envelope path, ClientID=1/ClientTransactionID=7, device 0
//! on the simulator transport. Mirrors the teacher's own
//! `src/lib/star_adventurer_control/tests/integration_test.rs`, driving
//! the crate from outside as `ascom-alpaca-rs`'s client would.

use nexstar_alpaca::capabilities::Capabilities;
use nexstar_alpaca::driver::CelestronDriver;
use nexstar_alpaca::envelope;
use nexstar_alpaca::error::ErrorKind;
use nexstar_alpaca::json::Json;
use nexstar_alpaca::nexstar::simulator::SimulatorTransport;
use nexstar_alpaca::operations::{Method, TelescopeResource};
use nexstar_alpaca::params::{ArgumentMap, Case};
use nexstar_alpaca::telescope::{StaticMetadata, Telescope};

fn resource(capabilities: Capabilities) -> TelescopeResource {
    let telescope = Telescope::new(
        capabilities,
        StaticMetadata::default_for_tests(),
        Box::new(CelestronDriver::new(Box::new(SimulatorTransport::new()))),
    );
    TelescopeResource::new(vec![telescope])
}

fn args(pairs: &[(&str, &str)]) -> ArgumentMap {
    let mut args = ArgumentMap::new(Case::Sensitive);
    args.insert("ClientID".to_string(), "1".to_string());
    args.insert("ClientTransactionID".to_string(), "7".to_string());
    for (k, v) in pairs {
        args.insert(k.to_string(), v.to_string());
    }
    args
}

fn field<'a>(body: &'a Json, key: &str) -> &'a Json {
    let Json::Map(map) = body else { panic!("expected envelope map") };
    map.get(key).unwrap_or_else(|| panic!("missing {key}"))
}

#[test]
fn scenario_1_canpark_false_envelope() {
    let r = resource(Capabilities::empty());
    let a = args(&[]);
    let result = r.dispatch("telescope", "0", "canpark", Method::Get, &a);
    let rendered = envelope::render(result, &a);
    assert_eq!(rendered.status, 200);
    assert_eq!(field(&rendered.body, "Value"), &Json::Bool(false));
    assert_eq!(field(&rendered.body, "ErrorNumber"), &Json::Int(0));
    assert_eq!(field(&rendered.body, "ErrorMessage"), &Json::from(""));
    assert_eq!(field(&rendered.body, "ClientID"), &Json::Int(1));
    assert_eq!(field(&rendered.body, "ClientTransactionID"), &Json::Int(7));
}

#[test]
fn scenario_2_altitude_disconnected_not_connected() {
    let r = resource(Capabilities::empty());
    let a = args(&[]);
    let result = r.dispatch("telescope", "0", "altitude", Method::Get, &a);
    let rendered = envelope::render(result, &a);
    assert_eq!(rendered.status, 200);
    assert_eq!(field(&rendered.body, "Value"), &Json::Null);
    assert_eq!(field(&rendered.body, "ErrorNumber"), &Json::Int(ErrorKind::NotConnected.code() as i64));
    assert_eq!(field(&rendered.body, "ErrorMessage"), &Json::from("Not connected"));
}

#[test]
fn scenario_3_connect_then_atpark() {
    let r = resource(Capabilities::empty());
    let connect_args = args(&[("Connected", "true")]);
    let rendered = envelope::render(r.dispatch("telescope", "0", "connected", Method::Put, &connect_args), &connect_args);
    assert_eq!(field(&rendered.body, "Value"), &Json::Null);
    assert_eq!(field(&rendered.body, "ErrorNumber"), &Json::Int(0));

    let query_args = args(&[]);
    let rendered = envelope::render(r.dispatch("telescope", "0", "atpark", Method::Get, &query_args), &query_args);
    assert_eq!(field(&rendered.body, "Value"), &Json::Bool(false));
}

#[test]
fn scenario_4_siteelevation_out_of_range() {
    let r = resource(Capabilities::empty());
    let connect_args = args(&[("Connected", "true")]);
    r.dispatch("telescope", "0", "connected", Method::Put, &connect_args).unwrap();

    let a = args(&[("SiteElevation", "12000")]);
    let rendered = envelope::render(r.dispatch("telescope", "0", "siteelevation", Method::Put, &a), &a);
    assert_eq!(rendered.status, 200);
    assert_eq!(field(&rendered.body, "Value"), &Json::Null);
    assert_eq!(field(&rendered.body, "ErrorNumber"), &Json::Int(ErrorKind::InvalidValue.code() as i64));
    let Json::String(message) = field(&rendered.body, "ErrorMessage") else { panic!("expected string") };
    assert!(!message.is_empty());
}

#[test]
fn scenario_5_slewtocoordinatesasync_converges() {
    let r = resource(Capabilities::CAN_SLEW_ASYNC);
    let connect_args = args(&[("Connected", "true")]);
    r.dispatch("telescope", "0", "connected", Method::Put, &connect_args).unwrap();

    let slew_args = args(&[("RightAscension", "6.0"), ("Declination", "45.0")]);
    let rendered = envelope::render(r.dispatch("telescope", "0", "slewtocoordinatesasync", Method::Put, &slew_args), &slew_args);
    assert_eq!(field(&rendered.body, "ErrorNumber"), &Json::Int(0));

    let query_args = args(&[]);
    let slewing = r.dispatch("telescope", "0", "slewing", Method::Get, &query_args).unwrap();
    assert_eq!(slewing, Json::Bool(true), "first poll should report slewing=true");

    let ra_at = |r: &TelescopeResource| -> f64 {
        let Json::Float(v) = r.dispatch("telescope", "0", "rightascension", Method::Get, &query_args).unwrap() else { panic!("expected float") };
        v
    };
    let dec_at = |r: &TelescopeResource| -> f64 {
        let Json::Float(v) = r.dispatch("telescope", "0", "declination", Method::Get, &query_args).unwrap() else { panic!("expected float") };
        v
    };
    let (ra_before, dec_before) = (ra_at(&r), dec_at(&r));

    std::thread::sleep(std::time::Duration::from_millis(200));
    let (ra_after, dec_after) = (ra_at(&r), dec_at(&r));
    assert!((ra_after - 6.0).abs() <= (ra_before - 6.0).abs(), "right ascension moved away from target");
    assert!((dec_after - 45.0).abs() <= (dec_before - 45.0).abs(), "declination moved away from target");

    let mut slewing = true;
    for _ in 0..200 {
        slewing = r.dispatch("telescope", "0", "slewing", Method::Get, &query_args).unwrap() == Json::Bool(true);
        if !slewing {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    assert!(!slewing, "slew did not settle within the poll budget");
    assert!((ra_at(&r) - 6.0).abs() < 0.01, "rightascension did not converge");
    assert!((dec_at(&r) - 45.0).abs() < 0.01, "declination did not converge");
}

#[test]
fn scenario_6_moveaxis_encodes_passthrough() {
    let r = resource(Capabilities::CAN_MOVE_AXIS_0);
    let connect_args = args(&[("Connected", "true")]);
    r.dispatch("telescope", "0", "connected", Method::Put, &connect_args).unwrap();

    let a = args(&[("Axis", "0"), ("Rate", "1.0")]);
    let value = r.dispatch("telescope", "0", "moveaxis", Method::Put, &a).unwrap();
    assert_eq!(value, Json::Null);
}

#[test]
fn idempotent_connect_is_a_no_op() {
    let r = resource(Capabilities::empty());
    let connect_args = args(&[("Connected", "true")]);
    r.dispatch("telescope", "0", "connected", Method::Put, &connect_args).unwrap();
    r.dispatch("telescope", "0", "connected", Method::Put, &connect_args).unwrap();
    let connected = r.dispatch("telescope", "0", "connected", Method::Get, &args(&[])).unwrap();
    assert_eq!(connected, Json::Bool(true));
}

#[test]
fn capability_absent_is_not_implemented_regardless_of_connection() {
    let r = resource(Capabilities::empty());
    let connect_args = args(&[("Connected", "true")]);
    r.dispatch("telescope", "0", "connected", Method::Put, &connect_args).unwrap();

    let a = args(&[("Axis", "0"), ("Rate", "1.0")]);
    let err = r.dispatch("telescope", "0", "moveaxis", Method::Put, &a).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotImplemented);
}

#[test]
fn server_transaction_id_increases_across_requests_through_dispatch() {
    let r = resource(Capabilities::empty());
    let a = args(&[]);
    let first = envelope::render(r.dispatch("telescope", "0", "canpark", Method::Get, &a), &a);
    let second = envelope::render(r.dispatch("telescope", "0", "canpark", Method::Get, &a), &a);
    let Json::Int(first_id) = field(&first.body, "ServerTransactionID") else { panic!("expected int") };
    let Json::Int(second_id) = field(&second.body, "ServerTransactionID") else { panic!("expected int") };
    assert!(second_id > first_id);
}
