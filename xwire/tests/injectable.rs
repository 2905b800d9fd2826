use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use clap::Parser;
use serial_test::serial;
use xwire::cli::{Args, run_with};
use xwire::{Dependencies, Entrypoint, Provider, Settings, WireError, global, injectable};

static CONNECTIONS: AtomicU32 = AtomicU32::new(0);

#[derive(Debug)]
struct Refused(String);

impl std::fmt::Display for Refused {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "connection refused: {}", self.0)
    }
}

impl std::error::Error for Refused {}

#[injectable]
fn db_string() -> String {
    "memory://".to_string()
}

#[injectable]
fn dbcnx(db_string: &String) -> Result<String, Refused> {
    CONNECTIONS.fetch_add(1, Ordering::SeqCst);
    if db_string.starts_with("memory://") {
        Ok(format!("cnx:{db_string}"))
    } else {
        Err(Refused(db_string.clone()))
    }
}

#[injectable]
fn users(dbcnx: &String) -> Vec<String> {
    vec![format!("u0 via {dbcnx}")]
}

#[injectable(name = "users", environment = "fake_users")]
fn fake_users() -> Vec<String> {
    vec!["u1".into(), "u2".into(), "u3".into()]
}

#[injectable(name = "payments", environment = "fake_payments")]
fn fake_payments(_: u8) -> HashMap<String, i64> {
    HashMap::from([("u1".to_string(), 100), ("u2".to_string(), 200)])
}

fn report() -> Entrypoint<impl Fn(&Dependencies) -> xwire::Result<Vec<String>>> {
    Entrypoint::new(
        "report",
        ["users", "payments"],
        |deps: &Dependencies| -> xwire::Result<Vec<String>> {
            let users = deps.get::<Vec<String>>("users")?;
            let payments = deps.get::<HashMap<String, i64>>("payments")?;
            Ok(users
                .iter()
                .filter_map(|user| payments.get(user).map(|total| format!("{user}={total}")))
                .collect())
        },
    )
}

#[test]
#[serial]
fn attribute_registers_declared_dependencies() {
    global::reset();
    let registry = global::snapshot();

    let dbcnx = &registry.candidates("dbcnx")[0];
    assert_eq!(dbcnx.dependencies(), ["db_string"]);
    assert!(dbcnx.output_type().contains("String"));

    let payments = &registry.candidates("payments")[0];
    assert_eq!(payments.environment(), "fake_payments");
    assert!(payments.dependencies().is_empty());

    let environments: Vec<&str> = registry
        .candidates("users")
        .iter()
        .map(Provider::environment)
        .collect();
    assert_eq!(environments.len(), 2);
    assert!(environments.contains(&"main"));
    assert!(environments.contains(&"fake_users"));
}

#[test]
#[serial]
fn fakes_replace_real_providers() {
    global::reset();
    CONNECTIONS.store(0, Ordering::SeqCst);

    let args = Args::try_parse_from(["test", "--dependencies", "fake_users,fake_payments"]).unwrap();
    let lines = run_with(&args, &report()).unwrap();

    assert_eq!(lines, ["u1=100", "u2=200"]);
    assert_eq!(CONNECTIONS.load(Ordering::SeqCst), 0);
}

#[test]
#[serial]
fn real_chain_runs_factories_once() {
    global::reset();
    CONNECTIONS.store(0, Ordering::SeqCst);

    let container = global::container(Settings::default());
    let mut resolver = container.resolver();
    let users = resolver.resolve("users").unwrap();
    let again = resolver.resolve("users").unwrap();

    assert!(std::sync::Arc::ptr_eq(&users, &again));
    assert_eq!(CONNECTIONS.load(Ordering::SeqCst), 1);
    assert_eq!(
        *users.downcast::<Vec<String>>().unwrap(),
        ["u0 via cnx:memory://"]
    );
}

#[test]
#[serial]
fn factory_errors_are_wrapped_with_chain() {
    global::reset();
    global::register(Provider::value("db_string", String::from("sqlite:///prod.db"))).unwrap();

    let err = global::run(&report(), Settings::default()).unwrap_err();
    match err {
        WireError::ProviderInvocation { key, chain, source } => {
            assert_eq!(key.name(), "dbcnx");
            assert_eq!(chain, ["users", "dbcnx"]);
            assert!(source.to_string().contains("connection refused"));
        }
        other => panic!("Expected ProviderInvocation, got: {other:?}"),
    }
}

#[test]
#[serial]
fn explain_fails_fast_on_unknown_dependency() {
    global::reset();
    CONNECTIONS.store(0, Ordering::SeqCst);

    let args = Args::try_parse_from(["test", "--explain"]).unwrap();
    let err = run_with(&args, &report()).unwrap_err();
    match err {
        WireError::UnknownDependency(inner) => {
            assert_eq!(inner.requested, "payments");
            assert_eq!(inner.inactive_environments, ["fake_payments"]);
        }
        other => panic!("Expected UnknownDependency, got: {other:?}"),
    }
    assert_eq!(CONNECTIONS.load(Ordering::SeqCst), 0);
}
