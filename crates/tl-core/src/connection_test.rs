use super::*;

const EXPECTED: &str = "grpcs://endpoint/database?go_fake_tx=scripting&go_query_bind=declare,numeric&go_query_mode=scripting&token=token";

#[test]
fn test_build_exact_string() {
    assert_eq!(
        build_connection_string("endpoint", "/database", "token", Some(true)),
        EXPECTED
    );
}

#[test]
fn test_build_is_stable_across_calls() {
    for _ in 0..100 {
        assert_eq!(
            build_connection_string("endpoint", "/database", "token", Some(true)),
            EXPECTED
        );
    }
}

#[test]
fn test_tls_absent_defaults_to_grpcs() {
    assert_eq!(
        build_connection_string("endpoint", "/database", "token", None),
        EXPECTED
    );
}

#[test]
fn test_tls_disabled_uses_grpc() {
    let plain = build_connection_string("endpoint", "/database", "token", Some(false));
    assert_eq!(plain, EXPECTED.replacen("grpcs://", "grpc://", 1));
}

#[test]
fn test_option_order_does_not_depend_on_insertion() {
    let mut options = BTreeMap::new();
    options.insert(TOKEN_KEY.to_string(), "token".to_string());
    options.insert(QUERY_MODE_KEY.to_string(), "scripting".to_string());
    options.insert(QUERY_BIND_KEY.to_string(), "declare,numeric".to_string());
    options.insert(FAKE_TX_KEY.to_string(), "scripting".to_string());
    let descriptor = ConnectionDescriptor {
        scheme: Scheme::Grpcs,
        endpoint: "endpoint".to_string(),
        database: "/database".to_string(),
        options,
    };
    assert_eq!(descriptor.to_connection_string(), EXPECTED);

    let reversed = join_sorted_options(
        vec![("token", "t"), ("b", "2"), ("a", "1")].into_iter(),
    );
    assert_eq!(reversed, "a=1&b=2&token=t");
}

#[test]
fn test_only_token_varies() {
    let a = ConnectionDescriptor::build("e", "/d", "first", None);
    let b = ConnectionDescriptor::build("e", "/d", "second", None);
    assert_eq!(a.options.len(), 4);
    let differing: Vec<&String> = a
        .options
        .keys()
        .filter(|k| a.options[*k] != b.options[*k])
        .collect();
    assert_eq!(differing, vec![TOKEN_KEY]);
}

#[test]
fn test_redacted_hides_token() {
    let descriptor = ConnectionDescriptor::build("endpoint", "/database", "s3cr3t", None);
    let redacted = descriptor.redacted();
    assert!(!redacted.contains("s3cr3t"));
    assert!(redacted.ends_with("token=***"));
    assert_eq!(descriptor.to_string(), redacted);
    assert_eq!(descriptor.token(), Some("s3cr3t"));
}

#[test]
fn test_parse_round_trips() {
    let parsed = ConnectionDescriptor::parse(EXPECTED).unwrap();
    assert_eq!(parsed.scheme, Scheme::Grpcs);
    assert_eq!(parsed.endpoint, "endpoint");
    assert_eq!(parsed.database, "/database");
    assert_eq!(parsed.address(), "endpoint/database");
    assert_eq!(parsed.to_connection_string(), EXPECTED);
}

#[test]
fn test_parse_rejects_bad_input() {
    assert!(ConnectionDescriptor::parse("endpoint/database").is_err());
    assert!(ConnectionDescriptor::parse("http://endpoint/database").is_err());
    assert!(ConnectionDescriptor::parse("grpc:///database").is_err());
    assert!(ConnectionDescriptor::parse("grpc://e/d?token").is_err());
}
