mod support;

use support::architecture::{find_lines_containing, path_exists, read_relative};

#[test]
fn domain_has_no_outer_layer_or_io_imports() {
    let hits = find_lines_containing(
        "src/domain",
        &[
            "crate::adapter",
            "crate::application",
            "crate::infrastructure",
            "crate::port",
            "tokio::",
            "reqwest::",
            "diesel::",
            "redis::",
        ],
    );

    assert!(
        hits.is_empty(),
        "found forbidden imports in domain layer: {hits:#?}"
    );
}

#[test]
fn ports_do_not_depend_on_adapters_or_infrastructure() {
    let hits = find_lines_containing(
        "src/port",
        &["crate::adapter::", "crate::infrastructure::", "crate::application::"],
    );
    assert!(
        hits.is_empty(),
        "ports should only depend on domain and error types: {hits:#?}"
    );
}

#[test]
fn application_layer_has_no_direct_adapter_imports() {
    let hits = find_lines_containing(
        "src/application",
        &["crate::adapter::", "crate::infrastructure::"],
    );
    assert!(
        hits.is_empty(),
        "application layer should not import adapters directly: {hits:#?}"
    );
}

#[test]
fn outbound_adapters_do_not_depend_on_cli() {
    let hits = find_lines_containing("src/adapter/outbound", &["crate::adapter::inbound"]);
    assert!(
        hits.is_empty(),
        "outbound adapters should not depend on the CLI: {hits:#?}"
    );
}

#[test]
fn llm_contract_lives_in_outbound_port() {
    assert!(
        path_exists("src/port/outbound/llm.rs"),
        "LLM trait contract should live under port/outbound"
    );

    let analyzer = read_relative("src/application/sentiment.rs");
    assert!(
        analyzer.contains("crate::port::outbound::llm::"),
        "sentiment analyzer should depend on the outbound llm port"
    );
}

#[test]
fn redis_adapter_is_feature_gated() {
    let module = read_relative("src/adapter/outbound/mod.rs");
    assert!(
        module.contains("#[cfg(feature = \"redis\")]\npub mod redis;"),
        "redis adapter should only compile with the redis feature"
    );
}

#[test]
fn testkit_is_not_compiled_into_release_builds() {
    let lib = read_relative("src/lib.rs");
    assert!(
        lib.contains("#[cfg(any(test, feature = \"testkit\"))]\npub mod testkit;"),
        "testkit should be gated behind cfg(test) or the testkit feature"
    );
}
