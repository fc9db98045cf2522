use ens_discovery::{compute_ens_node, normalize_ens_name, validate_ens_name};
use proptest::prelude::*;

fn label() -> impl Strategy<Value = String> {
    "[a-z0-9-]{1,20}"
}

proptest! {
    #[test]
    fn normalization_is_idempotent(raw in any::<String>()) {
        let once = normalize_ens_name(&raw);
        prop_assert_eq!(normalize_ens_name(&once), once);
    }

    #[test]
    fn validation_ignores_case_and_padding(labels in prop::collection::vec(label(), 1..4), pad in "[ \t]{0,3}") {
        let name = format!("{}.eth", labels.join("."));
        prop_assert!(validate_ens_name(&name));

        let shouted = format!("{pad}{}{pad}", name.to_uppercase());
        prop_assert!(validate_ens_name(&shouted));
        prop_assert_eq!(compute_ens_node(&shouted).unwrap(), compute_ens_node(&name).unwrap());
    }

    #[test]
    fn names_without_eth_suffix_are_rejected(labels in prop::collection::vec(label(), 1..4), tld in "[a-z]{2,6}") {
        prop_assume!(tld != "eth");
        let name = format!("{}.{}", labels.join("."), tld);
        prop_assert!(!validate_ens_name(&name));
        prop_assert!(compute_ens_node(&name).is_err());
    }

    #[test]
    fn invalid_characters_are_rejected(prefix in label(), bad in "[_!@# /]") {
        let name = format!("{prefix}{bad}x.eth");
        prop_assert!(!validate_ens_name(&name));
    }
}

#[test]
fn known_names() {
    assert!(validate_ens_name("weather-api.eth"));
    assert!(validate_ens_name("a.b.eth"));
    assert!(!validate_ens_name("invalid-name"));
    assert!(!validate_ens_name(""));
    assert!(!validate_ens_name(&format!("{}.eth", "a".repeat(252))));
}
