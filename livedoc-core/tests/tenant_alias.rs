//! Tenant alias mapping at every boundary.
//!
//! Each `#[case]` is isolated — no shared state.

use livedoc_core::{to_client_name, to_storage_name, TenantId};
use rstest::rstest;

#[rstest]
#[case("vendor", "public")]
#[case("public", "public")]
#[case("acme", "acme")]
#[case("", "public")]
#[case("  ", "public")]
#[case(" acme ", "acme")]
fn storage_name_mapping(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(to_storage_name(input), expected);
    assert_eq!(TenantId::from(input).storage_name(), expected);
}

#[rstest]
#[case("public", "vendor")]
#[case("vendor", "vendor")]
#[case("acme", "acme")]
#[case("", "vendor")]
fn client_name_mapping(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(to_client_name(input), expected);
}

#[rstest]
#[case("vendor")]
#[case("public")]
#[case("acme")]
#[case("tenant-42")]
fn mapping_is_involutive_across_the_boundary(#[case] name: &str) {
    let stored = to_storage_name(name);
    let shown = to_client_name(stored);
    assert_eq!(to_storage_name(shown), stored, "storage form must be stable");
    assert_eq!(to_client_name(to_storage_name(shown)), shown, "client form must be stable");
}

#[rstest]
#[case("vendor", "public")]
#[case("acme", "acme")]
fn either_form_addresses_the_same_tenant(#[case] a: &str, #[case] b: &str) {
    assert_eq!(TenantId::from(a), TenantId::from(b));
}
