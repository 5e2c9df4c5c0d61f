//! trybuild UI tests for component_macros

#[test]
fn ui_component_macros() {
    let t = trybuild::TestCases::new();
    t.pass("tests/trybuild/component_ok.rs");
    t.compile_fail("tests/trybuild/component_fail.rs");
}
