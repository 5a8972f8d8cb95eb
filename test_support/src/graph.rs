//! Build graph fixtures.
//!
//! The fixtures are YAML descriptions so tests exercise the same loader as
//! the command line.

use pbxgen::graph::{BuildGraph, Label, load};

/// An iOS simulator build with an application, a unit-test module, a UI-test
/// module with its runner and a host tool.
pub const IOS_GRAPH: &str = r#"
root_path: /work/src
build_dir: //out/Debug-iphonesimulator
args:
  target_os: ios
toolchains:
  - label: //build/toolchain/mac:ios_clang_x64
    default: true
    tools:
      link:
        default_output_dir: "{{root_out_dir}}"
items:
  - label: //build/config:compiler
    imports: [//build/config/compiler.gni]
  - label: //build/toolchain:pool
    kind: pool
    imports: [//build/toolchain/pool.gni]
targets:
  - label: //ios/chrome/app:chrome
    output_type: create_bundle
    public_deps: [//ios/chrome/app:main]
    bundle:
      product_type: com.apple.product-type.application
      root_dir: //out/Debug-iphonesimulator/Chromium.app
  - label: //ios/chrome/app:main
    output_type: source_set
    sources:
      - //ios/chrome/app/main.mm
      - //ios/chrome/app/main.h
      - //ios/chrome/app/startup_xctest.mm
  - label: //ios/chrome/test:ios_chrome_unittests_module
    output_type: create_bundle
    bundle:
      product_type: com.apple.product-type.bundle.unit-test
      root_dir: //out/Debug-iphonesimulator/ios_chrome_unittests_module.xctest
      test_application_name: chrome
  - label: //ios/chrome/test/earl_grey:ios_chrome_ui_egtests_module
    output_type: create_bundle
    private_deps: [//ios/chrome/test/earl_grey:eg_tests]
    bundle:
      product_type: com.apple.product-type.bundle.ui-testing
      root_dir: //out/Debug-iphonesimulator/ios_chrome_ui_egtests_module.xctest
      test_application_name: chrome
  - label: //ios/chrome/test/earl_grey:ios_chrome_ui_egtests_runner
    output_type: create_bundle
    bundle:
      product_type: com.apple.product-type.application
      root_dir: //out/Debug-iphonesimulator/ios_chrome_ui_egtests_runner.app
  - label: //ios/chrome/test/earl_grey:eg_tests
    output_type: source_set
    sources:
      - //ios/chrome/test/earl_grey/tab_egtest.mm
      - //ios/chrome/test/earl_grey/tab_app_interface.mm
  - label: //tools/gen:gen
    output_type: executable
    sources: [//tools/gen/gen.cc]
gen_dependencies: [/work/src/.gn]
"#;

/// A macOS build with a single host executable.
pub const MAC_GRAPH: &str = r#"
root_path: /work/src
build_dir: //out/Release
args:
  target_os: mac
toolchains:
  - label: //build/toolchain/mac:clang_x64
    default: true
    tools:
      link:
        default_output_dir: "{{root_out_dir}}"
targets:
  - label: //tools/gn:gn
    output_type: executable
    sources: [//tools/gn/gn_main.cc, //tools/gn/gn.h]
  - label: //tools/gn:gn_lib
    output_type: static_library
    sources: [//tools/gn/lib.cc]
gen_dependencies: [/work/src/.gn, /work/other/outside.gni]
"#;

/// Parse a YAML graph fixture.
pub fn load_graph(yaml: &str) -> BuildGraph {
    load::from_str(yaml).expect("graph fixture")
}

/// Parse a label, panicking on malformed input.
pub fn label(text: &str) -> Label {
    Label::parse(text).expect("label")
}
