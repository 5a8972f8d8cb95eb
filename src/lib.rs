//! Pbxgen core library.
//!
//! Pbxgen turns a resolved GN build graph into an Xcode project whose
//! targets are thin wrappers that delegate every build to Ninja. The project
//! exists for browsing, indexing and launching; compilation never happens
//! inside the IDE.
//!
//! The graph is read from a YAML description:
//!
//! ```yaml
//! root_path: /work/src               # absolute source root
//! build_dir: //out/Debug             # source-absolute build directory
//! args:
//!   target_os: ios                   # ios, tvos, mac or unset
//! toolchains:
//!   - label: //build/toolchain:clang
//!     default: true
//!     tools:
//!       link:
//!         default_output_dir: "{{root_out_dir}}"
//! items:                             # configs, toolchains and pools
//!   - label: //build/config:compiler
//!     imports: [//build/config/compiler.gni]
//! targets:
//!   - label: //app:app
//!     output_type: create_bundle
//!     sources: [//app/main.mm]
//!     bundle:
//!       product_type: com.apple.product-type.application
//!       root_dir: //out/Debug/app.app
//! gen_dependencies: [/work/src/.gn]
//! ```
//!
//! [`synth::XcodeProject`] drives generation; [`runner`] wires it to the
//! command line.

pub mod cli;
pub mod error;
pub mod filter;
pub mod graph;
pub mod pbx;
pub mod rewrite;
pub mod runner;
pub mod script;
pub mod status;
pub mod synth;
pub mod workspace;
pub mod write;
pub mod xctest;
