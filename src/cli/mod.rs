//! # CLI Module
//!
//! Command-line interface of the `hatyper-gen` binary.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Fetch the live schema and write the typed module:
//!
//! ```bash
//! HOMEASSISTANT_URL=http://homeassistant.local:8123 \
//! HOMEASSISTANT_TOKEN=... \
//! hatyper-gen generate src/hapt.rs --format
//! ```
//!
//! Options:
//! - `--url <URL>` / `HOMEASSISTANT_URL` - controller base URL (required)
//! - `--token <TOKEN>` / `HOMEASSISTANT_TOKEN` - access token (required)
//! - `-d, --dump-dir <DIR>` - also save `entities.json` and `services.json`
//! - `--runtime-path <PATH>` - import path of the runtime (default `hatyper::runtime`)
//! - `--format` - run rustfmt on the output
//!
//! Missing configuration is reported before any request is made.
//!
//! ### `compile`
//!
//! Generate from saved dumps:
//!
//! ```bash
//! hatyper-gen compile --states dump/entities.json --services dump/services.json src/hapt.rs
//! ```
//!
//! The output file is replaced only once the module has been fully generated.

mod commands;


pub use commands::{run, run_cli, write_output, Cli, Commands, SERVICES_DUMP, STATES_DUMP};
