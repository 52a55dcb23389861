#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web incident repository service for the disaster report
//! application.
//!
//! Configured through `BIND_ADDR`, `PORT`, `ALLOWED_ORIGINS` and
//! `DISASTER_REPORT_SEED`; log output is controlled by `RUST_LOG`.

use disaster_report_server::{ServerConfig, run_server};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    run_server(ServerConfig::from_env()).await
}
