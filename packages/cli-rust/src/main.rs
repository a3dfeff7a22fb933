//! bluechi-provision CLI - Provision BlueChi nodes over SSH
//!
//! This is the main entry point for the Rust CLI binary.

fn main() -> anyhow::Result<()> {
    bluechi_provision::run()
}
