//! End-to-end tests driving crumbdb through JSON commands.

#[path = "../common/mod.rs"]
mod common;

mod foreign_keys;
mod persistence;
mod scenario;
mod tenants;
