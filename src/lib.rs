#![doc(test(attr(deny(warnings))))]

//! MaPocket Core keeps budget projects, invoices, wishlists, savings goals,
//! spending challenges, wallets and a cash-flow plan in a flat key/value
//! store, and keeps every budget tree consistent from its lines upwards.

pub mod cli;
pub mod config;
pub mod core;
pub mod currency;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("MaPocket Core tracing initialized.");
    });
}
