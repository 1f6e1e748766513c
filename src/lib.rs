//! Core library for the ksis-export command line application.
//!
//! Results scraped from ksis.eu flow through [`session`] (name and club
//! normalisation, live detection) into [`aggregate`], which merges any number
//! of competitions into one table. Corrections that make names consistent
//! across runs live in [`corrections`]; the site client and file writers are
//! under [`io`], and [`export`] ties everything together for the CLI and the
//! tests.

pub mod ksis;

pub use ksis::export::{
    ExportError, Result, aggregate, config, corrections, error, export, io, logging, model,
    normalize, report, session, source, table,
};
