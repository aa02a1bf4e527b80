//! Cognate boards - tools for checking sound-change transducers against
//! cognate sets in comparative linguistics.
//!
//! This library provides:
//! - Board document models (boards, columns, syllables, words)
//! - Tab-separated lexicon reading and syllable segmentation
//! - foma transducer compilation and lookup
//! - Reconstruction inference and board assembly
//! - Refishing: rebuilding boards after cognate sets were edited
//! - Comparison charts of two transducer versions
//! - A command line and an HTTP server over all of the above
//!
//! # Example
//!
//! ```no_run
//! use cognate::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod boards;
pub mod cli;
pub mod compare;
pub mod config;
pub mod error;
pub mod fst;
pub mod lexicon;
pub mod models;
pub mod reconstruct;
pub mod server;
pub mod workflow;
