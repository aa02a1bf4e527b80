//! End-to-end jobs shared by the command line and the HTTP server.
//!
//! Each job reads its lexicon, prepares the transducers it needs from the
//! configuration and hands over to the library functions.

use anyhow::{Context, Result};
use std::path::Path;

use crate::boards::{compile_cognates, compile_crossids, lexicon_doculects, refish, RefishOutcome, RefishRequest};
use crate::compare::{compare, CompareRequest};
use crate::config::Config;
use crate::fst::{load_directory, resolve_script, CompiledScript, TransducerSet};
use crate::lexicon::{pipeline_name, Lexicon};
use crate::models::{CognateApp, FstComparison};

pub fn load_lexicon(path: &Path) -> Result<Lexicon> {
    let lexicon = Lexicon::from_path(path)?;
    log::info!("Loaded {} rows from {}", lexicon.len(), path.display());
    Ok(lexicon)
}

/// Compile a foma script and keep the doculects of the configured index
fn indexed_transducers(config: &Config, script: &str) -> Result<TransducerSet> {
    let compiled = CompiledScript::compile(script, &config.toolchain)?;
    Ok(compiled.select_indexed(&config.fst_index))
}

fn default_script(config: &Config) -> Result<String> {
    let path = &config.default_script;
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read default transducer {}", path.display()))
}

/// Board document for a cross-id lexicon, using the precompiled stacks
pub fn compile_lexicon(config: &Config, path: &Path) -> Result<CognateApp> {
    let lexicon = load_lexicon(path)?;
    let fsts = load_directory(&config.fst_dir, &config.fst_index, &config.toolchain);
    if fsts.is_empty() {
        log::warn!("No compiled transducers found in {}", config.fst_dir.display());
    }
    compile_crossids(&lexicon, &fsts).with_context(|| format!("Cannot compile {}", path.display()))
}

/// Board document for a partial-cognate lexicon
///
/// The transducer script is `transducer` if given, else the pipeline's own
/// script in the transducer directory, else the default refishing script.
pub fn compile_partial_cognates(
    config: &Config,
    path: &Path,
    cognate_column: &str,
    transducer: Option<String>,
) -> Result<CognateApp> {
    let lexicon = load_lexicon(path)?;
    let pipeline = pipeline_name(path);
    log::info!("Assuming pipeline name: {}", pipeline);

    let script = resolve_script(transducer, &pipeline, &config.fst_dir, &config.default_script)?;
    let compiled = CompiledScript::compile(&script, &config.toolchain)?;
    let doculects = lexicon_doculects(&lexicon);
    let fsts = compiled.select_by_name(doculects.iter().map(String::as_str));

    compile_cognates(&lexicon, &fsts, cognate_column).with_context(|| format!("Cannot compile {}", path.display()))
}

/// Refish a board document against a lexicon
pub fn refish_document(config: &Config, request: RefishRequest, lexicon_path: &Path) -> Result<RefishOutcome> {
    let script = match request.transducer {
        Some(script) => {
            log::info!("Using user provided transducer");
            script
        }
        None => {
            log::info!("Using default transducer");
            default_script(config)?
        }
    };
    let lexicon = load_lexicon(lexicon_path)?;
    let fsts = indexed_transducers(config, &script)?;
    Ok(refish(request.document, &lexicon, &fsts)?)
}

/// Chart a board under an old and a new transducer script
pub fn compare_transducers(config: &Config, request: &CompareRequest, lexicon_path: &Path) -> Result<FstComparison> {
    let lexicon = load_lexicon(lexicon_path)?;
    log::info!("Compiling FSTs (old)");
    let old_fsts = indexed_transducers(config, &request.old_transducer).context("Old transducer")?;
    log::info!("Compiling FSTs (new)");
    let new_fsts = indexed_transducers(config, &request.new_transducer).context("New transducer")?;
    Ok(compare(
        &request.langs_under_study,
        &request.board,
        &lexicon,
        &old_fsts,
        &new_fsts,
    )?)
}
