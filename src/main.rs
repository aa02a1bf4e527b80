use cognate::cli::run;
use cognate::error::CognateError;

/// Whether the failure comes from the environment rather than the input
fn is_internal(e: &anyhow::Error) -> bool {
    if let Some(err) = e.chain().find_map(|cause| cause.downcast_ref::<CognateError>()) {
        return err.is_internal();
    }
    e.to_string().contains("Failed to")
}

fn main() {
    #[cfg(windows)]
    let _ = enable_ansi_support::enable_ansi_support();

    if let Err(e) = run() {
        if is_internal(&e) {
            eprintln!("Internal error: {}", e);
            // Show error chain if available
            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut indent = 1;
                while let Some(err) = source {
                    eprintln!("{:indent$}  {}", "", err);
                    source = err.source();
                    indent += 1;
                }
            }
            std::process::exit(2);
        } else {
            // User error
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
