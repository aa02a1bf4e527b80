use clap::CommandFactory;
use cognate::cli::Cli;
use std::path::PathBuf;

/// Write cognate.1 into the given directory (default: current directory)
fn main() -> anyhow::Result<()> {
    let out_dir = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)?;

    let command = Cli::command();
    let man = clap_mangen::Man::new(command.clone());
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;
    let path = out_dir.join("cognate.1");
    std::fs::write(&path, buffer)?;
    println!("{}", path.display());

    for sub in command.get_subcommands() {
        let mut buffer = Vec::new();
        clap_mangen::Man::new(sub.clone()).render(&mut buffer)?;
        let path = out_dir.join(format!("cognate-{}.1", sub.get_name()));
        std::fs::write(&path, buffer)?;
        println!("{}", path.display());
    }
    Ok(())
}
