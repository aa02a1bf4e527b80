// Shell stand-ins for foma and flookup

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use super::Toolchain;

fn write_script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_str().unwrap().to_string()
}

/// foma that creates an empty file for every `save stack` line
pub fn foma(dir: &Path) -> Toolchain {
    let foma = write_script(
        dir,
        "foma",
        "grep '^save stack' \"$2\" | while read -r _ _ name; do : > \"$name\"; done\n",
    );
    Toolchain {
        foma,
        flookup: "flookup".to_string(),
    }
}

/// flookup that logs each run to the returned file
///
/// Up, a word `w` gives `w-up` and `w-alt`; down (`-i`) it gives `w-down`.
/// Words starting with `x` are rejected.
pub fn flookup(dir: &Path) -> (Toolchain, PathBuf) {
    let runs = dir.join("flookup-runs");
    let body = format!(
        r#"echo run >> "{}"
while IFS= read -r word; do
  case "$word" in
    x*) echo "+?" ;;
    *) if [ "$2" = "-i" ]; then echo "$word-down"; else echo "$word-up"; echo "$word-alt"; fi ;;
  esac
  echo
done
"#,
        runs.display()
    );
    let flookup = write_script(dir, "flookup", &body);
    let toolchain = Toolchain {
        foma: "foma".to_string(),
        flookup,
    };
    (toolchain, runs)
}

/// How many times the fake flookup ran
pub fn runs(log: &Path) -> usize {
    std::fs::read_to_string(log).map(|s| s.lines().count()).unwrap_or(0)
}
