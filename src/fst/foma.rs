use std::collections::{HashMap, HashSet};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;

use super::{FstIndex, Transducer, TransducerSet};
use crate::error::{CognateError, Result};

/// Where to find the foma binaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub foma: String,
    pub flookup: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            foma: "foma".to_string(),
            flookup: "flookup".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Direction {
    Up,
    Down,
}

/// A compiled foma stack queried through `flookup`
pub struct FomaTransducer {
    binary: PathBuf,
    flookup: String,
    cache: Mutex<HashMap<(Direction, String), Vec<String>>>,
}

impl FomaTransducer {
    pub fn open(binary: impl Into<PathBuf>, toolchain: &Toolchain) -> Self {
        Self {
            binary: binary.into(),
            flookup: toolchain.flookup.clone(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Answers for `forms`, asking flookup once for every form not cached yet
    fn lookup_all(&self, direction: Direction, forms: &[String]) -> Result<Vec<Vec<String>>> {
        let mut pending: Vec<&str> = Vec::new();
        {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            let mut seen = HashSet::new();
            for form in forms {
                let cached = cache.contains_key(&(direction, form.clone()));
                if !form.is_empty() && !cached && seen.insert(form) {
                    pending.push(form);
                }
            }
        }

        if !pending.is_empty() {
            let answers = self.run_flookup(direction, &pending)?;
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            for (form, results) in pending.into_iter().zip(answers) {
                log::trace!("flookup {:?} {} -> {:?}", direction, form, results);
                cache.insert((direction, form.to_string()), results);
            }
        }

        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        Ok(forms
            .iter()
            .map(|form| cache.get(&(direction, form.clone())).cloned().unwrap_or_default())
            .collect())
    }

    /// One `flookup -x` run over `words`, one line each
    fn run_flookup(&self, direction: Direction, words: &[&str]) -> Result<Vec<Vec<String>>> {
        let mut command = Command::new(&self.flookup);
        command.arg("-x");
        if direction == Direction::Down {
            command.arg("-i");
        }
        command
            .arg(&self.binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|source| CognateError::ToolLaunch {
            command: self.flookup.clone(),
            source,
        })?;
        log::debug!(
            "flookup {:?} over {} word(s) in {}",
            direction,
            words.len(),
            self.binary.display()
        );

        // flookup answers while it reads, so feed it from another thread
        let stdin = child.stdin.take();
        let (output, written) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || -> std::io::Result<()> {
                let Some(stdin) = stdin else { return Ok(()) };
                let mut stdin = BufWriter::new(stdin);
                for word in words {
                    writeln!(stdin, "{}", word)?;
                }
                stdin.flush()
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("flookup input writer panicked")));
            (output, written)
        });
        let output = output?;
        if !output.status.success() {
            return Err(CognateError::ToolFailed {
                command: self.flookup.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written?;

        let answers = parse_lookup_blocks(&String::from_utf8_lossy(&output.stdout));
        if answers.len() != words.len() {
            return Err(CognateError::LookupCount {
                command: self.flookup.clone(),
                expected: words.len(),
                answered: answers.len(),
            });
        }
        Ok(answers)
    }

    fn lookup(&self, direction: Direction, form: &str) -> Result<Vec<String>> {
        let mut answers = self.lookup_all(direction, &[form.to_string()])?;
        Ok(answers.pop().unwrap_or_default())
    }
}

impl Transducer for FomaTransducer {
    fn apply_up(&self, surface: &str) -> Result<Vec<String>> {
        self.lookup(Direction::Up, surface)
    }

    fn apply_down(&self, proto: &str) -> Result<Vec<String>> {
        self.lookup(Direction::Down, proto)
    }

    fn apply_up_all(&self, surfaces: &[String]) -> Result<Vec<Vec<String>>> {
        self.lookup_all(Direction::Up, surfaces)
    }

    fn apply_down_all(&self, protos: &[String]) -> Result<Vec<Vec<String>>> {
        self.lookup_all(Direction::Down, protos)
    }
}

/// Split `flookup -x` output into the answers for each input word
///
/// Each word's answer ends with a blank line.
pub fn parse_lookup_blocks(output: &str) -> Vec<Vec<String>> {
    let mut blocks = Vec::new();
    let mut block = String::new();
    for line in output.lines().map(|l| l.trim_end_matches('\r')) {
        if line.is_empty() {
            blocks.push(parse_lookup_output(&block));
            block.clear();
        } else {
            block.push_str(line);
            block.push('\n');
        }
    }
    if !block.is_empty() {
        blocks.push(parse_lookup_output(&block));
    }
    blocks
}

/// Results printed by `flookup -x` for one input word
///
/// One result per line; `+?` marks a word the transducer does not accept.
pub fn parse_lookup_output(output: &str) -> Vec<String> {
    let mut results: Vec<String> = Vec::new();
    for line in output.lines().map(|l| l.trim_end_matches('\r')) {
        if line.is_empty() || line == "+?" {
            continue;
        }
        if !results.iter().any(|r| r == line) {
            results.push(line.to_string());
        }
    }
    results
}

/// Stack names saved by a foma script (`save stack <name>.bin`)
pub fn saved_stacks(script: &str) -> Vec<String> {
    script
        .lines()
        .filter(|line| line.starts_with("save stack"))
        .filter_map(|line| {
            line["save stack".len()..]
                .trim()
                .strip_suffix(".bin")
                .map(|name| name.trim().to_string())
        })
        .filter(|name| {
            !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        })
        .collect()
}

/// A foma script compiled into a scratch directory
pub struct CompiledScript {
    workdir: tempfile::TempDir,
    stacks: Vec<String>,
    toolchain: Toolchain,
}

impl CompiledScript {
    /// Run `foma -f` over the script text
    pub fn compile(script: &str, toolchain: &Toolchain) -> Result<Self> {
        let workdir = tempfile::TempDir::new()?;
        let script_path = workdir.path().join("transducer.foma");
        std::fs::write(&script_path, script)?;

        log::info!("Compiling FSTs in {}", workdir.path().display());
        let output = Command::new(&toolchain.foma)
            .arg("-f")
            .arg("transducer.foma")
            .current_dir(workdir.path())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| CognateError::ToolLaunch {
                command: toolchain.foma.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(CognateError::ToolFailed {
                command: toolchain.foma.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let lines: Vec<&str> = stdout.lines().collect();
        for line in &lines[lines.len().saturating_sub(5)..] {
            log::debug!("foma: {}", line);
        }

        let stacks = saved_stacks(script);
        Ok(Self {
            workdir,
            stacks,
            toolchain: toolchain.clone(),
        })
    }

    fn stack_path(&self, stack: &str) -> PathBuf {
        self.workdir.path().join(format!("{}.bin", stack))
    }

    /// Transducers for the doculects of `index` whose stack was produced
    pub fn select_indexed(self, index: &FstIndex) -> TransducerSet {
        let found: Vec<(String, PathBuf)> = index
            .iter()
            .map(|(doculect, stack)| (doculect.to_string(), self.stack_path(stack)))
            .filter(|(_, path)| path.is_file())
            .collect();
        self.into_set(found)
    }

    /// Transducers for the given doculects, matching stack names case-insensitively
    pub fn select_by_name<'a>(self, doculects: impl IntoIterator<Item = &'a str>) -> TransducerSet {
        let found: Vec<(String, PathBuf)> = doculects
            .into_iter()
            .filter_map(|doculect| {
                let stack = self.stacks.iter().find(|s| **s == doculect.to_lowercase())?;
                let path = self.stack_path(stack);
                path.is_file().then(|| (doculect.to_string(), path))
            })
            .collect();
        self.into_set(found)
    }

    fn into_set(self, found: Vec<(String, PathBuf)>) -> TransducerSet {
        let toolchain = self.toolchain;
        let mut set = TransducerSet::with_workdir(self.workdir);
        for (doculect, path) in found {
            set.insert(doculect, FomaTransducer::open(path, &toolchain));
        }
        log::info!("FSTs loaded: {}", set.doculects().collect::<Vec<_>>().join(", "));
        set
    }
}

/// Transducers precompiled into `<dir>/<stack>.bin`
pub fn load_directory(dir: &Path, index: &FstIndex, toolchain: &Toolchain) -> TransducerSet {
    let mut set = TransducerSet::new();
    for (doculect, stack) in index.iter() {
        let path = dir.join(format!("{}.bin", stack));
        if path.is_file() {
            set.insert(doculect, FomaTransducer::open(path, toolchain));
        } else {
            log::debug!("No transducer for {} at {}", doculect, path.display());
        }
    }
    set
}

/// Pick the transducer script for a pipeline
///
/// An explicit script wins; otherwise `<fst_dir>/<pipeline>.txt` if it
/// exists; otherwise the default script file.
pub fn resolve_script(
    explicit: Option<String>,
    pipeline: &str,
    fst_dir: &Path,
    default_script: &Path,
) -> Result<String> {
    if let Some(script) = explicit {
        return Ok(script);
    }
    let pipeline_script = fst_dir.join(format!("{}.txt", pipeline));
    let path = if pipeline_script.is_file() {
        log::info!("Found input transducer for {}", pipeline);
        pipeline_script
    } else {
        default_script.to_path_buf()
    };
    std::fs::read_to_string(&path).map_err(|e| CognateError::file_read(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_saved_stacks() {
        let script = "define V [a|e|i|o|u];\nregex V;\nsave stack burmese.bin\n\
                      clear stack\nsave stack ngo-chang.bin\nsave stack bad name.bin\n  save stack no.bin\n";
        assert_eq!(saved_stacks(script), vec!["burmese", "ngo-chang"]);
    }

    #[test]
    fn test_parse_lookup_output() {
        assert_eq!(parse_lookup_output("mej\nmij\n\n"), vec!["mej", "mij"]);
        assert!(parse_lookup_output("+?\n\n").is_empty());
        assert_eq!(parse_lookup_output("ka\r\nka\n"), vec!["ka"]);
    }

    #[test]
    fn test_parse_lookup_blocks() {
        let blocks = parse_lookup_blocks("mej\nmij\n\n+?\n\nkaj\r\n\r\n");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], vec!["mej", "mij"]);
        assert!(blocks[1].is_empty());
        assert_eq!(blocks[2], vec!["kaj"]);
        assert!(parse_lookup_blocks("").is_empty());
    }

    #[test]
    fn test_load_directory_only_existing_stacks() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("maru.bin"), b"").unwrap();
        let set = load_directory(dir.path(), &FstIndex::burmish(), &Toolchain::default());
        assert_eq!(set.doculects().collect::<Vec<_>>(), vec!["Maru"]);
    }

    #[test]
    fn test_resolve_script_precedence() {
        let dir = TempDir::new().unwrap();
        let default_script = dir.path().join("refishing-fst.txt");
        std::fs::write(&default_script, "default").unwrap();
        std::fs::write(dir.path().join("germanic.txt"), "germanic").unwrap();

        let explicit = resolve_script(Some("inline".into()), "germanic", dir.path(), &default_script);
        assert_eq!(explicit.unwrap(), "inline");
        assert_eq!(resolve_script(None, "germanic", dir.path(), &default_script).unwrap(), "germanic");
        assert_eq!(resolve_script(None, "burmish", dir.path(), &default_script).unwrap(), "default");

        let missing = resolve_script(None, "burmish", dir.path(), &dir.path().join("nope.txt"));
        assert!(matches!(missing, Err(CognateError::FileRead { .. })));
    }

    #[test]
    fn test_missing_flookup_is_launch_error() {
        let toolchain = Toolchain {
            foma: "foma".to_string(),
            flookup: "/nonexistent/flookup".to_string(),
        };
        let fst = FomaTransducer::open("/nonexistent/maru.bin", &toolchain);
        assert!(matches!(fst.apply_up("mi"), Err(CognateError::ToolLaunch { .. })));
        assert!(fst.apply_up("").unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_batch_lookup_runs_flookup_once() {
        let dir = TempDir::new().unwrap();
        let (toolchain, log) = crate::fst::fake_tools::flookup(dir.path());
        let fst = FomaTransducer::open(dir.path().join("maru.bin"), &toolchain);

        let mut forms: Vec<String> = (0..200).map(|n| format!("mi{}", n)).collect();
        forms.push("xa".to_string());
        forms.push("mi7".to_string());
        forms.push(String::new());
        let answers = fst.apply_up_all(&forms).unwrap();

        assert_eq!(crate::fst::fake_tools::runs(&log), 1);
        assert_eq!(answers.len(), 203);
        assert_eq!(answers[0], vec!["mi0-up", "mi0-alt"]);
        assert!(answers[200].is_empty());
        assert_eq!(answers[201], answers[7]);
        assert!(answers[202].is_empty());

        // served from the cache
        assert_eq!(fst.apply_up("mi42").unwrap(), vec!["mi42-up", "mi42-alt"]);
        assert_eq!(crate::fst::fake_tools::runs(&log), 1);

        assert_eq!(fst.apply_down("mij").unwrap(), vec!["mij-down"]);
        assert_eq!(crate::fst::fake_tools::runs(&log), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_short_flookup_answer_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flookup");
        std::fs::write(&path, "#!/bin/sh\ncat > /dev/null\necho mij\n").unwrap();
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        let toolchain = Toolchain {
            foma: "foma".to_string(),
            flookup: path.to_str().unwrap().to_string(),
        };

        let fst = FomaTransducer::open(dir.path().join("maru.bin"), &toolchain);
        let err = fst.apply_up_all(&["mi".to_string(), "ka".to_string()]).unwrap_err();
        assert!(matches!(err, CognateError::LookupCount { expected: 2, answered: 1, .. }));
        assert!(err.is_internal());
    }

    #[cfg(unix)]
    #[test]
    fn test_select_indexed_keeps_produced_stacks() {
        let dir = TempDir::new().unwrap();
        let toolchain = crate::fst::fake_tools::foma(dir.path());
        let script = "regex m i;\nsave stack maru.bin\nsave stack bola.bin\nsave stack proto.bin\n";

        let compiled = CompiledScript::compile(script, &toolchain).unwrap();
        let set = compiled.select_indexed(&FstIndex::burmish());
        assert_eq!(set.doculects().collect::<Vec<_>>(), vec!["Bola", "Maru"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_select_by_name_ignores_case() {
        let dir = TempDir::new().unwrap();
        let toolchain = crate::fst::fake_tools::foma(dir.path());
        let script = "regex j u ng;\nsave stack german.bin\nsave stack english.bin\n";

        let compiled = CompiledScript::compile(script, &toolchain).unwrap();
        let set = compiled.select_by_name(["German", "Gothic", "ENGLISH"]);
        assert_eq!(set.doculects().collect::<Vec<_>>(), vec!["ENGLISH", "German"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_missing_foma_is_launch_error() {
        let toolchain = Toolchain {
            foma: "/nonexistent/foma".to_string(),
            flookup: "flookup".to_string(),
        };
        let err = CompiledScript::compile("save stack maru.bin\n", &toolchain).err().unwrap();
        assert!(matches!(err, CognateError::ToolLaunch { .. }));
    }
}
