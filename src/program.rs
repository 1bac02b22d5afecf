//! Program loading and the program-wide declaration index.
//!
//! A program is either an entry file plus every source unit reachable through
//! relative `import`/`export ... from` specifiers, or every TypeScript file under
//! a directory. Units matching an ignore pattern are still traversed for their
//! imports but contribute neither controllers nor models.

use crate::ast::{last_segment, Declaration, SourceUnit};
use crate::parser::AstParser;
use crate::scanner::{is_typescript_source, FileScanner};
use anyhow::{bail, Context, Result};
use glob::Pattern;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// Options controlling which source units make up a program.
#[derive(Debug, Clone, Default)]
pub struct ProgramOptions {
    /// Glob patterns; a unit whose path matches any of them is ignored
    pub ignore: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct DeclarationRef {
    unit: usize,
    declaration: usize,
}

/// The parsed, non-ignored source units and an index of their declarations.
#[derive(Debug)]
pub struct Program {
    units: Vec<SourceUnit>,
    index: HashMap<String, Vec<DeclarationRef>>,
}

impl Program {
    /// Loads the program rooted at `entry` (a file or a directory).
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist, an ignore pattern is
    /// invalid, or any reachable unit fails to read or parse.
    pub fn load(entry: &Path, options: &ProgramOptions) -> Result<Self> {
        let patterns = compile_patterns(&options.ignore)?;
        let root = if entry.is_dir() {
            entry.to_path_buf()
        } else {
            entry.parent().map(Path::to_path_buf).unwrap_or_default()
        };
        let root = root.canonicalize().unwrap_or(root);

        let paths = if entry.is_dir() {
            let scan = FileScanner::new(root.clone()).scan()?;
            for warning in &scan.warnings {
                warn!("{}", warning);
            }
            scan.source_files
        } else if entry.is_file() {
            Vec::new()
        } else {
            bail!("Entry point does not exist: {}", entry.display());
        };

        let units = if entry.is_dir() {
            paths
                .iter()
                .map(|path| AstParser::parse_file(path))
                .collect::<Result<Vec<_>>>()?
        } else {
            Self::follow_imports(entry)?
        };

        let total = units.len();
        let units: Vec<SourceUnit> = units
            .into_iter()
            .filter(|unit| {
                let ignored = is_ignored(&unit.path, &root, &patterns);
                if ignored {
                    debug!("Ignoring source unit: {}", unit.path.display());
                }
                !ignored
            })
            .collect();

        info!(
            "Loaded {} source units ({} ignored)",
            units.len(),
            total - units.len()
        );
        Ok(Self::from_units(units))
    }

    /// Parses in-memory sources; used by tests and embedders.
    pub fn from_sources<P: AsRef<Path>>(sources: &[(P, &str)]) -> Result<Self> {
        let units = sources
            .iter()
            .map(|(path, source)| AstParser::parse_source(path.as_ref(), source))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_units(units))
    }

    pub fn from_units(units: Vec<SourceUnit>) -> Self {
        let mut index: HashMap<String, Vec<DeclarationRef>> = HashMap::new();
        for (unit_idx, unit) in units.iter().enumerate() {
            for (decl_idx, declaration) in unit.declarations.iter().enumerate() {
                index
                    .entry(declaration.name().to_string())
                    .or_default()
                    .push(DeclarationRef {
                        unit: unit_idx,
                        declaration: decl_idx,
                    });
            }
        }
        Self { units, index }
    }

    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    /// All declarations named `name`; qualified names match on their last segment.
    pub fn find_declarations(&self, name: &str) -> Vec<(&SourceUnit, &Declaration)> {
        self.index
            .get(last_segment(name))
            .map(|refs| {
                refs.iter()
                    .map(|r| {
                        let unit = &self.units[r.unit];
                        (unit, &unit.declarations[r.declaration])
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Breadth-first walk over relative imports starting at `entry`.
    fn follow_imports(entry: &Path) -> Result<Vec<SourceUnit>> {
        let mut units = Vec::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut queue: VecDeque<PathBuf> = VecDeque::new();

        let entry = entry
            .canonicalize()
            .with_context(|| format!("Failed to access entry file: {}", entry.display()))?;
        seen.insert(entry.clone());
        queue.push_back(entry);

        while let Some(path) = queue.pop_front() {
            let unit = AstParser::parse_file(&path)?;
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();

            for specifier in &unit.imports {
                match resolve_module(&base, specifier) {
                    Some(resolved) => {
                        let resolved = resolved.canonicalize().unwrap_or(resolved);
                        if seen.insert(resolved.clone()) {
                            queue.push_back(resolved);
                        }
                    }
                    None => debug!(
                        "Unresolved import '{}' in {}",
                        specifier,
                        path.display()
                    ),
                }
            }
            units.push(unit);
        }

        Ok(units)
    }
}

/// Resolves a relative module specifier the way the TypeScript module
/// resolver does for source trees.
fn resolve_module(base: &Path, specifier: &str) -> Option<PathBuf> {
    let target = base.join(specifier);
    let mut candidates = Vec::new();

    if is_typescript_source(&target) {
        candidates.push(target.clone());
    }
    if let Some(stem) = specifier.strip_suffix(".js") {
        candidates.push(base.join(format!("{}.ts", stem)));
        candidates.push(base.join(format!("{}.tsx", stem)));
    }
    for extension in ["ts", "tsx", "d.ts"] {
        candidates.push(PathBuf::from(format!("{}.{}", target.display(), extension)));
    }
    for index in ["index.ts", "index.tsx", "index.d.ts"] {
        candidates.push(target.join(index));
    }

    candidates.into_iter().find(|c| c.is_file())
}

fn compile_patterns(ignore: &[String]) -> Result<Vec<Pattern>> {
    ignore
        .iter()
        .map(|raw| {
            Pattern::new(raw).with_context(|| format!("Invalid ignore pattern: {}", raw))
        })
        .collect()
}

fn is_ignored(path: &Path, root: &Path, patterns: &[Pattern]) -> bool {
    let relative = path.strip_prefix(root).ok();
    patterns.iter().any(|pattern| {
        pattern.matches_path(path) || relative.map_or(false, |r| pattern.matches_path(r))
    })
}
