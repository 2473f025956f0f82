use crate::config::{LoggingConfig, Section};
use std::{
    collections::HashMap,
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::Targets, fmt};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 5;

/// Unknown level names fall back to INFO; "off"/"none" disable the sink.
fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// `target == prefix` or `target` starts with `prefix::`.
fn matches_target_prefix(target: &str, prefix: &str) -> bool {
    target == prefix
        || (target.starts_with(prefix) && target[prefix.len()..].starts_with("::"))
}

fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

// -------- rotating file sink --------

type SharedRotate = Arc<Mutex<FileRotate<AppendTimestamp>>>;

/// Size limit for one log file; absurd values clamp instead of overflowing.
fn max_file_bytes(section: &Section) -> usize {
    let bytes = section
        .max_size_mb
        .unwrap_or(DEFAULT_MAX_SIZE_MB)
        .saturating_mul(1024 * 1024);
    usize::try_from(bytes).unwrap_or(usize::MAX)
}

#[derive(Clone)]
struct RotatingFile(SharedRotate);

impl RotatingFile {
    fn open(path: &Path, section: &Section) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let max_bytes = max_file_bytes(section);
        let backups = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);
        let rot = FileRotate::new(
            path,
            AppendTimestamp::default(FileLimit::MaxFiles(backups)),
            ContentLimit::BytesSurpassed(max_bytes),
            Compression::None,
            #[cfg(unix)]
            None,
        );
        Ok(Self(Arc::new(Mutex::new(rot))))
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file lock poisoned"))?
            .flush()
    }
}

/// Writer that discards everything; used for targets without a file.
struct Discard;

impl Write for Discard {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

enum FileHandle {
    File(RotatingFile),
    Discard(Discard),
}

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            FileHandle::File(f) => f.write(buf),
            FileHandle::Discard(d) => d.write(buf),
        }
    }
    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            FileHandle::File(f) => f.flush(),
            FileHandle::Discard(d) => d.flush(),
        }
    }
}

/// Picks a log file by the longest matching target prefix, else the default file.
#[derive(Clone, Default)]
struct FileRouter {
    default: Option<RotatingFile>,
    by_prefix: Vec<(String, RotatingFile)>,
}

impl FileRouter {
    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }

    fn route(&self, target: &str) -> Option<&RotatingFile> {
        self.by_prefix
            .iter()
            .filter(|(prefix, _)| matches_target_prefix(target, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, file)| file)
            .or(self.default.as_ref())
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = FileHandle;

    fn make_writer(&'a self) -> Self::Writer {
        match &self.default {
            Some(f) => FileHandle::File(f.clone()),
            None => FileHandle::Discard(Discard),
        }
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        match self.route(meta.target()) {
            Some(f) => FileHandle::File(f.clone()),
            None => FileHandle::Discard(Discard),
        }
    }
}

// -------- plan --------

/// Filters and sinks derived from a [`LoggingConfig`].
struct LogPlan {
    console: Targets,
    file: Targets,
    router: FileRouter,
}

fn build_plan(cfg: &LoggingConfig, base_dir: &Path) -> LogPlan {
    let mut console = Targets::new().with_default(LevelFilter::OFF);
    let mut file = Targets::new().with_default(LevelFilter::OFF);
    let mut router = FileRouter::default();
    // Files shared between sections reuse one rotating handle.
    let mut opened: HashMap<PathBuf, RotatingFile> = HashMap::new();

    let mut open = |section: &Section| -> Option<RotatingFile> {
        if section.file.trim().is_empty() {
            return None;
        }
        let path = resolve_log_path(section.file.trim(), base_dir);
        if let Some(existing) = opened.get(&path) {
            return Some(existing.clone());
        }
        match RotatingFile::open(&path, section) {
            Ok(f) => {
                opened.insert(path, f.clone());
                Some(f)
            }
            Err(e) => {
                eprintln!("cannot open log file '{}': {e}", path.display());
                None
            }
        }
    };

    if let Some(default) = cfg.get("default") {
        console = console.with_default(parse_level(&default.console_level));
        if let Some(f) = open(default) {
            router.default = Some(f);
            file = file.with_default(parse_level(&default.file_level));
        }
    }

    let mut names: Vec<&String> = cfg.keys().filter(|k| k.as_str() != "default").collect();
    names.sort();
    for name in names {
        let section = &cfg[name];
        console = console.with_target(name.clone(), parse_level(&section.console_level));
        match open(section) {
            Some(f) => {
                router.by_prefix.push((name.clone(), f));
                file = file.with_target(name.clone(), parse_level(&section.file_level));
            }
            // Without its own file the subsystem still lands in the default file.
            None if router.default.is_some() => {
                file = file.with_target(name.clone(), parse_level(&section.file_level));
            }
            None => {}
        }
    }

    LogPlan {
        console,
        file,
        router,
    }
}

// -------- public init --------

/// Install the global subscriber: human-readable console output plus JSON
/// lines in rotating files. Relative file paths resolve against `base_dir`.
///
/// Calling it twice is harmless; the second install is ignored.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        init_default_logging();
        return;
    }

    let plan = build_plan(cfg, base_dir);
    let ansi = std::io::stderr().is_terminal();

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(plan.console);

    let file_layer = (!plan.router.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(plan.router)
            .with_filter(plan.file)
    });

    let _ = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

fn init_default_logging() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_max_level(LevelFilter::WARN)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .try_init();
}
