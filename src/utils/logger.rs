//! solvable-server 的日志输出
//!
//! 控制台带颜色，同时追加写入 `$LOG_DIR/solvable-server.log`，启动时超过大小上限就轮转。
//! HTTP 请求日志来自 tower-http 的 TraceLayer，经 tracing 的 `log` 特性进到这里，
//! indexer 和交易流水线用下面的 `log_*!` 宏。
use env_logger::fmt::Formatter;
use env_logger::{Builder, Target, WriteStyle};
use log::{Level, LevelFilter, Record};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};

const LOG_FILE_NAME: &str = "solvable-server.log";
const LOG_MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const LOG_MAX_ROTATIONS: usize = 5;

/// 依赖库只看警告以上，避免 RPC 轮询刷屏
const QUIET_TARGETS: [&str; 5] = [
    "ethers_providers",
    "hyper",
    "hyper_util",
    "tokio_postgres",
    "tower_http",
];

static INIT_LOGGER: Once = Once::new();
static FILE_WRITER: Mutex<Option<File>> = Mutex::new(None);

/// 从环境变量读取的日志设置
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    dir: PathBuf,
    level: LevelFilter,
}

impl LogSettings {
    fn from_env() -> Self {
        Self::from_values(
            std::env::var("LOG_DIR").ok().as_deref(),
            std::env::var("LOG_LEVEL").ok().as_deref(),
        )
    }

    fn from_values(dir: Option<&str>, level: Option<&str>) -> Self {
        let level = match level {
            None => LevelFilter::Info,
            Some(raw) => parse_level(raw).unwrap_or_else(|| {
                eprintln!("⚠️ invalid LOG_LEVEL '{}', using INFO", raw);
                LevelFilter::Info
            }),
        };
        Self {
            dir: PathBuf::from(dir.filter(|d| !d.trim().is_empty()).unwrap_or("logs")),
            level,
        }
    }

    fn file_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE_NAME)
    }
}

fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_uppercase().as_str() {
        "TRACE" => Some(LevelFilter::Trace),
        "DEBUG" => Some(LevelFilter::Debug),
        "INFO" => Some(LevelFilter::Info),
        "WARN" => Some(LevelFilter::Warn),
        "ERROR" => Some(LevelFilter::Error),
        _ => None,
    }
}

fn level_color(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[91m",
        Level::Warn => "\x1b[93m",
        Level::Info => "\x1b[92m",
        Level::Debug => "\x1b[96m",
        Level::Trace => "\x1b[95m",
    }
}

/// 文件里不带颜色，多一个线程名方便对照 indexer 任务
fn file_line(now: &str, thread: &str, module: &str, level: Level, message: &str) -> String {
    format!("[{}] [{}] [{}] {:>5} - {}\n", now, thread, module, level, message)
}

fn append_to_file(line: &str) {
    // 文件写入失败不影响控制台输出
    if let Ok(mut guard) = FILE_WRITER.lock() {
        if let Some(file) = guard.as_mut() {
            let _ = file.write_all(line.as_bytes());
        }
    }
}

fn open_log_file(settings: &LogSettings) -> bool {
    if let Err(e) = fs::create_dir_all(&settings.dir) {
        eprintln!("❌ cannot create log dir {}: {}", settings.dir.display(), e);
        return false;
    }
    if let Err(e) = rotate_logs(&settings.dir, LOG_FILE_NAME, LOG_MAX_SIZE_BYTES) {
        eprintln!("⚠️ log rotation failed: {}", e);
    }
    match File::options()
        .create(true)
        .append(true)
        .open(settings.file_path())
    {
        Ok(f) => {
            if let Ok(mut guard) = FILE_WRITER.lock() {
                *guard = Some(f);
            }
            true
        }
        Err(e) => {
            eprintln!("❌ cannot open log file: {}", e);
            false
        }
    }
}

pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let settings = LogSettings::from_env();
        let file_enabled = open_log_file(&settings);

        let mut builder = Builder::from_default_env();
        builder.filter(None, settings.level);
        for target in QUIET_TARGETS {
            builder.filter(Some(target), LevelFilter::Warn);
        }
        builder
            .write_style(WriteStyle::Always)
            .format(move |f: &mut Formatter, record: &Record| {
                let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S.%3f").to_string();
                let module = record.module_path().unwrap_or("unknown");

                if file_enabled {
                    append_to_file(&file_line(
                        &now,
                        std::thread::current().name().unwrap_or("-"),
                        module,
                        record.level(),
                        &record.args().to_string(),
                    ));
                }

                writeln!(
                    f,
                    "[{}] [{}{:>5}\x1b[0m] [\x1b[31m{}\x1b[0m] - {}",
                    now,
                    level_color(record.level()),
                    record.level(),
                    module,
                    record.args()
                )
            })
            .target(Target::Stdout);

        match builder.try_init() {
            Ok(()) => log::info!(
                "solvable-server logging at {} -> {}",
                settings.level,
                settings.file_path().display()
            ),
            Err(e) => eprintln!("❌ logger init failed: {}", e),
        }
    });
}

/// 超过上限时 name -> name.1 -> name.2 ...，最多保留 LOG_MAX_ROTATIONS 份
fn rotate_logs(dir: &Path, name: &str, max_bytes: u64) -> io::Result<()> {
    let current = dir.join(name);
    if !current.exists() || fs::metadata(&current)?.len() < max_bytes {
        return Ok(());
    }

    for i in (1..LOG_MAX_ROTATIONS).rev() {
        let src = dir.join(format!("{}.{}", name, i));
        if src.exists() {
            fs::rename(&src, dir.join(format!("{}.{}", name, i + 1)))?;
        }
    }
    fs::rename(&current, dir.join(format!("{}.1", name)))
}

#[macro_export]
macro_rules! log_trace { ($($arg:tt)*) => { log::trace!($($arg)*) }; }
#[macro_export]
macro_rules! log_debug { ($($arg:tt)*) => { log::debug!($($arg)*) }; }
#[macro_export]
macro_rules! log_info  { ($($arg:tt)*) => { log::info!($($arg)*) }; }
#[macro_export]
macro_rules! log_warn  { ($($arg:tt)*) => { log::warn!($($arg)*) }; }
#[macro_export]
macro_rules! log_error { ($($arg:tt)*) => { log::error!($($arg)*) }; }
