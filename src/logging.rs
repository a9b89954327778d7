use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, OnceLock, RwLock};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Log sink shared by every formatter instance. Always writes to stderr and,
/// once [`set_log_file`] has been called, to the log file as well.
#[derive(Clone)]
struct SharedWriter {
    file: Arc<RwLock<Option<std::fs::File>>>,
}

struct TeeWriter {
    file: Arc<RwLock<Option<std::fs::File>>>,
}

impl SharedWriter {
    fn new() -> Self {
        Self {
            file: Arc::new(RwLock::new(None)),
        }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedWriter {
    type Writer = TeeWriter;

    fn make_writer(&'a self) -> Self::Writer {
        TeeWriter {
            file: self.file.clone(),
        }
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = io::stderr().write(buf)?;
        if let Ok(mut guard) = self.file.write() {
            if let Some(file) = guard.as_mut() {
                let _ = file.write_all(&buf[..written]);
            }
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Ok(mut guard) = self.file.write() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
        Ok(())
    }
}

static WRITER: OnceLock<SharedWriter> = OnceLock::new();

/// Service logs at `info`; the HTTP stack under axum and the GitHub client
/// only reports warnings.
const DEFAULT_DIRECTIVES: &str = "info,hyper=warn,hyper_util=warn,h2=warn,reqwest=warn,rustls=warn";

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Installs the global subscriber. `RUST_LOG` replaces the default
/// directives; `log` records are forwarded into `tracing`.
pub fn init() {
    let _ = tracing_log::LogTracer::init();

    let env_filter = filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());

    let writer = WRITER.get_or_init(SharedWriter::new).clone();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .try_init();
}

pub fn set_log_file(log_file: Option<&Path>) -> anyhow::Result<()> {
    let Some(writer) = WRITER.get() else {
        return Ok(());
    };
    let file = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Some(file)
        }
        None => None,
    };
    match writer.file.write() {
        Ok(mut guard) => *guard = file,
        Err(poisoned) => *poisoned.into_inner() = file,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_quiets_http_stack() {
        let filter = filter_from(None).to_string();
        assert!(filter.split(',').any(|d| d == "info"));
        assert!(filter.contains("hyper=warn"));
        assert!(filter.contains("reqwest=warn"));

        assert_eq!(filter_from(Some("campusmatch=debug")).to_string(), "campusmatch=debug");
        assert_eq!(filter_from(Some("  ")).to_string(), filter_from(None).to_string());
    }

    #[test]
    fn log_file_receives_output() {
        init();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("campusmatch.log");
        set_log_file(Some(&path)).unwrap();

        let mut writer = TeeWriter {
            file: WRITER.get().unwrap().file.clone(),
        };
        writer.write_all(b"hello log\n").unwrap();
        writer.flush().unwrap();
        set_log_file(None).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("hello log"));
    }
}
