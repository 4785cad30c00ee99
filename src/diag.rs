use console::style;
use std::path::Path;

/// Name the binary was invoked as, used to prefix diagnostics.
pub fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

pub fn warn(message: &str) {
    eprintln!(
        "{}: {}",
        style(program_name()).yellow().for_stderr(),
        message
    );
}

pub fn fatal(err: &anyhow::Error) {
    eprintln!("{}: {err:#}", style(program_name()).red().for_stderr());
}
