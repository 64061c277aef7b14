//! Logging backend which logs to a file and, in debug builds, over UDP.

use chrono::Local;
use log::{Level, Metadata, Record};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    sync::{mpsc::Sender, Mutex},
};

use crate::config::Options;

#[derive(Clone, Copy, Serialize, Deserialize)]
enum MessageType {
    Normal,
    Error,
    Warning,
    Debug,
}

#[derive(Serialize, Deserialize)]
struct Message {
    module: String,
    msg_type: MessageType,
    string: String,
    time: String,
}

impl Message {
    #[cfg_attr(not(feature = "debug"), allow(dead_code))]
    fn pack(&self) -> Option<Vec<u8>> {
        let serialized = bincode::serialize::<Message>(self).ok()?;

        let mut len_bytes = Vec::from(u32::to_le_bytes((serialized.len() as u32) + 4));
        len_bytes.extend(&serialized);

        Some(len_bytes)
    }

    fn format(&self) -> String {
        let level_name = match self.msg_type {
            MessageType::Normal => "info",
            MessageType::Error => "error",
            MessageType::Warning => "warning",
            MessageType::Debug => "debug",
        };

        //      [date time] [module] [level] Text
        format!(
            "[{}] [{}] [{}] {}\n",
            self.time, self.module, level_name, self.string
        )
    }

    fn write_to_file(&self, file: &mut File) {
        let _ = file.write_all(self.format().as_bytes());
    }
}

pub struct Logger;

impl Logger {
    pub fn commit(&self, record: &log::Record) {
        let msg_type = match record.level() {
            Level::Error => MessageType::Error,
            Level::Warn => MessageType::Warning,
            Level::Info => MessageType::Normal,
            Level::Debug | Level::Trace => MessageType::Debug,
        };

        let module_path = match record.module_path() {
            Some(path) => path,
            None => return,
        };

        let message = Message {
            module: module_path
                .split("::")
                .last()
                .unwrap_or("unknown")
                .to_string(),
            msg_type,
            string: format!("{}", record.args()),
            time: Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        };

        if let Some(sender) = MSG_SENDER.get() {
            if let Ok(sender) = sender.lock() {
                // The writer thread only goes away with the process.
                let _ = sender.send(message);
            }
        }
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.commit(record);
        }
    }

    fn flush(&self) {}
}

static LOGGER: Logger = Logger;
static MSG_SENDER: OnceCell<Mutex<Sender<Message>>> = OnceCell::new();
static CRASH_PATH: OnceCell<PathBuf> = OnceCell::new();

fn panic_hook(info: &std::panic::PanicInfo) {
    let message = info
        .payload()
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| info.payload().downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "no message".to_string());

    let location = info
        .location()
        .map(|loc| format!("{}:{}", loc.file(), loc.line()))
        .unwrap_or_else(|| "unknown".to_string());

    let time = Local::now();
    let backtrace = std::backtrace::Backtrace::force_capture();

    let info_dump = format!(
        "Extended features panicked.
The panic continues to unwind into the host, which decides what happens next.

Message: {message}
Location: {location}
Time: {time}
Backtrace: see below

{backtrace}"
    );

    log::error!("{info_dump}");

    if let Some(path) = CRASH_PATH.get() {
        let _ = std::fs::write(path, info_dump);
    }
}

/// Returns the path that crash reports are written to for a given log file.
fn crash_path(log_path: &Path) -> PathBuf {
    log_path.with_file_name("ext_features_PANIC.txt")
}

fn install_panic_hook(log_path: &Path) {
    let _ = CRASH_PATH.set(crash_path(log_path));

    // Print useful information on a panic instead of just unwinding silently.
    std::panic::set_hook(Box::new(panic_hook));
}

/// Installs the logger. Calling this more than once only updates the level filter.
pub fn init(options: &Options) -> eyre::Result<()> {
    let level = options.log_level.filter();

    if MSG_SENDER.get().is_some() {
        log::set_max_level(level);
        log::warn!("Logger already initialised; only the level was changed.");
        return Ok(());
    }

    let mut file = File::create(&options.log_path).map_err(|err| {
        eyre::eyre!(
            "unable to create log file '{}': {err}",
            options.log_path.display()
        )
    })?;

    let (sender, receiver) = std::sync::mpsc::channel::<Message>();

    if MSG_SENDER.set(Mutex::new(sender)).is_err() {
        return Ok(());
    }

    install_panic_hook(&options.log_path);

    log::set_logger(&LOGGER)
        .map(|_| log::set_max_level(level))
        .map_err(|err| eyre::eyre!("another logger is installed: {err}"))?;

    #[cfg(feature = "debug")]
    let socket = options
        .udp_log_target
        .clone()
        .and_then(|target| Some((std::net::UdpSocket::bind("0.0.0.0:0").ok()?, target)));

    // Writing happens on a background thread so that file and socket I/O never stall a tick.
    std::thread::spawn(move || {
        while let Ok(msg) = receiver.recv() {
            msg.write_to_file(&mut file);

            #[cfg(feature = "debug")]
            if let Some((socket, target)) = &socket {
                if let Some(bin) = msg.pack() {
                    let _ = socket.send_to(&bin, target.as_str());
                }
            }
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(msg_type: MessageType) -> Message {
        Message {
            module: "registry".to_string(),
            msg_type,
            string: "flag 'can_slam' could not be decoded".to_string(),
            time: "2024-01-01 00:00:00.000".to_string(),
        }
    }

    #[test]
    fn format_matches_log_layout() {
        assert_eq!(
            message(MessageType::Warning).format(),
            "[2024-01-01 00:00:00.000] [registry] [warning] flag 'can_slam' could not be decoded\n"
        );
    }

    #[test]
    fn packed_messages_are_length_prefixed() {
        let packed = message(MessageType::Normal).pack().unwrap();
        let len = u32::from_le_bytes([packed[0], packed[1], packed[2], packed[3]]);

        assert_eq!(len as usize, packed.len());
    }

    #[test]
    fn crash_report_sits_next_to_log() {
        let path = crash_path(Path::new("/tmp/logs/ext_features.log"));
        assert_eq!(path, Path::new("/tmp/logs/ext_features_PANIC.txt"));
    }
}
