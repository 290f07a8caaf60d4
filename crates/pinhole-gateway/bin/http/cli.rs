use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const LISTEN_ADDR_ENV: &str = "PINHOLE_LISTEN_ADDR";
pub const PUBLIC_BASE_URL_ENV: &str = "PINHOLE_PUBLIC_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "PINHOLE_STORAGE";
pub const DATA_FILE_ENV: &str = "PINHOLE_DATA_FILE";
pub const CODE_LIMIT_ENV: &str = "PINHOLE_CODE_LIMIT";
pub const LOG_FORMAT_ENV: &str = "PINHOLE_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_DATA_FILE: &str = "saved_urls.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "file")]
    File,
    #[value(name = "in-memory")]
    InMemory,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::File => write!(f, "file"),
            StorageBackendArg::InMemory => write!(f, "in-memory"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "pinhole", about = "Six-character URL shortener")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Prefix of the short URLs handed back to clients.
    #[arg(long, env = PUBLIC_BASE_URL_ENV, default_value = DEFAULT_PUBLIC_BASE_URL)]
    pub public_base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::File
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = DATA_FILE_ENV, default_value = DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,

    /// Stop issuing codes once this many have been handed out.
    #[arg(long, env = CODE_LIMIT_ENV)]
    pub code_limit: Option<u64>,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,
}
