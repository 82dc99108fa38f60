use failure::Fail;
use std::{fmt, str::FromStr, time::Duration};

pub static DB_HOST: &'static str = "DB_HOST";
pub static DB_PORT: &'static str = "DB_PORT";
pub static DB_NAME: &'static str = "POSTGRES_DB";
pub static DB_USER: &'static str = "POSTGRES_USER";
pub static DB_PASSWORD: &'static str = "POSTGRES_PASSWORD";
pub static DATABASE_URL: &'static str = "DATABASE_URL";
pub static CONNECT_ATTEMPTS: &'static str = "DB_CONNECT_ATTEMPTS";
pub static RETRY_DELAY_SECS: &'static str = "DB_RETRY_DELAY_SECS";
pub static CONNECT_TIMEOUT_SECS: &'static str = "DB_CONNECT_TIMEOUT_SECS";
pub static POOL_SIZE: &'static str = "DB_POOL_SIZE";
pub static BIND_ADDR: &'static str = "BIND_ADDR";
pub static STARTUP_POLICY: &'static str = "STARTUP_POLICY";

#[derive(Debug, Fail, PartialEq)]
pub enum ConfigError {
    #[fail(display = "{} must be {}, got '{}'", name, expected, value)]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// How many times to try reaching the database, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}

/// What to do when the schema cannot be created at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartupPolicy {
    /// Keep starting; requests create the schema once the database shows up.
    Degraded,
    /// Exit the process.
    FailFast,
}

impl FromStr for StartupPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "degraded" => Ok(StartupPolicy::Degraded),
            "fail-fast" | "failfast" | "fail_fast" => Ok(StartupPolicy::FailFast),
            _ => Err(()),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub database_url: Option<String>,
    pub retry: RetryPolicy,
    pub connect_timeout: Duration,
    pub pool_size: u32,
    pub bind: String,
    pub startup: StartupPolicy,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source. Unset variables fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let attempts: u32 = parse(&lookup, CONNECT_ATTEMPTS, 5, "a positive integer")?;
        if attempts == 0 {
            return Err(ConfigError::Invalid {
                name: CONNECT_ATTEMPTS,
                expected: "a positive integer",
                value: "0".to_string(),
            });
        }
        let delay: u64 = parse(&lookup, RETRY_DELAY_SECS, 5, "a number of seconds")?;
        let timeout: u64 = parse(&lookup, CONNECT_TIMEOUT_SECS, 5, "a number of seconds")?;
        let pool_size: u32 = parse(&lookup, POOL_SIZE, 10, "a positive integer")?;
        if pool_size == 0 {
            return Err(ConfigError::Invalid {
                name: POOL_SIZE,
                expected: "a positive integer",
                value: "0".to_string(),
            });
        }

        Ok(Config {
            host: text(DB_HOST, "db"),
            port: parse(&lookup, DB_PORT, 5432, "a port number")?,
            name: text(DB_NAME, "myappdb"),
            user: text(DB_USER, "user"),
            password: text(DB_PASSWORD, "password"),
            database_url: lookup(DATABASE_URL).filter(|url| !url.is_empty()),
            retry: RetryPolicy {
                attempts,
                delay: Duration::from_secs(delay),
            },
            connect_timeout: Duration::from_secs(timeout.max(1)),
            pool_size,
            bind: text(BIND_ADDR, "0.0.0.0:5000"),
            startup: parse(
                &lookup,
                STARTUP_POLICY,
                StartupPolicy::Degraded,
                "'degraded' or 'fail-fast'",
            )?,
        })
    }

    /// Connection string handed to libpq. `DATABASE_URL` wins when set.
    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!(
                "host={} port={} dbname={} user={} password={}",
                quote(&self.host),
                self.port,
                quote(&self.name),
                quote(&self.user),
                quote(&self.password),
            ),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("retry", &self.retry)
            .field("connect_timeout", &self.connect_timeout)
            .field("pool_size", &self.pool_size)
            .field("bind", &self.bind)
            .field("startup", &self.startup)
            .finish()
    }
}

fn parse<F, T>(lookup: &F, name: &'static str, default: T, expected: &'static str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}

// libpq keyword/value syntax: single quotes, backslash escapes for ' and \
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}
