use std::{path::PathBuf, str::FromStr};

use anyhow::{anyhow, Context};

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

/// Where user records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("unknown STORE_BACKEND {other:?}")),
        }
    }
}

/// Where uploaded profile images are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Local {
        upload_dir: PathBuf,
    },
    S3 {
        endpoint: String,
        bucket: String,
        access_key: String,
        secret_key: String,
        region: String,
    },
}

impl StorageConfig {
    pub fn backend(&self) -> &'static str {
        match self {
            StorageConfig::Local { .. } => "local",
            StorageConfig::S3 { .. } => "s3",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("STORE_BACKEND") {
            Some(v) => v.parse()?,
            None => StoreBackend::Postgres,
        };

        let database_url = lookup("DATABASE_URL");
        if store == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when STORE_BACKEND=postgres");
        }

        let jwt = JwtConfig {
            secret: lookup("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "placebook".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "placebook-users".into()),
        };

        let storage = match lookup("STORAGE_BACKEND").as_deref() {
            None | Some("local") => StorageConfig::Local {
                upload_dir: lookup("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("uploads/images")),
            },
            Some("s3") => StorageConfig::S3 {
                endpoint: lookup("S3_ENDPOINT").context("S3_ENDPOINT must be set")?,
                bucket: lookup("S3_BUCKET").context("S3_BUCKET must be set")?,
                access_key: lookup("S3_ACCESS_KEY").context("S3_ACCESS_KEY must be set")?,
                secret_key: lookup("S3_SECRET_KEY").context("S3_SECRET_KEY must be set")?,
                region: lookup("S3_REGION").unwrap_or_else(|| "us-east-1".into()),
            },
            Some(other) => anyhow::bail!("unknown STORAGE_BACKEND {other:?}"),
        };

        let port = match lookup("APP_PORT") {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("APP_PORT {v:?} is not a port number"))?,
            None => 5000,
        };

        Ok(Self {
            store,
            database_url,
            jwt,
            storage,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_for_optional_keys() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/users"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .expect("config");

        assert_eq!(cfg.store, StoreBackend::Postgres);
        assert_eq!(cfg.jwt.issuer, "placebook");
        assert_eq!(cfg.jwt.audience, "placebook-users");
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(
            cfg.storage,
            StorageConfig::Local {
                upload_dir: PathBuf::from("uploads/images")
            }
        );
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "postgres://localhost/users",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn postgres_requires_database_url() {
        let err = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn memory_store_needs_no_database() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "s"),
            ("APP_PORT", "8081"),
        ]))
        .expect("config");
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.port, 8081);
    }

    #[test]
    fn s3_storage_reads_credentials() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "s"),
            ("STORAGE_BACKEND", "s3"),
            ("S3_ENDPOINT", "http://minio:9000"),
            ("S3_BUCKET", "avatars"),
            ("S3_ACCESS_KEY", "ak"),
            ("S3_SECRET_KEY", "sk"),
        ]))
        .expect("config");
        assert_eq!(cfg.storage.backend(), "s3");
        match cfg.storage {
            StorageConfig::S3 { bucket, region, .. } => {
                assert_eq!(bucket, "avatars");
                assert_eq!(region, "us-east-1");
            }
            other => panic!("expected s3 storage, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_port() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "s"),
            ("APP_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }
}
