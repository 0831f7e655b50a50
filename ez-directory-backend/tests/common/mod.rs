//! Shared helpers for live-directory integration tests

#![allow(dead_code)]

use std::env;
use std::sync::Arc;

use ez_directory_backend::{
    BackendConfig, Credential, DirectoryBackend, DirectoryPath, create_backend,
};

/// Return early when any of the named environment variables is missing.
#[macro_export]
macro_rules! skip_if_no_directory {
    ($($var:expr),+) => {
        $(
            if std::env::var($var).is_err() {
                eprintln!("skipping: environment variable {} is not set", $var);
                return;
            }
        )+
    };
}

/// Assert `Some` and unwrap it, failing the test otherwise.
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let opt = $expr;
        assert!(opt.is_some(), "{}", format_args!($($msg)+));
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// Assert `Ok` and unwrap it, failing the test otherwise.
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(res.is_ok(), "{}: {res:?}", format_args!($($msg)+));
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// Live directory connection details read from `EZDIR_TEST_*` variables.
pub struct TestContext {
    pub backend: Arc<dyn DirectoryBackend>,
    pub root: DirectoryPath,
    pub credential: Credential,
}

impl TestContext {
    pub fn from_env() -> Option<Self> {
        let host = env::var("EZDIR_TEST_HOST").ok()?;
        let base_dn = env::var("EZDIR_TEST_BASE_DN").ok()?;
        let username = env::var("EZDIR_TEST_USERNAME").ok()?;
        let password = env::var("EZDIR_TEST_PASSWORD").ok()?;
        let use_tls = env::var("EZDIR_TEST_TLS").is_ok_and(|v| v == "1" || v == "true");

        let backend = create_backend(&BackendConfig {
            default_host: Some(host),
            use_tls,
            ..BackendConfig::default()
        })
        .ok()?;

        let mut credential = Credential::new(username, password);
        if let Ok(domain) = env::var("EZDIR_TEST_DOMAIN") {
            credential = credential.with_domain(domain);
        }

        Some(Self {
            backend,
            root: DirectoryPath::from_dn(base_dn),
            credential,
        })
    }
}
