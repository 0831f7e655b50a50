//! Enterprise-wide unlock across every domain controller
//!
//! Lockout state is replicated lazily, so a locked account has to be checked and
//! cleared on each controller separately. One task runs per controller; results are
//! yielded as the tasks complete.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use ez_directory_backend::{Credential, DirectoryError, DirectoryPath, SearchRequest};
use futures::stream::{BoxStream, FuturesUnordered, StreamExt};
use tokio::time::{Duration, Instant, timeout};

use crate::codec::AttributeReader;
use crate::error::{CoreError, CoreResult};
use crate::filter::{IdentityQuery, ObjectKind, build_filter};
use crate::services::account_service::unlock_at;
use crate::services::{ServiceContext, log_failure};
use crate::types::UnlockResult;

/// Attributes read from each controller.
const LOCKOUT_ATTRIBUTES: &[&str] = &[
    "badPasswordTime",
    "badPwdCount",
    "lockoutTime",
    "distinguishedName",
];

/// Controller-local lockout state after the check (and unlock, if one was needed).
struct ControllerState {
    bad_password_count: i64,
    last_bad_password_at: Option<DateTime<Utc>>,
    was_unlocked: bool,
}

/// Cross-controller unlock orchestrator
pub struct UnlockService {
    ctx: Arc<ServiceContext>,
}

impl UnlockService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Host names of every writable and read-only domain controller, sorted.
    pub async fn discover_controllers(
        &self,
        credential: Option<&Credential>,
    ) -> CoreResult<Vec<String>> {
        let filter = ObjectKind::DomainController.predicate().render();
        let bags = self.ctx.search_root(filter, &["name"], credential).await?;

        let domain = &self.ctx.config().domain;
        let mut controllers: Vec<String> = bags
            .iter()
            .map(|bag| bag.string("name"))
            .filter(|name| !name.is_empty())
            .map(|name| format!("{name}.{domain}"))
            .collect();
        controllers.sort();
        controllers.dedup();
        log::debug!("Discovered {} domain controllers", controllers.len());
        Ok(controllers)
    }

    /// Check `username` on every controller and unlock it wherever it is locked.
    ///
    /// Fails only when controller discovery fails. After that each controller yields
    /// exactly one [`UnlockResult`], in completion order; a controller that errors, stalls
    /// past the configured timeout or panics yields a failed result without affecting the
    /// others.
    pub async fn unlock_everywhere(
        &self,
        username: &str,
        credential: Option<&Credential>,
    ) -> CoreResult<BoxStream<'static, UnlockResult>> {
        let username = username.trim();
        if username.is_empty() {
            return Err(CoreError::ValidationError("username is empty".to_string()));
        }

        let controllers = self
            .discover_controllers(credential)
            .await
            .inspect_err(|e| log_failure("Controller discovery failed", e))?;
        log::info!(
            "Checking '{username}' on {} domain controllers",
            controllers.len()
        );

        let tasks: FuturesUnordered<_> = controllers
            .into_iter()
            .map(|controller| {
                let handle = tokio::spawn(check_controller(
                    self.ctx.clone(),
                    controller.clone(),
                    username.to_string(),
                    credential.cloned(),
                ));
                async move {
                    match handle.await {
                        Ok(result) => result,
                        Err(e) => {
                            log::error!("[{controller}] Unlock task aborted: {e}");
                            UnlockResult::failed(&controller, format!("task aborted: {e}"), 0)
                        }
                    }
                }
            })
            .collect();

        Ok(tasks.boxed())
    }

    /// [`unlock_everywhere`](Self::unlock_everywhere), gathered into a list in completion
    /// order.
    pub async fn unlock_everywhere_collect(
        &self,
        username: &str,
        credential: Option<&Credential>,
    ) -> CoreResult<Vec<UnlockResult>> {
        let stream = self.unlock_everywhere(username, credential).await?;
        Ok(stream.collect().await)
    }
}

/// One controller's task: never fails, always yields exactly one result.
async fn check_controller(
    ctx: Arc<ServiceContext>,
    controller: String,
    username: String,
    credential: Option<Credential>,
) -> UnlockResult {
    let started = Instant::now();
    let work = unlock_on_controller(&ctx, &controller, &username, credential.as_ref());

    let outcome = match ctx.config().controller_timeout_secs {
        Some(secs) => timeout(Duration::from_secs(secs), work)
            .await
            .unwrap_or_else(|_| {
                Err(DirectoryError::Timeout {
                    endpoint: controller.clone(),
                    detail: format!("no answer within {secs}s"),
                }
                .into())
            }),
        None => work.await,
    };

    #[allow(clippy::cast_possible_truncation)]
    let elapsed = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(state) => UnlockResult::reached(
            &controller,
            state.bad_password_count,
            state.last_bad_password_at,
            state.was_unlocked,
            elapsed,
            &Local,
        ),
        Err(e) => {
            log_failure(&format!("[{controller}] Unlock check failed"), &e);
            UnlockResult::failed(&controller, e.to_string(), elapsed)
        }
    }
}

async fn unlock_on_controller(
    ctx: &ServiceContext,
    controller: &str,
    username: &str,
    credential: Option<&Credential>,
) -> CoreResult<ControllerState> {
    let root = ctx.root().with_host(controller);
    let filter = build_filter(ObjectKind::Person, &IdentityQuery::new().username(username));
    let request = SearchRequest::subtree(filter.render())
        .with_page_size(ctx.config().page_size)
        .with_attributes(LOCKOUT_ATTRIBUTES.iter().copied());

    let bag = ctx
        .search(&root, &request, credential)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::AccountNotFound(username.to_string()))?;

    let bad_password_count = bag.int64("badPwdCount");
    let locked = bag.int64("lockoutTime") != 0;
    let needs_unlock = locked || bad_password_count >= ctx.config().lockout_threshold;

    if needs_unlock {
        let dn = if bag.dn.is_empty() {
            bag.string("distinguishedName")
        } else {
            bag.dn.clone()
        };
        let path = DirectoryPath::from_dn(dn).with_host(controller);
        unlock_at(ctx, &path, credential).await?;
    }

    Ok(ControllerState {
        bad_password_count,
        last_bad_password_at: bag.file_time("badPasswordTime"),
        was_unlocked: needs_unlock,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        DOMAIN, MockBackend, ROOT_DN, controller_bag, test_config, test_context,
        test_context_with, user_bag,
    };
    use crate::types::UnlockStatus;

    const LOCKED_AT: &str = "133497846000000000";

    fn host(name: &str) -> String {
        format!("{name}.{DOMAIN}")
    }

    /// Controllers DCA, DCB and DCC with `jdoe` stored but not yet searchable.
    fn controllers_only() -> Arc<MockBackend> {
        let backend = Arc::new(MockBackend::new());
        backend.on_search(
            "primaryGroupID=516",
            vec![controller_bag("DCC"), controller_bag("DCA"), controller_bag("DCB")],
        );
        backend.add_object(user_bag("jdoe", "Staff"));
        backend
    }

    /// Controllers DCA, DCB and DCC; `jdoe` is known and unlocked everywhere.
    fn three_controllers() -> Arc<MockBackend> {
        let backend = controllers_only();
        backend.on_search("(sAMAccountName=jdoe)", vec![user_bag("jdoe", "Staff")]);
        backend
    }

    fn order(results: &[UnlockResult]) -> Vec<&str> {
        results.iter().map(|r| r.controller.as_str()).collect()
    }

    #[tokio::test]
    async fn discovers_sorted_fqdns() {
        let backend = three_controllers();
        let service = UnlockService::new(test_context(&backend));
        let controllers = service.discover_controllers(None).await.unwrap();
        assert_eq!(controllers, vec![host("DCA"), host("DCB"), host("DCC")]);
        assert!(backend.searches()[0].1.contains("(primaryGroupID=521)"));
    }

    #[tokio::test]
    async fn one_failing_controller_does_not_affect_the_others() {
        let backend = three_controllers();
        backend.fail_host(
            &host("DCB"),
            DirectoryError::ConnectFailed {
                endpoint: host("DCB"),
                detail: "connection refused".into(),
            },
        );
        let service = UnlockService::new(test_context(&backend));

        let results = service.unlock_everywhere_collect("jdoe", None).await.unwrap();
        assert_eq!(results.len(), 3);

        let failures: Vec<_> = results.iter().filter(|r| r.is_failure()).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].controller, host("DCB"));
        assert_eq!(failures[0].message, format!("Failed to connect to {}", host("DCB")));
        assert!(failures[0].error.as_deref().unwrap().contains("connection refused"));

        for ok in results.iter().filter(|r| !r.is_failure()) {
            assert_eq!(ok.status, UnlockStatus::Checked);
            assert!(ok.message.ends_with(": 0 Failed last on never"));
        }
        assert_eq!(backend.open_sessions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn results_stream_in_completion_order() {
        let backend = three_controllers();
        backend.delay_host(&host("DCA"), Duration::from_millis(100));
        backend.delay_host(&host("DCB"), Duration::from_millis(10));
        backend.delay_host(&host("DCC"), Duration::from_millis(50));
        let service = UnlockService::new(test_context(&backend));

        let mut stream = service.unlock_everywhere("jdoe", None).await.unwrap();
        let mut results = Vec::new();
        while let Some(result) = stream.next().await {
            results.push(result);
        }
        assert_eq!(order(&results), vec![host("DCB"), host("DCC"), host("DCA")]);
        assert!(results[0].response_time_ms >= 10);
        assert!(results[2].response_time_ms >= 100);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_controller_times_out() {
        let backend = three_controllers();
        backend.delay_host(&host("DCC"), Duration::from_secs(3600));
        let service = UnlockService::new(test_context(&backend));

        let results = service.unlock_everywhere_collect("jdoe", None).await.unwrap();
        assert_eq!(results.len(), 3);
        let last = &results[2];
        assert_eq!(last.controller, host("DCC"));
        assert!(last.is_failure());
        assert!(last.error.as_deref().unwrap().contains("Timeout"));
        assert!(last.response_time_ms >= 30_000);
        assert!(last.response_time_ms < 3_600_000);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_can_be_disabled() {
        let backend = three_controllers();
        backend.delay_host(&host("DCA"), Duration::from_secs(120));
        let mut config = test_config();
        config.controller_timeout_secs = None;
        let service = UnlockService::new(test_context_with(&backend, config));

        let results = service.unlock_everywhere_collect("jdoe", None).await.unwrap();
        assert!(results.iter().all(|r| !r.is_failure()));
        assert_eq!(results[2].controller, host("DCA"));
    }

    #[tokio::test]
    async fn locked_account_is_unlocked_on_that_controller_only() {
        let backend = controllers_only();
        backend.on_host_search(
            Some(&host("DCA")),
            "(sAMAccountName=jdoe)",
            vec![
                user_bag("jdoe", "Staff")
                    .with_text("lockoutTime", [LOCKED_AT])
                    .with_text("badPwdCount", ["6"])
                    .with_text("badPasswordTime", [LOCKED_AT]),
            ],
        );
        backend.on_search("(sAMAccountName=jdoe)", vec![user_bag("jdoe", "Staff")]);
        let service = UnlockService::new(test_context(&backend));

        let results = service.unlock_everywhere_collect("jdoe", None).await.unwrap();
        let unlocked: Vec<_> = results.iter().filter(|r| r.was_unlocked).collect();
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].controller, host("DCA"));
        assert_eq!(unlocked[0].status, UnlockStatus::Unlocked);
        assert!(unlocked[0].message.starts_with("DCA: 6 Failed last on "));
        assert!(!unlocked[0].message.ends_with("never"));

        let commits = backend.commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(
            commits[0].0,
            format!("LDAP://{}/CN=jdoe,OU=Staff,{ROOT_DN}", host("DCA"))
        );
    }

    #[tokio::test]
    async fn threshold_count_triggers_unlock() {
        let backend = Arc::new(MockBackend::new());
        backend.on_search("primaryGroupID=516", vec![controller_bag("DC1")]);
        backend.on_search(
            "(sAMAccountName=jdoe)",
            vec![user_bag("jdoe", "Staff").with_text("badPwdCount", ["5"])],
        );
        backend.add_object(user_bag("jdoe", "Staff"));

        let mut config = test_config();
        config.lockout_threshold = 5;
        let service = UnlockService::new(test_context_with(&backend, config));
        let results = service.unlock_everywhere_collect("jdoe", None).await.unwrap();
        assert!(results[0].was_unlocked);
    }

    #[tokio::test]
    async fn repeated_runs_do_not_fail() {
        let backend = three_controllers();
        let service = UnlockService::new(test_context(&backend));
        for _ in 0..2 {
            let results = service.unlock_everywhere_collect("jdoe", None).await.unwrap();
            assert_eq!(results.len(), 3);
            assert!(results.iter().all(|r| !r.is_failure()));
        }
    }

    #[tokio::test]
    async fn unknown_user_fails_per_controller() {
        let backend = three_controllers();
        let service = UnlockService::new(test_context(&backend));
        let results = service.unlock_everywhere_collect("ghost", None).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(UnlockResult::is_failure));
        assert!(results[0].message.starts_with("Failed to connect to "));
    }

    #[tokio::test]
    async fn panicking_controller_becomes_failed_result() {
        let backend = three_controllers();
        backend.panic_on_host(&host("DCA"));
        let service = UnlockService::new(test_context(&backend));

        let results = service.unlock_everywhere_collect("jdoe", None).await.unwrap();
        assert_eq!(results.len(), 3);
        let failed: Vec<_> = results.iter().filter(|r| r.is_failure()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].controller, host("DCA"));
    }

    #[tokio::test]
    async fn discovery_failure_aborts_the_run() {
        let backend = Arc::new(MockBackend::new());
        backend.fail_host(
            "default",
            DirectoryError::InvalidCredentials {
                endpoint: "default".into(),
                raw_message: None,
            },
        );
        let service = UnlockService::new(test_context(&backend));
        assert!(matches!(
            service.unlock_everywhere("jdoe", None).await,
            Err(CoreError::Directory(DirectoryError::InvalidCredentials { .. }))
        ));
    }

    #[tokio::test]
    async fn each_task_binds_with_the_credential() {
        let backend = three_controllers();
        let service = UnlockService::new(test_context(&backend));
        let cred = Credential::new("helpdesk", "pw");
        service
            .unlock_everywhere_collect("jdoe", Some(&cred))
            .await
            .unwrap();
        let binds = backend.binds();
        assert_eq!(binds.len(), 4);
        assert!(binds.iter().all(|b| b.as_deref() == Some("helpdesk")));
    }
}
