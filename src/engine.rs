use crate::actions::ActionExecutor;
use crate::conditions::rule_matches;
use crate::error::EngineError;
use crate::gateway::MailboxGateway;
use crate::labels::LabelCache;
use crate::rules::{Rule, load_rules};
use crate::store::EmailStore;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Loads rules, evaluates them against stored records and dispatches matching actions.
///
/// Every call to [`RuleEngine::apply`] gets its own label cache, so nothing leaks between
/// runs when an engine is reused.
pub struct RuleEngine {
    store: Arc<dyn EmailStore>,
    gateway: Option<Arc<dyn MailboxGateway>>,
    rules_file: PathBuf,
}

impl RuleEngine {
    /// An engine without a gateway runs in dry-run mode.
    pub fn new(store: Arc<dyn EmailStore>, rules_file: impl Into<PathBuf>) -> Self {
        Self {
            store,
            gateway: None,
            rules_file: rules_file.into(),
        }
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn MailboxGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.gateway.is_none()
    }

    /// Returns how many actions were applied or, in dry-run mode, logged.
    pub async fn apply(&self, limit: u32) -> Result<usize, EngineError> {
        let rules = load_rules(&self.rules_file)?;
        self.apply_rules(&rules, limit).await
    }

    pub async fn apply_rules(&self, rules: &[Rule], limit: u32) -> Result<usize, EngineError> {
        let records = self
            .store
            .get_last_n_records(limit)
            .await
            .map_err(EngineError::Store)?;

        let gateway = self.gateway.as_deref();
        let mut labels = LabelCache::new();
        labels.warm(gateway).await;

        let executor = ActionExecutor::new(gateway);
        let now = Utc::now();
        let mut total = 0;

        for rule in rules {
            info!(rule = %rule.description, "Evaluating rule");
            for record in &records {
                if !rule_matches(rule, record, now) {
                    continue;
                }
                info!(email = %record.id, subject = %record.subject, "Matched email");
                for action in &rule.actions {
                    total += executor.execute(&mut labels, record, action).await;
                }
            }
        }

        info!(total, "Completed rules run: actions executed/logged");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::gateway::fake::{FakeGateway, ModifyCall};
    use crate::models::EmailRecord;
    use crate::rules::parse_rules;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::Mutex;

    struct FakeStore {
        records: Vec<EmailRecord>,
        requested: Mutex<Vec<u32>>,
    }

    impl FakeStore {
        fn new(records: Vec<EmailRecord>) -> Arc<Self> {
            Arc::new(Self {
                records,
                requested: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl EmailStore for FakeStore {
        async fn get_last_n_records(&self, limit: u32) -> anyhow::Result<Vec<EmailRecord>> {
            self.requested.lock().unwrap().push(limit);
            Ok(self.records.iter().take(limit as usize).cloned().collect())
        }

        async fn insert_record(&self, _record: &EmailRecord) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn record(id: &str, subject: &str) -> EmailRecord {
        EmailRecord {
            id: id.to_string(),
            thread_id: format!("thread-{id}"),
            sender: "a@example.com".to_string(),
            subject: subject.to_string(),
            snippet: "test".to_string(),
            received_datetime: Utc::now().to_rfc3339(),
        }
    }

    fn rules_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    const INVOICE_RULE: &str = r#"[{"match": "all",
        "conditions": [{"field": "Subject", "predicate": "contains", "value": "invoice"}],
        "actions": [{"type": "mark_as_read"}]}]"#;

    fn move_rule(mailbox: &str) -> String {
        format!(
            r#"[{{"conditions": [], "actions": [{{"type": "move_message", "mailbox": "{mailbox}"}}]}}]"#
        )
    }

    fn call(id: &str, add: &[&str], remove: &[&str]) -> ModifyCall {
        ModifyCall {
            id: id.to_string(),
            add: add.iter().map(|s| s.to_string()).collect(),
            remove: remove.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_dry_run_match_counts() {
        let file = rules_file(INVOICE_RULE);
        let engine = RuleEngine::new(FakeStore::new(vec![record("m1", "Your Invoice #42")]), file.path());

        assert!(engine.is_dry_run());
        assert_eq!(engine.apply(10).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_no_match_counts_zero() {
        let file = rules_file(INVOICE_RULE);
        let engine = RuleEngine::new(FakeStore::new(vec![record("m1", "Meeting notes")]), file.path());

        assert_eq!(engine.apply(10).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_limit_is_passed_to_store() {
        let file = rules_file(INVOICE_RULE);
        let store = FakeStore::new(vec![
            record("m1", "invoice 1"),
            record("m2", "invoice 2"),
            record("m3", "invoice 3"),
        ]);
        let engine = RuleEngine::new(store.clone(), file.path());

        assert_eq!(engine.apply(2).await.unwrap(), 2);
        assert_eq!(*store.requested.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_move_creates_missing_label() {
        let file = rules_file(&move_rule("Work"));
        let gateway = Arc::new(FakeGateway::default());
        let engine = RuleEngine::new(FakeStore::new(vec![record("m1", "x")]), file.path())
            .with_gateway(gateway.clone());

        assert_eq!(engine.apply(10).await.unwrap(), 1);
        assert_eq!(gateway.created(), vec!["Work".to_string()]);
        assert_eq!(gateway.modified(), vec![call("m1", &["LBL_NEW"], &["INBOX"])]);
    }

    #[tokio::test]
    async fn test_move_to_inbox_only_adds_inbox() {
        let file = rules_file(&move_rule("Inbox"));
        let gateway = Arc::new(FakeGateway::with_labels(&[("INBOX", "INBOX")]));
        let engine = RuleEngine::new(FakeStore::new(vec![record("m1", "x")]), file.path())
            .with_gateway(gateway.clone());

        assert_eq!(engine.apply(10).await.unwrap(), 1);
        assert_eq!(gateway.modified(), vec![call("m1", &["INBOX"], &[])]);
    }

    #[tokio::test]
    async fn test_label_creation_failure_archives() {
        let file = rules_file(&move_rule("Ghost"));
        let gateway = Arc::new(FakeGateway {
            fail_create: true,
            ..FakeGateway::default()
        });
        let engine = RuleEngine::new(FakeStore::new(vec![record("m1", "x")]), file.path())
            .with_gateway(gateway.clone());

        assert_eq!(engine.apply(10).await.unwrap(), 1);
        assert_eq!(gateway.modified(), vec![call("m1", &[], &["INBOX"])]);
    }

    #[tokio::test]
    async fn test_rule_major_ordering_and_failure_isolation() {
        let rules = parse_rules(
            r#"[
                {"description": "first", "conditions": [],
                 "actions": [{"type": "mark_as_read"}, {"type": "teleport"}, {"type": "mark_as_unread"}]},
                {"description": "second", "match": "any",
                 "conditions": [{"field": "Subject", "predicate": "equals", "value": "b"}],
                 "actions": [{"type": "move_message", "mailbox": "Work"}]}
            ]"#,
        )
        .unwrap();
        let gateway = Arc::new(FakeGateway::with_labels(&[("Label_1", "Work")]));
        let engine = RuleEngine::new(
            FakeStore::new(vec![record("a", "a"), record("b", "b")]),
            "unused.json",
        )
        .with_gateway(gateway.clone());

        assert_eq!(engine.apply_rules(&rules, 10).await.unwrap(), 5);
        assert_eq!(
            gateway.modified(),
            vec![
                call("a", &[], &["UNREAD"]),
                call("a", &["UNREAD"], &[]),
                call("b", &[], &["UNREAD"]),
                call("b", &["UNREAD"], &[]),
                call("b", &["Label_1"], &["INBOX"]),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_actions_do_not_stop_the_run() {
        let file = rules_file(INVOICE_RULE);
        let gateway = Arc::new(FakeGateway {
            fail_modify: true,
            ..FakeGateway::default()
        });
        let engine = RuleEngine::new(
            FakeStore::new(vec![record("m1", "invoice"), record("m2", "invoice")]),
            file.path(),
        )
        .with_gateway(gateway.clone());

        assert_eq!(engine.apply(10).await.unwrap(), 0);
        assert_eq!(gateway.modified().len(), 2);
    }

    #[tokio::test]
    async fn test_each_run_warms_its_own_cache() {
        let file = rules_file(INVOICE_RULE);
        let gateway = Arc::new(FakeGateway::default());
        let engine = RuleEngine::new(FakeStore::new(vec![record("m1", "invoice")]), file.path())
            .with_gateway(gateway.clone());

        engine.apply(10).await.unwrap();
        engine.apply(10).await.unwrap();

        assert_eq!(gateway.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_rules_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::new(vec![record("m1", "invoice")]);
        let engine = RuleEngine::new(store.clone(), dir.path().join("rules.json"));

        let err = engine.apply(10).await.unwrap_err();
        assert!(matches!(err, EngineError::Config(ConfigError::Missing(_))));
        assert!(store.requested.lock().unwrap().is_empty());
    }
}
