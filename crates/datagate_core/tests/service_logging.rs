mod common;

use common::{all_backends, install_log_capture, service_errors, FailingRepository, Widget};
use datagate_core::{
    ConstructionError, EntityService, GenericService, Predicate, RepoError, Repository,
    StoreBackend,
};
use std::sync::Arc;

fn big_values() -> Predicate<Widget> {
    Predicate::new("value > 5", |widget: &Widget| widget.value > 5)
}

#[tokio::test]
async fn service_scenario_runs_identically_on_every_backend() {
    install_log_capture();

    for (backend, repo) in all_backends() {
        let service = GenericService::new(repo);
        let id = "a".to_string();

        service.create(&Widget::new("a", 1)).await.unwrap();
        assert_eq!(service.get_by_id(&id).await.unwrap(), Some(Widget::new("a", 1)));

        service.update(&Widget::new("a", 2)).await.unwrap();
        assert_eq!(service.get_by_id(&id).await.unwrap(), Some(Widget::new("a", 2)));

        service.create(&Widget::new("b", 9)).await.unwrap();
        assert_eq!(
            service.find(&big_values()).await.unwrap(),
            vec![Widget::new("b", 9)],
            "backend={backend}"
        );
        assert_eq!(
            service.query_single(&big_values()).await.unwrap(),
            Some(Widget::new("b", 9))
        );

        service.delete(&id).await.unwrap();
        service.delete(&id).await.unwrap();
        assert_eq!(service.get_by_id(&id).await.unwrap(), None);
        assert_eq!(service.get_all().await.unwrap(), vec![Widget::new("b", 9)]);
    }

    assert!(service_errors().is_empty(), "successful calls must not log");
}

#[tokio::test]
async fn every_failed_operation_logs_exactly_once_with_its_name() {
    install_log_capture();
    let service = GenericService::new(FailingRepository);
    let id = "w1".to_string();
    let widget = Widget::new("w1", 42);

    assert!(matches!(service.get_all().await, Err(RepoError::Poisoned)));
    assert!(matches!(service.find(&big_values()).await, Err(RepoError::Poisoned)));
    assert!(matches!(service.get_by_id(&id).await, Err(RepoError::Poisoned)));
    assert!(matches!(service.create(&widget).await, Err(RepoError::Poisoned)));
    assert!(matches!(service.update(&widget).await, Err(RepoError::Poisoned)));
    assert!(matches!(service.delete(&id).await, Err(RepoError::Poisoned)));
    assert!(matches!(
        service.query_single(&big_values()).await,
        Err(RepoError::Poisoned)
    ));

    let records = service_errors();
    let expected = [
        ("get_all", "args=none"),
        ("find", "args=predicate=value > 5"),
        ("get_by_id", "args=id=w1"),
        ("create", r#"args=entity={"id":"w1","value":42,"label":null}"#),
        ("update", r#"args=entity={"id":"w1","value":42,"label":null}"#),
        ("delete", "args=id=w1"),
        ("query_single", "args=predicate=value > 5"),
    ];
    assert_eq!(records.len(), expected.len(), "records: {records:?}");

    for (record, (op, args)) in records.iter().zip(expected) {
        assert!(
            record.message.contains(&format!(" op={op} ")),
            "missing op {op}: {}",
            record.message
        );
        assert!(record.message.contains("status=error"));
        assert!(record.message.contains(args), "missing {args}: {}", record.message);
        assert!(
            record.message.contains("error=backend connection lock poisoned"),
            "{}",
            record.message
        );
    }
}

#[tokio::test]
async fn real_backend_failure_reaches_caller_unchanged_after_one_record() {
    install_log_capture();

    for (backend, repo) in all_backends() {
        let service = GenericService::new(repo);
        service.create(&Widget::new("a", 1)).await.unwrap();
        let before = service_errors().len();

        let err = service.update(&Widget::new("missing", 3)).await.unwrap_err();
        assert!(
            matches!(err, RepoError::Stale { ref id, .. } if id == "missing"),
            "backend={backend} err={err}"
        );

        let records = service_errors();
        assert_eq!(records.len(), before + 1, "backend={backend}");
        let record = records.last().unwrap();
        assert!(record.message.contains(" op=update "));
        assert!(record.message.contains(r#""id":"missing""#));
        assert!(record.message.contains(&err.to_string()));
    }
}

#[tokio::test]
async fn services_can_share_one_repository() {
    install_log_capture();
    let repo: Arc<dyn Repository<Widget>> = Arc::new(common::document_repo());
    let writer = GenericService::new(Arc::clone(&repo));
    let reader = GenericService::new(repo);

    writer.create(&Widget::new("x", 1)).await.unwrap();
    assert_eq!(
        reader.get_by_id(&"x".to_string()).await.unwrap(),
        Some(Widget::new("x", 1))
    );
}

#[test]
fn builder_without_repository_fails_fast() {
    let result = GenericService::<Widget, FailingRepository>::builder().build();
    assert!(matches!(result, Err(ConstructionError::MissingRepository)));
}

#[test]
fn builder_with_repository_builds() {
    let service = GenericService::<Widget, _>::builder()
        .repository(common::document_repo())
        .build()
        .unwrap();
    assert_eq!(service.repository().backend().name(), "document");
}
