use super::*;
use crate::models::{Contato, Processo};
use historico::{InMemoryNotifier, NavigationOutcome, NoOpReason};
use std::sync::Mutex;
use tokio::sync::Notify;
use tokio_test::{assert_pending, assert_ready};

type Calls<T> = Arc<Mutex<Vec<T>>>;

fn calls<T>() -> Calls<T> {
    Arc::new(Mutex::new(Vec::new()))
}

fn recorded<T: Clone>(calls: &Calls<T>) -> Vec<T> {
    calls.lock().unwrap().clone()
}

fn store(capacity: usize) -> Arc<ActionHistoryStore> {
    Arc::new(ActionHistoryStore::new(
        Arc::new(InMemoryNotifier::default()),
        capacity,
    ))
}

fn contatos(seed: &[(&str, &str)]) -> Vec<Contato> {
    seed.iter()
        .map(|(id, status)| Contato::new(*id, format!("Lead {}", id), *status))
        .collect()
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn with_status_recorder(callbacks: BulkCallbacks, calls: Calls<MutationRequest>) -> BulkCallbacks {
    callbacks.with_status_update(move |request| {
        let calls = calls.clone();
        async move {
            calls.lock().unwrap().push(request);
            anyhow::Ok(())
        }
    })
}

fn full_callbacks(
    updates: Calls<MutationRequest>,
    records: Calls<(&'static str, RecordRequest)>,
) -> BulkCallbacks {
    let record = |label: &'static str, records: Calls<(&'static str, RecordRequest)>| {
        move |request: RecordRequest| {
            let records = records.clone();
            async move {
                records.lock().unwrap().push((label, request));
                anyhow::Ok(())
            }
        }
    };
    let update = |updates: Calls<MutationRequest>| {
        move |request: MutationRequest| {
            let updates = updates.clone();
            async move {
                updates.lock().unwrap().push(request);
                anyhow::Ok(())
            }
        }
    };

    BulkCallbacks::new()
        .with_status_update(update(updates.clone()))
        .with_tag_assignment(update(updates.clone()))
        .with_owner_assignment(update(updates.clone()))
        .with_deadline_update(update(updates))
        .with_delete(record("delete", records.clone()), record("restore", records.clone()))
        .with_archive(record("archive", records))
}

#[tokio::test]
async fn test_status_update_registers_undoable_entry() {
    let history = store(10);
    let updates = calls();
    let orchestrator: BulkOperationOrchestrator<Contato> = BulkOperationOrchestrator::new(
        history.clone(),
        with_status_recorder(BulkCallbacks::new(), updates.clone()),
    );
    let seed = contatos(&[("1", "novo"), ("2", "novo")]);

    orchestrator.bulk_status_update(&seed, "qualificado").await.unwrap();

    let made = recorded(&updates);
    assert_eq!(made.len(), 1);
    assert_eq!(made[0].ids, ids(&["1", "2"]));
    assert_eq!(made[0].updates, FieldValue::Status("qualificado".into()));
    assert!(history.can_undo().await);
    assert!(history.get_recent_actions(1).await[0]
        .description
        .contains("qualificado"));

    // desfazer: os dois tinham o mesmo status, então uma única chamada
    assert!(history.undo().await.is_applied());

    let made = recorded(&updates);
    assert_eq!(made.len(), 2);
    assert_eq!(made[1].ids, ids(&["1", "2"]));
    assert_eq!(made[1].updates, FieldValue::Status("novo".into()));
    assert!(!history.can_undo().await);
    assert!(history.can_redo().await);
    assert!(!orchestrator.is_loading().await);
}

#[tokio::test]
async fn test_undo_groups_heterogeneous_previous_values() {
    let history = store(10);
    let updates = calls();
    let orchestrator: BulkOperationOrchestrator<Contato> = BulkOperationOrchestrator::new(
        history.clone(),
        with_status_recorder(BulkCallbacks::new(), updates.clone()),
    );
    let seed = contatos(&[("1", "novo"), ("2", "perdido"), ("3", "novo")]);

    orchestrator.bulk_status_update(&seed, "convertido").await.unwrap();
    history.undo().await;

    let reverse_calls = &recorded(&updates)[1..];
    assert_eq!(reverse_calls.len(), 2);
    assert_eq!(reverse_calls[0].ids, ids(&["1", "3"]));
    assert_eq!(reverse_calls[0].updates, FieldValue::Status("novo".into()));
    assert_eq!(reverse_calls[1].ids, ids(&["2"]));
    assert_eq!(reverse_calls[1].updates, FieldValue::Status("perdido".into()));
}

#[tokio::test]
async fn test_delete_without_callbacks_is_configuration_error() {
    let history = store(10);
    let orchestrator: BulkOperationOrchestrator<Contato> =
        BulkOperationOrchestrator::new(history.clone(), BulkCallbacks::new());

    let err = orchestrator
        .bulk_delete(&contatos(&[("1", "novo")]))
        .await
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(matches!(
        err,
        BulkOperationError::Configuration(ConfigurationError::MissingCallback {
            group: EntityGroup::Contatos,
            operation: OperationKind::Delete,
        })
    ));
    assert!(!orchestrator.is_loading().await);
    assert!(history.is_empty().await);
}

#[tokio::test]
async fn test_mutation_failure_propagates_original_error() {
    let history = store(10);
    let gate = Arc::new(Notify::new());
    let callbacks = BulkCallbacks::new().with_status_update({
        let gate = gate.clone();
        move |_request| {
            let gate = gate.clone();
            async move {
                gate.notified().await;
                Err(anyhow::Error::new(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "network",
                )))
            }
        }
    });
    let orchestrator: BulkOperationOrchestrator<Contato> =
        BulkOperationOrchestrator::new(history.clone(), callbacks);
    let seed = contatos(&[("1", "novo")]);

    let mut operation = tokio_test::task::spawn(orchestrator.bulk_status_update(&seed, "qualificado"));
    assert_pending!(operation.poll());
    assert!(orchestrator.is_loading().await);

    gate.notify_one();
    let err = assert_ready!(operation.poll()).unwrap_err();
    drop(operation);

    assert_eq!(err.to_string(), "network");
    match &err {
        BulkOperationError::Mutation(inner) => {
            assert!(inner.downcast_ref::<std::io::Error>().is_some())
        }
        other => panic!("erro inesperado: {:?}", other),
    }
    assert!(!orchestrator.is_loading().await);
    assert_eq!(orchestrator.last_error().await.as_deref(), Some("network"));
    assert!(history.get_recent_actions(1).await.is_empty());
}

#[tokio::test]
async fn test_is_loading_tracks_overlapping_operations() {
    let history = store(10);
    let gate = Arc::new(Notify::new());
    let first_call = Arc::new(Mutex::new(true));
    let callbacks = BulkCallbacks::new().with_status_update({
        let gate = gate.clone();
        move |_request| {
            let gate = gate.clone();
            let slow = std::mem::replace(&mut *first_call.lock().unwrap(), false);
            async move {
                if slow {
                    gate.notified().await;
                }
                anyhow::Ok(())
            }
        }
    });
    let orchestrator: BulkOperationOrchestrator<Contato> =
        BulkOperationOrchestrator::new(history.clone(), callbacks);
    let lento = contatos(&[("1", "novo")]);
    let rapido = contatos(&[("2", "novo")]);

    let mut slow = tokio_test::task::spawn(orchestrator.bulk_status_update(&lento, "qualificado"));
    assert_pending!(slow.poll());

    orchestrator.bulk_status_update(&rapido, "perdido").await.unwrap();
    assert!(orchestrator.is_loading().await);

    // requisição abandonada no meio da mutação
    drop(slow);
    assert!(!orchestrator.is_loading().await);
    assert_eq!(history.len().await, 1);
}

#[tokio::test]
async fn test_success_clears_last_error() {
    let history = store(10);
    let fail_next = Arc::new(Mutex::new(true));
    let callbacks = BulkCallbacks::new().with_status_update({
        let fail_next = fail_next.clone();
        move |_request| {
            let fail = std::mem::replace(&mut *fail_next.lock().unwrap(), false);
            async move {
                if fail {
                    anyhow::bail!("timeout");
                }
                Ok(())
            }
        }
    });
    let orchestrator: BulkOperationOrchestrator<Contato> =
        BulkOperationOrchestrator::new(history, callbacks);
    let seed = contatos(&[("1", "novo")]);

    assert!(orchestrator.bulk_status_update(&seed, "qualificado").await.is_err());
    assert_eq!(orchestrator.last_error().await.as_deref(), Some("timeout"));

    orchestrator.bulk_status_update(&seed, "qualificado").await.unwrap();
    assert_eq!(orchestrator.run_state().await, RunState::default());
}

#[tokio::test]
async fn test_history_capacity_drops_oldest_operation() {
    let history = store(3);
    let orchestrator: BulkOperationOrchestrator<Contato> = BulkOperationOrchestrator::new(
        history.clone(),
        with_status_recorder(BulkCallbacks::new(), calls()),
    );

    let mut entries = Vec::new();
    for status in ["em_atendimento", "qualificado", "convertido", "perdido"] {
        let seed = contatos(&[("1", "novo")]);
        entries.push(orchestrator.bulk_status_update(&seed, status).await.unwrap());
    }

    let remaining: Vec<_> = history
        .get_recent_actions(10)
        .await
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(history.len().await, 3);
    assert!(!remaining.contains(&entries[0].id));
    assert_eq!(remaining[0], entries[3].id);
}

#[tokio::test]
async fn test_empty_selection_is_rejected_before_mutation() {
    let history = store(10);
    let updates = calls();
    let orchestrator: BulkOperationOrchestrator<Contato> = BulkOperationOrchestrator::new(
        history.clone(),
        with_status_recorder(BulkCallbacks::new(), updates.clone()),
    );

    let err = orchestrator.bulk_status_update(&[], "qualificado").await.unwrap_err();

    assert!(matches!(err, BulkOperationError::EmptySelection));
    assert!(recorded(&updates).is_empty());
    assert!(history.is_empty().await);
}

#[tokio::test]
async fn test_delete_undo_restores_full_records() {
    let history = store(10);
    let records = calls();
    let orchestrator: BulkOperationOrchestrator<Contato> =
        BulkOperationOrchestrator::new(history.clone(), full_callbacks(calls(), records.clone()));
    let seed = contatos(&[("1", "novo"), ("2", "qualificado")]);

    let entry = orchestrator.bulk_delete(&seed).await.unwrap();
    assert_eq!(entry.description, "2 contatos excluídos");
    assert!(entry.reversible);

    history.undo().await;

    let made = recorded(&records);
    assert_eq!(made.len(), 2);
    assert_eq!(made[0].0, "delete");
    let (label, restore) = &made[1];
    assert_eq!(*label, "restore");
    assert_eq!(restore.ids, ids(&["1", "2"]));
    let restored = restore.previous_states[1].record_value().unwrap();
    assert_eq!(restored["nome"], "Lead 2");
    assert_eq!(restored["status"], "qualificado");
}

#[tokio::test]
async fn test_archive_without_status_callback_is_not_reversible() {
    let history = store(10);
    let archived = calls();
    let callbacks = BulkCallbacks::new().with_archive({
        let archived = archived.clone();
        move |request: RecordRequest| {
            let archived = archived.clone();
            async move {
                archived.lock().unwrap().push(request);
                anyhow::Ok(())
            }
        }
    });
    let orchestrator: BulkOperationOrchestrator<Processo> =
        BulkOperationOrchestrator::new(history.clone(), callbacks);
    let seed = vec![Processo::new("p1", "0001234-56.2024.8.26.0100", "em_andamento")];

    let entry = orchestrator.bulk_archive(&seed).await.unwrap();

    assert!(!entry.reversible);
    assert_eq!(entry.description, "1 processo arquivado");
    assert_eq!(recorded(&archived).len(), 1);
    assert_eq!(
        history.undo().await,
        NavigationOutcome::NoOp {
            reason: NoOpReason::NotReversible
        }
    );
}

#[tokio::test]
async fn test_archive_undo_restores_previous_status() {
    let history = store(10);
    let updates = calls();
    let records = calls();
    let orchestrator: BulkOperationOrchestrator<Processo> =
        BulkOperationOrchestrator::new(history.clone(), full_callbacks(updates.clone(), records.clone()));
    let seed = vec![
        Processo::new("p1", "0001234-56.2024.8.26.0100", "em_andamento"),
        Processo::new("p2", "0009876-01.2023.5.02.0001", "suspenso"),
    ];

    let entry = orchestrator.bulk_archive(&seed).await.unwrap();
    assert!(entry.reversible);
    assert!(history.undo().await.is_applied());

    let made = recorded(&updates);
    assert_eq!(made.len(), 2);
    assert_eq!(made[0].ids, ids(&["p1"]));
    assert_eq!(made[0].updates, FieldValue::Status("em_andamento".into()));
    assert_eq!(made[1].ids, ids(&["p2"]));
    assert_eq!(made[1].updates, FieldValue::Status("suspenso".into()));
}

#[tokio::test]
async fn test_redo_replays_forward_mutation() {
    let history = store(10);
    let updates = calls();
    let orchestrator: BulkOperationOrchestrator<Contato> =
        BulkOperationOrchestrator::new(history.clone(), full_callbacks(updates.clone(), calls()));
    let mut seed = contatos(&[("1", "novo"), ("2", "novo")]);
    seed[0].tags = vec!["whatsapp".into()];

    orchestrator
        .bulk_tag_assignment(&seed, vec!["vip".into(), "trabalhista".into()])
        .await
        .unwrap();
    history.undo().await;
    assert!(history.redo().await.is_applied());

    let made = recorded(&updates);
    assert_eq!(made.len(), 4);
    assert_eq!(made[1].updates, FieldValue::Tags(vec!["whatsapp".into()]));
    assert_eq!(made[2].updates, FieldValue::Tags(vec![]));
    assert_eq!(made[3].ids, ids(&["1", "2"]));
    assert_eq!(
        made[3].updates,
        FieldValue::Tags(vec!["vip".into(), "trabalhista".into()])
    );
    assert!(history.can_undo().await);
    assert!(!history.can_redo().await);
}

#[tokio::test]
async fn test_redo_deletes_the_same_records_again() {
    let history = store(10);
    let records = calls();
    let orchestrator: BulkOperationOrchestrator<Contato> =
        BulkOperationOrchestrator::new(history.clone(), full_callbacks(calls(), records.clone()));
    let seed = contatos(&[("1", "novo"), ("2", "qualificado")]);

    orchestrator.bulk_delete(&seed).await.unwrap();
    assert!(history.undo().await.is_applied());
    assert!(history.redo().await.is_applied());

    let made = recorded(&records);
    let labels: Vec<&str> = made.iter().map(|(label, _)| *label).collect();
    assert_eq!(labels, vec!["delete", "restore", "delete"]);
    assert_eq!(made[2].1.ids, ids(&["1", "2"]));
    assert_eq!(made[2].1.ids, made[0].1.ids);
    assert_eq!(history.cursor().await, Some(0));
}

#[tokio::test]
async fn test_redo_archives_the_same_records_again() {
    let history = store(10);
    let updates = calls();
    let records = calls();
    let orchestrator: BulkOperationOrchestrator<Processo> =
        BulkOperationOrchestrator::new(history.clone(), full_callbacks(updates.clone(), records.clone()));
    let seed = vec![
        Processo::new("p1", "0001234-56.2024.8.26.0100", "em_andamento"),
        Processo::new("p2", "0009876-01.2023.5.02.0001", "suspenso"),
    ];

    orchestrator.bulk_archive(&seed).await.unwrap();
    assert!(history.undo().await.is_applied());
    assert!(history.redo().await.is_applied());

    let made = recorded(&records);
    let labels: Vec<&str> = made.iter().map(|(label, _)| *label).collect();
    assert_eq!(labels, vec!["archive", "archive"]);
    assert_eq!(made[1].1.ids, ids(&["p1", "p2"]));
    assert_eq!(recorded(&updates).len(), 2);
    assert!(history.can_undo().await);
}

#[tokio::test]
async fn test_owner_and_deadline_entries_keep_parallel_arrays() {
    let history = store(10);
    let orchestrator: BulkOperationOrchestrator<Processo> =
        BulkOperationOrchestrator::new(history.clone(), full_callbacks(calls(), calls()));
    let mut seed = vec![
        Processo::new("p1", "0001234-56.2024.8.26.0100", "em_andamento"),
        Processo::new("p2", "0009876-01.2023.5.02.0001", "em_andamento"),
        Processo::new("p3", "0005555-11.2022.4.03.6100", "em_andamento"),
    ];
    seed[1].responsavel = Some("Dra. Helena".into());
    let prazo = NaiveDate::from_ymd_opt(2026, 11, 20).unwrap();

    let entries = vec![
        orchestrator
            .bulk_owner_assignment(&seed, Some("Dr. Paulo".into()))
            .await
            .unwrap(),
        orchestrator.bulk_deadline_update(&seed, Some(prazo)).await.unwrap(),
        orchestrator.bulk_owner_assignment(&seed, None).await.unwrap(),
        orchestrator.bulk_delete(&seed).await.unwrap(),
        orchestrator.bulk_archive(&seed[..1]).await.unwrap(),
    ];

    for entry in &entries {
        assert_eq!(entry.payload.entity_ids().len(), entry.payload.previous_states().len());
        assert_eq!(entry.payload.entity_group, EntityGroup::Processos);
    }
    assert_eq!(entries[0].description, "Responsável \"Dr. Paulo\" atribuído a 3 processos");
    assert_eq!(entries[1].description, "Prazo de 3 processos alterado para 20/11/2026");
    assert_eq!(entries[2].description, "Responsável removido de 3 processos");
    assert_eq!(
        entries[0].payload.previous_value_groups(),
        vec![
            (FieldValue::Owner(None), ids(&["p1", "p3"])),
            (FieldValue::Owner(Some("Dra. Helena".into())), ids(&["p2"])),
        ]
    );
}

#[tokio::test]
async fn test_orchestrators_share_one_history() {
    let history = store(10);
    let updates = calls();
    let contatos_orch: BulkOperationOrchestrator<Contato> = BulkOperationOrchestrator::new(
        history.clone(),
        with_status_recorder(BulkCallbacks::new(), updates.clone()),
    );
    let processos_orch: BulkOperationOrchestrator<Processo> =
        BulkOperationOrchestrator::new(history.clone(), full_callbacks(updates.clone(), calls()));

    contatos_orch
        .bulk_status_update(&contatos(&[("1", "novo")]), "qualificado")
        .await
        .unwrap();
    processos_orch
        .bulk_status_update(
            &[Processo::new("p1", "0001234-56.2024.8.26.0100", "em_andamento")],
            "concluido",
        )
        .await
        .unwrap();

    history.undo().await;

    let made = recorded(&updates);
    assert_eq!(made.len(), 3);
    assert_eq!(made[2].ids, ids(&["p1"]));
    assert_eq!(made[2].updates, FieldValue::Status("em_andamento".into()));
    assert_eq!(history.cursor().await, Some(0));
}

#[test]
fn test_describe_messages() {
    assert_eq!(
        describe(
            OperationKind::StatusUpdate,
            EntityGroup::Contatos,
            1,
            Some(&FieldValue::Status("qualificado".into()))
        ),
        "Status de 1 contato alterado para \"qualificado\""
    );
    assert_eq!(
        describe(
            OperationKind::TagAssignment,
            EntityGroup::Contatos,
            2,
            Some(&FieldValue::Tags(vec![]))
        ),
        "Tags removidas de 2 contatos"
    );
    assert_eq!(
        describe(OperationKind::Delete, EntityGroup::Processos, 1, None),
        "1 processo excluído"
    );
    assert_eq!(
        describe(
            OperationKind::DeadlineUpdate,
            EntityGroup::Contatos,
            3,
            Some(&FieldValue::Deadline(None))
        ),
        "Prazo removido de 3 contatos"
    );
}
