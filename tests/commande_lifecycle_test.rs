mod common;

use common::*;
use natec::domain::{CommandeScope, CommandeStatus, DomainError, LineStatus, Role};
use natec::models::{command_item, commande, project_commande, stock_entry};
use natec::services::{command_item_service, stock_ledger};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use std::time::Duration;

const TX: Duration = Duration::from_secs(10);

async fn stock_count(f: &Fixture) -> u64 {
    stock_entry::Entity::find()
        .count(f.state.db())
        .await
        .unwrap()
}

/// Creates a commande and assigns the fixture supplier to it
async fn assigned_commande(f: &Fixture, lines: &[(i32, i32)]) -> i32 {
    let created = f
        .state
        .commandes
        .create(&f.chef, commande_input(f.project_id, lines))
        .await
        .unwrap();
    f.state
        .commandes
        .assign_supplier(&f.chef, created.commande.id, f.supplier.id)
        .await
        .unwrap();
    created.commande.id
}

#[tokio::test]
async fn test_happy_path_credits_one_entry_per_line() {
    let f = fixture().await;

    let created = f
        .state
        .commandes
        .create(&f.chef, commande_input(f.project_id, &[(f.ciment, 10), (f.sable, 5)]))
        .await
        .expect("create");
    assert_eq!(created.commande.statut_cmd, CommandeStatus::EnAttenteAssignation);
    assert_eq!(created.commande.fournisseur_id, None);
    assert_eq!(created.items.len(), 2);
    assert!(created
        .items
        .iter()
        .all(|i| i.statut_ligne == LineStatus::Soumis));

    let id = created.commande.id;
    let assigned = f
        .state
        .commandes
        .assign_supplier(&f.chef, id, f.supplier.id)
        .await
        .expect("assign");
    assert_eq!(
        assigned.statut_cmd,
        CommandeStatus::EnAttenteValidationFournisseur
    );
    assert_eq!(assigned.fournisseur_id, Some(f.supplier.id));

    let confirmed = f
        .state
        .commandes
        .confirm(&f.supplier, id)
        .await
        .expect("confirm");
    assert_eq!(confirmed.commande.statut_cmd, CommandeStatus::ValideeFournisseur);
    assert!(confirmed
        .items
        .iter()
        .all(|i| i.statut_ligne == LineStatus::ValideFournisseur));
    let names: Vec<&str> = confirmed
        .items
        .iter()
        .map(|i| i.product_type.as_ref().unwrap().name.as_str())
        .collect();
    assert_eq!(names, vec!["Ciment", "Sable"]);

    let entries = stock_ledger::list_entries(f.state.db(), CommandeScope::Project(f.project_id), None)
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    for item in &confirmed.items {
        let entry = entries
            .iter()
            .find(|e| e.command_item_id == item.id)
            .expect("entry for line");
        assert_eq!(entry.quantite_disponible, f64::from(item.quantite_commandee));
        assert_eq!(entry.product_type_id, item.product_type_id);
    }

    // The project's order list gained the commande
    let linked = project_commande::Entity::find()
        .filter(project_commande::Column::ProjectId.eq(f.project_id))
        .count(f.state.db())
        .await
        .unwrap();
    assert_eq!(linked, 1);
}

#[tokio::test]
async fn test_duplicate_product_is_rejected_before_any_write() {
    let f = fixture().await;

    let err = f
        .state
        .commandes
        .create(&f.chef, commande_input(f.project_id, &[(f.ciment, 1), (f.ciment, 2)]))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    assert_eq!(commande::Entity::find().count(f.state.db()).await.unwrap(), 0);
    assert_eq!(
        command_item::Entity::find().count(f.state.db()).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_create_with_unknown_product_type_rolls_back() {
    let f = fixture().await;

    let err = f
        .state
        .commandes
        .create(&f.chef, commande_input(f.project_id, &[(f.ciment, 1), (999, 2), (998, 1)]))
        .await
        .unwrap_err();
    match err {
        DomainError::NotFound(msg) => assert!(msg.contains("999")),
        other => panic!("expected not found, got {:?}", other),
    }
    assert_eq!(commande::Entity::find().count(f.state.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_create_requires_existing_project_and_chef_role() {
    let f = fixture().await;

    let err = f
        .state
        .commandes
        .create(&f.chef, commande_input(4242, &[(f.ciment, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));

    let err = f
        .state
        .commandes
        .create(&f.supplier, commande_input(f.project_id, &[(f.ciment, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
}

#[tokio::test]
async fn test_assign_on_confirmed_commande_conflicts() {
    let f = fixture().await;
    let id = assigned_commande(&f, &[(f.ciment, 3)]).await;
    f.state.commandes.confirm(&f.supplier, id).await.unwrap();

    let err = f
        .state
        .commandes
        .assign_supplier(&f.admin, id, f.supplier.id)
        .await
        .unwrap_err();
    match err {
        DomainError::Conflict(msg) => {
            assert!(msg.contains("ValideeFournisseur"));
            assert!(msg.contains("EnAttenteAssignation"));
        }
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn test_assign_checks_the_supplier() {
    let f = fixture().await;
    let created = f
        .state
        .commandes
        .create(&f.chef, commande_input(f.project_id, &[(f.ciment, 3)]))
        .await
        .unwrap();
    let id = created.commande.id;

    let err = f
        .state
        .commandes
        .assign_supplier(&f.chef, id, 9999)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));

    let err = f
        .state
        .commandes
        .assign_supplier(&f.chef, id, f.chef.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));

    let stored = commande::Entity::find_by_id(id)
        .one(f.state.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.statut_cmd, "EnAttenteAssignation");
    assert_eq!(stored.fournisseur_id, None);
}

#[tokio::test]
async fn test_assign_refuses_corrupt_header_without_backfilling() {
    let f = fixture().await;
    let created = f
        .state
        .commandes
        .create(&f.chef, commande_input(f.project_id, &[(f.ciment, 3)]))
        .await
        .unwrap();
    let id = created.commande.id;

    let mut corrupt: commande::ActiveModel = commande::Entity::find_by_id(id)
        .one(f.state.db())
        .await
        .unwrap()
        .unwrap()
        .into();
    corrupt.name = Set("  ".to_string());
    corrupt.update(f.state.db()).await.unwrap();

    let err = f
        .state
        .commandes
        .assign_supplier(&f.admin, id, f.supplier.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Integrity(_)));

    let stored = commande::Entity::find_by_id(id)
        .one(f.state.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "  ");
    assert_eq!(stored.statut_cmd, "EnAttenteAssignation");
}

#[tokio::test]
async fn test_per_line_cancel_creates_no_stock_and_is_terminal() {
    let f = fixture().await;
    let id = assigned_commande(&f, &[(f.ciment, 7)]).await;
    let items = f.state.commande_repo.list_items_for_order(id).await.unwrap();
    let line = items[0].id;

    let cancelled =
        command_item_service::update_status(f.state.db(), TX, &f.supplier, line, "Annulé")
            .await
            .expect("cancel");
    assert_eq!(cancelled.statut_ligne, LineStatus::Annule);
    assert_eq!(stock_count(&f).await, 0);

    let err = command_item_service::update_status(
        f.state.db(),
        TX,
        &f.supplier,
        line,
        "ValidéFournisseur",
    )
    .await
    .unwrap_err();
    match err {
        DomainError::Conflict(msg) => assert!(msg.contains("Annulé")),
        other => panic!("expected conflict, got {:?}", other),
    }
    assert_eq!(stock_count(&f).await, 0);
}

#[tokio::test]
async fn test_per_line_validation_credits_that_line_only() {
    let f = fixture().await;
    let id = assigned_commande(&f, &[(f.ciment, 4), (f.sable, 9)]).await;
    let items = f.state.commande_repo.list_items_for_order(id).await.unwrap();

    let validated = command_item_service::update_status(
        f.state.db(),
        TX,
        &f.admin,
        items[0].id,
        "ValidéFournisseur",
    )
    .await
    .unwrap();
    assert_eq!(validated.statut_ligne, LineStatus::ValideFournisseur);
    assert_eq!(stock_count(&f).await, 1);

    // Confirmation credits only the line still pending
    let confirmed = f.state.commandes.confirm(&f.supplier, id).await.unwrap();
    assert!(confirmed
        .items
        .iter()
        .all(|i| i.statut_ligne == LineStatus::ValideFournisseur));
    assert_eq!(stock_count(&f).await, 2);
}

#[tokio::test]
async fn test_per_line_status_input_and_authorization() {
    let f = fixture().await;
    let id = assigned_commande(&f, &[(f.ciment, 4)]).await;
    let line = f.state.commande_repo.list_items_for_order(id).await.unwrap()[0].id;

    let err = command_item_service::update_status(f.state.db(), TX, &f.supplier, line, "Soumis")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));

    let err = command_item_service::update_status(f.state.db(), TX, &f.supplier, 777, "Annulé")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));

    let other = create_user(f.state.db(), "autre", Role::Supplier).await;
    let err = command_item_service::update_status(f.state.db(), TX, &other, line, "Annulé")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let err = command_item_service::update_status(f.state.db(), TX, &f.chef, line, "Annulé")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
}

#[tokio::test]
async fn test_validation_skips_existing_stock_entry() {
    let f = fixture().await;
    let id = assigned_commande(&f, &[(f.ciment, 4)]).await;
    let line = command_item::Entity::find()
        .filter(command_item::Column::CommandeId.eq(id))
        .one(f.state.db())
        .await
        .unwrap()
        .unwrap();

    stock_ledger::credit_line(f.state.db(), &line, "2024-01-01T00:00:00+00:00")
        .await
        .unwrap();

    let validated = command_item_service::update_status(
        f.state.db(),
        TX,
        &f.supplier,
        line.id,
        "ValidéFournisseur",
    )
    .await
    .expect("validation with existing stock is a no-op credit");
    assert_eq!(validated.statut_ligne, LineStatus::ValideFournisseur);
    assert_eq!(stock_count(&f).await, 1);

    // A direct second credit hits the unique index
    let err = stock_ledger::credit_line(f.state.db(), &line, "2024-01-02T00:00:00+00:00")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn test_reconfirm_conflicts_without_duplicate_stock() {
    let f = fixture().await;
    let id = assigned_commande(&f, &[(f.ciment, 10), (f.sable, 5)]).await;

    f.state.commandes.confirm(&f.supplier, id).await.unwrap();
    assert_eq!(stock_count(&f).await, 2);

    let err = f
        .state
        .commandes
        .confirm(&f.supplier, id)
        .await
        .unwrap_err();
    match err {
        DomainError::Conflict(msg) => assert!(msg.contains("ValideeFournisseur")),
        other => panic!("expected conflict, got {:?}", other),
    }
    assert_eq!(stock_count(&f).await, 2);
}

#[tokio::test]
async fn test_confirm_is_atomic_when_stock_insert_fails() {
    let f = fixture().await;
    let id = assigned_commande(&f, &[(f.ciment, 10), (f.sable, 5)]).await;

    // Pre-insert a conflicting entry for the second line
    let second = command_item::Entity::find()
        .filter(command_item::Column::CommandeId.eq(id))
        .filter(command_item::Column::ProductTypeId.eq(f.sable))
        .one(f.state.db())
        .await
        .unwrap()
        .unwrap();
    stock_entry::ActiveModel {
        product_type_id: Set(second.product_type_id),
        command_item_id: Set(second.id),
        quantite_disponible: Set(1.0),
        date_entree_stock: Set("2024-01-01T00:00:00+00:00".to_string()),
        ..Default::default()
    }
    .insert(f.state.db())
    .await
    .unwrap();

    let err = f
        .state
        .commandes
        .confirm(&f.supplier, id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let header = commande::Entity::find_by_id(id)
        .one(f.state.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(header.statut_cmd, "EnAttenteValidationFournisseur");

    let lines = command_item::Entity::find()
        .filter(command_item::Column::CommandeId.eq(id))
        .all(f.state.db())
        .await
        .unwrap();
    assert!(lines.iter().all(|l| l.statut_ligne == "Soumis"));
    assert_eq!(stock_count(&f).await, 1);
}

#[tokio::test]
async fn test_unauthorized_callers_change_nothing() {
    let f = fixture().await;
    let created = f
        .state
        .commandes
        .create(&f.chef, commande_input(f.project_id, &[(f.ciment, 2)]))
        .await
        .unwrap();
    let id = created.commande.id;

    let other_chef = create_user(f.state.db(), "chef2", Role::ChefProjet).await;
    let other_supplier = create_user(f.state.db(), "fournisseur2", Role::Supplier).await;

    for actor in [&other_chef, &f.supplier] {
        let err = f
            .state
            .commandes
            .assign_supplier(actor, id, f.supplier.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    f.state
        .commandes
        .assign_supplier(&f.admin, id, f.supplier.id)
        .await
        .unwrap();

    for actor in [&other_supplier, &f.chef] {
        let err = f.state.commandes.confirm(actor, id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    let header = commande::Entity::find_by_id(id)
        .one(f.state.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(header.statut_cmd, "EnAttenteValidationFournisseur");
    assert_eq!(header.fournisseur_id, Some(f.supplier.id));
    assert_eq!(stock_count(&f).await, 0);
}

#[tokio::test]
async fn test_racing_assignments_have_one_winner() {
    let f = fixture().await;
    let created = f
        .state
        .commandes
        .create(&f.chef, commande_input(f.project_id, &[(f.ciment, 2)]))
        .await
        .unwrap();
    let id = created.commande.id;
    let rival = create_user(f.state.db(), "fournisseur2", Role::Supplier).await;

    let (a, b) = tokio::join!(
        f.state.commandes.assign_supplier(&f.chef, id, f.supplier.id),
        f.state.commandes.assign_supplier(&f.admin, id, rival.id),
    );

    let outcomes = [a, b];
    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(DomainError::Conflict(_)))));

    let header = commande::Entity::find_by_id(id)
        .one(f.state.db())
        .await
        .unwrap()
        .unwrap();
    let winner = outcomes
        .iter()
        .find_map(|r| r.as_ref().ok())
        .unwrap();
    assert_eq!(header.fournisseur_id, winner.fournisseur_id);
}

#[tokio::test]
async fn test_racing_confirmations_credit_once() {
    let f = fixture().await;
    let id = assigned_commande(&f, &[(f.ciment, 10), (f.sable, 5)]).await;

    let (a, b) = tokio::join!(
        f.state.commandes.confirm(&f.supplier, id),
        f.state.commandes.confirm(&f.admin, id),
    );
    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    assert_eq!(stock_count(&f).await, 2);
}

#[tokio::test]
async fn test_queries_are_role_scoped() {
    let f = fixture().await;
    let first = assigned_commande(&f, &[(f.ciment, 1)]).await;
    let second = f
        .state
        .commandes
        .create(&f.chef, commande_input(f.project_id, &[(f.sable, 1)]))
        .await
        .unwrap()
        .commande
        .id;

    let other_chef = create_user(f.state.db(), "chef2", Role::ChefProjet).await;
    let other_supplier = create_user(f.state.db(), "fournisseur2", Role::Supplier).await;

    let all = f.state.commandes.list_visible(&f.admin).await.unwrap();
    assert_eq!(all.len(), 2);
    // Newest first
    assert_eq!(all[0].id, second);

    let managed = f.state.commandes.list_visible(&f.chef).await.unwrap();
    assert_eq!(managed.len(), 2);
    assert!(f
        .state
        .commandes
        .list_visible(&other_chef)
        .await
        .unwrap()
        .is_empty());

    let mine = f.state.commandes.list_mine(&f.supplier).await.unwrap();
    assert_eq!(mine.iter().map(|c| c.id).collect::<Vec<_>>(), vec![first]);
    assert!(matches!(
        f.state.commandes.list_mine(&f.chef).await,
        Err(DomainError::Forbidden(_))
    ));

    let detail = f.state.commandes.get(&f.supplier, first).await.unwrap();
    assert_eq!(detail.items.len(), 1);
    assert!(matches!(
        f.state.commandes.get(&other_supplier, first).await,
        Err(DomainError::Forbidden(_))
    ));
    assert!(matches!(
        f.state.commandes.get(&f.supplier, second).await,
        Err(DomainError::Forbidden(_))
    ));
    assert!(matches!(
        f.state.commandes.get(&f.admin, 9999).await,
        Err(DomainError::NotFound(_))
    ));

    let by_project = f
        .state
        .commandes
        .list_by_project(&f.chef, f.project_id)
        .await
        .unwrap();
    assert_eq!(by_project.len(), 2);
    assert!(matches!(
        f.state.commandes.list_by_project(&other_chef, f.project_id).await,
        Err(DomainError::Forbidden(_))
    ));
    assert!(matches!(
        f.state.commandes.list_by_project(&f.admin, 555).await,
        Err(DomainError::NotFound(_))
    ));
}
