//! Integration tests for persisted status transitions.

#![allow(clippy::uninlined_format_args)]

mod common;

use std::sync::Arc;

use chrono::{Days, Utc};
use eximflow_core::{DocumentType, WorkflowError};
use eximflow_core::notify::{RecordingNotifier, WorkflowEvent};
use eximflow_core::pricing::LineItem;
use eximflow_db::repositories::{CreateProformaInput, CreateQuoteInput, DocumentFilter};
use eximflow_db::{ProformaRepository, QuoteRepository, StatsRepository};
use eximflow_shared::types::{CompanyId, Currency, PageRequest, UserId};
use rust_decimal_macros::dec;
use sea_orm::{ConnectionTrait, DbBackend, Statement};

use common::{cleanup_company, connect, setup_company};

fn line() -> LineItem {
    LineItem {
        sku_id: None,
        description: "Cotton yarn".to_string(),
        hsn_code: Some("5205".to_string()),
        quantity: dec!(100),
        unit: "kg".to_string(),
        unit_price: dec!(3.20),
        discount_percent: dec!(0),
        tax_percent: dec!(0),
        net_weight: Some(dec!(100)),
        gross_weight: Some(dec!(104)),
    }
}

fn proforma_input() -> CreateProformaInput {
    CreateProformaInput {
        buyer_name: "Nordic Imports AB".to_string(),
        buyer_address: Some("Stockholm".to_string()),
        currency: Currency::Eur,
        issue_date: None,
        notes: None,
        items: vec![line()],
    }
}

#[tokio::test]
async fn test_proforma_approval_path() {
    let Some(db) = connect().await else { return };
    let company = setup_company(&db, "Workflow Path").await;
    let notifier = Arc::new(RecordingNotifier::new());
    let repo = ProformaRepository::new(db.clone()).with_notifier(notifier.clone());
    let approver = UserId::new();

    let created = repo
        .create(company.company_id, company.owner, proforma_input())
        .await
        .unwrap();
    let id = created.invoice.id;
    assert_eq!(created.invoice.status, "draft");
    assert_eq!(created.invoice.total_amount, dec!(320.00));

    let submitted = repo.submit(company.company_id, id, company.owner).await.unwrap();
    assert_eq!(submitted.status, "pending");

    let approved = repo.approve(company.company_id, id, approver).await.unwrap();
    assert_eq!(approved.status, "approved");
    assert_eq!(approved.approved_by, Some(approver.into_inner()));
    assert!(approved.approved_at.is_some());

    let events = notifier.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[1],
        WorkflowEvent::StatusChanged { from, to, .. } if from == "pending" && to == "approved"
    ));

    cleanup_company(&db, &company).await;
}

#[tokio::test]
async fn test_stats_group_documents_by_status() {
    let Some(db) = connect().await else { return };
    let company = setup_company(&db, "Workflow Stats").await;
    let repo = ProformaRepository::new(db.clone());
    let (cid, owner) = (company.company_id, company.owner);

    for _ in 0..3 {
        repo.create(cid, owner, proforma_input()).await.unwrap();
    }
    let submitted = repo.create(cid, owner, proforma_input()).await.unwrap();
    repo.submit(cid, submitted.invoice.id, owner).await.unwrap();

    let stats = StatsRepository::new(db.clone())
        .stats(cid, DocumentType::ProformaInvoice)
        .await
        .unwrap();
    assert_eq!(stats.total_count, 4);
    assert_eq!(stats.total_value, dec!(1280.00));
    assert_eq!(stats.average_value, dec!(320.00));
    assert_eq!(stats.conversion_rate, dec!(0));

    let count = |status: &str| {
        stats
            .by_status
            .iter()
            .find(|b| b.status == status)
            .map(|b| b.count)
    };
    assert_eq!(count("draft"), Some(3));
    assert_eq!(count("pending"), Some(1));
    assert_eq!(count("approved"), Some(0));
    assert_eq!(stats.trend.iter().map(|p| p.count).sum::<u64>(), 4);

    cleanup_company(&db, &company).await;
}

#[tokio::test]
async fn test_approve_from_wrong_status_changes_nothing() {
    let Some(db) = connect().await else { return };
    let company = setup_company(&db, "Workflow Guard").await;
    let repo = ProformaRepository::new(db.clone());

    let created = repo
        .create(company.company_id, company.owner, proforma_input())
        .await
        .unwrap();
    let id = created.invoice.id;

    let err = repo
        .approve(company.company_id, id, company.owner)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidState { .. }));
    assert!(err.to_string().contains("draft"), "{}", err);

    let reloaded = repo.get(company.company_id, id).await.unwrap();
    assert_eq!(reloaded.invoice.status, "draft");
    assert!(reloaded.invoice.approved_by.is_none());
    assert_eq!(reloaded.invoice.updated_at, created.invoice.updated_at);

    cleanup_company(&db, &company).await;
}

#[tokio::test]
async fn test_reject_requires_reason_and_revise_bumps_version() {
    let Some(db) = connect().await else { return };
    let company = setup_company(&db, "Workflow Reject").await;
    let repo = ProformaRepository::new(db.clone());

    let id = repo
        .create(company.company_id, company.owner, proforma_input())
        .await
        .unwrap()
        .invoice
        .id;
    repo.submit(company.company_id, id, company.owner).await.unwrap();

    let err = repo
        .reject(company.company_id, id, company.owner, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));

    let rejected = repo
        .reject(company.company_id, id, company.owner, "Wrong incoterm")
        .await
        .unwrap();
    assert_eq!(rejected.status, "rejected");
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Wrong incoterm"));

    let revised = repo.revise(company.company_id, id, company.owner).await.unwrap();
    assert_eq!(revised.status, "revised");
    assert_eq!(revised.version, 2);
    assert!(revised.rejection_reason.is_none());

    cleanup_company(&db, &company).await;
}

#[tokio::test]
async fn test_other_company_sees_not_found() {
    let Some(db) = connect().await else { return };
    let owner = setup_company(&db, "Workflow Owner").await;
    let other = setup_company(&db, "Workflow Other").await;
    let repo = ProformaRepository::new(db.clone());

    let id = repo
        .create(owner.company_id, owner.owner, proforma_input())
        .await
        .unwrap()
        .invoice
        .id;

    let err = repo.get(other.company_id, id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::NotFound { .. }));
    let err = repo.submit(other.company_id, id, other.owner).await.unwrap_err();
    assert!(matches!(err, WorkflowError::NotFound { .. }));

    let unknown = CompanyId::new();
    assert!(repo.get(unknown, id).await.is_err());

    cleanup_company(&db, &owner).await;
    cleanup_company(&db, &other).await;
}

#[tokio::test]
async fn test_expire_sweep_is_idempotent() {
    let Some(db) = connect().await else { return };
    let company = setup_company(&db, "Workflow Expiry").await;
    let repo = QuoteRepository::new(db.clone());
    let today = Utc::now().date_naive();

    let stale = repo
        .create(
            company.company_id,
            company.owner,
            CreateQuoteInput {
                buyer_name: "Acme GmbH".to_string(),
                buyer_email: None,
                currency: Currency::Usd,
                valid_until: Some(today),
                notes: None,
                items: vec![line()],
            },
        )
        .await
        .unwrap();
    let fresh = repo
        .create(
            company.company_id,
            company.owner,
            CreateQuoteInput {
                buyer_name: "Acme GmbH".to_string(),
                buyer_email: None,
                currency: Currency::Usd,
                valid_until: None,
                notes: None,
                items: vec![line()],
            },
        )
        .await
        .unwrap();

    // Validity can only be in the past for quotes created earlier.
    db.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "UPDATE quotes SET valid_until = $1 WHERE id = $2",
        [
            (today - Days::new(3)).into(),
            stale.quote.id.into(),
        ],
    ))
    .await
    .unwrap();

    let expired = repo
        .expire_stale(Some(company.company_id), today)
        .await
        .unwrap();
    assert_eq!(expired, 1);
    assert_eq!(
        repo.expire_stale(Some(company.company_id), today).await.unwrap(),
        0
    );

    let page = repo
        .list(
            company.company_id,
            &DocumentFilter {
                status: Some("expired".to_string()),
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, stale.quote.id);
    assert_eq!(
        repo.get(company.company_id, fresh.quote.id).await.unwrap().quote.status,
        "draft"
    );

    cleanup_company(&db, &company).await;
}
