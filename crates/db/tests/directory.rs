//! Integration tests for the directory repositories.
//!
//! Needs `DATABASE_URL`; run with `cargo test -p kontrol-db -- --ignored`.

use kontrol_db::models::client::CreateClient;
use kontrol_db::models::organization::CreateOrganization;
use kontrol_db::models::user::{InviteUser, UpdateUser};
use kontrol_db::repositories::{AreaRepo, ClientRepo, DepartmentRepo, OrganizationRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_org(name: &str, admin_email: &str) -> CreateOrganization {
    CreateOrganization {
        name: name.to_string(),
        admin_first_name: "Ada".to_string(),
        admin_last_name: "Admin".to_string(),
        admin_email: admin_email.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_organization_created_with_pending_admin(pool: PgPool) {
    let (org, admin) = OrganizationRepo::create_with_admin(&pool, &new_org("Acme", "Ada@Acme.io"))
        .await
        .unwrap();
    assert!(org.is_active);
    assert_eq!(admin.organization_id, Some(org.id));
    assert_eq!(admin.role, "admin");
    assert_eq!(admin.status, "pending");
    assert_eq!(admin.email, "ada@acme.io");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_organization_name_rejected(pool: PgPool) {
    OrganizationRepo::create_with_admin(&pool, &new_org("Acme", "a@acme.io"))
        .await
        .unwrap();
    let err = OrganizationRepo::create_with_admin(&pool, &new_org("Acme", "b@acme.io"))
        .await
        .unwrap_err();
    let constraint = err
        .as_database_error()
        .and_then(|e| e.constraint())
        .map(str::to_string);
    assert_eq!(constraint.as_deref(), Some("uq_organizations_name"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_area_soft_delete_and_department_scoping(pool: PgPool) {
    let (org, _) = OrganizationRepo::create_with_admin(&pool, &new_org("Acme", "a@acme.io"))
        .await
        .unwrap();
    let area = AreaRepo::create(&pool, org.id, "Plant 1").await.unwrap();
    let dept = DepartmentRepo::create(&pool, area.id, "Maintenance").await.unwrap();

    assert!(AreaRepo::deactivate(&pool, org.id, area.id).await.unwrap());
    let area = AreaRepo::find_by_id(&pool, org.id, area.id).await.unwrap().unwrap();
    assert!(!area.is_active);

    // Another organization cannot see the area.
    assert!(AreaRepo::find_by_id(&pool, org.id + 1, area.id)
        .await
        .unwrap()
        .is_none());

    let depts = DepartmentRepo::list_by_area(&pool, area.id).await.unwrap();
    assert_eq!(depts.len(), 1);
    assert_eq!(depts[0].id, dept.id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_invite_and_client_crud(pool: PgPool) {
    let (org, _) = OrganizationRepo::create_with_admin(&pool, &new_org("Acme", "a@acme.io"))
        .await
        .unwrap();

    let user = UserRepo::invite(
        &pool,
        org.id,
        &InviteUser {
            email: "ins@acme.io".to_string(),
            first_name: "Ivy".to_string(),
            last_name: "Inspector".to_string(),
            role: "inspector".to_string(),
            department_id: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(user.status, "pending");
    assert_eq!(UserRepo::list_by_organization(&pool, org.id).await.unwrap().len(), 2);

    let client = ClientRepo::create(
        &pool,
        org.id,
        &CreateClient {
            client_name: "Carl".to_string(),
            email: "carl@client.io".to_string(),
            company_name: "Client Co".to_string(),
            phone: None,
        },
    )
    .await
    .unwrap();
    assert!(ClientRepo::deactivate(&pool, org.id, client.id).await.unwrap());
    assert!(ClientRepo::list_by_organization(&pool, org.id)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_active_admins_receive_report_notifications(pool: PgPool) {
    let (org, admin) = OrganizationRepo::create_with_admin(&pool, &new_org("Acme", "a@acme.io"))
        .await
        .unwrap();
    OrganizationRepo::create_with_admin(&pool, &new_org("Globex", "g@globex.io"))
        .await
        .unwrap();

    let invite = |email: &str, role: &str| InviteUser {
        email: email.to_string(),
        first_name: "Sam".to_string(),
        last_name: "Staff".to_string(),
        role: role.to_string(),
        department_id: None,
    };
    UserRepo::invite(&pool, org.id, &invite("ins@acme.io", "inspector"))
        .await
        .unwrap();
    let former = UserRepo::invite(&pool, org.id, &invite("old@acme.io", "admin"))
        .await
        .unwrap();
    UserRepo::update(
        &pool,
        org.id,
        former.id,
        &UpdateUser {
            first_name: None,
            last_name: None,
            phone: None,
            role: None,
            department_id: None,
            is_active: Some(false),
        },
    )
    .await
    .unwrap()
    .unwrap();

    let admins = UserRepo::list_active_admins(&pool, org.id).await.unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].id, admin.id);
    assert_eq!(admins[0].email, "a@acme.io");
}
