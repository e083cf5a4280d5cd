//! Store and service level tests for account identity semantics.

use konto::config::Config;
use konto::db::Store;
use konto::services::{
    AccountError, AccountService, RegisterRequest, SeaOrmAccountService,
};

async fn spawn_store() -> (Store, SeaOrmAccountService, Config) {
    let db_path = std::env::temp_dir().join(format!("konto-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());

    let store = Store::new(&config.general.database_path)
        .await
        .expect("failed to open store");
    let accounts = SeaOrmAccountService::new(store.clone(), config.security.clone());

    (store, accounts, config)
}

fn register_request(username: &str, email: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: "correct horse battery".to_string(),
        role_id: None,
        user_type_id: None,
    }
}

#[tokio::test]
async fn register_assigns_active_status_and_defaults() {
    let (_, accounts, _) = spawn_store().await;

    let user = accounts
        .register(register_request("alice", "alice@example.com"))
        .await
        .expect("registration should succeed");

    assert_eq!(user.status_id, 10);
    assert_eq!(user.role_id, 10);
    assert_eq!(user.user_type_id, 10);
    assert_eq!(user.auth_key.len(), 64);
    assert!(user.password_reset_token.is_none());
}

#[tokio::test]
async fn register_trims_username_and_email() {
    let (_, accounts, _) = spawn_store().await;

    let user = accounts
        .register(register_request("  bob  ", "  bob@example.com  "))
        .await
        .expect("registration should succeed");

    assert_eq!(user.username, "bob");
    assert_eq!(user.email, "bob@example.com");
}

#[tokio::test]
async fn duplicate_username_and_email_fail_validation() {
    let (_, accounts, _) = spawn_store().await;

    accounts
        .register(register_request("carol", "carol@example.com"))
        .await
        .expect("first registration should succeed");

    let err = accounts
        .register(register_request("carol", "other@example.com"))
        .await
        .expect_err("duplicate username must be rejected");
    match err {
        AccountError::Validation(errors) => {
            assert!(errors.iter().any(|e| e.field == "username"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let err = accounts
        .register(register_request("carol2", "carol@example.com"))
        .await
        .expect_err("duplicate email must be rejected");
    match err {
        AccountError::Validation(errors) => {
            assert!(errors.iter().any(|e| e.field == "email"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_fields_are_reported_per_field() {
    let (_, accounts, _) = spawn_store().await;

    let err = accounts
        .register(RegisterRequest {
            username: "x".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            role_id: None,
            user_type_id: None,
        })
        .await
        .expect_err("invalid input must be rejected");

    let AccountError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
}

#[tokio::test]
async fn password_round_trip() {
    let (store, accounts, _) = spawn_store().await;

    accounts
        .register(register_request("dave", "dave@example.com"))
        .await
        .expect("registration should succeed");

    assert!(store
        .verify_user_password("dave", "correct horse battery")
        .await
        .unwrap());
    assert!(!store.verify_user_password("dave", "wrong").await.unwrap());
    assert!(!store
        .verify_user_password("nobody", "correct horse battery")
        .await
        .unwrap());
}

#[tokio::test]
async fn soft_deleted_accounts_are_invisible_to_identity_lookups() {
    let (store, accounts, _) = spawn_store().await;

    let user = accounts
        .register(register_request("erin", "erin@example.com"))
        .await
        .expect("registration should succeed");

    assert!(store.get_user_by_username("erin").await.unwrap().is_some());

    assert!(store.soft_delete_user(user.id).await.unwrap());

    // Exact username match, but the account is deleted: absent, not error.
    assert!(store.get_user_by_username("erin").await.unwrap().is_none());
    assert!(store.get_user_by_id(user.id).await.unwrap().is_none());

    // Login also refuses deleted accounts.
    let err = accounts
        .login("erin", "correct horse battery")
        .await
        .expect_err("deleted account must not log in");
    assert!(matches!(err, AccountError::InvalidCredentials));

    // The row itself still exists and the username stays reserved.
    assert!(store.username_exists("erin").await.unwrap());
    let err = accounts
        .register(register_request("erin", "erin2@example.com"))
        .await
        .expect_err("username of a deleted account stays taken");
    assert!(matches!(err, AccountError::Validation(_)));
}

#[tokio::test]
async fn auth_key_regeneration_rotates_the_key() {
    let (store, accounts, _) = spawn_store().await;

    let user = accounts
        .register(register_request("frank", "frank@example.com"))
        .await
        .expect("registration should succeed");

    let first = user.auth_key.clone();
    let second = store.regenerate_user_auth_key(user.id).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(second.len(), 64);

    let reloaded = store.get_user_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(reloaded.auth_key, second);
}

#[tokio::test]
async fn reset_token_flow_issues_finds_and_clears() {
    let (store, accounts, _) = spawn_store().await;

    let user = accounts
        .register(register_request("grace", "grace@example.com"))
        .await
        .expect("registration should succeed");

    let token = accounts
        .request_password_reset("grace@example.com")
        .await
        .expect("reset request should succeed");

    let found = accounts
        .find_identity_by_reset_token(&token)
        .await
        .unwrap()
        .expect("fresh token should resolve");
    assert_eq!(found.id, user.id);

    accounts
        .reset_password(&token, "a brand new password")
        .await
        .expect("reset should succeed");

    assert!(store
        .verify_user_password("grace", "a brand new password")
        .await
        .unwrap());

    // Token is single-use.
    assert!(accounts
        .find_identity_by_reset_token(&token)
        .await
        .unwrap()
        .is_none());
    let err = accounts
        .reset_password(&token, "yet another password")
        .await
        .expect_err("consumed token must be rejected");
    assert!(matches!(err, AccountError::NotFound));
}

#[tokio::test]
async fn expired_and_malformed_reset_tokens_resolve_to_none() {
    let (_, accounts, config) = spawn_store().await;

    accounts
        .register(register_request("heidi", "heidi@example.com"))
        .await
        .expect("registration should succeed");

    // A token stamped before the expiry window opened.
    let stale = chrono::Utc::now().timestamp()
        - config.security.password_reset_token_expire_secs
        - 1;
    let expired = format!("abc_{stale}");
    assert!(accounts
        .find_identity_by_reset_token(&expired)
        .await
        .unwrap()
        .is_none());

    assert!(accounts
        .find_identity_by_reset_token("")
        .await
        .unwrap()
        .is_none());
    assert!(accounts
        .find_identity_by_reset_token("garbage-without-timestamp")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn access_token_lookup_is_unsupported() {
    let (_, accounts, _) = spawn_store().await;

    let err = accounts
        .find_identity_by_access_token("whatever")
        .await
        .expect_err("access token lookup must fail loudly");
    assert!(matches!(err, AccountError::Unsupported(_)));
}

#[tokio::test]
async fn lookup_names_and_placeholders() {
    let (store, accounts, _) = spawn_store().await;

    let user = accounts
        .register(register_request("ivan", "ivan@example.com"))
        .await
        .expect("registration should succeed");

    assert_eq!(store.role_name(user.role_id).await.unwrap(), "User");
    assert_eq!(store.status_name(user.status_id).await.unwrap(), "Active");
    assert_eq!(
        store.user_type_name(user.user_type_id).await.unwrap(),
        "Member"
    );
    assert!(store.user_type_pk(user.user_type_id).await.unwrap().is_some());

    // Values with no lookup row get the fixed placeholders.
    assert_eq!(store.role_name(999).await.unwrap(), "- no role -");
    assert_eq!(store.status_name(999).await.unwrap(), "- no status -");
    assert_eq!(store.user_type_name(999).await.unwrap(), "- no user type -");
    assert!(store.user_type_pk(999).await.unwrap().is_none());
}

#[tokio::test]
async fn lookup_lists_are_ordered_by_value() {
    let (store, _, _) = spawn_store().await;

    let roles = store.role_list().await.unwrap();
    let values: Vec<i32> = roles.iter().map(|o| o.value).collect();
    assert_eq!(values, vec![10, 20, 30]);

    let statuses = store.status_list().await.unwrap();
    let values: Vec<i32> = statuses.iter().map(|o| o.value).collect();
    assert_eq!(values, vec![0, 10]);
    assert_eq!(statuses[0].name, "Deleted");
    assert_eq!(statuses[1].name, "Active");

    let user_types = store.user_type_list().await.unwrap();
    assert_eq!(user_types.len(), 2);
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let (store, accounts, _) = spawn_store().await;

    accounts
        .register(register_request("judy", "judy@example.com"))
        .await
        .expect("registration should succeed");

    let err = accounts
        .change_password("judy", "wrong current", "a new password!")
        .await
        .expect_err("wrong current password must be rejected");
    assert!(matches!(err, AccountError::Validation(_)));

    accounts
        .change_password("judy", "correct horse battery", "a new password!")
        .await
        .expect("change should succeed");

    assert!(store
        .verify_user_password("judy", "a new password!")
        .await
        .unwrap());
}
