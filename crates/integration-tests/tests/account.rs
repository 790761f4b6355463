//! Login, signup, profile, and catalog against the stub API.

#![allow(clippy::unwrap_used)]

use doghouse_core::ProductId;
use doghouse_integration_tests::{PASSWORD, StubApi, USERNAME};
use doghouse_storefront::api::ProfileUpdate;
use doghouse_storefront::services::{AuthError, SignupForm};

fn signup(username: &str) -> SignupForm {
    SignupForm {
        username: username.to_string(),
        email: format!("{username}@doghouse.ph"),
        password: "longenough1".to_string(),
        confirm_password: "longenough1".to_string(),
        first_name: "Maria".to_string(),
        last_name: "Santos".to_string(),
        address: "4 Mabini St, Quezon City".to_string(),
        contact: "09181112222".to_string(),
    }
}

#[tokio::test]
async fn test_bad_credentials_leave_session_logged_out() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();

    let err = storefront
        .auth()
        .login(USERNAME, "wrong-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert!(!storefront.session().is_logged_in());
}

#[tokio::test]
async fn test_register_new_account() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();

    let message = storefront.auth().register(signup("maria")).await.unwrap();
    assert_eq!(message, "User registered successfully");
    // Registration does not log in.
    assert!(!storefront.session().is_logged_in());
}

#[tokio::test]
async fn test_register_short_password_is_left_to_server() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();

    let message = storefront
        .auth()
        .register(SignupForm {
            password: "abc123".to_string(),
            confirm_password: "abc123".to_string(),
            ..signup("pedro")
        })
        .await
        .unwrap();
    assert_eq!(message, "User registered successfully");
}

#[tokio::test]
async fn test_register_taken_username_reports_field_errors() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();

    let err = storefront
        .auth()
        .register(signup(USERNAME))
        .await
        .unwrap_err();
    let AuthError::Validation(fields) = err else {
        panic!("expected field errors, got {err:?}");
    };
    assert_eq!(
        fields,
        vec!["username: A user with that username already exists.".to_string()]
    );
}

#[tokio::test]
async fn test_profile_requires_login() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();

    let err = storefront.account().require_session().await.unwrap_err();
    assert!(matches!(err, AuthError::LoginRequired));

    storefront.auth().login(USERNAME, PASSWORD).await.unwrap();
    storefront.account().require_session().await.unwrap();

    let profile = storefront.account().profile().await.unwrap();
    assert_eq!(profile.username, USERNAME);
    assert_eq!(profile.first_name.as_deref(), Some("Juan"));
}

#[tokio::test]
async fn test_wrong_current_password_is_reported() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();
    storefront.auth().login(USERNAME, PASSWORD).await.unwrap();

    let profile = storefront.account().profile().await.unwrap();
    let mut update = ProfileUpdate::from_profile(&profile);
    update.address = "99 Ayala Ave, Makati".to_string();
    update.current_password = "not-my-password".to_string();

    let err = storefront
        .account()
        .update_profile(&update)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::IncorrectPassword));
    assert_eq!(stub.state().profile()["address"], "12 Rizal Ave, Manila");
}

#[tokio::test]
async fn test_rejected_field_is_a_validation_error() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();
    storefront.auth().login(USERNAME, PASSWORD).await.unwrap();

    let profile = storefront.account().profile().await.unwrap();
    let mut update = ProfileUpdate::from_profile(&profile);
    update.contact = "0917-123-4567-ext-89".to_string();
    update.current_password = PASSWORD.to_string();

    let err = storefront
        .account()
        .update_profile(&update)
        .await
        .unwrap_err();
    let AuthError::Validation(fields) = err else {
        panic!("expected field errors, got {err:?}");
    };
    assert!(fields[0].starts_with("contact: "));
}

#[tokio::test]
async fn test_profile_update_is_saved() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();
    storefront.auth().login(USERNAME, PASSWORD).await.unwrap();

    let profile = storefront.account().profile().await.unwrap();
    let mut update = ProfileUpdate::from_profile(&profile);
    update.address = "99 Ayala Ave, Makati".to_string();
    update.current_password = PASSWORD.to_string();

    storefront.account().update_profile(&update).await.unwrap();

    let profile = storefront.account().profile().await.unwrap();
    assert_eq!(profile.address.as_deref(), Some("99 Ayala Ave, Makati"));
}

#[tokio::test]
async fn test_logout_then_account_calls_need_login_again() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();
    storefront.auth().login(USERNAME, PASSWORD).await.unwrap();

    storefront.auth().logout().await;

    assert_eq!(stub.state().logouts(), 1);
    assert!(matches!(
        storefront.account().order_history().await.unwrap_err(),
        AuthError::SessionExpired
    ));
}

#[tokio::test]
async fn test_product_list_is_cached_until_refresh() {
    let stub = StubApi::start().await;
    let storefront = stub.storefront();
    let catalog = storefront.catalog();

    let products = catalog.products().await.unwrap();
    assert_eq!(products.len(), 3);
    let tea = catalog.find(ProductId::new(3)).await.unwrap().unwrap();
    assert_eq!(tea.name, "Iced Tea");
    assert!(tea.description.is_none());
    assert!(catalog.find(ProductId::new(42)).await.unwrap().is_none());
    assert_eq!(stub.state().product_reads(), 1);

    catalog.refresh().await;
    catalog.products().await.unwrap();
    assert_eq!(stub.state().product_reads(), 2);
}
