//! Service-level tests for the payment transaction workflow.

use std::sync::Arc;

use storefront::config::Config;
use storefront::db::{PaymentUpdate, Store};
use storefront::domain::{Principal, Role};
use storefront::services::{
    CheckoutRequest, CreatePayment, CreateProduct, PaymentError, Registration,
};
use storefront::state::SharedState;

struct Fixture {
    state: Arc<SharedState>,
    buyer: Principal,
    admin: Principal,
    order_id: i32,
}

async fn account(state: &SharedState, username: &str, role: Role) -> Principal {
    let user = state
        .user_service
        .create_account(Registration {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "correct-horse".to_string(),
            role: Some(role),
            fullname: None,
            phone: None,
            address: None,
        })
        .await
        .expect("Failed to create account");
    Principal::new(user.id, user.role)
}

/// A buyer with one placed order worth 3000.
async fn fixture() -> Fixture {
    let db_path = std::env::temp_dir().join(format!(
        "storefront-payment-test-{}.db",
        uuid::Uuid::new_v4()
    ));
    let store = Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("Failed to open store");
    let state = Arc::new(SharedState::with_store(Config::default(), store));

    let seller = account(&state, "seller", Role::Seller).await;
    let buyer = account(&state, "buyer", Role::Buyer).await;
    let admin = account(&state, "admin", Role::Admin).await;

    let product = state
        .product_service
        .create(
            &seller,
            CreateProduct {
                name: "Kettle".to_string(),
                price: 3_000,
                stock: 5,
                description: None,
                category: Some("kitchen".to_string()),
                image: None,
            },
        )
        .await
        .unwrap();

    state
        .cart_service
        .add_to_cart(&buyer, product.id, 1)
        .await
        .unwrap();

    let order = state
        .order_service
        .create_from_cart(
            &buyer,
            buyer.user_id,
            CheckoutRequest {
                shipping_address: "2 Side Road".to_string(),
                ..CheckoutRequest::default()
            },
        )
        .await
        .unwrap();

    Fixture {
        state,
        buyer,
        admin,
        order_id: order.order.id,
    }
}

fn payment(order_id: i32, amount: i64) -> CreatePayment {
    CreatePayment {
        user_id: None,
        order_id,
        amount,
        payment_method: None,
        notes: None,
    }
}

#[tokio::test]
async fn new_payment_is_pending_with_reference() {
    let f = fixture().await;

    let created = f
        .state
        .payment_service
        .create(&f.buyer, payment(f.order_id, 3_000))
        .await
        .unwrap();

    assert_eq!(created.status, "pending");
    assert_eq!(created.user_id, f.buyer.user_id);
    assert_eq!(created.payment_method, "bank_transfer");
    assert!(created.paid_at.is_none());
    assert!(created.transaction_number.starts_with("TRX-"));

    let fetched = f
        .state
        .payment_service
        .get_by_number(&f.buyer, &created.transaction_number)
        .await
        .unwrap();
    assert_eq!(fetched.id, created.id);
}

#[tokio::test]
async fn payment_requires_positive_amount_and_own_order() {
    let f = fixture().await;

    let zero = f
        .state
        .payment_service
        .create(&f.buyer, payment(f.order_id, 0))
        .await;
    assert!(matches!(zero, Err(PaymentError::InvalidInput(_))));

    let missing = f
        .state
        .payment_service
        .create(&f.buyer, payment(9_999, 100))
        .await;
    assert!(matches!(missing, Err(PaymentError::NotFound("Order"))));

    let stranger = account(&f.state, "stranger", Role::Buyer).await;
    let foreign = f
        .state
        .payment_service
        .create(&stranger, payment(f.order_id, 100))
        .await;
    assert!(matches!(foreign, Err(PaymentError::InvalidInput(_))));

    let on_behalf = f
        .state
        .payment_service
        .create(
            &stranger,
            CreatePayment {
                user_id: Some(f.buyer.user_id),
                ..payment(f.order_id, 100)
            },
        )
        .await;
    assert!(matches!(on_behalf, Err(PaymentError::Forbidden)));
}

#[tokio::test]
async fn paid_at_is_stamped_once() {
    let f = fixture().await;
    let created = f
        .state
        .payment_service
        .create(&f.buyer, payment(f.order_id, 3_000))
        .await
        .unwrap();

    let by_buyer = f
        .state
        .payment_service
        .update_status(&f.buyer, created.id, "success")
        .await;
    assert!(matches!(by_buyer, Err(PaymentError::Forbidden)));

    let processing = f
        .state
        .payment_service
        .update_status(&f.admin, created.id, "processing")
        .await
        .unwrap();
    assert!(processing.paid_at.is_none());

    let paid = f
        .state
        .payment_service
        .update_status(&f.admin, created.id, "success")
        .await
        .unwrap();
    assert_eq!(paid.status, "success");
    let paid_at = paid.paid_at.clone().expect("paid_at should be set");

    // Re-applying the same status is a no-op
    let again = f
        .state
        .payment_service
        .update_status(&f.admin, created.id, "success")
        .await
        .unwrap();
    assert_eq!(again.paid_at.as_deref(), Some(paid_at.as_str()));

    let reverted = f
        .state
        .payment_service
        .update_status(&f.admin, created.id, "failed")
        .await;
    assert!(matches!(reverted, Err(PaymentError::Conflict(_))));

    let edited = f
        .state
        .payment_service
        .update(
            &f.buyer,
            created.id,
            PaymentUpdate {
                amount: Some(1),
                ..PaymentUpdate::default()
            },
        )
        .await;
    assert!(matches!(edited, Err(PaymentError::Conflict(_))));
}

#[tokio::test]
async fn pending_payment_details_can_be_edited() {
    let f = fixture().await;
    let created = f
        .state
        .payment_service
        .create(&f.buyer, payment(f.order_id, 3_000))
        .await
        .unwrap();

    let updated = f
        .state
        .payment_service
        .update(
            &f.buyer,
            created.id,
            PaymentUpdate {
                amount: Some(2_500),
                payment_method: Some("card".to_string()),
                notes: Some("partial".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.amount, 2_500);
    assert_eq!(updated.payment_method, "card");
    assert_eq!(updated.notes.as_deref(), Some("partial"));
    assert_eq!(updated.status, "pending");
}

#[tokio::test]
async fn stats_count_by_status_and_sum_successful() {
    let f = fixture().await;
    let service = &f.state.payment_service;

    let a = service
        .create(&f.buyer, payment(f.order_id, 3_000))
        .await
        .unwrap();
    let b = service
        .create(&f.buyer, payment(f.order_id, 1_000))
        .await
        .unwrap();
    service
        .create(&f.buyer, payment(f.order_id, 500))
        .await
        .unwrap();

    service
        .update_status(&f.admin, a.id, "success")
        .await
        .unwrap();
    service
        .update_status(&f.admin, b.id, "failed")
        .await
        .unwrap();

    let denied = service.stats(&f.buyer).await;
    assert!(matches!(denied, Err(PaymentError::Forbidden)));

    let stats = service.stats(&f.admin).await.unwrap();
    assert_eq!(stats.total_transactions, 3);
    assert_eq!(stats.pending_count, 1);
    assert_eq!(stats.success_count, 1);
    assert_eq!(stats.failed_count, 1);
    assert_eq!(stats.total_amount, 3_000);

    let mine = service
        .list_for_user(&f.buyer, f.buyer.user_id)
        .await
        .unwrap();
    assert_eq!(mine.len(), 3);
}

#[tokio::test]
async fn detail_edit_after_settlement_is_rejected_in_storage() {
    let f = fixture().await;
    let created = f
        .state
        .payment_service
        .create(&f.buyer, payment(f.order_id, 3_000))
        .await
        .unwrap();

    f.state
        .payment_service
        .update_status(&f.admin, created.id, "success")
        .await
        .unwrap();

    // An edit that passed its status check before the settlement landed
    let applied = f
        .state
        .store
        .update_open_payment(
            created.id,
            PaymentUpdate {
                amount: Some(1),
                ..PaymentUpdate::default()
            },
        )
        .await
        .unwrap();
    assert!(!applied);

    let stored = f
        .state
        .payment_service
        .get(&f.buyer, created.id)
        .await
        .unwrap();
    assert_eq!(stored.amount, 3_000);
    assert_eq!(stored.status, "success");
}
