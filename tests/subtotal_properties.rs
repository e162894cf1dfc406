//! Property: cached cart subtotals always equal a recomputation from scratch,
//! whatever sequence of adds, quantity changes, removals and repricings ran.

use proptest::prelude::*;
use storefront::config::Config;
use storefront::db::{ProductUpdate, Store};
use storefront::domain::{Principal, Role};
use storefront::services::{CartError, CreateProduct, Registration};
use storefront::state::SharedState;

const PRODUCTS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Add { product: usize, quantity: i32 },
    SetQuantity { product: usize, quantity: i32 },
    Reprice { product: usize, price: i64 },
    Remove { product: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..PRODUCTS, 1_i32..4).prop_map(|(product, quantity)| Op::Add { product, quantity }),
        (0..PRODUCTS, 1_i32..7)
            .prop_map(|(product, quantity)| Op::SetQuantity { product, quantity }),
        (0..PRODUCTS, 0_i64..50_000).prop_map(|(product, price)| Op::Reprice { product, price }),
        (0..PRODUCTS).prop_map(|product| Op::Remove { product }),
    ]
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
        .unwrap();
    Principal::new(user.id, user.role)
}

fn tolerated(err: &CartError) -> bool {
    matches!(
        err,
        CartError::InsufficientStock { .. } | CartError::NotFound(_)
    )
}

async fn run_ops(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let db_path = std::env::temp_dir().join(format!(
        "storefront-subtotal-prop-{}.db",
        uuid::Uuid::new_v4()
    ));
    let store = Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .unwrap();
    let state = SharedState::with_store(Config::default(), store);

    let seller = account(&state, "seller", Role::Seller).await;
    let buyer = account(&state, "buyer", Role::Buyer).await;

    let mut product_ids = Vec::with_capacity(PRODUCTS);
    for i in 0..PRODUCTS {
        let product = state
            .product_service
            .create(
                &seller,
                CreateProduct {
                    name: format!("Item {i}"),
                    price: 1_000 * (i64::try_from(i).unwrap() + 1),
                    stock: 5,
                    description: None,
                    category: None,
                    image: None,
                },
            )
            .await
            .unwrap();
        product_ids.push(product.id);
    }

    for op in ops {
        let line_for = |product: usize| {
            let state = &state;
            let product_id = product_ids[product];
            async move {
                state
                    .cart_service
                    .get_cart(&buyer, buyer.user_id)
                    .await
                    .unwrap()
                    .items
                    .into_iter()
                    .find(|line| line.product_id == product_id)
            }
        };

        match op {
            Op::Add { product, quantity } => {
                if let Err(e) = state
                    .cart_service
                    .add_to_cart(&buyer, product_ids[product], quantity)
                    .await
                {
                    prop_assert!(tolerated(&e), "unexpected error: {e}");
                }
            }
            Op::SetQuantity { product, quantity } => {
                if let Some(line) = line_for(product).await
                    && let Err(e) = state
                        .cart_service
                        .update_quantity(&buyer, line.id, quantity)
                        .await
                {
                    prop_assert!(tolerated(&e), "unexpected error: {e}");
                }
            }
            Op::Reprice { product, price } => {
                state
                    .product_service
                    .update(
                        &seller,
                        product_ids[product],
                        ProductUpdate {
                            price: Some(price),
                            ..ProductUpdate::default()
                        },
                    )
                    .await
                    .unwrap();
            }
            Op::Remove { product } => {
                if let Some(line) = line_for(product).await {
                    state.cart_service.remove(&buyer, line.id).await.unwrap();
                }
            }
        }

        let cart = state
            .cart_service
            .get_cart(&buyer, buyer.user_id)
            .await
            .unwrap();

        let mut recomputed_total = 0_i64;
        for line in &cart.items {
            prop_assert!(line.quantity >= 1 && line.quantity <= line.stock);
            prop_assert_eq!(line.subtotal, line.unit_price * i64::from(line.quantity));
            recomputed_total += line.unit_price * i64::from(line.quantity);
        }
        prop_assert_eq!(cart.total_price, recomputed_total);
    }

    let _ = std::fs::remove_file(&db_path);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn maintained_subtotals_match_recomputation(
        ops in prop::collection::vec(op_strategy(), 1..15)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(run_ops(ops))?;
    }
}
