//! Order placement and cancellation against SQLite.

mod common;

use rust_decimal_macros::dec;

use storefront_api::domain::{OrderLineRequest, OrderStatus, ProductChanges, ProductStatus};
use storefront_api::errors::AppError;
use storefront_api::services::ServiceContainer;
use storefront_api::types::PaginationParams;

use common::setup;

fn line(product_id: uuid::Uuid, quantity: i32) -> OrderLineRequest {
    OrderLineRequest {
        product_id,
        quantity,
    }
}

#[tokio::test]
async fn test_order_decrements_stock_and_totals_lines() {
    let app = setup().await;
    let admin = app.admin().await;
    let customer = app.customer("jane@example.com").await;
    let category = app.category(&admin, "Office").await;

    let lamp = app.product(&admin, "Desk Lamp", dec!(10.00), 5, &[category.id]).await;
    let chair = app.product(&admin, "Desk Chair", dec!(20.00), 3, &[category.id]).await;

    let order = app
        .services
        .orders()
        .create(
            &customer,
            vec![line(lamp.product.id, 1), line(chair.product.id, 2)],
        )
        .await
        .unwrap();

    assert_eq!(order.order.total, dec!(50.00));
    assert_eq!(order.order.status, OrderStatus::Pending);
    assert_eq!(order.order.user_id, customer.id);
    assert_eq!(order.lines.len(), 2);
    assert!(uuid::Uuid::parse_str(&order.order.order_number).is_ok());

    assert_eq!(app.stock(lamp.product.id).await, 4);
    assert_eq!(app.stock(chair.product.id).await, 1);

    let jobs = app.notifier.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].order_id, order.order.id);
    assert_eq!(jobs[0].customer_email, "jane@example.com");
    assert_eq!(jobs[0].lines.len(), 2);
}

#[tokio::test]
async fn test_insufficient_stock_is_a_field_error() {
    let app = setup().await;
    let admin = app.admin().await;
    let customer = app.customer("jane@example.com").await;
    let category = app.category(&admin, "Office").await;
    let lamp = app.product(&admin, "Desk Lamp", dec!(10.00), 2, &[category.id]).await;

    let err = app
        .services
        .orders()
        .create(&customer, vec![line(lamp.product.id, 3)])
        .await
        .unwrap_err();

    match err {
        AppError::Validation(errors) => assert_eq!(
            errors.get("items.0.quantity"),
            Some(
                &["Insufficient quantity available for product 'Desk Lamp'. Only 2 available."
                    .to_string()][..]
            )
        ),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(app.stock(lamp.product.id).await, 2);
}

#[tokio::test]
async fn test_unavailable_products_are_rejected() {
    let app = setup().await;
    let admin = app.admin().await;
    let customer = app.customer("jane@example.com").await;
    let category = app.category(&admin, "Office").await;

    let sold_out = app.product(&admin, "Sold Out", dec!(5.00), 0, &[category.id]).await;
    let hidden = app.product(&admin, "Hidden Item", dec!(5.00), 4, &[category.id]).await;
    app.services
        .products()
        .update(
            &admin,
            &hidden.product.slug,
            ProductChanges {
                status: Some(ProductStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = app
        .services
        .orders()
        .create(
            &customer,
            vec![line(sold_out.product.id, 1), line(hidden.product.id, 1)],
        )
        .await
        .unwrap_err();

    match err {
        AppError::Validation(errors) => {
            assert_eq!(
                errors.get("items.0.product_id"),
                Some(&["The product is not available or out of stock.".to_string()][..])
            );
            assert_eq!(
                errors.get("items.1.product_id"),
                Some(&["The selected Product ID is invalid or not available.".to_string()][..])
            );
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_repeated_lines_use_a_running_balance() {
    let app = setup().await;
    let admin = app.admin().await;
    let customer = app.customer("jane@example.com").await;
    let category = app.category(&admin, "Office").await;
    let lamp = app.product(&admin, "Desk Lamp", dec!(10.00), 3, &[category.id]).await;

    // Each line fits on its own, together they do not
    let err = app
        .services
        .orders()
        .create(
            &customer,
            vec![line(lamp.product.id, 2), line(lamp.product.id, 2)],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(err.to_string(), "Insufficient quantity for product: Desk Lamp");

    // Rolled back
    assert_eq!(app.stock(lamp.product.id).await, 3);
    let (orders, total) = app
        .repositories()
        .orders()
        .paginate(None, &PaginationParams::default())
        .await
        .unwrap();
    assert!(orders.is_empty());
    assert_eq!(total, 0);
    assert!(app.notifier.jobs().is_empty());
}

#[tokio::test]
async fn test_cancel_restores_stock_once() {
    let app = setup().await;
    let admin = app.admin().await;
    let customer = app.customer("jane@example.com").await;
    let category = app.category(&admin, "Office").await;
    let lamp = app.product(&admin, "Desk Lamp", dec!(10.00), 5, &[category.id]).await;

    let order = app
        .services
        .orders()
        .create(&customer, vec![line(lamp.product.id, 2)])
        .await
        .unwrap();
    assert_eq!(app.stock(lamp.product.id).await, 3);

    let cancelled = app
        .services
        .orders()
        .cancel(&customer, order.order.id)
        .await
        .unwrap();
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(app.stock(lamp.product.id).await, 5);

    let err = app
        .services
        .orders()
        .cancel(&customer, order.order.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Order is already cancelled.");
    assert_eq!(app.stock(lamp.product.id).await, 5);
}

#[tokio::test]
async fn test_cancel_restores_stock_of_trashed_products() {
    let app = setup().await;
    let admin = app.admin().await;
    let customer = app.customer("jane@example.com").await;
    let category = app.category(&admin, "Office").await;
    let lamp = app.product(&admin, "Desk Lamp", dec!(10.00), 5, &[category.id]).await;

    let order = app
        .services
        .orders()
        .create(&customer, vec![line(lamp.product.id, 2)])
        .await
        .unwrap();
    app.services
        .products()
        .delete(&admin, &lamp.product.slug)
        .await
        .unwrap();

    app.services
        .orders()
        .cancel(&customer, order.order.id)
        .await
        .unwrap();
    assert_eq!(app.stock(lamp.product.id).await, 5);
}

#[tokio::test]
async fn test_completed_orders_cannot_be_cancelled() {
    let app = setup().await;
    let admin = app.admin().await;
    let customer = app.customer("jane@example.com").await;
    let category = app.category(&admin, "Office").await;
    let lamp = app.product(&admin, "Desk Lamp", dec!(10.00), 5, &[category.id]).await;

    let order = app
        .services
        .orders()
        .create(&customer, vec![line(lamp.product.id, 1)])
        .await
        .unwrap();
    app.repositories()
        .orders()
        .set_status(order.order.id, OrderStatus::Completed)
        .await
        .unwrap();

    let err = app
        .services
        .orders()
        .cancel(&admin, order.order.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot cancel a completed order.");
    assert_eq!(app.stock(lamp.product.id).await, 4);
}

#[tokio::test]
async fn test_orders_are_visible_to_owner_and_admin_only() {
    let app = setup().await;
    let admin = app.admin().await;
    let jane = app.customer("jane@example.com").await;
    let john = app.customer("john@example.com").await;
    let category = app.category(&admin, "Office").await;
    let lamp = app.product(&admin, "Desk Lamp", dec!(10.00), 5, &[category.id]).await;

    let order = app
        .services
        .orders()
        .create(&jane, vec![line(lamp.product.id, 1)])
        .await
        .unwrap();
    app.services
        .orders()
        .create(&john, vec![line(lamp.product.id, 1)])
        .await
        .unwrap();

    let orders = app.services.orders();
    assert!(matches!(
        orders.show(&john, order.order.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        orders.cancel(&john, order.order.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(orders.show(&admin, order.order.id).await.is_ok());

    let page = orders.list(&jane, PaginationParams::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].order.user_id, jane.id);

    let page = orders.list(&admin, PaginationParams::default()).await.unwrap();
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let app = setup().await;
    let customer = app.customer("jane@example.com").await;

    let err = app
        .services
        .orders()
        .show(&customer, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}
