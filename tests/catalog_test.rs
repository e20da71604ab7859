//! Products, categories and authentication against SQLite.

mod common;

use rust_decimal_macros::dec;

use storefront_api::domain::{
    NewProduct, OrderLineRequest, ProductChanges, ProductFilter, ProductStatus,
};
use storefront_api::errors::AppError;
use storefront_api::infra::CacheStore;
use storefront_api::services::{category_cache_key, list_cache_key, ServiceContainer};
use storefront_api::types::PaginationParams;

use common::{setup, PASSWORD};

fn new_product(name: &str, category_ids: Vec<uuid::Uuid>) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: Some("Adjustable arm".to_string()),
        price: dec!(19.99),
        quantity: 5,
        status: ProductStatus::Active,
        category_ids,
    }
}

#[tokio::test]
async fn test_product_names_are_title_cased_and_slugs_unique() {
    let app = setup().await;
    let admin = app.admin().await;
    let category = app.category(&admin, "Office").await;

    let products = app.services.products();
    let first = products
        .create(&admin, new_product("desk lamp", vec![category.id]))
        .await
        .unwrap();
    let second = products
        .create(&admin, new_product("Desk Lamp", vec![category.id]))
        .await
        .unwrap();

    assert_eq!(first.product.name, "Desk Lamp");
    assert_eq!(first.product.slug, "desk-lamp");
    assert_eq!(second.product.slug, "desk-lamp-2");
    assert_eq!(first.product.price_formatted(), "19.99 $");
    assert_eq!(first.categories.len(), 1);
    assert_eq!(first.categories[0].id, category.id);
}

#[tokio::test]
async fn test_unknown_categories_are_field_errors() {
    let app = setup().await;
    let admin = app.admin().await;
    let category = app.category(&admin, "Office").await;

    let err = app
        .services
        .products()
        .create(
            &admin,
            new_product("Desk Lamp", vec![category.id, uuid::Uuid::new_v4()]),
        )
        .await
        .unwrap_err();

    match err {
        AppError::Validation(errors) => {
            assert!(errors.get("categories.0").is_none());
            assert_eq!(
                errors.get("categories.1"),
                Some(&["The selected Categories is invalid.".to_string()][..])
            );
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_customers_cannot_manage_the_catalog() {
    let app = setup().await;
    let admin = app.admin().await;
    let customer = app.customer("jane@example.com").await;
    let category = app.category(&admin, "Office").await;

    let err = app
        .services
        .products()
        .create(&customer, new_product("Desk Lamp", vec![category.id]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = app
        .services
        .categories()
        .create(&customer, "Garden".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_soft_delete_trash_and_restore() {
    let app = setup().await;
    let admin = app.admin().await;
    let category = app.category(&admin, "Office").await;
    let lamp = app.product(&admin, "Desk Lamp", dec!(10.00), 5, &[category.id]).await;
    let slug = lamp.product.slug.clone();

    let products = app.services.products();
    products.delete(&admin, &slug).await.unwrap();

    assert!(matches!(products.show(&slug).await, Err(AppError::NotFound)));
    let live = products
        .list(ProductFilter::default(), PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(live.total, 0);

    let trashed = products
        .trashed(&admin, PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(trashed.total, 1);
    assert!(trashed.items[0].product.is_trashed());

    let restored = products.restore(&admin, &slug).await.unwrap();
    assert!(restored.product.deleted_at.is_none());
    assert!(products.show(&slug).await.is_ok());

    // Only trashed products can be restored
    assert!(matches!(
        products.restore(&admin, &slug).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn test_force_delete_requires_trash_and_no_orders() {
    let app = setup().await;
    let admin = app.admin().await;
    let customer = app.customer("jane@example.com").await;
    let category = app.category(&admin, "Office").await;
    let lamp = app.product(&admin, "Desk Lamp", dec!(10.00), 5, &[category.id]).await;
    let chair = app.product(&admin, "Desk Chair", dec!(20.00), 5, &[category.id]).await;

    app.services
        .orders()
        .create(
            &customer,
            vec![OrderLineRequest {
                product_id: chair.product.id,
                quantity: 1,
            }],
        )
        .await
        .unwrap();

    let products = app.services.products();

    // Live products are not force-deletable
    assert!(matches!(
        products.force_delete(&admin, &lamp.product.slug).await,
        Err(AppError::NotFound)
    ));

    products.delete(&admin, &lamp.product.slug).await.unwrap();
    products.force_delete(&admin, &lamp.product.slug).await.unwrap();
    let trashed = products
        .trashed(&admin, PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(trashed.total, 0);

    products.delete(&admin, &chair.product.slug).await.unwrap();
    let err = products
        .force_delete(&admin, &chair.product.slug)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot permanently delete a product with order history."
    );
    assert!(matches!(err, AppError::BadRequest(_)));

    // Rolled back: still in the trash
    let trashed = products
        .trashed(&admin, PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(trashed.total, 1);
    assert_eq!(trashed.items[0].product.id, chair.product.id);
}

#[tokio::test]
async fn test_product_filters() {
    let app = setup().await;
    let admin = app.admin().await;
    let office = app.category(&admin, "Office").await;
    let garden = app.category(&admin, "Garden").await;

    app.product(&admin, "Desk Lamp", dec!(10.00), 5, &[office.id]).await;
    app.product(&admin, "Desk Chair", dec!(80.00), 0, &[office.id]).await;
    app.product(&admin, "Garden Hose", dec!(25.00), 3, &[garden.id]).await;

    let products = app.services.products();

    let page = products
        .list(
            ProductFilter {
                category: Some(office.slug.clone()),
                ..Default::default()
            },
            PaginationParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    let page = products
        .list(
            ProductFilter {
                in_stock: Some(true),
                ..Default::default()
            },
            PaginationParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    let page = products
        .list(
            ProductFilter {
                in_stock: Some(false),
                ..Default::default()
            },
            PaginationParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].product.name, "Desk Chair");

    let page = products
        .list(
            ProductFilter {
                price_min: Some(dec!(20)),
                price_max: Some(dec!(50)),
                ..Default::default()
            },
            PaginationParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].product.name, "Garden Hose");

    let page = products
        .list(
            ProductFilter {
                search: Some("DESK".to_string()),
                ..Default::default()
            },
            PaginationParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn test_update_can_zero_stock_and_change_categories() {
    let app = setup().await;
    let admin = app.admin().await;
    let office = app.category(&admin, "Office").await;
    let garden = app.category(&admin, "Garden").await;
    let lamp = app.product(&admin, "Desk Lamp", dec!(10.00), 5, &[office.id]).await;

    let updated = app
        .services
        .products()
        .update(
            &admin,
            &lamp.product.slug,
            ProductChanges {
                quantity: Some(0),
                category_ids: Some(vec![garden.id]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.product.quantity, 0);
    assert!(!updated.product.is_available());
    assert_eq!(updated.categories.len(), 1);
    assert_eq!(updated.categories[0].id, garden.id);
    // Slug is stable across updates
    assert_eq!(updated.product.slug, lamp.product.slug);
}

#[tokio::test]
async fn test_category_names_are_unique() {
    let app = setup().await;
    let admin = app.admin().await;
    app.category(&admin, "office supplies").await;

    let err = app
        .services
        .categories()
        .create(&admin, "Office Supplies".to_string())
        .await
        .unwrap_err();
    match err {
        AppError::Validation(errors) => assert_eq!(
            errors.get("name"),
            Some(&["The Name has already been taken.".to_string()][..])
        ),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_category_cache_is_filled_and_invalidated() {
    let app = setup().await;
    let admin = app.admin().await;
    let category = app.category(&admin, "Office").await;
    let categories = app.services.categories();

    let list_key = list_cache_key(15, 1);
    let show_key = category_cache_key(category.id);
    assert!(!app.cache.exists(&list_key).await.unwrap());

    let page = categories.list(PaginationParams::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert!(app.cache.exists(&list_key).await.unwrap());

    let shown = categories.show(&category.slug).await.unwrap();
    assert_eq!(shown.category.name, "Office");
    assert!(app.cache.exists(&show_key).await.unwrap());

    let renamed = categories
        .update(&admin, &category.slug, Some("home office".to_string()))
        .await
        .unwrap();
    assert_eq!(renamed.category.name, "Home Office");
    assert_eq!(renamed.category.slug, category.slug);
    assert!(!app.cache.exists(&list_key).await.unwrap());
    assert!(!app.cache.exists(&show_key).await.unwrap());

    categories.list(PaginationParams::default()).await.unwrap();
    categories.delete(&admin, &category.slug).await.unwrap();
    assert!(!app.cache.exists(&list_key).await.unwrap());
    assert!(matches!(
        categories.show(&category.slug).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn test_pages_beyond_the_evicted_range_are_not_cached() {
    let app = setup().await;
    let admin = app.admin().await;
    let categories = app.services.categories();
    let far = PaginationParams::new(21, 10);

    let page = categories.list(far).await.unwrap();
    assert_eq!(page.total, 0);
    assert!(!app.cache.exists(&list_cache_key(10, 21)).await.unwrap());

    app.category(&admin, "Office").await;
    let page = categories.list(far).await.unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn test_category_lists_its_live_products() {
    let app = setup().await;
    let admin = app.admin().await;
    let category = app.category(&admin, "Office").await;
    let lamp = app.product(&admin, "Desk Lamp", dec!(10.00), 5, &[category.id]).await;
    app.product(&admin, "Desk Chair", dec!(20.00), 5, &[category.id]).await;

    app.services
        .products()
        .delete(&admin, &lamp.product.slug)
        .await
        .unwrap();

    let shown = app.services.categories().show(&category.slug).await.unwrap();
    assert_eq!(shown.products.len(), 1);
    assert_eq!(shown.products[0].name, "Desk Chair");
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let app = setup().await;
    let auth = app.services.auth();

    let response = auth
        .register(
            "jane doe".to_string(),
            "Jane@Example.com".to_string(),
            PASSWORD.to_string(),
        )
        .await
        .unwrap();
    assert_eq!(response.user.email, "jane@example.com");
    assert_eq!(response.user.name, "Jane Doe");
    assert_eq!(response.user.role, "customer");
    assert_eq!(response.token_type, "bearer");

    match auth
        .register(
            "Jane Again".to_string(),
            "jane@example.com".to_string(),
            PASSWORD.to_string(),
        )
        .await
        .unwrap_err()
    {
        AppError::Validation(errors) => assert!(errors.get("email").is_some()),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_login_failure_is_reported_on_email() {
    let app = setup().await;
    app.customer("jane@example.com").await;
    let auth = app.services.auth();

    for (email, password) in [
        ("jane@example.com", "WrongPass123!"),
        ("nobody@example.com", PASSWORD),
    ] {
        match auth
            .login(email.to_string(), password.to_string())
            .await
            .unwrap_err()
        {
            AppError::Validation(errors) => assert_eq!(
                errors.get("email"),
                Some(&["The provided credentials are incorrect.".to_string()][..])
            ),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_logout_revokes_only_that_token() {
    let app = setup().await;
    app.customer("jane@example.com").await;
    let auth = app.services.auth();

    let first = app.token("jane@example.com").await;
    let second = app.token("jane@example.com").await;

    let claims = auth.verify_token(&first).await.unwrap();
    auth.logout(&claims).await.unwrap();

    assert!(matches!(
        auth.verify_token(&first).await,
        Err(AppError::Unauthenticated)
    ));
    assert!(auth.verify_token(&second).await.is_ok());
}
