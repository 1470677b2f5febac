use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::{AddressList, AddressRequest},
        auth::{LoginRequest, LoginResponse, RegisterRequest, SetPasswordRequest},
        cart::{AddToCartRequest, UpdateCartItemRequest},
        categories::{
            CategoryList, CategoryWithProducts, CreateCategoryRequest, UpdateCategoryRequest,
        },
        orders::{
            AdminOrder, AdminOrderDetail, AdminOrderList, CheckoutRequest, CheckoutResponse,
            OrderList, OrderWithItems, UpdateOrderStatusRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        saved::{SaveProductRequest, SavedProductList},
        stock::{
            BatchStockEntry, BatchStockUpdateRequest, StockHistory, StockUpdateRequest,
            UpdatedProducts,
        },
        users::{AdminUpdateUserRequest, UpdateProfileRequest, UserList, UserWithAddresses},
    },
    error::ErrorBody,
    inventory::{ChangeType, OrderStatus, StockIssue},
    models::{
        Address, Cart, CartItem, Category, Order, OrderItem, Product, Role, SavedProduct,
        StockHistoryEntry, StockLevel, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        addresses, admin, auth, cart, categories, health, orders, params, products, saved, users,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        users::get_profile,
        users::update_profile,
        users::set_password,
        addresses::list_addresses,
        addresses::create_address,
        addresses::update_address,
        addresses::set_default_address,
        addresses::delete_address,
        products::list_products,
        products::get_product,
        products::get_stock_level,
        categories::list_categories,
        categories::get_category,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_cart_item,
        cart::clear_cart,
        orders::checkout,
        orders::list_orders,
        orders::get_order,
        saved::list_favorites,
        saved::add_favorite,
        saved::remove_favorite,
        saved::list_wishlist,
        saved::add_to_wishlist,
        saved::remove_from_wishlist,
        admin::list_products,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::update_stock,
        admin::batch_update_stock,
        admin::stock_history,
        admin::create_category,
        admin::update_category,
        admin::delete_category,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_users,
        admin::get_user,
        admin::update_user,
        admin::delete_user,
        admin::get_user_cart,
        admin::get_user_favorites,
        admin::get_user_wishlist
    ),
    components(
        schemas(
            User,
            Role,
            Address,
            Category,
            Product,
            StockLevel,
            StockHistoryEntry,
            ChangeType,
            CartItem,
            Cart,
            Order,
            OrderStatus,
            OrderItem,
            SavedProduct,
            StockIssue,
            ErrorBody,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            SetPasswordRequest,
            UpdateProfileRequest,
            AdminUpdateUserRequest,
            UserList,
            UserWithAddresses,
            AddressRequest,
            AddressList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            CategoryWithProducts,
            AddToCartRequest,
            UpdateCartItemRequest,
            CheckoutRequest,
            CheckoutResponse,
            OrderList,
            OrderWithItems,
            AdminOrder,
            AdminOrderList,
            AdminOrderDetail,
            UpdateOrderStatusRequest,
            StockUpdateRequest,
            BatchStockEntry,
            BatchStockUpdateRequest,
            UpdatedProducts,
            StockHistory,
            SaveProductRequest,
            SavedProductList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Cart>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<StockHistory>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "User", description = "Profile of the signed-in user"),
        (name = "Addresses", description = "Shipping addresses"),
        (name = "Products", description = "Public catalogue"),
        (name = "Categories", description = "Public categories"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Favorites", description = "Favorite products"),
        (name = "Wishlist", description = "Wishlist products"),
        (name = "Admin", description = "Catalogue, stock, order and user management"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_documents_checkout_and_stock_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/checkout",
            "/api/admin/products/{id}/stock",
            "/api/admin/products/stock/batch",
            "/api/admin/products/{id}/stock-history",
            "/api/products/{id}/stock",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
