pub mod locks;
pub mod token;
pub use token::{TokenError, TokenService};

pub mod cart_service;
pub mod cart_service_impl;
pub use cart_service::{AddToCartResult, CartError, CartService, CartSummary, CartView};
pub use cart_service_impl::SeaOrmCartService;

pub mod order_service;
pub mod order_service_impl;
pub use order_service::{CheckoutRequest, OrderError, OrderService, OrderStats};
pub use order_service_impl::SeaOrmOrderService;

pub mod payment_service;
pub mod payment_service_impl;
pub use payment_service::{CreatePayment, PaymentError, PaymentService};
pub use payment_service_impl::SeaOrmPaymentService;

pub mod product_service;
pub mod product_service_impl;
pub use product_service::{CreateProduct, ProductError, ProductService};
pub use product_service_impl::SeaOrmProductService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{LoginResult, Registration, UserError, UserService};
pub use user_service_impl::SeaOrmUserService;
