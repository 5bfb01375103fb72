use std::collections::HashMap;

use axum::Router;

use crate::bootstrap::app_context::AppContext;
use crate::presentation::http::dispatch::RouteTable;

/// The API surface, one variant per independently owned route module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiModule {
    Webhooks,
    RazorpayWebhooks,
    Auth,
    Products,
    Cart,
    Orders,
    Reviews,
    Email,
    Payments,
    Delivery,
}

impl ApiModule {
    /// Payment-provider callbacks. Signatures are computed over the exact
    /// request bytes, so these mount ahead of the body parser.
    pub const RAW_BODY: [ApiModule; 2] = [ApiModule::Webhooks, ApiModule::RazorpayWebhooks];

    pub const PARSED_BODY: [ApiModule; 8] = [
        ApiModule::Auth,
        ApiModule::Products,
        ApiModule::Cart,
        ApiModule::Orders,
        ApiModule::Reviews,
        ApiModule::Email,
        ApiModule::Payments,
        ApiModule::Delivery,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            ApiModule::Webhooks => "/api/webhooks",
            ApiModule::RazorpayWebhooks => "/api/webhooks/razorpay",
            ApiModule::Auth => "/api/auth",
            ApiModule::Products => "/api/products",
            ApiModule::Cart => "/api/cart",
            ApiModule::Orders => "/api/orders",
            ApiModule::Reviews => "/api/reviews",
            ApiModule::Email => "/api/email",
            ApiModule::Payments => "/api/payments",
            ApiModule::Delivery => "/api/delivery",
        }
    }
}

/// Builds a module's router. Receives the shared context, including the
/// delivery socket handler, so handlers never look dependencies up ambiently.
/// Routers must not set their own fallback.
pub type RouteFactory = Box<dyn FnOnce(AppContext) -> Router + Send>;

#[derive(Default)]
pub struct RouteModules {
    factories: HashMap<ApiModule, RouteFactory>,
}

impl RouteModules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, module: ApiModule, factory: F) -> Self
    where
        F: FnOnce(AppContext) -> Router + Send + 'static,
    {
        self.factories.insert(module, Box::new(factory));
        self
    }

    pub fn contains(&self, module: ApiModule) -> bool {
        self.factories.contains_key(&module)
    }

    /// Raw-body modules first, then the body parser, then everything else,
    /// each group in [`ApiModule`] order.
    pub fn into_table(mut self, ctx: &AppContext) -> RouteTable {
        let mut table = RouteTable::new(ctx.cfg.body_limit_bytes);
        for module in ApiModule::RAW_BODY {
            table = self.mount_into(table, module, ctx);
        }
        table = table.parse_bodies();
        for module in ApiModule::PARSED_BODY {
            table = self.mount_into(table, module, ctx);
        }
        table
    }

    fn mount_into(&mut self, table: RouteTable, module: ApiModule, ctx: &AppContext) -> RouteTable {
        match self.factories.remove(&module) {
            Some(factory) => {
                tracing::debug!(prefix = module.prefix(), "route_module_mounted");
                table.mount(module.prefix(), factory(ctx.clone()))
            }
            None => {
                tracing::warn!(prefix = module.prefix(), "route_module_not_registered");
                table
            }
        }
    }
}
