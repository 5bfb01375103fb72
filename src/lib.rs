// Module layout (Clean Architecture style)
// - bootstrap: configuration and shared context
// - infrastructure: MongoDB connector and the delivery socket hub
// - presentation: HTTP dispatch, middleware and the delivery WebSocket
// - application: ports consumed by route modules
// - domain: core models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
