use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::errors::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "liquorstore-api",
        description = "Liquor store backend: catalog, cart, atomic order placement and invoicing",
        license(name = "MIT")
    ),
    components(schemas(ErrorResponse)),
    tags(
        (name = "auth", description = "Registration, login and profile"),
        (name = "products", description = "Catalog browsing and administration"),
        (name = "categories", description = "Category administration"),
        (name = "cart", description = "Per-user shopping cart"),
        (name = "orders", description = "Order placement, status and deletion"),
        (name = "invoices", description = "Invoices issued at order time"),
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at `/docs`, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
