use utoipa::OpenApi;

use itemstore_core::ItemEnvelope;

use super::items::PutItemBody;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::items::put_item,
        super::items::get_item,
        super::items::delete_item,
        super::items::get_all_items,
        super::health::health,
        super::health::metrics,
    ),
    components(schemas(ItemEnvelope, PutItemBody)),
    tags((name = "Store", description = "Per-item CRUD"), (name = "Health", description = "Liveness and counters")),
)]
pub struct ApiDoc;
