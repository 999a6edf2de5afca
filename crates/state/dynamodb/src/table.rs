use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, KeySchemaElement, KeyType, ProvisionedThroughput, ScalarAttributeType,
};

/// Create the item table programmatically: hash key `bucket`, range key `id`.
///
/// Intended for tests and local development. In production the table is
/// typically provisioned via infrastructure-as-code tooling instead.
///
/// # Errors
/// Returns an error if `CreateTable` fails for reasons other than the table
/// already existing.
pub async fn create_table(
    client: &Client,
    table_name: &str,
) -> Result<(), aws_sdk_dynamodb::Error> {
    let result = client
        .create_table()
        .table_name(table_name)
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("bucket")
                .key_type(KeyType::Hash)
                .build()
                .expect("valid key schema"),
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("id")
                .key_type(KeyType::Range)
                .build()
                .expect("valid key schema"),
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name("bucket")
                .attribute_type(ScalarAttributeType::S)
                .build()
                .expect("valid attribute definition"),
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name("id")
                .attribute_type(ScalarAttributeType::S)
                .build()
                .expect("valid attribute definition"),
        )
        .provisioned_throughput(
            ProvisionedThroughput::builder()
                .read_capacity_units(5)
                .write_capacity_units(5)
                .build()
                .expect("valid throughput"),
        )
        .send()
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) => {
            // Tolerate "table already exists" errors so `create_table` is idempotent.
            let service_err = err.into_service_error();
            if service_err.is_resource_in_use_exception() {
                Ok(())
            } else {
                Err(service_err.into())
            }
        }
    }
}

/// Enable native TTL on the `expires` attribute. Best-effort: native TTL
/// deletion is eventually consistent, so the store still filters `expires`
/// on every read regardless of whether this call succeeds.
///
/// # Errors
/// Returns an error if the `UpdateTimeToLive` call fails.
pub async fn enable_ttl(client: &Client, table_name: &str) -> Result<(), aws_sdk_dynamodb::Error> {
    use aws_sdk_dynamodb::types::TimeToLiveSpecification;

    client
        .update_time_to_live()
        .table_name(table_name)
        .time_to_live_specification(
            TimeToLiveSpecification::builder()
                .attribute_name("expires")
                .enabled(true)
                .build()
                .expect("valid ttl specification"),
        )
        .send()
        .await
        .map(|_| ())
        .map_err(|e| e.into_service_error().into())
}
